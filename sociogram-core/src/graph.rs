//! Assembly of crawl records into an undirected social graph.
//!
//! Nodes are keyed by identity; the display name is carried as an attribute
//! so that two distinct profiles sharing a name never collapse into one
//! node.

use petgraph::dot::{Config, Dot};
use petgraph::graph::{NodeIndex, UnGraph};
use sociogram_client::model::{CrawlOutcome, UserId};
use std::collections::HashMap;
use tracing::debug;

/// Display name of the synthetic root node. Distinct from any fetched name,
/// which always contains a space.
pub const ROOT_DISPLAY_NAME: &str = "(root)";

/// Attributes carried by every graph node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeAttrs {
    pub id: UserId,
    pub name: String,
    /// 0 = the root itself, 1 = direct friend, 2 = friend of a friend.
    pub depth: u8,
    pub birth_date: Option<String>,
    pub city: Option<String>,
}

/// Undirected, unweighted social graph. No self-loops, no multi-edges.
#[derive(Debug, Clone, Default)]
pub struct SocialGraph {
    pub(crate) graph: UnGraph<NodeAttrs, ()>,
    pub(crate) nodes: HashMap<UserId, NodeIndex>,
}

impl SocialGraph {
    /// Builds the graph from a crawl outcome.
    ///
    /// Edge records referencing unknown identities are dropped, as are
    /// self-loops; re-adding an existing pair has no effect. An empty
    /// outcome (failed root fetch) yields a graph with zero nodes and zero
    /// edges, without the synthetic root.
    pub fn assemble(outcome: &CrawlOutcome, root: UserId) -> Self {
        let mut assembled = Self::default();

        if outcome.is_empty() {
            return assembled;
        }

        // The root goes in first: it commonly shows up again in its own
        // friends' lists, and the synthetic node must win over that record.
        assembled.add_node(NodeAttrs {
            id: root,
            name: ROOT_DISPLAY_NAME.to_string(),
            depth: 0,
            birth_date: None,
            city: None,
        });

        for person in outcome.persons.iter() {
            assembled.add_node(NodeAttrs {
                id: person.id,
                name: person.name.clone(),
                depth: person.depth,
                birth_date: person.birth_date.clone(),
                city: person.city.clone(),
            });
        }

        for record in &outcome.edges {
            let (Some(&a), Some(&b)) = (
                assembled.nodes.get(&record.parent),
                assembled.nodes.get(&record.child),
            ) else {
                debug!("dropping edge {}-{}: unmapped endpoint", record.parent, record.child);
                continue;
            };

            if a == b {
                continue;
            }

            if assembled.graph.find_edge(a, b).is_none() {
                assembled.graph.add_edge(a, b, ());
            }
        }

        assembled
    }

    fn add_node(&mut self, attrs: NodeAttrs) {
        let id = attrs.id;
        if self.nodes.contains_key(&id) {
            return;
        }
        let index = self.graph.add_node(attrs);
        self.nodes.insert(id, index);
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, id: UserId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn attrs(&self, id: UserId) -> Option<&NodeAttrs> {
        self.nodes.get(&id).map(|i| &self.graph[*i])
    }

    pub fn display_name(&self, id: UserId) -> Option<&str> {
        self.attrs(id).map(|a| a.name.as_str())
    }

    pub fn has_edge(&self, a: UserId, b: UserId) -> bool {
        match (self.nodes.get(&a), self.nodes.get(&b)) {
            (Some(&a), Some(&b)) => self.graph.find_edge(a, b).is_some(),
            _ => false,
        }
    }

    pub fn degree(&self, id: UserId) -> usize {
        self.nodes
            .get(&id)
            .map(|i| self.graph.neighbors(*i).count())
            .unwrap_or(0)
    }

    /// Iterates over node attributes in insertion order.
    pub fn iter_nodes(&self) -> impl Iterator<Item = &NodeAttrs> {
        self.graph.node_indices().map(|i| &self.graph[i])
    }

    /// Returns the identities in index order alongside an adjacency list,
    /// the form the centrality algorithms operate on.
    pub(crate) fn adjacency(&self) -> (Vec<UserId>, Vec<Vec<usize>>) {
        let ids: Vec<UserId> = self.graph.node_indices().map(|i| self.graph[i].id).collect();

        let adjacency = self
            .graph
            .node_indices()
            .map(|i| self.graph.neighbors(i).map(|n| n.index()).collect())
            .collect();

        (ids, adjacency)
    }

    /// Renders the graph in Graphviz DOT form, labelling nodes with their
    /// display names. Layout and drawing are left to external tooling.
    pub fn to_dot(&self) -> String {
        let labelled: UnGraph<&str, &str> =
            self.graph.map(|_, attrs| attrs.name.as_str(), |_, _| "");

        format!("{}", Dot::with_config(&labelled, &[Config::EdgeNoLabel]))
    }
}
