//! Report generation for a completed crawl.
//!
//! The summary is a plain serializable snapshot: counts, skipped branches,
//! the three centrality rankings and a node roster. Optional profile fields
//! stay `None` in the data model; the `"N/A"` substitution happens in the
//! text and Markdown renderers only.

use crate::centrality;
use crate::graph::SocialGraph;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sociogram_client::model::{CrawlOutcome, UserId};
use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::warn;
use uuid::Uuid;

const MISSING_FIELD: &str = "N/A";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
    Markdown,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            "markdown" | "md" => Some(ReportFormat::Markdown),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedNode {
    pub id: UserId,
    pub name: String,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedBranch {
    pub friend: UserId,
    pub name: Option<String>,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterEntry {
    pub id: UserId,
    pub name: String,
    pub depth: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlSummary {
    pub session_id: String,
    pub generated_at: String,
    pub root: UserId,
    pub total_friends: usize,
    pub total_friends_of_friends: usize,
    pub node_count: usize,
    pub edge_count: usize,
    pub skipped_branches: Vec<SkippedBranch>,
    pub betweenness: Vec<RankedNode>,
    pub closeness: Vec<RankedNode>,
    pub eigenvector: Vec<RankedNode>,
    pub roster: Vec<RosterEntry>,
}

impl CrawlSummary {
    /// Computes the centrality rankings and packages everything worth
    /// showing about a crawl. `top` truncates each ranking; `None` keeps
    /// every node.
    pub fn build(
        outcome: &CrawlOutcome,
        graph: &SocialGraph,
        root: UserId,
        top: Option<usize>,
    ) -> Self {
        let betweenness = rank(centrality::betweenness_centrality(graph), graph, top);
        let closeness = rank(centrality::closeness_centrality(graph), graph, top);
        let eigenvector = match centrality::eigenvector_centrality(graph) {
            Ok(scores) => rank(scores, graph, top),
            Err(e) => {
                warn!("dropping eigenvector ranking: {e}");
                Vec::new()
            }
        };

        let skipped_branches = outcome
            .skipped()
            .map(|(friend, error)| SkippedBranch {
                friend: *friend,
                name: graph.display_name(*friend).map(str::to_string),
                error: error.to_string(),
            })
            .collect();

        let roster = graph
            .iter_nodes()
            .map(|attrs| RosterEntry {
                id: attrs.id,
                name: attrs.name.clone(),
                depth: attrs.depth,
                birth_date: attrs.birth_date.clone(),
                city: attrs.city.clone(),
            })
            .collect();

        Self {
            session_id: Uuid::new_v4().to_string(),
            generated_at: Utc::now().to_rfc3339(),
            root,
            total_friends: outcome.direct_friends.len(),
            total_friends_of_friends: outcome.friend_of_friend_count(),
            node_count: graph.node_count(),
            edge_count: graph.edge_count(),
            skipped_branches,
            betweenness,
            closeness,
            eigenvector,
            roster,
        }
    }

    pub fn render(&self, format: &ReportFormat) -> String {
        match format {
            ReportFormat::Text => self.render_text(),
            ReportFormat::Json => {
                serde_json::to_string_pretty(self).expect("summary serializes to JSON")
            }
            ReportFormat::Markdown => self.render_markdown(),
        }
    }

    pub fn write_to_file(&self, path: &Path, format: &ReportFormat) -> std::io::Result<()> {
        let mut file = File::create(path)?;
        file.write_all(self.render(format).as_bytes())?;
        Ok(())
    }

    fn render_text(&self) -> String {
        let mut report = String::new();
        report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");
        report.push_str("# Summary:\n");
        report.push_str(&format!("  Session: {}\n", self.session_id));
        report.push_str(&format!("  Generated: {}\n", self.generated_at));
        report.push_str(&format!("  Root: {}\n", self.root));
        report.push_str(&format!("  Direct friends: {}\n", self.total_friends));
        report.push_str(&format!(
            "  Friends of friends: {}\n",
            self.total_friends_of_friends
        ));
        report.push_str(&format!("  Graph nodes: {}\n", self.node_count));
        report.push_str(&format!("  Graph edges: {}\n", self.edge_count));

        if !self.skipped_branches.is_empty() {
            report.push_str("\n# Skipped branches:\n");
            for skipped in &self.skipped_branches {
                let name = skipped.name.as_deref().unwrap_or(MISSING_FIELD);
                report.push_str(&format!(
                    "  {} ({}): {}\n",
                    name, skipped.friend, skipped.error
                ));
            }
        }

        for (title, ranking) in [
            ("Betweenness centrality", &self.betweenness),
            ("Closeness centrality", &self.closeness),
            ("Eigenvector centrality", &self.eigenvector),
        ] {
            report.push_str(&format!("\n# {title}:\n"));
            for ranked in ranking {
                report.push_str(&format!("  {}: {:.4}\n", ranked.name, ranked.score));
            }
        }

        report.push_str("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

        report.push_str("# People:\n");
        for entry in &self.roster {
            report.push_str(&format!(
                "  {} (id {}, depth {}) born: {} city: {}\n",
                entry.name,
                entry.id,
                entry.depth,
                entry.birth_date.as_deref().unwrap_or(MISSING_FIELD),
                entry.city.as_deref().unwrap_or(MISSING_FIELD),
            ));
        }

        report
    }

    fn render_markdown(&self) -> String {
        let mut report = String::new();
        report.push_str("# Crawl summary\n\n");
        report.push_str(&format!("- Session: `{}`\n", self.session_id));
        report.push_str(&format!("- Generated: {}\n", self.generated_at));
        report.push_str(&format!("- Root: `{}`\n", self.root));
        report.push_str(&format!("- Direct friends: {}\n", self.total_friends));
        report.push_str(&format!(
            "- Friends of friends: {}\n",
            self.total_friends_of_friends
        ));
        report.push_str(&format!(
            "- Graph: {} nodes, {} edges\n",
            self.node_count, self.edge_count
        ));

        if !self.skipped_branches.is_empty() {
            report.push_str("\n## Skipped branches\n\n");
            report.push_str("| Friend | Id | Error |\n|---|---|---|\n");
            for skipped in &self.skipped_branches {
                report.push_str(&format!(
                    "| {} | {} | {} |\n",
                    skipped.name.as_deref().unwrap_or(MISSING_FIELD),
                    skipped.friend,
                    skipped.error
                ));
            }
        }

        for (title, ranking) in [
            ("Betweenness centrality", &self.betweenness),
            ("Closeness centrality", &self.closeness),
            ("Eigenvector centrality", &self.eigenvector),
        ] {
            report.push_str(&format!("\n## {title}\n\n"));
            report.push_str("| Name | Id | Score |\n|---|---|---|\n");
            for ranked in ranking {
                report.push_str(&format!(
                    "| {} | {} | {:.4} |\n",
                    ranked.name, ranked.id, ranked.score
                ));
            }
        }

        report.push_str("\n## People\n\n");
        report.push_str("| Name | Id | Depth | Born | City |\n|---|---|---|---|---|\n");
        for entry in &self.roster {
            report.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                entry.name,
                entry.id,
                entry.depth,
                entry.birth_date.as_deref().unwrap_or(MISSING_FIELD),
                entry.city.as_deref().unwrap_or(MISSING_FIELD),
            ));
        }

        report
    }
}

/// Sorts scores descending (ties broken by identity for a stable order) and
/// truncates to the requested count.
fn rank(
    scores: HashMap<UserId, f64>,
    graph: &SocialGraph,
    top: Option<usize>,
) -> Vec<RankedNode> {
    let mut ranked: Vec<RankedNode> = scores
        .into_iter()
        .map(|(id, score)| RankedNode {
            id,
            name: graph
                .display_name(id)
                .unwrap_or(MISSING_FIELD)
                .to_string(),
            score,
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });

    if let Some(top) = top {
        ranked.truncate(top);
    }

    ranked
}
