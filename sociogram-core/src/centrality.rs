//! Centrality measures over the assembled social graph.
//!
//! All three measures operate on the plain adjacency lists of the graph and
//! return scores keyed by identity. Values match the conventional
//! definitions for undirected, unweighted graphs: Brandes' algorithm for
//! betweenness, the Wasserman-Faust closeness variant for graphs that may
//! be disconnected, and power iteration for eigenvector centrality.

use crate::graph::SocialGraph;
use sociogram_client::model::UserId;
use std::collections::{HashMap, VecDeque};
use thiserror::Error;

const MAX_POWER_ITERATIONS: usize = 1000;
const CONVERGENCE_TOLERANCE: f64 = 1e-6;

#[derive(Error, Debug)]
#[error("eigenvector power iteration failed to converge within {0} iterations")]
pub struct ConvergenceError(pub usize);

/// Brandes' single-source accumulation.
///
/// http://snap.stanford.edu/class/cs224w-readings/brandes01centrality.pdf
/// page 10, "Algorithm 1: Betweenness centrality in unweighted graphs"
fn betweenness_for_source(source: usize, adjacency: &[Vec<usize>], scores: &mut [f64]) {
    let num_nodes = adjacency.len();

    let mut sigma: Vec<f64> = vec![0.0; num_nodes];
    let mut distance: Vec<usize> = vec![num_nodes + 1; num_nodes];
    let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); num_nodes];
    let mut delta: Vec<f64> = vec![0.0; num_nodes];
    let mut queue: VecDeque<usize> = VecDeque::new();
    let mut stack: Vec<usize> = Vec::new();

    sigma[source] = 1.0;
    distance[source] = 0;
    queue.push_back(source);

    while let Some(v) = queue.pop_front() {
        stack.push(v);

        for &w in &adjacency[v] {
            if distance[w] == num_nodes + 1 {
                distance[w] = distance[v] + 1;
                queue.push_back(w);
            }
            if distance[w] == distance[v] + 1 {
                sigma[w] += sigma[v];
                predecessors[w].push(v);
            }
        }
    }

    while let Some(w) = stack.pop() {
        for &v in &predecessors[w] {
            delta[v] += sigma[v] / sigma[w] * (1.0 + delta[w]);
        }
        if w != source {
            scores[w] += delta[w];
        }
    }
}

/// Betweenness centrality, normalized by `(n - 1)(n - 2)`; the accumulation
/// counts every unordered pair from both endpoints, so this equals the usual
/// division by the number of pairs not involving the node.
pub fn betweenness_centrality(graph: &SocialGraph) -> HashMap<UserId, f64> {
    let (ids, adjacency) = graph.adjacency();
    let num_nodes = adjacency.len();

    let mut scores = vec![0.0; num_nodes];
    for source in 0..num_nodes {
        betweenness_for_source(source, &adjacency, &mut scores);
    }

    let divisor = if num_nodes > 2 {
        ((num_nodes - 1) * (num_nodes - 2)) as f64
    } else {
        1.0
    };

    ids.into_iter()
        .zip(scores)
        .map(|(id, score)| (id, score / divisor))
        .collect()
}

/// Closeness centrality with the Wasserman-Faust correction:
/// `C(u) = ((r - 1) / Σd) · ((r - 1) / (n - 1))` where `r` is the size of
/// `u`'s reachable component. Isolated nodes score 0.
pub fn closeness_centrality(graph: &SocialGraph) -> HashMap<UserId, f64> {
    let (ids, adjacency) = graph.adjacency();
    let num_nodes = adjacency.len();

    ids.into_iter()
        .enumerate()
        .map(|(source, id)| {
            let (reachable, total_distance) = bfs_distances(source, &adjacency);

            let score = if total_distance > 0 && num_nodes > 1 {
                let reached = (reachable - 1) as f64;
                (reached / total_distance as f64) * (reached / (num_nodes - 1) as f64)
            } else {
                0.0
            };

            (id, score)
        })
        .collect()
}

/// Breadth-first distances from one node: how many nodes are reachable
/// (including the source) and the sum of their distances.
fn bfs_distances(source: usize, adjacency: &[Vec<usize>]) -> (usize, u64) {
    let num_nodes = adjacency.len();

    let mut distance: Vec<i64> = vec![-1; num_nodes];
    let mut queue: VecDeque<usize> = VecDeque::new();
    let mut reachable = 1;
    let mut total = 0u64;

    distance[source] = 0;
    queue.push_back(source);

    while let Some(current) = queue.pop_front() {
        for &next in &adjacency[current] {
            if distance[next] == -1 {
                distance[next] = distance[current] + 1;
                reachable += 1;
                total += distance[next] as u64;
                queue.push_back(next);
            }
        }
    }

    (reachable, total)
}

/// Eigenvector centrality via power iteration on `x' = x + A·x`, normalized
/// to unit Euclidean length each step. Converges when the component-wise
/// change drops below `n · 1e-6`.
pub fn eigenvector_centrality(
    graph: &SocialGraph,
) -> Result<HashMap<UserId, f64>, ConvergenceError> {
    let (ids, adjacency) = graph.adjacency();
    let num_nodes = adjacency.len();

    if num_nodes == 0 {
        return Ok(HashMap::new());
    }

    let mut scores = vec![1.0 / num_nodes as f64; num_nodes];

    for _ in 0..MAX_POWER_ITERATIONS {
        let previous = scores.clone();

        for (node, neighbours) in adjacency.iter().enumerate() {
            for &neighbour in neighbours {
                scores[neighbour] += previous[node];
            }
        }

        let norm = scores.iter().map(|x| x * x).sum::<f64>().sqrt();
        let norm = if norm == 0.0 { 1.0 } else { norm };
        for score in &mut scores {
            *score /= norm;
        }

        let change: f64 = scores
            .iter()
            .zip(&previous)
            .map(|(a, b)| (a - b).abs())
            .sum();
        if change < num_nodes as f64 * CONVERGENCE_TOLERANCE {
            return Ok(ids.into_iter().zip(scores).collect());
        }
    }

    Err(ConvergenceError(MAX_POWER_ITERATIONS))
}
