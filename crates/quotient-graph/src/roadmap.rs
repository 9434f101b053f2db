//! [`Roadmap`] – the graph of sampled configurations owned by one level.
//!
//! Configurations live in an arena indexed by [`ConfigId`]; edges are stored
//! as adjacency lists with their metric cost. Connected components are kept
//! in [`DisjointSets`] so `same_component` never walks the graph.
//!
//! # Example
//!
//! ```rust
//! use quotient_graph::Roadmap;
//! use quotient_types::State;
//!
//! let mut map = Roadmap::new();
//! let a = map.add_configuration(State::new(vec![0.0]));
//! let b = map.add_configuration(State::new(vec![1.0]));
//! let c = map.add_configuration(State::new(vec![2.0]));
//! map.add_edge(a, b, 1.0);
//! map.add_edge(b, c, 1.0);
//!
//! assert!(map.same_component(a, c));
//! assert_eq!(map.shortest_path(a, c), Some(vec![a, b, c]));
//! ```

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;

use quotient_types::State;
use serde::{Deserialize, Serialize};

use crate::disjoint_sets::DisjointSets;

/// Index of a configuration inside its roadmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConfigId(pub usize);

impl fmt::Display for ConfigId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A sampled state and its bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    pub state: State,
    pub index: ConfigId,
    pub total_connection_attempts: u32,
    pub successful_connection_attempts: u32,
    pub is_start: bool,
    pub is_goal: bool,
}

impl Configuration {
    /// Fraction of connection attempts that succeeded, `0` before any.
    pub fn connectivity(&self) -> f64 {
        if self.total_connection_attempts == 0 {
            0.0
        } else {
            f64::from(self.successful_connection_attempts) / f64::from(self.total_connection_attempts)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub target: ConfigId,
    pub cost: f64,
}

// ────────────────────────────────────────────────────────────────────────────
// Dijkstra frontier
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, PartialEq)]
struct Frontier {
    cost: f64,
    id: usize,
}

impl Eq for Frontier {}

impl Ord for Frontier {
    // Reversed so the max-heap pops the cheapest entry; ties pop lower ids.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Roadmap
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct Roadmap {
    configs: Vec<Configuration>,
    adjacency: Vec<Vec<Edge>>,
    components: DisjointSets,
    edge_count: usize,
}

impl Roadmap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of `state` as a new configuration.
    pub fn add_configuration(&mut self, state: State) -> ConfigId {
        let index = ConfigId(self.configs.len());
        self.configs.push(Configuration {
            state,
            index,
            total_connection_attempts: 0,
            successful_connection_attempts: 0,
            is_start: false,
            is_goal: false,
        });
        self.adjacency.push(Vec::new());
        self.components.make_set();
        index
    }

    /// Connect `a` and `b` in both directions.
    ///
    /// Self loops and duplicate edges are ignored; returns whether an edge
    /// was added.
    pub fn add_edge(&mut self, a: ConfigId, b: ConfigId, cost: f64) -> bool {
        if a == b || self.has_edge(a, b) {
            return false;
        }
        self.adjacency[a.0].push(Edge { target: b, cost });
        self.adjacency[b.0].push(Edge { target: a, cost });
        self.components.union(a.0, b.0);
        self.edge_count += 1;
        true
    }

    pub fn has_edge(&self, a: ConfigId, b: ConfigId) -> bool {
        self.adjacency[a.0].iter().any(|e| e.target == b)
    }

    pub fn config(&self, id: ConfigId) -> &Configuration {
        &self.configs[id.0]
    }

    pub fn config_mut(&mut self, id: ConfigId) -> &mut Configuration {
        &mut self.configs[id.0]
    }

    pub fn state(&self, id: ConfigId) -> &State {
        &self.configs[id.0].state
    }

    pub fn neighbors(&self, id: ConfigId) -> &[Edge] {
        &self.adjacency[id.0]
    }

    pub fn configurations(&self) -> impl Iterator<Item = &Configuration> {
        self.configs.iter()
    }

    /// Every edge once, as `(lower id, higher id, cost)`.
    pub fn edges(&self) -> impl Iterator<Item = (ConfigId, ConfigId, f64)> + '_ {
        self.adjacency.iter().enumerate().flat_map(|(from, edges)| {
            edges
                .iter()
                .filter(move |e| from < e.target.0)
                .map(move |e| (ConfigId(from), e.target, e.cost))
        })
    }

    pub fn same_component(&self, a: ConfigId, b: ConfigId) -> bool {
        self.components.same_set(a.0, b.0)
    }

    pub fn component_count(&self) -> usize {
        self.components.set_count()
    }

    /// The `k` configurations closest to `query` under `metric`, closest
    /// first, ties broken by lower id.
    pub fn nearest_k<F>(&self, query: &[f64], k: usize, metric: F) -> Vec<(ConfigId, f64)>
    where
        F: Fn(&[f64], &[f64]) -> f64,
    {
        let mut ranked: Vec<(ConfigId, f64)> = self
            .configs
            .iter()
            .map(|c| (c.index, metric(query, &c.state[..])))
            .collect();
        ranked.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(k);
        ranked
    }

    pub fn nearest<F>(&self, query: &[f64], metric: F) -> Option<ConfigId>
    where
        F: Fn(&[f64], &[f64]) -> f64,
    {
        self.nearest_k(query, 1, metric).first().map(|(id, _)| *id)
    }

    /// Cheapest path from `from` to `to` by edge cost (Dijkstra).
    pub fn shortest_path(&self, from: ConfigId, to: ConfigId) -> Option<Vec<ConfigId>> {
        if !self.same_component(from, to) {
            return None;
        }
        let n = self.configs.len();
        let mut dist = vec![f64::INFINITY; n];
        let mut prev: Vec<Option<usize>> = vec![None; n];
        let mut heap = BinaryHeap::new();
        dist[from.0] = 0.0;
        heap.push(Frontier { cost: 0.0, id: from.0 });

        while let Some(Frontier { cost, id }) = heap.pop() {
            if id == to.0 {
                break;
            }
            if cost > dist[id] {
                continue;
            }
            for edge in &self.adjacency[id] {
                let next = cost + edge.cost;
                if next < dist[edge.target.0] {
                    dist[edge.target.0] = next;
                    prev[edge.target.0] = Some(id);
                    heap.push(Frontier {
                        cost: next,
                        id: edge.target.0,
                    });
                }
            }
        }

        if !dist[to.0].is_finite() {
            return None;
        }
        let mut path = vec![to];
        let mut at = to.0;
        while let Some(p) = prev[at] {
            path.push(ConfigId(p));
            at = p;
        }
        path.reverse();
        Some(path)
    }

    /// States along `path`, cloned.
    pub fn path_states(&self, path: &[ConfigId]) -> Vec<State> {
        path.iter().map(|id| self.state(*id).clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Drop every configuration and edge.
    pub fn clear(&mut self) {
        self.configs.clear();
        self.adjacency.clear();
        self.components.clear();
        self.edge_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn euclid(a: &[f64], b: &[f64]) -> f64 {
        a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum::<f64>().sqrt()
    }

    fn line(points: &[f64]) -> (Roadmap, Vec<ConfigId>) {
        let mut map = Roadmap::new();
        let ids = points
            .iter()
            .map(|p| map.add_configuration(State::new(vec![*p])))
            .collect();
        (map, ids)
    }

    #[test]
    fn add_edge_ignores_loops_and_duplicates() {
        let (mut map, ids) = line(&[0.0, 1.0]);
        assert!(map.add_edge(ids[0], ids[1], 1.0));
        assert!(!map.add_edge(ids[1], ids[0], 1.0));
        assert!(!map.add_edge(ids[0], ids[0], 0.0));
        assert_eq!(map.edge_count(), 1);
        assert_eq!(map.edges().count(), 1);
    }

    #[test]
    fn components_track_edges() {
        let (mut map, ids) = line(&[0.0, 1.0, 2.0]);
        assert_eq!(map.component_count(), 3);
        map.add_edge(ids[0], ids[2], 2.0);
        assert!(map.same_component(ids[0], ids[2]));
        assert!(!map.same_component(ids[0], ids[1]));
        assert_eq!(map.component_count(), 2);
    }

    #[test]
    fn nearest_k_sorts_by_distance() {
        let (map, ids) = line(&[0.0, 0.9, 0.4, 0.5]);
        let near = map.nearest_k(&[0.42], 2, euclid);
        assert_eq!(near.len(), 2);
        assert_eq!(near[0].0, ids[2]);
        assert_eq!(near[1].0, ids[3]);
        assert_eq!(map.nearest(&[1.0], euclid), Some(ids[1]));
    }

    #[test]
    fn shortest_path_prefers_cheaper_route() {
        let (mut map, ids) = line(&[0.0, 1.0, 2.0, 3.0]);
        map.add_edge(ids[0], ids[3], 10.0);
        map.add_edge(ids[0], ids[1], 1.0);
        map.add_edge(ids[1], ids[2], 1.0);
        map.add_edge(ids[2], ids[3], 1.0);
        assert_eq!(
            map.shortest_path(ids[0], ids[3]),
            Some(vec![ids[0], ids[1], ids[2], ids[3]])
        );
    }

    #[test]
    fn shortest_path_none_when_disconnected() {
        let (map, ids) = line(&[0.0, 1.0]);
        assert_eq!(map.shortest_path(ids[0], ids[1]), None);
        assert_eq!(map.shortest_path(ids[0], ids[0]), Some(vec![ids[0]]));
    }

    #[test]
    fn connectivity_ratio() {
        let (mut map, ids) = line(&[0.0]);
        assert_eq!(map.config(ids[0]).connectivity(), 0.0);
        let c = map.config_mut(ids[0]);
        c.total_connection_attempts = 4;
        c.successful_connection_attempts = 1;
        assert_eq!(map.config(ids[0]).connectivity(), 0.25);
    }

    #[test]
    fn clear_drops_everything() {
        let (mut map, ids) = line(&[0.0, 1.0]);
        map.add_edge(ids[0], ids[1], 1.0);
        map.clear();
        assert!(map.is_empty());
        assert_eq!(map.edge_count(), 0);
    }
}
