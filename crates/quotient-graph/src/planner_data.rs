//! [`PlannerData`] – exported roadmaps of a multilevel solve.
//!
//! Every vertex carries the level it was sampled on and its state lifted to
//! the finest space, so roadmaps of all levels can be drawn in one frame.

use quotient_types::State;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerVertex {
    pub level: usize,
    pub max_level: usize,
    /// The state in its own level's space.
    pub state: State,
    /// The state lifted to the finest space.
    pub total_state: State,
    #[serde(default)]
    pub is_start: bool,
    #[serde(default)]
    pub is_goal: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlannerEdge {
    pub from: usize,
    pub to: usize,
    pub cost: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlannerData {
    vertices: Vec<PlannerVertex>,
    edges: Vec<PlannerEdge>,
}

impl PlannerData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a vertex and return its index.
    pub fn add_vertex(&mut self, vertex: PlannerVertex) -> usize {
        self.vertices.push(vertex);
        self.vertices.len() - 1
    }

    pub fn add_edge(&mut self, from: usize, to: usize, cost: f64) {
        self.edges.push(PlannerEdge { from, to, cost });
    }

    pub fn vertices(&self) -> &[PlannerVertex] {
        &self.vertices
    }

    pub fn edges(&self) -> &[PlannerEdge] {
        &self.edges
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Vertices that belong to `level`.
    pub fn level_vertices(&self, level: usize) -> impl Iterator<Item = &PlannerVertex> {
        self.vertices.iter().filter(move |v| v.level == level)
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.edges.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertex(level: usize) -> PlannerVertex {
        PlannerVertex {
            level,
            max_level: 2,
            state: State::new(vec![0.0]),
            total_state: State::new(vec![0.0, 0.0]),
            is_start: false,
            is_goal: false,
        }
    }

    #[test]
    fn add_vertex_returns_indices() {
        let mut data = PlannerData::new();
        assert_eq!(data.add_vertex(vertex(0)), 0);
        assert_eq!(data.add_vertex(vertex(1)), 1);
        data.add_edge(0, 1, 0.5);
        assert_eq!(data.vertex_count(), 2);
        assert_eq!(data.edge_count(), 1);
        assert_eq!(data.level_vertices(1).count(), 1);
    }

    #[test]
    fn json_round_trip() {
        let mut data = PlannerData::new();
        data.add_vertex(vertex(0));
        let json = serde_json::to_string(&data).unwrap();
        let back: PlannerData = serde_json::from_str(&json).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn clear_empties() {
        let mut data = PlannerData::new();
        data.add_vertex(vertex(0));
        data.clear();
        assert!(data.is_empty());
    }
}
