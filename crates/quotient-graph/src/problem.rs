//! Start/goal queries and the solution paths recorded against them.

use quotient_types::State;
use serde::{Deserialize, Serialize};

/// A path reported by a planner, tagged with the planner's name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolutionPath {
    pub planner_name: String,
    pub states: Vec<State>,
    pub length: f64,
}

impl SolutionPath {
    /// `length` is computed by the caller with the path's own metric.
    pub fn new(planner_name: impl Into<String>, states: Vec<State>, length: f64) -> Self {
        Self {
            planner_name: planner_name.into(),
            states,
            length,
        }
    }
}

/// One start/goal query on one space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemDefinition {
    start: State,
    goal: State,
    goal_threshold: f64,
    #[serde(default)]
    solutions: Vec<SolutionPath>,
}

impl ProblemDefinition {
    pub fn new(start: State, goal: State, goal_threshold: f64) -> Self {
        Self {
            start,
            goal,
            goal_threshold,
            solutions: Vec::new(),
        }
    }

    pub fn start(&self) -> &State {
        &self.start
    }

    pub fn goal(&self) -> &State {
        &self.goal
    }

    pub fn goal_threshold(&self) -> f64 {
        self.goal_threshold
    }

    /// `true` when `distance_to_goal` is within the goal threshold.
    pub fn is_goal_satisfied(&self, distance_to_goal: f64) -> bool {
        distance_to_goal <= self.goal_threshold
    }

    pub fn add_solution_path(&mut self, path: SolutionPath) {
        self.solutions.push(path);
    }

    pub fn solution_paths(&self) -> &[SolutionPath] {
        &self.solutions
    }

    pub fn has_solution(&self) -> bool {
        !self.solutions.is_empty()
    }

    /// The shortest recorded path.
    pub fn best_solution(&self) -> Option<&SolutionPath> {
        self.solutions
            .iter()
            .min_by(|a, b| a.length.total_cmp(&b.length))
    }

    pub fn clear_solution_paths(&mut self) {
        self.solutions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn problem() -> ProblemDefinition {
        ProblemDefinition::new(State::new(vec![0.0]), State::new(vec![1.0]), 0.05)
    }

    #[test]
    fn goal_threshold_is_inclusive() {
        let p = problem();
        assert!(p.is_goal_satisfied(0.05));
        assert!(!p.is_goal_satisfied(0.06));
    }

    #[test]
    fn best_solution_is_shortest() {
        let mut p = problem();
        assert!(!p.has_solution());
        p.add_solution_path(SolutionPath::new("QMP LvL0", vec![], 3.0));
        p.add_solution_path(SolutionPath::new("QMP LvL1", vec![], 2.0));
        assert_eq!(p.best_solution().unwrap().planner_name, "QMP LvL1");
        p.clear_solution_paths();
        assert!(p.best_solution().is_none());
    }

    #[test]
    fn serializes_to_json() {
        let p = problem();
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["start"], serde_json::json!([0.0]));
        assert_eq!(json["goal_threshold"], serde_json::json!(0.05));
    }
}
