//! Scenario files – the spaces, obstacles and query of one planning problem.
//!
//! ```toml
//! name = "narrow passage"
//! start = [0.0, 0.0]
//! goal = [1.0, 0.8]
//!
//! [[levels]]
//! space = { kind = "real_vector", low = [0.0], high = [1.0] }
//!
//! [[levels]]
//! space = { kind = "real_vector", low = [0.0, -1.0], high = [1.0, 1.0] }
//! obstacles = [{ axes = [0, 1], low = [0.5, -1.0], high = [0.6, 0.4] }]
//! ```
//!
//! Levels are listed coarsest first; `start` and `goal` live in the last one.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use quotient_space::{BoxObstacleRule, BoxRegion, SpaceInformation, SpaceSpec, ValidityChecker};
use quotient_types::{PlanError, State};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: String,
    pub start: Vec<f64>,
    pub goal: Vec<f64>,
    #[serde(default = "default_goal_threshold")]
    pub goal_threshold: f64,
    pub levels: Vec<LevelSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelSpec {
    pub space: SpaceSpec,
    /// Motion-check resolution as a fraction of the space's extent.
    #[serde(default)]
    pub resolution: Option<f64>,
    #[serde(default)]
    pub obstacles: Vec<ObstacleSpec>,
}

/// An axis-aligned box over the coordinates listed in `axes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObstacleSpec {
    pub axes: Vec<usize>,
    pub low: Vec<f64>,
    pub high: Vec<f64>,
}

fn default_goal_threshold() -> f64 {
    1e-3
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self, String> {
        let raw = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read scenario at {}: {}", path.display(), e))?;
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> Result<Self, String> {
        toml::from_str(raw).map_err(|e| format!("Failed to parse scenario: {}", e))
    }

    pub fn display_name(&self) -> &str {
        if self.name.is_empty() { "unnamed" } else { &self.name }
    }

    pub fn start_state(&self) -> State {
        State::new(self.start.clone())
    }

    pub fn goal_state(&self) -> State {
        State::new(self.goal.clone())
    }

    /// Build one [`SpaceInformation`] per level, coarsest first.
    pub fn build_spaces(&self) -> Result<Vec<Arc<SpaceInformation>>, PlanError> {
        if self.levels.is_empty() {
            return Err(PlanError::EmptySequence);
        }
        self.levels
            .iter()
            .enumerate()
            .map(|(i, level)| level.build(i).map(Arc::new))
            .collect()
    }
}

impl LevelSpec {
    fn build(&self, index: usize) -> Result<SpaceInformation, PlanError> {
        let space = self.space.build()?;
        let dimension = space.dimension();

        let mut checker = ValidityChecker::new();
        for obstacle in &self.obstacles {
            if let Some(&axis) = obstacle.axes.iter().find(|&&a| a >= dimension) {
                return Err(PlanError::Config(format!(
                    "obstacle axis {axis} outside the {dimension}-dimensional space of level {index}"
                )));
            }
            let region = BoxRegion::new(obstacle.low.clone(), obstacle.high.clone())?;
            checker = checker.with_rule(BoxObstacleRule::new(obstacle.axes.clone(), vec![region])?);
        }

        let info = SpaceInformation::new(space, Arc::new(checker));
        Ok(match self.resolution {
            Some(r) => info.with_resolution(r),
            None => info,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PASSAGE: &str = r#"
        name = "passage"
        start = [0.0, 0.0]
        goal = [1.0, 0.8]

        [[levels]]
        space = { kind = "real_vector", low = [0.0], high = [1.0] }

        [[levels]]
        space = { kind = "real_vector", low = [0.0, -1.0], high = [1.0, 1.0] }
        resolution = 0.005
        obstacles = [{ axes = [0, 1], low = [0.5, -1.0], high = [0.6, 0.4] }]
    "#;

    #[test]
    fn parses_levels_and_query() {
        let s = Scenario::parse(PASSAGE).unwrap();
        assert_eq!(s.display_name(), "passage");
        assert_eq!(s.levels.len(), 2);
        assert_eq!(s.goal_threshold, 1e-3);
        assert_eq!(&s.goal_state()[..], &[1.0, 0.8]);
        assert_eq!(s.levels[1].obstacles[0].axes, vec![0, 1]);
    }

    #[test]
    fn builds_obstacles_into_the_checker() {
        let spaces = Scenario::parse(PASSAGE).unwrap().build_spaces().unwrap();
        assert_eq!(spaces[0].dimension(), 1);
        assert!(spaces[0].is_valid(&[0.55]));
        assert!(!spaces[1].is_valid(&[0.55, 0.0]));
        assert!(spaces[1].is_valid(&[0.55, 0.6]));
        assert_eq!(spaces[1].resolution(), 0.005);
    }

    #[test]
    fn out_of_range_axis_is_rejected() {
        let mut s = Scenario::parse(PASSAGE).unwrap();
        s.levels[0].obstacles.push(ObstacleSpec {
            axes: vec![1],
            low: vec![0.0],
            high: vec![1.0],
        });
        assert!(matches!(s.build_spaces(), Err(PlanError::Config(_))));
    }

    #[test]
    fn no_levels_is_an_empty_sequence() {
        let s = Scenario::parse("start = []\ngoal = []\nlevels = []").unwrap();
        assert_eq!(s.build_spaces().unwrap_err(), PlanError::EmptySequence);
    }

    #[test]
    fn missing_query_fails_to_parse() {
        let err = Scenario::parse("[[levels]]\nspace = { kind = \"so2\" }").unwrap_err();
        assert!(err.contains("parse"));
    }
}
