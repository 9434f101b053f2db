//! [`Head`] – the frontier of a section search.
//!
//! The head points at the roadmap configuration reached so far and at its
//! arclength on the base path. It also remembers where the search is going:
//! the target configuration and the target's arclength.

use quotient_bundle::BundleSpace;
use quotient_graph::{ConfigId, Roadmap};
use quotient_types::State;

#[derive(Debug, Clone, PartialEq)]
pub struct Head {
    config: ConfigId,
    state: State,
    location: f64,
    base: State,
    fiber: State,
    target: ConfigId,
    target_state: State,
    target_fiber: State,
    target_location: f64,
}

impl Head {
    pub fn new(
        bundle: &BundleSpace,
        roadmap: &Roadmap,
        current: ConfigId,
        location: f64,
        target: ConfigId,
        target_location: f64,
    ) -> Self {
        let target_state = roadmap.state(target).clone();
        let mut target_fiber = bundle.alloc_fiber_state();
        bundle.project_fiber(&target_state, &mut target_fiber);

        let mut head = Self {
            config: current,
            state: State::default(),
            location,
            base: bundle.alloc_base_state(),
            fiber: bundle.alloc_fiber_state(),
            target,
            target_state,
            target_fiber,
            target_location,
        };
        head.set_current(bundle, roadmap, current, location);
        head
    }

    /// Move the head to `config` at arclength `location`, refreshing the
    /// cached projections.
    pub fn set_current(
        &mut self,
        bundle: &BundleSpace,
        roadmap: &Roadmap,
        config: ConfigId,
        location: f64,
    ) {
        self.config = config;
        self.state = roadmap.state(config).clone();
        self.location = location;
        bundle.project_base(&self.state, &mut self.base);
        bundle.project_fiber(&self.state, &mut self.fiber);
    }

    pub fn config(&self) -> ConfigId {
        self.config
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    /// Arclength of the head on the base path.
    pub fn location(&self) -> f64 {
        self.location
    }

    pub fn base_state(&self) -> &State {
        &self.base
    }

    pub fn fiber_state(&self) -> &State {
        &self.fiber
    }

    pub fn target(&self) -> ConfigId {
        self.target
    }

    pub fn target_state(&self) -> &State {
        &self.target_state
    }

    pub fn target_fiber(&self) -> &State {
        &self.target_fiber
    }

    pub fn target_location(&self) -> f64 {
        self.target_location
    }

    /// `true` once the head sits on the target configuration.
    pub fn reached_target(&self) -> bool {
        self.config == self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quotient_bundle::ComponentFactory;
    use quotient_space::{SpaceInformation, StateSpace};
    use std::sync::Arc;

    fn plane_over_line() -> BundleSpace {
        let base = Arc::new(SpaceInformation::unconstrained(StateSpace::cube(1, 0.0, 1.0).unwrap()));
        let bundle = Arc::new(SpaceInformation::unconstrained(
            StateSpace::real_vector(vec![0.0, -1.0], vec![1.0, 1.0]).unwrap(),
        ));
        BundleSpace::new(bundle, Some(base), &ComponentFactory::new()).unwrap()
    }

    #[test]
    fn caches_projections() {
        let bundle = plane_over_line();
        let mut map = Roadmap::new();
        let start = map.add_configuration(State::new(vec![0.0, 0.25]));
        let goal = map.add_configuration(State::new(vec![1.0, 0.8]));

        let head = Head::new(&bundle, &map, start, 0.0, goal, 1.0);
        assert_eq!(&head.base_state()[..], &[0.0]);
        assert_eq!(&head.fiber_state()[..], &[0.25]);
        assert_eq!(&head.target_fiber()[..], &[0.8]);
        assert_eq!(head.target_location(), 1.0);
        assert!(!head.reached_target());
    }

    #[test]
    fn set_current_moves_the_cursor() {
        let bundle = plane_over_line();
        let mut map = Roadmap::new();
        let start = map.add_configuration(State::new(vec![0.0, 0.0]));
        let mid = map.add_configuration(State::new(vec![0.4, -0.5]));
        let goal = map.add_configuration(State::new(vec![1.0, 0.0]));

        let mut head = Head::new(&bundle, &map, start, 0.0, goal, 1.0);
        head.set_current(&bundle, &map, mid, 0.4);
        assert_eq!(head.config(), mid);
        assert_eq!(head.location(), 0.4);
        assert_eq!(&head.fiber_state()[..], &[-0.5]);

        head.set_current(&bundle, &map, goal, 1.0);
        assert!(head.reached_target());
    }
}
