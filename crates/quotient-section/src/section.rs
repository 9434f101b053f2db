//! [`PathSection`] – one interpolated candidate curve from the head to its
//! target.
//!
//! A section is a polyline of bundle states, each tagged with the base-path
//! arclength it projects onto. The fiber part follows one of three
//! [`InterpolationPolicy`] values:
//!
//! ```text
//!  FiberLast          FiberFirst          L2
//!  ───────────x       x────────────x     ────────x
//!             │       │                      ___/
//!  x──────────┘       x                  x__/
//! ```

use quotient_graph::{ConfigId, Roadmap};
use quotient_space::SpaceInformation;
use quotient_types::State;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::head::Head;
use crate::restriction::PathRestriction;

/// States closer than this are treated as the same state when inserted.
const DUPLICATE_TOLERANCE: f64 = 1e-9;

/// How the fiber value travels from the head's fiber to the target's fiber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterpolationPolicy {
    /// Move along the base path first, swing the fiber at the end.
    #[default]
    FiberLast,
    /// Swing the fiber first, then move along the base path.
    FiberFirst,
    /// Blend the fiber proportionally to arclength.
    L2,
}

impl InterpolationPolicy {
    /// The policy tried after this one fails.
    pub fn other(self) -> Self {
        match self {
            InterpolationPolicy::FiberLast => InterpolationPolicy::FiberFirst,
            InterpolationPolicy::FiberFirst | InterpolationPolicy::L2 => {
                InterpolationPolicy::FiberLast
            }
        }
    }
}

/// Add `state` as a configuration connected to `from`.
pub(crate) fn add_step(
    roadmap: &mut Roadmap,
    bundle: &SpaceInformation,
    from: ConfigId,
    state: &[f64],
) -> ConfigId {
    let cost = bundle.distance(roadmap.state(from), state);
    let id = roadmap.add_configuration(State::from(state));
    roadmap.add_edge(from, id, cost);
    id
}

#[derive(Debug, Clone)]
pub struct PathSection {
    states: Vec<State>,
    locations: Vec<f64>,
    last_valid_location: f64,
}

impl PathSection {
    /// Interpolate from the head towards its target under `policy`.
    pub fn interpolate(
        restriction: &PathRestriction,
        head: &Head,
        policy: InterpolationPolicy,
    ) -> Self {
        let bundle = restriction.bundle();
        let fiber_space = bundle.fiber();
        let start = head.location();
        let end = head.target_location();

        let mut states = vec![head.state().clone()];
        let mut locations = vec![start];
        let mut base = bundle.alloc_base_state();
        let mut fiber = bundle.alloc_fiber_state();

        let mut push = |base: &[f64], fiber: &[f64], location: f64| {
            let mut lifted = bundle.alloc_bundle_state();
            bundle.lift_state(base, fiber, &mut lifted);
            states.push(lifted);
            locations.push(location);
        };

        if policy == InterpolationPolicy::FiberFirst {
            push(head.base_state(), head.target_fiber(), start);
        }

        let mut index = restriction.next_index_after(start);
        while index < restriction.len() && restriction.location_at_index(index) < end {
            let location = restriction.location_at_index(index);
            let waypoint = &restriction.base_path()[index];
            match policy {
                InterpolationPolicy::FiberLast => push(waypoint, head.fiber_state(), location),
                InterpolationPolicy::FiberFirst => push(waypoint, head.target_fiber(), location),
                InterpolationPolicy::L2 => {
                    let t = if end > start {
                        (location - start) / (end - start)
                    } else {
                        1.0
                    };
                    if let Some(space) = fiber_space {
                        space.interpolate(head.fiber_state(), head.target_fiber(), t, &mut fiber);
                    }
                    push(waypoint, &fiber, location);
                }
            }
            index += 1;
        }

        if policy == InterpolationPolicy::FiberLast {
            restriction.interpolate_base_path(end, &mut base);
            push(&base, head.fiber_state(), end);
        }

        states.push(head.target_state().clone());
        locations.push(end);

        Self {
            states,
            locations,
            last_valid_location: start,
        }
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn locations(&self) -> &[f64] {
        &self.locations
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Arclength reached by the last [`PathSection::check_motion`].
    pub fn last_valid_location(&self) -> f64 {
        self.last_valid_location
    }

    /// Validate the section segment by segment.
    ///
    /// On success the section is inserted into `roadmap` ending in the
    /// target configuration and the head moves there. Otherwise the valid
    /// prefix up to the last valid state is inserted and the head moves to
    /// its end.
    pub fn check_motion(
        &mut self,
        restriction: &PathRestriction,
        roadmap: &mut Roadmap,
        head: &mut Head,
    ) -> bool {
        let bundle = restriction.bundle();
        let space = bundle.bundle();
        let n = self.states.len();

        for i in 0..n.saturating_sub(1) {
            let (valid, last_valid) = space.check_motion_last_valid(&self.states[i], &self.states[i + 1]);
            if valid {
                continue;
            }

            let mut last = head.config();
            for state in &self.states[1..=i] {
                last = insert_distinct(roadmap, space, last, state);
            }
            let location = match last_valid {
                Some((state, fraction)) => {
                    last = insert_distinct(roadmap, space, last, &state);
                    self.locations[i] + fraction * (self.locations[i + 1] - self.locations[i])
                }
                None => self.locations[i],
            };
            self.last_valid_location = location;
            if last != head.config() || location > head.location() {
                head.set_current(bundle, roadmap, last, location);
            }
            trace!(segment = i, location, "section blocked");
            return false;
        }

        let mut last = head.config();
        for state in &self.states[1..n.saturating_sub(1)] {
            last = insert_distinct(roadmap, space, last, state);
        }
        let target = head.target();
        if last != target {
            let cost = space.distance(roadmap.state(last), roadmap.state(target));
            roadmap.add_edge(last, target, cost);
        }
        self.last_valid_location = head.target_location();
        head.set_current(bundle, roadmap, target, head.target_location());
        true
    }
}

fn insert_distinct(
    roadmap: &mut Roadmap,
    space: &SpaceInformation,
    from: ConfigId,
    state: &[f64],
) -> ConfigId {
    if space.distance(roadmap.state(from), state) <= DUPLICATE_TOLERANCE {
        from
    } else {
        add_step(roadmap, space, from, state)
    }
}
