//! Trigger behaviors
//!
//! What happens to an element the first time it crosses its group's
//! visibility threshold.

use std::fmt;

use unveil_core::{Marker, ObservedId};

/// Trigger behavior shared by every element of a group
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RevealBehavior {
    /// Activate after a short fixed delay
    Reveal,
    /// Cascade the container's children, then activate the container
    Stagger,
    /// Count up to the element's target integer
    Counter,
    /// Activate after a delay proportional to the cascade position
    Timeline,
}

impl RevealBehavior {
    pub const ALL: [RevealBehavior; 4] = [
        RevealBehavior::Reveal,
        RevealBehavior::Stagger,
        RevealBehavior::Counter,
        RevealBehavior::Timeline,
    ];

    /// Markers scanned into this behavior's group
    pub fn markers(self) -> &'static [Marker] {
        match self {
            RevealBehavior::Reveal => &Marker::REVEALS,
            RevealBehavior::Stagger => &[Marker::StaggerChildren],
            RevealBehavior::Counter => &[Marker::Counter],
            RevealBehavior::Timeline => &[Marker::TimelineItem],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            RevealBehavior::Reveal => "reveal",
            RevealBehavior::Stagger => "stagger",
            RevealBehavior::Counter => "counter",
            RevealBehavior::Timeline => "timeline",
        }
    }
}

impl fmt::Display for RevealBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Deferred work queued on the scheduler's frame queue
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Action {
    /// Add the group's active class
    Activate(ObservedId),
    /// Render the next count-up frame
    CounterFrame(ObservedId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markers_cover_all_once() {
        let mut seen: Vec<Marker> = RevealBehavior::ALL
            .iter()
            .flat_map(|b| b.markers().iter().copied())
            .collect();
        assert_eq!(seen.len(), Marker::ALL.len());
        seen.dedup();
        for marker in Marker::ALL {
            assert!(seen.contains(&marker));
        }
    }
}
