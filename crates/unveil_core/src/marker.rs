//! Classification markers
//!
//! Elements opt into an animation by carrying one of these classes.

use std::fmt;

/// Class that classifies an element for the scheduler
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Marker {
    /// Fade/slide up into place
    Reveal,
    /// Slide in from the left
    RevealLeft,
    /// Slide in from the right
    RevealRight,
    /// Scale up into place
    RevealScale,
    /// Container whose children cascade in
    StaggerChildren,
    /// Numeric statistic that counts up to its `data-count`
    Counter,
    /// Entry in an experience/education timeline
    TimelineItem,
}

impl Marker {
    /// Every marker, in scan order
    pub const ALL: [Marker; 7] = [
        Marker::Reveal,
        Marker::RevealLeft,
        Marker::RevealRight,
        Marker::RevealScale,
        Marker::StaggerChildren,
        Marker::Counter,
        Marker::TimelineItem,
    ];

    /// The four plain reveal variants
    pub const REVEALS: [Marker; 4] = [
        Marker::Reveal,
        Marker::RevealLeft,
        Marker::RevealRight,
        Marker::RevealScale,
    ];

    pub fn class_name(self) -> &'static str {
        match self {
            Marker::Reveal => "reveal",
            Marker::RevealLeft => "reveal-left",
            Marker::RevealRight => "reveal-right",
            Marker::RevealScale => "reveal-scale",
            Marker::StaggerChildren => "stagger-children",
            Marker::Counter => "stat-number",
            Marker::TimelineItem => "timeline-item",
        }
    }

    pub fn from_class(class: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.class_name() == class)
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.class_name())
    }
}
