//! Unveil Reveal
//!
//! Scroll-triggered entrance effects for a document. Elements are tagged with
//! marker classes and registered in groups; when an element first crosses its
//! group's visibility threshold, the group's behavior runs exactly once.
//!
//! | Marker class | Behavior |
//! |--------------|----------|
//! | `reveal`, `reveal-left`, `reveal-right`, `reveal-scale` | `active` after 100ms |
//! | `stagger-children` | children get cascading delays and `stagger-visible` |
//! | `stat-number` | counts up to `data-count` over 2s |
//! | `timeline-item` | `active` after 150ms per cascade position |
//!
//! # Driving the scheduler
//!
//! The scheduler owns no timers and no threads. The host calls
//! [`ViewportAnimationScheduler::on_visibility_change`] for each detection pass
//! and [`ViewportAnimationScheduler::tick`] once per frame while
//! [`ViewportAnimationScheduler::has_pending_work`] is true.
//!
//! [`HeadlessPage`] is a complete host for tests and offline simulation.

pub mod behavior;
pub mod config;
pub mod headless;
pub mod scheduler;


pub use behavior::RevealBehavior;
pub use config::{
    ConfigError, CounterSection, RevealSection, StaggerSection, TimelineIndexing,
    TimelineSection, UnveilConfig,
};
pub use headless::{HeadlessPage, LoggedMutation, Mutation, NodeId, PageNode};
pub use scheduler::ViewportAnimationScheduler;

// Re-export the core types hosts need alongside the scheduler
pub use unveil_core::{
    GroupId, Host, Marker, ObserveError, ObservedId, ObserverConfig, Rect, RootMargin,
    VisibilityEntry,
};
