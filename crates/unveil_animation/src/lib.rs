//! Unveil Animation System
//!
//! Timing primitives for scroll-triggered animations.
//!
//! # Features
//!
//! - **Easing**: Named easing curves, including the ease-out quartic used by counters
//! - **Count-up**: Wall-clock driven numeric animation from 0 to a target
//! - **Stagger**: Per-child delays for cascading reveals
//! - **Frame queue**: Host-driven timers and frame requests, no threads

pub mod count_up;
pub mod easing;
pub mod frame;
pub mod stagger;

pub use count_up::{
    format_count, group_digits, parse_count_target, CountUpAnimator, CountUpFrame,
    DEFAULT_COUNT_DURATION_MS,
};
pub use easing::Easing;
pub use frame::{FrameId, FrameQueue, TimerId};
pub use stagger::{css_seconds, StaggerConfig};
