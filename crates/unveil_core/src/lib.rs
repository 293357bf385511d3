//! Unveil Core
//!
//! Foundational types shared by every Unveil crate:
//!
//! - **Element handles**: `ObservedId` / `GroupId` keys minted by the scheduler
//! - **Host trait**: the seam between the scheduler and a real document
//! - **Visibility geometry**: rectangles, CSS root margins, intersection ratios
//! - **Markers**: the class names that classify revealable elements
//!
//! # Example
//!
//! ```rust
//! use unveil_core::{ObserverConfig, Rect, RootMargin};
//!
//! let config = ObserverConfig::new(0.15, RootMargin::parse("0px 0px -50px 0px").unwrap()).unwrap();
//! let viewport = Rect::new(0.0, 0.0, 1280.0, 800.0);
//! let card = Rect::new(0.0, 700.0, 400.0, 200.0);
//!
//! let visibility = config.measure(card, viewport);
//! assert!(visibility.is_intersecting);
//! ```

pub mod error;
pub mod geometry;
pub mod host;
pub mod marker;

pub use error::{Result, UnveilError};
pub use geometry::{intersection_ratio, MarginLength, ObserverConfig, Rect, RootMargin, Visibility};
pub use host::{GroupId, Host, ObserveError, ObservedId, VisibilityEntry};
pub use marker::Marker;
