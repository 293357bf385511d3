//! Host abstraction
//!
//! The scheduler never touches a document directly. Everything it needs
//! (querying marked elements, mutating classes and text, and the visibility
//! primitive) goes through [`Host`]. A browser host backs this with `web-sys`;
//! the headless host backs it with an in-memory page.

use std::fmt;

use slotmap::new_key_type;
use thiserror::Error;

use crate::geometry::ObserverConfig;

new_key_type! {
    /// Handle to an element registered with the scheduler
    pub struct ObservedId;
    /// Handle to a group of elements sharing one observer and one behavior
    pub struct GroupId;
}

impl ObservedId {
    /// Convert to raw u64, e.g. for storing in a DOM data attribute
    pub fn to_raw(self) -> u64 {
        self.0.as_ffi()
    }

    /// Reconstruct from a value produced by `to_raw()`
    pub fn from_raw(raw: u64) -> Self {
        ObservedId::from(slotmap::KeyData::from_ffi(raw))
    }
}

/// One element's report from a detection pass
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VisibilityEntry {
    pub id: ObservedId,
    pub intersection_ratio: f64,
    pub is_intersecting: bool,
}

impl VisibilityEntry {
    pub fn new(id: ObservedId, intersection_ratio: f64, is_intersecting: bool) -> Self {
        Self {
            id,
            intersection_ratio,
            is_intersecting,
        }
    }
}

/// The host's visibility primitive could not observe an element
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ObserveError {
    /// No visibility detection on this host
    #[error("visibility detection unavailable: {0}")]
    Unavailable(String),
}

/// Environment that owns the document and the visibility primitive
///
/// Query methods take `&self`; anything that changes what the user sees takes
/// `&mut self`. Mutations are fire-and-forget: a host that fails to apply one
/// should log and carry on.
pub trait Host {
    /// Opaque handle to a node in the host's document
    type Node: Clone + fmt::Debug;

    /// Elements carrying any of `classes`, in document order, each once
    fn query_classes(&self, classes: &[&str]) -> Vec<Self::Node>;

    /// Direct element children of `node`, in document order
    fn children(&self, node: &Self::Node) -> Vec<Self::Node>;

    /// Attribute value, if present
    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;

    /// Add a class to the node's class list
    fn add_class(&mut self, node: &Self::Node, class: &str);

    /// Set the node's inline `transition-delay`
    fn set_transition_delay(&mut self, node: &Self::Node, delay_ms: u32);

    /// Replace the node's text content
    fn set_text(&mut self, node: &Self::Node, text: &str);

    /// Start reporting visibility changes for `node`
    ///
    /// Reports must come back through the scheduler's visibility callback
    /// tagged with `id`, batched per `group`.
    fn observe(
        &mut self,
        group: GroupId,
        id: ObservedId,
        node: &Self::Node,
        config: &ObserverConfig,
    ) -> Result<(), ObserveError>;

    /// Stop reporting visibility changes for `node`
    fn unobserve(&mut self, group: GroupId, id: ObservedId, node: &Self::Node);
}
