//! Headless host
//!
//! An in-memory page laid out in document pixels, with a scrollable viewport.
//! Visibility is computed geometrically on every [`HeadlessPage::detect`] call,
//! and every mutation the scheduler makes is recorded so callers can replay or
//! assert on it.
//!
//! ```rust
//! use unveil_core::Rect;
//! use unveil_reveal::{HeadlessPage, UnveilConfig, ViewportAnimationScheduler};
//!
//! let mut page = HeadlessPage::new(1280.0, 800.0);
//! let card = page.add_node("card reveal", Rect::new(0.0, 1200.0, 400.0, 300.0));
//!
//! let mut scheduler = ViewportAnimationScheduler::new(UnveilConfig::default()).unwrap();
//! scheduler.register_document(&mut page);
//!
//! page.step(&mut scheduler, 0.0);
//! assert!(!page.has_class(card, "active"));
//!
//! page.scroll_to(800.0);
//! page.step(&mut scheduler, 1000.0);
//! page.step(&mut scheduler, 1100.0);
//! assert!(page.has_class(card, "active"));
//! ```

use std::fmt;

use rustc_hash::FxHashMap;
use tracing::trace;
use unveil_core::{GroupId, Host, ObserveError, ObservedId, ObserverConfig, Rect, VisibilityEntry};

use crate::scheduler::ViewportAnimationScheduler;

/// Index of a node in a [`HeadlessPage`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single element of the page
#[derive(Clone, Debug, Default)]
pub struct PageNode {
    pub classes: Vec<String>,
    pub attributes: FxHashMap<String, String>,
    pub text: String,
    /// Inline `transition-delay`, if one was set
    pub transition_delay_ms: Option<u32>,
    /// Position in document pixels
    pub rect: Rect,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// A change the scheduler made to the page
#[derive(Clone, Debug, PartialEq)]
pub enum Mutation {
    AddClass { node: NodeId, class: String },
    TransitionDelay { node: NodeId, delay_ms: u32 },
    Text { node: NodeId, text: String },
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mutation::AddClass { node, class } => write!(f, "{} +class {}", node, class),
            Mutation::TransitionDelay { node, delay_ms } => {
                write!(f, "{} transition-delay {}", node, unveil_animation::css_seconds(*delay_ms))
            }
            Mutation::Text { node, text } => write!(f, "{} text {:?}", node, text),
        }
    }
}

/// Mutation stamped with the page clock at the time it was applied
#[derive(Clone, Debug, PartialEq)]
pub struct LoggedMutation {
    pub at_ms: f64,
    pub mutation: Mutation,
}

struct Observation {
    group: GroupId,
    id: ObservedId,
    node: NodeId,
    config: ObserverConfig,
    /// `None` until the first detection after `observe`
    last_intersecting: Option<bool>,
}

/// In-memory document implementing [`Host`]
pub struct HeadlessPage {
    nodes: Vec<PageNode>,
    roots: Vec<NodeId>,
    viewport_width: f64,
    viewport_height: f64,
    scroll_y: f64,
    detection_enabled: bool,
    observations: Vec<Observation>,
    mutations: Vec<LoggedMutation>,
    clock_ms: f64,
}

impl HeadlessPage {
    /// Empty page with a viewport of the given size, scrolled to the top
    pub fn new(viewport_width: f64, viewport_height: f64) -> Self {
        Self {
            nodes: Vec::new(),
            roots: Vec::new(),
            viewport_width,
            viewport_height,
            scroll_y: 0.0,
            detection_enabled: true,
            observations: Vec::new(),
            mutations: Vec::new(),
            clock_ms: 0.0,
        }
    }

    /// Page whose `observe` always fails, as in a browser without
    /// `IntersectionObserver`
    pub fn without_visibility_detection(viewport_width: f64, viewport_height: f64) -> Self {
        let mut page = Self::new(viewport_width, viewport_height);
        page.detection_enabled = false;
        page
    }

    pub fn detection_enabled(&self) -> bool {
        self.detection_enabled
    }

    // =========================================================================
    // Building
    // =========================================================================

    fn push_node(&mut self, classes: &str, rect: Rect, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(PageNode {
            classes: classes.split_whitespace().map(str::to_string).collect(),
            rect,
            parent,
            ..Default::default()
        });
        match parent {
            Some(parent) => self.nodes[parent.0].children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    /// Append a top-level node with a space-separated class list
    pub fn add_node(&mut self, classes: &str, rect: Rect) -> NodeId {
        self.push_node(classes, rect, None)
    }

    /// Append a child of `parent`
    pub fn add_child(&mut self, parent: NodeId, classes: &str, rect: Rect) -> NodeId {
        self.push_node(classes, rect, Some(parent))
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        self.nodes[node.0]
            .attributes
            .insert(name.to_string(), value.to_string());
    }

    pub fn set_initial_text(&mut self, node: NodeId, text: &str) {
        self.nodes[node.0].text = text.to_string();
    }

    // =========================================================================
    // Viewport
    // =========================================================================

    /// Viewport in document coordinates
    pub fn viewport(&self) -> Rect {
        Rect::new(
            0.0,
            self.scroll_y,
            self.viewport_width,
            self.viewport_height,
        )
    }

    /// Scroll vertically to `y`
    pub fn scroll_to(&mut self, y: f64) {
        self.scroll_y = y.max(0.0);
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    pub fn node(&self, node: NodeId) -> &PageNode {
        &self.nodes[node.0]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Every node in document order
    pub fn document_order(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            order.push(node);
            stack.extend(self.nodes[node.0].children.iter().rev().copied());
        }
        order
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.nodes[node.0].classes.iter().any(|c| c == class)
    }

    pub fn text(&self, node: NodeId) -> &str {
        &self.nodes[node.0].text
    }

    pub fn transition_delay(&self, node: NodeId) -> Option<u32> {
        self.nodes[node.0].transition_delay_ms
    }

    /// Whether `node` is still being watched
    pub fn is_observed(&self, node: NodeId) -> bool {
        self.observations.iter().any(|o| o.node == node)
    }

    pub fn observation_count(&self) -> usize {
        self.observations.len()
    }

    pub fn mutations(&self) -> &[LoggedMutation] {
        &self.mutations
    }

    /// Drain the mutation log
    pub fn take_mutations(&mut self) -> Vec<LoggedMutation> {
        std::mem::take(&mut self.mutations)
    }

    // =========================================================================
    // Driving
    // =========================================================================

    /// Run one detection pass at `now_ms`
    ///
    /// An element is reported on the first pass after it was observed, then
    /// only when its intersecting state flips. Entries are batched per group,
    /// in observation order.
    pub fn detect(&mut self, now_ms: f64) -> Vec<(GroupId, Vec<VisibilityEntry>)> {
        self.clock_ms = now_ms;
        let viewport = self.viewport();
        let mut batches: Vec<(GroupId, Vec<VisibilityEntry>)> = Vec::new();

        for observation in &mut self.observations {
            let rect = self.nodes[observation.node.0].rect;
            let visibility = observation.config.measure(rect, viewport);

            if observation.last_intersecting == Some(visibility.is_intersecting) {
                continue;
            }
            observation.last_intersecting = Some(visibility.is_intersecting);

            let entry = VisibilityEntry::new(
                observation.id,
                visibility.intersection_ratio,
                visibility.is_intersecting,
            );
            match batches.iter_mut().find(|(group, _)| *group == observation.group) {
                Some((_, entries)) => entries.push(entry),
                None => batches.push((observation.group, vec![entry])),
            }
        }

        batches
    }

    /// One frame: detect, deliver every batch, then tick the scheduler
    pub fn step(&mut self, scheduler: &mut ViewportAnimationScheduler<NodeId>, now_ms: f64) {
        for (group, entries) in self.detect(now_ms) {
            trace!("detection pass at {:.1}ms: {} entries for {:?}", now_ms, entries.len(), group);
            scheduler.on_visibility_change(self, now_ms, &entries);
        }
        scheduler.tick(self, now_ms);
    }

    fn log(&mut self, mutation: Mutation) {
        self.mutations.push(LoggedMutation {
            at_ms: self.clock_ms,
            mutation,
        });
    }
}

impl Host for HeadlessPage {
    type Node = NodeId;

    fn query_classes(&self, classes: &[&str]) -> Vec<NodeId> {
        self.document_order()
            .into_iter()
            .filter(|node| {
                self.nodes[node.0]
                    .classes
                    .iter()
                    .any(|c| classes.contains(&c.as_str()))
            })
            .collect()
    }

    fn children(&self, node: &NodeId) -> Vec<NodeId> {
        self.nodes[node.0].children.clone()
    }

    fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
        self.nodes[node.0].attributes.get(name).cloned()
    }

    fn add_class(&mut self, node: &NodeId, class: &str) {
        let classes = &mut self.nodes[node.0].classes;
        if !classes.iter().any(|c| c == class) {
            classes.push(class.to_string());
        }
        self.log(Mutation::AddClass {
            node: *node,
            class: class.to_string(),
        });
    }

    fn set_transition_delay(&mut self, node: &NodeId, delay_ms: u32) {
        self.nodes[node.0].transition_delay_ms = Some(delay_ms);
        self.log(Mutation::TransitionDelay {
            node: *node,
            delay_ms,
        });
    }

    fn set_text(&mut self, node: &NodeId, text: &str) {
        self.nodes[node.0].text = text.to_string();
        self.log(Mutation::Text {
            node: *node,
            text: text.to_string(),
        });
    }

    fn observe(
        &mut self,
        group: GroupId,
        id: ObservedId,
        node: &NodeId,
        config: &ObserverConfig,
    ) -> Result<(), ObserveError> {
        if !self.detection_enabled {
            return Err(ObserveError::Unavailable(
                "headless page built without visibility detection".to_string(),
            ));
        }

        self.observations.push(Observation {
            group,
            id,
            node: *node,
            config: *config,
            last_intersecting: None,
        });
        Ok(())
    }

    fn unobserve(&mut self, _group: GroupId, id: ObservedId, _node: &NodeId) {
        self.observations.retain(|o| o.id != id);
    }
}
