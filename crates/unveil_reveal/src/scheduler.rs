//! Viewport animation scheduler
//!
//! Owns every registered element and decides what happens when the host's
//! visibility primitive reports on it. The host drives everything:
//!
//! 1. `register` / `register_document` once at startup
//! 2. `on_visibility_change` for every detection pass
//! 3. `tick` once per animation frame while `has_pending_work()` is true
//!
//! Each element triggers at most once. The `triggered` flag is checked before
//! anything else, so repeated or late visibility reports are ignored even if
//! the host keeps delivering them.
//!
//! If the host cannot observe an element, that element is brought to its
//! final state on the spot: content is never left hidden.

use rustc_hash::FxHashMap;
use slotmap::{SecondaryMap, SlotMap};
use tracing::{debug, trace, warn};
use unveil_animation::{
    format_count, parse_count_target, CountUpAnimator, FrameQueue, StaggerConfig,
};
use unveil_core::{GroupId, Host, ObservedId, ObserverConfig, VisibilityEntry};

use crate::behavior::{Action, RevealBehavior};
use crate::config::{ConfigError, TimelineIndexing, UnveilConfig};

struct ObservedElement<N> {
    node: N,
    group: GroupId,
    /// Position within the group at registration
    order: usize,
    /// Set on the first qualifying report, never cleared
    triggered: bool,
    /// Host is still reporting on this element
    observing: bool,
}

struct RevealGroup {
    observer: ObserverConfig,
    behavior: RevealBehavior,
    members: Vec<ObservedId>,
}

struct CounterState {
    animator: CountUpAnimator,
    display: String,
}

/// Schedules one-shot reveal effects as elements scroll into view
pub struct ViewportAnimationScheduler<N> {
    config: UnveilConfig,
    elements: SlotMap<ObservedId, ObservedElement<N>>,
    groups: SlotMap<GroupId, RevealGroup>,
    counters: SecondaryMap<ObservedId, CounterState>,
    queue: FrameQueue<Action>,
}

impl<N: Clone + std::fmt::Debug> ViewportAnimationScheduler<N> {
    /// Create a scheduler, validating `config` first
    pub fn new(config: UnveilConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            elements: SlotMap::with_key(),
            groups: SlotMap::with_key(),
            counters: SecondaryMap::new(),
            queue: FrameQueue::new(),
        })
    }

    pub fn config(&self) -> &UnveilConfig {
        &self.config
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Start monitoring `elements` as one group
    ///
    /// Elements the host refuses to observe are revealed immediately.
    pub fn register<H>(
        &mut self,
        host: &mut H,
        elements: Vec<N>,
        observer: ObserverConfig,
        behavior: RevealBehavior,
    ) -> GroupId
    where
        H: Host<Node = N>,
    {
        let group = self.groups.insert(RevealGroup {
            observer,
            behavior,
            members: Vec::with_capacity(elements.len()),
        });

        debug!(
            "register {} group: {} elements, threshold {}, margin {}",
            behavior,
            elements.len(),
            observer.threshold,
            observer.root_margin
        );

        let mut fail_open = Vec::new();
        for (order, node) in elements.into_iter().enumerate() {
            let id = self.elements.insert(ObservedElement {
                node: node.clone(),
                group,
                order,
                triggered: false,
                observing: false,
            });
            self.groups[group].members.push(id);

            // Once the primitive has failed, don't keep asking
            if !fail_open.is_empty() {
                fail_open.push(id);
                continue;
            }

            match host.observe(group, id, &node, &observer) {
                Ok(()) => self.elements[id].observing = true,
                Err(err) => {
                    warn!("{} group falling back to immediate reveal: {}", behavior, err);
                    fail_open.push(id);
                }
            }
        }

        for id in fail_open {
            self.finish_immediately(host, id);
        }

        group
    }

    /// Scan the host document for every marker and register one group per
    /// behavior, using the configured observer settings
    ///
    /// Behaviors with no matching elements are skipped.
    pub fn register_document<H>(&mut self, host: &mut H) -> Vec<GroupId>
    where
        H: Host<Node = N>,
    {
        let mut groups = Vec::new();

        for behavior in RevealBehavior::ALL {
            let classes: Vec<&str> = behavior.markers().iter().map(|m| m.class_name()).collect();
            let nodes = host.query_classes(&classes);
            if nodes.is_empty() {
                debug!("no {} elements in document", behavior);
                continue;
            }

            // Validated in `new`
            let observer = match self.config.observer(behavior) {
                Ok(observer) => observer,
                Err(err) => {
                    warn!("skipping {} group: {}", behavior, err);
                    continue;
                }
            };

            groups.push(self.register(host, nodes, observer, behavior));
        }

        groups
    }

    // =========================================================================
    // Host callbacks
    // =========================================================================

    /// Handle one detection pass
    ///
    /// `entries` is the batch delivered by the host's visibility primitive.
    /// Timeline cascade positions count every entry of the same group in this
    /// batch, including entries that are not intersecting.
    pub fn on_visibility_change<H>(&mut self, host: &mut H, now_ms: f64, entries: &[VisibilityEntry])
    where
        H: Host<Node = N>,
    {
        let mut batch_positions: FxHashMap<GroupId, usize> = FxHashMap::default();

        for entry in entries {
            let Some(element) = self.elements.get(entry.id) else {
                trace!("ignoring report for unknown element {:?}", entry.id);
                continue;
            };

            let position = batch_positions.entry(element.group).or_insert(0);
            let index_in_batch = *position;
            *position += 1;

            if element.triggered || !entry.is_intersecting {
                continue;
            }

            self.trigger(host, entry.id, now_ms, index_in_batch);
        }
    }

    /// Run everything due at `now_ms`: delayed activations and counter frames
    pub fn tick<H>(&mut self, host: &mut H, now_ms: f64)
    where
        H: Host<Node = N>,
    {
        for action in self.queue.advance(now_ms) {
            match action {
                Action::Activate(id) => self.activate(host, id),
                Action::CounterFrame(id) => self.render_counter_frame(host, id, now_ms),
            }
        }
    }

    /// Whether another `tick` has work to do
    pub fn has_pending_work(&self) -> bool {
        !self.queue.is_idle()
    }

    /// Earliest pending delayed activation
    pub fn next_deadline(&self) -> Option<f64> {
        self.queue.next_deadline()
    }

    /// Bring every untriggered element to its final state right now and
    /// release every observation
    pub fn reveal_all<H>(&mut self, host: &mut H)
    where
        H: Host<Node = N>,
    {
        let ids: Vec<ObservedId> = self.elements.keys().collect();

        for id in ids {
            self.stop_observing(host, id);
            if !self.is_triggered(id) {
                self.finish_immediately(host, id);
            }
        }
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    pub fn is_triggered(&self, id: ObservedId) -> bool {
        self.elements.get(id).map(|e| e.triggered).unwrap_or(false)
    }

    pub fn is_observing(&self, id: ObservedId) -> bool {
        self.elements.get(id).map(|e| e.observing).unwrap_or(false)
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Members of a group in registration order
    pub fn group_members(&self, group: GroupId) -> &[ObservedId] {
        self.groups
            .get(group)
            .map(|g| g.members.as_slice())
            .unwrap_or(&[])
    }

    pub fn group_behavior(&self, group: GroupId) -> Option<RevealBehavior> {
        self.groups.get(group).map(|g| g.behavior)
    }

    pub fn group_observer(&self, group: GroupId) -> Option<ObserverConfig> {
        self.groups.get(group).map(|g| g.observer)
    }

    pub fn node(&self, id: ObservedId) -> Option<&N> {
        self.elements.get(id).map(|e| &e.node)
    }

    /// Text most recently rendered for a counter
    pub fn counter_display(&self, id: ObservedId) -> Option<&str> {
        self.counters.get(id).map(|c| c.display.as_str())
    }

    // =========================================================================
    // Behaviors
    // =========================================================================

    fn behavior_of(&self, id: ObservedId) -> Option<RevealBehavior> {
        let element = self.elements.get(id)?;
        self.groups.get(element.group).map(|g| g.behavior)
    }

    fn stop_observing<H>(&mut self, host: &mut H, id: ObservedId)
    where
        H: Host<Node = N>,
    {
        if let Some(element) = self.elements.get_mut(id) {
            if element.observing {
                element.observing = false;
                host.unobserve(element.group, id, &element.node);
            }
        }
    }

    fn trigger<H>(&mut self, host: &mut H, id: ObservedId, now_ms: f64, index_in_batch: usize)
    where
        H: Host<Node = N>,
    {
        let Some(behavior) = self.behavior_of(id) else {
            return;
        };
        let Some(element) = self.elements.get_mut(id) else {
            return;
        };
        element.triggered = true;
        let order = element.order;

        debug!("{} element {:?} entered view at {:.1}ms", behavior, id, now_ms);

        // Per-batch positions count every reported item, active ones included
        let keep_observing = behavior == RevealBehavior::Timeline
            && self.config.timeline.indexing == TimelineIndexing::PerBatch;
        if !keep_observing {
            self.stop_observing(host, id);
        }

        match behavior {
            RevealBehavior::Reveal => {
                let delay = self.config.reveal.delay_ms as f64;
                self.queue.set_timeout(now_ms, delay, Action::Activate(id));
            }
            RevealBehavior::Stagger => self.cascade_children(host, id),
            RevealBehavior::Counter => self.start_counter(host, id, now_ms),
            RevealBehavior::Timeline => {
                let position = match self.config.timeline.indexing {
                    TimelineIndexing::PerBatch => index_in_batch,
                    TimelineIndexing::Registration => order,
                };
                let delay = StaggerConfig::new(self.config.timeline.step_ms).delay_for_index(position);
                self.queue
                    .set_timeout(now_ms, delay as f64, Action::Activate(id));
            }
        }
    }

    /// Final state without animation, for fail-open paths
    fn finish_immediately<H>(&mut self, host: &mut H, id: ObservedId)
    where
        H: Host<Node = N>,
    {
        let Some(behavior) = self.behavior_of(id) else {
            return;
        };
        let Some(element) = self.elements.get_mut(id) else {
            return;
        };
        element.triggered = true;

        match behavior {
            RevealBehavior::Reveal | RevealBehavior::Timeline => self.activate(host, id),
            RevealBehavior::Stagger => self.cascade_children(host, id),
            RevealBehavior::Counter => {
                let target = self.read_counter_target(host, id);
                let mut animator = CountUpAnimator::new(target, 0.0).with_duration(0.0);
                let frame = animator.sample(0.0);
                self.write_counter(host, id, animator, frame.value);
            }
        }
    }

    fn activate<H>(&mut self, host: &mut H, id: ObservedId)
    where
        H: Host<Node = N>,
    {
        let Some(behavior) = self.behavior_of(id) else {
            return;
        };
        let class = match behavior {
            RevealBehavior::Timeline => &self.config.timeline.active_class,
            RevealBehavior::Stagger => &self.config.stagger.active_class,
            _ => &self.config.reveal.active_class,
        };

        if let Some(element) = self.elements.get(id) {
            host.add_class(&element.node, class);
        }
    }

    fn cascade_children<H>(&mut self, host: &mut H, id: ObservedId)
    where
        H: Host<Node = N>,
    {
        let Some(element) = self.elements.get(id) else {
            return;
        };
        let container = element.node.clone();
        let stagger = StaggerConfig::new(self.config.stagger.step_ms);

        let children = host.children(&container);
        for (child, delay_ms) in children.iter().zip(stagger.delays(children.len())) {
            host.set_transition_delay(child, delay_ms);
            host.add_class(child, &self.config.stagger.child_class);
        }
        host.add_class(&container, &self.config.stagger.active_class);

        debug!("staggered {} children of {:?}", children.len(), id);
    }

    fn read_counter_target<H>(&self, host: &H, id: ObservedId) -> u64
    where
        H: Host<Node = N>,
    {
        let Some(element) = self.elements.get(id) else {
            return 0;
        };
        let raw = host.attribute(&element.node, &self.config.counter.attribute);
        match raw.as_deref().and_then(parse_count_target) {
            Some(target) => target,
            None => {
                warn!(
                    "counter {:?} has unusable {}={:?}, counting to 0",
                    id, self.config.counter.attribute, raw
                );
                0
            }
        }
    }

    fn start_counter<H>(&mut self, host: &mut H, id: ObservedId, now_ms: f64)
    where
        H: Host<Node = N>,
    {
        let target = self.read_counter_target(host, id);
        let animator = CountUpAnimator::new(target, now_ms)
            .with_duration(self.config.counter.duration_ms as f64)
            .with_easing(self.config.counter.easing);

        self.counters.insert(
            id,
            CounterState {
                animator,
                display: String::new(),
            },
        );
        self.queue.request_frame(Action::CounterFrame(id));
    }

    fn render_counter_frame<H>(&mut self, host: &mut H, id: ObservedId, now_ms: f64)
    where
        H: Host<Node = N>,
    {
        let Some(state) = self.counters.get_mut(id) else {
            return;
        };
        let frame = state.animator.sample(now_ms);
        let animator = state.animator.clone();
        self.write_counter(host, id, animator, frame.value);

        if frame.finished {
            trace!("counter {:?} finished at {}", id, frame.value);
        } else {
            self.queue.request_frame(Action::CounterFrame(id));
        }
    }

    fn write_counter<H>(&mut self, host: &mut H, id: ObservedId, animator: CountUpAnimator, value: u64)
    where
        H: Host<Node = N>,
    {
        let text = format_count(
            value,
            &self.config.counter.group_separator,
            &self.config.counter.suffix,
        );

        let Some(element) = self.elements.get(id) else {
            return;
        };
        let previous = self.counters.get(id).map(|c| c.display.as_str());
        if previous != Some(text.as_str()) {
            trace!("counter {:?} -> {}", id, text);
            host.set_text(&element.node, &text);
        }

        self.counters.insert(
            id,
            CounterState {
                animator,
                display: text,
            },
        );
    }
}
