//! DOM bindings

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use js_sys::{Array, WeakMap};
use rustc_hash::FxHashMap;
use tracing::{debug, info, warn};
use unveil_animation::css_seconds;
use unveil_reveal::{
    GroupId, Host, ObserveError, ObservedId, ObserverConfig, UnveilConfig,
    ViewportAnimationScheduler, VisibilityEntry,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    Document, Element, HtmlElement, IntersectionObserver, IntersectionObserverEntry,
    IntersectionObserverInit, Window,
};

use crate::{class_selector, meets_threshold, parse_config};

/// Receives every observer's batches, together with the observer itself
pub type IntersectCallback = Closure<dyn FnMut(Array, IntersectionObserver)>;
type FrameCallback = Closure<dyn FnMut(f64)>;

thread_local! {
    static RUNTIME: RefCell<Option<Rc<RefCell<Runtime>>>> = const { RefCell::new(None) };
}

/// Browser side of one reveal group
struct GroupObserver {
    observer: IntersectionObserver,
    /// `isIntersecting` alone is true at any overlap
    threshold: f64,
    /// Element -> raw `ObservedId` string. An element can carry markers for
    /// several groups, so each group keeps its own map.
    ids: WeakMap,
}

/// [`Host`] backed by the live document
pub struct DomHost {
    window: Window,
    document: Document,
    observers: FxHashMap<GroupId, GroupObserver>,
    on_intersect: Option<IntersectCallback>,
    supported: bool,
}

impl DomHost {
    pub fn new() -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let supported = js_sys::Reflect::has(&window, &JsValue::from_str("IntersectionObserver"))
            .unwrap_or(false);

        Ok(Self {
            window,
            document,
            observers: FxHashMap::default(),
            on_intersect: None,
            supported,
        })
    }

    /// Whether this browser has `IntersectionObserver`
    pub fn supports_intersection_observer(&self) -> bool {
        self.supported
    }

    /// Current `performance.now()`, or 0 without a performance timer
    pub fn now_ms(&self) -> f64 {
        self.window
            .performance()
            .map(|performance| performance.now())
            .unwrap_or(0.0)
    }

    /// Callback shared by every `IntersectionObserver` this host creates
    ///
    /// Without one, `observe` fails and elements are revealed at once.
    pub fn set_intersect_callback(&mut self, callback: IntersectCallback) {
        self.on_intersect = Some(callback);
    }

    /// Number of `IntersectionObserver`s created so far
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Handle `node` is observed under in `group`
    pub fn observed_id(&self, group: GroupId, node: &Element) -> Option<ObservedId> {
        let raw = self.observers.get(&group)?.ids.get(node).as_string()?;
        raw.parse().ok().map(ObservedId::from_raw)
    }

    fn observer_for(
        &mut self,
        group: GroupId,
        config: &ObserverConfig,
    ) -> Result<&GroupObserver, ObserveError> {
        if self.observers.contains_key(&group) {
            return Ok(&self.observers[&group]);
        }

        let callback = self
            .on_intersect
            .as_ref()
            .ok_or_else(|| ObserveError::Unavailable("no intersection callback".to_string()))?;

        let init = IntersectionObserverInit::new();
        init.set_threshold(&JsValue::from_f64(config.threshold));
        init.set_root_margin(&config.root_margin.to_string());

        let observer =
            IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &init)
                .map_err(|err| ObserveError::Unavailable(format!("{:?}", err)))?;

        debug!(
            "created IntersectionObserver for {:?} (threshold {}, margin {})",
            group, config.threshold, config.root_margin
        );
        let group_observer = GroupObserver {
            observer,
            threshold: config.threshold,
            ids: WeakMap::new(),
        };
        Ok(self.observers.entry(group).or_insert(group_observer))
    }

    /// Convert a batch delivered to the callback by `observer`
    fn entries_from_js(&self, observer: &IntersectionObserver, entries: &Array) -> Vec<VisibilityEntry> {
        let Some(group) = self.observers.values().find(|g| g.observer == *observer) else {
            warn!("batch from an unknown IntersectionObserver");
            return Vec::new();
        };

        entries
            .iter()
            .filter_map(|value| {
                let entry = value.dyn_into::<IntersectionObserverEntry>().ok()?;
                let raw = group.ids.get(&entry.target()).as_string()?;
                let id = ObservedId::from_raw(raw.parse().ok()?);
                let ratio = entry.intersection_ratio();
                Some(VisibilityEntry::new(
                    id,
                    ratio,
                    meets_threshold(entry.is_intersecting(), ratio, group.threshold),
                ))
            })
            .collect()
    }
}

impl Drop for DomHost {
    fn drop(&mut self) {
        for group_observer in self.observers.values() {
            group_observer.observer.disconnect();
        }
    }
}

impl Host for DomHost {
    type Node = Element;

    fn query_classes(&self, classes: &[&str]) -> Vec<Element> {
        if classes.is_empty() {
            return Vec::new();
        }

        let list = match self.document.query_selector_all(&class_selector(classes)) {
            Ok(list) => list,
            Err(err) => {
                warn!("querySelectorAll failed: {:?}", err);
                return Vec::new();
            }
        };

        (0..list.length())
            .filter_map(|i| list.item(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .collect()
    }

    fn children(&self, node: &Element) -> Vec<Element> {
        let children = node.children();
        (0..children.length())
            .filter_map(|i| children.item(i))
            .collect()
    }

    fn attribute(&self, node: &Element, name: &str) -> Option<String> {
        node.get_attribute(name)
    }

    fn add_class(&mut self, node: &Element, class: &str) {
        if let Err(err) = node.class_list().add_1(class) {
            warn!("failed to add class {}: {:?}", class, err);
        }
    }

    fn set_transition_delay(&mut self, node: &Element, delay_ms: u32) {
        let Some(element) = node.dyn_ref::<HtmlElement>() else {
            return;
        };
        if let Err(err) = element
            .style()
            .set_property("transition-delay", &css_seconds(delay_ms))
        {
            warn!("failed to set transition-delay: {:?}", err);
        }
    }

    fn set_text(&mut self, node: &Element, text: &str) {
        node.set_text_content(Some(text));
    }

    fn observe(
        &mut self,
        group: GroupId,
        id: ObservedId,
        node: &Element,
        config: &ObserverConfig,
    ) -> Result<(), ObserveError> {
        if !self.supported {
            return Err(ObserveError::Unavailable(
                "IntersectionObserver is not supported".to_string(),
            ));
        }

        let group_observer = self.observer_for(group, config)?;
        group_observer
            .ids
            .set(node, &JsValue::from_str(&id.to_raw().to_string()));
        group_observer.observer.observe(node);
        Ok(())
    }

    fn unobserve(&mut self, group: GroupId, _id: ObservedId, node: &Element) {
        if let Some(group_observer) = self.observers.get(&group) {
            group_observer.observer.unobserve(node);
            group_observer.ids.delete(node);
        }
    }
}

/// Scheduler, host and the frame loop state, shared with JS callbacks
struct Runtime {
    scheduler: ViewportAnimationScheduler<Element>,
    host: DomHost,
    on_frame: Option<FrameCallback>,
    frame_requested: bool,
}

impl Runtime {
    fn install(config: UnveilConfig) -> Result<Rc<RefCell<Runtime>>, JsValue> {
        let scheduler =
            ViewportAnimationScheduler::new(config).map_err(|err| JsValue::from_str(&err.to_string()))?;
        let runtime = Rc::new(RefCell::new(Runtime {
            scheduler,
            host: DomHost::new()?,
            on_frame: None,
            frame_requested: false,
        }));

        let weak = Rc::downgrade(&runtime);
        let on_intersect: IntersectCallback =
            Closure::new(move |entries: Array, observer: IntersectionObserver| {
                Runtime::handle_entries(&weak, &observer, &entries);
            });

        let weak = Rc::downgrade(&runtime);
        let on_frame: FrameCallback = Closure::new(move |timestamp: f64| {
            Runtime::handle_frame(&weak, timestamp);
        });

        {
            let mut rt = runtime.borrow_mut();
            rt.host.set_intersect_callback(on_intersect);
            rt.on_frame = Some(on_frame);
        }

        Ok(runtime)
    }

    fn scan(runtime: &Rc<RefCell<Runtime>>) {
        {
            let mut rt = runtime.borrow_mut();
            let Runtime {
                scheduler, host, ..
            } = &mut *rt;

            if !host.supports_intersection_observer() {
                warn!("IntersectionObserver unavailable, revealing everything");
            }

            let groups = scheduler.register_document(host);
            info!(
                "unveil: {} elements in {} groups",
                scheduler.element_count(),
                groups.len()
            );
        }
        Runtime::request_frame(runtime);
    }

    fn handle_entries(weak: &Weak<RefCell<Runtime>>, observer: &IntersectionObserver, entries: &Array) {
        let Some(runtime) = weak.upgrade() else {
            return;
        };

        {
            let mut rt = runtime.borrow_mut();
            let Runtime {
                scheduler, host, ..
            } = &mut *rt;

            let entries = host.entries_from_js(observer, entries);
            let now = host.now_ms();
            scheduler.on_visibility_change(host, now, &entries);
        }
        Runtime::request_frame(&runtime);
    }

    fn handle_frame(weak: &Weak<RefCell<Runtime>>, timestamp: f64) {
        let Some(runtime) = weak.upgrade() else {
            return;
        };

        {
            let mut rt = runtime.borrow_mut();
            rt.frame_requested = false;
            let Runtime {
                scheduler, host, ..
            } = &mut *rt;
            scheduler.tick(host, timestamp);
        }
        Runtime::request_frame(&runtime);
    }

    /// Keep the frame loop alive only while there is work
    fn request_frame(runtime: &Rc<RefCell<Runtime>>) {
        let mut rt = runtime.borrow_mut();
        if rt.frame_requested || !rt.scheduler.has_pending_work() {
            return;
        }

        let Some(callback) = rt.on_frame.as_ref() else {
            return;
        };
        let requested = rt
            .host
            .window
            .request_animation_frame(callback.as_ref().unchecked_ref());
        match requested {
            Ok(_) => rt.frame_requested = true,
            Err(err) => warn!("requestAnimationFrame failed: {:?}", err),
        }
    }
}

fn launch(config: UnveilConfig) -> Result<(), JsValue> {
    let already_running = RUNTIME.with(|slot| slot.borrow().is_some());
    if already_running {
        warn!("unveil already started");
        return Ok(());
    }

    let runtime = Runtime::install(config)?;
    Runtime::scan(&runtime);
    RUNTIME.with(|slot| *slot.borrow_mut() = Some(runtime));
    Ok(())
}

/// Scan the document with the default configuration
#[wasm_bindgen]
pub fn start() -> Result<(), JsValue> {
    launch(UnveilConfig::default())
}

/// Scan the document with a JSON configuration
#[wasm_bindgen]
pub fn start_with_config(config: &str) -> Result<(), JsValue> {
    let config = parse_config(config).map_err(|err| JsValue::from_str(&err))?;
    launch(config)
}

#[wasm_bindgen(start)]
pub fn main_js() {
    std::panic::set_hook(Box::new(console_error_panic_hook::hook));
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&JsValue::from_str("unveil: logger already set"));
    }

    #[cfg(feature = "autostart")]
    if let Err(err) = start() {
        web_sys::console::error_1(&err);
    }
}
