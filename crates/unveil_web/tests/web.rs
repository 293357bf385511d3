//! Browser tests for the DOM host
//!
//! Run with `wasm-pack test --headless --firefox crates/unveil_web`.

#![cfg(target_arch = "wasm32")]

use js_sys::Array;
use unveil_reveal::{
    GroupId, Host, RevealBehavior, UnveilConfig, ViewportAnimationScheduler,
};
use unveil_web::{start, start_with_config, DomHost, IntersectCallback};
use wasm_bindgen::closure::Closure;
use wasm_bindgen_test::*;
use web_sys::{Element, IntersectionObserver};

wasm_bindgen_test_configure!(run_in_browser);

fn mount(html: &str) -> Element {
    let document = web_sys::window().unwrap().document().unwrap();
    let root = document.create_element("div").unwrap();
    root.set_inner_html(html);
    document.body().unwrap().append_child(&root).unwrap();
    root
}

#[wasm_bindgen_test]
fn query_classes_in_document_order() {
    let root = mount(
        r#"<p class="reveal" id="q1"></p><p class="plain"></p><p class="reveal-left reveal" id="q2"></p>"#,
    );
    let host = DomHost::new().unwrap();

    let ids: Vec<String> = host
        .query_classes(&["reveal", "reveal-left"])
        .iter()
        .map(|e| e.id())
        .collect();
    assert_eq!(ids, vec!["q1", "q2"]);
    root.remove();
}

#[wasm_bindgen_test]
fn mutations_reach_the_dom() {
    let root = mount(r#"<div class="stagger-children"><span></span><span></span></div>"#);
    let mut host = DomHost::new().unwrap();

    let grid = host.query_classes(&["stagger-children"]).remove(0);
    let children = host.children(&grid);
    assert_eq!(children.len(), 2);

    host.set_transition_delay(&children[1], 120);
    host.add_class(&children[1], "stagger-visible");
    host.set_text(&children[0], "1,500+");

    let second = children[1].get_attribute("style").unwrap_or_default();
    assert!(second.contains("transition-delay: 0.12s"));
    assert!(children[1].class_list().contains("stagger-visible"));
    assert_eq!(children[0].text_content().as_deref(), Some("1,500+"));
    root.remove();
}

#[wasm_bindgen_test]
fn register_without_intersect_callback_fails_open() {
    let root = mount(r#"<div class="timeline-item"></div><div class="timeline-item"></div>"#);
    let mut host = DomHost::new().unwrap();
    assert!(host.supports_intersection_observer());

    let mut scheduler = ViewportAnimationScheduler::new(UnveilConfig::default()).unwrap();
    let items = host.children(&root);
    let observer = scheduler
        .config()
        .observer(RevealBehavior::Timeline)
        .unwrap();
    let group = scheduler.register(&mut host, items.clone(), observer, RevealBehavior::Timeline);

    for id in scheduler.group_members(group) {
        assert!(scheduler.is_triggered(*id));
    }
    for item in &items {
        assert!(item.class_list().contains("active"));
    }
    assert_eq!(host.observer_count(), 0);
    root.remove();
}

fn register(
    scheduler: &mut ViewportAnimationScheduler<Element>,
    host: &mut DomHost,
    elements: Vec<Element>,
    behavior: RevealBehavior,
) -> GroupId {
    let observer = scheduler.config().observer(behavior).unwrap();
    scheduler.register(host, elements, observer, behavior)
}

#[wasm_bindgen_test]
fn element_in_two_groups_keeps_one_id_per_group() {
    let root = mount(r#"<div class="reveal timeline-item"></div><div class="timeline-item"></div>"#);
    let mut host = DomHost::new().unwrap();
    let callback: IntersectCallback = Closure::new(|_: Array, _: IntersectionObserver| {});
    host.set_intersect_callback(callback);

    let mut scheduler = ViewportAnimationScheduler::new(UnveilConfig::default()).unwrap();
    let children = host.children(&root);
    let both = children[0].clone();
    let reveal = register(&mut scheduler, &mut host, vec![both.clone()], RevealBehavior::Reveal);
    let timeline = register(&mut scheduler, &mut host, children, RevealBehavior::Timeline);

    assert_eq!(host.observer_count(), 2);

    let reveal_id = scheduler.group_members(reveal)[0];
    let timeline_id = scheduler.group_members(timeline)[0];
    assert_ne!(reveal_id, timeline_id);
    assert_eq!(host.observed_id(reveal, &both), Some(reveal_id));
    assert_eq!(host.observed_id(timeline, &both), Some(timeline_id));
    for id in scheduler.group_members(timeline) {
        assert!(scheduler.is_observing(*id));
    }

    scheduler.reveal_all(&mut host);
    assert_eq!(host.observed_id(reveal, &both), None);
    assert_eq!(host.observed_id(timeline, &both), None);
    assert!(both.class_list().contains("active"));
    root.remove();
}

#[wasm_bindgen_test]
fn start_scans_once() {
    let root = mount(r#"<p class="reveal"></p><p class="stat-number" data-count="12"></p>"#);
    assert!(start().is_ok());
    // A second call is ignored
    assert!(start_with_config("{}").is_ok());
    root.remove();
}

#[wasm_bindgen_test]
fn start_with_config_rejects_bad_json() {
    assert!(start_with_config("{").is_err());
}
