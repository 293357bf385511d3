//! Scroll session replay
//!
//! Drives the scheduler over a [`LoadedPage`] the way a browser would: one
//! detection pass and one tick per frame, with the scroll script applied at
//! the start of each frame.

use anyhow::{bail, Result};
use tracing::debug;
use unveil_reveal::{
    LoggedMutation, Marker, NodeId, UnveilConfig, ViewportAnimationScheduler,
};

use crate::page::LoadedPage;

/// Frame loop settings
#[derive(Debug, Clone, Copy)]
pub struct SimulationOptions {
    pub frame_ms: f64,
    /// Stop here instead of when the page goes idle
    pub until_ms: Option<f64>,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        Self {
            frame_ms: 16.0,
            until_ms: None,
        }
    }
}

/// Final state of one marked element
#[derive(Debug, Clone, PartialEq)]
pub struct ElementSummary {
    pub name: String,
    pub marker: Option<Marker>,
    pub triggered: bool,
    pub classes: Vec<String>,
    pub text: String,
}

/// Everything a simulation produced
#[derive(Debug, Clone)]
pub struct SimulationReport {
    pub mutations: Vec<LoggedMutation>,
    pub elements: Vec<ElementSummary>,
    pub frames: usize,
    pub ended_at_ms: f64,
}

/// Replay the page's scroll script until it goes idle or `until_ms`
pub fn run(
    loaded: &mut LoadedPage,
    config: UnveilConfig,
    options: SimulationOptions,
) -> Result<SimulationReport> {
    if options.frame_ms.is_nan() || options.frame_ms <= 0.0 {
        bail!("Frame interval must be positive, got {}ms", options.frame_ms);
    }
    if let Some(until) = options.until_ms {
        if !until.is_finite() {
            bail!("Stop time must be finite, got {}ms", until);
        }
    }

    let mut scheduler = ViewportAnimationScheduler::<NodeId>::new(config)?;
    let groups = scheduler.register_document(&mut loaded.page);
    debug!(
        "registered {} elements in {} groups",
        scheduler.element_count(),
        groups.len()
    );

    let mut now = 0.0;
    let mut next_scroll = 0;
    let mut frames = 0;

    loop {
        while let Some(step) = loaded.scrolls.get(next_scroll) {
            if step.at_ms > now {
                break;
            }
            debug!("scroll to {} at {}ms", step.y, now);
            loaded.page.scroll_to(step.y);
            next_scroll += 1;
        }

        loaded.page.step(&mut scheduler, now);
        frames += 1;

        let finished = match options.until_ms {
            Some(until) => now >= until,
            None => next_scroll == loaded.scrolls.len() && !scheduler.has_pending_work(),
        };
        if finished {
            break;
        }
        now += options.frame_ms;
    }

    let mut elements = Vec::new();
    for group in groups {
        for id in scheduler.group_members(group) {
            let Some(&node) = scheduler.node(*id) else {
                continue;
            };
            let page_node = loaded.page.node(node);
            elements.push(ElementSummary {
                name: loaded.name(node).to_string(),
                marker: page_node.classes.iter().find_map(|c| Marker::from_class(c)),
                triggered: scheduler.is_triggered(*id),
                classes: page_node.classes.clone(),
                text: page_node.text.clone(),
            });
        }
    }

    Ok(SimulationReport {
        mutations: loaded.page.take_mutations(),
        elements,
        frames,
        ended_at_ms: now,
    })
}
