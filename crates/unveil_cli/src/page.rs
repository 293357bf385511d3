//! Page description files
//!
//! A page is a viewport, a flat list of nodes (children name their parent),
//! and a scroll script:
//!
//! ```toml
//! [viewport]
//! width = 1280
//! height = 800
//!
//! [[node]]
//! id = "skills"
//! class = "skills-grid stagger-children"
//! y = 1400
//! width = 1200
//! height = 400
//!
//! [[node]]
//! id = "skill-1"
//! parent = "skills"
//! class = "skill-card"
//!
//! [[node]]
//! id = "projects"
//! class = "stat-number"
//! y = 900
//! attributes = { data-count = "150" }
//!
//! [[scroll]]
//! at_ms = 500
//! y = 900
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use unveil_reveal::{HeadlessPage, NodeId, Rect};

fn default_width() -> f64 {
    1280.0
}

fn default_height() -> f64 {
    800.0
}

fn default_true() -> bool {
    true
}

/// `[viewport]` table
#[derive(Debug, Clone, Deserialize)]
pub struct ViewportEntry {
    #[serde(default = "default_width")]
    pub width: f64,
    #[serde(default = "default_height")]
    pub height: f64,
    /// Initial scroll offset
    #[serde(default)]
    pub scroll_y: f64,
    /// Set to false to simulate a browser without IntersectionObserver
    #[serde(default = "default_true")]
    pub intersection_observer: bool,
}

impl Default for ViewportEntry {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            scroll_y: 0.0,
            intersection_observer: true,
        }
    }
}

/// One `[[node]]` entry
#[derive(Debug, Clone, Deserialize)]
pub struct NodeEntry {
    pub id: String,
    /// Space-separated class list
    #[serde(default)]
    pub class: String,
    /// Id of an earlier node
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default = "default_node_width")]
    pub width: f64,
    #[serde(default = "default_node_height")]
    pub height: f64,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

fn default_node_width() -> f64 {
    400.0
}

fn default_node_height() -> f64 {
    100.0
}

/// One `[[scroll]]` step
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ScrollStep {
    pub at_ms: f64,
    pub y: f64,
}

/// Parsed page file
#[derive(Debug, Clone, Deserialize)]
pub struct PageFile {
    #[serde(default)]
    pub viewport: ViewportEntry,
    #[serde(default, rename = "node")]
    pub nodes: Vec<NodeEntry>,
    #[serde(default, rename = "scroll")]
    pub scrolls: Vec<ScrollStep>,
}

/// A page ready to simulate
pub struct LoadedPage {
    pub page: HeadlessPage,
    /// Node names, indexed by `NodeId::index()`
    pub names: Vec<String>,
    /// Scroll script sorted by time
    pub scrolls: Vec<ScrollStep>,
}

impl LoadedPage {
    pub fn name(&self, node: NodeId) -> &str {
        self.names
            .get(node.index())
            .map(String::as_str)
            .unwrap_or("?")
    }
}

impl PageFile {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse page description")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Build the headless page
    pub fn build(&self) -> Result<LoadedPage> {
        let viewport = &self.viewport;
        if viewport.width <= 0.0 || viewport.height <= 0.0 {
            bail!(
                "Viewport must have a positive size, got {}x{}",
                viewport.width,
                viewport.height
            );
        }

        let mut page = if viewport.intersection_observer {
            HeadlessPage::new(viewport.width, viewport.height)
        } else {
            HeadlessPage::without_visibility_detection(viewport.width, viewport.height)
        };
        page.scroll_to(viewport.scroll_y);

        let mut ids: BTreeMap<&str, NodeId> = BTreeMap::new();
        let mut names = Vec::with_capacity(self.nodes.len());

        for entry in &self.nodes {
            if ids.contains_key(entry.id.as_str()) {
                bail!("Duplicate node id '{}'", entry.id);
            }
            if entry.width < 0.0 || entry.height < 0.0 {
                bail!("Node '{}' has a negative size", entry.id);
            }

            let rect = Rect::new(entry.x, entry.y, entry.width, entry.height);
            let node = match &entry.parent {
                Some(parent) => {
                    let parent = ids.get(parent.as_str()).copied().with_context(|| {
                        format!(
                            "Node '{}' names parent '{}', which is not declared before it",
                            entry.id, parent
                        )
                    })?;
                    page.add_child(parent, &entry.class, rect)
                }
                None => page.add_node(&entry.class, rect),
            };

            for (name, value) in &entry.attributes {
                page.set_attribute(node, name, value);
            }
            if let Some(text) = &entry.text {
                page.set_initial_text(node, text);
            }

            ids.insert(&entry.id, node);
            names.push(entry.id.clone());
        }

        let mut scrolls = self.scrolls.clone();
        if let Some(step) = scrolls.iter().find(|s| !s.at_ms.is_finite() || s.at_ms < 0.0) {
            bail!("Scroll step at {}ms must be a non-negative time", step.at_ms);
        }
        scrolls.sort_by(|a, b| a.at_ms.total_cmp(&b.at_ms));

        Ok(LoadedPage {
            page,
            names,
            scrolls,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        [viewport]
        width = 1000
        height = 600

        [[node]]
        id = "grid"
        class = "stagger-children"
        y = 1000

        [[node]]
        id = "card"
        parent = "grid"
        text = "Rust"

        [[node]]
        id = "stat"
        class = "stat-number"
        y = 200
        attributes = { data-count = "42" }

        [[scroll]]
        at_ms = 900
        y = 800

        [[scroll]]
        at_ms = 100
        y = 300
    "#;

    #[test]
    fn test_build_page() {
        let loaded = PageFile::from_toml_str(PAGE).unwrap().build().unwrap();
        let page = &loaded.page;

        assert_eq!(page.node_count(), 3);
        assert_eq!(page.viewport(), Rect::new(0.0, 0.0, 1000.0, 600.0));
        assert!(page.detection_enabled());

        let order = page.document_order();
        let names: Vec<&str> = order.iter().map(|n| loaded.name(*n)).collect();
        assert_eq!(names, vec!["grid", "card", "stat"]);

        let card = order[1];
        assert_eq!(page.node(card).parent, Some(order[0]));
        assert_eq!(page.text(card), "Rust");
        assert_eq!(
            page.node(order[2]).attributes.get("data-count").map(String::as_str),
            Some("42")
        );
    }

    #[test]
    fn test_scrolls_sorted() {
        let loaded = PageFile::from_toml_str(PAGE).unwrap().build().unwrap();
        let times: Vec<f64> = loaded.scrolls.iter().map(|s| s.at_ms).collect();
        assert_eq!(times, vec![100.0, 900.0]);
    }

    #[test]
    fn test_defaults() {
        let file = PageFile::from_toml_str("[[node]]\nid = \"a\"\n").unwrap();
        assert_eq!(file.viewport.width, 1280.0);
        assert!(file.viewport.intersection_observer);
        assert_eq!(file.nodes[0].width, 400.0);
        assert!(file.scrolls.is_empty());
    }

    /// Message of the error building `text` fails with
    fn build_error(text: &str) -> String {
        match PageFile::from_toml_str(text).unwrap().build() {
            Ok(_) => panic!("page should not build:\n{}", text),
            Err(err) => err.to_string(),
        }
    }

    #[test]
    fn test_rejects_bad_pages() {
        let duplicate = "[[node]]\nid = \"a\"\n[[node]]\nid = \"a\"\n";
        assert!(build_error(duplicate).contains("Duplicate"));

        let orphan = "[[node]]\nid = \"a\"\nparent = \"b\"\n";
        assert!(build_error(orphan).contains("not declared"));

        let flat = "[viewport]\nheight = 0\n";
        assert!(build_error(flat).contains("positive size"));

        let negative = "[[node]]\nid = \"a\"\nheight = -5\n";
        assert!(build_error(negative).contains("negative size"));

        let early = "[[scroll]]\nat_ms = -1\ny = 10\n";
        assert!(build_error(early).contains("non-negative time"));
    }

    #[test]
    fn test_demo_page_builds() {
        let text = include_str!("../../../demos/portfolio.toml");
        let loaded = PageFile::from_toml_str(text).unwrap().build().unwrap();
        assert_eq!(loaded.page.node_count(), 13);
        assert_eq!(loaded.scrolls.len(), 4);
    }

    #[test]
    fn test_without_intersection_observer() {
        let file = PageFile::from_toml_str("[viewport]\nintersection_observer = false\n").unwrap();
        assert!(!file.build().unwrap().page.detection_enabled());
    }
}
