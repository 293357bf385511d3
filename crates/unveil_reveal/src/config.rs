//! Scheduler configuration
//!
//! Every key is optional; missing keys fall back to the timings the site's
//! stylesheet was designed around.
//!
//! ```toml
//! [reveal]
//! threshold = 0.15
//! root_margin = "0px 0px -50px 0px"
//! delay_ms = 100
//!
//! [counter]
//! duration_ms = 2000
//! easing = "ease-out-quart"
//!
//! [timeline]
//! indexing = "per-batch"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use unveil_animation::Easing;
use unveil_core::{ObserverConfig, RootMargin, UnveilError};

use crate::behavior::RevealBehavior;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for this schema
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config could not be rendered back to TOML
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A section's threshold or root margin is invalid
    #[error("invalid [{section}] section: {source}")]
    Invalid {
        section: &'static str,
        #[source]
        source: UnveilError,
    },

    /// Cascade step of zero would give every item the same delay
    #[error("[{section}] step_ms must be greater than zero")]
    ZeroStep { section: &'static str },
}

/// How timeline items pick their cascade position
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimelineIndexing {
    /// Position among the entries of the same detection pass
    #[default]
    PerBatch,
    /// Position in the timeline group's registration order
    Registration,
}

/// Plain reveal settings (`reveal`, `reveal-left`, `reveal-right`, `reveal-scale`)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealSection {
    pub threshold: f64,
    pub root_margin: String,
    /// Pause between crossing the threshold and activating
    pub delay_ms: u32,
    pub active_class: String,
}

impl Default for RevealSection {
    fn default() -> Self {
        Self {
            threshold: 0.15,
            root_margin: "0px 0px -50px 0px".to_string(),
            delay_ms: 100,
            active_class: default_active_class(),
        }
    }
}

/// Staggered-children settings (`stagger-children`)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaggerSection {
    pub threshold: f64,
    pub root_margin: String,
    /// Extra transition delay per child
    pub step_ms: u32,
    /// Class added to every child
    pub child_class: String,
    /// Class added to the container
    pub active_class: String,
}

impl Default for StaggerSection {
    fn default() -> Self {
        Self {
            threshold: 0.2,
            root_margin: default_root_margin(),
            step_ms: 120,
            child_class: "stagger-visible".to_string(),
            active_class: default_active_class(),
        }
    }
}

/// Count-up settings (`stat-number`)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CounterSection {
    pub threshold: f64,
    pub root_margin: String,
    pub duration_ms: u32,
    pub easing: Easing,
    /// Appended to the rendered numeral
    pub suffix: String,
    /// Inserted between digit groups; empty disables grouping
    pub group_separator: String,
    /// Attribute holding the target integer
    pub attribute: String,
}

impl Default for CounterSection {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            root_margin: default_root_margin(),
            duration_ms: 2000,
            easing: Easing::EaseOutQuart,
            suffix: "+".to_string(),
            group_separator: ",".to_string(),
            attribute: "data-count".to_string(),
        }
    }
}

/// Timeline settings (`timeline-item`)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineSection {
    pub threshold: f64,
    pub root_margin: String,
    /// Delay per cascade position
    pub step_ms: u32,
    pub indexing: TimelineIndexing,
    pub active_class: String,
}

impl Default for TimelineSection {
    fn default() -> Self {
        Self {
            threshold: 0.3,
            root_margin: default_root_margin(),
            step_ms: 150,
            indexing: TimelineIndexing::PerBatch,
            active_class: default_active_class(),
        }
    }
}

fn default_root_margin() -> String {
    "0px".to_string()
}

fn default_active_class() -> String {
    "active".to_string()
}

/// Full scheduler configuration
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnveilConfig {
    pub reveal: RevealSection,
    pub stagger: StaggerSection,
    pub counter: CounterSection,
    pub timeline: TimelineSection,
}

impl UnveilConfig {
    /// Parse from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Render as pretty TOML
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Observer settings for the group driving `behavior`
    pub fn observer(&self, behavior: RevealBehavior) -> Result<ObserverConfig, ConfigError> {
        let (section, threshold, margin) = match behavior {
            RevealBehavior::Reveal => ("reveal", self.reveal.threshold, &self.reveal.root_margin),
            RevealBehavior::Stagger => {
                ("stagger", self.stagger.threshold, &self.stagger.root_margin)
            }
            RevealBehavior::Counter => {
                ("counter", self.counter.threshold, &self.counter.root_margin)
            }
            RevealBehavior::Timeline => {
                ("timeline", self.timeline.threshold, &self.timeline.root_margin)
            }
        };

        RootMargin::parse(margin)
            .and_then(|root_margin| ObserverConfig::new(threshold, root_margin))
            .map_err(|source| ConfigError::Invalid { section, source })
    }

    /// Check every section
    pub fn validate(&self) -> Result<(), ConfigError> {
        for behavior in RevealBehavior::ALL {
            self.observer(behavior)?;
        }
        if self.stagger.step_ms == 0 {
            return Err(ConfigError::ZeroStep { section: "stagger" });
        }
        if self.timeline.step_ms == 0 {
            return Err(ConfigError::ZeroStep {
                section: "timeline",
            });
        }
        Ok(())
    }
}
