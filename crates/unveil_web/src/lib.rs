//! Unveil Web
//!
//! Browser host for the Unveil scheduler. Backs [`unveil_reveal::Host`] with the
//! DOM, one `IntersectionObserver` per reveal group, and a
//! `requestAnimationFrame` loop that only runs while animations are pending.
//!
//! # Usage
//!
//! ```js
//! import init, { start, start_with_config } from "./pkg/unveil_web.js";
//!
//! await init();
//! start();
//! // or
//! start_with_config(JSON.stringify({ counter: { duration_ms: 1500 } }));
//! ```
//!
//! Build with `--features autostart` to scan the document with the default
//! configuration as soon as the module loads.
//!
//! Everything that touches the browser is compiled for `wasm32` only.

use unveil_reveal::{ConfigError, UnveilConfig};

#[cfg(target_arch = "wasm32")]
mod dom;

#[cfg(target_arch = "wasm32")]
pub use dom::{start, start_with_config, DomHost, IntersectCallback};

/// CSS selector list matching any of `classes` (`.reveal, .reveal-left`)
pub fn class_selector(classes: &[&str]) -> String {
    classes
        .iter()
        .map(|class| format!(".{}", class))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Whether an `IntersectionObserverEntry` counts as intersecting
///
/// The browser sets `isIntersecting` at any overlap, edge contact included,
/// even when the observer's threshold is higher.
pub fn meets_threshold(is_intersecting: bool, ratio: f64, threshold: f64) -> bool {
    is_intersecting && ratio >= threshold
}

/// Parse a configuration passed in from JavaScript
///
/// Accepts the same schema as the TOML file; missing keys keep their
/// defaults. The result is validated.
pub fn parse_config(json: &str) -> Result<UnveilConfig, String> {
    let config: UnveilConfig =
        serde_json::from_str(json).map_err(|err| format!("invalid config JSON: {}", err))?;
    config
        .validate()
        .map_err(|err: ConfigError| err.to_string())?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use unveil_reveal::TimelineIndexing;

    #[test]
    fn test_class_selector() {
        assert_eq!(class_selector(&["reveal"]), ".reveal");
        assert_eq!(
            class_selector(&["reveal", "reveal-left"]),
            ".reveal, .reveal-left"
        );
        assert_eq!(class_selector(&[]), "");
    }

    #[test]
    fn test_meets_threshold() {
        // A sliver of a counter does not start it
        assert!(!meets_threshold(true, 0.02, 0.5));
        assert!(meets_threshold(true, 0.5, 0.5));
        assert!(meets_threshold(true, 1.0, 0.5));
        // Edge contact is enough at threshold 0
        assert!(meets_threshold(true, 0.0, 0.0));
        assert!(!meets_threshold(false, 0.0, 0.0));
    }

    #[test]
    fn test_parse_config_partial() {
        let config =
            parse_config(r#"{"counter": {"duration_ms": 1500}, "timeline": {"indexing": "registration"}}"#)
                .unwrap();
        assert_eq!(config.counter.duration_ms, 1500);
        assert_eq!(config.counter.suffix, "+");
        assert_eq!(config.timeline.indexing, TimelineIndexing::Registration);
    }

    #[test]
    fn test_parse_config_rejects_invalid() {
        assert!(parse_config("{").unwrap_err().contains("invalid config JSON"));
        assert!(parse_config(r#"{"reveal": {"threshold": 1.5}}"#)
            .unwrap_err()
            .contains("reveal"));
    }

    #[test]
    fn test_parse_config_empty_object_is_default() {
        assert_eq!(parse_config("{}").unwrap(), UnveilConfig::default());
    }
}
