//! Stagger delays
//!
//! A staggered reveal gives each child of a container a transition delay that
//! grows with its index, producing a cascade.

/// Configuration for stagger animations
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StaggerConfig {
    /// Delay between each child's animation start (ms)
    pub step_ms: u32,
}

impl StaggerConfig {
    /// Create a new stagger config with delay between items
    pub fn new(step_ms: u32) -> Self {
        Self { step_ms }
    }

    /// Calculate delay for a specific child index
    pub fn delay_for_index(&self, index: usize) -> u32 {
        let index = u32::try_from(index).unwrap_or(u32::MAX);
        self.step_ms.saturating_mul(index)
    }

    /// Delays for `count` children, first to last
    pub fn delays(&self, count: usize) -> impl Iterator<Item = u32> + '_ {
        (0..count).map(move |index| self.delay_for_index(index))
    }
}

impl Default for StaggerConfig {
    fn default() -> Self {
        Self::new(120)
    }
}

/// Render milliseconds as a CSS time value in seconds (`120` -> `"0.12s"`)
///
/// Integer arithmetic keeps the output free of float noise such as
/// `0.36000000000000004s`.
pub fn css_seconds(ms: u32) -> String {
    let whole = ms / 1000;
    let frac = ms % 1000;
    if frac == 0 {
        return format!("{}s", whole);
    }

    let frac = format!("{:03}", frac);
    format!("{}.{}s", whole, frac.trim_end_matches('0'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stagger_delay_forward() {
        let config = StaggerConfig::new(120);

        assert_eq!(config.delay_for_index(0), 0);
        assert_eq!(config.delay_for_index(1), 120);
        assert_eq!(config.delay_for_index(2), 240);
        assert_eq!(config.delay_for_index(10), 1200);
    }

    #[test]
    fn test_stagger_delays_strictly_increase() {
        let config = StaggerConfig::default();
        let delays: Vec<u32> = config.delays(8).collect();

        for pair in delays.windows(2) {
            assert_eq!(pair[1] - pair[0], 120);
        }
    }

    #[test]
    fn test_stagger_delay_saturates() {
        let config = StaggerConfig::new(u32::MAX / 2);
        assert_eq!(config.delay_for_index(3), u32::MAX);
    }

    #[test]
    fn test_css_seconds() {
        assert_eq!(css_seconds(0), "0s");
        assert_eq!(css_seconds(120), "0.12s");
        assert_eq!(css_seconds(240), "0.24s");
        assert_eq!(css_seconds(360), "0.36s");
        assert_eq!(css_seconds(1000), "1s");
        assert_eq!(css_seconds(1200), "1.2s");
        assert_eq!(css_seconds(5), "0.005s");
    }
}
