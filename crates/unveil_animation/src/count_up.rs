//! Count-up animation
//!
//! Renders a numeral climbing from 0 to a target over a fixed duration:
//!
//! ```text
//! progress(t) = min(elapsed / duration, 1)
//! eased(p)    = easing(p)            // ease-out quartic by default
//! value(p)    = floor(eased(p) * target)
//! ```
//!
//! Each sample is computed from wall-clock elapsed time rather than
//! accumulated deltas, so dropped frames never cause drift.

use crate::easing::Easing;

/// Default count-up length
pub const DEFAULT_COUNT_DURATION_MS: f64 = 2000.0;

/// One rendered frame of a count-up
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CountUpFrame {
    /// Value to display
    pub value: u64,
    /// True on the terminal frame; no further frames are needed
    pub finished: bool,
}

/// Animates a number from 0 to `target`
#[derive(Clone, Debug)]
pub struct CountUpAnimator {
    target: u64,
    duration_ms: f64,
    easing: Easing,
    started_at_ms: f64,
    /// Highest value rendered so far
    last_value: u64,
    finished: bool,
}

impl CountUpAnimator {
    /// Create an animator that starts counting at `started_at_ms`
    pub fn new(target: u64, started_at_ms: f64) -> Self {
        Self {
            target,
            duration_ms: DEFAULT_COUNT_DURATION_MS,
            easing: Easing::EaseOutQuart,
            started_at_ms,
            last_value: 0,
            finished: false,
        }
    }

    /// Set the animation length (builder pattern)
    pub fn with_duration(mut self, duration_ms: f64) -> Self {
        self.duration_ms = duration_ms.max(0.0);
        self
    }

    /// Set the easing curve (builder pattern)
    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn target(&self) -> u64 {
        self.target
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Last value produced by `sample()`
    pub fn value(&self) -> u64 {
        self.last_value
    }

    /// Linear progress (0.0 to 1.0) at `now_ms`
    pub fn progress_at(&self, now_ms: f64) -> f64 {
        if self.duration_ms <= 0.0 {
            return 1.0;
        }
        let elapsed = (now_ms - self.started_at_ms).max(0.0);
        (elapsed / self.duration_ms).min(1.0)
    }

    /// Value the curve prescribes at `now_ms`, without touching state
    pub fn value_at(&self, now_ms: f64) -> u64 {
        let progress = self.progress_at(now_ms);
        if progress >= 1.0 {
            return self.target;
        }
        let eased = self.easing.apply(progress);
        ((eased * self.target as f64).floor() as u64).min(self.target)
    }

    /// Produce the frame for `now_ms`
    ///
    /// The displayed value never decreases, even if the host clock steps
    /// backwards. Once finished, every further sample repeats the target.
    pub fn sample(&mut self, now_ms: f64) -> CountUpFrame {
        if self.finished {
            return CountUpFrame {
                value: self.target,
                finished: true,
            };
        }

        let value = self.value_at(now_ms).max(self.last_value);
        self.last_value = value;
        self.finished = self.progress_at(now_ms) >= 1.0;

        CountUpFrame {
            value,
            finished: self.finished,
        }
    }
}

/// Insert `separator` between groups of three digits (`1234567` -> `1,234,567`)
pub fn group_digits(value: u64, separator: &str) -> String {
    let digits = value.to_string();
    if separator.is_empty() || digits.len() <= 3 {
        return digits;
    }

    let mut grouped = String::with_capacity(digits.len() + separator.len() * (digits.len() / 3));
    let head = digits.len() % 3;
    for (i, ch) in digits.chars().enumerate() {
        if i != 0 && (i + 3 - head) % 3 == 0 {
            grouped.push_str(separator);
        }
        grouped.push(ch);
    }
    grouped
}

/// Render a counter value: grouped digits plus suffix (`1,500+`)
pub fn format_count(value: u64, separator: &str, suffix: &str) -> String {
    let mut text = group_digits(value, separator);
    text.push_str(suffix);
    text
}

/// Parse a counter's target the way `parseInt` reads a leading integer
///
/// Leading whitespace and a `+` sign are skipped, then the longest run of
/// ASCII digits is taken (`"150 projects"` -> 150). Returns `None` when no
/// digits lead the string, for negative values, and on overflow.
pub fn parse_count_target(raw: &str) -> Option<u64> {
    let trimmed = raw.trim_start();
    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let digit_len = unsigned.bytes().take_while(u8::is_ascii_digit).count();
    if digit_len == 0 {
        return None;
    }
    unsigned[..digit_len].parse().ok()
}
