//! Visibility geometry
//!
//! Rectangles in document pixels, CSS `rootMargin` shorthand, and the
//! intersection-ratio test that decides whether an element counts as visible.
//!
//! The rules mirror the browser's intersection primitive:
//!
//! - the viewport is grown (positive margin) or shrunk (negative margin)
//!   before testing
//! - the ratio is the visible fraction of the *target's* area
//! - a zero-area target is fully visible when it touches the viewport
//! - edge-adjacent rectangles intersect with ratio 0, which satisfies a
//!   threshold of 0 and nothing higher

use std::fmt;

use nom::{
    branch::alt,
    bytes::complete::{tag, tag_no_case},
    character::complete::{multispace0, multispace1},
    combinator::{all_consuming, opt, verify},
    multi::separated_list1,
    number::complete::double,
    sequence::delimited,
    Finish, IResult,
};
use tracing::debug;

use crate::error::{Result, UnveilError};

// ============================================================================
// Rect
// ============================================================================

/// Axis-aligned rectangle in document pixels
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const ZERO: Rect = Rect {
        x: 0.0,
        y: 0.0,
        width: 0.0,
        height: 0.0,
    };

    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Offset the rect by a delta
    pub fn offset(&self, dx: f64, dy: f64) -> Self {
        Rect::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Overlapping region of two rects
    ///
    /// Edge-adjacent rects produce a zero-area intersection rather than `None`.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if right < left || bottom < top {
            return None;
        }

        Some(Rect::new(left, top, right - left, bottom - top))
    }
}

// ============================================================================
// Root Margin
// ============================================================================

/// One side of a root margin
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MarginLength {
    /// Absolute pixels
    Px(f64),
    /// Percentage of the viewport dimension along the same axis
    Percent(f64),
}

impl MarginLength {
    /// Resolve to pixels against the viewport extent on this side's axis
    pub fn to_px(self, extent: f64) -> f64 {
        match self {
            MarginLength::Px(px) => px,
            MarginLength::Percent(pct) => extent * pct / 100.0,
        }
    }
}

impl Default for MarginLength {
    fn default() -> Self {
        MarginLength::Px(0.0)
    }
}

impl fmt::Display for MarginLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarginLength::Px(px) => write!(f, "{}px", px),
            MarginLength::Percent(pct) => write!(f, "{}%", pct),
        }
    }
}

/// Viewport-edge bias applied before intersection testing
///
/// Negative values shrink the effective viewport, so an element has to travel
/// further in before it counts as visible.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RootMargin {
    pub top: MarginLength,
    pub right: MarginLength,
    pub bottom: MarginLength,
    pub left: MarginLength,
}

impl RootMargin {
    pub const ZERO: RootMargin = RootMargin {
        top: MarginLength::Px(0.0),
        right: MarginLength::Px(0.0),
        bottom: MarginLength::Px(0.0),
        left: MarginLength::Px(0.0),
    };

    /// Same pixel margin on every side
    pub fn uniform(px: f64) -> Self {
        let side = MarginLength::Px(px);
        Self {
            top: side,
            right: side,
            bottom: side,
            left: side,
        }
    }

    /// Parse CSS margin shorthand (`"10px"`, `"0px 0px -50px 0px"`, `"5% 0px"`)
    ///
    /// One to four space-separated lengths with the usual CSS expansion.
    /// Unitless numbers are pixels. An empty string is a zero margin.
    pub fn parse(input: &str) -> Result<Self> {
        if input.trim().is_empty() {
            return Ok(Self::ZERO);
        }

        let values = match margin_values(input).finish() {
            Ok((_, values)) => values,
            Err(err) => {
                debug!("root margin parse failed at {:?}: {:?}", err.input, err.code);
                return Err(UnveilError::InvalidRootMargin {
                    input: input.to_string(),
                    reason: format!("unexpected input at {:?}", err.input),
                });
            }
        };

        let (top, right, bottom, left) = match values.as_slice() {
            [all] => (*all, *all, *all, *all),
            [vertical, horizontal] => (*vertical, *horizontal, *vertical, *horizontal),
            [top, horizontal, bottom] => (*top, *horizontal, *bottom, *horizontal),
            [top, right, bottom, left] => (*top, *right, *bottom, *left),
            _ => {
                return Err(UnveilError::InvalidRootMargin {
                    input: input.to_string(),
                    reason: format!("expected 1 to 4 lengths, found {}", values.len()),
                })
            }
        };

        Ok(Self {
            top,
            right,
            bottom,
            left,
        })
    }

    /// Apply the margin to a viewport rect
    pub fn expand(&self, viewport: Rect) -> Rect {
        let top = self.top.to_px(viewport.height);
        let right = self.right.to_px(viewport.width);
        let bottom = self.bottom.to_px(viewport.height);
        let left = self.left.to_px(viewport.width);

        Rect::new(
            viewport.x - left,
            viewport.y - top,
            viewport.width + left + right,
            viewport.height + top + bottom,
        )
    }
}

impl fmt::Display for RootMargin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.top, self.right, self.bottom, self.left)
    }
}

fn margin_length(input: &str) -> IResult<&str, MarginLength> {
    let (input, value) = verify(double, |v: &f64| v.is_finite())(input)?;
    let (input, unit) = opt(alt((tag_no_case("px"), tag("%"))))(input)?;

    let length = match unit {
        Some("%") => MarginLength::Percent(value),
        _ => MarginLength::Px(value),
    };

    Ok((input, length))
}

fn margin_values(input: &str) -> IResult<&str, Vec<MarginLength>> {
    all_consuming(delimited(
        multispace0,
        separated_list1(multispace1, margin_length),
        multispace0,
    ))(input)
}

// ============================================================================
// Observer Configuration
// ============================================================================

/// Result of testing one element against the viewport
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Visibility {
    /// Visible fraction of the element's area (0.0 to 1.0)
    pub intersection_ratio: f64,
    /// Whether the element has crossed the threshold
    pub is_intersecting: bool,
}

/// Threshold and margin shared by every element of a group
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ObserverConfig {
    /// Fraction of the element's area that must be visible (0.0 to 1.0)
    pub threshold: f64,
    /// Bias applied to the viewport edges before testing
    pub root_margin: RootMargin,
}

impl ObserverConfig {
    pub fn new(threshold: f64, root_margin: RootMargin) -> Result<Self> {
        if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
            return Err(UnveilError::InvalidThreshold(threshold));
        }

        Ok(Self {
            threshold,
            root_margin,
        })
    }

    /// Test `target` against `viewport` (both in the same coordinate space)
    pub fn measure(&self, target: Rect, viewport: Rect) -> Visibility {
        match intersection_ratio(target, viewport, &self.root_margin) {
            Some(ratio) => Visibility {
                intersection_ratio: ratio,
                is_intersecting: ratio >= self.threshold,
            },
            None => Visibility {
                intersection_ratio: 0.0,
                is_intersecting: false,
            },
        }
    }
}

/// Visible fraction of `target` inside `viewport` adjusted by `margin`
///
/// `None` when the rectangles don't meet at all; edge contact gives
/// `Some(0.0)`, and a zero-area target that touches the root gives `Some(1.0)`.
pub fn intersection_ratio(target: Rect, viewport: Rect, margin: &RootMargin) -> Option<f64> {
    let root = margin.expand(viewport);
    let overlap = target.intersection(&root)?;

    let area = target.area();
    if area > 0.0 {
        Some((overlap.area() / area).clamp(0.0, 1.0))
    } else {
        Some(1.0)
    }
}
