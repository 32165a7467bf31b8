//! Preview resolution selection.
//!
//! Picks the capture resolution for a live preview from the discrete sizes a
//! camera supports. Only sizes matching a reference aspect ratio and fitting
//! a hardware bound are eligible; among those, the smallest one that covers
//! the view wins, otherwise the largest one below it.
//!
//! # Example
//!
//! ```
//! use previewfit::{select_optimal_resolution, ChoiceReason, Size};
//!
//! let candidates = [
//!     Size::new(320, 240),
//!     Size::new(640, 480),
//!     Size::new(1280, 720),
//!     Size::new(1920, 1080),
//! ];
//! let choice = select_optimal_resolution(
//!     &candidates,
//!     Size::new(640, 360),
//!     Size::new(1920, 1080),
//!     Size::new(1920, 1080),
//! )
//! .unwrap();
//!
//! assert_eq!(choice.size, Size::new(1280, 720));
//! assert_eq!(choice.reason, ChoiceReason::BigEnough);
//! ```

use tracing::warn;

use crate::error::{PreviewError, Result};
use crate::geometry::{Size, smallest_by_area};

/// Max preview width guaranteed to be sustainable by the camera bus.
pub const MAX_PREVIEW_WIDTH: u32 = 1920;
/// Max preview height guaranteed to be sustainable by the camera bus.
pub const MAX_PREVIEW_HEIGHT: u32 = 1080;

/// Upper bound on preview resolution.
///
/// Larger previews can exceed the camera bus bandwidth, which yields a
/// smooth preview but garbage capture data.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PreviewLimits {
    pub max: Size,
}

impl PreviewLimits {
    pub const fn new(max_width: u32, max_height: u32) -> Self {
        Self {
            max: Size::new(max_width, max_height),
        }
    }

    /// Clamp `bound` so neither dimension exceeds these limits.
    pub const fn clamp(&self, bound: Size) -> Size {
        let width = if bound.width > self.max.width {
            self.max.width
        } else {
            bound.width
        };
        let height = if bound.height > self.max.height {
            self.max.height
        } else {
            bound.height
        };
        Size::new(width, height)
    }
}

impl Default for PreviewLimits {
    fn default() -> Self {
        Self::new(MAX_PREVIEW_WIDTH, MAX_PREVIEW_HEIGHT)
    }
}

/// Why a resolution was chosen.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ChoiceReason {
    /// Smallest eligible size covering the target.
    BigEnough,
    /// No eligible size covers the target; largest eligible size below it.
    LargestBelowTarget,
    /// No size matched the aspect ratio and bound; first candidate returned.
    Fallback,
}

/// A selected resolution and how it was found.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SizeChoice {
    pub size: Size,
    pub reason: ChoiceReason,
}

impl SizeChoice {
    /// Whether selection fell back to an arbitrary candidate.
    pub fn is_degraded(&self) -> bool {
        self.reason == ChoiceReason::Fallback
    }
}

/// Choose the preview resolution.
///
/// - `candidates`: sizes the camera supports, in the order it reports them.
/// - `target`: the view size in sensor coordinates; the minimum wanted size.
/// - `max`: largest acceptable size in sensor coordinates.
/// - `aspect_ref`: size whose aspect ratio candidates must match exactly.
///
/// Ties on area are broken by input order. Returns
/// [`PreviewError::NoCandidates`] only when `candidates` is empty.
pub fn select_optimal_resolution(
    candidates: &[Size],
    target: Size,
    max: Size,
    aspect_ref: Size,
) -> Result<SizeChoice> {
    let first = *candidates.first().ok_or(PreviewError::NoCandidates)?;

    let eligible = candidates
        .iter()
        .copied()
        .filter(|s| s.fits_within(max) && s.matches_aspect(aspect_ref));

    let big_enough = smallest_by_area(eligible.clone().filter(|s| s.covers(target)));
    if let Some(size) = big_enough {
        return Ok(SizeChoice {
            size,
            reason: ChoiceReason::BigEnough,
        });
    }

    let below = eligible
        .filter(|s| !s.covers(target))
        .reduce(|best, s| if s.area() > best.area() { s } else { best });
    if let Some(size) = below {
        return Ok(SizeChoice {
            size,
            reason: ChoiceReason::LargestBelowTarget,
        });
    }

    warn!(
        candidates = candidates.len(),
        fallback_width = first.width,
        fallback_height = first.height,
        "couldn't find any suitable preview size"
    );
    Ok(SizeChoice {
        size: first,
        reason: ChoiceReason::Fallback,
    })
}

/// Target size and bound for selection, in sensor coordinates.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PreviewTarget {
    /// Minimum wanted preview size.
    pub target: Size,
    /// Largest acceptable preview size, already clamped to the limits.
    pub max: Size,
}

/// Convert view and screen sizes into a selection target.
///
/// When `swapped`, the sensor is sideways relative to the display, so both
/// the view and the screen bound are swapped into sensor coordinates before
/// the bound is clamped.
///
/// Swapping only the view and clamping the portrait screen as is would give
/// a bound like 1080×1080 on a portrait phone. No 16:9 size fits under it,
/// and selection falls back to the first candidate, typically the full
/// sensor resolution.
pub fn preview_target(view: Size, screen: Size, swapped: bool, limits: &PreviewLimits) -> PreviewTarget {
    let (target, bound) = if swapped {
        (view.swapped(), screen.swapped())
    } else {
        (view, screen)
    };
    PreviewTarget {
        target,
        max: limits.clamp(bound),
    }
}
