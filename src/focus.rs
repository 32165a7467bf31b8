//! Tap-to-focus geometry.
//!
//! A tap on the preview view becomes a small square in view pixels, which
//! is then mapped into the camera's metering coordinate space where
//! `(-1000, -1000)` is the top-left and `(1000, 1000)` the bottom-right of
//! the field of view.

use crate::geometry::{Rect, Size};

/// Half-size of the focus square as a fraction of view width.
pub const FOCUS_AREA_SIZE_FACTOR: f32 = 0.05;
/// Weight given to a tapped metering area.
pub const FOCUS_AREA_WEIGHT: i32 = 1000;
/// Extent of the metering coordinate space on each side of the center.
pub const METERING_EXTENT: i32 = 1000;

/// Camera focus behavior.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum FocusMode {
    /// Single-shot focus triggered by the application.
    #[default]
    Auto,
    ContinuousPicture,
    ContinuousVideo,
    Infinity,
    Macro,
}

impl FocusMode {
    /// Whether an explicit auto-focus cycle can be triggered in this mode.
    pub fn supports_auto_focus(self) -> bool {
        matches!(self, Self::Auto | Self::Macro)
    }

    /// Whether focus areas have any effect in this mode.
    pub fn uses_focus_areas(self) -> bool {
        !matches!(self, Self::Infinity)
    }

    pub fn is_video(self) -> bool {
        self == Self::ContinuousVideo
    }
}

/// Focus square in view pixels around a tap at `(x, y)`.
///
/// The square has half-size `view.width * FOCUS_AREA_SIZE_FACTOR` and is
/// shifted, not shrunk, to stay inside the view. Right and bottom edges
/// that would leave the view are pinned to `size - 1`.
pub fn focus_rect_at(view: Size, x: f32, y: f32) -> Rect {
    let half = (view.width as f32 * FOCUS_AREA_SIZE_FACTOR) as i32;
    let (w, h) = (view.width as i32, view.height as i32);

    let mut rect = Rect::new(
        (x - half as f32) as i32,
        (y - half as f32) as i32,
        (x + half as f32) as i32,
        (y + half as f32) as i32,
    );
    if rect.left < 0 {
        rect.right -= rect.left;
        rect.left = 0;
    }
    if rect.right >= w {
        rect.left = w - half * 2 - 1;
        rect.right = w - 1;
    }
    if rect.top < 0 {
        rect.bottom -= rect.top;
        rect.top = 0;
    }
    if rect.bottom >= h {
        rect.top = h - half * 2 - 1;
        rect.bottom = h - 1;
    }
    rect
}

/// A weighted region in metering coordinates.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct MeteringArea {
    pub rect: Rect,
    pub weight: i32,
}

impl MeteringArea {
    pub const fn new(rect: Rect, weight: i32) -> Self {
        Self { rect, weight }
    }

    /// Map a rect in view pixels to a full-weight metering area.
    ///
    /// Returns `None` when the view has no area.
    pub fn from_view_rect(rect: Rect, view: Size) -> Option<Self> {
        if view.is_empty() {
            return None;
        }
        let (w, h) = (view.width as i64, view.height as i64);
        let extent = METERING_EXTENT as i64;
        // (v / span - 0.5) * 2 * extent, truncated toward zero
        let map = |v: i32, span: i64| {
            let m = (v as i64 * 2 * extent - extent * span) / span;
            m.clamp(-extent, extent) as i32
        };
        Some(Self {
            rect: Rect::new(
                map(rect.left, w),
                map(rect.top, h),
                map(rect.right, w),
                map(rect.bottom, h),
            ),
            weight: FOCUS_AREA_WEIGHT,
        })
    }
}
