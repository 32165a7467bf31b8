//! 2-D affine transforms for fitting a sensor buffer onto a view.
//!
//! [`Matrix`] follows canvas-matrix conventions: `post_*` operations apply
//! after everything already in the matrix, pivots are in destination pixels,
//! positive angles rotate clockwise in y-down screen space.
//!
//! ```text
//!     ┌ sx kx tx ┐   ┌ x ┐
//!     │ ky sy ty │ · │ y │
//!     └ 0  0  1  ┘   └ 1 ┘
//! ```

use num_traits::Float;

use crate::geometry::Size;
use crate::rotation::Rotation;

/// Below this magnitude a sine or cosine is snapped to exactly zero.
const NEARLY_ZERO: f32 = 1.0 / 4096.0;

/// Floating-point rectangle, right/bottom exclusive.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct RectF {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl RectF {
    pub const fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Rect at the origin covering `size`.
    pub fn from_size(size: Size) -> Self {
        Self::new(0.0, 0.0, size.width as f32, size.height as f32)
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn center(&self) -> (f32, f32) {
        (
            (self.left + self.right) * 0.5,
            (self.top + self.bottom) * 0.5,
        )
    }

    pub fn is_empty(&self) -> bool {
        !(self.left < self.right && self.top < self.bottom)
    }

    /// Translate by `(dx, dy)`.
    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self::new(self.left + dx, self.top + dy, self.right + dx, self.bottom + dy)
    }
}

/// 2-D affine matrix.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Matrix {
    pub sx: f32,
    pub kx: f32,
    pub tx: f32,
    pub ky: f32,
    pub sy: f32,
    pub ty: f32,
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Matrix {
    pub const IDENTITY: Self = Self {
        sx: 1.0,
        kx: 0.0,
        tx: 0.0,
        ky: 0.0,
        sy: 1.0,
        ty: 0.0,
    };

    /// Pure translation.
    pub const fn translate(dx: f32, dy: f32) -> Self {
        Self {
            tx: dx,
            ty: dy,
            ..Self::IDENTITY
        }
    }

    /// Scale by `(sx, sy)` keeping `(px, py)` fixed.
    pub fn scale(sx: f32, sy: f32, px: f32, py: f32) -> Self {
        Self {
            sx,
            kx: 0.0,
            tx: px - sx * px,
            ky: 0.0,
            sy,
            ty: py - sy * py,
        }
    }

    /// Rotate by `degrees` clockwise (y-down) about `(px, py)`.
    pub fn rotate(degrees: f32, px: f32, py: f32) -> Self {
        let (sin, cos) = sin_cos_snapped(degrees);
        Self {
            sx: cos,
            kx: -sin,
            tx: px - cos * px + sin * py,
            ky: sin,
            sy: cos,
            ty: py - sin * px - cos * py,
        }
    }

    /// Map `src` onto `dst`, scaling each axis independently.
    ///
    /// Returns `None` when `src` is empty.
    pub fn rect_to_rect_fill(src: RectF, dst: RectF) -> Option<Self> {
        if src.is_empty() {
            return None;
        }
        let sx = dst.width() / src.width();
        let sy = dst.height() / src.height();
        Some(Self {
            sx,
            kx: 0.0,
            tx: dst.left - src.left * sx,
            ky: 0.0,
            sy,
            ty: dst.top - src.top * sy,
        })
    }

    /// `other ∘ self`: apply `self`, then `other`.
    #[must_use]
    pub fn post_concat(self, other: Matrix) -> Self {
        let a = self;
        let b = other;
        Self {
            sx: b.sx * a.sx + b.kx * a.ky,
            kx: b.sx * a.kx + b.kx * a.sy,
            tx: b.sx * a.tx + b.kx * a.ty + b.tx,
            ky: b.ky * a.sx + b.sy * a.ky,
            sy: b.ky * a.kx + b.sy * a.sy,
            ty: b.ky * a.tx + b.sy * a.ty + b.ty,
        }
    }

    #[must_use]
    pub fn post_translate(self, dx: f32, dy: f32) -> Self {
        self.post_concat(Self::translate(dx, dy))
    }

    #[must_use]
    pub fn post_scale(self, sx: f32, sy: f32, px: f32, py: f32) -> Self {
        self.post_concat(Self::scale(sx, sy, px, py))
    }

    #[must_use]
    pub fn post_rotate(self, degrees: f32, px: f32, py: f32) -> Self {
        self.post_concat(Self::rotate(degrees, px, py))
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    pub fn map_point(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.sx * x + self.kx * y + self.tx,
            self.ky * x + self.sy * y + self.ty,
        )
    }

    /// Map the four corners of `rect`: top-left, top-right, bottom-right, bottom-left.
    pub fn map_rect(&self, rect: RectF) -> [(f32, f32); 4] {
        [
            self.map_point(rect.left, rect.top),
            self.map_point(rect.right, rect.top),
            self.map_point(rect.right, rect.bottom),
            self.map_point(rect.left, rect.bottom),
        ]
    }

    /// Row-major 3×3 values, as consumed by most rendering surfaces.
    pub fn to_array(&self) -> [f32; 9] {
        [
            self.sx, self.kx, self.tx, self.ky, self.sy, self.ty, 0.0, 0.0, 1.0,
        ]
    }
}

fn sin_cos_snapped(degrees: f32) -> (f32, f32) {
    let (sin, cos) = Float::sin_cos(Float::to_radians(degrees));
    let snap = |v: f32| if Float::abs(v) < NEARLY_ZERO { 0.0 } else { v };
    (snap(sin), snap(cos))
}

/// Correction applied to a preview surface so the sensor image appears upright
/// and undistorted.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PreviewTransform {
    /// Full transform, view pixel space to view pixel space.
    pub matrix: Matrix,
    /// Uniform scale applied about the view center (1.0 when none).
    pub scale: f32,
    /// Rotation applied about the view center, in degrees.
    pub rotation_degrees: f32,
}

/// Compute the preview surface transform.
///
/// - 90°/270°: the view rect is mapped onto the sensor rect (width and height
///   exchanged, centered in the view), scaled by
///   `max(view.h / sensor.h, view.w / sensor.w)` about the view center, then
///   rotated by `90 * (code - 2)` degrees.
/// - 180°: rotated 180° about the view center.
/// - 0°: identity.
///
/// Returns `None` when either size is empty; the caller keeps its current
/// transform and retries on the next size event.
pub fn compute_preview_transform(
    view: Size,
    sensor: Size,
    rotation: Rotation,
) -> Option<PreviewTransform> {
    if view.is_empty() || sensor.is_empty() {
        return None;
    }

    let view_rect = RectF::from_size(view);
    let (cx, cy) = view_rect.center();

    match rotation {
        Rotation::Rotate90 | Rotation::Rotate270 => {
            let buffer = RectF::from_size(sensor.swapped());
            let (bx, by) = buffer.center();
            let buffer = buffer.offset(cx - bx, cy - by);

            let scale = f32::max(
                view.height as f32 / sensor.height as f32,
                view.width as f32 / sensor.width as f32,
            );
            let degrees = 90.0 * (rotation.code() as f32 - 2.0);
            let matrix = Matrix::rect_to_rect_fill(view_rect, buffer)?
                .post_scale(scale, scale, cx, cy)
                .post_rotate(degrees, cx, cy);
            Some(PreviewTransform {
                matrix,
                scale,
                rotation_degrees: degrees,
            })
        }
        Rotation::Rotate180 => Some(PreviewTransform {
            matrix: Matrix::rotate(180.0, cx, cy),
            scale: 1.0,
            rotation_degrees: 180.0,
        }),
        Rotation::Rotate0 => Some(PreviewTransform {
            matrix: Matrix::IDENTITY,
            scale: 1.0,
            rotation_degrees: 0.0,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    fn approx_point(p: (f32, f32), x: f32, y: f32) -> bool {
        approx(p.0, x) && approx(p.1, y)
    }

    // ── Matrix ──────────────────────────────────────────────────────────

    #[test]
    fn rotate_quarter_turns_are_exact() {
        let m = Matrix::rotate(90.0, 0.0, 0.0);
        assert_eq!((m.sx, m.kx, m.ky, m.sy), (0.0, -1.0, 1.0, 0.0));
        let m = Matrix::rotate(-90.0, 0.0, 0.0);
        assert_eq!((m.sx, m.kx, m.ky, m.sy), (0.0, 1.0, -1.0, 0.0));
    }

    #[test]
    fn rotate_about_pivot_keeps_pivot() {
        let m = Matrix::rotate(37.0, 12.0, -5.0);
        assert!(approx_point(m.map_point(12.0, -5.0), 12.0, -5.0));
    }

    #[test]
    fn clockwise_in_screen_space() {
        // +x axis turns into +y axis (down) for +90°
        let m = Matrix::rotate(90.0, 0.0, 0.0);
        assert!(approx_point(m.map_point(1.0, 0.0), 0.0, 1.0));
    }

    #[test]
    fn post_concat_order() {
        // scale then translate ≠ translate then scale
        let a = Matrix::scale(2.0, 2.0, 0.0, 0.0).post_translate(10.0, 0.0);
        assert!(approx_point(a.map_point(1.0, 0.0), 12.0, 0.0));
        let b = Matrix::translate(10.0, 0.0).post_scale(2.0, 2.0, 0.0, 0.0);
        assert!(approx_point(b.map_point(1.0, 0.0), 22.0, 0.0));
    }

    #[test]
    fn rect_to_rect_fill_maps_corners() {
        let src = RectF::new(0.0, 0.0, 100.0, 50.0);
        let dst = RectF::new(10.0, 20.0, 210.0, 220.0);
        let m = Matrix::rect_to_rect_fill(src, dst).unwrap();
        let corners = m.map_rect(src);
        assert!(approx_point(corners[0], 10.0, 20.0));
        assert!(approx_point(corners[2], 210.0, 220.0));
    }

    #[test]
    fn rect_to_rect_empty_source() {
        let empty = RectF::new(0.0, 0.0, 0.0, 10.0);
        assert!(Matrix::rect_to_rect_fill(empty, RectF::new(0.0, 0.0, 1.0, 1.0)).is_none());
    }

    // ── compute_preview_transform ───────────────────────────────────────

    #[test]
    fn rotation_0_is_identity() {
        let t = compute_preview_transform(
            Size::new(1920, 1080),
            Size::new(1280, 720),
            Rotation::Rotate0,
        )
        .unwrap();
        assert!(t.matrix.is_identity());
        assert_eq!(t.scale, 1.0);
    }

    #[test]
    fn rotation_180_flips_about_center() {
        let t = compute_preview_transform(
            Size::new(1920, 1080),
            Size::new(1280, 720),
            Rotation::Rotate180,
        )
        .unwrap();
        assert_eq!(t.rotation_degrees, 180.0);
        assert!(approx_point(t.matrix.map_point(0.0, 0.0), 1920.0, 1080.0));
        assert!(approx_point(t.matrix.map_point(960.0, 540.0), 960.0, 540.0));
    }

    #[test]
    fn rotation_90_portrait_view() {
        let view = Size::new(1080, 1920);
        let t = compute_preview_transform(view, Size::new(1280, 720), Rotation::Rotate90).unwrap();

        assert!(approx(t.scale, 1920.0 / 720.0));
        assert_eq!(t.rotation_degrees, -90.0);
        // center is a fixed point of every step
        assert!(approx_point(t.matrix.map_point(540.0, 960.0), 540.0, 960.0));
        // fill (720/1080) × scale (1920/720), then a -90° quarter turn
        let k = 1920.0 / 1080.0;
        assert!(approx(t.matrix.sx, 0.0));
        assert!(approx(t.matrix.kx, k));
        assert!(approx(t.matrix.ky, -k));
        assert!(approx(t.matrix.sy, 0.0));
    }

    #[test]
    fn rotation_270_turns_the_other_way() {
        let view = Size::new(1920, 1080);
        let t = compute_preview_transform(view, Size::new(1280, 720), Rotation::Rotate270).unwrap();
        assert_eq!(t.rotation_degrees, 90.0);
        assert!(approx(t.scale, 1.5));
        assert!(approx_point(t.matrix.map_point(960.0, 540.0), 960.0, 540.0));
        assert!(approx(t.matrix.sx, 0.0));
        assert!(t.matrix.kx < 0.0);
        assert!(t.matrix.ky > 0.0);
    }

    #[test]
    fn zero_sizes_are_skipped() {
        assert!(
            compute_preview_transform(Size::new(0, 1080), Size::new(1280, 720), Rotation::Rotate90)
                .is_none()
        );
        assert!(
            compute_preview_transform(Size::new(1920, 1080), Size::new(1280, 0), Rotation::Rotate0)
                .is_none()
        );
    }
}
