//! Preview planning: everything decided when a preview surface becomes available.
//!
//! Combines rotation reconciliation, resolution selection, view aspect
//! fitting and the surface transform into one [`PreviewPlan`].
//!
//! # Example
//!
//! ```
//! use previewfit::{PreviewSetup, Rotation, Size};
//!
//! let capture_sizes = [
//!     Size::new(4032, 2268),
//!     Size::new(1920, 1080),
//!     Size::new(1280, 720),
//!     Size::new(640, 480),
//! ];
//!
//! // Portrait phone, sensor mounted sideways.
//! let plan = PreviewSetup::new(Size::new(1080, 1920), Size::new(1080, 1920))
//!     .display_rotation(Rotation::Rotate0)
//!     .sensor_orientation(90)
//!     .plan(&capture_sizes)
//!     .unwrap();
//!
//! assert!(plan.swapped);
//! assert_eq!(plan.sensor_size, Size::new(1920, 1080));
//! assert_eq!(plan.view_aspect, Size::new(1080, 1920));
//! ```

use tracing::debug;

use crate::error::{PreviewError, Result};
use crate::geometry::{Size, largest_by_area};
use crate::rotation::Rotation;
use crate::select::{
    ChoiceReason, PreviewLimits, PreviewTarget, preview_target, select_optimal_resolution,
};
use crate::transform::{PreviewTransform, compute_preview_transform};

/// Orientation of the user interface, which decides how the view's aspect
/// ratio follows the sensor's.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum UiOrientation {
    Landscape,
    #[default]
    Portrait,
}

impl UiOrientation {
    /// Landscape when the screen is wider than tall.
    pub fn from_screen(screen: Size) -> Self {
        if screen.width > screen.height {
            Self::Landscape
        } else {
            Self::Portrait
        }
    }
}

/// Inputs for planning a preview.
///
/// All inputs are read-only snapshots supplied by the windowing layer and
/// the camera; the setup holds no state between plans.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PreviewSetup {
    pub view: Size,
    pub screen: Size,
    pub display_rotation: Rotation,
    /// Sensor mounting angle in degrees (0, 90, 180, 270).
    pub sensor_orientation: u32,
    pub ui_orientation: UiOrientation,
    pub limits: PreviewLimits,
}

impl PreviewSetup {
    /// Setup for a view on a screen, unrotated, with an upright sensor.
    /// UI orientation is derived from the screen.
    pub fn new(view: Size, screen: Size) -> Self {
        Self {
            view,
            screen,
            display_rotation: Rotation::Rotate0,
            sensor_orientation: 0,
            ui_orientation: UiOrientation::from_screen(screen),
            limits: PreviewLimits::default(),
        }
    }

    pub fn display_rotation(mut self, rotation: Rotation) -> Self {
        self.display_rotation = rotation;
        self
    }

    pub fn sensor_orientation(mut self, degrees: u32) -> Self {
        self.sensor_orientation = degrees;
        self
    }

    pub fn ui_orientation(mut self, orientation: UiOrientation) -> Self {
        self.ui_orientation = orientation;
        self
    }

    pub fn limits(mut self, limits: PreviewLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Whether sensor width/height must be swapped to match the display.
    pub fn swapped(&self) -> bool {
        self.display_rotation
            .swaps_with_sensor(self.sensor_orientation)
    }

    /// Target and bound for resolution selection, in sensor coordinates.
    pub fn target(&self) -> PreviewTarget {
        preview_target(self.view, self.screen, self.swapped(), &self.limits)
    }

    /// Plan the preview choosing among the camera's capture sizes.
    ///
    /// The largest capture size provides the reference aspect ratio.
    /// Fails only for an empty view or an empty size list.
    pub fn plan(&self, capture_sizes: &[Size]) -> Result<PreviewPlan> {
        self.plan_for(capture_sizes, capture_sizes)
    }

    /// Plan the preview choosing among `candidates`, matching the aspect
    /// ratio of the largest of `capture_sizes`.
    pub fn plan_for(&self, candidates: &[Size], capture_sizes: &[Size]) -> Result<PreviewPlan> {
        if self.view.is_empty() {
            return Err(PreviewError::ZeroDimension);
        }
        let aspect_ref = largest_by_area(capture_sizes).ok_or(PreviewError::NoCandidates)?;
        let swapped = self.swapped();
        let target = self.target();
        let choice = select_optimal_resolution(candidates, target.target, target.max, aspect_ref)?;
        let sensor_size = choice.size;

        let view_aspect = match self.ui_orientation {
            UiOrientation::Landscape => sensor_size,
            UiOrientation::Portrait => sensor_size.swapped(),
        };
        let transform = compute_preview_transform(self.view, sensor_size, self.display_rotation);

        debug!(
            width = sensor_size.width,
            height = sensor_size.height,
            swapped,
            reason = ?choice.reason,
            "preview size planned"
        );

        Ok(PreviewPlan {
            setup: *self,
            sensor_size,
            reason: choice.reason,
            swapped,
            view_aspect,
            transform,
        })
    }
}

/// Result of planning a preview.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PreviewPlan {
    /// Inputs the plan was computed from.
    pub setup: PreviewSetup,
    /// Resolution the camera should deliver preview frames at.
    pub sensor_size: Size,
    pub reason: ChoiceReason,
    /// Whether sensor and display axes are exchanged.
    pub swapped: bool,
    /// Aspect ratio the preview view should be measured to.
    pub view_aspect: Size,
    /// Surface transform. `None` only for an empty sensor size.
    pub transform: Option<PreviewTransform>,
}

impl PreviewPlan {
    /// View size after fitting the available view to [`view_aspect`](Self::view_aspect).
    pub fn fitted_view(&self) -> Size {
        self.setup.view.fit_aspect(self.view_aspect)
    }

    /// Recompute the transform after the view changed size, keeping the
    /// chosen resolution. Leaves the plan untouched for an empty view.
    pub fn resize_view(&mut self, view: Size) {
        if let Some(transform) =
            compute_preview_transform(view, self.sensor_size, self.setup.display_rotation)
        {
            self.setup.view = view;
            self.transform = Some(transform);
        }
    }
}
