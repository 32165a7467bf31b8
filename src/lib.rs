//! Camera preview geometry and frame hand-off.
//!
//! Everything needed to show a camera preview correctly on a rotatable
//! screen: picking the preview resolution, deciding whether sensor axes are
//! swapped relative to the display, and computing the surface transform that
//! letterboxes and rotates the preview. The geometry is pure computation,
//! `no_std` compatible.
//!
//! With the `std` feature, a bounded single-slot [`FrameRelay`] hands
//! preview frames from the camera's callback thread to a consumer thread,
//! dropping frames instead of queueing them, and a [`CameraController`]
//! drives a platform [`CameraBackend`] through its preview lifecycle.
//!
//! # Modules
//!
//! - [`geometry`]: sizes and integer rects
//! - [`rotation`]: display rotation and sensor orientation reconciliation
//! - [`select`]: preview resolution selection
//! - [`transform`]: 2-D affine matrix and the preview surface transform
//! - [`plan`]: everything decided when a preview surface becomes available
//! - [`focus`]: tap-to-focus and metering areas
//! - [`format`]: preview pixel formats
//! - `relay` (std): lossy single-slot frame relay
//! - `camera` (std): controller and backend seam
//! - `svg` (svg): plan visualization
//!
//! # Example
//!
//! ```
//! use previewfit::{Size, resolve_swapped_dimensions, select_optimal_resolution};
//!
//! // Portrait phone with a sideways sensor.
//! assert!(resolve_swapped_dimensions(90, 0));
//!
//! let candidates = [Size::new(1920, 1080), Size::new(1280, 720), Size::new(640, 480)];
//! let choice = select_optimal_resolution(
//!     &candidates,
//!     Size::new(1280, 720),
//!     Size::new(1920, 1080),
//!     Size::new(1920, 1080),
//! )
//! .unwrap();
//! assert_eq!(choice.size, Size::new(1280, 720));
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

pub mod error;
pub mod focus;
pub mod format;
pub mod geometry;
pub mod plan;
pub mod rotation;
pub mod select;
pub mod transform;

#[cfg(feature = "std")]
pub mod camera;
#[cfg(feature = "std")]
pub mod relay;

#[cfg(feature = "svg")]
pub mod svg;

pub use error::{PreviewError, Result};
pub use focus::{FocusMode, MeteringArea, focus_rect_at};
pub use format::{PictureType, PreviewFormat};
pub use geometry::{Rect, Size};
pub use plan::{PreviewPlan, PreviewSetup, UiOrientation};
pub use rotation::{Rotation, resolve_swapped_dimensions};
pub use select::{ChoiceReason, PreviewLimits, SizeChoice, select_optimal_resolution};
pub use transform::{Matrix, PreviewTransform, RectF, compute_preview_transform};

#[cfg(feature = "std")]
pub use camera::{CameraBackend, CameraController, CameraState, OutputTarget, Picture};
#[cfg(feature = "std")]
pub use error::BackendError;
#[cfg(feature = "std")]
pub use relay::{
    Frame, FrameConsumer, FrameProducer, FrameRelay, ProcessingHold, RelayConfig, RelayState,
    RelayStats, Submission,
};
