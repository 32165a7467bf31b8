//! Camera controller and the capture-source seam.
//!
//! [`CameraBackend`] is what a platform camera API implements (a legacy
//! single-call API and a request-based one both fit). [`CameraController`]
//! drives a backend through open → preview set → previewing, owns the
//! preview plan, and runs the [`FrameRelay`] when frames are pulled into
//! the application instead of going straight to a surface.

use tracing::{debug, info, warn};

use crate::error::{BackendError, PreviewError, Result};
use crate::focus::{FocusMode, MeteringArea, focus_rect_at};
use crate::format::{PictureType, PreviewFormat};
use crate::geometry::{Rect, Size};
use crate::plan::{PreviewPlan, PreviewSetup};
use crate::relay::{FrameConsumer, FrameProducer, FrameRelay, RelayConfig, RelayStats};

/// Where preview frames go.
#[derive(Clone, Debug)]
pub enum OutputTarget {
    /// Frames are rendered by the platform onto a surface of the given view size.
    Surface { view: Size },
    /// Frames are pushed into a relay and rendered by the application.
    Frames(FrameProducer),
}

/// A platform camera.
///
/// Implementations wrap one physical camera. Methods are called from the
/// controller's thread; frames pushed into a [`OutputTarget::Frames`]
/// producer may come from any thread.
pub trait CameraBackend {
    /// Open camera `id`.
    fn open(&mut self, id: u32) -> Result<(), BackendError>;

    fn close(&mut self);

    /// Still capture sizes, in the order the camera reports them.
    fn supported_capture_sizes(&self) -> Vec<Size>;

    fn supported_preview_sizes(&self) -> Vec<Size>;

    fn supported_preview_formats(&self) -> Vec<PreviewFormat>;

    /// Sensor mounting angle in degrees.
    fn sensor_orientation(&self) -> u32;

    /// Configure preview resolution and format before starting.
    fn configure_preview(&mut self, size: Size, format: PreviewFormat) -> Result<(), BackendError>;

    fn set_preview_target(&mut self, target: OutputTarget) -> Result<(), BackendError>;

    fn start_preview(&mut self) -> Result<(), BackendError>;

    fn stop_preview(&mut self);

    fn focus_mode(&self) -> FocusMode;

    fn set_focus_mode(&mut self, mode: FocusMode) -> Result<(), BackendError>;

    /// Apply focus and metering areas. Returns whether the camera accepted any.
    fn set_focus_areas(&mut self, areas: &[MeteringArea]) -> bool;

    /// Run one auto-focus cycle; `Ok(true)` when focus locked.
    fn auto_focus(&mut self) -> Result<bool, BackendError>;

    fn take_picture(&mut self, kind: PictureType) -> Result<Vec<u8>, BackendError>;

    /// Enable or disable the shutter sound. Returns whether the camera allows it.
    fn set_shutter_sound(&mut self, enabled: bool) -> bool;
}

/// Lifecycle state of a [`CameraController`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum CameraState {
    #[default]
    NotInitialized,
    Opened,
    Failed,
    /// A preview target is installed.
    PreviewSet,
    Previewing,
}

impl CameraState {
    pub fn name(self) -> &'static str {
        match self {
            Self::NotInitialized => "not initialized",
            Self::Opened => "opened",
            Self::Failed => "failed",
            Self::PreviewSet => "preview set",
            Self::Previewing => "previewing",
        }
    }
}

/// A still picture as delivered by the camera.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Picture {
    pub kind: PictureType,
    pub data: Vec<u8>,
}

/// Drives one camera backend.
#[derive(Debug)]
pub struct CameraController<B> {
    backend: B,
    state: CameraState,
    setup: Option<PreviewSetup>,
    plan: Option<PreviewPlan>,
    relay: Option<FrameRelay>,
    relay_config: RelayConfig,
}

impl<B: CameraBackend> CameraController<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            state: CameraState::NotInitialized,
            setup: None,
            plan: None,
            relay: None,
            relay_config: RelayConfig::default(),
        }
    }

    /// Use `config` for relays started by [`start_preview_with`](Self::start_preview_with).
    pub fn with_relay_config(mut self, config: RelayConfig) -> Self {
        self.relay_config = config;
        self
    }

    pub fn state(&self) -> CameraState {
        self.state
    }

    pub fn plan(&self) -> Option<&PreviewPlan> {
        self.plan.as_ref()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Frame counters of the running relay, if any.
    pub fn relay_stats(&self) -> Option<RelayStats> {
        self.relay.as_ref().map(FrameRelay::stats)
    }

    /// Open camera `id`. If a preview view was already set up, the preview
    /// is planned and installed right away.
    ///
    /// Fails with [`PreviewError::InvalidState`] while a camera is open;
    /// [`release`](Self::release) it first.
    pub fn open(&mut self, id: u32) -> Result<()> {
        if !matches!(self.state, CameraState::NotInitialized | CameraState::Failed) {
            return Err(self.invalid("open"));
        }
        if let Err(e) = self.backend.open(id) {
            warn!(id, error = %e, "camera open failed");
            self.state = CameraState::Failed;
            return Err(e.into());
        }
        info!(id, "camera opened");
        self.state = CameraState::Opened;
        if let Some(setup) = self.setup {
            self.install_surface(setup)?;
        }
        Ok(())
    }

    /// Stop any preview and close the camera.
    pub fn release(&mut self) {
        self.stop_relay();
        if matches!(self.state, CameraState::Previewing) {
            self.backend.stop_preview();
        }
        self.backend.close();
        self.state = CameraState::NotInitialized;
        self.plan = None;
        info!("camera released");
    }

    /// Record the preview view and, when the camera is open, plan and install it.
    ///
    /// `setup.sensor_orientation` is overwritten with the backend's value.
    /// Returns the plan when one was computed.
    pub fn set_up_preview(&mut self, setup: PreviewSetup) -> Result<Option<&PreviewPlan>> {
        let setup = setup.sensor_orientation(self.backend.sensor_orientation());
        self.setup = Some(setup);
        if self.state == CameraState::Opened {
            self.install_surface(setup)?;
            return Ok(self.plan.as_ref());
        }
        Ok(None)
    }

    fn install_surface(&mut self, setup: PreviewSetup) -> Result<()> {
        let capture = self.backend.supported_capture_sizes();
        let preview = self.backend.supported_preview_sizes();
        let candidates = if preview.is_empty() { &capture } else { &preview };
        let plan = setup.plan_for(candidates, &capture)?;
        info!(
            width = plan.sensor_size.width,
            height = plan.sensor_size.height,
            "preview size chosen"
        );
        self.backend.set_preview_target(OutputTarget::Surface { view: setup.view })?;
        self.plan = Some(plan);
        self.state = CameraState::PreviewSet;
        Ok(())
    }

    /// Recompute the surface transform after the view changed size.
    ///
    /// The preview resolution is kept. Returns the updated plan, or `None`
    /// when nothing has been planned yet.
    pub fn resize_view(&mut self, view: Size) -> Option<&PreviewPlan> {
        if !view.is_empty()
            && let Some(setup) = self.setup.as_mut()
        {
            setup.view = view;
        }
        let plan = self.plan.as_mut()?;
        plan.resize_view(view);
        Some(&*plan)
    }

    /// Start previewing onto the installed surface.
    pub fn start_preview(&mut self) -> Result<()> {
        self.require(CameraState::PreviewSet, "start preview")?;
        let size = self.planned_size()?;
        let view = self.surface_view()?;
        self.backend.set_preview_target(OutputTarget::Surface { view })?;
        self.backend.configure_preview(size, PreviewFormat::default())?;
        self.backend.start_preview()?;
        self.state = CameraState::Previewing;
        info!("preview started");
        Ok(())
    }

    /// Start previewing with frames pulled through a relay into `consumer`.
    ///
    /// The relay buffer is sized for `format` at the planned resolution.
    /// An unsupported format fails immediately with
    /// [`PreviewError::UnsupportedFormat`].
    pub fn start_preview_with<C: FrameConsumer>(
        &mut self,
        format: PreviewFormat,
        consumer: C,
    ) -> Result<()> {
        self.require(CameraState::PreviewSet, "start preview")?;
        if !self.backend.supported_preview_formats().contains(&format) {
            warn!(?format, "unsupported preview format");
            return Err(PreviewError::UnsupportedFormat(format));
        }
        let size = self.planned_size()?;
        self.backend.configure_preview(size, format)?;

        let relay = FrameRelay::start_with(&self.relay_config, format, size, consumer)?;
        self.backend
            .set_preview_target(OutputTarget::Frames(relay.producer()))?;
        self.relay = Some(relay);
        if let Err(e) = self.backend.start_preview() {
            self.stop_relay();
            self.restore_surface();
            return Err(e.into());
        }
        self.state = CameraState::Previewing;
        info!(?format, "preview started with frame relay");
        Ok(())
    }

    /// Stop previewing. A relay preview is torn down and the surface target
    /// put back, so a later [`start_preview`](Self::start_preview) renders
    /// onto the view again.
    pub fn stop_preview(&mut self) {
        if self.state != CameraState::Previewing {
            return;
        }
        self.backend.stop_preview();
        if self.relay.is_some() {
            self.stop_relay();
            self.restore_surface();
        }
        self.state = CameraState::PreviewSet;
        info!("preview stopped");
    }

    /// Focus on the area around a tap at view coordinates `(x, y)`.
    ///
    /// Returns the tapped rect in view pixels (for drawing an indicator) and
    /// whether focus locked.
    pub fn start_auto_focus_at(&mut self, x: f32, y: f32) -> Result<(Rect, bool)> {
        if !matches!(
            self.state,
            CameraState::Opened | CameraState::PreviewSet | CameraState::Previewing
        ) {
            return Err(self.invalid("focus"));
        }
        let view = self
            .setup
            .map(|s| s.view)
            .ok_or(PreviewError::InvalidState {
                operation: "focus",
                state: "without a preview view",
            })?;
        let rect = focus_rect_at(view, x, y);
        let area = MeteringArea::from_view_rect(rect, view).ok_or(PreviewError::ZeroDimension)?;

        self.backend.set_focus_mode(FocusMode::Auto)?;
        if !self.backend.set_focus_areas(&[area]) {
            debug!("focus and metering areas not supported");
        }
        let mode = self.backend.focus_mode();
        let locked = if !mode.supports_auto_focus() {
            debug!(?mode, "camera cannot run auto focus");
            false
        } else {
            match self.backend.auto_focus() {
                Ok(locked) => locked,
                Err(e) => {
                    warn!(error = %e, "failed to start auto focus");
                    false
                }
            }
        };
        debug!(locked, left = rect.left, top = rect.top, "focus finished");
        Ok((rect, locked))
    }

    /// Capture a still picture. Saving it is up to the caller.
    pub fn take_picture(&mut self, kind: PictureType) -> Result<Picture> {
        if !matches!(self.state, CameraState::PreviewSet | CameraState::Previewing) {
            return Err(self.invalid("take picture"));
        }
        let data = self.backend.take_picture(kind)?;
        debug!(?kind, bytes = data.len(), "picture taken");
        Ok(Picture { kind, data })
    }

    /// Returns whether the camera allowed changing the shutter sound.
    pub fn set_shutter_sound(&mut self, enabled: bool) -> bool {
        let allowed = self.backend.set_shutter_sound(enabled);
        debug!(enabled, allowed, "shutter sound");
        allowed
    }

    fn planned_size(&self) -> Result<Size> {
        self.plan
            .as_ref()
            .map(|p| p.sensor_size)
            .ok_or_else(|| self.invalid("start preview without a plan"))
    }

    fn surface_view(&self) -> Result<Size> {
        self.setup
            .map(|s| s.view)
            .ok_or_else(|| self.invalid("start preview without a view"))
    }

    fn restore_surface(&mut self) {
        let Some(view) = self.setup.map(|s| s.view) else {
            return;
        };
        if let Err(e) = self.backend.set_preview_target(OutputTarget::Surface { view }) {
            warn!(error = %e, "failed to reinstall preview surface");
        }
    }

    fn require(&self, state: CameraState, operation: &'static str) -> Result<()> {
        if self.state == state {
            Ok(())
        } else {
            Err(self.invalid(operation))
        }
    }

    fn invalid(&self, operation: &'static str) -> PreviewError {
        PreviewError::InvalidState {
            operation,
            state: self.state.name(),
        }
    }

    fn stop_relay(&mut self) {
        if let Some(mut relay) = self.relay.take() {
            relay.stop();
        }
    }
}
