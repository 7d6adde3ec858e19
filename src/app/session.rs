//! One snipping session: capture, select, crop, deliver or cancel.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use image::{imageops, Rgba, RgbaImage};
use log::{debug, info, warn};

use crate::app::config::{OverlayPolicy, SnipConfig};
use crate::app::state::{
    transition, CropRect, OverlayFrame, Point, SelectionEvent, SelectionState, SideEffect,
    VisualEffect,
};
use crate::capture::ScreenCapturer;
use crate::clipboard::{ClipboardWriter, PNG_MIME};
use crate::error::{CaptureError, CaptureResult, ClipboardError};

/// The two files a session writes. Both are removed exactly once, on the
/// first call to [`TempArtifacts::cleanup`] or on drop.
#[derive(Debug)]
pub struct TempArtifacts {
    capture: PathBuf,
    cropped: PathBuf,
    removed: bool,
}

impl TempArtifacts {
    pub fn new(capture: PathBuf, cropped: PathBuf) -> Self {
        Self {
            capture,
            cropped,
            removed: false,
        }
    }

    pub fn capture_path(&self) -> &Path {
        &self.capture
    }

    pub fn cropped_path(&self) -> &Path {
        &self.cropped
    }

    /// Remove both files. Later calls do nothing.
    pub fn cleanup(&mut self) {
        if self.removed {
            return;
        }
        self.removed = true;
        remove_if_present(&self.capture);
        remove_if_present(&self.cropped);
    }
}

impl Drop for TempArtifacts {
    fn drop(&mut self) {
        self.cleanup();
    }
}

fn remove_if_present(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => debug!("Removed {:?}", path),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove {:?}: {}", path, e),
    }
}

/// Scale every color channel by `factor`, rounding down. Alpha is kept.
pub fn darken(image: &RgbaImage, factor: f32) -> RgbaImage {
    let scale = |c: u8| (f32::from(c) * factor).floor().clamp(0.0, 255.0) as u8;
    let mut out = image.clone();
    for Rgba([r, g, b, _]) in out.pixels_mut() {
        *r = scale(*r);
        *g = scale(*g);
        *b = scale(*b);
    }
    out
}

/// How a session ended
#[derive(Debug)]
pub enum SessionEnd {
    Copied { width: u32, height: u32 },
    Cancelled,
    /// The crop was taken but the clipboard writer failed
    ClipboardFailed(ClipboardError),
}

/// What the overlay surface should do after an event
#[derive(Debug)]
pub enum SurfaceCommand {
    Nothing,
    Redraw,
    /// Hide now and deliver [`SelectionEvent::FinalizeDue`] after the delay
    HideAndFinalizeAfter(Duration),
    Close(SessionEnd),
}

pub struct Session {
    state: SelectionState,
    base: Option<RgbaImage>,
    darkened: Option<RgbaImage>,
    overlay: OverlayFrame,
    artifacts: TempArtifacts,
    clipboard: Box<dyn ClipboardWriter>,
    policy: OverlayPolicy,
    commit_settle: Duration,
    /// Image pixels per surface unit, horizontally and vertically
    surface_scale: (f64, f64),
    revealed: bool,
}

impl Session {
    /// Capture the screen and load it as the session's base image.
    ///
    /// Nothing is shown on failure and the capture file is removed.
    pub fn begin(
        config: &SnipConfig,
        capturer: &dyn ScreenCapturer,
        clipboard: Box<dyn ClipboardWriter>,
    ) -> CaptureResult<Self> {
        let artifacts = TempArtifacts::new(config.capture_path(), config.cropped_path());

        debug!(
            "Capturing with {} into {:?}",
            capturer.name(),
            artifacts.capture_path()
        );
        capturer.capture_to(artifacts.capture_path())?;

        let base = image::open(artifacts.capture_path())
            .map_err(|source| CaptureError::Load {
                path: artifacts.capture_path().to_path_buf(),
                source,
            })?
            .to_rgba8();
        info!("Captured {}x{} screen", base.width(), base.height());

        let darkened = darken(&base, config.overlay.darken_factor);

        Ok(Self {
            state: SelectionState::Idle,
            base: Some(base),
            darkened: Some(darkened),
            overlay: OverlayFrame::empty(),
            artifacts,
            clipboard,
            policy: config.overlay,
            commit_settle: config.commit_settle,
            surface_scale: (1.0, 1.0),
            revealed: false,
        })
    }

    pub fn overlay(&self) -> OverlayFrame {
        self.overlay
    }

    pub fn policy(&self) -> &OverlayPolicy {
        &self.policy
    }

    pub fn base_image(&self) -> Option<&RgbaImage> {
        self.base.as_ref()
    }

    pub fn darkened_image(&self) -> Option<&RgbaImage> {
        self.darkened.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_terminal()
    }

    /// Mark the surface interactive once the capture settle delay elapsed.
    /// Returns false if the session ended in the meantime.
    pub fn reveal(&mut self) -> bool {
        if self.is_finished() {
            return false;
        }
        self.revealed = true;
        true
    }

    /// Record the drawing surface size so surface units map to image pixels.
    pub fn set_surface_size(&mut self, width: f64, height: f64) {
        let Some(base) = &self.base else { return };
        if width > 0.0 && height > 0.0 {
            self.surface_scale = (
                f64::from(base.width()) / width,
                f64::from(base.height()) / height,
            );
        }
    }

    pub fn on_pointer_down(&mut self, point: Point) -> SurfaceCommand {
        self.handle(SelectionEvent::PointerDown(point))
    }

    pub fn on_pointer_move(&mut self, point: Point) -> SurfaceCommand {
        self.handle(SelectionEvent::PointerMove(point))
    }

    pub fn on_pointer_up(&mut self, point: Point) -> SurfaceCommand {
        self.handle(SelectionEvent::PointerUp(point))
    }

    pub fn cancel(&mut self) -> SurfaceCommand {
        self.handle(SelectionEvent::Cancel)
    }

    pub fn handle(&mut self, event: SelectionEvent) -> SurfaceCommand {
        let is_pointer = matches!(
            event,
            SelectionEvent::PointerDown(_)
                | SelectionEvent::PointerMove(_)
                | SelectionEvent::PointerUp(_)
        );
        if is_pointer && !self.revealed {
            return SurfaceCommand::Nothing;
        }

        let step = transition(&self.state, event, &self.policy);
        if step.state != self.state {
            debug!("Selection {:?} -> {:?}", self.state, step.state);
        }
        self.state = step.state;

        let frame_changed = match step.visual {
            VisualEffect::Show(frame) => {
                self.overlay = frame;
                true
            }
            VisualEffect::Keep | VisualEffect::HideSurface => false,
        };

        match step.side {
            SideEffect::None if frame_changed => SurfaceCommand::Redraw,
            SideEffect::None => SurfaceCommand::Nothing,
            SideEffect::ScheduleFinalize => SurfaceCommand::HideAndFinalizeAfter(self.commit_settle),
            SideEffect::Teardown => {
                info!("Selection cancelled");
                self.teardown();
                SurfaceCommand::Close(SessionEnd::Cancelled)
            }
            SideEffect::Finalize(rect) => SurfaceCommand::Close(self.finalize(rect)),
        }
    }

    /// Crop `rect` (surface units) out of the base image, hand it to the
    /// clipboard, then tear down. Teardown runs whatever the clipboard does.
    pub fn finalize(&mut self, rect: CropRect) -> SessionEnd {
        let Some(base) = self.base.take() else {
            debug!("Finalize after teardown ignored");
            return SessionEnd::Cancelled;
        };
        self.state = SelectionState::Completed;

        let end = self.deliver(&base, rect);
        self.teardown();
        end
    }

    fn deliver(&self, base: &RgbaImage, rect: CropRect) -> SessionEnd {
        let area = rect
            .scaled(self.surface_scale.0, self.surface_scale.1)
            .clamp_to(base.width(), base.height());
        if area.is_empty() {
            info!("Selection {:?} lies outside the screen, nothing to copy", rect);
            return SessionEnd::Cancelled;
        }

        let (width, height) = (area.width() as u32, area.height() as u32);
        let cropped =
            imageops::crop_imm(base, area.left as u32, area.top as u32, width, height).to_image();

        let path = self.artifacts.cropped_path();
        if let Err(source) = cropped.save_with_format(path, image::ImageFormat::Png) {
            return SessionEnd::ClipboardFailed(ClipboardError::Encode {
                path: path.to_path_buf(),
                source,
            });
        }

        match self.clipboard.write_image(path, PNG_MIME) {
            Ok(()) => {
                info!(
                    "Copied {}x{} selection to the clipboard via {}",
                    width,
                    height,
                    self.clipboard.name()
                );
                SessionEnd::Copied { width, height }
            }
            Err(e) => SessionEnd::ClipboardFailed(e),
        }
    }

    fn teardown(&mut self) {
        self.base = None;
        self.darkened = None;
        self.overlay = OverlayFrame::empty();
        self.revealed = false;
        self.artifacts.cleanup();
    }
}
