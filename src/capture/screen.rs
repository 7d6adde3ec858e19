//! Full-screen capture backends
//!
//! Each backend writes a snapshot of the whole display to a path. The session
//! loads the file afterwards, so both backends look the same from the outside.

use std::path::Path;
use std::process::Command;

use log::{debug, info};
use xcap::Monitor;

use crate::error::{CaptureError, CaptureResult};

/// Produces a full-resolution snapshot of the current display.
pub trait ScreenCapturer {
    fn name(&self) -> &'static str;

    fn capture_to(&self, path: &Path) -> CaptureResult<()>;
}

/// Runs `scrot` and trusts its exit status.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScrotCapturer;

impl ScreenCapturer for ScrotCapturer {
    fn name(&self) -> &'static str {
        "scrot"
    }

    fn capture_to(&self, path: &Path) -> CaptureResult<()> {
        debug!("Running scrot -o {:?}", path);
        let status = Command::new("scrot")
            .arg("-o")
            .arg(path)
            .status()
            .map_err(|source| CaptureError::Spawn {
                tool: "scrot",
                source,
            })?;

        if !status.success() {
            return Err(CaptureError::Failed {
                tool: "scrot",
                status,
            });
        }
        Ok(())
    }
}

/// Captures the primary monitor in-process.
#[derive(Debug, Default, Clone, Copy)]
pub struct XcapCapturer;

impl ScreenCapturer for XcapCapturer {
    fn name(&self) -> &'static str {
        "xcap"
    }

    fn capture_to(&self, path: &Path) -> CaptureResult<()> {
        let (info, image) = capture_primary_monitor()?;
        info!(
            "Captured monitor {} ({}x{}, primary: {})",
            info.name, info.width, info.height, info.is_primary
        );
        image
            .save_with_format(path, image::ImageFormat::Png)
            .map_err(|e| CaptureError::Backend(format!("Failed to save capture: {}", e)))
    }
}

/// Information about a monitor
#[derive(Debug, Clone)]
pub struct MonitorInfo {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub is_primary: bool,
}

impl MonitorInfo {
    /// Create MonitorInfo from xcap Monitor
    fn from_xcap(monitor: &Monitor) -> CaptureResult<Self> {
        Ok(Self {
            name: monitor.name().map_err(backend_err)?,
            width: monitor.width().map_err(backend_err)?,
            height: monitor.height().map_err(backend_err)?,
            is_primary: monitor.is_primary().unwrap_or(false),
        })
    }
}

/// Capture the primary monitor, falling back to the first one
pub fn capture_primary_monitor() -> CaptureResult<(MonitorInfo, image::RgbaImage)> {
    let monitors = Monitor::all()
        .map_err(|e| CaptureError::Backend(format!("Failed to get monitors: {}", e)))?;

    let monitor = pick_primary(&monitors)
        .ok_or_else(|| CaptureError::Backend("No monitors available".to_string()))?;

    let info = MonitorInfo::from_xcap(monitor)?;
    let image = monitor
        .capture_image()
        .map_err(|e| CaptureError::Backend(format!("Failed to capture screen: {}", e)))?;

    Ok((info, image))
}

fn backend_err(e: impl std::fmt::Display) -> CaptureError {
    CaptureError::Backend(e.to_string())
}

fn pick_primary(monitors: &[Monitor]) -> Option<&Monitor> {
    monitors
        .iter()
        .find(|m| m.is_primary().unwrap_or(false))
        .or(monitors.first())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xcap_capture_writes_png_or_reports_backend_error() {
        // Headless machines have no monitor to capture
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capture.png");
        match XcapCapturer.capture_to(&path) {
            Ok(()) => {
                let image = image::open(&path).unwrap();
                assert!(image.width() > 0 && image.height() > 0);
            }
            Err(e) => assert!(matches!(e, CaptureError::Backend(_))),
        }
    }

    #[test]
    fn test_backend_names() {
        assert_eq!(ScrotCapturer.name(), "scrot");
        assert_eq!(XcapCapturer.name(), "xcap");
    }
}
