//! Error kinds for a snipping session.
//!
//! Capture and dependency failures are fatal and stop the program before any
//! window is shown. Clipboard failures are reported after the session has torn
//! down. Render failures never leave the frame that produced them.

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

pub type CaptureResult<T> = Result<T, CaptureError>;
pub type ClipboardResult<T> = Result<T, ClipboardError>;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("failed to run {tool}: {source}")]
    Spawn {
        tool: &'static str,
        #[source]
        source: io::Error,
    },
    #[error("{tool} exited with {status}")]
    Failed {
        tool: &'static str,
        status: ExitStatus,
    },
    #[error("screen capture failed: {0}")]
    Backend(String),
    #[error("failed to load captured image {path:?}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("failed to run {tool}: {source}")]
    Spawn {
        tool: &'static str,
        #[source]
        source: io::Error,
    },
    #[error("{tool} exited with {status}")]
    Failed {
        tool: &'static str,
        status: ExitStatus,
    },
    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write cropped image {path:?}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// A frame that could not be computed or drawn. Never surfaced to the user.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("pointer position ({0}, {1}) is not finite")]
    NonFinite(f64, f64),
    #[error("cairo: {0}")]
    Cairo(String),
}

#[derive(Debug, Error)]
pub enum SnipError {
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error("could not copy the selection to the clipboard: {0}")]
    Clipboard(#[from] ClipboardError),
    #[error("missing required dependencies: {}", missing.join(", "))]
    DependencyMissing { missing: Vec<String>, hint: String },
}

impl SnipError {
    /// Guidance printed under the error message, if any.
    pub fn remediation(&self) -> Option<&str> {
        match self {
            SnipError::DependencyMissing { hint, .. } => Some(hint),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dependency_missing_message_lists_tools() {
        let err = SnipError::DependencyMissing {
            missing: vec!["scrot".to_string(), "xclip".to_string()],
            hint: "sudo apt-get install scrot xclip".to_string(),
        };

        assert_eq!(
            err.to_string(),
            "missing required dependencies: scrot, xclip"
        );
        assert_eq!(err.remediation(), Some("sudo apt-get install scrot xclip"));
    }

    #[test]
    fn test_render_error_display() {
        let err = RenderError::NonFinite(f64::NAN, 1.0);
        assert!(err.to_string().contains("not finite"));
    }
}
