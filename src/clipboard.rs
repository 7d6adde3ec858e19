//! Clipboard writers
//!
//! The cropped image is handed over as a PNG file. Both writers fork a
//! background process that keeps serving the selection after this program
//! exits, which is why the clipboard is not owned in-process.

use std::fs::File;
use std::path::Path;
use std::process::{Command, Stdio};

use log::debug;

use crate::capture::ResolvedClipboard;
use crate::error::{ClipboardError, ClipboardResult};

pub const PNG_MIME: &str = "image/png";

/// Makes an image file the active clipboard content.
pub trait ClipboardWriter {
    fn name(&self) -> &'static str;

    fn write_image(&self, path: &Path, mime: &str) -> ClipboardResult<()>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct XclipWriter;

impl ClipboardWriter for XclipWriter {
    fn name(&self) -> &'static str {
        "xclip"
    }

    fn write_image(&self, path: &Path, mime: &str) -> ClipboardResult<()> {
        debug!("Running xclip for {:?} ({})", path, mime);
        let status = Command::new("xclip")
            .args(["-selection", "clipboard", "-t", mime, "-i"])
            .arg(path)
            .status()
            .map_err(|source| ClipboardError::Spawn {
                tool: "xclip",
                source,
            })?;

        if !status.success() {
            return Err(ClipboardError::Failed {
                tool: "xclip",
                status,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct WlCopyWriter;

impl ClipboardWriter for WlCopyWriter {
    fn name(&self) -> &'static str {
        "wl-copy"
    }

    fn write_image(&self, path: &Path, mime: &str) -> ClipboardResult<()> {
        let file = File::open(path).map_err(|source| ClipboardError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        debug!("Running wl-copy for {:?} ({})", path, mime);
        let status = Command::new("wl-copy")
            .args(["--type", mime])
            .stdin(Stdio::from(file))
            .status()
            .map_err(|source| ClipboardError::Spawn {
                tool: "wl-copy",
                source,
            })?;

        if !status.success() {
            return Err(ClipboardError::Failed {
                tool: "wl-copy",
                status,
            });
        }
        Ok(())
    }
}

impl ResolvedClipboard {
    pub fn required_tool(&self) -> &'static str {
        match self {
            ResolvedClipboard::Xclip => "xclip",
            ResolvedClipboard::WlCopy => "wl-copy",
        }
    }

    pub fn writer(&self) -> Box<dyn ClipboardWriter> {
        match self {
            ResolvedClipboard::Xclip => Box::new(XclipWriter),
            ResolvedClipboard::WlCopy => Box::new(WlCopyWriter),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writer_matches_required_tool() {
        for backend in [ResolvedClipboard::Xclip, ResolvedClipboard::WlCopy] {
            assert_eq!(backend.writer().name(), backend.required_tool());
        }
    }

    #[test]
    fn test_wl_copy_missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.png");

        let err = WlCopyWriter.write_image(&missing, PNG_MIME).unwrap_err();
        assert!(matches!(err, ClipboardError::Read { .. }));
    }
}
