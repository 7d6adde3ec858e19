//! Capture module for full-screen snapshots
//!
//! Desktop detection decides which backend runs; both backends implement
//! [`ScreenCapturer`].

pub mod desktop;
pub mod screen;

pub use desktop::{DesktopSession, ResolvedCapture, ResolvedClipboard};
pub use screen::{ScreenCapturer, ScrotCapturer, XcapCapturer};

impl ResolvedCapture {
    /// External executable this backend needs on `PATH`.
    pub fn required_tool(&self) -> Option<&'static str> {
        match self {
            ResolvedCapture::Scrot => Some("scrot"),
            ResolvedCapture::Xcap => None,
        }
    }

    pub fn capturer(&self) -> Box<dyn ScreenCapturer> {
        match self {
            ResolvedCapture::Scrot => Box::new(ScrotCapturer),
            ResolvedCapture::Xcap => Box::new(XcapCapturer),
        }
    }
}
