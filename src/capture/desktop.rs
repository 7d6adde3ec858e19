use std::env;

use crate::app::config::{CaptureBackend, ClipboardBackend};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayServer {
    Wayland,
    X11,
    Unknown,
}

impl std::fmt::Display for DisplayServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DisplayServer::Wayland => write!(f, "Wayland"),
            DisplayServer::X11 => write!(f, "X11"),
            DisplayServer::Unknown => write!(f, "Unknown"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DesktopEnvironment {
    Gnome,
    Cinnamon,
    Kde,
    Xfce,
    Other(Option<String>),
}

impl std::fmt::Display for DesktopEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DesktopEnvironment::Gnome => write!(f, "GNOME"),
            DesktopEnvironment::Cinnamon => write!(f, "Cinnamon"),
            DesktopEnvironment::Kde => write!(f, "KDE Plasma"),
            DesktopEnvironment::Xfce => write!(f, "XFCE"),
            DesktopEnvironment::Other(Some(name)) => write!(f, "{}", name),
            DesktopEnvironment::Other(None) => write!(f, "Unknown"),
        }
    }
}

/// Concrete backends picked for this desktop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedCapture {
    Scrot,
    Xcap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedClipboard {
    Xclip,
    WlCopy,
}

#[derive(Debug, Clone)]
pub struct DesktopSession {
    pub display_server: DisplayServer,
    pub desktop_environment: DesktopEnvironment,
}

impl DesktopSession {
    pub fn detect() -> Self {
        Self::detect_with(|key| env::var(key).ok())
    }

    pub fn detect_with(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let display_server = detect_display_server(&lookup);
        let desktop_environment = detect_desktop_environment(&lookup);

        Self {
            display_server,
            desktop_environment,
        }
    }

    pub fn is_wayland(&self) -> bool {
        self.display_server == DisplayServer::Wayland
    }

    /// Desktops whose custom keybindings live under the GNOME media-keys schema.
    pub fn uses_gnome_keybindings(&self) -> bool {
        matches!(
            self.desktop_environment,
            DesktopEnvironment::Gnome | DesktopEnvironment::Cinnamon
        )
    }

    pub fn capture_backend(&self, requested: CaptureBackend) -> ResolvedCapture {
        match requested {
            CaptureBackend::Scrot => ResolvedCapture::Scrot,
            CaptureBackend::Xcap => ResolvedCapture::Xcap,
            CaptureBackend::Auto => match self.display_server {
                DisplayServer::X11 => ResolvedCapture::Scrot,
                _ => ResolvedCapture::Xcap,
            },
        }
    }

    pub fn clipboard_backend(&self, requested: ClipboardBackend) -> ResolvedClipboard {
        match requested {
            ClipboardBackend::Xclip => ResolvedClipboard::Xclip,
            ClipboardBackend::WlCopy => ResolvedClipboard::WlCopy,
            ClipboardBackend::Auto if self.is_wayland() => ResolvedClipboard::WlCopy,
            ClipboardBackend::Auto => ResolvedClipboard::Xclip,
        }
    }
}

impl std::fmt::Display for DesktopSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} on {}", self.desktop_environment, self.display_server)
    }
}

fn detect_display_server(lookup: &impl Fn(&str) -> Option<String>) -> DisplayServer {
    if let Some(session_type) = lookup("XDG_SESSION_TYPE") {
        match session_type.to_lowercase().as_str() {
            "wayland" => return DisplayServer::Wayland,
            "x11" => return DisplayServer::X11,
            _ => {}
        }
    }

    if lookup("WAYLAND_DISPLAY").is_some() {
        return DisplayServer::Wayland;
    }

    if lookup("DISPLAY").is_some() {
        return DisplayServer::X11;
    }

    DisplayServer::Unknown
}

fn detect_desktop_environment(lookup: &impl Fn(&str) -> Option<String>) -> DesktopEnvironment {
    if let Some(current_desktop) = lookup("XDG_CURRENT_DESKTOP") {
        let desktop_lower = current_desktop.to_lowercase();

        for component in desktop_lower.split(':') {
            match component.trim() {
                "gnome" | "unity" | "ubuntu" | "pop" => return DesktopEnvironment::Gnome,
                "cinnamon" | "x-cinnamon" => return DesktopEnvironment::Cinnamon,
                "kde" | "plasma" | "kde-plasma" => return DesktopEnvironment::Kde,
                "xfce" | "xfce4" => return DesktopEnvironment::Xfce,
                _ => continue,
            }
        }

        if !current_desktop.is_empty() {
            return DesktopEnvironment::Other(Some(current_desktop));
        }
    }

    if let Some(desktop_session) = lookup("DESKTOP_SESSION") {
        let session_lower = desktop_session.to_lowercase();

        if session_lower.contains("gnome") || session_lower.contains("ubuntu") {
            return DesktopEnvironment::Gnome;
        } else if session_lower.contains("cinnamon") {
            return DesktopEnvironment::Cinnamon;
        } else if session_lower.contains("plasma") || session_lower.contains("kde") {
            return DesktopEnvironment::Kde;
        } else if session_lower.contains("xfce") {
            return DesktopEnvironment::Xfce;
        }
    }

    if lookup("GNOME_DESKTOP_SESSION_ID").is_some() {
        return DesktopEnvironment::Gnome;
    }

    DesktopEnvironment::Other(None)
}
