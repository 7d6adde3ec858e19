use gtk::gdk;
use gtk4 as gtk;
use log::warn;
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const CAPTURE_FILE_NAME: &str = "full_screen_snip.png";
pub const CROPPED_FILE_NAME: &str = "cropped_snip.png";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Cancel,
}

impl Action {
    pub fn label(&self) -> &str {
        match self {
            Action::Cancel => "Cancel / Exit",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Shortcut {
    pub key: gdk::Key,
    pub modifiers: gdk::ModifierType,
}

/// Key bindings active while the selection overlay is shown.
#[derive(Debug, Clone)]
pub struct ShortcutConfig {
    bindings: HashMap<Action, Shortcut>,
}

impl Default for ShortcutConfig {
    fn default() -> Self {
        let mut bindings = HashMap::new();
        bindings.insert(
            Action::Cancel,
            Shortcut {
                key: gdk::Key::Escape,
                modifiers: gdk::ModifierType::empty(),
            },
        );
        Self { bindings }
    }
}

impl ShortcutConfig {
    pub fn get_action(&self, key: gdk::Key, modifiers: gdk::ModifierType) -> Option<Action> {
        // Filter out irrelevant modifiers like NumLock/CapsLock/ScrollLock
        let mask = gdk::ModifierType::CONTROL_MASK
            | gdk::ModifierType::SHIFT_MASK
            | gdk::ModifierType::ALT_MASK
            | gdk::ModifierType::SUPER_MASK
            | gdk::ModifierType::META_MASK;

        let clean_mods = modifiers & mask;

        self.bindings
            .iter()
            .find(|(_, shortcut)| shortcut.key == key && shortcut.modifiers == clean_mods)
            .map(|(action, _)| *action)
    }
}

/// How the selection overlay looks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayPolicy {
    /// Per-channel multiplier for the background outside the selection.
    pub darken_factor: f32,
    /// Width and height, in surface units, a selection must exceed before
    /// the bright region and border are shown.
    pub visibility_threshold: f64,
    pub border_width: f64,
    /// Border color as RGB in `[0, 1]`.
    pub border_color: (f64, f64, f64),
}

impl Default for OverlayPolicy {
    fn default() -> Self {
        Self {
            darken_factor: 0.3,
            visibility_threshold: 5.0,
            border_width: 2.0,
            border_color: (1.0, 1.0, 1.0),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum CaptureBackend {
    /// scrot on X11, xcap elsewhere
    #[default]
    Auto,
    Scrot,
    Xcap,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ClipboardBackend {
    /// wl-copy on Wayland, xclip elsewhere
    #[default]
    Auto,
    Xclip,
    #[value(name = "wl-copy")]
    WlCopy,
}

#[derive(Debug, Clone)]
pub struct SnipConfig {
    pub overlay: OverlayPolicy,
    /// Pause between capturing and making the overlay visible.
    pub capture_settle: Duration,
    /// Pause between hiding the overlay and cropping.
    pub commit_settle: Duration,
    pub temp_dir: PathBuf,
    pub capture_backend: CaptureBackend,
    pub clipboard_backend: ClipboardBackend,
    pub shortcuts: ShortcutConfig,
}

impl Default for SnipConfig {
    fn default() -> Self {
        Self {
            overlay: OverlayPolicy::default(),
            capture_settle: Duration::from_millis(100),
            commit_settle: Duration::from_millis(100),
            temp_dir: env::temp_dir(),
            capture_backend: CaptureBackend::default(),
            clipboard_backend: ClipboardBackend::default(),
            shortcuts: ShortcutConfig::default(),
        }
    }
}

impl SnipConfig {
    /// Defaults with `SNIP_*` environment overrides applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_overrides(|key| env::var(key).ok());
        config
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(factor) = parse_override::<f32>(&lookup, "SNIP_DARKEN_FACTOR") {
            if factor.is_finite() && factor >= 0.0 {
                self.overlay.darken_factor = factor;
            } else {
                warn!("Ignoring SNIP_DARKEN_FACTOR={}: must be >= 0", factor);
            }
        }
        if let Some(threshold) = parse_override::<f64>(&lookup, "SNIP_VISIBILITY_THRESHOLD") {
            if threshold.is_finite() && threshold >= 0.0 {
                self.overlay.visibility_threshold = threshold;
            } else {
                warn!("Ignoring SNIP_VISIBILITY_THRESHOLD={}: must be >= 0", threshold);
            }
        }
        if let Some(width) = parse_override::<f64>(&lookup, "SNIP_BORDER_WIDTH") {
            if width.is_finite() && width >= 0.0 {
                self.overlay.border_width = width;
            } else {
                warn!("Ignoring SNIP_BORDER_WIDTH={}: must be >= 0", width);
            }
        }
        if let Some(ms) = parse_override::<u64>(&lookup, "SNIP_SETTLE_MS") {
            self.capture_settle = Duration::from_millis(ms);
            self.commit_settle = Duration::from_millis(ms);
        }
        if let Some(dir) = lookup("SNIP_TMP_DIR").filter(|d| !d.is_empty()) {
            self.temp_dir = PathBuf::from(dir);
        }
    }

    pub fn capture_path(&self) -> PathBuf {
        self.temp_dir.join(CAPTURE_FILE_NAME)
    }

    pub fn cropped_path(&self) -> PathBuf {
        self.temp_dir.join(CROPPED_FILE_NAME)
    }
}

fn parse_override<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring {}={:?}: not a valid value", key, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_constants() {
        let config = SnipConfig::default();
        assert_eq!(config.overlay.darken_factor, 0.3);
        assert_eq!(config.overlay.visibility_threshold, 5.0);
        assert_eq!(config.overlay.border_width, 2.0);
        assert_eq!(config.capture_settle, Duration::from_millis(100));
        assert_eq!(config.commit_settle, Duration::from_millis(100));
    }

    #[test]
    fn test_temp_paths_share_directory() {
        let mut config = SnipConfig::default();
        config.temp_dir = PathBuf::from("/var/tmp/snips");
        assert_eq!(
            config.capture_path(),
            PathBuf::from("/var/tmp/snips/full_screen_snip.png")
        );
        assert_eq!(
            config.cropped_path(),
            PathBuf::from("/var/tmp/snips/cropped_snip.png")
        );
    }

    #[test]
    fn test_overrides_applied() {
        let mut config = SnipConfig::default();
        config.apply_overrides(lookup_from(&[
            ("SNIP_DARKEN_FACTOR", "0.5"),
            ("SNIP_VISIBILITY_THRESHOLD", "8"),
            ("SNIP_SETTLE_MS", "250"),
            ("SNIP_TMP_DIR", "/run/user/1000"),
        ]));

        assert_eq!(config.overlay.darken_factor, 0.5);
        assert_eq!(config.overlay.visibility_threshold, 8.0);
        assert_eq!(config.capture_settle, Duration::from_millis(250));
        assert_eq!(config.commit_settle, Duration::from_millis(250));
        assert_eq!(config.temp_dir, PathBuf::from("/run/user/1000"));
    }

    #[test]
    fn test_invalid_overrides_ignored() {
        let mut config = SnipConfig::default();
        config.apply_overrides(lookup_from(&[
            ("SNIP_DARKEN_FACTOR", "dark"),
            ("SNIP_VISIBILITY_THRESHOLD", "-3"),
            ("SNIP_BORDER_WIDTH", "NaN"),
        ]));

        assert_eq!(config.overlay, OverlayPolicy::default());
    }

    #[test]
    fn test_escape_cancels() {
        let shortcuts = ShortcutConfig::default();
        assert_eq!(
            shortcuts.get_action(gdk::Key::Escape, gdk::ModifierType::empty()),
            Some(Action::Cancel)
        );
    }

    #[test]
    fn test_escape_cancels_with_lock_modifiers() {
        let shortcuts = ShortcutConfig::default();
        let mods = gdk::ModifierType::LOCK_MASK;
        assert_eq!(
            shortcuts.get_action(gdk::Key::Escape, mods),
            Some(Action::Cancel)
        );
    }

    #[test]
    fn test_other_keys_unbound() {
        let shortcuts = ShortcutConfig::default();
        assert_eq!(
            shortcuts.get_action(gdk::Key::a, gdk::ModifierType::empty()),
            None
        );
        assert_eq!(
            shortcuts.get_action(gdk::Key::Escape, gdk::ModifierType::CONTROL_MASK),
            None
        );
    }
}
