//! Global hotkey registration through the GNOME media-keys settings.
//!
//! Best effort: anything other than a GNOME-family desktop with `gsettings`
//! gets manual instructions instead.

use std::io;
use std::process::{Command, ExitStatus};

use log::{debug, info};
use thiserror::Error;

use crate::capture::DesktopSession;
use crate::setup::dependencies;

pub const SHORTCUT_LABEL: &str = "Ctrl+Shift+S";
pub const SHORTCUT_COMMAND: &str = "snip-tool";

const SHORTCUT_NAME: &str = "Snip Tool";
const SHORTCUT_BINDING: &str = "<Primary><Shift>s";
const MEDIA_KEYS_SCHEMA: &str = "org.gnome.settings-daemon.plugins.media-keys";
const CUSTOM_BINDINGS_KEY: &str = "custom-keybindings";
const CUSTOM_BINDING_BASE: &str = "/org/gnome/settings-daemon/plugins/media-keys/custom-keybindings";
const MAX_SLOTS: usize = 10;

#[derive(Debug, Error)]
pub enum HotkeyError {
    #[error("failed to run gsettings: {0}")]
    Spawn(#[source] io::Error),
    #[error("gsettings {args} exited with {status}: {stderr}")]
    Failed {
        args: String,
        status: ExitStatus,
        stderr: String,
    },
}

#[derive(Debug, PartialEq, Eq)]
pub enum HotkeyOutcome {
    Registered { path: String },
    ManualSetupRequired { reason: String },
}

/// Read and write access to GSettings keys.
pub trait SettingsStore {
    fn get(&self, schema: &str, key: &str) -> Result<String, HotkeyError>;

    fn set(&self, schema: &str, key: &str, value: &str) -> Result<(), HotkeyError>;
}

/// The `gsettings` command-line tool.
pub struct GSettingsCli;

impl GSettingsCli {
    fn run(&self, args: &[&str]) -> Result<String, HotkeyError> {
        debug!("Running gsettings {}", args.join(" "));
        let output = Command::new("gsettings")
            .args(args)
            .output()
            .map_err(HotkeyError::Spawn)?;

        if !output.status.success() {
            return Err(HotkeyError::Failed {
                args: args.join(" "),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl SettingsStore for GSettingsCli {
    fn get(&self, schema: &str, key: &str) -> Result<String, HotkeyError> {
        self.run(&["get", schema, key])
    }

    fn set(&self, schema: &str, key: &str, value: &str) -> Result<(), HotkeyError> {
        self.run(&["set", schema, key, value]).map(|_| ())
    }
}

pub fn setup_keyboard_shortcut(desktop: &DesktopSession) -> Result<HotkeyOutcome, HotkeyError> {
    info!("Setting up keyboard shortcut ({}) on {}", SHORTCUT_LABEL, desktop);

    if !dependencies::is_on_path("gsettings") {
        return Ok(HotkeyOutcome::ManualSetupRequired {
            reason: "gsettings not found".to_string(),
        });
    }

    register_with(desktop, &GSettingsCli)
}

pub fn register_with(
    desktop: &DesktopSession,
    store: &dyn SettingsStore,
) -> Result<HotkeyOutcome, HotkeyError> {
    if !desktop.uses_gnome_keybindings() {
        return Ok(HotkeyOutcome::ManualSetupRequired {
            reason: format!(
                "Desktop environment '{}' is not supported for automatic shortcut setup",
                desktop.desktop_environment
            ),
        });
    }

    let current = store.get(MEDIA_KEYS_SCHEMA, CUSTOM_BINDINGS_KEY)?;
    let mut paths = parse_path_list(&current);

    let Some(path) = next_free_slot(&paths) else {
        return Ok(HotkeyOutcome::ManualSetupRequired {
            reason: "Could not find an available custom keybinding slot".to_string(),
        });
    };

    let relocatable = format!("{}.custom-keybinding:{}", MEDIA_KEYS_SCHEMA, path);
    store.set(&relocatable, "name", SHORTCUT_NAME)?;
    store.set(&relocatable, "command", SHORTCUT_COMMAND)?;
    store.set(&relocatable, "binding", SHORTCUT_BINDING)?;

    paths.push(path.clone());
    store.set(MEDIA_KEYS_SCHEMA, CUSTOM_BINDINGS_KEY, &format_path_list(&paths))?;

    info!("Registered {} at {}", SHORTCUT_LABEL, path);
    Ok(HotkeyOutcome::Registered { path })
}

/// Parse a GVariant string array as printed by `gsettings get`.
pub fn parse_path_list(raw: &str) -> Vec<String> {
    let raw = raw.trim();
    let raw = raw.strip_prefix("@as").unwrap_or(raw).trim();
    let inner = raw
        .strip_prefix('[')
        .and_then(|r| r.strip_suffix(']'))
        .unwrap_or(raw);

    inner
        .split(',')
        .map(|item| item.trim().trim_matches(|c: char| c == '\'' || c == '"'))
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn format_path_list(paths: &[String]) -> String {
    let quoted: Vec<String> = paths.iter().map(|p| format!("'{}'", p)).collect();
    format!("[{}]", quoted.join(", "))
}

pub fn next_free_slot(taken: &[String]) -> Option<String> {
    (0..MAX_SLOTS)
        .map(|i| format!("{}/custom{}/", CUSTOM_BINDING_BASE, i))
        .find(|candidate| !taken.contains(candidate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MemoryStore {
        values: RefCell<HashMap<(String, String), String>>,
        writes: RefCell<Vec<(String, String, String)>>,
    }

    impl MemoryStore {
        fn with_bindings(raw: &str) -> Self {
            let store = Self::default();
            store.values.borrow_mut().insert(
                (MEDIA_KEYS_SCHEMA.to_string(), CUSTOM_BINDINGS_KEY.to_string()),
                raw.to_string(),
            );
            store
        }
    }

    impl SettingsStore for MemoryStore {
        fn get(&self, schema: &str, key: &str) -> Result<String, HotkeyError> {
            Ok(self
                .values
                .borrow()
                .get(&(schema.to_string(), key.to_string()))
                .cloned()
                .unwrap_or_else(|| "@as []".to_string()))
        }

        fn set(&self, schema: &str, key: &str, value: &str) -> Result<(), HotkeyError> {
            self.values
                .borrow_mut()
                .insert((schema.to_string(), key.to_string()), value.to_string());
            self.writes
                .borrow_mut()
                .push((schema.to_string(), key.to_string(), value.to_string()));
            Ok(())
        }
    }

    fn gnome() -> DesktopSession {
        DesktopSession::detect_with(|key| match key {
            "XDG_CURRENT_DESKTOP" => Some("GNOME".to_string()),
            "XDG_SESSION_TYPE" => Some("x11".to_string()),
            _ => None,
        })
    }

    fn slot(i: usize) -> String {
        format!("{}/custom{}/", CUSTOM_BINDING_BASE, i)
    }

    #[test]
    fn test_parse_empty_lists() {
        assert!(parse_path_list("@as []").is_empty());
        assert!(parse_path_list("[]").is_empty());
        assert!(parse_path_list("").is_empty());
    }

    #[test]
    fn test_parse_and_format_list() {
        let raw = format!("['{}', '{}']", slot(0), slot(2));
        let paths = parse_path_list(&raw);
        assert_eq!(paths, vec![slot(0), slot(2)]);
        assert_eq!(format_path_list(&paths), raw);
    }

    #[test]
    fn test_next_free_slot_skips_taken() {
        assert_eq!(next_free_slot(&[]), Some(slot(0)));
        assert_eq!(next_free_slot(&[slot(0), slot(2)]), Some(slot(1)));

        let all: Vec<String> = (0..MAX_SLOTS).map(slot).collect();
        assert_eq!(next_free_slot(&all), None);
    }

    #[test]
    fn test_register_on_fresh_gnome() {
        let store = MemoryStore::with_bindings("@as []");

        let outcome = register_with(&gnome(), &store).unwrap();
        assert_eq!(outcome, HotkeyOutcome::Registered { path: slot(0) });

        let writes = store.writes.borrow();
        let relocatable = format!("{}.custom-keybinding:{}", MEDIA_KEYS_SCHEMA, slot(0));
        assert_eq!(
            writes[0],
            (relocatable.clone(), "name".to_string(), "Snip Tool".to_string())
        );
        assert_eq!(
            writes[1],
            (relocatable.clone(), "command".to_string(), "snip-tool".to_string())
        );
        assert_eq!(
            writes[2],
            (relocatable, "binding".to_string(), "<Primary><Shift>s".to_string())
        );
        assert_eq!(
            writes[3],
            (
                MEDIA_KEYS_SCHEMA.to_string(),
                CUSTOM_BINDINGS_KEY.to_string(),
                format!("['{}']", slot(0))
            )
        );
    }

    #[test]
    fn test_register_appends_to_existing() {
        let store = MemoryStore::with_bindings(&format!("['{}']", slot(0)));

        let outcome = register_with(&gnome(), &store).unwrap();
        assert_eq!(outcome, HotkeyOutcome::Registered { path: slot(1) });

        let list = store
            .get(MEDIA_KEYS_SCHEMA, CUSTOM_BINDINGS_KEY)
            .unwrap();
        assert_eq!(list, format!("['{}', '{}']", slot(0), slot(1)));
    }

    #[test]
    fn test_no_free_slot_requires_manual_setup() {
        let all: Vec<String> = (0..MAX_SLOTS).map(slot).collect();
        let store = MemoryStore::with_bindings(&format_path_list(&all));

        let outcome = register_with(&gnome(), &store).unwrap();
        assert!(matches!(outcome, HotkeyOutcome::ManualSetupRequired { .. }));
        assert!(store.writes.borrow().is_empty());
    }

    #[test]
    fn test_unsupported_desktop_requires_manual_setup() {
        let kde = DesktopSession::detect_with(|key| match key {
            "XDG_CURRENT_DESKTOP" => Some("KDE".to_string()),
            _ => None,
        });
        let store = MemoryStore::default();

        let outcome = register_with(&kde, &store).unwrap();
        match outcome {
            HotkeyOutcome::ManualSetupRequired { reason } => assert!(reason.contains("KDE")),
            other => panic!("unexpected outcome {:?}", other),
        }
        assert!(store.writes.borrow().is_empty());
    }
}
