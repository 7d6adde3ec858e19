mod app;
mod capture;
mod clipboard;
mod error;
mod setup;
mod ui;

use gtk4 as gtk;
use libadwaita as adw;

use adw::prelude::*;
use clap::Parser;
use log::{error, info};
use std::cell::RefCell;
use std::process::ExitCode;
use std::rc::Rc;

use crate::app::config::{CaptureBackend, ClipboardBackend};
use crate::app::{Session, SessionEnd, SnipConfig};
use crate::capture::DesktopSession;
use crate::error::SnipError;
use crate::setup::hotkey::{self, HotkeyOutcome};

const APP_ID: &str = "org.example.SnipTool";

/// Snip Tool - A simple screenshot utility
#[derive(Debug, Parser)]
#[command(name = "snip-tool", version, about)]
struct Cli {
    /// Set up keyboard shortcut (Ctrl+Shift+S)
    #[arg(long)]
    setup_shortcut: bool,

    #[arg(long, value_enum)]
    capture_backend: Option<CaptureBackend>,

    #[arg(long, value_enum)]
    clipboard_backend: Option<ClipboardBackend>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let desktop = DesktopSession::detect();
    info!("Running on {}", desktop);

    if cli.setup_shortcut {
        return setup_shortcut(&desktop);
    }

    let mut config = SnipConfig::from_env();
    if let Some(backend) = cli.capture_backend {
        config.capture_backend = backend;
    }
    if let Some(backend) = cli.clipboard_backend {
        config.clipboard_backend = backend;
    }

    match run(&desktop, config) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            if let Some(hint) = e.remediation() {
                eprintln!("{}", hint);
            }
            ExitCode::FAILURE
        }
    }
}

fn run(desktop: &DesktopSession, config: SnipConfig) -> Result<SessionEnd, SnipError> {
    let capture = desktop.capture_backend(config.capture_backend);
    let clipboard = desktop.clipboard_backend(config.clipboard_backend);

    let required: Vec<&str> = capture
        .required_tool()
        .into_iter()
        .chain([clipboard.required_tool()])
        .collect();
    setup::dependencies::check(&required)?;

    let session = Session::begin(&config, capture.capturer().as_ref(), clipboard.writer())?;
    let session = Rc::new(RefCell::new(session));
    let outcome = Rc::new(RefCell::new(None));

    let app = adw::Application::builder()
        .application_id(APP_ID)
        .flags(gtk::gio::ApplicationFlags::NON_UNIQUE)
        .build();

    app.connect_activate({
        let session = session.clone();
        let outcome = outcome.clone();
        move |app| ui::build_ui(app, &session, &config, &outcome)
    });
    // Arguments were already handled by clap
    app.run_with_args::<&str>(&[]);

    // The window may have gone away without a cancel reaching the session
    session.borrow_mut().cancel();

    let end = outcome.borrow_mut().take();
    into_result(end.unwrap_or(SessionEnd::Cancelled))
}

/// A failed clipboard hand-off still tore the session down, but the run failed.
fn into_result(end: SessionEnd) -> Result<SessionEnd, SnipError> {
    match end {
        SessionEnd::ClipboardFailed(e) => Err(SnipError::Clipboard(e)),
        end => Ok(end),
    }
}

fn setup_shortcut(desktop: &DesktopSession) -> ExitCode {
    println!("Setting up keyboard shortcut ({})...", hotkey::SHORTCUT_LABEL);

    match hotkey::setup_keyboard_shortcut(desktop) {
        Ok(HotkeyOutcome::Registered { .. }) => {
            println!(
                "Keyboard shortcut ({}) has been set up successfully!",
                hotkey::SHORTCUT_LABEL
            );
            println!("If the shortcut doesn't work immediately, try logging out and back in.");
            ExitCode::SUCCESS
        }
        Ok(HotkeyOutcome::ManualSetupRequired { reason }) => {
            println!("{}.", reason);
            print_manual_instructions();
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("Error setting up shortcut: {}", e);
            print_manual_instructions();
            ExitCode::FAILURE
        }
    }
}

fn print_manual_instructions() {
    println!("Please set the keyboard shortcut manually in your system settings:");
    println!("  - Shortcut: {}", hotkey::SHORTCUT_LABEL);
    println!("  - Command: {}", hotkey::SHORTCUT_COMMAND);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClipboardError;

    #[test]
    fn test_cli_parses_backends() {
        let cli = Cli::try_parse_from([
            "snip-tool",
            "--capture-backend",
            "xcap",
            "--clipboard-backend",
            "wl-copy",
        ])
        .unwrap();

        assert!(!cli.setup_shortcut);
        assert_eq!(cli.capture_backend, Some(CaptureBackend::Xcap));
        assert_eq!(cli.clipboard_backend, Some(ClipboardBackend::WlCopy));
    }

    #[test]
    fn test_cli_setup_shortcut_flag() {
        let cli = Cli::try_parse_from(["snip-tool", "--setup-shortcut"]).unwrap();
        assert!(cli.setup_shortcut);
        assert_eq!(cli.capture_backend, None);
    }

    #[test]
    fn test_version_line() {
        use clap::CommandFactory;

        assert_eq!(
            Cli::command().render_version(),
            format!("snip-tool {}\n", env!("CARGO_PKG_VERSION"))
        );
    }

    #[test]
    fn test_clipboard_failure_fails_the_run() {
        let failed = SessionEnd::ClipboardFailed(ClipboardError::Spawn {
            tool: "xclip",
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        });
        let err = into_result(failed).unwrap_err();
        assert!(matches!(err, SnipError::Clipboard(_)));
        assert!(err.to_string().starts_with("could not copy the selection"));

        assert!(matches!(
            into_result(SessionEnd::Cancelled),
            Ok(SessionEnd::Cancelled)
        ));
        assert!(matches!(
            into_result(SessionEnd::Copied {
                width: 3,
                height: 4
            }),
            Ok(SessionEnd::Copied { .. })
        ));
    }

    #[test]
    fn test_cli_rejects_unknown_backend() {
        assert!(Cli::try_parse_from(["snip-tool", "--capture-backend", "gnome"]).is_err());
    }
}
