pub mod drawing;
pub mod handlers;

use libadwaita as adw;

use adw::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;

use crate::app::{Session, SessionEnd, SnipConfig};

pub use handlers::UiContext;

/// Build the full-screen selection overlay for an already captured session.
///
/// The window starts transparent and only becomes visible and interactive
/// after the capture settle delay.
pub fn build_ui(
    app: &adw::Application,
    session: &Rc<RefCell<Session>>,
    config: &SnipConfig,
    outcome: &Rc<RefCell<Option<SessionEnd>>>,
) {
    let drawing = drawing::create_drawing_area(session);

    let window = adw::ApplicationWindow::builder()
        .application(app)
        .title("Snip Tool")
        .content(&drawing.drawing_area)
        .decorated(false)
        .opacity(0.0)
        .build();

    let ctx = UiContext {
        session: session.clone(),
        window: window.clone(),
        drawing_area: drawing.drawing_area.clone(),
        pixbufs: drawing.pixbufs.clone(),
        outcome: outcome.clone(),
    };

    handlers::connect_all_handlers(&ctx, &config.shortcuts);

    window.fullscreen();
    window.present();

    handlers::schedule_reveal(&ctx, config.capture_settle);
}
