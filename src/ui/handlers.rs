use gtk::glib;
use gtk4 as gtk;
use libadwaita as adw;
use log::{debug, error, info};

use gtk::{EventControllerKey, GestureDrag};
use gtk4::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use crate::app::config::{Action, ShortcutConfig};
use crate::app::{Point, SelectionEvent, Session, SessionEnd, SurfaceCommand};
use crate::ui::drawing::ScreenPixbufs;

/// Everything an event handler needs to act on the session's answer.
#[derive(Clone)]
pub struct UiContext {
    pub session: Rc<RefCell<Session>>,
    pub window: adw::ApplicationWindow,
    pub drawing_area: gtk::DrawingArea,
    pub pixbufs: Rc<RefCell<Option<ScreenPixbufs>>>,
    pub outcome: Rc<RefCell<Option<SessionEnd>>>,
}

pub fn apply_command(ctx: &UiContext, command: SurfaceCommand) {
    match command {
        SurfaceCommand::Nothing => {}
        SurfaceCommand::Redraw => ctx.drawing_area.queue_draw(),
        SurfaceCommand::HideAndFinalizeAfter(delay) => {
            debug!("Selection committed, cropping in {:?}", delay);
            ctx.window.set_visible(false);
            let ctx = ctx.clone();
            glib::timeout_add_local_once(delay, move || {
                let command = ctx.session.borrow_mut().handle(SelectionEvent::FinalizeDue);
                apply_command(&ctx, command);
            });
        }
        SurfaceCommand::Close(end) => {
            match &end {
                SessionEnd::Copied { width, height } => {
                    info!("Snip of {}x{} copied", width, height)
                }
                SessionEnd::Cancelled => debug!("Snip cancelled"),
                SessionEnd::ClipboardFailed(e) => error!("Failed to copy snip: {}", e),
            }
            ctx.pixbufs.borrow_mut().take();
            ctx.outcome.borrow_mut().replace(end);
            ctx.window.close();
        }
    }
}

pub fn connect_drag_handlers(ctx: &UiContext) {
    debug!("Connecting drag handlers");
    let drag = GestureDrag::new();
    drag.set_button(gtk::gdk::BUTTON_PRIMARY);

    drag.connect_drag_begin({
        let ctx = ctx.clone();
        move |_, x, y| {
            let command = ctx.session.borrow_mut().on_pointer_down(Point::new(x, y));
            apply_command(&ctx, command);
        }
    });

    drag.connect_drag_update({
        let ctx = ctx.clone();
        move |gesture, offset_x, offset_y| {
            if let Some(point) = drag_point(gesture, offset_x, offset_y) {
                let command = ctx.session.borrow_mut().on_pointer_move(point);
                apply_command(&ctx, command);
            }
        }
    });

    drag.connect_drag_end({
        let ctx = ctx.clone();
        move |gesture, offset_x, offset_y| {
            if let Some(point) = drag_point(gesture, offset_x, offset_y) {
                let command = ctx.session.borrow_mut().on_pointer_up(point);
                apply_command(&ctx, command);
            }
        }
    });

    ctx.drawing_area.add_controller(drag);
}

fn drag_point(gesture: &GestureDrag, offset_x: f64, offset_y: f64) -> Option<Point> {
    gesture
        .start_point()
        .map(|(start_x, start_y)| Point::new(start_x + offset_x, start_y + offset_y))
}

pub fn connect_key_handler(ctx: &UiContext, shortcuts: &ShortcutConfig) {
    let keys = EventControllerKey::new();

    keys.connect_key_pressed({
        let ctx = ctx.clone();
        let shortcuts = shortcuts.clone();
        move |_, key, _, modifiers| match shortcuts.get_action(key, modifiers) {
            Some(Action::Cancel) => {
                debug!("{} requested", Action::Cancel.label());
                let command = ctx.session.borrow_mut().cancel();
                apply_command(&ctx, command);
                glib::Propagation::Stop
            }
            None => glib::Propagation::Proceed,
        }
    });

    ctx.window.add_controller(keys);
}

/// Closing the window by any other means counts as a cancel.
pub fn connect_close_handler(ctx: &UiContext) {
    ctx.window.connect_close_request({
        let session = ctx.session.clone();
        let outcome = ctx.outcome.clone();
        move |_| {
            if let SurfaceCommand::Close(end) = session.borrow_mut().cancel() {
                outcome.borrow_mut().get_or_insert(end);
            }
            glib::Propagation::Proceed
        }
    });
}

/// Make the surface visible and interactive once the compositor has settled.
pub fn schedule_reveal(ctx: &UiContext, delay: Duration) {
    let ctx = ctx.clone();
    glib::timeout_add_local_once(delay, move || {
        if ctx.session.borrow_mut().reveal() {
            debug!("Overlay revealed");
            ctx.window.set_opacity(1.0);
            ctx.drawing_area.queue_draw();
        }
    });
}

pub fn connect_all_handlers(ctx: &UiContext, shortcuts: &ShortcutConfig) {
    debug!("Initializing UI handlers");
    connect_drag_handlers(ctx);
    connect_key_handler(ctx, shortcuts);
    connect_close_handler(ctx);
}
