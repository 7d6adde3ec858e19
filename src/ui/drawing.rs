use gtk4 as gtk;

use gtk::DrawingArea;
use gtk4::prelude::*;
use log::debug;
use std::cell::RefCell;
use std::rc::Rc;

use crate::app::config::OverlayPolicy;
use crate::app::state::{CropRect, OverlayFrame};
use crate::app::Session;
use crate::error::RenderError;

/// The captured screen in both brightnesses, ready for cairo.
pub struct ScreenPixbufs {
    pub base: gtk::gdk_pixbuf::Pixbuf,
    pub darkened: gtk::gdk_pixbuf::Pixbuf,
}

impl ScreenPixbufs {
    pub fn from_session(session: &Session) -> Option<Self> {
        Some(Self {
            base: image_to_pixbuf(session.base_image()?),
            darkened: image_to_pixbuf(session.darkened_image()?),
        })
    }
}

pub struct DrawingComponents {
    pub drawing_area: DrawingArea,
    /// Dropped when the session ends
    pub pixbufs: Rc<RefCell<Option<ScreenPixbufs>>>,
}

pub fn create_drawing_area(session: &Rc<RefCell<Session>>) -> DrawingComponents {
    let drawing_area = DrawingArea::builder().hexpand(true).vexpand(true).build();
    drawing_area.set_cursor_from_name(Some("crosshair"));

    let pixbufs = Rc::new(RefCell::new(ScreenPixbufs::from_session(&session.borrow())));

    drawing_area.set_draw_func({
        let session = session.clone();
        let pixbufs = pixbufs.clone();
        move |_, cr, width, height| {
            if let Err(e) = draw_content(&session, &pixbufs, cr, width, height) {
                debug!("Skipping overlay frame: {}", e);
            }
        }
    });

    DrawingComponents {
        drawing_area,
        pixbufs,
    }
}

fn draw_content(
    session: &Rc<RefCell<Session>>,
    pixbufs: &Rc<RefCell<Option<ScreenPixbufs>>>,
    cr: &gtk::cairo::Context,
    width: i32,
    height: i32,
) -> Result<(), RenderError> {
    let da_width = width as f64;
    let da_height = height as f64;

    let (frame, policy) = {
        let mut s = session.borrow_mut();
        s.set_surface_size(da_width, da_height);
        (s.overlay(), *s.policy())
    };

    cr.set_source_rgb(0.0, 0.0, 0.0);
    cr.paint().map_err(cairo_err)?;

    let pixbufs = pixbufs.borrow();
    let Some(screen) = pixbufs.as_ref() else {
        return Ok(());
    };

    let scale_x = da_width / screen.base.width() as f64;
    let scale_y = da_height / screen.base.height() as f64;

    cr.save().map_err(cairo_err)?;
    cr.scale(scale_x, scale_y);
    cr.set_source_pixbuf(&screen.darkened, 0.0, 0.0);
    cr.paint().map_err(cairo_err)?;
    cr.restore().map_err(cairo_err)?;

    draw_overlay_frame(cr, &frame, screen, scale_x, scale_y, &policy)
}

fn draw_overlay_frame(
    cr: &gtk::cairo::Context,
    frame: &OverlayFrame,
    screen: &ScreenPixbufs,
    scale_x: f64,
    scale_y: f64,
    policy: &OverlayPolicy,
) -> Result<(), RenderError> {
    if let Some(rect) = frame.bright_region {
        cr.save().map_err(cairo_err)?;
        trace_rect(cr, &rect);
        cr.clip();
        cr.scale(scale_x, scale_y);
        cr.set_source_pixbuf(&screen.base, 0.0, 0.0);
        cr.paint().map_err(cairo_err)?;
        cr.restore().map_err(cairo_err)?;
    }

    if let Some(rect) = frame.border {
        let (r, g, b) = policy.border_color;
        cr.set_source_rgb(r, g, b);
        cr.set_line_width(policy.border_width);
        trace_rect(cr, &rect);
        cr.stroke().map_err(cairo_err)?;
    }

    Ok(())
}

fn trace_rect(cr: &gtk::cairo::Context, rect: &CropRect) {
    cr.rectangle(
        rect.left as f64,
        rect.top as f64,
        rect.width() as f64,
        rect.height() as f64,
    );
}

fn cairo_err(e: gtk::cairo::Error) -> RenderError {
    RenderError::Cairo(e.to_string())
}

/// Convert an RGBA image to a GDK Pixbuf
fn image_to_pixbuf(image: &image::RgbaImage) -> gtk::gdk_pixbuf::Pixbuf {
    let width = image.width() as i32;
    let height = image.height() as i32;
    let stride = width * 4; // RGBA = 4 bytes per pixel

    let bytes = gtk::glib::Bytes::from(image.as_raw());

    gtk::gdk_pixbuf::Pixbuf::from_bytes(
        &bytes,
        gtk::gdk_pixbuf::Colorspace::Rgb,
        true, // has_alpha
        8,    // bits_per_sample
        width,
        height,
        stride,
    )
}
