//! Application module
//!
//! The selection state machine, the session that drives it, and configuration.

pub mod config;
pub mod session;
pub mod state;

pub use config::SnipConfig;
pub use session::{Session, SessionEnd, SurfaceCommand};
pub use state::{Point, SelectionEvent};
