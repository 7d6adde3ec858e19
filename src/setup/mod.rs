//! One-off steps outside the selection session: checking for external tools
//! and registering the global hotkey.

pub mod dependencies;
pub mod hotkey;
