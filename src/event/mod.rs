//! Event model
//!
//! Platform-neutral representations of the accessibility events, key
//! events, and UI node snapshots delivered by the host platform.

pub mod types;

pub use types::{key_codes, EventKind, KeyAction, KeyEvent, UiEvent, UiNode};
