//! # a11y-mux
//!
//! An accessibility event multiplexer for UI automation services.
//!
//! ## Overview
//!
//! Platforms deliver accessibility events, key events, and gesture
//! notifications through a single service callback. This library fans that
//! stream out to multiple independent consumers: priority-ordered
//! *delegates* (broad feature handlers with optional event-kind filters),
//! type-keyed *named callbacks* (one per event kind, replaceable), key
//! observers and interceptors, and gesture listeners.
//!
//! ## Quick Start
//!
//! ```no_run
//! use a11y_mux::mux::{EventMultiplexer, MuxOptions};
//! use a11y_mux::event::{EventKind, UiEvent};
//! use std::sync::Arc;
//!
//! let mux = EventMultiplexer::new(MuxOptions::default());
//!
//! // One callback per event kind, registered by name.
//! mux.register_named_callback("view_clicked", Arc::new(|event: &UiEvent| {
//!     println!("clicked in {:?}", event.package_name);
//! })).expect("known event name");
//!
//! // Events delivered by the host platform flow through dispatch.
//! mux.dispatch_accessibility_event(&UiEvent::new(EventKind::ViewClicked));
//! ```
//!
//! ## Architecture
//!
//! The system is organized into the following modules:
//!
//! - [`event`]: event model and the static event-name table
//! - [`mux`]: the multiplexer core (delegates, named callbacks, connection
//!   state, dispatch worker, key/gesture observers)
//! - [`service`]: service shell and platform-adapter traits
//! - [`app`]: CLI, configuration, and the simulation harness
//!
//! ## Event Flow
//!
//! ```text
//! ┌──────────────┐    ┌───────────────┐    ┌───────────────────┐
//! │   Platform   │───▶│ ServiceShell  │───▶│ EventMultiplexer  │
//! │  (delivery)  │    │  (lifecycle)  │    │                   │
//! └──────────────┘    └───────────────┘    └─────────┬─────────┘
//!                                                    │
//!                      named callback ◀──────────────┤
//!                      delegates (by priority) ◀─────┤  delivery thread
//!                                                    │
//!                      key observers ◀───────────────┤  worker thread
//!                      gesture listeners ◀───────────┘
//! ```
//!
//! Accessibility events are dispatched synchronously on the delivery
//! thread; key and gesture fan-out runs on a dedicated single-thread
//! worker so the delivery thread never blocks.

pub mod app;
pub mod event;
pub mod mux;
pub mod service;

// Re-export commonly used types
pub use event::{EventKind, KeyAction, KeyEvent, UiEvent, UiNode};
pub use mux::{Delegate, EventMultiplexer, MuxOptions};
pub use service::ServiceShell;

/// Result type alias for the multiplexer
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the multiplexer
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unknown accessibility event name: {0}")]
    UnknownEventName(String),

    #[error("root node query error: {0}")]
    RootQuery(String),

    #[error("service error: {0}")]
    Service(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
