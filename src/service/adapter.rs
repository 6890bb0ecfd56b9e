//! Platform Adapter Traits
//!
//! The multiplexer is platform-neutral; these traits are the seam where a
//! host accessibility subsystem plugs in. An Android-style host would
//! implement them over its live service object; the simulation harness
//! implements them over synthetic state.

use crate::event::UiNode;
use crate::Result;

pub use crate::mux::connection::ConnectionHandler;

/// Source of the active window's root node.
pub trait RootProvider: Send + Sync {
    /// Snapshot the root node of the active window.
    ///
    /// `Ok(None)` means no active window. Errors are treated by the
    /// multiplexer as "no root" and never propagated to delegates.
    fn active_root(&self) -> Result<Option<UiNode>>;
}

/// Control surface of the hosting service.
pub trait ServiceControl: Send + Sync {
    /// Ask the platform to disable the service.
    fn disable_self(&self) -> Result<()>;
}
