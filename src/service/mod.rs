//! Service Shell
//!
//! Wraps the multiplexer in the lifecycle of a hosting accessibility
//! service. The host platform drives the shell's entry points
//! (`on_service_connected`, `on_event`, `on_key_event`, `on_gesture`,
//! `on_destroy`); everything else in the process talks to the shell's
//! multiplexer to register consumers or wait for the connection.
//!
//! The shell owns its multiplexer instance. There is no process-wide
//! registry: components that need to register handlers receive a
//! reference to the shell (or its multiplexer) explicitly.

pub mod adapter;

pub use adapter::{ConnectionHandler, RootProvider, ServiceControl};

use crate::event::{KeyEvent, UiEvent};
use crate::mux::{EventMultiplexer, MuxOptions};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Hosting wrapper for one accessibility service instance.
pub struct ServiceShell {
    mux: Arc<EventMultiplexer>,
    control: RwLock<Option<Arc<dyn ServiceControl>>>,
}

impl ServiceShell {
    pub fn new(options: MuxOptions) -> Self {
        Self {
            mux: Arc::new(EventMultiplexer::new(options)),
            control: RwLock::new(None),
        }
    }

    /// The owned multiplexer, for registering consumers.
    pub fn mux(&self) -> &Arc<EventMultiplexer> {
        &self.mux
    }

    // ------------------------------------------------------------------
    // Platform entry points
    // ------------------------------------------------------------------

    /// The platform reports the service connected.
    ///
    /// Installs the adapters for this cycle, flags the connection
    /// present, and wakes every blocked waiter.
    pub fn on_service_connected(
        &self,
        root_provider: Arc<dyn RootProvider>,
        control: Arc<dyn ServiceControl>,
    ) {
        debug!("service connected");
        *self.control.write() = Some(control);
        self.mux.connect(root_provider);
    }

    /// The platform delivers one accessibility event. Runs synchronously
    /// on the delivery thread.
    pub fn on_event(&self, event: &UiEvent) {
        self.mux.dispatch_accessibility_event(event);
    }

    /// The platform delivers one key event. The return value tells the
    /// platform whether to swallow it.
    pub fn on_key_event(&self, event: &KeyEvent) -> bool {
        self.mux.dispatch_key_event(event)
    }

    /// The platform delivers one gesture notification. Always unhandled.
    pub fn on_gesture(&self, gesture_id: i32) -> bool {
        self.mux.dispatch_gesture(gesture_id)
    }

    /// The platform interrupted the service. Log-only, matching host
    /// semantics: interruption is informational, not a teardown.
    pub fn on_interrupt(&self) {
        debug!("service interrupted");
    }

    /// The platform destroys the service instance: drain the worker,
    /// notify disconnection, drop the adapters.
    pub fn on_destroy(&self) {
        debug!("service destroyed");
        self.mux.shutdown();
        *self.control.write() = None;
    }

    // ------------------------------------------------------------------
    // Caller-facing operations
    // ------------------------------------------------------------------

    /// Whether the service is connected and dispatching.
    pub fn is_running(&self) -> bool {
        self.mux.is_running()
    }

    /// Block until the service connects; see
    /// [`EventMultiplexer::wait_until_connected`].
    pub fn wait_until_connected(&self, timeout: Option<Duration>) -> bool {
        self.mux.wait_until_connected(timeout)
    }

    /// Best-effort stop: ask the platform to disable the service, then
    /// tear the multiplexer down.
    ///
    /// Never panics. Returns `false` when the platform refused to
    /// disable or the worker failed to drain within its grace period.
    pub fn stop(&self) -> bool {
        let disabled = match self.control.write().take() {
            Some(control) => match control.disable_self() {
                Ok(()) => true,
                Err(error) => {
                    warn!(%error, "disable_self failed");
                    false
                }
            },
            // Nothing to disable is not a failure: the service may never
            // have connected.
            None => true,
        };
        let drained = self.mux.shutdown();
        disabled && drained
    }
}

impl Default for ServiceShell {
    fn default() -> Self {
        Self::new(MuxOptions::default())
    }
}
