//! Event Multiplexer
//!
//! Fans the host platform's single callback stream out to registered
//! consumers. Accessibility events run synchronously on the delivery
//! thread: the named callback for the event's kind first, then the
//! delegate chain in ascending priority order with early termination.
//! Key and gesture fan-out is posted to a dedicated worker thread; only
//! the interceptor verdict is computed synchronously, because the platform
//! needs it before returning from its callback.

pub mod callbacks;
pub mod connection;
pub mod delegates;
pub mod observers;
pub mod worker;

pub use callbacks::{CallbackRegistry, EventCallback};
pub use connection::{ConnectionHandler, ConnectionState};
pub use delegates::{Delegate, DelegateRegistry, DelegateTable};
pub use observers::{
    GestureDispatcher, GestureListener, KeyInterceptor, KeyInterceptorChain, KeyObserver,
    KeyObserverChain,
};
pub use worker::{DispatchWorker, WorkerStats, DEFAULT_QUEUE_SIZE, SHUTDOWN_GRACE};

use crate::event::{KeyEvent, UiEvent, UiNode};
use crate::service::adapter::RootProvider;
use crate::Result;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{trace, warn};

/// Tunables for a multiplexer instance.
#[derive(Debug, Clone)]
pub struct MuxOptions {
    /// Capacity of the worker task queue
    pub worker_queue_size: usize,
    /// Grace period granted to the worker on shutdown
    pub shutdown_grace: Duration,
}

impl Default for MuxOptions {
    fn default() -> Self {
        Self {
            worker_queue_size: DEFAULT_QUEUE_SIZE,
            shutdown_grace: SHUTDOWN_GRACE,
        }
    }
}

/// Context handed to delegates during dispatch.
///
/// Gives delegates access to the active window's root node: a fresh query
/// through the platform adapter, with the cached fast root as a cheap
/// fallback when the query fails.
pub struct DispatchContext<'a> {
    mux: &'a EventMultiplexer,
}

impl DispatchContext<'_> {
    /// Query the platform for the current root node. Query failures are
    /// reported as `None`, never propagated.
    pub fn root_in_active_window(&self) -> Option<UiNode> {
        self.mux.query_root()
    }

    /// Last known root node, refreshed on window-state and focus events.
    pub fn fast_root(&self) -> Option<UiNode> {
        self.mux.fast_root()
    }

    /// Whether the service connection is currently live.
    pub fn is_connected(&self) -> bool {
        self.mux.connection.is_connected()
    }
}

/// The accessibility event multiplexer.
///
/// Registries outlive individual service connect/disconnect cycles; the
/// live platform adapter and the per-connection key observers are rebuilt
/// on each cycle. A multiplexer that has been [`shut down`](Self::shutdown)
/// stays stopped: its worker thread is gone and dispatch turns into a
/// no-op.
pub struct EventMultiplexer {
    delegates: DelegateRegistry,
    callbacks: CallbackRegistry,
    connection: ConnectionState,
    worker: DispatchWorker,
    /// Per-connection key observers, cleared on disconnect
    key_observers: KeyObserverChain,
    /// Key observers that survive reconnect cycles
    sticky_key_observers: KeyObserverChain,
    key_interceptors: KeyInterceptorChain,
    gestures: GestureDispatcher,
    connection_handler: RwLock<Option<Arc<dyn ConnectionHandler>>>,
    root_provider: RwLock<Option<Arc<dyn RootProvider>>>,
    fast_root: RwLock<Option<UiNode>>,
    stopped: AtomicBool,
    shutdown_grace: Duration,
}

impl EventMultiplexer {
    pub fn new(options: MuxOptions) -> Self {
        Self {
            delegates: DelegateRegistry::new(),
            callbacks: CallbackRegistry::new(),
            connection: ConnectionState::new(),
            worker: DispatchWorker::with_queue_size(options.worker_queue_size),
            key_observers: KeyObserverChain::new(),
            sticky_key_observers: KeyObserverChain::new(),
            key_interceptors: KeyInterceptorChain::new(),
            gestures: GestureDispatcher::new(),
            connection_handler: RwLock::new(None),
            root_provider: RwLock::new(None),
            fast_root: RwLock::new(None),
            stopped: AtomicBool::new(false),
            shutdown_grace: options.shutdown_grace,
        }
    }

    // ------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------

    /// Register a delegate at `priority`.
    ///
    /// Registration at an already-used priority silently replaces the
    /// earlier delegate. The aggregated event-kind filter only ever grows:
    /// replacing a delegate does not unroute the kinds its predecessor
    /// subscribed to.
    pub fn register_delegate(&self, priority: i32, delegate: Arc<dyn Delegate>) {
        self.delegates.register(priority, delegate);
    }

    /// Remove the delegate at `priority`.
    pub fn unregister_delegate(&self, priority: i32) -> bool {
        self.delegates.unregister(priority)
    }

    /// Bind a callback to the event kind named `name`.
    ///
    /// # Errors
    /// [`crate::Error::UnknownEventName`] when the name resolves to no
    /// kind; the registry is left untouched.
    pub fn register_named_callback(
        &self,
        name: &str,
        callback: Arc<dyn EventCallback>,
    ) -> Result<()> {
        self.callbacks.register(name, callback)
    }

    /// Remove the callback bound to the kind named `name`.
    pub fn unregister_named_callback(&self, name: &str) -> Result<bool> {
        self.callbacks.unregister(name)
    }

    /// Drop every named callback binding.
    pub fn clear_named_callbacks(&self) {
        self.callbacks.clear();
    }

    /// Set the listener notified on connection transitions.
    pub fn set_connection_handler(&self, handler: Arc<dyn ConnectionHandler>) {
        *self.connection_handler.write() = Some(handler);
    }

    /// Per-connection key observers (cleared on disconnect).
    pub fn key_observers(&self) -> &KeyObserverChain {
        &self.key_observers
    }

    /// Key observers that survive reconnect cycles.
    pub fn sticky_key_observers(&self) -> &KeyObserverChain {
        &self.sticky_key_observers
    }

    /// Key interceptor chain.
    pub fn key_interceptors(&self) -> &KeyInterceptorChain {
        &self.key_interceptors
    }

    /// Gesture listener fan-out.
    pub fn gesture_listeners(&self) -> &GestureDispatcher {
        &self.gestures
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Mark the service connected and install the platform adapter for
    /// this cycle. Wakes everything blocked in [`wait_until_connected`].
    ///
    /// Ignored with a warning on a multiplexer that was already shut down.
    ///
    /// [`wait_until_connected`]: Self::wait_until_connected
    pub fn connect(&self, root_provider: Arc<dyn RootProvider>) -> bool {
        if self.stopped.load(Ordering::SeqCst) {
            warn!("connect on a stopped multiplexer ignored");
            return false;
        }
        *self.root_provider.write() = Some(root_provider);
        let handler = self.connection_handler.read().clone();
        self.connection.connect(handler.as_deref())
    }

    /// Mark the service disconnected, drop the platform adapter, and
    /// clear the per-connection key observers. The disconnect
    /// notification fires at most once per cycle.
    pub fn disconnect(&self) -> bool {
        *self.root_provider.write() = None;
        self.key_observers.clear();
        let handler = self.connection_handler.read().clone();
        self.connection.disconnect(handler.as_deref())
    }

    /// Whether the service is connected and the multiplexer is running.
    pub fn is_running(&self) -> bool {
        !self.stopped.load(Ordering::SeqCst) && self.connection.is_connected()
    }

    /// Block until the service connects.
    ///
    /// `None` waits indefinitely. Returns `false` when the timeout
    /// elapses without a connect signal.
    pub fn wait_until_connected(&self, timeout: Option<Duration>) -> bool {
        if self.is_running() {
            return true;
        }
        self.connection.wait_until_connected(timeout)
    }

    /// Best-effort teardown: drain the dispatch worker within the
    /// configured grace period, flag the connection absent, and fire the
    /// disconnect notification once.
    ///
    /// Never panics; a worker that fails to stop in time is reported as
    /// `false`. The multiplexer no longer dispatches afterwards.
    pub fn shutdown(&self) -> bool {
        self.stopped.store(true, Ordering::SeqCst);
        let drained = self.worker.shutdown(self.shutdown_grace);
        self.disconnect();
        drained
    }

    // ------------------------------------------------------------------
    // Dispatch
    // ------------------------------------------------------------------

    /// Dispatch one accessibility event.
    ///
    /// Runs synchronously on the calling (delivery) thread and never
    /// blocks on locks held across consumer code. Marks the connection
    /// live, fires the named callback for the event's kind, then walks
    /// the delegate chain in ascending priority order, stopping at the
    /// first delegate that consumes the event.
    pub fn dispatch_accessibility_event(&self, event: &UiEvent) {
        if self.stopped.load(Ordering::SeqCst) {
            trace!(kind = event.kind.name(), "dropping event, multiplexer stopped");
            return;
        }
        self.connection.mark_connected();

        if let Some(callback) = self.callbacks.get(event.kind) {
            callback.on_event(event);
        }

        let table = self.delegates.snapshot();
        if !table.wants(event.kind) {
            return;
        }
        if event.kind.refreshes_root() {
            self.refresh_fast_root();
        }

        let ctx = DispatchContext { mux: self };
        for (priority, delegate) in table.entries() {
            if let Some(kinds) = delegate.event_kinds() {
                if !kinds.contains(&event.kind) {
                    continue;
                }
            }
            if delegate.on_event(&ctx, event) {
                trace!(
                    priority,
                    kind = event.kind.name(),
                    "event consumed by delegate"
                );
                break;
            }
        }
    }

    /// Dispatch one key event.
    ///
    /// Observer fan-out (sticky chain first, then the per-connection
    /// chain) is queued onto the worker thread. The interceptor verdict
    /// is computed synchronously and returned to the platform: `true`
    /// asks the host to swallow the event.
    pub fn dispatch_key_event(&self, event: &KeyEvent) -> bool {
        if self.stopped.load(Ordering::SeqCst) {
            return false;
        }
        let sticky = self.sticky_key_observers.clone();
        let per_connection = self.key_observers.clone();
        let queued = event.clone();
        self.worker.execute(Box::new(move || {
            sticky.notify(&queued);
            per_connection.notify(&queued);
        }));
        self.key_interceptors.intercept(event)
    }

    /// Dispatch one gesture notification.
    ///
    /// Listener fan-out is queued onto the worker thread. Always reports
    /// `false` back to the platform: gesture listeners observe, they
    /// never consume.
    pub fn dispatch_gesture(&self, gesture_id: i32) -> bool {
        if self.stopped.load(Ordering::SeqCst) {
            return false;
        }
        let gestures = self.gestures.clone();
        self.worker.execute(Box::new(move || {
            gestures.dispatch(gesture_id);
        }));
        false
    }

    // ------------------------------------------------------------------
    // Root node cache
    // ------------------------------------------------------------------

    /// Last known root node.
    pub fn fast_root(&self) -> Option<UiNode> {
        self.fast_root.read().clone()
    }

    /// Worker statistics, for monitoring.
    pub fn worker_stats(&self) -> Arc<WorkerStats> {
        self.worker.stats()
    }

    fn query_root(&self) -> Option<UiNode> {
        let provider = self.root_provider.read().clone()?;
        match provider.active_root() {
            Ok(root) => root,
            Err(error) => {
                trace!(%error, "root node query failed");
                None
            }
        }
    }

    /// Refresh the cache from a fresh query. The cache is only
    /// overwritten when the query yields a node, so a transient failure
    /// keeps the previous fallback.
    fn refresh_fast_root(&self) {
        if let Some(root) = self.query_root() {
            *self.fast_root.write() = Some(root);
        }
    }
}

impl Default for EventMultiplexer {
    fn default() -> Self {
        Self::new(MuxOptions::default())
    }
}
