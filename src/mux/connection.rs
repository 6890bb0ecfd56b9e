//! Connection State Machine
//!
//! Tracks whether the hosting service is live. Callers that need the
//! service (script engines, automation front-ends) block on
//! [`ConnectionState::wait_until_connected`] until the platform reports the
//! service connected or a timeout elapses.
//!
//! Transitions are guarded by a mutex + condition variable. The waiter
//! releases the lock while blocked and re-checks the flag in a loop, so
//! spurious wakeups and connect/disconnect races cannot produce a false
//! positive. Connected/disconnected notifications fire at most once per
//! cycle.

use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant};
use tracing::debug;

/// External listener notified on connection transitions.
pub trait ConnectionHandler: Send + Sync {
    fn on_connected(&self);
    fn on_disconnected(&self);
}

#[derive(Debug)]
struct Inner {
    connected: bool,
    /// Incremented on every absent→present transition.
    cycle: u64,
    /// Guards the at-most-once disconnect notification per cycle.
    disconnect_notified: bool,
}

/// Present/absent connection flag with blocking wait support.
pub struct ConnectionState {
    inner: Mutex<Inner>,
    enabled: Condvar,
}

impl ConnectionState {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                connected: false,
                cycle: 0,
                disconnect_notified: true,
            }),
            enabled: Condvar::new(),
        }
    }

    /// Whether the service is currently connected.
    pub fn is_connected(&self) -> bool {
        self.inner.lock().connected
    }

    /// Number of completed absent→present transitions.
    pub fn cycle(&self) -> u64 {
        self.inner.lock().cycle
    }

    /// Mark the service connected and wake all waiters.
    ///
    /// `handler` is invoked under the connection lock, once per cycle.
    /// Returns whether this call performed the transition.
    pub fn connect(&self, handler: Option<&dyn ConnectionHandler>) -> bool {
        let mut inner = self.inner.lock();
        if inner.connected {
            return false;
        }
        inner.connected = true;
        inner.cycle += 1;
        inner.disconnect_notified = false;
        debug!(cycle = inner.cycle, "service connected");
        self.enabled.notify_all();
        if let Some(handler) = handler {
            handler.on_connected();
        }
        true
    }

    /// Opportunistic connect used by the event path: the first delivered
    /// event proves the service is live even if the platform's connect
    /// callback was missed.
    pub fn mark_connected(&self) {
        let mut inner = self.inner.lock();
        if !inner.connected {
            inner.connected = true;
            inner.cycle += 1;
            inner.disconnect_notified = false;
            debug!(cycle = inner.cycle, "service connected (via event)");
            self.enabled.notify_all();
        }
    }

    /// Mark the service disconnected.
    ///
    /// `handler.on_disconnected` is invoked at most once per cycle, even
    /// when teardown paths overlap. Returns whether this call performed
    /// the notification.
    pub fn disconnect(&self, handler: Option<&dyn ConnectionHandler>) -> bool {
        let mut inner = self.inner.lock();
        inner.connected = false;
        if inner.disconnect_notified {
            return false;
        }
        inner.disconnect_notified = true;
        debug!(cycle = inner.cycle, "service disconnected");
        if let Some(handler) = handler {
            handler.on_disconnected();
        }
        true
    }

    /// Block until the service is connected.
    ///
    /// Returns `true` immediately when already connected. `None` waits
    /// indefinitely; `Some(timeout)` gives up after the deadline and
    /// returns `false`. The internal lock is released while blocked.
    pub fn wait_until_connected(&self, timeout: Option<Duration>) -> bool {
        let mut inner = self.inner.lock();
        if inner.connected {
            return true;
        }
        match timeout {
            None => {
                while !inner.connected {
                    self.enabled.wait(&mut inner);
                }
                true
            }
            Some(timeout) => {
                let deadline = Instant::now() + timeout;
                while !inner.connected {
                    if self.enabled.wait_until(&mut inner, deadline).timed_out() {
                        return inner.connected;
                    }
                }
                true
            }
        }
    }
}

impl Default for ConnectionState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    #[derive(Default)]
    struct CountingHandler {
        connects: AtomicUsize,
        disconnects: AtomicUsize,
    }

    impl ConnectionHandler for CountingHandler {
        fn on_connected(&self) {
            self.connects.fetch_add(1, Ordering::Relaxed);
        }

        fn on_disconnected(&self) {
            self.disconnects.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[test]
    fn test_initially_disconnected() {
        let state = ConnectionState::new();
        assert!(!state.is_connected());
        assert_eq!(state.cycle(), 0);
    }

    #[test]
    fn test_connect_transitions_once() {
        let state = ConnectionState::new();
        let handler = CountingHandler::default();
        assert!(state.connect(Some(&handler)));
        assert!(!state.connect(Some(&handler)));
        assert!(state.is_connected());
        assert_eq!(state.cycle(), 1);
        assert_eq!(handler.connects.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_disconnect_notifies_once_per_cycle() {
        let state = ConnectionState::new();
        let handler = CountingHandler::default();
        state.connect(Some(&handler));

        assert!(state.disconnect(Some(&handler)));
        assert!(!state.disconnect(Some(&handler)));
        assert_eq!(handler.disconnects.load(Ordering::Relaxed), 1);

        // A fresh cycle re-arms the notification.
        state.connect(Some(&handler));
        assert!(state.disconnect(Some(&handler)));
        assert_eq!(handler.disconnects.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_disconnect_before_connect_is_silent() {
        let state = ConnectionState::new();
        let handler = CountingHandler::default();
        assert!(!state.disconnect(Some(&handler)));
        assert_eq!(handler.disconnects.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_wait_returns_immediately_when_connected() {
        let state = ConnectionState::new();
        state.mark_connected();
        assert!(state.wait_until_connected(Some(Duration::from_millis(1))));
    }

    #[test]
    fn test_wait_times_out() {
        let state = ConnectionState::new();
        let start = Instant::now();
        assert!(!state.wait_until_connected(Some(Duration::from_millis(50))));
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn test_wait_wakes_on_connect() {
        let state = Arc::new(ConnectionState::new());
        let waiter_state = Arc::clone(&state);
        let waiter = thread::spawn(move || {
            waiter_state.wait_until_connected(Some(Duration::from_secs(5)))
        });

        thread::sleep(Duration::from_millis(20));
        state.connect(None);
        assert!(waiter.join().unwrap());
    }

    #[test]
    fn test_infinite_wait_wakes_on_connect() {
        let state = Arc::new(ConnectionState::new());
        let waiter_state = Arc::clone(&state);
        let waiter = thread::spawn(move || waiter_state.wait_until_connected(None));

        thread::sleep(Duration::from_millis(20));
        state.mark_connected();
        assert!(waiter.join().unwrap());
    }

    #[test]
    fn test_mark_connected_is_idempotent() {
        let state = ConnectionState::new();
        state.mark_connected();
        state.mark_connected();
        assert_eq!(state.cycle(), 1);
    }
}
