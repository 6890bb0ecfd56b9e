//! Key and Gesture Observer Chains
//!
//! Key events reach two observer chains (a process-sticky one that
//! survives service reconnects and a per-connection one), plus an
//! interceptor chain that decides synchronously whether the event should
//! be swallowed before the rest of the system sees it. Gesture
//! notifications broadcast to all registered listeners.
//!
//! Chains clone their listener list before iterating, so registration
//! during a dispatch never deadlocks and never mutates a fan-out already
//! in flight.

use crate::event::KeyEvent;
use parking_lot::RwLock;
use std::sync::Arc;

/// Passive observer of key events. Observers cannot consume the event.
pub trait KeyObserver: Send + Sync {
    fn on_key_event(&self, event: &KeyEvent);
}

impl<F> KeyObserver for F
where
    F: Fn(&KeyEvent) + Send + Sync,
{
    fn on_key_event(&self, event: &KeyEvent) {
        self(event)
    }
}

/// Interceptor consulted synchronously on the delivery thread.
/// Returning `true` asks the host platform to swallow the event.
pub trait KeyInterceptor: Send + Sync {
    fn intercept_key_event(&self, event: &KeyEvent) -> bool;
}

impl<F> KeyInterceptor for F
where
    F: Fn(&KeyEvent) -> bool + Send + Sync,
{
    fn intercept_key_event(&self, event: &KeyEvent) -> bool {
        self(event)
    }
}

/// Listener for platform gesture notifications.
pub trait GestureListener: Send + Sync {
    fn on_gesture(&self, gesture_id: i32);
}

impl<F> GestureListener for F
where
    F: Fn(i32) + Send + Sync,
{
    fn on_gesture(&self, gesture_id: i32) {
        self(gesture_id)
    }
}

/// Fan-out chain of passive key observers.
#[derive(Clone, Default)]
pub struct KeyObserverChain {
    observers: Arc<RwLock<Vec<Arc<dyn KeyObserver>>>>,
}

impl KeyObserverChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, observer: Arc<dyn KeyObserver>) {
        self.observers.write().push(observer);
    }

    pub fn clear(&self) {
        self.observers.write().clear();
    }

    pub fn len(&self) -> usize {
        self.observers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.read().is_empty()
    }

    /// Notify every observer, in registration order.
    pub fn notify(&self, event: &KeyEvent) {
        let observers = self.observers.read().clone();
        for observer in observers {
            observer.on_key_event(event);
        }
    }
}

/// OR-fold chain of key interceptors.
#[derive(Clone, Default)]
pub struct KeyInterceptorChain {
    interceptors: Arc<RwLock<Vec<Arc<dyn KeyInterceptor>>>>,
}

impl KeyInterceptorChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, interceptor: Arc<dyn KeyInterceptor>) {
        self.interceptors.write().push(interceptor);
    }

    pub fn clear(&self) {
        self.interceptors.write().clear();
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.read().is_empty()
    }

    /// Ask every interceptor; the event is swallowed when any says so.
    /// All interceptors are consulted even after one claims the event.
    pub fn intercept(&self, event: &KeyEvent) -> bool {
        let interceptors = self.interceptors.read().clone();
        let mut intercepted = false;
        for interceptor in interceptors {
            intercepted |= interceptor.intercept_key_event(event);
        }
        intercepted
    }
}

/// Broadcast dispatcher for gesture notifications.
#[derive(Clone, Default)]
pub struct GestureDispatcher {
    listeners: Arc<RwLock<Vec<Arc<dyn GestureListener>>>>,
}

impl GestureDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, listener: Arc<dyn GestureListener>) {
        self.listeners.write().push(listener);
    }

    pub fn clear(&self) {
        self.listeners.write().clear();
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.read().is_empty()
    }

    /// Broadcast to every listener, in registration order.
    pub fn dispatch(&self, gesture_id: i32) {
        let listeners = self.listeners.read().clone();
        for listener in listeners {
            listener.on_gesture(gesture_id);
        }
    }
}
