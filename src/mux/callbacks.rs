//! Named Callback Registry
//!
//! Script-level event hooks register a single callback per event kind,
//! addressed by the kind's canonical name. Re-registration replaces the
//! previous callback; removal is by name. Name resolution goes through the
//! static table in [`crate::event::types`], so an unknown name fails at
//! registration time and leaves the registry untouched.

use crate::event::{EventKind, UiEvent};
use crate::Result;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// A handler bound to one event kind.
pub trait EventCallback: Send + Sync {
    fn on_event(&self, event: &UiEvent);
}

/// Closures double as callbacks.
impl<F> EventCallback for F
where
    F: Fn(&UiEvent) + Send + Sync,
{
    fn on_event(&self, event: &UiEvent) {
        self(event)
    }
}

/// One callback per event kind, replaceable, removable by name.
pub struct CallbackRegistry {
    map: RwLock<HashMap<EventKind, Arc<dyn EventCallback>>>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self {
            map: RwLock::new(HashMap::new()),
        }
    }

    /// Bind `callback` to the kind named `name`, replacing any previous
    /// binding for that kind.
    ///
    /// # Errors
    /// [`crate::Error::UnknownEventName`] when `name` resolves to no kind;
    /// the registry is not modified in that case.
    pub fn register(&self, name: &str, callback: Arc<dyn EventCallback>) -> Result<()> {
        let kind = EventKind::from_name(name)?;
        self.map.write().insert(kind, callback);
        Ok(())
    }

    /// Remove the callback bound to the kind named `name`.
    ///
    /// Returns whether a callback was actually removed.
    ///
    /// # Errors
    /// [`crate::Error::UnknownEventName`] when `name` resolves to no kind.
    pub fn unregister(&self, name: &str) -> Result<bool> {
        let kind = EventKind::from_name(name)?;
        Ok(self.map.write().remove(&kind).is_some())
    }

    /// The callback bound to `kind`, if any.
    pub fn get(&self, kind: EventKind) -> Option<Arc<dyn EventCallback>> {
        self.map.read().get(&kind).cloned()
    }

    /// Drop all bindings.
    pub fn clear(&self) {
        self.map.write().clear();
    }

    /// Number of bound kinds.
    pub fn len(&self) -> usize {
        self.map.read().len()
    }

    /// True when nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.map.read().is_empty()
    }
}

impl Default for CallbackRegistry {
    fn default() -> Self {
        Self::new()
    }
}
