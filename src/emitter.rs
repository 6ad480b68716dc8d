//! Named, synchronous publish/subscribe used to announce event activity.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

pub trait EventEmitter: Send + Sync {
    /// Deliver `payload` to every listener registered under `name`. Best effort:
    /// nothing is queued for listeners registered later.
    fn emit(&self, name: &str, payload: &Value);
}

type Listener = Arc<dyn Fn(&Value) + Send + Sync>;

/// In-process listener table. Clones share the same listeners.
#[derive(Clone, Default)]
pub struct ListenerRegistry {
    listeners: Arc<RwLock<HashMap<String, Vec<Listener>>>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on<F>(&self, name: impl Into<String>, listener: F)
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let mut map = self.listeners.write().unwrap_or_else(|e| e.into_inner());
        map.entry(name.into()).or_default().push(Arc::new(listener));
    }

    pub fn listener_count(&self, name: &str) -> usize {
        let map = self.listeners.read().unwrap_or_else(|e| e.into_inner());
        map.get(name).map_or(0, Vec::len)
    }
}

impl EventEmitter for ListenerRegistry {
    fn emit(&self, name: &str, payload: &Value) {
        // Snapshot so listeners may register more listeners.
        let targets: Vec<Listener> = {
            let map = self.listeners.read().unwrap_or_else(|e| e.into_inner());
            map.get(name).cloned().unwrap_or_default()
        };
        tracing::debug!(event = name, listeners = targets.len(), "emit");
        for listener in targets {
            listener(payload);
        }
    }
}

impl<E: EventEmitter + ?Sized> EventEmitter for Arc<E> {
    fn emit(&self, name: &str, payload: &Value) {
        (**self).emit(name, payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    #[test]
    fn delivers_to_named_listeners_in_order() {
        let registry = ListenerRegistry::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        for tag in ["first", "second"] {
            let seen = seen.clone();
            registry.on("order.shipped", move |payload: &Value| {
                seen.lock().unwrap().push((tag, payload.clone()));
            });
        }
        let other = seen.clone();
        registry.on("order.cancelled", move |_: &Value| other.lock().unwrap().push(("other", Value::Null)));

        registry.emit("order.shipped", &json!({ "orderId": 42 }));
        registry.emit("nobody.listens", &json!(1));

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![("first", json!({ "orderId": 42 })), ("second", json!({ "orderId": 42 }))]
        );
        assert_eq!(registry.listener_count("order.shipped"), 2);
        assert_eq!(registry.listener_count("nobody.listens"), 0);
    }

    #[test]
    fn clones_share_listeners() {
        let registry = ListenerRegistry::new();
        let handle = registry.clone();
        handle.on("x", |_: &Value| {});
        assert_eq!(registry.listener_count("x"), 1);
    }
}
