use std::{
    collections::HashMap,
    panic::{self, AssertUnwindSafe},
    sync::{
        Arc, Mutex, PoisonError, Weak,
        atomic::{AtomicU64, Ordering},
    },
};

pub const LOCATION_REFRESH: &str = "weather:location-refresh";

type Handler<D> = Arc<dyn Fn(&D) + Send + Sync>;

struct Registry<D> {
    listeners: Mutex<HashMap<String, Vec<(u64, Handler<D>)>>>,
    next_id: AtomicU64,
}

/// Named pub/sub channel. Delivery is synchronous, in registration order,
/// to the handlers registered when `emit` starts.
pub struct EventBus<D> {
    inner: Arc<Registry<D>>,
}

impl<D> Clone for EventBus<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<D> Default for EventBus<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D> std::fmt::Debug for EventBus<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let listeners = self
            .inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<&String> = listeners.keys().collect();
        names.sort();
        f.debug_struct("EventBus").field("events", &names).finish()
    }
}

/// Handle returned by [`EventBus::on`]; `dispose` unsubscribes.
pub struct Subscription<D> {
    registry: Weak<Registry<D>>,
    event: String,
    id: u64,
}

impl<D> std::fmt::Debug for Subscription<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("event", &self.event)
            .field("id", &self.id)
            .finish()
    }
}

impl<D> Subscription<D> {
    pub fn dispose(&self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(&self.event, self.id);
        }
    }
}

impl<D> Registry<D> {
    fn remove(&self, event: &str, id: u64) {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(handlers) = listeners.get_mut(event) else {
            return;
        };
        handlers.retain(|(handler_id, _)| *handler_id != id);
        if handlers.is_empty() {
            listeners.remove(event);
        }
    }
}

impl<D> EventBus<D> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Registry {
                listeners: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    pub fn on<F>(&self, event: &str, handler: F) -> Subscription<D>
    where
        F: Fn(&D) + Send + Sync + 'static,
    {
        let subscription = self.reserve(event);
        self.register(&subscription, Arc::new(handler));
        subscription
    }

    fn reserve(&self, event: &str) -> Subscription<D> {
        Subscription {
            registry: Arc::downgrade(&self.inner),
            event: event.to_string(),
            id: self.inner.next_id.fetch_add(1, Ordering::Relaxed),
        }
    }

    fn register(&self, subscription: &Subscription<D>, handler: Handler<D>) {
        self.inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(subscription.event.clone())
            .or_default()
            .push((subscription.id, handler));
    }

    pub fn off(&self, subscription: &Subscription<D>) {
        self.inner.remove(&subscription.event, subscription.id);
    }

    /// Subscribes `handler` for a single delivery; it is unsubscribed before
    /// it runs. The handler's own subscription is in place before it can be
    /// reached by `emit`.
    pub fn once<F>(&self, event: &str, handler: F) -> Subscription<D>
    where
        F: Fn(&D) + Send + Sync + 'static,
        D: 'static,
    {
        let subscription = self.reserve(event);
        let own = Mutex::new(Some(Subscription {
            registry: subscription.registry.clone(),
            event: subscription.event.clone(),
            id: subscription.id,
        }));
        self.register(
            &subscription,
            Arc::new(move |detail: &D| {
                let own = own.lock().unwrap_or_else(PoisonError::into_inner).take();
                if let Some(own) = own {
                    own.dispose();
                    handler(detail);
                }
            }),
        );
        subscription
    }

    /// Returns how many handlers were invoked. A panicking handler is logged
    /// and skipped.
    pub fn emit(&self, event: &str, detail: &D) -> usize {
        let snapshot: Vec<Handler<D>> = {
            let listeners = self
                .inner
                .listeners
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            match listeners.get(event) {
                Some(handlers) => handlers.iter().map(|(_, h)| Arc::clone(h)).collect(),
                None => return 0,
            }
        };

        for handler in &snapshot {
            if panic::catch_unwind(AssertUnwindSafe(|| handler(detail))).is_err() {
                tracing::error!(event, "event handler panicked");
            }
        }
        snapshot.len()
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(event)
            .map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize};

    use super::*;

    fn recorder() -> Arc<Mutex<Vec<String>>> {
        Arc::new(Mutex::new(Vec::new()))
    }

    #[test]
    fn delivers_in_registration_order() {
        let bus: EventBus<String> = EventBus::new();
        let log = recorder();
        let (l1, l2) = (log.clone(), log.clone());

        bus.on("city", move |d: &String| l1.lock().unwrap().push(format!("first:{d}")));
        bus.on("city", move |d: &String| l2.lock().unwrap().push(format!("second:{d}")));

        assert_eq!(bus.emit("city", &"Cluj".to_string()), 2);
        assert_eq!(*log.lock().unwrap(), vec!["first:Cluj", "second:Cluj"]);
    }

    #[test]
    fn panicking_handler_does_not_stop_delivery() {
        let bus: EventBus<u32> = EventBus::new();
        let log = recorder();
        let l = log.clone();

        bus.on("tick", |_| panic!("handler failure"));
        bus.on("tick", move |n| l.lock().unwrap().push(n.to_string()));

        assert_eq!(bus.emit("tick", &7), 2);
        assert_eq!(*log.lock().unwrap(), vec!["7"]);
    }

    #[test]
    fn dispose_and_off_remove_handlers() {
        let bus: EventBus<()> = EventBus::new();
        let a = bus.on("x", |()| {});
        let b = bus.on("x", |()| {});
        assert_eq!(bus.listener_count("x"), 2);

        a.dispose();
        assert_eq!(bus.listener_count("x"), 1);
        bus.off(&b);
        assert_eq!(bus.listener_count("x"), 0);
        assert_eq!(bus.emit("x", &()), 0);
        assert_eq!(format!("{bus:?}"), "EventBus { events: [] }");
    }

    #[test]
    fn once_fires_a_single_time() {
        let bus: EventBus<u32> = EventBus::new();
        let log = recorder();
        let l = log.clone();

        bus.once(LOCATION_REFRESH, move |n| l.lock().unwrap().push(n.to_string()));

        bus.emit(LOCATION_REFRESH, &1);
        bus.emit(LOCATION_REFRESH, &2);
        assert_eq!(*log.lock().unwrap(), vec!["1"]);
        assert_eq!(bus.listener_count(LOCATION_REFRESH), 0);
    }

    #[test]
    fn emit_uses_a_snapshot_of_subscribers() {
        let bus: EventBus<u32> = EventBus::new();
        let log = recorder();
        let inner_bus = bus.clone();
        let l = log.clone();

        bus.on("grow", move |_| {
            let l2 = l.clone();
            inner_bus.on("grow", move |_| l2.lock().unwrap().push("late".into()));
        });

        assert_eq!(bus.emit("grow", &0), 1);
        assert!(log.lock().unwrap().is_empty());
        assert_eq!(bus.listener_count("grow"), 2);
    }

    #[test]
    fn once_registered_during_concurrent_emits_fires_exactly_once() {
        for _ in 0..50 {
            let bus: EventBus<u32> = EventBus::new();
            let hits = Arc::new(AtomicUsize::new(0));
            let stop = AtomicBool::new(false);

            std::thread::scope(|scope| {
                scope.spawn(|| {
                    while !stop.load(Ordering::SeqCst) {
                        bus.emit("tick", &1);
                    }
                });
                let h = Arc::clone(&hits);
                bus.once("tick", move |_| {
                    h.fetch_add(1, Ordering::SeqCst);
                });
                while bus.listener_count("tick") > 0 {
                    std::thread::yield_now();
                }
                stop.store(true, Ordering::SeqCst);
            });

            assert_eq!(hits.load(Ordering::SeqCst), 1);
        }
    }
}
