use std::{
    collections::BTreeMap,
    future::Future,
    pin::Pin,
    sync::{Arc, Mutex, MutexGuard, Weak},
};

use log::*;
use tokio::sync::mpsc;

use crate::events::{Delivery, EventHandler, EventProducer, Handler, SuccessEvent};

type Subscribers = BTreeMap<u64, EventProducer<SuccessEvent>>;

#[derive(Default)]
struct HubState {
    next_id: u64,
    subscribers: Subscribers,
}

/// One-to-many fan-out of [`SuccessEvent`]s.
///
/// Every subscriber gets its own buffered channel. Events are delivered to subscribers in registration order, and
/// each subscriber sees events in publication order. Publishing never waits: a subscriber whose buffer is full misses
/// the event.
#[derive(Clone, Default)]
pub struct SuccessEventHub {
    state: Arc<Mutex<HubState>>,
}

impl SuccessEventHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a raw channel subscriber. Up to `buffer_size` events are held for it; later ones are dropped until it
    /// catches up.
    pub fn subscribe(&self, buffer_size: usize) -> (Subscription, mpsc::Receiver<SuccessEvent>) {
        let (sender, receiver) = mpsc::channel(buffer_size.max(1));
        let subscription = self.register(EventProducer::new(sender));
        (subscription, receiver)
    }

    /// Runs `f` for every success event until the returned subscription is cancelled.
    ///
    /// Must be called from within a tokio runtime, since the handler runs on its own task.
    pub fn on_success<F>(&self, buffer_size: usize, f: F) -> Subscription
    where F: (Fn(SuccessEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        let handler: Handler<SuccessEvent> = Arc::new(f);
        let event_handler = EventHandler::new(buffer_size, handler);
        let subscription = self.register(event_handler.subscribe());
        tokio::spawn(event_handler.start_handler());
        subscription
    }

    pub fn publish(&self, event: SuccessEvent) {
        let subscribers: Vec<(u64, EventProducer<SuccessEvent>)> =
            self.lock().subscribers.iter().map(|(id, p)| (*id, p.clone())).collect();
        trace!("📬️ Publishing success event for order {} to {} subscribers", event.order.id, subscribers.len());
        let mut closed = Vec::new();
        for (id, producer) in subscribers {
            match producer.try_publish_event(event.clone()) {
                Delivery::Delivered => {},
                Delivery::Dropped => {
                    warn!("📬️ Subscriber {id} is not keeping up. It misses the event for order {}.", event.order.id)
                },
                Delivery::Closed => closed.push(id),
            }
        }
        if !closed.is_empty() {
            let mut state = self.lock();
            for id in closed {
                debug!("📬️ Subscriber {id} has gone away. Removing it.");
                state.subscribers.remove(&id);
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }

    fn register(&self, producer: EventProducer<SuccessEvent>) -> Subscription {
        let mut state = self.lock();
        let id = state.next_id;
        state.next_id += 1;
        state.subscribers.insert(id, producer);
        debug!("📬️ Success subscriber {id} registered");
        Subscription { id, state: Arc::downgrade(&self.state) }
    }

    fn lock(&self) -> MutexGuard<'_, HubState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Handle returned by [`SuccessEventHub::subscribe`] and [`SuccessEventHub::on_success`].
///
/// Dropping the handle does not unsubscribe. Call [`Subscription::unsubscribe`].
#[must_use = "keep the subscription if you ever want to unsubscribe"]
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    state: Weak<Mutex<HubState>>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Stops delivery to this subscriber. A handler registered with `on_success` finishes the events already queued
    /// for it and then shuts down.
    pub fn unsubscribe(self) {
        if let Some(state) = self.state.upgrade() {
            let mut state = state.lock().unwrap_or_else(|e| e.into_inner());
            if state.subscribers.remove(&self.id).is_some() {
                debug!("📬️ Success subscriber {} unsubscribed", self.id);
            }
        }
    }
}
