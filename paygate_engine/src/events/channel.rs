//! Minimal pub-sub plumbing for engine events.
//!
//! An [`EventHandler`] owns the receiving end of a bounded channel and runs an async handler for every event it
//! receives. Events are handled one at a time, in the order they were sent. Any number of [`EventProducer`]s can feed
//! the same handler. The handler task exits once every producer has been dropped.
use std::{future::Future, pin::Pin, sync::Arc};

use log::*;
use tokio::sync::{mpsc, mpsc::error::TrySendError};

pub type Handler<E> = Arc<dyn Fn(E) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

pub struct EventHandler<E: Send + Sync + 'static> {
    listener: mpsc::Receiver<E>,
    sender: mpsc::Sender<E>,
    handler: Handler<E>,
}

impl<E: Send + Sync + 'static> EventHandler<E> {
    pub fn new(buffer_size: usize, handler: Handler<E>) -> Self {
        let (sender, receiver) = mpsc::channel(buffer_size.max(1));
        Self { listener: receiver, sender, handler }
    }

    pub fn subscribe(&self) -> EventProducer<E> {
        EventProducer::new(self.sender.clone())
    }

    pub async fn start_handler(mut self) {
        debug!("📬️ Starting event handler");
        // Only the producers handed out by `subscribe` keep the channel open from here on
        drop(self.sender);
        let mut handled = 0u64;
        while let Some(ev) = self.listener.recv().await {
            trace!("📬️ Handling event");
            (self.handler)(ev).await;
            handled += 1;
        }
        debug!("📬️ Event handler has shut down after {handled} events");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    /// The receiver's buffer was full
    Dropped,
    /// The receiver has gone away
    Closed,
}

pub struct EventProducer<E: Send + Sync> {
    sender: mpsc::Sender<E>,
}

impl<E: Send + Sync> Clone for EventProducer<E> {
    fn clone(&self) -> Self {
        Self { sender: self.sender.clone() }
    }
}

impl<E: Send + Sync> EventProducer<E> {
    pub fn new(sender: mpsc::Sender<E>) -> Self {
        Self { sender }
    }

    /// Sends `event` without waiting. A full buffer drops the event.
    pub fn try_publish_event(&self, event: E) -> Delivery {
        match self.sender.try_send(event) {
            Ok(()) => Delivery::Delivered,
            Err(TrySendError::Full(_)) => Delivery::Dropped,
            Err(TrySendError::Closed(_)) => Delivery::Closed,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}
