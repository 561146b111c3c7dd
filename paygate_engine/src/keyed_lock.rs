//! In-process advisory locks keyed by string.
//!
//! Every key has a FIFO queue of acquisitions. The head of the queue holds the lock; everyone behind it is waiting to
//! be granted. Acquisition is immediate when the queue is empty.
//!
//! Each holder gets a watchdog that force-releases the lock after `ttl`. The watchdog belongs to one acquisition
//! only. It is aborted when that acquisition is released, and when it fires it only releases the lock if its own
//! acquisition is still at the head of the queue, so it can never release a later holder.
//!
//! Keys with an empty queue are dropped from the table.
use std::{
    collections::{HashMap, VecDeque},
    future::Future,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
        Mutex,
        MutexGuard,
        Weak,
    },
    time::Duration,
};

use log::*;
use tokio::{runtime::Handle, sync::oneshot, task::AbortHandle};

/// The lock key used to serialise all status changes of one order.
pub fn order_lock_key(order_id: i64) -> String {
    format!("order:{order_id}:lock")
}

/// The lock key held while a user's new order for a product is checked against the open order cap and stored.
pub fn creation_lock_key(user_id: i64, product_id: i64) -> String {
    format!("user:{user_id}:product:{product_id}:create")
}

struct Acquisition {
    ticket: u64,
    ttl: Duration,
    grant: Option<oneshot::Sender<()>>,
    watchdog: Option<AbortHandle>,
}

#[derive(Default)]
struct LockTable {
    queues: Mutex<HashMap<String, VecDeque<Acquisition>>>,
    next_ticket: AtomicU64,
}

#[derive(Clone, Default)]
pub struct KeyedLock {
    inner: Arc<LockTable>,
}

impl KeyedLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until the lock for `key` is granted to this caller. The lock is released when the returned guard is
    /// released or dropped, or after `ttl`, whichever happens first.
    ///
    /// Dropping the future while it is still waiting removes it from the queue.
    pub async fn acquire(&self, key: &str, ttl: Duration) -> KeyedLockGuard {
        let ticket = self.inner.next_ticket.fetch_add(1, Ordering::SeqCst);
        let pending = {
            let mut queues = self.queues();
            let queue = queues.entry(key.to_string()).or_default();
            if queue.is_empty() {
                let watchdog = self.arm_watchdog(key, ticket, ttl);
                queue.push_back(Acquisition { ticket, ttl, grant: None, watchdog });
                None
            } else {
                let (tx, rx) = oneshot::channel();
                queue.push_back(Acquisition { ticket, ttl, grant: Some(tx), watchdog: None });
                trace!("🔒️ {key} is busy. Ticket {ticket} is number {} in the queue", queue.len() - 1);
                Some(rx)
            }
        };
        let guard = KeyedLockGuard { lock: self.clone(), key: key.to_string(), ticket, released: false };
        if let Some(rx) = pending {
            if rx.await.is_err() {
                error!("🔒️ Ticket {ticket} for {key} was discarded before it was granted");
            }
        }
        trace!("🔒️ Ticket {ticket} holds {key}");
        guard
    }

    /// Runs `f` while holding the lock for `key`. The lock is released on every exit path, and `f`'s output is
    /// returned as is.
    pub async fn with_lock<F, T>(&self, key: &str, ttl: Duration, f: F) -> T
    where F: Future<Output = T> {
        let guard = self.acquire(key, ttl).await;
        let result = f.await;
        guard.release();
        result
    }

    /// True if anyone currently holds or waits for `key`.
    pub fn is_locked(&self, key: &str) -> bool {
        self.queues().contains_key(key)
    }

    /// The number of keys with at least one holder.
    pub fn len(&self) -> usize {
        self.queues().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queues().is_empty()
    }

    fn queues(&self) -> MutexGuard<'_, HashMap<String, VecDeque<Acquisition>>> {
        // No code path can panic while holding the table, but a poisoned table is still consistent.
        self.inner.queues.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn arm_watchdog(&self, key: &str, ticket: u64, ttl: Duration) -> Option<AbortHandle> {
        let Ok(handle) = Handle::try_current() else {
            warn!("🔒️ No tokio runtime available. The lock on {key} will not expire on its own.");
            return None;
        };
        let table = Arc::downgrade(&self.inner);
        let key = key.to_string();
        let task = handle.spawn(async move {
            tokio::time::sleep(ttl).await;
            if let Some(lock) = KeyedLock::upgrade(&table) {
                if lock.release_ticket(&key, ticket, true) {
                    warn!("🔒️ Ticket {ticket} held {key} for longer than {ttl:?}. The lock was force-released.");
                }
            }
        });
        Some(task.abort_handle())
    }

    fn upgrade(table: &Weak<LockTable>) -> Option<Self> {
        table.upgrade().map(|inner| Self { inner })
    }

    /// Removes `ticket` from the queue for `key`. If it was the holder, the lock passes to the next waiter that is
    /// still listening. Returns false if the ticket was no longer queued.
    fn release_ticket(&self, key: &str, ticket: u64, from_watchdog: bool) -> bool {
        let mut queues = self.queues();
        let Some(queue) = queues.get_mut(key) else {
            return false;
        };
        let is_holder = queue.front().map(|a| a.ticket == ticket).unwrap_or(false);
        let removed = if is_holder {
            if let Some(holder) = queue.pop_front() {
                if let (false, Some(watchdog)) = (from_watchdog, holder.watchdog) {
                    watchdog.abort();
                }
            }
            while let Some(next) = queue.front_mut() {
                let granted = match next.grant.take() {
                    Some(tx) => tx.send(()).is_ok(),
                    None => true,
                };
                if granted {
                    next.watchdog = self.arm_watchdog(key, next.ticket, next.ttl);
                    trace!("🔒️ {key} passed from ticket {ticket} to ticket {}", next.ticket);
                    break;
                }
                // The waiter gave up before it was granted
                queue.pop_front();
            }
            true
        } else {
            let before = queue.len();
            queue.retain(|a| a.ticket != ticket);
            queue.len() < before
        };
        if queue.is_empty() {
            queues.remove(key);
        }
        removed
    }
}

/// Proof of holding a [`KeyedLock`] key. Releases the key when dropped.
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct KeyedLockGuard {
    lock: KeyedLock,
    key: String,
    ticket: u64,
    released: bool,
}

impl KeyedLockGuard {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        if !self.released {
            self.released = true;
            self.lock.release_ticket(&self.key, self.ticket, false);
        }
    }
}

impl Drop for KeyedLockGuard {
    fn drop(&mut self) {
        self.release_inner();
    }
}
