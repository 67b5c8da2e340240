//! Live notification hub
//!
//! Keeps the viewers currently watching each proof session and pushes every
//! accepted upload to them. One mutex guards the whole registry; publishing
//! under it serializes events per session, so each listener sees them in
//! publish order.
//!
//! Delivery is best-effort: a listener whose buffer is full misses the
//! event, a listener that has gone away is pruned, and nothing is replayed to
//! late subscribers.

use donate_common::ProofUploadEvent;
use futures::Stream;
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::task::{Context, Poll};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, trace, warn};
use uuid::Uuid;

/// Default per-listener buffer
pub const DEFAULT_LISTENER_BUFFER: usize = 32;

struct Listener {
    id: u64,
    tx: mpsc::Sender<ProofUploadEvent>,
}

/// Registry of live listeners per proof session
pub struct NotificationHub {
    listeners: Mutex<HashMap<Uuid, Vec<Listener>>>,
    buffer: usize,
    next_id: AtomicU64,
}

impl NotificationHub {
    /// Create a hub whose listeners each buffer up to `buffer` events
    pub fn new(buffer: usize) -> Arc<Self> {
        Arc::new(Self {
            listeners: Mutex::new(HashMap::new()),
            buffer: buffer.max(1),
            next_id: AtomicU64::new(1),
        })
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, Vec<Listener>>> {
        // Critical sections never panic midway, so a poisoned map is still consistent
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a new listener for `session_id`
    ///
    /// The listener stays registered until the returned [`Subscription`] is
    /// dropped.
    pub fn subscribe(self: &Arc<Self>, session_id: Uuid) -> Subscription {
        let (tx, rx) = mpsc::channel(self.buffer);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        let count = {
            let mut map = self.lock();
            let entry = map.entry(session_id).or_default();
            entry.push(Listener { id, tx });
            entry.len()
        };

        debug!(session_id = %session_id, listener = id, listeners = count, "Listener subscribed");

        Subscription {
            session_id,
            listener_id: id,
            rx,
            hub: Arc::downgrade(self),
        }
    }

    /// Deliver `event` to every listener of `session_id`
    ///
    /// Never blocks and never fails. Returns how many listeners accepted the
    /// event.
    pub fn publish(&self, session_id: Uuid, event: ProofUploadEvent) -> usize {
        let mut map = self.lock();
        let Some(listeners) = map.get_mut(&session_id) else {
            trace!(session_id = %session_id, "No listeners for proof event");
            return 0;
        };

        let mut delivered = 0;
        listeners.retain(|listener| match listener.tx.try_send(event.clone()) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                warn!(session_id = %session_id, listener = listener.id, "Listener buffer full, event dropped");
                true
            }
            Err(TrySendError::Closed(_)) => {
                debug!(session_id = %session_id, listener = listener.id, "Pruning closed listener");
                false
            }
        });

        if listeners.is_empty() {
            map.remove(&session_id);
        }

        debug!(session_id = %session_id, delivered, "Published proof event");
        delivered
    }

    fn unsubscribe(&self, session_id: Uuid, listener_id: u64) {
        let mut map = self.lock();
        if let Some(listeners) = map.get_mut(&session_id) {
            listeners.retain(|l| l.id != listener_id);
            if listeners.is_empty() {
                map.remove(&session_id);
            }
        }
        debug!(session_id = %session_id, listener = listener_id, "Listener unsubscribed");
    }

    /// Number of listeners currently registered for `session_id`
    pub fn listener_count(&self, session_id: Uuid) -> usize {
        self.lock().get(&session_id).map_or(0, Vec::len)
    }

    /// Number of sessions with at least one listener
    pub fn session_count(&self) -> usize {
        self.lock().len()
    }
}

/// A registered listener; dropping it unregisters
pub struct Subscription {
    session_id: Uuid,
    listener_id: u64,
    rx: mpsc::Receiver<ProofUploadEvent>,
    hub: Weak<NotificationHub>,
}

impl Subscription {
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Next event; `None` once the hub has dropped this listener
    pub async fn recv(&mut self) -> Option<ProofUploadEvent> {
        self.rx.recv().await
    }

    /// Next event if one is already buffered
    pub fn try_recv(&mut self) -> Option<ProofUploadEvent> {
        self.rx.try_recv().ok()
    }
}

impl Stream for Subscription {
    type Item = ProofUploadEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            hub.unsubscribe(self.session_id, self.listener_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn event(name: &str) -> ProofUploadEvent {
        ProofUploadEvent::new(format!("proof/{}", name), "10.0", "20.0", Utc::now())
    }

    #[tokio::test]
    async fn test_events_arrive_in_publish_order() {
        let hub = NotificationHub::new(DEFAULT_LISTENER_BUFFER);
        let session = Uuid::new_v4();
        let mut sub = hub.subscribe(session);

        assert_eq!(hub.publish(session, event("e1.jpg")), 1);
        assert_eq!(hub.publish(session, event("e2.jpg")), 1);

        assert_eq!(sub.recv().await.unwrap().image_path, "proof/e1.jpg");
        assert_eq!(sub.recv().await.unwrap().image_path, "proof/e2.jpg");
    }

    #[tokio::test]
    async fn test_publish_is_isolated_per_session() {
        let hub = NotificationHub::new(DEFAULT_LISTENER_BUFFER);
        let s = Uuid::new_v4();
        let t = Uuid::new_v4();
        let mut sub_s = hub.subscribe(s);
        let mut sub_t = hub.subscribe(t);

        hub.publish(s, event("only-s.jpg"));

        assert_eq!(sub_s.try_recv().unwrap().image_path, "proof/only-s.jpg");
        assert!(sub_t.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_all_listeners_of_a_session_receive() {
        let hub = NotificationHub::new(DEFAULT_LISTENER_BUFFER);
        let session = Uuid::new_v4();
        let mut a = hub.subscribe(session);
        let mut b = hub.subscribe(session);

        assert_eq!(hub.publish(session, event("x.jpg")), 2);
        assert!(a.try_recv().is_some());
        assert!(b.try_recv().is_some());
    }

    #[tokio::test]
    async fn test_late_subscriber_gets_no_history() {
        let hub = NotificationHub::new(DEFAULT_LISTENER_BUFFER);
        let session = Uuid::new_v4();

        assert_eq!(hub.publish(session, event("early.jpg")), 0);

        let mut late = hub.subscribe(session);
        assert!(late.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_dropped_subscription_is_removed() {
        let hub = NotificationHub::new(DEFAULT_LISTENER_BUFFER);
        let session = Uuid::new_v4();

        let a = hub.subscribe(session);
        let b = hub.subscribe(session);
        assert_eq!(hub.listener_count(session), 2);
        assert_eq!(hub.session_count(), 1);

        drop(a);
        assert_eq!(hub.listener_count(session), 1);

        drop(b);
        assert_eq!(hub.listener_count(session), 0);
        assert_eq!(hub.session_count(), 0);
        assert_eq!(hub.publish(session, event("nobody.jpg")), 0);
    }

    #[tokio::test]
    async fn test_full_listener_does_not_block_others() {
        let hub = NotificationHub::new(1);
        let session = Uuid::new_v4();
        let mut slow = hub.subscribe(session);
        let mut fast = hub.subscribe(session);

        assert_eq!(hub.publish(session, event("1.jpg")), 2);
        assert_eq!(fast.try_recv().unwrap().image_path, "proof/1.jpg");

        // slow still holds 1.jpg, so 2.jpg only reaches fast
        assert_eq!(hub.publish(session, event("2.jpg")), 1);
        assert_eq!(fast.try_recv().unwrap().image_path, "proof/2.jpg");

        assert_eq!(slow.try_recv().unwrap().image_path, "proof/1.jpg");
        assert!(slow.try_recv().is_none());
        assert_eq!(hub.listener_count(session), 2);
    }

    #[tokio::test]
    async fn test_concurrent_publishers_keep_per_listener_order() {
        let hub = NotificationHub::new(256);
        let session = Uuid::new_v4();
        let mut sub = hub.subscribe(session);

        let mut handles = Vec::new();
        for worker in 0..4 {
            let hub = Arc::clone(&hub);
            handles.push(tokio::spawn(async move {
                for i in 0..25 {
                    hub.publish(session, event(&format!("{}-{}", worker, i)));
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let mut last_seen = [None::<usize>; 4];
        let mut total = 0;
        while let Some(ev) = sub.try_recv() {
            let name = ev.image_path.trim_start_matches("proof/");
            let (worker, i) = name.split_once('-').unwrap();
            let (worker, i): (usize, usize) = (worker.parse().unwrap(), i.parse().unwrap());
            if let Some(prev) = last_seen[worker] {
                assert!(i > prev, "worker {} out of order", worker);
            }
            last_seen[worker] = Some(i);
            total += 1;
        }
        assert_eq!(total, 100);
    }

    #[tokio::test]
    async fn test_subscription_as_stream() {
        use futures::StreamExt;

        let hub = NotificationHub::new(DEFAULT_LISTENER_BUFFER);
        let session = Uuid::new_v4();
        let mut sub = hub.subscribe(session);
        assert_eq!(sub.session_id(), session);

        hub.publish(session, event("streamed.jpg"));
        let next = sub.next().await.unwrap();
        assert_eq!(next.image_path, "proof/streamed.jpg");
    }
}
