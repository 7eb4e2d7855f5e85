//! Outbound notification ports.
//!
//! A [`NotificationPort`] delivers slot decisions to schools over whatever
//! channel the deployment uses (mail gateway, SMS bridge, a log file). The
//! drain task feeds it from the outbox; a failed delivery is logged and
//! dropped rather than retried, slot processing never waits on it.

use async_trait::async_trait;
use log::warn;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::services::events::{NotificationOutbox, TourEvent, TourEventKind};

/// Delivery channel for slot decisions.
#[async_trait]
pub trait NotificationPort: Send + Sync {
    async fn notify(&self, event: &TourEvent) -> anyhow::Result<()>;
}

/// Writes notifications to the application log.
///
/// The default port; deployments without a mail gateway still get a record
/// of every decision.
pub struct LogNotifier;

#[async_trait]
impl NotificationPort for LogNotifier {
    async fn notify(&self, event: &TourEvent) -> anyhow::Result<()> {
        match event.kind {
            TourEventKind::Accepted => log::info!(
                "tour {} accepted into slot {}",
                event.tour_code,
                event.slot_id
            ),
            TourEventKind::Cancelled => log::info!(
                "tour {} cancelled from slot {}",
                event.tour_code,
                event.slot_id
            ),
        }
        Ok(())
    }
}

/// Spawn a task draining the outbox into `port`.
///
/// The task ends when the outbox is dropped. A lagged receiver skips the
/// missed events and keeps going; the bounded log on the outbox still has
/// them for polling clients.
pub fn spawn_notifier(outbox: &NotificationOutbox, port: Arc<dyn NotificationPort>) -> JoinHandle<()> {
    let mut rx = outbox.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if let Err(err) = port.notify(&event).await {
                        warn!("notification for event {} failed: {:#}", event.seq, err);
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("notifier lagged, {} events skipped", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{SlotId, TourCode};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingPort {
        delivered: AtomicUsize,
        fail: bool,
    }

    impl CountingPort {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                delivered: AtomicUsize::new(0),
                fail,
            })
        }
    }

    #[async_trait]
    impl NotificationPort for CountingPort {
        async fn notify(&self, _event: &TourEvent) -> anyhow::Result<()> {
            self.delivered.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("gateway unavailable");
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_drain_task_delivers_events() {
        let outbox = NotificationOutbox::new();
        let port = CountingPort::new(false);
        let handle = spawn_notifier(&outbox, port.clone());

        outbox.accepted(TourCode::new("T1"), SlotId::new(1));
        outbox.cancelled(TourCode::new("T2"), SlotId::new(1));
        drop(outbox);

        handle.await.unwrap();
        assert_eq!(port.delivered.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_delivery_does_not_stop_the_drain() {
        let outbox = NotificationOutbox::new();
        let port = CountingPort::new(true);
        let handle = spawn_notifier(&outbox, port.clone());

        outbox.accepted(TourCode::new("T1"), SlotId::new(1));
        outbox.accepted(TourCode::new("T2"), SlotId::new(1));
        drop(outbox);

        handle.await.unwrap();
        // Both were attempted even though each failed.
        assert_eq!(port.delivered.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_log_notifier_always_succeeds() {
        let event = TourEvent {
            seq: 1,
            kind: TourEventKind::Accepted,
            tour_code: TourCode::new("Ankara0001"),
            slot_id: SlotId::new(42),
            occurred_at: chrono::Utc::now(),
        };
        assert!(LogNotifier.notify(&event).await.is_ok());
    }
}
