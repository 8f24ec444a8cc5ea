use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{info, warn};

use super::notification_dto::CreateNotificationRequest;
use super::notification_models::{Notification, NotificationStatus};
use super::notification_store::NotificationStore;
use crate::config::Config;
use crate::delivery::DeliveryCapability;
use crate::error::Result;

/// Service layer for the notification state machine. Sole writer to the
/// store; every status transition goes through here.
///
/// Pending is the only non-terminal state. Send moves a pending
/// notification to Sent or Failed depending on the delivery outcome;
/// cancel moves it to Failed. Once terminal, a notification never changes.
#[derive(Clone)]
pub struct NotificationService<D: DeliveryCapability> {
    store: NotificationStore,
    delivery: Arc<D>,
    recipients: Vec<String>,
    delivery_timeout: Duration,
    // One mutex per id serializes concurrent read-modify-write transitions.
    // Entries are never removed: records are never deleted, and pruning
    // while a waiter holds a clone could mint two mutexes for one id.
    transition_locks: Arc<DashMap<u64, Arc<Mutex<()>>>>,
}

impl<D: DeliveryCapability> NotificationService<D> {
    pub fn new(store: NotificationStore, delivery: D, config: &Config) -> Self {
        Self {
            store,
            delivery: Arc::new(delivery),
            recipients: config.recipients.clone(),
            delivery_timeout: config.delivery_timeout,
            transition_locks: Arc::new(DashMap::new()),
        }
    }

    /// Creates a notification in the Pending state and returns its id.
    pub fn create_notification(&self, payload: CreateNotificationRequest) -> u64 {
        let id = self.store.create(payload);
        info!("Notification created with id: {}", id);
        id
    }

    /// Attempts delivery and returns the resulting status. Already-terminal
    /// notifications short-circuit: the current status comes back unchanged
    /// and the delivery capability is not invoked again.
    pub async fn send_notification(&self, id: u64) -> Result<NotificationStatus> {
        let lock = self.transition_lock(id);
        let _guard = lock.lock().await;

        let mut notification = self.store.get(id)?;
        if notification.status.is_terminal() {
            info!(
                "Notification {} already reached terminal state: {}",
                id, notification.status
            );
            return Ok(notification.status);
        }

        let body = notification.render_body();
        let delivered = match timeout(
            self.delivery_timeout,
            self.delivery.attempt(&body, &self.recipients),
        )
        .await
        {
            Ok(delivered) => delivered,
            Err(_) => {
                warn!(
                    "Delivery for notification {} timed out after {:?}",
                    id, self.delivery_timeout
                );
                false
            }
        };

        notification.status = if delivered {
            NotificationStatus::Sent
        } else {
            NotificationStatus::Failed
        };
        self.store.save(notification.clone())?;
        info!(
            "Sent notification {} to {:?}; status = {}",
            id, self.recipients, notification.status
        );
        Ok(notification.status)
    }

    /// Cancels a pending notification, moving it to Failed. Returns false
    /// when the notification is already terminal; unknown ids are NotFound.
    pub async fn cancel_notification(&self, id: u64) -> Result<bool> {
        let lock = self.transition_lock(id);
        let _guard = lock.lock().await;

        let mut notification = self.store.get(id)?;
        if notification.status.is_terminal() {
            info!(
                "Notification {} reached terminal status {}; cancellation denied",
                id, notification.status
            );
            return Ok(false);
        }

        notification.status = NotificationStatus::Failed;
        self.store.save(notification)?;
        info!("Cancelled notification {}", id);
        Ok(true)
    }

    /// Notifications created strictly between `from` and `to`.
    pub fn list_notifications(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Vec<Notification> {
        self.store.find_in_range(from, to)
    }

    fn transition_lock(&self, id: u64) -> Arc<Mutex<()>> {
        self.transition_locks.entry(id).or_default().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use async_trait::async_trait;
    use chrono::Duration as ChronoDuration;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Delivery stub with a fixed outcome, an invocation counter, and an
    /// optional artificial latency.
    struct MockDelivery {
        succeed: bool,
        latency: Option<Duration>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl DeliveryCapability for MockDelivery {
        async fn attempt(&self, _body: &str, _recipients: &[String]) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(latency) = self.latency {
                tokio::time::sleep(latency).await;
            }
            self.succeed
        }
    }

    fn service(succeed: bool) -> (NotificationService<MockDelivery>, Arc<AtomicUsize>) {
        service_with_latency(succeed, None, Duration::from_secs(30))
    }

    fn service_with_latency(
        succeed: bool,
        latency: Option<Duration>,
        delivery_timeout: Duration,
    ) -> (NotificationService<MockDelivery>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let delivery = MockDelivery {
            succeed,
            latency,
            calls: calls.clone(),
        };
        let config = Config {
            recipients: vec!["abcd@gmail.com".to_string(), "xyz@gmail.com".to_string()],
            delivery_timeout,
        };
        (
            NotificationService::new(NotificationStore::new(), delivery, &config),
            calls,
        )
    }

    fn payload(price: f64, change: f64, volume: f64) -> CreateNotificationRequest {
        CreateNotificationRequest {
            price,
            daily_percentage_change: change,
            trading_volume: volume,
        }
    }

    #[tokio::test]
    async fn test_create_send_cancel_scenario() {
        let (service, calls) = service(true);
        let now = Utc::now();
        let from = now - ChronoDuration::hours(1);
        let to = now + ChronoDuration::hours(1);

        let id1 = service.create_notification(payload(71000.0, 1.5, 5_000_000.0));
        assert_eq!(id1, 0);

        let listed = service.list_notifications(from, to);
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].status, NotificationStatus::Pending);

        assert_eq!(
            service.send_notification(id1).await.unwrap(),
            NotificationStatus::Sent
        );
        // Second send short-circuits without another delivery attempt.
        assert_eq!(
            service.send_notification(id1).await.unwrap(),
            NotificationStatus::Sent
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let id2 = service.create_notification(payload(72000.0, 1.7, 50_000_000.0));
        assert_eq!(id2, 1);

        assert!(service.cancel_notification(id2).await.unwrap());
        assert!(!service.cancel_notification(id1).await.unwrap());

        let listed = service.list_notifications(from, to);
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].status, NotificationStatus::Sent);
        assert_eq!(listed[1].status, NotificationStatus::Failed);
    }

    #[tokio::test]
    async fn test_send_unknown_id_is_not_found() {
        let (service, _) = service(true);
        assert!(matches!(
            service.send_notification(42).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_failed_delivery_is_terminal() {
        let (service, calls) = service(false);
        let id = service.create_notification(payload(71000.0, 1.5, 5_000_000.0));

        assert_eq!(
            service.send_notification(id).await.unwrap(),
            NotificationStatus::Failed
        );
        // Failed is terminal: no second attempt, status sticks.
        assert_eq!(
            service.send_notification(id).await.unwrap(),
            NotificationStatus::Failed
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!service.cancel_notification(id).await.unwrap());
    }

    #[tokio::test]
    async fn test_cancelled_notification_rejects_send() {
        let (service, calls) = service(true);
        let id = service.create_notification(payload(71000.0, 1.5, 5_000_000.0));

        assert!(service.cancel_notification(id).await.unwrap());
        assert_eq!(
            service.send_notification(id).await.unwrap(),
            NotificationStatus::Failed
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancel_unknown_id_is_not_found() {
        let (service, _) = service(true);
        assert!(matches!(
            service.cancel_notification(42).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_sends_deliver_once() {
        let (service, calls) =
            service_with_latency(true, Some(Duration::from_millis(20)), Duration::from_secs(30));
        let id = service.create_notification(payload(71000.0, 1.5, 5_000_000.0));

        let (first, second) = tokio::join!(
            service.send_notification(id),
            service.send_notification(id)
        );
        assert_eq!(first.unwrap(), NotificationStatus::Sent);
        assert_eq!(second.unwrap(), NotificationStatus::Sent);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_slow_delivery_times_out_as_failed() {
        let (service, calls) = service_with_latency(
            true,
            Some(Duration::from_millis(200)),
            Duration::from_millis(20),
        );
        let id = service.create_notification(payload(71000.0, 1.5, 5_000_000.0));

        assert_eq!(
            service.send_notification(id).await.unwrap(),
            NotificationStatus::Failed
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
