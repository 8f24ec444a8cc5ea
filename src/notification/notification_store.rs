use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use super::notification_dto::CreateNotificationRequest;
use super::notification_models::{Notification, NotificationStatus};
use crate::error::{AppError, Result};

/// Authoritative in-memory storage for notifications. Pure storage and
/// lookup; state transitions are validated by the service, never here.
#[derive(Clone, Default)]
pub struct NotificationStore {
    records: Arc<DashMap<u64, Notification>>,
    next_id: Arc<AtomicU64>,
}

impl NotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns the next id (first id is 0), stamps the creation time, and
    /// stores the record as Pending. Ids are never reused.
    pub fn create(&self, payload: CreateNotificationRequest) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let notification = Notification {
            id,
            price: payload.price,
            daily_percentage_change: payload.daily_percentage_change,
            trading_volume: payload.trading_volume,
            status: NotificationStatus::Pending,
            created_at: Utc::now(),
        };
        self.records.insert(id, notification);
        id
    }

    pub fn get(&self, id: u64) -> Result<Notification> {
        self.records
            .get(&id)
            .map(|record| record.value().clone())
            .ok_or_else(|| AppError::NotFound(format!("Notification {} not found", id)))
    }

    /// Records created strictly between `from` and `to`, both ends
    /// exclusive. An inverted range yields an empty vec. Sorted by id so
    /// callers see deterministic output.
    pub fn find_in_range(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Vec<Notification> {
        let mut matches: Vec<Notification> = self
            .records
            .iter()
            .filter(|record| from < record.created_at && record.created_at < to)
            .map(|record| record.value().clone())
            .collect();
        matches.sort_by_key(|notification| notification.id);
        matches
    }

    /// Overwrites the record at `notification.id` in full. The id must have
    /// been created here first.
    pub fn save(&self, notification: Notification) -> Result<()> {
        let mut entry = self.records.get_mut(&notification.id).ok_or_else(|| {
            AppError::NotFound(format!("Notification {} not found", notification.id))
        })?;
        *entry = notification;
        Ok(())
    }
}
