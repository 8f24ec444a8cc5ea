use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationStatus {
    Pending,
    Sent,
    Failed,
}

impl NotificationStatus {
    /// Sent and Failed admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, NotificationStatus::Sent | NotificationStatus::Failed)
    }
}

impl std::fmt::Display for NotificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationStatus::Pending => write!(f, "Pending"),
            NotificationStatus::Sent => write!(f, "Sent"),
            NotificationStatus::Failed => write!(f, "Failed"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: u64,
    pub price: f64,
    pub daily_percentage_change: f64,
    pub trading_volume: f64,
    pub status: NotificationStatus,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Body handed to the delivery capability.
    pub fn render_body(&self) -> String {
        format!(
            "BTC price: {:.2}, daily change: {:.2}%, trading volume: {:.2}",
            self.price, self.daily_percentage_change, self.trading_volume
        )
    }
}
