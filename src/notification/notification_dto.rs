use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateNotificationRequest {
    pub price: f64,
    pub daily_percentage_change: f64,
    pub trading_volume: f64,
}
