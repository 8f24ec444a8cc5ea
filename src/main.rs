mod config;
mod delivery;
mod error;
mod notification;

use chrono::{Duration, Utc};
use config::Config;
use delivery::EmailDelivery;
use notification::{CreateNotificationRequest, NotificationService, NotificationStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,crypto_notifier=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    // Wire the store, delivery capability, and service
    let store = NotificationStore::new();
    let service = NotificationService::new(store, EmailDelivery::new(), &config);

    // Walk the notification lifecycle end to end
    let id1 = service.create_notification(CreateNotificationRequest {
        price: 71000.0,
        daily_percentage_change: 1.5,
        trading_volume: 5_000_000.0,
    });

    let now = Utc::now();
    let from = now - Duration::hours(1);
    let to = now + Duration::hours(1);
    tracing::info!("Notifications: {:?}", service.list_notifications(from, to));

    service.send_notification(id1).await?;
    tracing::info!("Notifications: {:?}", service.list_notifications(from, to));
    service.send_notification(id1).await?;

    let id2 = service.create_notification(CreateNotificationRequest {
        price: 72000.0,
        daily_percentage_change: 1.7,
        trading_volume: 50_000_000.0,
    });

    tracing::info!(
        "Cancel {}: {}",
        id2,
        service.cancel_notification(id2).await?
    );
    tracing::info!(
        "Cancel {}: {}",
        id1,
        service.cancel_notification(id1).await?
    );
    tracing::info!("Notifications: {:?}", service.list_notifications(from, to));

    Ok(())
}
