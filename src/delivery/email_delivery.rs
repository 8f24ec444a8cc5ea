use async_trait::async_trait;
use tracing::info;

use super::delivery_capability::DeliveryCapability;

/// Stand-in email transport: logs the outgoing message and reports success.
/// A real SMTP client slots in behind the same trait.
#[derive(Debug, Clone, Default)]
pub struct EmailDelivery;

impl EmailDelivery {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DeliveryCapability for EmailDelivery {
    async fn attempt(&self, body: &str, recipients: &[String]) -> bool {
        info!(recipients = ?recipients, "Sending email: {}", body);
        true
    }
}
