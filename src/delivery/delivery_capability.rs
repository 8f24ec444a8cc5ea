use async_trait::async_trait;

/// Boundary responsible for transmitting notification content to a set of
/// recipients. All-or-nothing: no retries, no per-recipient outcomes.
#[async_trait]
pub trait DeliveryCapability: Send + Sync {
    async fn attempt(&self, body: &str, recipients: &[String]) -> bool;
}
