pub mod delivery_capability;
pub mod email_delivery;

pub use delivery_capability::DeliveryCapability;
pub use email_delivery::EmailDelivery;
