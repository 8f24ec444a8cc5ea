pub mod notification_dto;
pub mod notification_models;
pub mod notification_service;
pub mod notification_store;

pub use notification_dto::CreateNotificationRequest;
pub use notification_models::{Notification, NotificationStatus};
pub use notification_service::NotificationService;
pub use notification_store::NotificationStore;
