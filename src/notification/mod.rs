// Declare submodules
pub mod cleanup;
pub mod fanout;
pub mod notification_dto;
pub mod notification_handlers;
pub mod notification_models;
pub mod notification_repository;
pub mod preferences;
pub mod recipients;
pub mod templates;

// Re-export public items
pub use cleanup::start_cleanup_service;
pub use fanout::FanoutService;
pub use notification_models::{
    Notification, NotificationChannel, NotificationPreference, NotificationPriority,
    NotificationType,
};
pub use notification_repository::NotificationRepository;
pub use preferences::{PreferenceFilter, PreferenceRepository};
pub use recipients::{ConcreteRecipient, RecipientResolver, RecipientSpec};
pub use templates::NotificationDraft;
