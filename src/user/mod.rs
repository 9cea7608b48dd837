pub mod user_handlers;
pub mod user_models;
pub mod user_repository;

pub use user_models::{User, UserRole};
pub use user_repository::{UserDirectory, UserRepository};
