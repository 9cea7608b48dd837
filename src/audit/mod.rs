// Declare submodules
pub mod audit_dto;
pub mod audit_handlers;
pub mod audit_models;
pub mod audit_repository;
pub mod audit_service;

// Re-export public items
pub use audit_models::{AuditAction, AuditEvent, EntityKind, MutationEvent};
pub use audit_repository::AuditRepository;
pub use audit_service::AuditService;
