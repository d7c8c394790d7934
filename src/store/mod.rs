//! Persistent storage for templates, admin users, and the audit log.

mod backend;
mod factory;
mod memory_backend;
mod postgres_backend;

pub use backend::{
    audit_details, AdminUser, AuditAction, AuditEntry, StoreBackend, StoreError,
};
pub use factory::create_store;
pub use memory_backend::MemoryStore;
pub use postgres_backend::PostgresStore;
