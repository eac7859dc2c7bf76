//! Append-only event store boundary.
//!
//! Tenant-scoped event streams behind an async trait, with an in-memory store for
//! tests and single-process deployments and a Postgres store behind the
//! `postgres` feature.

pub mod in_memory;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryEventStore;
#[cfg(feature = "postgres")]
pub use postgres::PostgresEventStore;
pub use r#trait::{EventStore, EventStoreError, StoredEvent, UncommittedEvent};
