//! Domain events and their distribution.
//!
//! Events are the only way account state changes: they are appended to a stream,
//! then fanned out on a bus to whoever wants to know (change notifications).

pub mod bus;
pub mod envelope;
pub mod event;
pub mod in_memory_bus;
pub mod tenant;

pub use bus::{EventBus, Subscription};
pub use envelope::EventEnvelope;
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
pub use tenant::TenantScoped;
