//! Infrastructure layer: event storage, command dispatch, and the warehouse
//! directory service that the API talks to.

pub mod command_dispatcher;
pub mod event_store;
pub mod warehouses;

pub use command_dispatcher::{CommandDispatcher, DispatchError};
pub use warehouses::{DefaultChange, PickupResolution, WarehouseDirectoryService};
