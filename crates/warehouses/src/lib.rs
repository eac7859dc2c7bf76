//! Warehouse directory domain module (event-sourced).
//!
//! A seller account registers pickup/return addresses ("warehouses"); exactly one
//! active warehouse is the default used when a shipment names none. The whole
//! directory of one account is a single aggregate so the default invariant is
//! decided against one consistent snapshot.
//!
//! Pure domain logic only: no IO, no HTTP, no storage.

pub mod address;
#[cfg(test)]
mod fixtures;
pub mod directory;
pub mod validation;
pub mod warehouse;

pub use address::{Address, ContactPerson, SupportContact};
pub use directory::{
    CreateWarehouse, DefaultWarehouseChanged, DeleteWarehouse, DirectoryId, PickupResolved,
    ResolvePickup, SetDefaultWarehouse, SetWarehouseActive, UpdateWarehouse, WarehouseActivationChanged,
    WarehouseCreated, WarehouseDeleted, WarehouseDirectory, WarehouseDirectoryCommand,
    WarehouseDirectoryEvent, WarehouseUpdated,
};
pub use warehouse::{Warehouse, WarehouseDetails, WarehouseId, WarehousePatch};
