//! Warehouse directory service: the one writer of an account's warehouses.
//!
//! Each account owns a single `WarehouseDirectory` stream. Reads rehydrate it;
//! writes go through the [`CommandDispatcher`] with an exact expected version.

use chrono::Utc;
use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::{info, warn};
use uuid::Uuid;

use parcelhub_core::{AggregateId, TenantId};
use parcelhub_events::{EventBus, EventEnvelope};
use parcelhub_warehouses::{
    CreateWarehouse, DeleteWarehouse, DirectoryId, ResolvePickup, SetDefaultWarehouse, SetWarehouseActive,
    UpdateWarehouse, Warehouse, WarehouseDetails, WarehouseDirectory, WarehouseDirectoryCommand,
    WarehouseDirectoryEvent, WarehouseId, WarehousePatch,
};

use crate::command_dispatcher::{CommandDispatcher, DispatchError, Dispatched};
use crate::event_store::EventStore;

/// Stream type of the per-account directory.
pub const AGGREGATE_TYPE: &str = "warehouses.directory";

/// Result of promoting a warehouse to default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DefaultChange {
    pub default: Warehouse,
    /// The warehouse that lost the flag; `None` when nothing changed.
    pub previous_default: Option<Warehouse>,
}

/// The pickup point chosen for a shipment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PickupResolution {
    pub warehouse: Warehouse,
    pub shipment_ref: Uuid,
}

pub struct WarehouseDirectoryService<S, B> {
    dispatcher: CommandDispatcher<S, B>,
}

impl<S, B> WarehouseDirectoryService<S, B> {
    pub fn new(store: S, bus: B) -> Self {
        Self {
            dispatcher: CommandDispatcher::new(store, bus),
        }
    }

    pub fn bus(&self) -> &B {
        self.dispatcher.bus()
    }
}

fn stream_id(tenant_id: TenantId) -> AggregateId {
    DirectoryId::for_tenant(tenant_id).0
}

fn make_directory(tenant_id: TenantId, _: AggregateId) -> WarehouseDirectory {
    WarehouseDirectory::empty(DirectoryId::for_tenant(tenant_id))
}

impl<S, B> WarehouseDirectoryService<S, B>
where
    S: EventStore,
    B: EventBus<EventEnvelope<JsonValue>>,
{
    async fn directory(&self, tenant_id: TenantId) -> Result<WarehouseDirectory, DispatchError> {
        self.dispatcher
            .load(tenant_id, stream_id(tenant_id), make_directory)
            .await
    }

    async fn execute(
        &self,
        tenant_id: TenantId,
        command: WarehouseDirectoryCommand,
    ) -> Result<Dispatched<WarehouseDirectory>, DispatchError> {
        let operation = command_name(&command);

        match self
            .dispatcher
            .dispatch(tenant_id, stream_id(tenant_id), AGGREGATE_TYPE, command, make_directory)
            .await
        {
            Ok(done) => {
                if let Some(event) = done.events.first() {
                    info!(
                        tenant_id = %tenant_id,
                        warehouse_id = %event.warehouse_id(),
                        operation,
                        events_committed = done.committed.len(),
                        "warehouse directory updated"
                    );
                }
                Ok(done)
            }
            Err(err) => {
                warn!(tenant_id = %tenant_id, operation, error = %err, "warehouse command rejected");
                Err(err)
            }
        }
    }

    /// All warehouses of the account: default first, then newest first.
    pub async fn list(&self, tenant_id: TenantId) -> Result<Vec<Warehouse>, DispatchError> {
        let directory = self.directory(tenant_id).await?;
        Ok(directory.list().into_iter().cloned().collect())
    }

    pub async fn get(&self, tenant_id: TenantId, id: WarehouseId) -> Result<Warehouse, DispatchError> {
        let directory = self.directory(tenant_id).await?;
        directory.get(id).cloned().ok_or(DispatchError::NotFound)
    }

    /// Register a warehouse. The account's first warehouse always becomes default.
    pub async fn create(
        &self,
        tenant_id: TenantId,
        details: WarehouseDetails,
        make_default: bool,
    ) -> Result<Warehouse, DispatchError> {
        let warehouse_id = WarehouseId::generate();
        let done = self
            .execute(
                tenant_id,
                WarehouseDirectoryCommand::CreateWarehouse(CreateWarehouse {
                    tenant_id,
                    warehouse_id,
                    details,
                    make_default,
                    occurred_at: Utc::now(),
                }),
            )
            .await?;

        required(&done.aggregate, warehouse_id)
    }

    pub async fn update(
        &self,
        tenant_id: TenantId,
        id: WarehouseId,
        patch: WarehousePatch,
    ) -> Result<Warehouse, DispatchError> {
        let done = self
            .execute(
                tenant_id,
                WarehouseDirectoryCommand::UpdateWarehouse(UpdateWarehouse {
                    tenant_id,
                    warehouse_id: id,
                    patch,
                    occurred_at: Utc::now(),
                }),
            )
            .await?;

        required(&done.aggregate, id)
    }

    pub async fn delete(&self, tenant_id: TenantId, id: WarehouseId) -> Result<(), DispatchError> {
        self.execute(
            tenant_id,
            WarehouseDirectoryCommand::DeleteWarehouse(DeleteWarehouse {
                tenant_id,
                warehouse_id: id,
                occurred_at: Utc::now(),
            }),
        )
        .await?;
        Ok(())
    }

    /// Make `id` the default. Calling it on the current default changes nothing.
    pub async fn set_default(&self, tenant_id: TenantId, id: WarehouseId) -> Result<DefaultChange, DispatchError> {
        let done = self
            .execute(
                tenant_id,
                WarehouseDirectoryCommand::SetDefaultWarehouse(SetDefaultWarehouse {
                    tenant_id,
                    warehouse_id: id,
                    occurred_at: Utc::now(),
                }),
            )
            .await?;

        let previous_default = done.events.iter().find_map(|e| match e {
            WarehouseDirectoryEvent::DefaultWarehouseChanged(changed) => changed.previous_default,
            _ => None,
        });

        Ok(DefaultChange {
            default: required(&done.aggregate, id)?,
            previous_default: previous_default.and_then(|prev| done.aggregate.get(prev).cloned()),
        })
    }

    pub async fn set_active(
        &self,
        tenant_id: TenantId,
        id: WarehouseId,
        active: bool,
    ) -> Result<Warehouse, DispatchError> {
        let done = self
            .execute(
                tenant_id,
                WarehouseDirectoryCommand::SetWarehouseActive(SetWarehouseActive {
                    tenant_id,
                    warehouse_id: id,
                    active,
                    occurred_at: Utc::now(),
                }),
            )
            .await?;

        required(&done.aggregate, id)
    }

    /// Pick the pickup warehouse for a new shipment and record the reference.
    ///
    /// `None` selects the account's default.
    pub async fn resolve_pickup(
        &self,
        tenant_id: TenantId,
        id: Option<WarehouseId>,
    ) -> Result<PickupResolution, DispatchError> {
        let shipment_ref = Uuid::now_v7();
        let done = self
            .execute(
                tenant_id,
                WarehouseDirectoryCommand::ResolvePickup(ResolvePickup {
                    tenant_id,
                    warehouse_id: id,
                    shipment_ref,
                    occurred_at: Utc::now(),
                }),
            )
            .await?;

        let chosen = done
            .events
            .first()
            .map(WarehouseDirectoryEvent::warehouse_id)
            .ok_or_else(|| DispatchError::Conflict("no pickup warehouse was selected".to_string()))?;

        Ok(PickupResolution {
            warehouse: required(&done.aggregate, chosen)?,
            shipment_ref,
        })
    }
}

fn required(directory: &WarehouseDirectory, id: WarehouseId) -> Result<Warehouse, DispatchError> {
    directory.get(id).cloned().ok_or(DispatchError::NotFound)
}

fn command_name(command: &WarehouseDirectoryCommand) -> &'static str {
    match command {
        WarehouseDirectoryCommand::CreateWarehouse(_) => "create",
        WarehouseDirectoryCommand::UpdateWarehouse(_) => "update",
        WarehouseDirectoryCommand::DeleteWarehouse(_) => "delete",
        WarehouseDirectoryCommand::SetDefaultWarehouse(_) => "set_default",
        WarehouseDirectoryCommand::SetWarehouseActive(_) => "set_active",
        WarehouseDirectoryCommand::ResolvePickup(_) => "resolve_pickup",
    }
}
