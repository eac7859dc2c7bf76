use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use parcelhub_core::{Aggregate, AggregateId, AggregateRoot, DomainError, TenantId};
use parcelhub_events::Event;

use crate::warehouse::{Warehouse, WarehouseDetails, WarehouseId, WarehousePatch};

/// Directory identifier. One directory per account, so the id is derived from the
/// account id and never chosen by callers.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DirectoryId(pub AggregateId);

impl DirectoryId {
    pub fn for_tenant(tenant_id: TenantId) -> Self {
        Self(AggregateId::from_uuid(*tenant_id.as_uuid()))
    }
}

impl core::fmt::Display for DirectoryId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Aggregate root: every warehouse of one account.
///
/// Invariant (after every applied event): at most one warehouse is default, the
/// default is active, and if any warehouse is active exactly one is default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarehouseDirectory {
    id: DirectoryId,
    tenant_id: Option<TenantId>,
    warehouses: Vec<Warehouse>,
    version: u64,
}

impl WarehouseDirectory {
    /// Create an empty directory instance for rehydration.
    pub fn empty(id: DirectoryId) -> Self {
        Self {
            id,
            tenant_id: None,
            warehouses: Vec::new(),
            version: 0,
        }
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    pub fn get(&self, id: WarehouseId) -> Option<&Warehouse> {
        self.warehouses.iter().find(|w| w.id == id)
    }

    /// Warehouses in display order: default first, then newest first.
    ///
    /// Ties on `created_at` fall back to the (time-ordered) id so the order is
    /// identical across calls.
    pub fn list(&self) -> Vec<&Warehouse> {
        let mut items: Vec<&Warehouse> = self.warehouses.iter().collect();
        items.sort_by(|a, b| {
            b.is_default
                .cmp(&a.is_default)
                .then_with(|| b.created_at.cmp(&a.created_at))
                .then_with(|| b.id.cmp(&a.id))
        });
        items
    }

    pub fn default_warehouse(&self) -> Option<&Warehouse> {
        self.warehouses.iter().find(|w| w.is_default)
    }

    pub fn len(&self) -> usize {
        self.warehouses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.warehouses.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.warehouses.iter().filter(|w| w.is_active).count()
    }

    /// Whether the default-uniqueness invariant currently holds.
    pub fn default_invariant_holds(&self) -> bool {
        let defaults: Vec<&Warehouse> = self.warehouses.iter().filter(|w| w.is_default).collect();
        let active = self.active_count();
        defaults.len() <= 1
            && defaults.iter().all(|w| w.is_active)
            && (active == 0 || defaults.len() == 1)
    }

    fn require(&self, id: WarehouseId) -> Result<&Warehouse, DomainError> {
        self.get(id).ok_or_else(DomainError::not_found)
    }

    fn get_mut(&mut self, id: WarehouseId) -> Option<&mut Warehouse> {
        self.warehouses.iter_mut().find(|w| w.id == id)
    }

    fn promote(&mut self, id: WarehouseId, at: DateTime<Utc>) {
        for w in &mut self.warehouses {
            let should_be_default = w.id == id;
            if w.is_default != should_be_default {
                w.is_default = should_be_default;
                w.touch(at);
            }
        }
    }

    fn clear_default(&mut self, at: DateTime<Utc>) {
        for w in self.warehouses.iter_mut().filter(|w| w.is_default) {
            w.is_default = false;
            w.touch(at);
        }
    }
}

impl AggregateRoot for WarehouseDirectory {
    type Id = DirectoryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateWarehouse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateWarehouse {
    pub tenant_id: TenantId,
    pub warehouse_id: WarehouseId,
    pub details: WarehouseDetails,
    /// Caller asks for the new warehouse to become default. Ignored (forced true)
    /// when the account has no default yet.
    pub make_default: bool,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateWarehouse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateWarehouse {
    pub tenant_id: TenantId,
    pub warehouse_id: WarehouseId,
    pub patch: WarehousePatch,
    pub occurred_at: DateTime<Utc>,
}

/// Command: DeleteWarehouse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteWarehouse {
    pub tenant_id: TenantId,
    pub warehouse_id: WarehouseId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SetDefaultWarehouse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetDefaultWarehouse {
    pub tenant_id: TenantId,
    pub warehouse_id: WarehouseId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SetWarehouseActive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetWarehouseActive {
    pub tenant_id: TenantId,
    pub warehouse_id: WarehouseId,
    pub active: bool,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ResolvePickup.
///
/// Issued at shipment creation. `warehouse_id = None` means "use the default".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvePickup {
    pub tenant_id: TenantId,
    pub warehouse_id: Option<WarehouseId>,
    pub shipment_ref: Uuid,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarehouseDirectoryCommand {
    CreateWarehouse(CreateWarehouse),
    UpdateWarehouse(UpdateWarehouse),
    DeleteWarehouse(DeleteWarehouse),
    SetDefaultWarehouse(SetDefaultWarehouse),
    SetWarehouseActive(SetWarehouseActive),
    ResolvePickup(ResolvePickup),
}

impl WarehouseDirectoryCommand {
    pub fn tenant_id(&self) -> TenantId {
        match self {
            WarehouseDirectoryCommand::CreateWarehouse(c) => c.tenant_id,
            WarehouseDirectoryCommand::UpdateWarehouse(c) => c.tenant_id,
            WarehouseDirectoryCommand::DeleteWarehouse(c) => c.tenant_id,
            WarehouseDirectoryCommand::SetDefaultWarehouse(c) => c.tenant_id,
            WarehouseDirectoryCommand::SetWarehouseActive(c) => c.tenant_id,
            WarehouseDirectoryCommand::ResolvePickup(c) => c.tenant_id,
        }
    }
}

/// Event: WarehouseCreated.
///
/// When `is_default` is set, every other warehouse loses its default flag as part
/// of this same event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarehouseCreated {
    pub tenant_id: TenantId,
    pub warehouse_id: WarehouseId,
    pub details: WarehouseDetails,
    pub is_default: bool,
    pub previous_default: Option<WarehouseId>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: WarehouseUpdated (carries the full normalized details).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarehouseUpdated {
    pub tenant_id: TenantId,
    pub warehouse_id: WarehouseId,
    pub details: WarehouseDetails,
    pub occurred_at: DateTime<Utc>,
}

/// Event: WarehouseDeleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarehouseDeleted {
    pub tenant_id: TenantId,
    pub warehouse_id: WarehouseId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: DefaultWarehouseChanged (promotion and demotion in one fact).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultWarehouseChanged {
    pub tenant_id: TenantId,
    pub warehouse_id: WarehouseId,
    pub previous_default: Option<WarehouseId>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: WarehouseActivationChanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarehouseActivationChanged {
    pub tenant_id: TenantId,
    pub warehouse_id: WarehouseId,
    pub active: bool,
    /// Set when activation had to restore a missing default.
    pub promoted_to_default: bool,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PickupResolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickupResolved {
    pub tenant_id: TenantId,
    pub warehouse_id: WarehouseId,
    pub shipment_ref: Uuid,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarehouseDirectoryEvent {
    WarehouseCreated(WarehouseCreated),
    WarehouseUpdated(WarehouseUpdated),
    WarehouseDeleted(WarehouseDeleted),
    DefaultWarehouseChanged(DefaultWarehouseChanged),
    WarehouseActivationChanged(WarehouseActivationChanged),
    PickupResolved(PickupResolved),
}

impl WarehouseDirectoryEvent {
    pub fn tenant_id(&self) -> TenantId {
        match self {
            WarehouseDirectoryEvent::WarehouseCreated(e) => e.tenant_id,
            WarehouseDirectoryEvent::WarehouseUpdated(e) => e.tenant_id,
            WarehouseDirectoryEvent::WarehouseDeleted(e) => e.tenant_id,
            WarehouseDirectoryEvent::DefaultWarehouseChanged(e) => e.tenant_id,
            WarehouseDirectoryEvent::WarehouseActivationChanged(e) => e.tenant_id,
            WarehouseDirectoryEvent::PickupResolved(e) => e.tenant_id,
        }
    }

    /// The warehouse this event is about.
    pub fn warehouse_id(&self) -> WarehouseId {
        match self {
            WarehouseDirectoryEvent::WarehouseCreated(e) => e.warehouse_id,
            WarehouseDirectoryEvent::WarehouseUpdated(e) => e.warehouse_id,
            WarehouseDirectoryEvent::WarehouseDeleted(e) => e.warehouse_id,
            WarehouseDirectoryEvent::DefaultWarehouseChanged(e) => e.warehouse_id,
            WarehouseDirectoryEvent::WarehouseActivationChanged(e) => e.warehouse_id,
            WarehouseDirectoryEvent::PickupResolved(e) => e.warehouse_id,
        }
    }
}

impl Event for WarehouseDirectoryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            WarehouseDirectoryEvent::WarehouseCreated(_) => "warehouses.warehouse.created",
            WarehouseDirectoryEvent::WarehouseUpdated(_) => "warehouses.warehouse.updated",
            WarehouseDirectoryEvent::WarehouseDeleted(_) => "warehouses.warehouse.deleted",
            WarehouseDirectoryEvent::DefaultWarehouseChanged(_) => "warehouses.default.changed",
            WarehouseDirectoryEvent::WarehouseActivationChanged(_) => "warehouses.warehouse.activation_changed",
            WarehouseDirectoryEvent::PickupResolved(_) => "warehouses.pickup.resolved",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            WarehouseDirectoryEvent::WarehouseCreated(e) => e.occurred_at,
            WarehouseDirectoryEvent::WarehouseUpdated(e) => e.occurred_at,
            WarehouseDirectoryEvent::WarehouseDeleted(e) => e.occurred_at,
            WarehouseDirectoryEvent::DefaultWarehouseChanged(e) => e.occurred_at,
            WarehouseDirectoryEvent::WarehouseActivationChanged(e) => e.occurred_at,
            WarehouseDirectoryEvent::PickupResolved(e) => e.occurred_at,
        }
    }
}

impl Aggregate for WarehouseDirectory {
    type Command = WarehouseDirectoryCommand;
    type Event = WarehouseDirectoryEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        if self.tenant_id.is_none() {
            self.tenant_id = Some(event.tenant_id());
        }

        match event {
            WarehouseDirectoryEvent::WarehouseCreated(e) => {
                if e.is_default {
                    self.clear_default(e.occurred_at);
                }
                self.warehouses.push(Warehouse {
                    id: e.warehouse_id,
                    details: e.details.clone(),
                    is_default: e.is_default,
                    is_active: true,
                    shipment_count: 0,
                    created_at: e.occurred_at,
                    updated_at: e.occurred_at,
                });
            }
            WarehouseDirectoryEvent::WarehouseUpdated(e) => {
                if let Some(w) = self.get_mut(e.warehouse_id) {
                    w.details = e.details.clone();
                    w.touch(e.occurred_at);
                }
            }
            WarehouseDirectoryEvent::WarehouseDeleted(e) => {
                self.warehouses.retain(|w| w.id != e.warehouse_id);
            }
            WarehouseDirectoryEvent::DefaultWarehouseChanged(e) => {
                self.promote(e.warehouse_id, e.occurred_at);
            }
            WarehouseDirectoryEvent::WarehouseActivationChanged(e) => {
                if let Some(w) = self.get_mut(e.warehouse_id) {
                    w.is_active = e.active;
                    w.touch(e.occurred_at);
                }
                if e.promoted_to_default {
                    self.promote(e.warehouse_id, e.occurred_at);
                }
            }
            WarehouseDirectoryEvent::PickupResolved(e) => {
                if let Some(w) = self.get_mut(e.warehouse_id) {
                    w.shipment_count += 1;
                }
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        self.ensure_tenant(command.tenant_id())?;

        match command {
            WarehouseDirectoryCommand::CreateWarehouse(cmd) => self.handle_create(cmd),
            WarehouseDirectoryCommand::UpdateWarehouse(cmd) => self.handle_update(cmd),
            WarehouseDirectoryCommand::DeleteWarehouse(cmd) => self.handle_delete(cmd),
            WarehouseDirectoryCommand::SetDefaultWarehouse(cmd) => self.handle_set_default(cmd),
            WarehouseDirectoryCommand::SetWarehouseActive(cmd) => self.handle_set_active(cmd),
            WarehouseDirectoryCommand::ResolvePickup(cmd) => self.handle_resolve_pickup(cmd),
        }
    }
}

impl WarehouseDirectory {
    /// Another account's directory looks exactly like a missing record.
    fn ensure_tenant(&self, tenant_id: TenantId) -> Result<(), DomainError> {
        match self.tenant_id {
            Some(owner) if owner != tenant_id => Err(DomainError::not_found()),
            _ => Ok(()),
        }
    }

    fn handle_create(&self, cmd: &CreateWarehouse) -> Result<Vec<WarehouseDirectoryEvent>, DomainError> {
        if self.get(cmd.warehouse_id).is_some() {
            return Err(DomainError::conflict("warehouse already exists"));
        }

        let details = cmd.details.normalized()?;

        let current_default = self.default_warehouse().map(|w| w.id);
        let is_default = current_default.is_none() || cmd.make_default;

        Ok(vec![WarehouseDirectoryEvent::WarehouseCreated(WarehouseCreated {
            tenant_id: cmd.tenant_id,
            warehouse_id: cmd.warehouse_id,
            details,
            is_default,
            previous_default: if is_default { current_default } else { None },
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_update(&self, cmd: &UpdateWarehouse) -> Result<Vec<WarehouseDirectoryEvent>, DomainError> {
        let current = self.require(cmd.warehouse_id)?;
        let details = current.details.patched(&cmd.patch)?;

        if details == current.details {
            return Ok(vec![]);
        }

        Ok(vec![WarehouseDirectoryEvent::WarehouseUpdated(WarehouseUpdated {
            tenant_id: cmd.tenant_id,
            warehouse_id: cmd.warehouse_id,
            details,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_delete(&self, cmd: &DeleteWarehouse) -> Result<Vec<WarehouseDirectoryEvent>, DomainError> {
        let target = self.require(cmd.warehouse_id)?;

        if target.is_default
            && self
                .warehouses
                .iter()
                .any(|w| w.id != target.id && w.is_active)
        {
            return Err(DomainError::conflict(
                "cannot delete the default warehouse while other active warehouses exist; set a new default first",
            ));
        }

        if target.is_referenced() {
            return Err(DomainError::conflict(format!(
                "warehouse is referenced by {} shipment(s); deactivate it instead of deleting",
                target.shipment_count
            )));
        }

        Ok(vec![WarehouseDirectoryEvent::WarehouseDeleted(WarehouseDeleted {
            tenant_id: cmd.tenant_id,
            warehouse_id: cmd.warehouse_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_set_default(
        &self,
        cmd: &SetDefaultWarehouse,
    ) -> Result<Vec<WarehouseDirectoryEvent>, DomainError> {
        let target = self.require(cmd.warehouse_id)?;

        if !target.is_active {
            return Err(DomainError::conflict("an inactive warehouse cannot become the default"));
        }
        if target.is_default {
            return Ok(vec![]);
        }

        Ok(vec![WarehouseDirectoryEvent::DefaultWarehouseChanged(DefaultWarehouseChanged {
            tenant_id: cmd.tenant_id,
            warehouse_id: cmd.warehouse_id,
            previous_default: self.default_warehouse().map(|w| w.id),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_set_active(
        &self,
        cmd: &SetWarehouseActive,
    ) -> Result<Vec<WarehouseDirectoryEvent>, DomainError> {
        let target = self.require(cmd.warehouse_id)?;

        if target.is_active == cmd.active {
            return Ok(vec![]);
        }
        if !cmd.active && target.is_default {
            return Err(DomainError::conflict(
                "cannot deactivate the default warehouse; set a new default first",
            ));
        }

        let promoted_to_default = cmd.active && self.default_warehouse().is_none();

        Ok(vec![WarehouseDirectoryEvent::WarehouseActivationChanged(
            WarehouseActivationChanged {
                tenant_id: cmd.tenant_id,
                warehouse_id: cmd.warehouse_id,
                active: cmd.active,
                promoted_to_default,
                occurred_at: cmd.occurred_at,
            },
        )])
    }

    fn handle_resolve_pickup(&self, cmd: &ResolvePickup) -> Result<Vec<WarehouseDirectoryEvent>, DomainError> {
        let chosen = match cmd.warehouse_id {
            Some(id) => {
                let w = self.require(id)?;
                if !w.is_active {
                    return Err(DomainError::conflict(
                        "warehouse is inactive and cannot be used for pickup",
                    ));
                }
                w
            }
            None => self
                .default_warehouse()
                .ok_or_else(|| DomainError::conflict("no default warehouse configured"))?,
        };

        Ok(vec![WarehouseDirectoryEvent::PickupResolved(PickupResolved {
            tenant_id: cmd.tenant_id,
            warehouse_id: chosen.id,
            shipment_ref: cmd.shipment_ref,
            occurred_at: cmd.occurred_at,
        })])
    }
}
