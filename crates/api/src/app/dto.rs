use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use parcelhub_core::DomainError;
use parcelhub_infra::{DefaultChange, PickupResolution};
use parcelhub_warehouses::{Address, ContactPerson, SupportContact, Warehouse, WarehouseDetails, WarehouseId, WarehousePatch};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateWarehouseRequest {
    #[serde(flatten)]
    pub details: WarehouseDetails,
    /// Ask for the new warehouse to become the default.
    #[serde(default)]
    pub is_default: bool,
}

/// Partial update. An absent key keeps the value; `null` clears an optional field.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateWarehouseRequest {
    pub name: Option<String>,
    pub title: Option<String>,
    pub contact_person: Option<ContactPerson>,
    pub address: Option<Address>,
    #[serde(default, deserialize_with = "double_option")]
    pub return_address: Option<Option<Address>>,
    #[serde(default, deserialize_with = "double_option")]
    pub gstin: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub support_contact: Option<Option<SupportContact>>,
    #[serde(default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
    /// Read-only: any presence, `null` included, is rejected downstream.
    #[serde(default, deserialize_with = "double_option")]
    pub is_default: Option<Option<bool>>,
    #[serde(default, deserialize_with = "double_option")]
    pub is_active: Option<Option<bool>>,
}

impl From<UpdateWarehouseRequest> for WarehousePatch {
    fn from(req: UpdateWarehouseRequest) -> Self {
        WarehousePatch {
            name: req.name,
            title: req.title,
            contact_person: req.contact_person,
            address: req.address,
            return_address: req.return_address,
            gstin: req.gstin,
            support_contact: req.support_contact,
            notes: req.notes,
            is_default: req.is_default.map(Option::unwrap_or_default),
            is_active: req.is_active.map(Option::unwrap_or_default),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    pub active: bool,
}

/// A misspelled key must not silently fall back to the default warehouse.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResolvePickupRequest {
    #[serde(default)]
    pub warehouse_id: Option<String>,
}

/// Present-but-null becomes `Some(None)`; a missing key stays `None` via `#[serde(default)]`.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

pub fn parse_warehouse_id(raw: &str) -> Result<WarehouseId, DomainError> {
    raw.parse::<WarehouseId>()
        .map_err(|_| DomainError::invalid_id(format!("'{raw}' is not a valid warehouse id")))
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct WarehouseList {
    pub items: Vec<Warehouse>,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub id: WarehouseId,
    pub deleted: bool,
}

#[derive(Debug, Serialize)]
pub struct DefaultChangedResponse {
    pub default: Warehouse,
    pub previous_default: Option<Warehouse>,
}

impl From<DefaultChange> for DefaultChangedResponse {
    fn from(change: DefaultChange) -> Self {
        Self {
            default: change.default,
            previous_default: change.previous_default,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PickupResponse {
    pub warehouse: Warehouse,
    pub shipment_ref: Uuid,
}

impl From<PickupResolution> for PickupResponse {
    fn from(resolution: PickupResolution) -> Self {
        Self {
            warehouse: resolution.warehouse,
            shipment_ref: resolution.shipment_ref,
        }
    }
}
