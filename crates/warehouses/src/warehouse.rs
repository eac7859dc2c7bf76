use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use parcelhub_core::{AggregateId, DomainResult, Entity, FieldErrorCode, FieldErrors};

use crate::address::{Address, ContactPerson, SupportContact};
use crate::validation::{MAX_NAME_LEN, MAX_NOTES_LEN, MAX_TITLE_LEN, optional_gstin, optional_text, required_text};

/// Warehouse identifier (unique within and across accounts).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WarehouseId(pub AggregateId);

impl WarehouseId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }

    pub fn generate() -> Self {
        Self(AggregateId::new())
    }
}

impl core::fmt::Display for WarehouseId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl core::str::FromStr for WarehouseId {
    type Err = parcelhub_core::DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<AggregateId>().map(Self)
    }
}

/// The caller-editable part of a warehouse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarehouseDetails {
    /// Short internal label.
    pub name: String,
    /// Label shown to operators.
    pub title: String,
    pub contact_person: ContactPerson,
    pub address: Address,
    /// `None` means the pickup address doubles as the return address.
    pub return_address: Option<Address>,
    pub gstin: Option<String>,
    pub support_contact: Option<SupportContact>,
    pub notes: Option<String>,
}

impl WarehouseDetails {
    /// Normalize and validate every field, reporting all failures together.
    pub fn normalized(&self) -> DomainResult<WarehouseDetails> {
        let mut errors = FieldErrors::new();
        let details = self.normalize_into(&mut errors);
        errors.into_result()?;
        Ok(details)
    }

    fn normalize_into(&self, errors: &mut FieldErrors) -> WarehouseDetails {
        WarehouseDetails {
            name: required_text(errors, "name", &self.name, MAX_NAME_LEN),
            title: required_text(errors, "title", &self.title, MAX_TITLE_LEN),
            contact_person: self.contact_person.normalized("contact_person", errors),
            address: self.address.normalized("address", errors),
            return_address: self
                .return_address
                .as_ref()
                .map(|a| a.normalized("return_address", errors)),
            gstin: optional_gstin(errors, "gstin", self.gstin.as_deref()),
            support_contact: self
                .support_contact
                .as_ref()
                .and_then(|s| s.normalized("support_contact", errors)),
            notes: optional_text(errors, "notes", self.notes.as_deref(), MAX_NOTES_LEN),
        }
    }

    /// Merge a partial update over these details and re-validate the result.
    ///
    /// `is_default` / `is_active` are owned by dedicated operations; a patch that
    /// carries either is rejected as `read_only`.
    pub fn patched(&self, patch: &WarehousePatch) -> DomainResult<WarehouseDetails> {
        let mut errors = FieldErrors::new();
        if patch.is_default.is_some() {
            errors.push(
                "is_default",
                FieldErrorCode::ReadOnly,
                "cannot be changed by update; use the set-default operation",
            );
        }
        if patch.is_active.is_some() {
            errors.push(
                "is_active",
                FieldErrorCode::ReadOnly,
                "cannot be changed by update; use the set-active operation",
            );
        }

        let mut merged = self.clone();
        if let Some(name) = &patch.name {
            merged.name = name.clone();
        }
        if let Some(title) = &patch.title {
            merged.title = title.clone();
        }
        if let Some(contact) = &patch.contact_person {
            merged.contact_person = contact.clone();
        }
        if let Some(address) = &patch.address {
            merged.address = address.clone();
        }
        if let Some(return_address) = &patch.return_address {
            merged.return_address = return_address.clone();
        }
        if let Some(gstin) = &patch.gstin {
            merged.gstin = gstin.clone();
        }
        if let Some(support) = &patch.support_contact {
            merged.support_contact = support.clone();
        }
        if let Some(notes) = &patch.notes {
            merged.notes = notes.clone();
        }

        let details = merged.normalize_into(&mut errors);
        errors.into_result()?;
        Ok(details)
    }

    /// Address returns are delivered to.
    pub fn effective_return_address(&self) -> &Address {
        self.return_address.as_ref().unwrap_or(&self.address)
    }
}

/// Partial update. Outer `None` keeps the current value; for optional fields
/// `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarehousePatch {
    pub name: Option<String>,
    pub title: Option<String>,
    pub contact_person: Option<ContactPerson>,
    pub address: Option<Address>,
    pub return_address: Option<Option<Address>>,
    pub gstin: Option<Option<String>>,
    pub support_contact: Option<Option<SupportContact>>,
    pub notes: Option<Option<String>>,
    pub is_default: Option<bool>,
    pub is_active: Option<bool>,
}

/// A registered pickup/return location, as stored in the account's directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warehouse {
    pub id: WarehouseId,
    #[serde(flatten)]
    pub details: WarehouseDetails,
    pub is_default: bool,
    pub is_active: bool,
    /// Shipments that picked up from here; a referenced warehouse is never deleted.
    pub shipment_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Warehouse {
    /// Bump `updated_at` without ever moving it backwards.
    pub(crate) fn touch(&mut self, at: DateTime<Utc>) {
        if at > self.updated_at {
            self.updated_at = at;
        }
    }

    pub fn is_referenced(&self) -> bool {
        self.shipment_count > 0
    }
}

impl Entity for Warehouse {
    type Id = WarehouseId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
