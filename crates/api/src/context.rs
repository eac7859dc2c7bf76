use parcelhub_core::TenantId;

/// The account a request acts for.
///
/// Inserted by the account middleware; every warehouse route requires it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AccountContext {
    tenant_id: TenantId,
}

impl AccountContext {
    pub fn new(tenant_id: TenantId) -> Self {
        Self { tenant_id }
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}
