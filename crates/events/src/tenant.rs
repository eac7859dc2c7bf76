use parcelhub_core::TenantId;

use crate::EventEnvelope;

/// Messages that belong to exactly one account.
///
/// Subscribers use this to drop messages for other accounts before they reach a
/// client connection.
pub trait TenantScoped {
    fn tenant_id(&self) -> TenantId;
}

impl<E> TenantScoped for EventEnvelope<E> {
    fn tenant_id(&self) -> TenantId {
        EventEnvelope::tenant_id(self)
    }
}
