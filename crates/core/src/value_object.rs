//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects have no identity; two instances with the same attribute values are
/// the same value. A postal address is the canonical example: a pickup address and a
/// return address share the type and differ only in their contents.
///
/// To "modify" a value object, build a new one.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
