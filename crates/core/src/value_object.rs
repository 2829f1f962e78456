//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are immutable and compared by their attribute values. A seat
/// code or a booking line item is a value object; a seat or a booking is an
/// entity (it keeps its identity while its status changes).
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
