//! Entity trait: something that keeps its identity while its state changes.

/// A seat stays the same seat whether it is available, selected or booked;
/// its identity is what [`Entity::id`] returns.
pub trait Entity {
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> &Self::Id;
}
