//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Every persisted record (customer, product, invoice, ledger row, ...) is an
/// entity: two values with the same id are the same row, whatever their fields.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> Self::Id;
}

/// Implement [`Entity`] for a record struct with an `id` field.
#[macro_export]
macro_rules! impl_entity {
    ($t:ty, $id:ty) => {
        impl $crate::Entity for $t {
            type Id = $id;

            fn id(&self) -> Self::Id {
                self.id
            }
        }
    };
}
