//! Entity trait: identity that survives attribute changes.

/// Entity marker + minimal interface.
///
/// Product rules and product details are entities: two rules with the same
/// `RuleId` describe the same product family even if their options differ
/// between catalog loads.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
