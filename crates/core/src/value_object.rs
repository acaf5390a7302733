//! Value object trait: equality by value, not identity.
//!
//! Size options, cut types and price quotes have no identity of their own:
//! a 200x300 fixed size is the same option wherever it appears.

/// Marker trait for value objects.
///
/// Value objects are immutable and compared by their attribute values. To
/// "modify" one, build a new value.
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq)]
/// struct Dimensions { width: Decimal, height: Decimal }
///
/// impl ValueObject for Dimensions {}
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
