//! Shared building blocks for the dealer desk engine.
//!
//! Pure domain primitives only: errors, identifiers and the marker traits the
//! catalog and configurator crates build on.

pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{IdempotencyKey, ProductId, RuleId};
pub use value_object::ValueObject;
