//! Product catalog side of the configurator.
//!
//! Rules (which sizes, cut styles and fringe options a product family allows),
//! the product detail record the collaborator serves, and the `RuleCatalog`
//! lookup that ties them together. Pure data + lookup; fetching goes through
//! the `CatalogSource` trait.

pub mod catalog;
pub mod product;
pub mod rule;
pub mod source;

pub use catalog::{
    ActiveRule, DEFAULT_MISSING_RULE_POLICY, Enforcement, FALLBACK_RULE_ID, MissingRulePolicy,
    ParsePolicyError, ProductContext, RuleCatalog, load_product_context, resolve_rule,
};
pub use product::{ProductDetail, ProductPricing};
pub use rule::{CutKind, CutType, ProductRule, SizeOption};
pub use source::{CatalogError, CatalogSource};
