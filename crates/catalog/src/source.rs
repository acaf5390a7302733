//! Catalog collaborator abstraction (the remote API serving rules and products).

use async_trait::async_trait;
use thiserror::Error;

use dealerdesk_core::ProductId;

use crate::product::ProductDetail;
use crate::rule::ProductRule;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// The product does not exist on the collaborator side.
    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    /// The collaborator could not be reached or answered with an error.
    #[error("catalog unavailable: {0}")]
    Unavailable(String),

    /// The collaborator answered with a payload we could not decode.
    #[error("malformed catalog payload: {0}")]
    Decode(String),
}

/// Read-only source of rules and product details.
///
/// Implementations: the HTTP adapter in `dealerdesk-infra` and the in-memory
/// catalog used by tests and local runs.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Bulk pull of every product rule.
    async fn fetch_product_rules(&self) -> Result<Vec<ProductRule>, CatalogError>;

    /// Detail record of one product (options, rule reference, pricing).
    async fn fetch_product_detail(
        &self,
        product_id: &ProductId,
    ) -> Result<ProductDetail, CatalogError>;
}
