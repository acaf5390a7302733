//! Cart collaborator abstraction.

use async_trait::async_trait;
use thiserror::Error;

use dealerdesk_core::IdempotencyKey;

use crate::request::{CartLineRequest, CartLineResponse};

/// Failure to get a `CartLineResponse` out of the collaborator.
///
/// A collaborator that answers `{ success: false, message }` is not a gateway
/// error; that is a regular response.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Request never completed (connection refused, timeout, TLS, ...).
    #[error("{0}")]
    Transport(String),

    /// Non-success HTTP status without a usable `message` body.
    #[error("request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    /// Body could not be decoded as a cart-line response.
    #[error("unexpected response from cart service: {0}")]
    Decode(String),
}

/// Outbound port for cart-line submissions.
#[async_trait]
pub trait CartGateway: Send + Sync {
    /// Submit one order line. `key` identifies the attempt for de-duplication
    /// on the collaborator side.
    async fn submit_cart_line(
        &self,
        request: &CartLineRequest,
        key: IdempotencyKey,
    ) -> Result<CartLineResponse, GatewayError>;
}

#[async_trait]
impl<G> CartGateway for std::sync::Arc<G>
where
    G: CartGateway + ?Sized,
{
    async fn submit_cart_line(
        &self,
        request: &CartLineRequest,
        key: IdempotencyKey,
    ) -> Result<CartLineResponse, GatewayError> {
        (**self).submit_cart_line(request, key).await
    }
}
