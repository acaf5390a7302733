//! Add-to-cart flow for one configuration session.
//!
//! A submission is three steps so the UI can disable the trigger while the
//! request is out and drop answers that arrive after the view moved on:
//!
//! 1. `prepare`: re-validate, refuse while another request is in flight,
//!    build the request and pick the idempotency key.
//! 2. `send`: exactly one gateway call.
//! 3. `complete`: interpret the answer and fold it into the session (only if
//!    the session is still the one that sent it).
//!
//! `submit` runs all three.

use chrono::{DateTime, Utc};
use thiserror::Error;

use dealerdesk_configurator::{ConfigurationSession, InvalidReason};
use dealerdesk_core::{IdempotencyKey, ProductId};

use crate::gateway::{CartGateway, GatewayError};
use crate::request::{CartLineRequest, CartLineResponse};

/// Shown instead of the collaborator's resource-exhaustion error.
pub const SERVER_BUSY_MESSAGE: &str = "The server is busy right now. Please try again in a moment.";

/// Shown when the collaborator rejects a line without saying why.
const GENERIC_REJECTION_MESSAGE: &str = "The item could not be added to the cart.";

/// Collaborator messages that mean "out of connections, try later".
const RESOURCE_EXHAUSTION_MARKERS: [&str; 3] = [
    "too many connections",
    "too many clients",
    "er_con_count_error",
];

/// Whether `message` is the collaborator's resource-exhaustion error.
pub fn is_resource_exhaustion(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    RESOURCE_EXHAUSTION_MARKERS
        .iter()
        .any(|marker| message.contains(marker))
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubmitError {
    /// The selection does not pass validation; nothing was sent.
    #[error("configuration is not valid: {0}")]
    Invalid(InvalidReason),

    /// A request for this session is still out.
    #[error("a submission is already in progress")]
    AlreadyInFlight,

    /// The product view was closed.
    #[error("the product view is closed")]
    Closed,

    /// Collaborator ran out of resources (connections).
    #[error("{}", SERVER_BUSY_MESSAGE)]
    ServerBusy,

    /// Collaborator refused the line; message verbatim.
    #[error("{0}")]
    Rejected(String),

    /// Request did not complete; message verbatim.
    #[error("{0}")]
    Transport(String),
}

impl SubmitError {
    /// Text shown to the operator.
    pub fn user_message(&self) -> String {
        self.to_string()
    }

    fn from_message(message: String, transport: bool) -> Self {
        if is_resource_exhaustion(&message) {
            SubmitError::ServerBusy
        } else if transport {
            SubmitError::Transport(message)
        } else {
            SubmitError::Rejected(message)
        }
    }
}

impl From<GatewayError> for SubmitError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Transport(message) => SubmitError::from_message(message, true),
            GatewayError::Status { .. } | GatewayError::Decode(_) => {
                SubmitError::from_message(err.to_string(), false)
            }
        }
    }
}

/// A request ready to go out, tied to the session generation that built it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSubmission {
    pub product_id: ProductId,
    pub request: CartLineRequest,
    pub key: IdempotencyKey,
    pub generation: u64,
}

/// A line the collaborator accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accepted {
    pub request: CartLineRequest,
    pub key: IdempotencyKey,
    pub at: DateTime<Utc>,
    pub message: Option<String>,
}

/// Sends order lines through a `CartGateway`.
#[derive(Debug, Clone)]
pub struct OrderLineSubmitter<G> {
    gateway: G,
}

impl<G> OrderLineSubmitter<G>
where
    G: CartGateway,
{
    pub fn new(gateway: G) -> Self {
        Self { gateway }
    }

    /// Validate and build the request, then mark the session in flight.
    pub fn prepare(
        &self,
        session: &mut ConfigurationSession,
    ) -> Result<PendingSubmission, SubmitError> {
        if session.is_closed() {
            return Err(SubmitError::Closed);
        }
        if session.is_in_flight() {
            return Err(SubmitError::AlreadyInFlight);
        }

        let request = CartLineRequest::from_session(session).map_err(SubmitError::Invalid)?;
        let key = session.submission_key();
        session.mark_in_flight(key);

        Ok(PendingSubmission {
            product_id: session.product().id.clone(),
            request,
            key,
            generation: session.generation(),
        })
    }

    /// One outbound call; no retry.
    pub async fn send(
        &self,
        pending: &PendingSubmission,
    ) -> Result<CartLineResponse, GatewayError> {
        tracing::info!(
            product_id = %pending.product_id,
            quantity = pending.request.quantity,
            cut_type = %pending.request.cut_type,
            idempotency_key = %pending.key,
            "submitting cart line"
        );
        self.gateway
            .submit_cart_line(&pending.request, pending.key)
            .await
    }

    /// Interpret the outcome and record it on the session.
    ///
    /// The interpretation is returned even when the session no longer
    /// accepts it (closed or reset since `prepare`); in that case the session
    /// is left untouched.
    pub fn complete(
        &self,
        session: &mut ConfigurationSession,
        pending: PendingSubmission,
        outcome: Result<CartLineResponse, GatewayError>,
    ) -> Result<Accepted, SubmitError> {
        let result = match outcome {
            Ok(response) if response.success => Ok(Accepted {
                request: pending.request,
                key: pending.key,
                at: Utc::now(),
                message: response.message,
            }),
            Ok(response) => Err(SubmitError::from_message(
                response
                    .message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| GENERIC_REJECTION_MESSAGE.to_string()),
                false,
            )),
            Err(err) => Err(SubmitError::from(err)),
        };

        match &result {
            Ok(accepted) => {
                tracing::info!(
                    product_id = %pending.product_id,
                    idempotency_key = %accepted.key,
                    "cart line added"
                );
                session.record_success(pending.generation, accepted.at);
            }
            Err(err) => {
                tracing::warn!(
                    product_id = %pending.product_id,
                    idempotency_key = %pending.key,
                    error = %err,
                    "cart line submission failed"
                );
                session.record_failure(pending.generation, err.user_message());
            }
        }

        result
    }

    /// Prepare, send and complete in one go.
    pub async fn submit(
        &self,
        session: &mut ConfigurationSession,
    ) -> Result<Accepted, SubmitError> {
        let pending = self.prepare(session)?;
        let outcome = self.send(&pending).await;
        self.complete(session, pending, outcome)
    }
}
