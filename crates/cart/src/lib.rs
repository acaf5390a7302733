//! Order-line submission.
//!
//! Turns a valid configuration session into a cart-line request, sends it
//! through the `CartGateway` collaborator and folds the answer back into the
//! session. One attempt per operator action; nothing is retried automatically.

pub mod gateway;
pub mod request;
pub mod submitter;

pub use gateway::{CartGateway, GatewayError};
pub use request::{CartLineRequest, CartLineResponse};
pub use submitter::{
    Accepted, OrderLineSubmitter, PendingSubmission, SERVER_BUSY_MESSAGE, SubmitError,
    is_resource_exhaustion,
};
