//! Configuration engine for one order line.
//!
//! Deterministic domain logic only (no IO): the operator's selection, the
//! area-based price derived from it, and the ordered validation that gates
//! submission. `ConfigurationSession` keeps the three consistent after every
//! change.

pub mod pricing;
pub mod selection;
pub mod session;
pub mod validation;

pub use pricing::{CM2_PER_M2, PriceQuote, area_m2, quote};
pub use selection::{
    DEFAULT_CUSTOM_HEIGHT, DEFAULT_QUANTITY, SelectionChange, SelectionState, Stage,
};
pub use session::{ConfigurationSession, SubmissionStatus};
pub use validation::{
    DEFAULT_STOCK_POLICY, InvalidReason, MIN_CUSTOM_HEIGHT, StockPolicy, StockWarning, Verdict,
    stock_warning, validate,
};
