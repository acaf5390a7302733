//! Ordered validation of a selection against its rule.
//!
//! Checks run in a fixed order and the first failure is reported, so the
//! reason shown for a given selection is stable.

use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use dealerdesk_catalog::{ActiveRule, Enforcement, ParsePolicyError};

use crate::pricing;
use crate::selection::SelectionState;

/// Smallest accepted custom height (cm, inclusive). Smaller values are kept
/// as typed and reported, never clamped.
pub const MIN_CUSTOM_HEIGHT: Decimal = Decimal::TEN;

/// Why a selection cannot be submitted.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidReason {
    #[error("choose a size")]
    MissingSize,
    #[error("height must be at least 10 cm")]
    InvalidHeight,
    #[error("choose a cut type")]
    MissingCutType,
    #[error("choose whether to add fringe")]
    MissingFringeChoice,
    #[error("quantity must be a positive whole number")]
    InvalidQuantity,
}

impl InvalidReason {
    /// Form field the message belongs next to.
    pub fn field(self) -> &'static str {
        match self {
            InvalidReason::MissingSize => "size",
            InvalidReason::InvalidHeight => "customHeight",
            InvalidReason::MissingCutType => "cutType",
            InvalidReason::MissingFringeChoice => "hasFringe",
            InvalidReason::InvalidQuantity => "quantity",
        }
    }
}

/// Outcome of validating a selection: `Ok(())` is valid.
pub type Verdict = Result<(), InvalidReason>;

/// Validate `state` against `rule`; the first failing check wins.
pub fn validate(state: &SelectionState, rule: &ActiveRule) -> Verdict {
    let size = state.size().ok_or(InvalidReason::MissingSize)?;
    if rule.enforcement == Enforcement::Strict && !rule.rule.has_size(size) {
        return Err(InvalidReason::MissingSize);
    }

    if size.is_optional_height() {
        match state.custom_height() {
            Some(height) if height >= MIN_CUSTOM_HEIGHT => {}
            _ => return Err(InvalidReason::InvalidHeight),
        }
    }

    match state.cut_type() {
        Some(cut) if rule.rule.has_cut_type(cut) => {}
        _ => return Err(InvalidReason::MissingCutType),
    }

    if rule.rule.can_have_fringe() && state.has_fringe().is_none() {
        return Err(InvalidReason::MissingFringeChoice);
    }

    if state.quantity() <= 0 || u32::try_from(state.quantity()).is_err() {
        return Err(InvalidReason::InvalidQuantity);
    }

    Ok(())
}

/// Whether requests beyond the catalog stock are reported.
///
/// Stock never blocks a submission: over-commitment is allowed and stock
/// reconciliation is left to the cart collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockPolicy {
    Warn,
    Ignore,
}

pub const DEFAULT_STOCK_POLICY: StockPolicy = StockPolicy::Warn;

impl Default for StockPolicy {
    fn default() -> Self {
        DEFAULT_STOCK_POLICY
    }
}

impl FromStr for StockPolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "warn" => Ok(Self::Warn),
            "ignore" => Ok(Self::Ignore),
            other => Err(ParsePolicyError(other.to_string())),
        }
    }
}

/// Non-blocking notice that the request exceeds catalog stock.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StockWarning {
    #[error("{requested} pieces requested, {available} in stock")]
    QuantityExceedsStock { requested: u32, available: u32 },
    #[error("{requested_m2} m² requested, {available_m2} m² in stock")]
    AreaExceedsStock {
        requested_m2: Decimal,
        available_m2: Decimal,
    },
}

/// Compare the selection with the size option's stock fields.
pub fn stock_warning(state: &SelectionState, policy: StockPolicy) -> Option<StockWarning> {
    if policy == StockPolicy::Ignore {
        return None;
    }

    let size = state.size()?;
    let requested = u32::try_from(state.quantity()).ok().filter(|q| *q > 0)?;

    if let Some(available) = size.stock_quantity() {
        return (requested > available).then_some(StockWarning::QuantityExceedsStock {
            requested,
            available,
        });
    }

    let available_m2 = size.stock_area_m2()?;
    let requested_m2 =
        pricing::area_m2(size, state.custom_height())?.checked_mul(Decimal::from(requested))?;
    (requested_m2 > available_m2).then_some(StockWarning::AreaExceedsStock {
        requested_m2,
        available_m2,
    })
}
