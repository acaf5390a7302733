//! One configuration session per open product view.
//!
//! The session owns the selection and keeps the derived quote, verdict and
//! stock warning in step with it: every change recomputes all three, there is
//! no separate "recalculate" action.
//!
//! Submission bookkeeping also lives here (in-flight flag, acknowledgment,
//! idempotency key, generation), so the cart submitter can work against a
//! single owned value.

use chrono::{DateTime, Utc};

use dealerdesk_catalog::{ActiveRule, ProductContext, ProductDetail};
use dealerdesk_core::{DomainError, DomainResult, IdempotencyKey};

use crate::pricing::{self, PriceQuote};
use crate::selection::{SelectionChange, SelectionState, Stage};
use crate::validation::{self, StockPolicy, StockWarning, Verdict};

/// Where the session's add-to-cart affordance stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionStatus {
    Idle,
    /// A request is out; the submit trigger is disabled.
    InFlight { key: IdempotencyKey },
    /// Transient "added" acknowledgment.
    Added { at: DateTime<Utc> },
    /// Message to show the operator; they must resubmit explicitly.
    Failed { message: String },
}

#[derive(Debug, Clone)]
pub struct ConfigurationSession {
    product: ProductDetail,
    rule: ActiveRule,
    stock_policy: StockPolicy,
    state: SelectionState,
    quote: Option<PriceQuote>,
    verdict: Verdict,
    stock_warning: Option<StockWarning>,
    submission: SubmissionStatus,
    idempotency_key: Option<IdempotencyKey>,
    generation: u64,
    closed: bool,
}

impl ConfigurationSession {
    /// Open a session for a freshly mounted product view.
    pub fn open(context: ProductContext, stock_policy: StockPolicy) -> Self {
        let mut session = Self {
            product: context.product,
            rule: context.rule,
            stock_policy,
            state: SelectionState::new(),
            quote: None,
            verdict: Ok(()),
            stock_warning: None,
            submission: SubmissionStatus::Idle,
            idempotency_key: None,
            generation: 0,
            closed: false,
        };
        session.refresh();
        tracing::debug!(
            product_id = %session.product.id,
            rule_id = %session.rule.rule.id_typed(),
            enforcement = ?session.rule.enforcement,
            "configuration session opened"
        );
        session
    }

    pub fn product(&self) -> &ProductDetail {
        &self.product
    }

    pub fn rule(&self) -> &ActiveRule {
        &self.rule
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn quote(&self) -> Option<&PriceQuote> {
        self.quote.as_ref()
    }

    pub fn verdict(&self) -> Verdict {
        self.verdict
    }

    pub fn stock_warning(&self) -> Option<&StockWarning> {
        self.stock_warning.as_ref()
    }

    pub fn stage(&self) -> Stage {
        self.state.stage(&self.rule)
    }

    pub fn submission(&self) -> &SubmissionStatus {
        &self.submission
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self.submission, SubmissionStatus::InFlight { .. })
    }

    /// Whether the submit trigger should be enabled.
    pub fn can_submit(&self) -> bool {
        !self.closed && !self.is_in_flight() && self.verdict.is_ok()
    }

    /// Apply one operator action, then recompute quote and verdict.
    pub fn apply(&mut self, change: SelectionChange) {
        self.state.apply(change, &self.rule.rule);

        // The configuration changed: a later submit is a new order line.
        self.idempotency_key = None;
        if !self.is_in_flight() {
            self.submission = SubmissionStatus::Idle;
        }
        self.refresh();
    }

    /// Select the rule's size option at `index` (dropdown position).
    pub fn select_size_at(&mut self, index: usize) -> DomainResult<()> {
        let size = self
            .rule
            .rule
            .size_options()
            .get(index)
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("size option #{index}")))?;
        self.apply(SelectionChange::SelectSize(size));
        Ok(())
    }

    /// Select the rule's cut type with identifier `id`.
    pub fn select_cut_type_by_id(&mut self, id: &str) -> DomainResult<()> {
        let cut = self
            .rule
            .rule
            .cut_type_by_id(id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("cut type `{id}`")))?;
        self.apply(SelectionChange::SelectCutType(cut));
        Ok(())
    }

    /// The view now shows a different product: start over with defaults.
    pub fn reset_for_product(&mut self, context: ProductContext) {
        self.product = context.product;
        self.rule = context.rule;
        self.state = SelectionState::new();
        self.submission = SubmissionStatus::Idle;
        self.idempotency_key = None;
        self.generation += 1;
        self.refresh();
        tracing::debug!(product_id = %self.product.id, "configuration session reset");
    }

    /// The view closed; responses still in flight will be ignored.
    pub fn close(&mut self) {
        self.closed = true;
        self.generation += 1;
        self.submission = SubmissionStatus::Idle;
    }

    /// Idempotency key for the next attempt.
    ///
    /// Reused while the configuration is unchanged since the last failed
    /// attempt; a success or any selection change starts a new one.
    pub fn submission_key(&mut self) -> IdempotencyKey {
        *self.idempotency_key.get_or_insert_with(IdempotencyKey::new)
    }

    /// Mark a request as out (disables the submit trigger).
    pub fn mark_in_flight(&mut self, key: IdempotencyKey) {
        self.submission = SubmissionStatus::InFlight { key };
    }

    /// Record an accepted submission made in `generation`.
    ///
    /// Quantity and notes reset even if they were edited while the request
    /// was out; the accepted line is the one that was sent.
    ///
    /// Returns `false` (and changes nothing) when the response is stale.
    pub fn record_success(&mut self, generation: u64, at: DateTime<Utc>) -> bool {
        if !self.accepts_response(generation) {
            return false;
        }
        self.state.reset_after_submission();
        self.idempotency_key = None;
        self.submission = SubmissionStatus::Added { at };
        self.refresh();
        true
    }

    /// Record a failed submission made in `generation`. The idempotency key
    /// is kept so that resubmitting the same configuration reuses it.
    pub fn record_failure(&mut self, generation: u64, message: impl Into<String>) -> bool {
        if !self.accepts_response(generation) {
            return false;
        }
        self.submission = SubmissionStatus::Failed {
            message: message.into(),
        };
        true
    }

    fn accepts_response(&self, generation: u64) -> bool {
        if self.closed || generation != self.generation {
            tracing::debug!(
                response_generation = generation,
                current_generation = self.generation,
                closed = self.closed,
                "ignoring late submission response"
            );
            return false;
        }
        true
    }

    fn refresh(&mut self) {
        self.quote = self
            .product
            .pricing
            .as_ref()
            .and_then(|p| pricing::quote(&self.state, p.price, &p.currency));
        self.verdict = validation::validate(&self.state, &self.rule);
        self.stock_warning = validation::stock_warning(&self.state, self.stock_policy);

        tracing::debug!(
            product_id = %self.product.id,
            total = ?self.quote.as_ref().map(|q| q.total_price),
            verdict = ?self.verdict,
            "selection recomputed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::InvalidReason;
    use dealerdesk_catalog::{
        CutKind, CutType, Enforcement, ProductPricing, ProductRule, SizeOption,
    };
    use dealerdesk_core::{ProductId, RuleId};
    use rust_decimal_macros::dec;

    fn context(size: SizeOption) -> ProductContext {
        let rule = ProductRule::new(
            RuleId::new(1),
            vec![size],
            vec![CutType::new("rectangular", "Rectangular", CutKind::Rectangle)],
            true,
        )
        .unwrap();
        ProductContext {
            product: ProductDetail {
                id: ProductId::new("rug-1").unwrap(),
                name: "Rug".to_string(),
                rule_id: Some(RuleId::new(1)),
                size_options: vec![],
                cut_types: vec![],
                can_have_fringe: true,
                pricing: Some(ProductPricing {
                    price: dec!(50),
                    currency: "EUR".to_string(),
                }),
            },
            rule: ActiveRule::strict(rule),
        }
    }

    fn fixed_context() -> ProductContext {
        context(SizeOption::fixed(dec!(200), dec!(300), 10).unwrap())
    }

    fn optional_context() -> ProductContext {
        context(SizeOption::optional_height(dec!(150), dec!(100)).unwrap())
    }

    fn configured(ctx: ProductContext) -> ConfigurationSession {
        let mut session = ConfigurationSession::open(ctx, StockPolicy::Warn);
        session.select_size_at(0).unwrap();
        session.select_cut_type_by_id("rectangular").unwrap();
        session.apply(SelectionChange::SetFringe(true));
        session
    }

    #[test]
    fn fresh_session_has_no_quote_and_reports_missing_size() {
        let session = ConfigurationSession::open(fixed_context(), StockPolicy::Warn);
        assert_eq!(session.quote(), None);
        assert_eq!(session.verdict(), Err(InvalidReason::MissingSize));
        assert_eq!(session.stage(), Stage::Unconfigured);
        assert!(!session.can_submit());
    }

    #[test]
    fn fixed_size_scenario_prices_and_validates() {
        let mut session = configured(fixed_context());
        session.apply(SelectionChange::EditQuantity(2));

        let quote = session.quote().unwrap();
        assert_eq!(quote.area_m2, dec!(6));
        assert_eq!(quote.total_price, dec!(600));
        assert_eq!(session.verdict(), Ok(()));
        assert_eq!(session.stage(), Stage::Complete);
        assert!(session.can_submit());
    }

    #[test]
    fn optional_height_scenario_updates_area_only() {
        let mut session = configured(optional_context());
        assert_eq!(session.state().custom_height(), Some(dec!(100)));
        assert_eq!(session.quote().unwrap().area_m2, dec!(1.5));

        let before = session.state().clone();
        session.apply(SelectionChange::SetCustomHeight(dec!(200)));

        assert_eq!(session.quote().unwrap().area_m2, dec!(3.0));
        assert_eq!(session.state().size(), before.size());
        assert_eq!(session.state().cut_type(), before.cut_type());
        assert_eq!(session.state().has_fringe(), before.has_fringe());
        assert_eq!(session.state().quantity(), before.quantity());
    }

    #[test]
    fn every_change_revalidates() {
        let mut session = configured(optional_context());
        assert_eq!(session.verdict(), Ok(()));

        session.apply(SelectionChange::SetCustomHeight(dec!(4)));
        assert_eq!(session.verdict(), Err(InvalidReason::InvalidHeight));
        assert!(!session.can_submit());

        session.apply(SelectionChange::SetCustomHeight(dec!(40)));
        assert_eq!(session.verdict(), Ok(()));
    }

    #[test]
    fn stock_warning_follows_quantity() {
        let mut session = configured(fixed_context());
        assert_eq!(session.stock_warning(), None);
        session.apply(SelectionChange::EditQuantity(11));
        assert!(matches!(
            session.stock_warning(),
            Some(StockWarning::QuantityExceedsStock { requested: 11, available: 10 })
        ));
        assert_eq!(session.verdict(), Ok(()));
    }

    #[test]
    fn unknown_dropdown_positions_are_not_found() {
        let mut session = ConfigurationSession::open(fixed_context(), StockPolicy::Warn);
        assert!(session.select_size_at(3).unwrap_err().is_not_found());
        assert!(session.select_cut_type_by_id("oval").unwrap_err().is_not_found());
    }

    #[test]
    fn reset_for_product_restores_defaults_and_bumps_generation() {
        let mut session = configured(fixed_context());
        session.apply(SelectionChange::EditQuantity(4));
        let generation = session.generation();

        session.reset_for_product(optional_context());

        assert_eq!(session.state(), &SelectionState::new());
        assert_eq!(session.generation(), generation + 1);
        assert_eq!(session.quote(), None);
        assert_eq!(session.rule().enforcement, Enforcement::Strict);
    }

    #[test]
    fn success_resets_quantity_and_notes_only() {
        let mut session = configured(fixed_context());
        session.apply(SelectionChange::EditQuantity(3));
        session.apply(SelectionChange::SetNotes("rush".to_string()));
        let key = session.submission_key();
        session.mark_in_flight(key);
        assert!(!session.can_submit());

        let at = Utc::now();
        assert!(session.record_success(session.generation(), at));

        assert_eq!(session.submission(), &SubmissionStatus::Added { at });
        assert_eq!(session.state().quantity(), 1);
        assert_eq!(session.state().notes(), None);
        assert!(session.state().size().is_some());
        assert_eq!(session.state().has_fringe(), Some(true));
        assert_eq!(session.quote().unwrap().total_price, dec!(300));
        assert_ne!(session.submission_key(), key);
    }

    #[test]
    fn success_discards_edits_made_while_in_flight() {
        let mut session = configured(fixed_context());
        let key = session.submission_key();
        session.mark_in_flight(key);

        session.apply(SelectionChange::EditQuantity(4));
        session.apply(SelectionChange::SetNotes("second line".to_string()));
        assert!(session.is_in_flight());

        let at = Utc::now();
        assert!(session.record_success(session.generation(), at));
        assert_eq!(session.submission(), &SubmissionStatus::Added { at });
        assert_eq!(session.state().quantity(), 1);
        assert_eq!(session.state().notes(), None);
    }

    #[test]
    fn unpriced_product_validates_without_a_quote() {
        let mut ctx = fixed_context();
        ctx.product.pricing = None;
        let session = configured(ctx);

        assert!(session.verdict().is_ok());
        assert_eq!(session.quote(), None);
    }

    #[test]
    fn failure_keeps_key_until_selection_changes() {
        let mut session = configured(fixed_context());
        let key = session.submission_key();
        session.mark_in_flight(key);
        assert!(session.record_failure(session.generation(), "boom"));
        assert_eq!(
            session.submission(),
            &SubmissionStatus::Failed {
                message: "boom".to_string()
            }
        );
        assert_eq!(session.submission_key(), key);

        session.apply(SelectionChange::EditQuantity(2));
        assert_eq!(session.submission(), &SubmissionStatus::Idle);
        assert_ne!(session.submission_key(), key);
    }

    #[test]
    fn responses_after_close_or_reset_are_ignored() {
        let mut session = configured(fixed_context());
        session.apply(SelectionChange::EditQuantity(3));
        let generation = session.generation();
        let key = session.submission_key();
        session.mark_in_flight(key);

        session.reset_for_product(fixed_context());
        assert!(!session.record_success(generation, Utc::now()));
        assert_eq!(session.submission(), &SubmissionStatus::Idle);

        let generation = session.generation();
        session.close();
        assert!(!session.record_failure(generation, "late"));
        assert!(session.is_closed());
        assert!(!session.can_submit());
    }
}
