use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use dealerdesk_catalog::{ActiveRule, CutType, ProductRule, SizeOption};

use crate::validation;

/// Height (cm) given to an optional-height size when it is chosen.
pub const DEFAULT_CUSTOM_HEIGHT: Decimal = Decimal::ONE_HUNDRED;

/// Quantity of a fresh selection; also the floor a committed quantity is
/// coerced back to.
pub const DEFAULT_QUANTITY: i64 = 1;

/// Furthest point a selection has reached, in typical progression order.
///
/// Fields can be revisited in any order; this only reports which
/// prerequisites currently hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Unconfigured,
    SizeChosen,
    CutChosen,
    FringeChosen,
    Quantified,
    Complete,
}

/// One operator action on a selection.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionChange {
    SelectSize(SizeOption),
    /// Raw height as typed; not clamped.
    SetCustomHeight(Decimal),
    SelectCutType(CutType),
    SetFringe(bool),
    /// Raw quantity as typed; may be non-positive until committed.
    EditQuantity(i64),
    /// Field lost focus: non-positive quantities snap back to 1.
    CommitQuantity,
    SetNotes(String),
}

/// In-progress configuration of one product instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionState {
    size: Option<SizeOption>,
    custom_height: Option<Decimal>,
    cut_type: Option<CutType>,
    has_fringe: Option<bool>,
    quantity: i64,
    notes: Option<String>,
}

impl Default for SelectionState {
    fn default() -> Self {
        Self {
            size: None,
            custom_height: None,
            cut_type: None,
            has_fringe: None,
            quantity: DEFAULT_QUANTITY,
            notes: None,
        }
    }
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn size(&self) -> Option<&SizeOption> {
        self.size.as_ref()
    }

    /// Operator-supplied height, kept even while a fixed size is selected.
    pub fn custom_height(&self) -> Option<Decimal> {
        self.custom_height
    }

    pub fn cut_type(&self) -> Option<&CutType> {
        self.cut_type.as_ref()
    }

    pub fn has_fringe(&self) -> Option<bool> {
        self.has_fringe
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    /// Trimmed notes, `None` when blank.
    pub fn notes(&self) -> Option<&str> {
        self.notes
            .as_deref()
            .map(str::trim)
            .filter(|notes| !notes.is_empty())
    }

    /// Height that applies to the order line: the catalog height for a fixed
    /// size, the custom height for an optional-height size.
    pub fn effective_height(&self) -> Option<Decimal> {
        let size = self.size.as_ref()?;
        size.fixed_height().or(self.custom_height)
    }

    /// Fringe flag as it goes on the wire: `false` whenever the rule does not
    /// offer fringe or no choice was made.
    pub fn fringe_for_submission(&self, rule: &ProductRule) -> bool {
        rule.can_have_fringe() && self.has_fringe.unwrap_or(false)
    }

    /// Apply one operator action.
    pub fn apply(&mut self, change: SelectionChange, rule: &ProductRule) {
        match change {
            SelectionChange::SelectSize(size) => self.select_size(size),
            SelectionChange::SetCustomHeight(height) => self.custom_height = Some(height),
            SelectionChange::SelectCutType(cut) => self.cut_type = Some(cut),
            SelectionChange::SetFringe(choice) => {
                if rule.can_have_fringe() {
                    self.has_fringe = Some(choice);
                } else {
                    tracing::debug!(rule_id = %rule.id_typed(), "fringe not offered; ignoring choice");
                    self.has_fringe = None;
                }
            }
            SelectionChange::EditQuantity(raw) => self.quantity = raw,
            SelectionChange::CommitQuantity => {
                if self.quantity <= 0 {
                    self.quantity = DEFAULT_QUANTITY;
                }
            }
            SelectionChange::SetNotes(text) => self.notes = Some(text),
        }

        if !rule.can_have_fringe() {
            self.has_fringe = None;
        }
    }

    fn select_size(&mut self, size: SizeOption) {
        // A different optional-height size starts over at the default height;
        // a fixed size leaves the custom height alone (it is simply unused).
        if size.is_optional_height() && self.size.as_ref() != Some(&size) {
            self.custom_height = Some(DEFAULT_CUSTOM_HEIGHT);
        }
        self.size = Some(size);
    }

    /// Clear the per-line fields after a successful add to cart. Size, cut
    /// and fringe stay so the same configuration can be added again quickly.
    pub fn reset_after_submission(&mut self) {
        self.quantity = DEFAULT_QUANTITY;
        self.notes = None;
    }

    /// Which prerequisites hold, in progression order.
    pub fn stage(&self, rule: &ActiveRule) -> Stage {
        if self.size.is_none() {
            return Stage::Unconfigured;
        }
        if self.cut_type.is_none() {
            return Stage::SizeChosen;
        }
        if rule.rule.can_have_fringe() && self.has_fringe.is_none() {
            return Stage::CutChosen;
        }
        if self.quantity <= 0 {
            return Stage::FringeChosen;
        }
        if validation::validate(self, rule).is_err() {
            return Stage::Quantified;
        }
        Stage::Complete
    }
}
