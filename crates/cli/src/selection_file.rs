//! JSON description of the operator's choices, replayed onto a session.
//!
//! ```json
//! { "sizeIndex": 1, "customHeight": 240, "cutType": "oval",
//!   "fringe": false, "quantity": 2, "notes": "bind edges" }
//! ```

use anyhow::{Context, anyhow};
use rust_decimal::Decimal;
use serde::Deserialize;

use dealerdesk_catalog::CutKind;
use dealerdesk_configurator::{ConfigurationSession, SelectionChange};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SelectionFile {
    /// Position in the rule's size list.
    pub size_index: Option<usize>,
    pub custom_height: Option<Decimal>,
    /// Cut type id as listed by the rule, or a cut kind label ("oval").
    pub cut_type: Option<String>,
    pub fringe: Option<bool>,
    pub quantity: Option<i64>,
    pub notes: Option<String>,
}

impl SelectionFile {
    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        serde_json::from_str(raw).context("malformed selection file")
    }

    /// Apply the choices in the order a product view would take them.
    pub fn apply_to(&self, session: &mut ConfigurationSession) -> anyhow::Result<()> {
        if let Some(index) = self.size_index {
            session.select_size_at(index)?;
        }
        if let Some(height) = self.custom_height {
            session.apply(SelectionChange::SetCustomHeight(height));
        }
        if let Some(cut) = &self.cut_type {
            select_cut_type(session, cut)?;
        }
        if let Some(fringe) = self.fringe {
            session.apply(SelectionChange::SetFringe(fringe));
        }
        if let Some(quantity) = self.quantity {
            session.apply(SelectionChange::EditQuantity(quantity));
            session.apply(SelectionChange::CommitQuantity);
        }
        if let Some(notes) = &self.notes {
            session.apply(SelectionChange::SetNotes(notes.clone()));
        }
        Ok(())
    }
}

fn select_cut_type(session: &mut ConfigurationSession, label: &str) -> anyhow::Result<()> {
    if session.select_cut_type_by_id(label).is_ok() {
        return Ok(());
    }

    let cut = CutKind::from_label(label)
        .and_then(|kind| session.rule().rule.cut_type_by_kind(kind))
        .cloned()
        .ok_or_else(|| anyhow!("cut type `{label}` is not offered for this product"))?;
    session.apply(SelectionChange::SelectCutType(cut));
    Ok(())
}
