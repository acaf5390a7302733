use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use dealerdesk_core::{Entity, ProductId, RuleId};

use crate::rule::{CutType, SizeOption, deserialize_cut_types, deserialize_size_options};

/// Price record attached to a product detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductPricing {
    /// Unit price per square meter.
    pub price: Decimal,
    /// ISO currency code (e.g. "EUR", "TRY").
    pub currency: String,
}

/// Product detail as served by the catalog collaborator.
///
/// Carries the product's own option lists; the rule referenced by `rule_id`
/// (when present and loadable) takes precedence over them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetail {
    pub id: ProductId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub rule_id: Option<RuleId>,
    #[serde(default, deserialize_with = "deserialize_size_options")]
    pub size_options: Vec<SizeOption>,
    #[serde(default, deserialize_with = "deserialize_cut_types")]
    pub cut_types: Vec<CutType>,
    #[serde(default)]
    pub can_have_fringe: bool,
    /// `None` when the collaborator sent no price; such a product has no quote.
    #[serde(default)]
    pub pricing: Option<ProductPricing>,
}

impl ProductDetail {
    /// Stand-in for a product whose detail could not be fetched: no options,
    /// no price, every canonical cut style and a fringe choice on offer.
    pub fn unavailable(id: ProductId) -> Self {
        Self {
            id,
            name: String::new(),
            rule_id: None,
            size_options: Vec::new(),
            cut_types: Vec::new(),
            can_have_fringe: true,
            pricing: None,
        }
    }

    pub fn unit_price(&self) -> Option<Decimal> {
        self.pricing.as_ref().map(|p| p.price)
    }

    pub fn currency(&self) -> Option<&str> {
        self.pricing.as_ref().map(|p| p.currency.as_str())
    }
}

impl Entity for ProductDetail {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
