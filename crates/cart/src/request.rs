use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use dealerdesk_catalog::CutKind;
use dealerdesk_configurator::{ConfigurationSession, InvalidReason, validate};
use dealerdesk_core::ProductId;

/// Fully resolved order line as sent to the cart collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineRequest {
    pub product_id: ProductId,
    pub quantity: u32,
    /// Centimeters.
    pub width: Decimal,
    /// Centimeters; the custom height for optional-height sizes.
    pub height: Decimal,
    pub has_fringe: bool,
    pub cut_type: CutKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl CartLineRequest {
    /// Build the request from the session's current selection.
    ///
    /// Re-validates first; an invalid selection never becomes a request.
    pub fn from_session(session: &ConfigurationSession) -> Result<Self, InvalidReason> {
        validate(session.state(), session.rule())?;

        let state = session.state();
        let rule = &session.rule().rule;
        let size = state.size().ok_or(InvalidReason::MissingSize)?;
        let height = state.effective_height().ok_or(InvalidReason::InvalidHeight)?;
        let cut = state.cut_type().ok_or(InvalidReason::MissingCutType)?;
        let quantity =
            u32::try_from(state.quantity()).map_err(|_| InvalidReason::InvalidQuantity)?;

        Ok(Self {
            product_id: session.product().id.clone(),
            quantity,
            width: size.width(),
            height,
            has_fringe: state.fringe_for_submission(rule),
            cut_type: cut.kind(),
            notes: state.notes().map(str::to_string),
        })
    }
}

/// Collaborator answer to a cart-line submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CartLineResponse {
    pub fn accepted() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dealerdesk_catalog::{
        ActiveRule, CutType, ProductContext, ProductDetail, ProductPricing, ProductRule,
        SizeOption,
    };
    use dealerdesk_configurator::{SelectionChange, StockPolicy};
    use dealerdesk_core::RuleId;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn session(size: SizeOption, can_have_fringe: bool) -> ConfigurationSession {
        let rule = ProductRule::new(
            RuleId::new(1),
            vec![size],
            vec![CutType::new("rectangular", "Rectangular", CutKind::Rectangle)],
            can_have_fringe,
        )
        .unwrap();
        let ctx = ProductContext {
            product: ProductDetail {
                id: ProductId::new("rug-1").unwrap(),
                name: "Rug".to_string(),
                rule_id: Some(RuleId::new(1)),
                size_options: vec![],
                cut_types: vec![],
                can_have_fringe,
                pricing: Some(ProductPricing {
                    price: dec!(50),
                    currency: "EUR".to_string(),
                }),
            },
            rule: ActiveRule::strict(rule),
        };
        let mut session = ConfigurationSession::open(ctx, StockPolicy::Warn);
        session.select_size_at(0).unwrap();
        session.select_cut_type_by_id("rectangular").unwrap();
        session
    }

    #[test]
    fn fixed_size_request_matches_wire_contract() {
        let mut session = session(SizeOption::fixed(dec!(200), dec!(300), 5).unwrap(), true);
        session.apply(SelectionChange::SetFringe(true));
        session.apply(SelectionChange::EditQuantity(2));

        let request = CartLineRequest::from_session(&session).unwrap();
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["productId"], json!("rug-1"));
        assert_eq!(value["quantity"], json!(2));
        assert_eq!(value["width"].as_f64(), Some(200.0));
        assert_eq!(value["height"].as_f64(), Some(300.0));
        assert_eq!(value["hasFringe"], json!(true));
        assert_eq!(value["cutType"], json!("rectangle"));
        assert!(value.get("notes").is_none());
    }

    #[test]
    fn optional_height_request_carries_custom_height() {
        let mut session =
            session(SizeOption::optional_height(dec!(150), dec!(20)).unwrap(), false);
        session.apply(SelectionChange::SetCustomHeight(dec!(240)));
        session.apply(SelectionChange::SetNotes("  bind edges ".to_string()));

        let request = CartLineRequest::from_session(&session).unwrap();
        assert_eq!(request.width, dec!(150));
        assert_eq!(request.height, dec!(240));
        assert!(!request.has_fringe);
        assert_eq!(request.notes.as_deref(), Some("bind edges"));
    }

    #[test]
    fn invalid_selection_builds_no_request() {
        let session = session(SizeOption::fixed(dec!(200), dec!(300), 5).unwrap(), true);
        assert_eq!(
            CartLineRequest::from_session(&session),
            Err(InvalidReason::MissingFringeChoice)
        );
    }

    #[test]
    fn post_cut_serializes_with_hyphen() {
        assert_eq!(serde_json::to_value(CutKind::PostCut).unwrap(), json!("post-cut"));
    }

    #[test]
    fn response_message_is_optional() {
        let response: CartLineResponse = serde_json::from_value(json!({ "success": true })).unwrap();
        assert_eq!(response, CartLineResponse::accepted());
    }
}
