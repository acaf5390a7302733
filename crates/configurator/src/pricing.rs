//! Area-derived pricing.
//!
//! Dimensions are centimeters, prices are per square meter. Everything is
//! `Decimal` so quotes can be reused for invoicing without float artifacts.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use dealerdesk_catalog::SizeOption;
use dealerdesk_core::ValueObject;

use crate::selection::SelectionState;

/// cm² in one m².
pub const CM2_PER_M2: Decimal = Decimal::from_parts(10_000, 0, 0, false, 0);

/// Price of one configured order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuote {
    pub area_m2: Decimal,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub total_price: Decimal,
    pub currency: String,
}

impl ValueObject for PriceQuote {}

impl PriceQuote {
    /// Total rounded to cents, for display.
    pub fn display_total(&self) -> Decimal {
        self.total_price.round_dp(2)
    }
}

/// Area of one piece in m².
///
/// Optional-height sizes use `custom_height`; fixed sizes ignore it. `None`
/// when the height is missing or non-positive, or on overflow.
pub fn area_m2(size: &SizeOption, custom_height: Option<Decimal>) -> Option<Decimal> {
    let (width, height) = match size {
        SizeOption::Fixed { width, height, .. } => (*width, *height),
        SizeOption::OptionalHeight { width, .. } => (*width, custom_height?),
    };
    if height <= Decimal::ZERO {
        return None;
    }
    width.checked_mul(height)?.checked_div(CM2_PER_M2)
}

/// Quote for the current selection.
///
/// A partially configured selection (no size, or a quantity that is not
/// positive yet) has no quote; that is not an error.
pub fn quote(state: &SelectionState, unit_price: Decimal, currency: &str) -> Option<PriceQuote> {
    let size = state.size()?;
    let quantity = u32::try_from(state.quantity()).ok().filter(|q| *q > 0)?;
    let area_m2 = area_m2(size, state.custom_height())?;
    let total_price = area_m2
        .checked_mul(unit_price)?
        .checked_mul(Decimal::from(quantity))?;

    Some(PriceQuote {
        area_m2,
        unit_price,
        quantity,
        total_price,
        currency: currency.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::SelectionChange;
    use dealerdesk_catalog::{CutKind, CutType, ProductRule};
    use dealerdesk_core::RuleId;
    use rust_decimal_macros::dec;

    fn rule_with(size: SizeOption) -> ProductRule {
        ProductRule::new(
            RuleId::new(1),
            vec![size],
            vec![CutType::canonical(CutKind::Rectangle)],
            true,
        )
        .unwrap()
    }

    fn state_with(size: SizeOption, quantity: i64) -> SelectionState {
        let rule = rule_with(size.clone());
        let mut state = SelectionState::new();
        state.apply(SelectionChange::SelectSize(size), &rule);
        state.apply(SelectionChange::EditQuantity(quantity), &rule);
        state
    }

    #[test]
    fn fixed_size_area_and_total() {
        let state = state_with(SizeOption::fixed(dec!(200), dec!(300), 1).unwrap(), 2);
        let quote = quote(&state, dec!(50), "EUR").unwrap();
        assert_eq!(quote.area_m2, dec!(6));
        assert_eq!(quote.total_price, dec!(600));
        assert_eq!(quote.quantity, 2);
        assert_eq!(quote.currency, "EUR");
    }

    #[test]
    fn optional_height_area_uses_custom_height() {
        let size = SizeOption::optional_height(dec!(150), dec!(10)).unwrap();
        let mut state = state_with(size.clone(), 1);
        assert_eq!(quote(&state, dec!(1), "EUR").unwrap().area_m2, dec!(1.5));

        state.apply(SelectionChange::SetCustomHeight(dec!(200)), &rule_with(size));
        assert_eq!(quote(&state, dec!(1), "EUR").unwrap().area_m2, dec!(3.0));
    }

    #[test]
    fn no_quote_for_partial_selection() {
        assert_eq!(quote(&SelectionState::new(), dec!(50), "EUR"), None);

        let state = state_with(SizeOption::fixed(dec!(200), dec!(300), 1).unwrap(), 0);
        assert_eq!(quote(&state, dec!(50), "EUR"), None);

        let state = state_with(SizeOption::fixed(dec!(200), dec!(300), 1).unwrap(), -2);
        assert_eq!(quote(&state, dec!(50), "EUR"), None);
    }

    #[test]
    fn non_positive_custom_height_has_no_area() {
        let size = SizeOption::optional_height(dec!(150), dec!(10)).unwrap();
        assert_eq!(area_m2(&size, Some(dec!(0))), None);
        assert_eq!(area_m2(&size, None), None);
        assert_eq!(area_m2(&size, Some(dec!(5))), Some(dec!(0.075)));
    }

    #[test]
    fn decimal_totals_have_no_float_artifacts() {
        let state = state_with(SizeOption::fixed(dec!(70), dec!(140), 1).unwrap(), 3);
        let quote = quote(&state, dec!(19.99), "USD").unwrap();
        assert_eq!(quote.area_m2, dec!(0.98));
        assert_eq!(quote.total_price, dec!(58.7706));
        assert_eq!(quote.display_total(), dec!(58.77));
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        fn cm() -> impl Strategy<Value = Decimal> {
            (1u32..=2_000).prop_map(Decimal::from)
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 500,
                ..ProptestConfig::default()
            })]

            /// Property: a fixed size is priced from its own height, whatever
            /// custom height is lying around.
            #[test]
            fn fixed_area_ignores_custom_height(
                width in cm(),
                height in cm(),
                custom in proptest::option::of(cm()),
            ) {
                let size = SizeOption::fixed(width, height, 0).unwrap();
                prop_assert_eq!(area_m2(&size, custom), Some(width * height / CM2_PER_M2));
            }

            /// Property: optional-height totals are linear in the custom height.
            #[test]
            fn optional_total_is_linear_in_height(
                width in cm(),
                height in cm(),
                factor in 1u32..=5,
                price in 1u32..=500,
                quantity in 1i64..=20,
            ) {
                let size = SizeOption::optional_height(width, Decimal::ZERO).unwrap();
                let rule = rule_with(size.clone());
                let mut state = state_with(size, quantity);
                let unit_price = Decimal::from(price);

                state.apply(SelectionChange::SetCustomHeight(height), &rule);
                let base = quote(&state, unit_price, "EUR").unwrap();
                prop_assert_eq!(base.area_m2, width * height / CM2_PER_M2);

                state.apply(SelectionChange::SetCustomHeight(height * Decimal::from(factor)), &rule);
                let scaled = quote(&state, unit_price, "EUR").unwrap();
                prop_assert_eq!(scaled.total_price, base.total_price * Decimal::from(factor));
            }

            /// Property: quoting is a pure function of the selection.
            #[test]
            fn quote_is_idempotent(
                width in cm(),
                height in cm(),
                quantity in 1i64..=50,
            ) {
                let state = state_with(SizeOption::fixed(width, height, 0).unwrap(), quantity);
                prop_assert_eq!(
                    quote(&state, Decimal::from(42), "EUR"),
                    quote(&state, Decimal::from(42), "EUR")
                );
            }
        }
    }
}
