//! Rule lookup and rule resolution for a product.

use std::collections::BTreeMap;

use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use dealerdesk_core::{DomainError, DomainResult, ProductId, RuleId};

use crate::product::ProductDetail;
use crate::rule::{CutKind, CutType, ProductRule};
use crate::source::{CatalogError, CatalogSource};

/// What to do when a product's rule cannot be found or loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingRulePolicy {
    /// Configure against the product's own options without enforcing size
    /// membership, so the view still renders when rule data is unavailable.
    Permissive,
    /// Refuse to configure the product.
    Block,
}

/// Degrade rather than block when rule data is unavailable.
pub const DEFAULT_MISSING_RULE_POLICY: MissingRulePolicy = MissingRulePolicy::Permissive;

/// Rule id given to a fallback rule when the product carries none.
pub const FALLBACK_RULE_ID: RuleId = RuleId::new(0);

impl Default for MissingRulePolicy {
    fn default() -> Self {
        DEFAULT_MISSING_RULE_POLICY
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown policy `{0}`")]
pub struct ParsePolicyError(pub String);

impl FromStr for MissingRulePolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "permissive" => Ok(Self::Permissive),
            "block" => Ok(Self::Block),
            other => Err(ParsePolicyError(other.to_string())),
        }
    }
}

/// How strictly the active rule is enforced by the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Enforcement {
    /// The product's rule was loaded; every constraint applies.
    Strict,
    /// Fallback rule; the chosen size is not checked for membership.
    Permissive,
}

/// The rule a configuration session validates against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveRule {
    pub rule: ProductRule,
    pub enforcement: Enforcement,
}

impl ActiveRule {
    pub fn strict(rule: ProductRule) -> Self {
        Self {
            rule,
            enforcement: Enforcement::Strict,
        }
    }

    /// Minimal rule built from the product's own option lists.
    ///
    /// A product without cut types gets every canonical kind so that the cut
    /// choice never becomes impossible.
    pub fn permissive(product: &ProductDetail) -> Self {
        let cut_types = if product.cut_types.is_empty() {
            CutKind::ALL.into_iter().map(CutType::canonical).collect()
        } else {
            product.cut_types.clone()
        };

        Self {
            rule: ProductRule::unchecked(
                product.rule_id.unwrap_or(FALLBACK_RULE_ID),
                product.size_options.clone(),
                cut_types,
                product.can_have_fringe,
            ),
            enforcement: Enforcement::Permissive,
        }
    }

    pub fn is_strict(&self) -> bool {
        self.enforcement == Enforcement::Strict
    }
}

/// Read-only set of product rules keyed by rule id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleCatalog {
    rules: BTreeMap<RuleId, ProductRule>,
}

impl RuleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a bulk pull. Duplicate ids: the last rule wins.
    pub fn from_rules(rules: impl IntoIterator<Item = ProductRule>) -> Self {
        let mut catalog = Self::new();
        for rule in rules {
            catalog.insert(rule);
        }
        catalog
    }

    /// Fetch every rule from the collaborator.
    pub async fn load<S>(source: &S) -> Result<Self, CatalogError>
    where
        S: CatalogSource + ?Sized,
    {
        let rules = source.fetch_product_rules().await?;
        let catalog = Self::from_rules(rules);
        tracing::debug!(rules = catalog.len(), "rule catalog loaded");
        Ok(catalog)
    }

    pub fn insert(&mut self, rule: ProductRule) {
        let id = rule.id_typed();
        if self.rules.insert(id, rule).is_some() {
            tracing::warn!(rule_id = %id, "duplicate rule id in catalog; keeping the later one");
        }
    }

    pub fn get(&self, rule_id: RuleId) -> DomainResult<&ProductRule> {
        self.rules
            .get(&rule_id)
            .ok_or_else(|| DomainError::not_found(format!("rule {rule_id}")))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProductRule> {
        self.rules.values()
    }
}

/// Pick the rule for `product`.
///
/// `catalog` is `None` when the rule fetch failed. Anything short of a loaded
/// rule falls through to `policy`.
pub fn resolve_rule(
    catalog: Option<&RuleCatalog>,
    product: &ProductDetail,
    policy: MissingRulePolicy,
) -> DomainResult<ActiveRule> {
    let lookup = match (product.rule_id, catalog) {
        (Some(rule_id), Some(catalog)) => catalog.get(rule_id).cloned(),
        (Some(rule_id), None) => Err(DomainError::not_found(format!(
            "rule {rule_id} (catalog unavailable)"
        ))),
        (None, _) => Err(DomainError::not_found(format!(
            "product {} has no rule",
            product.id
        ))),
    };

    match (lookup, policy) {
        (Ok(rule), _) => Ok(ActiveRule::strict(rule)),
        (Err(err), MissingRulePolicy::Permissive) => {
            tracing::warn!(
                product_id = %product.id,
                reason = %err,
                "rule unavailable; configuring with permissive fallback rule"
            );
            Ok(ActiveRule::permissive(product))
        }
        (Err(err), MissingRulePolicy::Block) => Err(err),
    }
}

/// Everything a configuration session needs about one product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductContext {
    pub product: ProductDetail,
    pub rule: ActiveRule,
}

/// Load the product detail and its rule, the way a product view does on mount.
///
/// An unknown product is always an error. Any other failed lookup (detail or
/// rules) degrades according to `policy`: under `Permissive` a failed detail
/// fetch yields an unconstrained, unpriced context.
pub async fn load_product_context<S>(
    source: &S,
    product_id: &ProductId,
    policy: MissingRulePolicy,
) -> Result<ProductContext, CatalogError>
where
    S: CatalogSource + ?Sized,
{
    let product = match source.fetch_product_detail(product_id).await {
        Ok(product) => product,
        Err(err @ CatalogError::ProductNotFound(_)) => return Err(err),
        Err(err) if policy == MissingRulePolicy::Block => return Err(err),
        Err(err) => {
            tracing::warn!(
                product_id = %product_id,
                error = %err,
                "product detail fetch failed; configuring without constraints"
            );
            let product = ProductDetail::unavailable(product_id.clone());
            let rule = ActiveRule::permissive(&product);
            return Ok(ProductContext { product, rule });
        }
    };

    let catalog = match RuleCatalog::load(source).await {
        Ok(catalog) => Some(catalog),
        Err(err) => {
            tracing::warn!(product_id = %product_id, error = %err, "rule catalog fetch failed");
            None
        }
    };

    let rule = resolve_rule(catalog.as_ref(), &product, policy)
        .map_err(|err| CatalogError::Unavailable(err.to_string()))?;

    Ok(ProductContext { product, rule })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::ProductPricing;
    use crate::rule::SizeOption;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;

    fn rule(id: u64) -> ProductRule {
        ProductRule::new(
            RuleId::new(id),
            vec![SizeOption::fixed(dec!(200), dec!(300), 5).unwrap()],
            vec![CutType::canonical(CutKind::Rectangle)],
            true,
        )
        .unwrap()
    }

    fn product(rule_id: Option<u64>) -> ProductDetail {
        ProductDetail {
            id: ProductId::new("rug-1").unwrap(),
            name: "Rug".to_string(),
            rule_id: rule_id.map(RuleId::new),
            size_options: vec![SizeOption::optional_height(dec!(120), dec!(30)).unwrap()],
            cut_types: vec![],
            can_have_fringe: false,
            pricing: Some(ProductPricing {
                price: dec!(50),
                currency: "EUR".to_string(),
            }),
        }
    }

    struct StubSource {
        product: Result<ProductDetail, CatalogError>,
        rules: Result<Vec<ProductRule>, CatalogError>,
    }

    #[async_trait]
    impl CatalogSource for StubSource {
        async fn fetch_product_rules(&self) -> Result<Vec<ProductRule>, CatalogError> {
            self.rules.clone()
        }

        async fn fetch_product_detail(
            &self,
            product_id: &ProductId,
        ) -> Result<ProductDetail, CatalogError> {
            match &self.product {
                Ok(product) if product.id == *product_id => Ok(product.clone()),
                Ok(_) => Err(CatalogError::ProductNotFound(product_id.clone())),
                Err(err) => Err(err.clone()),
            }
        }
    }

    #[test]
    fn get_returns_not_found_for_unknown_rule() {
        let catalog = RuleCatalog::from_rules([rule(1), rule(2)]);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get(RuleId::new(2)).unwrap().id_typed(), RuleId::new(2));
        assert!(catalog.get(RuleId::new(3)).unwrap_err().is_not_found());
    }

    #[test]
    fn later_duplicate_rule_replaces_earlier_one() {
        let replacement = ProductRule::new(
            RuleId::new(1),
            vec![SizeOption::fixed(dec!(80), dec!(150), 0).unwrap()],
            vec![CutType::canonical(CutKind::Oval)],
            false,
        )
        .unwrap();

        let catalog = RuleCatalog::from_rules([rule(1), replacement.clone()]);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get(RuleId::new(1)).unwrap(), &replacement);
    }

    #[test]
    fn resolve_uses_catalog_rule_strictly() {
        let catalog = RuleCatalog::from_rules([rule(7)]);
        let active =
            resolve_rule(Some(&catalog), &product(Some(7)), MissingRulePolicy::Permissive).unwrap();
        assert!(active.is_strict());
        assert_eq!(active.rule, rule(7));
    }

    #[test]
    fn missing_rule_degrades_to_product_options_when_permissive() {
        let catalog = RuleCatalog::from_rules([rule(7)]);
        let product = product(Some(99));

        let active = resolve_rule(Some(&catalog), &product, DEFAULT_MISSING_RULE_POLICY).unwrap();
        assert_eq!(active.enforcement, Enforcement::Permissive);
        assert_eq!(active.rule.size_options(), product.size_options.as_slice());
        assert_eq!(active.rule.cut_types().len(), CutKind::ALL.len());
        assert!(!active.rule.can_have_fringe());
        assert_eq!(active.rule.id_typed(), RuleId::new(99));
    }

    #[test]
    fn product_without_rule_gets_fallback_id() {
        let active = resolve_rule(None, &product(None), MissingRulePolicy::Permissive).unwrap();
        assert_eq!(active.rule.id_typed(), FALLBACK_RULE_ID);
    }

    #[test]
    fn block_policy_surfaces_not_found() {
        let err = resolve_rule(None, &product(Some(1)), MissingRulePolicy::Block).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn policy_parses_from_config_strings() {
        assert_eq!("Block".parse::<MissingRulePolicy>().unwrap(), MissingRulePolicy::Block);
        assert_eq!(MissingRulePolicy::default(), MissingRulePolicy::Permissive);
        assert!("lenient".parse::<MissingRulePolicy>().is_err());
    }

    #[tokio::test]
    async fn load_context_falls_back_when_rule_fetch_fails() {
        let source = StubSource {
            product: Ok(product(Some(7))),
            rules: Err(CatalogError::Unavailable("503".to_string())),
        };

        let ctx = load_product_context(
            &source,
            &ProductId::new("rug-1").unwrap(),
            MissingRulePolicy::Permissive,
        )
        .await
        .unwrap();
        assert_eq!(ctx.rule.enforcement, Enforcement::Permissive);

        let blocked = load_product_context(
            &source,
            &ProductId::new("rug-1").unwrap(),
            MissingRulePolicy::Block,
        )
        .await;
        assert!(matches!(blocked, Err(CatalogError::Unavailable(_))));
    }

    #[tokio::test]
    async fn load_context_degrades_when_detail_fetch_fails() {
        let source = StubSource {
            product: Err(CatalogError::Unavailable("503".to_string())),
            rules: Ok(vec![rule(7)]),
        };
        let rug = ProductId::new("rug-1").unwrap();

        let ctx = load_product_context(&source, &rug, MissingRulePolicy::Permissive)
            .await
            .unwrap();
        assert_eq!(ctx.product.id, rug);
        assert_eq!(ctx.product.unit_price(), None);
        assert_eq!(ctx.rule.enforcement, Enforcement::Permissive);
        assert!(ctx.rule.rule.size_options().is_empty());
        assert_eq!(ctx.rule.rule.cut_types().len(), CutKind::ALL.len());

        let blocked = load_product_context(&source, &rug, MissingRulePolicy::Block).await;
        assert_eq!(blocked, Err(CatalogError::Unavailable("503".to_string())));
    }

    #[tokio::test]
    async fn load_context_propagates_missing_product() {
        let source = StubSource {
            product: Ok(product(Some(7))),
            rules: Ok(vec![rule(7)]),
        };

        let err = load_product_context(
            &source,
            &ProductId::new("other").unwrap(),
            MissingRulePolicy::Permissive,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CatalogError::ProductNotFound(_)));

        let ctx = load_product_context(
            &source,
            &ProductId::new("rug-1").unwrap(),
            MissingRulePolicy::Block,
        )
        .await
        .unwrap();
        assert!(ctx.rule.is_strict());
    }
}
