//! `dealerdesk`: price (and optionally add to cart) one configured order line.

pub mod args;
pub mod selection_file;

use anyhow::{Context, anyhow};
use serde::Serialize;

use dealerdesk_cart::{CartGateway, OrderLineSubmitter};
use dealerdesk_catalog::{CatalogSource, load_product_context};
use dealerdesk_configurator::{ConfigurationSession, PriceQuote, Stage};
use dealerdesk_core::{IdempotencyKey, ProductId};
use dealerdesk_infra::{HttpPortalClient, PortalConfig};

pub use args::CliArgs;
pub use selection_file::SelectionFile;

/// What the command prints (as JSON) for one line.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineReport {
    pub product_id: ProductId,
    pub product_name: String,
    /// `false` when the permissive fallback rule is in use.
    pub strict_rule: bool,
    pub stage: Stage,
    pub quote: Option<PriceQuote>,
    pub invalid: Option<String>,
    pub stock_warning: Option<String>,
    pub added_to_cart: Option<IdempotencyKey>,
}

impl LineReport {
    fn of(session: &ConfigurationSession) -> Self {
        Self {
            product_id: session.product().id.clone(),
            product_name: session.product().name.clone(),
            strict_rule: session.rule().is_strict(),
            stage: session.stage(),
            quote: session.quote().cloned(),
            invalid: session.verdict().err().map(|reason| reason.to_string()),
            stock_warning: session.stock_warning().map(ToString::to_string),
            added_to_cart: None,
        }
    }
}

/// Load the product, replay `selection`, then submit when asked to.
pub async fn run_line<S, G>(
    source: &S,
    gateway: G,
    config: &PortalConfig,
    product_id: &ProductId,
    selection: &SelectionFile,
    submit: bool,
) -> anyhow::Result<LineReport>
where
    S: CatalogSource + ?Sized,
    G: CartGateway,
{
    let context = load_product_context(source, product_id, config.missing_rule_policy)
        .await
        .with_context(|| format!("loading product {product_id}"))?;

    let mut session = ConfigurationSession::open(context, config.stock_policy);
    selection.apply_to(&mut session)?;

    let mut report = LineReport::of(&session);
    if !submit {
        return Ok(report);
    }

    if let Err(reason) = session.verdict() {
        return Err(anyhow!("cannot submit: {reason}"));
    }

    let accepted = OrderLineSubmitter::new(gateway)
        .submit(&mut session)
        .await
        .map_err(|err| anyhow!(err.user_message()))?;

    tracing::info!(product_id = %product_id, idempotency_key = %accepted.key, "line added to cart");
    report.added_to_cart = Some(accepted.key);
    Ok(report)
}

/// Entry point used by the binary: talk to the configured portal.
pub async fn run(config: &PortalConfig, args: &CliArgs) -> anyhow::Result<LineReport> {
    let raw = std::fs::read_to_string(&args.selection_path)
        .with_context(|| format!("reading {}", args.selection_path.display()))?;
    let selection = SelectionFile::from_json(&raw)?;

    let client = HttpPortalClient::new(config).context("building HTTP client")?;
    run_line(
        &client,
        client.clone(),
        config,
        &args.product_id,
        &selection,
        args.submit,
    )
    .await
}
