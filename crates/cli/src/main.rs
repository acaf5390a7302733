use dealerdesk_cli::CliArgs;
use dealerdesk_infra::PortalConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match PortalConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            dealerdesk_observability::init();
            tracing::error!(error = %err, "invalid configuration");
            return Err(err.into());
        }
    };
    dealerdesk_observability::tracing::init(config.log_format);

    let args = CliArgs::parse(std::env::args().skip(1))?;
    tracing::debug!(api_url = %config.api_url, product_id = %args.product_id, "starting");

    let report = dealerdesk_cli::run(&config, &args).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
