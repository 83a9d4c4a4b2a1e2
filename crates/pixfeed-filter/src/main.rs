use pixfeed_core::FilterServiceConfig;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = FilterServiceConfig::from_env()?;

    pixfeed_infra::init_telemetry("pixfeed-filter", config.base.log_json)
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    pixfeed_filter::serve(config).await
}
