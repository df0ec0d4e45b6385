use facturo_core::observability::init_tracing;
use facturo_service::config::Config;
use facturo_service::services::init_metrics;
use facturo_service::startup::Application;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Initialize metrics recorder (must be before any metrics are recorded)
    init_metrics();

    // Initialize tracing; spans are exported over OTLP when an endpoint is set
    let otlp_endpoint = std::env::var("OTLP_ENDPOINT").ok();
    init_tracing("facturo-service", "info", otlp_endpoint.as_deref());

    let config = Config::from_env().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        std::io::Error::other(format!("Configuration error: {}", e))
    })?;

    let app = Application::build(config).await.map_err(|e| {
        tracing::error!("Failed to build application: {}", e);
        std::io::Error::other(format!("Startup error: {}", e))
    })?;

    app.run_until_stopped().await
}
