use margin_watch::api::{self, ApiContext};
use margin_watch::classifier::Classifier;
use margin_watch::classifier::remote::LlmClassifier;
use margin_watch::config;
use margin_watch::sensor::sim::SimulationDriver;
use margin_watch::state::AppState;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, RwLock};

fn init_tracing() {
    let subscriber = tracing_subscriber::fmt().with_target(false).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    tracing::info!(
        config_path = config::DEFAULT_CONFIG_PATH,
        "margin-watch starting"
    );
    let config = config::load_default()?;

    let state = Arc::new(RwLock::new(AppState::new()));

    let classifier: Arc<dyn Classifier> = Arc::new(LlmClassifier::new(
        config.classifier_endpoint().to_string(),
        config.classifier_model().to_string(),
        config.vehicle_id().to_string(),
        config.classifier_timeout(),
    ));
    tracing::info!(
        endpoint = config.classifier_endpoint(),
        model = config.classifier_model(),
        vehicle_id = config.vehicle_id(),
        "Classification engine configured"
    );

    let mut driver = SimulationDriver::new(
        Arc::clone(&state),
        Arc::clone(&classifier),
        config.tick_interval(),
    );
    if config.simulation_auto_start() {
        driver.start();
    } else {
        tracing::info!("Simulation driver idle until enabled via /api/simulation");
    }
    let driver = Arc::new(Mutex::new(driver));

    let app = api::router(ApiContext {
        state: Arc::clone(&state),
        classifier,
        driver,
    });
    let port = config.server_port();
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "API server listening");
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use margin_watch::config;

    #[test]
    fn default_config_is_valid_toml() -> Result<(), Box<dyn std::error::Error>> {
        let _config = config::load_default()?;
        Ok(())
    }
}
