use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";
pub const DEFAULT_SERVER_PORT: u16 = 8080;
pub const DEFAULT_TICK_INTERVAL_SECS: u64 = 4;
pub const DEFAULT_VEHICLE_ID: &str = "BUS_01";
pub const DEFAULT_CLASSIFIER_ENDPOINT: &str = "http://127.0.0.1:8090/v1/classify";
pub const DEFAULT_CLASSIFIER_MODEL: &str = "llama3.1";
pub const DEFAULT_CLASSIFIER_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub app: AppSection,
    pub logging: LoggingSection,
    #[serde(default)]
    pub classifier: Option<ClassifierSection>,
    #[serde(default)]
    pub simulation: Option<SimulationSection>,
    #[serde(default)]
    pub server: Option<ServerSection>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSection {
    pub name: String,
    /// Vehicle identifier carried in every classification request.
    pub vehicle_id: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSection {
    pub level: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ClassifierSection {
    /// HTTP endpoint of the classification engine.
    pub endpoint: Option<String>,
    /// Model identifier passed through to the engine.
    pub model: Option<String>,
    /// Socket timeout in seconds for the classification call.
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SimulationSection {
    /// Seconds between simulation ticks (default: 4)
    pub tick_interval_secs: Option<u64>,
    /// Start the simulation driver at boot (default: false)
    pub auto_start: Option<bool>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSection {
    /// Port to listen on (default: 8080)
    pub port: Option<u16>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

pub fn load_default() -> Result<Config, ConfigError> {
    load_from_path(DEFAULT_CONFIG_PATH)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&contents)?;
    Ok(config)
}

impl Config {
    pub fn vehicle_id(&self) -> &str {
        self.app
            .vehicle_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .unwrap_or(DEFAULT_VEHICLE_ID)
    }

    pub fn classifier_endpoint(&self) -> &str {
        self.classifier
            .as_ref()
            .and_then(|s| s.endpoint.as_deref())
            .filter(|endpoint| !endpoint.is_empty())
            .unwrap_or(DEFAULT_CLASSIFIER_ENDPOINT)
    }

    pub fn classifier_model(&self) -> &str {
        self.classifier
            .as_ref()
            .and_then(|s| s.model.as_deref())
            .unwrap_or(DEFAULT_CLASSIFIER_MODEL)
    }

    /// Returns the classification call timeout (default: 10 seconds)
    pub fn classifier_timeout(&self) -> Duration {
        let secs = self
            .classifier
            .as_ref()
            .and_then(|s| s.timeout_secs)
            .unwrap_or(DEFAULT_CLASSIFIER_TIMEOUT_SECS);
        Duration::from_secs(secs)
    }

    /// Returns the simulation tick interval as Duration (default: 4 seconds)
    pub fn tick_interval(&self) -> Duration {
        let secs = self
            .simulation
            .as_ref()
            .and_then(|s| s.tick_interval_secs)
            .unwrap_or(DEFAULT_TICK_INTERVAL_SECS);
        Duration::from_secs(secs)
    }

    /// Whether the simulation driver starts at boot (default: false)
    pub fn simulation_auto_start(&self) -> bool {
        self.simulation
            .as_ref()
            .and_then(|s| s.auto_start)
            .unwrap_or(false)
    }

    /// Returns the server port (default: 8080)
    pub fn server_port(&self) -> u16 {
        self.server
            .as_ref()
            .and_then(|s| s.port)
            .unwrap_or(DEFAULT_SERVER_PORT)
    }
}
