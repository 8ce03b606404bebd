//! Configuration management for CoachTree services
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default, config/{APP_ENV}, config/local)
//! - Default values

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,

    /// Population and ranking storage
    pub data: DataConfig,

    /// Influence scoring parameters
    pub scoring: ScoringSettings,

    /// Tree projection limits
    pub projection: ProjectionConfig,

    /// Observability configuration
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DataConfig {
    /// JSON population file, keyed by sport
    #[serde(default = "default_population_path")]
    pub population_path: String,

    /// Directory ranking snapshots are written to
    #[serde(default = "default_rankings_dir")]
    pub rankings_dir: String,

    /// Run relationship inference over tenures after loading
    #[serde(default = "default_infer_relationships")]
    pub infer_relationships: bool,

    /// Rewrite the population file after each accepted coach upsert
    #[serde(default)]
    pub persist_writes: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScoringSettings {
    /// Per-generation decay applied to disciple success
    #[serde(default = "default_decay")]
    pub decay: f64,

    /// Deepest generation that contributes to disciple success
    #[serde(default = "default_max_generation")]
    pub max_generation: usize,

    /// Year open-ended tenures resolve to (defaults to the current year)
    pub current_year: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProjectionConfig {
    /// Ancestor generations when a request does not specify any
    #[serde(default = "default_ancestors")]
    pub default_ancestors: usize,

    /// Descendant generations when a request does not specify any
    #[serde(default = "default_descendants")]
    pub default_descendants: usize,

    /// Upper bound applied to requested generation limits
    #[serde(default = "default_max_generations")]
    pub max_generations: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Metrics port (0 to disable)
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,

    /// Service name for log records
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_population_path() -> String { "data/coaches.json".to_string() }
fn default_rankings_dir() -> String { "data/rankings".to_string() }
fn default_infer_relationships() -> bool { true }
fn default_decay() -> f64 { 0.7 }
fn default_max_generation() -> usize { 5 }
fn default_ancestors() -> usize { 2 }
fn default_descendants() -> usize { 3 }
fn default_max_generations() -> usize { 8 }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { true }
fn default_metrics_port() -> u16 { 9090 }
fn default_service_name() -> String { "coachtree".to_string() }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            population_path: default_population_path(),
            rankings_dir: default_rankings_dir(),
            infer_relationships: default_infer_relationships(),
            persist_writes: false,
        }
    }
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            decay: default_decay(),
            max_generation: default_max_generation(),
            current_year: None,
        }
    }
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            default_ancestors: default_ancestors(),
            default_descendants: default_descendants(),
            max_generations: default_max_generations(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: default_json_logging(),
            metrics_port: default_metrics_port(),
            service_name: default_service_name(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))

            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))

            // Load local overrides
            .add_source(File::with_name("config/local").required(false))

            // Load from environment variables with APP__ prefix
            // e.g., APP__SERVER__PORT=8081
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )

            .build()?;

        config.try_deserialize()
    }

    /// Load from a specific file, still honouring `APP__` overrides
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )
            .build()?;

        config.try_deserialize()
    }

    /// Clamp a requested generation limit to the configured maximum
    pub fn clamp_generations(&self, requested: usize) -> usize {
        requested.min(self.projection.max_generations)
    }

    /// Socket address string for the HTTP listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.scoring.max_generation, 5);
        assert!((config.scoring.decay - 0.7).abs() < f64::EPSILON);
        assert!(config.scoring.current_year.is_none());
    }

    #[test]
    fn test_clamp_generations() {
        let config = AppConfig::default();
        assert_eq!(config.clamp_generations(3), 3);
        assert_eq!(config.clamp_generations(50), config.projection.max_generations);
    }

    #[test]
    fn test_partial_sections_fill_defaults() {
        let config: AppConfig = Config::builder()
            .set_override("server.port", 9000)
            .unwrap()
            .set_override("scoring.current_year", 2020)
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.scoring.current_year, Some(2020));
        assert_eq!(config.projection.default_descendants, 3);
        assert_eq!(config.bind_address(), "0.0.0.0:9000");
    }

    #[test]
    fn test_from_file() {
        let dir = std::env::temp_dir().join(format!("coachtree-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("gateway.toml");
        std::fs::write(
            &path,
            "[data]\npopulation_path = \"fixtures/coaches.json\"\npersist_writes = true\n\n[projection]\nmax_generations = 4\n",
        )
        .unwrap();

        let config = AppConfig::from_file(path.to_str().unwrap()).unwrap();
        assert_eq!(config.data.population_path, "fixtures/coaches.json");
        assert!(config.data.persist_writes);
        assert_eq!(config.clamp_generations(10), 4);
        assert_eq!(config.server.port, 8080);

        std::fs::remove_dir_all(dir).ok();
    }
}
