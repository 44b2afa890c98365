use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use explorer_core::{RegistryError, Source, SourceRegistry};
use explorer_engine::{ConfigError, OrchestratorConfig};
use explorer_logging::explorer_info;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
    #[error("source catalog is empty")]
    EmptyCatalog,
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Settings file contents. Every field is optional; missing ones take the
/// orchestrator defaults and the built-in catalog.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub sources: Option<Vec<Source>>,
    pub stagger_ms: u64,
    pub tick_min_ms: u64,
    pub tick_max_ms: u64,
    pub max_increment: f64,
    pub failure_probability: f64,
    pub seed: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let defaults = OrchestratorConfig::default();
        Self {
            sources: None,
            stagger_ms: millis(defaults.stagger_interval),
            tick_min_ms: millis(defaults.tick_min),
            tick_max_ms: millis(defaults.tick_max),
            max_increment: defaults.max_increment,
            failure_probability: defaults.failure_probability,
            seed: defaults.seed,
        }
    }
}

impl AppConfig {
    /// Command-line values win over the file.
    pub fn with_overrides(mut self, seed: Option<u64>, failure_probability: Option<f64>) -> Self {
        if seed.is_some() {
            self.seed = seed;
        }
        if let Some(probability) = failure_probability {
            self.failure_probability = probability;
        }
        self
    }

    pub fn registry(&self) -> Result<SourceRegistry, CatalogError> {
        match &self.sources {
            None => Ok(SourceRegistry::default_catalog()),
            Some(sources) if sources.is_empty() => Err(CatalogError::EmptyCatalog),
            Some(sources) => Ok(SourceRegistry::new(sources.clone())?),
        }
    }

    pub fn orchestrator_config(&self) -> Result<OrchestratorConfig, CatalogError> {
        let config = OrchestratorConfig {
            stagger_interval: Duration::from_millis(self.stagger_ms),
            tick_min: Duration::from_millis(self.tick_min_ms),
            tick_max: Duration::from_millis(self.tick_max_ms),
            max_increment: self.max_increment,
            failure_probability: self.failure_probability,
            seed: self.seed,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Loads the settings file, or defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, CatalogError> {
    let Some(path) = path else {
        return Ok(AppConfig::default());
    };
    let content = fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config: AppConfig = ron::from_str(&content).map_err(|source| CatalogError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    explorer_info!("Loaded explorer config from {:?}", path);
    Ok(config)
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
