use serde::{Deserialize, Deserializer};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::fusion::{MergePolicy, DEFAULT_CHUNK_SIZE, DEFAULT_STALENESS_WINDOW_SECS};
use crate::ingest::DEFAULT_OPENSKY_URL;
use crate::predict::PredictorConfig;
use crate::route::DEFAULT_CACHE_CAPACITY;
use crate::state::{Provenance, SourcePriority};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

fn duration<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    let s = String::deserialize(deserializer)?;
    humantime::parse_duration(s.trim()).map_err(serde::de::Error::custom)
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub fusion: FusionConfig,
    #[serde(default)]
    pub predict: PredictConfig,
    #[serde(default)]
    pub query: QueryConfig,
    #[serde(default)]
    pub routes: RoutesConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    Memory,
    Sled,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    pub path: Option<PathBuf>,
    #[serde(default = "default_history_retention", deserialize_with = "duration")]
    pub history_retention: Duration,
    #[serde(default = "default_retention_interval", deserialize_with = "duration")]
    pub retention_interval: Duration,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: None,
            history_retention: default_history_retention(),
            retention_interval: default_retention_interval(),
        }
    }
}

fn default_history_retention() -> Duration {
    Duration::from_secs(7 * 24 * 3600)
}

fn default_retention_interval() -> Duration {
    Duration::from_secs(3600)
}

#[derive(Debug, Clone, Deserialize)]
pub struct FusionConfig {
    #[serde(default = "default_staleness_window", deserialize_with = "duration")]
    pub staleness_window: Duration,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            staleness_window: default_staleness_window(),
            chunk_size: default_chunk_size(),
        }
    }
}

impl FusionConfig {
    pub fn policy(&self) -> MergePolicy {
        MergePolicy::new(self.staleness_window.as_secs() as i64)
    }
}

fn default_staleness_window() -> Duration {
    Duration::from_secs(DEFAULT_STALENESS_WINDOW_SECS as u64)
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

/// Speeds in m/s, altitudes in meters.
#[derive(Debug, Clone, Deserialize)]
pub struct PredictConfig {
    #[serde(default = "default_min_age", deserialize_with = "duration")]
    pub min_age: Duration,
    #[serde(default = "default_max_age", deserialize_with = "duration")]
    pub max_age: Duration,
    #[serde(default = "default_min_velocity")]
    pub min_velocity: f64,
    #[serde(default = "default_velocity")]
    pub default_velocity: f64,
    #[serde(default = "default_cruise_altitude")]
    pub cruise_altitude: f64,
}

impl Default for PredictConfig {
    fn default() -> Self {
        Self {
            min_age: default_min_age(),
            max_age: default_max_age(),
            min_velocity: default_min_velocity(),
            default_velocity: default_velocity(),
            cruise_altitude: default_cruise_altitude(),
        }
    }
}

impl PredictConfig {
    pub fn predictor(&self) -> PredictorConfig {
        PredictorConfig {
            min_age_secs: self.min_age.as_secs() as i64,
            max_age_secs: self.max_age.as_secs() as i64,
            min_velocity_m_s: self.min_velocity,
            default_velocity_m_s: self.default_velocity,
            cruise_altitude_m: self.cruise_altitude,
            ..PredictorConfig::default()
        }
    }
}

fn default_min_age() -> Duration {
    Duration::from_secs(PredictorConfig::default().min_age_secs as u64)
}

fn default_max_age() -> Duration {
    Duration::from_secs(PredictorConfig::default().max_age_secs as u64)
}

fn default_min_velocity() -> f64 {
    PredictorConfig::default().min_velocity_m_s
}

fn default_velocity() -> f64 {
    PredictorConfig::default().default_velocity_m_s
}

fn default_cruise_altitude() -> f64 {
    PredictorConfig::default().cruise_altitude_m
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueryConfig {
    /// How long ago a row may last have been heard from and still be served.
    #[serde(default = "default_recent_contact", deserialize_with = "duration")]
    pub recent_contact: Duration,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            recent_contact: default_recent_contact(),
        }
    }
}

fn default_recent_contact() -> Duration {
    Duration::from_secs(600)
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoutesConfig {
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            cache_capacity: default_cache_capacity(),
        }
    }
}

fn default_cache_capacity() -> usize {
    DEFAULT_CACHE_CAPACITY
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IngestConfig {
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    #[serde(flatten)]
    pub kind: SourceKind,
    #[serde(default = "default_interval", deserialize_with = "duration")]
    pub interval: Duration,
    /// Overrides the tier implied by `kind` and `feeder_id`.
    pub priority: Option<u8>,
    pub feeder_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceKind {
    Opensky {
        #[serde(default = "default_opensky_url")]
        url: String,
        #[serde(default = "default_timeout", deserialize_with = "duration")]
        timeout: Duration,
        username: Option<String>,
        password: Option<String>,
        /// `[lat_min, lon_min, lat_max, lon_max]`
        bounds: Option<[f64; 4]>,
    },
    File {
        path: PathBuf,
    },
}

fn default_interval() -> Duration {
    Duration::from_secs(10)
}

fn default_timeout() -> Duration {
    Duration::from_secs(15)
}

fn default_opensky_url() -> String {
    DEFAULT_OPENSKY_URL.to_string()
}

impl SourceConfig {
    /// Tags every vector from this source. Without an explicit priority,
    /// OpenSky is the primary feed and files are feeder or secondary data.
    pub fn provenance(&self) -> Provenance {
        let mut provenance = match (&self.kind, &self.feeder_id) {
            (_, Some(feeder)) => Provenance::feeder(feeder.clone()),
            (SourceKind::Opensky { .. }, None) => Provenance::primary_feed(),
            (SourceKind::File { .. }, None) => Provenance::secondary(self.name.clone()),
        };
        if let Some(priority) = self.priority {
            provenance.priority = SourcePriority(priority);
        }
        provenance
    }
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.backend == StorageBackend::Sled && self.storage.path.is_none() {
            return Err(ConfigError::Invalid("sled storage needs a path".into()));
        }
        if self.predict.min_age > self.predict.max_age {
            return Err(ConfigError::Invalid("predict.min_age exceeds max_age".into()));
        }
        for source in &self.ingest.sources {
            if source.interval.is_zero() {
                return Err(ConfigError::Invalid(format!(
                    "source {} has a zero interval",
                    source.name
                )));
            }
        }
        Ok(())
    }
}
