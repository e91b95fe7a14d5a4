//! TOML configuration for the `httpmetrics-collector` binary.
//!
//! ```toml
//! [[metrics]]
//! name = "queue-depth"
//! type = "External"
//! interval_secs = 30
//! [metrics.config]
//! endpoint = "http://localhost:9090/metrics"
//! json-path = "$.queue.depth"
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context};
use serde::Deserialize;

use crate::collectors::{MetricConfig, MetricSourceType, SourceDescriptor};

pub const DEFAULT_CONFIG_PATH: &str = "config/collector.toml";

#[derive(Debug, Deserialize)]
pub struct CollectorConfig {
    /// Namespace reported in each collector's source descriptor.
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default)]
    pub metrics: Vec<MetricEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricEntry {
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub metric_type: MetricSourceType,
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default)]
    pub config: HashMap<String, String>,
}

fn default_namespace() -> String {
    "default".to_string()
}

fn default_interval_secs() -> u64 {
    30
}

impl CollectorConfig {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(content)?;
        if config.metrics.is_empty() {
            bail!("no [[metrics]] configured");
        }
        for (index, entry) in config.metrics.iter().enumerate() {
            if entry.interval_secs == 0 {
                bail!("metrics[{index}]: interval_secs must be greater than zero");
            }
        }
        Ok(config)
    }
}

impl MetricEntry {
    pub fn metric_config(&self) -> MetricConfig {
        MetricConfig::new(self.metric_type, self.config.clone())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Falls back to `metric-<index>` for unnamed entries.
    pub fn source(&self, namespace: &str, index: usize) -> SourceDescriptor {
        let name = self
            .name
            .clone()
            .unwrap_or_else(|| format!("metric-{index}"));
        SourceDescriptor::new(namespace, name)
    }
}
