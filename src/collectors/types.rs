use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::time::Duration;
use chrono::{DateTime, Utc};

use super::MilliQuantity;
use crate::error::{CollectError, ConfigError};

/// Kind of metric source a reading is reported as, mirroring the
/// autoscaling API's `MetricSourceType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum MetricSourceType {
    Object,
    Pods,
    Resource,
    ContainerResource,
    #[default]
    External,
}

impl fmt::Display for MetricSourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MetricSourceType::Object => "Object",
            MetricSourceType::Pods => "Pods",
            MetricSourceType::Resource => "Resource",
            MetricSourceType::ContainerResource => "ContainerResource",
            MetricSourceType::External => "External",
        };
        f.write_str(s)
    }
}

/// Per-metric configuration handed to a [`CollectorPlugin`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricConfig {
    #[serde(rename = "type", default)]
    metric_type: MetricSourceType,
    #[serde(default)]
    config: HashMap<String, String>,
}

impl MetricConfig {
    pub fn new(metric_type: MetricSourceType, config: HashMap<String, String>) -> Self {
        Self { metric_type, config }
    }

    pub fn metric_type(&self) -> MetricSourceType {
        self.metric_type
    }

    /// Non-empty value for `key`, after trimming.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.config
            .get(key)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    pub fn require(&self, key: &str) -> Result<&str, ConfigError> {
        self.get(key).ok_or_else(|| ConfigError::MissingConfig {
            key: key.to_string(),
        })
    }
}

/// Identifies what a collector is collecting for; only used to label logs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    pub namespace: String,
    pub name: String,
}

impl SourceDescriptor {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for SourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalMetricValue {
    pub metric_name: String,
    #[serde(default)]
    pub metric_labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_seconds: Option<i64>,
    pub value: MilliQuantity,
}

/// One reading produced by a collector. Timestamp and window are left for
/// the caller to fill in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectedMetric {
    #[serde(rename = "type")]
    pub kind: MetricSourceType,
    pub external: ExternalMetricValue,
}

impl CollectedMetric {
    pub fn external(kind: MetricSourceType, name: String, value: MilliQuantity) -> Self {
        Self {
            kind,
            external: ExternalMetricValue {
                metric_name: name,
                metric_labels: BTreeMap::new(),
                timestamp: None,
                window_seconds: None,
                value,
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.external.metric_name
    }

    pub fn value(&self) -> MilliQuantity {
        self.external.value
    }
}

pub trait Collector: Send + Sync {
    /// Polls the source once. Errors only describe this call.
    fn get_metrics(&self) -> Result<Vec<CollectedMetric>, CollectError>;

    /// How often the caller is expected to poll.
    fn interval(&self) -> Duration;
}

/// Builds collectors from configuration. Construction never does I/O.
pub trait CollectorPlugin {
    /// Name the plugin is registered under, e.g. `"http"`.
    fn name(&self) -> &str;

    fn new_collector(
        &self,
        source: &SourceDescriptor,
        config: &MetricConfig,
        interval: Duration,
    ) -> Result<Box<dyn Collector>, ConfigError>;
}
