use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::Url;
use serde_json::Value;
use tracing::{debug, trace};

use crate::collectors::{CollectedMetric, Collector, MetricSourceType, MilliQuantity};
use crate::error::{CollectError, ExtractError, FetchError};
use crate::jsonpath::{CompiledPath, Reduction};

/// Polls one HTTP endpoint and reports the number found at its JSON path.
///
/// Holds no per-call state, so a single instance can be polled from several
/// threads at once.
#[derive(Debug, Clone)]
pub struct HttpCollector {
    pub(super) client: Client,
    pub(super) endpoint: String,
    pub(super) url: Url,
    pub(super) json_path: CompiledPath,
    pub(super) reduction: Option<Reduction>,
    pub(super) interval: Duration,
    pub(super) metric_type: MetricSourceType,
}

impl HttpCollector {
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn json_path(&self) -> &CompiledPath {
        &self.json_path
    }

    pub fn reduction(&self) -> Option<Reduction> {
        self.reduction
    }

    pub fn metric_type(&self) -> MetricSourceType {
        self.metric_type
    }

    fn fetch(&self) -> Result<impl AsRef<[u8]>, FetchError> {
        let response = self.client.get(self.url.clone()).send()?;
        let status = response.status();
        debug!(endpoint = %self.endpoint, status = status.as_u16(), "Fetched metric endpoint");

        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("unknown").to_string(),
            });
        }
        Ok(response.bytes()?)
    }

    fn extract(&self, document: &Value) -> Result<f64, ExtractError> {
        self.json_path.lookup(document)?.reduce(self.reduction)
    }
}

impl Collector for HttpCollector {
    fn get_metrics(&self) -> Result<Vec<CollectedMetric>, CollectError> {
        let body = self.fetch().map_err(|source| CollectError::Fetch {
            endpoint: self.endpoint.clone(),
            source,
        })?;

        let document: Value =
            serde_json::from_slice(body.as_ref()).map_err(|source| CollectError::Decode {
                endpoint: self.endpoint.clone(),
                source,
            })?;

        let value = self.extract(&document).map_err(|source| CollectError::Extract {
            endpoint: self.endpoint.clone(),
            source,
        })?;
        trace!(endpoint = %self.endpoint, json_path = %self.json_path, value, "Extracted metric value");

        Ok(vec![CollectedMetric::external(
            self.metric_type,
            self.endpoint.clone(),
            MilliQuantity::from_f64(value),
        )])
    }

    fn interval(&self) -> Duration {
        self.interval
    }
}
