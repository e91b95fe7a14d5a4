pub mod collector;

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::Url;
use tracing::debug;

use super::{Collector, CollectorPlugin, MetricConfig, SourceDescriptor};
use crate::error::ConfigError;
use crate::jsonpath::{CompiledPath, Reduction};

pub use collector::HttpCollector;

pub const HTTP_METRIC_NAME: &str = "http";
pub const ENDPOINT_KEY: &str = "endpoint";
pub const JSON_PATH_KEY: &str = "json-path";
pub const REDUCE_KEY: &str = "reduce";

/// Builds [`HttpCollector`]s. Every collector shares the plugin's client and
/// therefore its connection pool.
#[derive(Debug, Clone)]
pub struct HttpCollectorPlugin {
    client: Client,
}

impl HttpCollectorPlugin {
    /// Uses a default blocking client. Must not be called from inside an
    /// async runtime.
    pub fn new() -> Self {
        Self::with_client(Client::new())
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Validates `config` and compiles its path without touching the network.
    pub fn build(
        &self,
        source: &SourceDescriptor,
        config: &MetricConfig,
        interval: Duration,
    ) -> Result<HttpCollector, ConfigError> {
        let query = config.require(JSON_PATH_KEY)?;
        let json_path =
            CompiledPath::compile(query).map_err(|source| ConfigError::InvalidPathQuery {
                query: query.to_string(),
                source,
            })?;

        let reduction = config
            .get(REDUCE_KEY)
            .map(str::parse::<Reduction>)
            .transpose()?;
        if reduction.is_none() && !json_path.is_definite() {
            return Err(ConfigError::MissingReduction {
                query: query.to_string(),
            });
        }

        let endpoint = config.require(ENDPOINT_KEY)?;
        let url = parse_endpoint(endpoint)?;

        debug!(
            source = %source,
            endpoint,
            json_path = %json_path,
            reduce = reduction.map(Reduction::as_str),
            interval_secs = interval.as_secs_f64(),
            "Created http collector"
        );

        Ok(HttpCollector {
            client: self.client.clone(),
            endpoint: endpoint.to_string(),
            url,
            json_path,
            reduction,
            interval,
            metric_type: config.metric_type(),
        })
    }
}

impl Default for HttpCollectorPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl CollectorPlugin for HttpCollectorPlugin {
    fn name(&self) -> &str {
        HTTP_METRIC_NAME
    }

    fn new_collector(
        &self,
        source: &SourceDescriptor,
        config: &MetricConfig,
        interval: Duration,
    ) -> Result<Box<dyn Collector>, ConfigError> {
        Ok(Box::new(self.build(source, config, interval)?))
    }
}

fn parse_endpoint(endpoint: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason,
    };
    let url = Url::parse(endpoint).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(invalid(format!("unsupported scheme {scheme}"))),
    }
}
