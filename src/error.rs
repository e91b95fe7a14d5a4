/// A path-query expression that could not be compiled.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} at offset {offset}")]
pub struct PathParseError {
    pub offset: usize,
    pub message: String,
}

/// Errors raised while building a collector. No collector exists when one of
/// these is returned.
///
/// # Examples
///
/// ```rust
/// use httpmetrics::error::ConfigError;
///
/// let err = ConfigError::MissingConfig { key: "endpoint".to_string() };
/// assert!(err.to_string().contains("endpoint"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config value {key} not found")]
    MissingConfig { key: String },

    #[error("failed to parse json path {query:?}: {source}")]
    InvalidPathQuery {
        query: String,
        #[source]
        source: PathParseError,
    },

    /// The path can select several values but no `reduce` policy was given.
    #[error("json path {query:?} selects multiple values; set `reduce` to one of sum, mean, min, max, first, last")]
    MissingReduction { query: String },

    #[error("unknown reduction {value:?}; expected one of sum, mean, min, max, first, last")]
    InvalidReduction { value: String },

    #[error("invalid endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
}

/// Failure of the HTTP request itself.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("unsuccessful response: {status} {reason}")]
    Status { status: u16, reason: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Failure to turn a decoded document into a number.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExtractError {
    #[error("json path {path:?} matched nothing")]
    PathNotFound { path: String },

    #[error("unsupported type {type_name}")]
    UnsupportedResultType { type_name: &'static str },

    #[error("slice was returned by json path, but value at index {index} is unsupported: {type_name}")]
    UnsupportedElementType {
        index: usize,
        type_name: &'static str,
    },

    #[error("json path returned {len} values but no reduction is configured")]
    ReductionRequired { len: usize },
}

/// Errors from a single `get_metrics` call. They never affect later calls.
#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    #[error("failed to fetch {endpoint}: {source}")]
    Fetch {
        endpoint: String,
        #[source]
        source: FetchError,
    },

    #[error("failed to decode response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to extract metric from {endpoint}: {source}")]
    Extract {
        endpoint: String,
        #[source]
        source: ExtractError,
    },
}

impl CollectError {
    /// Extraction failure behind this error, if any.
    pub fn extract_error(&self) -> Option<&ExtractError> {
        match self {
            CollectError::Extract { source, .. } => Some(source),
            _ => None,
        }
    }
}
