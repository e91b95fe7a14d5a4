//! JSONPath subset used to pick a metric value out of a response body.
//!
//! Supported selectors: `$`, `.name`, `['name']`, `[n]` (negative counts
//! from the end), `[a,b]`, `[start:end]`, `.*` / `[*]`, `..name` and
//! `[?(@.field OP literal)]` / `[?(@.field)]` filters.

mod eval;
mod parser;

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::error::{ConfigError, ExtractError, PathParseError};

/// A parsed path-query expression. Immutable once compiled, so one instance
/// can be evaluated from any number of threads.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledPath {
    query: String,
    steps: Vec<parser::Step>,
}

/// Numeric result of evaluating a [`CompiledPath`].
#[derive(Debug, Clone, PartialEq)]
pub enum Extracted {
    Scalar(f64),
    Sequence(Vec<f64>),
}

impl CompiledPath {
    pub fn compile(query: &str) -> Result<Self, PathParseError> {
        let steps = parser::parse(query)?;
        Ok(Self {
            query: query.to_string(),
            steps,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.query
    }

    /// A definite path selects at most one value; anything with a wildcard,
    /// slice, union, filter or descendant step may select many.
    pub fn is_definite(&self) -> bool {
        self.steps.iter().all(parser::Step::is_definite)
    }

    /// Evaluates the path against `document` and coerces the match to `f64`.
    ///
    /// A single matched array is treated like a multi-value match: every
    /// element must be a number.
    pub fn lookup(&self, document: &Value) -> Result<Extracted, ExtractError> {
        let mut matched = eval::select(&self.steps, document);

        if self.is_definite() {
            return match matched.pop() {
                Some(Value::Array(items)) => self.sequence(items.iter()),
                Some(value) => as_f64(value).map(Extracted::Scalar).ok_or(
                    ExtractError::UnsupportedResultType {
                        type_name: type_name(value),
                    },
                ),
                None => Err(self.not_found()),
            };
        }

        self.sequence(matched.into_iter())
    }

    fn sequence<'v>(
        &self,
        values: impl Iterator<Item = &'v Value>,
    ) -> Result<Extracted, ExtractError> {
        let values = cast_slice(values)?;
        if values.is_empty() {
            return Err(self.not_found());
        }
        Ok(Extracted::Sequence(values))
    }

    fn not_found(&self) -> ExtractError {
        ExtractError::PathNotFound {
            path: self.query.clone(),
        }
    }
}

impl fmt::Display for CompiledPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.query)
    }
}

impl Extracted {
    /// Collapses the result to one value. Scalars pass through untouched;
    /// sequences need an explicit policy.
    pub fn reduce(self, reduction: Option<Reduction>) -> Result<f64, ExtractError> {
        match (self, reduction) {
            (Extracted::Scalar(value), _) => Ok(value),
            (Extracted::Sequence(values), Some(reduction)) => Ok(reduction.apply(&values)),
            (Extracted::Sequence(values), None) => {
                Err(ExtractError::ReductionRequired { len: values.len() })
            }
        }
    }
}

/// How a multi-value match is turned into a single reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reduction {
    Sum,
    Mean,
    Min,
    Max,
    First,
    Last,
}

impl Reduction {
    /// `values` must not be empty; [`CompiledPath::lookup`] never yields an
    /// empty sequence.
    pub fn apply(self, values: &[f64]) -> f64 {
        match self {
            Reduction::Sum => values.iter().sum(),
            Reduction::Mean => values.iter().sum::<f64>() / values.len() as f64,
            Reduction::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
            Reduction::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Reduction::First => values.first().copied().unwrap_or_default(),
            Reduction::Last => values.last().copied().unwrap_or_default(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Reduction::Sum => "sum",
            Reduction::Mean => "mean",
            Reduction::Min => "min",
            Reduction::Max => "max",
            Reduction::First => "first",
            Reduction::Last => "last",
        }
    }
}

impl FromStr for Reduction {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sum" => Ok(Reduction::Sum),
            "mean" | "avg" => Ok(Reduction::Mean),
            "min" => Ok(Reduction::Min),
            "max" => Ok(Reduction::Max),
            "first" => Ok(Reduction::First),
            "last" => Ok(Reduction::Last),
            _ => Err(ConfigError::InvalidReduction {
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Reduction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Any JSON number becomes an `f64`, whether it was written as an integer or
/// a float.
pub fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

/// Converts every element, in order, failing on the first non-number.
pub fn cast_slice<'v>(values: impl IntoIterator<Item = &'v Value>) -> Result<Vec<f64>, ExtractError> {
    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            as_f64(value).ok_or(ExtractError::UnsupportedElementType {
                index,
                type_name: type_name(value),
            })
        })
        .collect()
}

pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
