use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A magnitude stored as an integer number of thousandths, rendered the way
/// Kubernetes renders a `DecimalSI` milli-quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct MilliQuantity(i64);

impl MilliQuantity {
    pub fn new(milli_value: i64) -> Self {
        Self(milli_value)
    }

    /// Multiplies by 1000 and truncates toward zero. Out-of-range values
    /// saturate at the `i64` bounds.
    pub fn from_f64(value: f64) -> Self {
        Self((value * 1000.0) as i64)
    }

    pub fn milli_value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for MilliQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 % 1000 == 0 {
            write!(f, "{}", self.0 / 1000)
        } else {
            write!(f, "{}m", self.0)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid quantity {0:?}")]
pub struct ParseQuantityError(String);

impl FromStr for MilliQuantity {
    type Err = ParseQuantityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseQuantityError(s.to_string());
        match s.strip_suffix('m') {
            Some(milli) => milli.parse().map(Self).map_err(|_| invalid()),
            None => s
                .parse::<i64>()
                .ok()
                .and_then(|units| units.checked_mul(1000))
                .map(Self)
                .ok_or_else(invalid),
        }
    }
}

impl Serialize for MilliQuantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MilliQuantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
