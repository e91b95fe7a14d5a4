pub mod types;
pub mod quantity;
pub mod http;

pub use types::*;
pub use quantity::MilliQuantity;
pub use http::{HttpCollector, HttpCollectorPlugin};
