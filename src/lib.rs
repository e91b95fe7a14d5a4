//! Pollable metric collectors for autoscaling controllers.
//!
//! The [`collectors::http`] collector fetches a JSON document over HTTP,
//! extracts one number from it with a [`jsonpath::CompiledPath`] and reports
//! it as a milli-scaled external metric.

pub mod collectors;
pub mod config;
pub mod error;
pub mod jsonpath;
