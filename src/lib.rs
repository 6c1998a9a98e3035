//! OGTT Risk Stratifier Library
//!
//! Four-step diabetes-risk assessment from a single patient's anthropometric,
//! laboratory and oral glucose tolerance test measurements.

pub mod build_info;
pub mod clinical;
pub mod config;
pub mod mcp;
pub mod models;
pub mod tools;

pub use clinical::{convert_displayed_values, evaluate};
