//! OGTT Risk Tools module
//!
//! MCP tool implementations for the OGTT risk stratifier.

pub mod assessment;
pub mod status;
