//! OGTT Risk Stratifier
//!
//! An MCP server for four-step OGTT diabetes-risk assessment.

use rmcp::ServiceExt;
use tokio::io::{stdin, stdout};
use tracing_subscriber::EnvFilter;

use ogtt_risk::build_info;
use ogtt_risk::config::ServerConfig;
use ogtt_risk::mcp::OgttService;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (output to stderr to not interfere with MCP stdio)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("ogtt_risk=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    // Print startup banner to stderr
    build_info::print_startup_banner();
    eprintln!("Starting MCP server on stdio...");

    let config = ServerConfig::from_env()?;
    eprintln!(
        "Default measurement system: {}",
        config.default_system.as_str()
    );

    // Create the service
    let service = OgttService::new(config);

    // Create stdio transport
    let transport = (stdin(), stdout());

    // Start the MCP server
    let server = service.serve(transport).await?;
    tracing::info!("MCP server ready");

    // Wait for the server to complete
    server.waiting().await?;

    Ok(())
}
