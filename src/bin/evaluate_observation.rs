//! Utility to evaluate an observation stored as JSON
//!
//! Usage: evaluate_observation <observation.json> [US|SI]
//! Reads stdin when the path is "-". The system defaults to OGTT_MEASUREMENT_SYSTEM.

use std::io::Read;

use ogtt_risk::config::ServerConfig;
use ogtt_risk::models::{MeasurementSystem, RawObservation};
use ogtt_risk::tools::assessment::build_summary;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let path = args.next().unwrap_or_else(|| "-".to_string());

    let system = match args.next() {
        Some(s) => MeasurementSystem::from_str(&s)
            .ok_or_else(|| format!("Unknown measurement system '{}' (expected US or SI)", s))?,
        None => ServerConfig::from_env()?.default_system,
    };

    let json = if path == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(&path)?
    };

    let raw = parse_observation(&json)?;
    let assessment = ogtt_risk::evaluate(&raw, system);

    println!("Measurement system: {}", system.as_str());
    println!();
    println!("{}", build_summary(&assessment));

    Ok(())
}

/// Numeric fields follow the entry-form rules; unknown ethnicity reads as Other
fn parse_observation(json: &str) -> Result<RawObservation, serde_json::Error> {
    serde_json::from_str(json)
}
