//! Assessment Tools
//!
//! Tool-facing wrappers around the risk pipeline, plus the plain-text summary.

use serde::Serialize;

use crate::clinical::{convert_displayed_values, evaluate, round_to};
use crate::models::{IndexSet, MeasurementSystem, RawObservation, RiskAssessment};

pub const DISCLAIMER: &str =
    "Disclaimer: Clinical decision support/education tool. No patient data are stored. Use clinical judgment.";

/// Response for evaluate_ogtt_risk
#[derive(Debug, Serialize)]
pub struct EvaluateResponse {
    pub measurement_system: MeasurementSystem,
    pub assessment: RiskAssessment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// Response for calculate_metabolic_indices
#[derive(Debug, Serialize)]
pub struct IndicesResponse {
    pub measurement_system: MeasurementSystem,
    pub indices: IndexSet,
}

/// Response for convert_displayed_values
#[derive(Debug, Serialize)]
pub struct ConvertResponse {
    pub from: MeasurementSystem,
    pub to: MeasurementSystem,
    pub observation: RawObservation,
}

// ============================================================================
// Tool Functions
// ============================================================================

pub fn evaluate_observation(
    raw: &RawObservation,
    system: MeasurementSystem,
    include_summary: bool,
) -> EvaluateResponse {
    let assessment = evaluate(raw, system);
    tracing::info!(
        "Evaluated observation ({}): metabolic syndrome {}, step 3 {}",
        system.as_str(),
        assessment.step2.status_label(),
        assessment.step3.status.display_name()
    );

    let summary = include_summary.then(|| build_summary(&assessment));
    EvaluateResponse {
        measurement_system: system,
        assessment,
        summary,
    }
}

pub fn calculate_indices(raw: &RawObservation, system: MeasurementSystem) -> IndicesResponse {
    IndicesResponse {
        measurement_system: system,
        indices: evaluate(raw, system).indices,
    }
}

pub fn convert_observation(
    raw: &RawObservation,
    from: MeasurementSystem,
    to: MeasurementSystem,
) -> ConvertResponse {
    ConvertResponse {
        from,
        to,
        observation: convert_displayed_values(raw, from, to),
    }
}

// ============================================================================
// Summary
// ============================================================================

fn format_index(value: Option<f64>, decimals: u32) -> String {
    match value.and_then(|v| round_to(v, decimals)) {
        Some(v) => format!("{}", v),
        None => "—".to_string(),
    }
}

/// Build the plain-text summary of an assessment
pub fn build_summary(a: &RiskAssessment) -> String {
    let mut lines: Vec<String> = Vec::new();
    lines.push("OGTT–DM Risk Stratifier".to_string());
    lines.push("—".to_string());
    if let Some(date) = a.observation.test_date {
        lines.push(format!("Test date: {}", date.format("%Y-%m-%d")));
    }
    if let Some(age) = a.observation.age {
        lines.push(format!("Age: {}", age));
    }
    if let Some(bmi) = a.bmi.and_then(|b| round_to(b, 1)) {
        lines.push(format!("BMI: {} kg/m²", bmi));
    }
    lines.push(String::new());

    // Step 1
    let step1 = &a.step1;
    lines.push(format!(
        "Step 1 (OGTT indication): {}",
        if step1.indicated { "YES" } else { "NO" }
    ));
    if step1.indicated {
        let reasons: Vec<String> = step1.reasons.iter().map(|r| r.to_string()).collect();
        lines.push(format!("Reasons: {}", reasons.join("; ")));
    } else {
        lines.push("Reasons: No Step 1 criteria met based on current inputs.".to_string());
    }
    lines.push(String::new());

    // Step 2
    let step2 = &a.step2;
    let mets = if !step2.complete {
        let missing: Vec<&str> = step2.unknown.iter().map(|c| c.display_name()).collect();
        format!("UNKNOWN ({}/5 met; missing: {})", step2.count, missing.join(", "))
    } else if step2.present {
        format!("PRESENT ({}/5)", step2.count)
    } else {
        format!("ABSENT ({}/5)", step2.count)
    };
    lines.push(format!("Step 2 (Metabolic syndrome): {}", mets));
    lines.push(String::new());

    // Step 3
    let step3 = &a.step3;
    lines.push(format!(
        "Step 3 (High-risk prognostic markers): {}",
        step3.status.display_name()
    ));
    if step3.triggers.is_empty() {
        lines.push(
            "Triggered findings: No Step 3 markers triggered based on current inputs.".to_string(),
        );
    } else {
        let triggers: Vec<String> = step3.triggers.iter().map(|t| t.to_string()).collect();
        lines.push(format!("Triggered findings: {}", triggers.join("; ")));
    }
    lines.push(String::new());

    let idx = &a.indices;
    lines.push("Calculated indices:".to_string());
    lines.push(format!("- IGI: {}", format_index(idx.igi, 2)));
    lines.push(format!("- Matsuda index: {}", format_index(idx.matsuda_index, 2)));
    lines.push(format!("- HOMA-IR: {}", format_index(idx.homa_ir, 2)));
    lines.push(format!("- DI: {}", format_index(idx.disposition_index, 2)));
    lines.push(format!(
        "- PG AUC (weighted): {}",
        format_index(idx.weighted_glucose_auc, 1)
    ));
    lines.push(format!(
        "- Stumvoll 1st-phase: {}",
        format_index(idx.stumvoll_first_phase, 0)
    ));
    lines.push(String::new());

    lines.push("Step 4 recommendation:".to_string());
    lines.push(a.step4.text.clone());
    lines.push(String::new());
    lines.push(DISCLAIMER.to_string());

    lines.join("\n")
}
