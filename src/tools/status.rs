//! OGTT Risk Status Tool
//!
//! Provides runtime status information and usage instructions for the service.

use serde::Serialize;
use std::time::Instant;
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::build_info::BuildInfo;
use crate::config::ServerConfig;

/// Usage instructions for AI assistants
pub const OGTT_INSTRUCTIONS: &str = r#"
# OGTT Risk Stratifier Instructions

This guide explains how to evaluate a patient with the OGTT risk tools.

## Overview

The service applies a fixed four-step algorithm to one patient's measurements:
1. **OGTT indication** - was an oral glucose tolerance test indicated?
2. **Metabolic syndrome (ATP III)** - five criteria, each met / not met / unknown
3. **High-risk prognostic markers** - five trigger combinations of OGTT findings
4. **Age-gated recommendation** - only applies when Step 3 is HIGH RISK

It also calculates IGI, Matsuda index, HOMA-IR, disposition index, weighted
glucose AUC and the Stumvoll first-phase estimate.

Nothing is stored. Every call evaluates the observation it is given from scratch.

---

## Measurement Systems

Pass `measurement_system` as `"US"` or `"SI"`. When omitted, the server default
(reported by `ogtt_status`) is used.

| Field | US | SI |
|-------|----|----|
| Weight | lb | kg |
| Height, waist | in | cm |
| Triglycerides, HDL | mg/dL | mmol/L |
| Glucose (0/30/60/90/120 min) | mg/dL | mmol/L |
| Insulin (0/30/60/90/120 min) | µU/mL | pmol/L |
| Blood pressure | mm Hg | mm Hg |

HbA1c uses its own unit tag: `hba1c_unit` = `"percent"` (default) or `"ifcc"`
(mmol/mol), regardless of the measurement system.

**Never mix systems in one call.** If the user gives glucose in mmol/L and weight
in lb, convert one of them first, or call `convert_displayed_values`.

---

## Entering Values

- Numeric fields accept numbers or numeric text ("1,250" is read as 1250)
- Anything that is not a plain non-negative number is treated as not provided
- Leave a field out when it is unknown. **Do not guess or enter 0.**
- Missing values are never assumed: a metabolic syndrome criterion with missing
  data is reported as unknown, and Step 2 is only "present" when all five
  criteria are known

---

## Tools

| Tool | Use |
|------|-----|
| `evaluate_ogtt_risk` | Full four-step assessment, indices and a text summary |
| `calculate_metabolic_indices` | Indices only |
| `convert_displayed_values` | Re-express entered values in the other system |
| `ogtt_status` | Build info, default system, uptime |

---

## Reading the Result

- `step1.indicated` with `step1.reasons`
- `step2.count`, `step2.complete`, `step2.present` and the met / not_met / unknown lists
- `step3.status` is `HIGH_RISK` or `NOT_HIGH_RISK`; `step3.triggers` names the clauses
- `step4.band` is `not_candidate` (<40), `conditional` (40-49) or `acceptable` (≥50)

Incomplete metabolic syndrome data counts as "not present" for the Step 3
triggers that need it. When Step 2 is incomplete, say so to the user rather than
reporting a confident "not high risk".

This is a clinical decision support and education tool. Always defer to
clinical judgment.
"#;

/// Runtime status of the OGTT risk service
#[derive(Debug, Clone, Serialize)]
pub struct OgttStatus {
    /// Build information
    pub name: &'static str,
    pub version: &'static str,

    /// Configuration
    pub default_measurement_system: &'static str,

    /// Process information
    pub uptime_seconds: u64,
    pub process_id: u32,
    pub memory_usage_bytes: u64,
}

/// Status tracker for collecting runtime information
pub struct StatusTracker {
    start_time: Instant,
    config: ServerConfig,
}

impl StatusTracker {
    /// Create a new status tracker
    pub fn new(config: ServerConfig) -> Self {
        Self {
            start_time: Instant::now(),
            config,
        }
    }

    /// Get the current status
    pub fn get_status(&self) -> OgttStatus {
        let build_info = BuildInfo::current();

        // Get process info
        let pid = std::process::id();
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]));

        let memory_usage_bytes = sys
            .process(Pid::from_u32(pid))
            .map(|p| p.memory())
            .unwrap_or(0);

        OgttStatus {
            name: build_info.name,
            version: build_info.version,
            default_measurement_system: self.config.default_system.as_str(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
            process_id: pid,
            memory_usage_bytes,
        }
    }
}
