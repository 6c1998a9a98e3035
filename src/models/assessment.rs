//! Assessment models
//!
//! Per-step results of the four-step risk algorithm and the aggregate
//! `RiskAssessment` handed to presentation.

use std::fmt;

use serde::{Serialize, Serializer};

use super::observation::CanonicalObservation;

/// Derived metabolic indices; `None` when an operand is missing or undefined
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct IndexSet {
    pub igi: Option<f64>,
    pub matsuda_index: Option<f64>,
    pub homa_ir: Option<f64>,
    pub disposition_index: Option<f64>,
    pub weighted_glucose_auc: Option<f64>,
    pub stumvoll_first_phase: Option<f64>,
}

// ============================================================================
// Step 1: OGTT indication
// ============================================================================

/// Why an OGTT is indicated
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndicationReason {
    FastingGlucose,
    Hba1c,
    GestationalDiabetes,
    Pancreatitis,
    /// Header line for the compound BMI rule; the matched factors follow it
    BmiPlusRiskFactors { threshold: f64 },
    Masld,
    Hypertension,
    Dyslipidemia,
    Pcos,
    FirstDegreeRelative,
    HighRiskEthnicity,
}

impl fmt::Display for IndicationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicationReason::FastingGlucose => f.write_str("FPG 100–125 mg/dL"),
            IndicationReason::Hba1c => f.write_str("HbA1c 5.7–6.4%"),
            IndicationReason::GestationalDiabetes => f.write_str("History of gestational diabetes"),
            IndicationReason::Pancreatitis => f.write_str("History of pancreatitis"),
            IndicationReason::BmiPlusRiskFactors { threshold } => write!(
                f,
                "BMI ≥{} kg/m² plus one or more of the following:",
                threshold
            ),
            IndicationReason::Masld => f.write_str("MASLD"),
            IndicationReason::Hypertension => {
                f.write_str("Hypertension ≥130/80 mm Hg or on treatment")
            }
            IndicationReason::Dyslipidemia => f.write_str(
                "Dyslipidemia (HDL <35 mg/dL and/or triglycerides >250 mg/dL)",
            ),
            IndicationReason::Pcos => f.write_str("PCOS"),
            IndicationReason::FirstDegreeRelative => f.write_str("First-degree relative with T2D"),
            IndicationReason::HighRiskEthnicity => f.write_str("High-risk ethnicity"),
        }
    }
}

impl Serialize for IndicationReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OgttIndication {
    pub indicated: bool,
    pub reasons: Vec<IndicationReason>,
    pub bmi: Option<f64>,
    pub bmi_threshold: f64,
}

// ============================================================================
// Step 2: ATP III metabolic syndrome
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MetsCriterion {
    #[serde(rename = "Waist circumference")]
    WaistCircumference,
    #[serde(rename = "Triglycerides")]
    Triglycerides,
    #[serde(rename = "HDL")]
    Hdl,
    #[serde(rename = "Blood pressure")]
    BloodPressure,
    #[serde(rename = "Fasting glucose")]
    FastingGlucose,
}

impl MetsCriterion {
    pub const ALL: [MetsCriterion; 5] = [
        MetsCriterion::WaistCircumference,
        MetsCriterion::Triglycerides,
        MetsCriterion::Hdl,
        MetsCriterion::BloodPressure,
        MetsCriterion::FastingGlucose,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            MetsCriterion::WaistCircumference => "Waist circumference",
            MetsCriterion::Triglycerides => "Triglycerides",
            MetsCriterion::Hdl => "HDL",
            MetsCriterion::BloodPressure => "Blood pressure",
            MetsCriterion::FastingGlucose => "Fasting glucose",
        }
    }
}

/// Tri-state outcome of a single criterion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CriterionStatus {
    Met,
    NotMet,
    Unknown,
}

impl CriterionStatus {
    /// `None` (missing data) maps to `Unknown`
    pub fn from_check(check: Option<bool>) -> Self {
        match check {
            Some(true) => CriterionStatus::Met,
            Some(false) => CriterionStatus::NotMet,
            None => CriterionStatus::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetabolicSyndrome {
    pub count: usize,
    pub present: bool,
    pub complete: bool,
    pub met: Vec<MetsCriterion>,
    pub not_met: Vec<MetsCriterion>,
    pub unknown: Vec<MetsCriterion>,
}

impl MetabolicSyndrome {
    /// Assemble from per-criterion outcomes, keeping criterion order
    pub fn from_outcomes(outcomes: &[(MetsCriterion, CriterionStatus)]) -> Self {
        let pick = |wanted: CriterionStatus| -> Vec<MetsCriterion> {
            outcomes
                .iter()
                .filter(|(_, status)| *status == wanted)
                .map(|(criterion, _)| *criterion)
                .collect()
        };

        let met = pick(CriterionStatus::Met);
        let not_met = pick(CriterionStatus::NotMet);
        let unknown = pick(CriterionStatus::Unknown);

        let count = met.len();
        let complete = unknown.is_empty();

        Self {
            count,
            present: count >= 3 && complete,
            complete,
            met,
            not_met,
            unknown,
        }
    }

    pub fn status_label(&self) -> String {
        if !self.complete {
            format!("Incomplete ({}/5 met)", self.count)
        } else if self.present {
            format!("Present ({}/5)", self.count)
        } else {
            format!("Not present ({}/5)", self.count)
        }
    }
}

// ============================================================================
// Step 3: high-risk prognostic markers
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskStatus {
    HighRisk,
    NotHighRisk,
}

impl RiskStatus {
    pub fn display_name(&self) -> &'static str {
        match self {
            RiskStatus::HighRisk => "HIGH RISK",
            RiskStatus::NotHighRisk => "Not high-risk",
        }
    }
}

/// One of the five high-risk trigger clauses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HighRiskTrigger {
    IgtOneHourMets,
    CombinedIfgIgt,
    IfgOneHourMets,
    OneHourA1cMidRange,
    /// At least one of the two secretion markers is set
    OneHourLowSecretion { igi_low: bool, stumvoll_low: bool },
}

impl fmt::Display for HighRiskTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HighRiskTrigger::IgtOneHourMets => {
                f.write_str("IGT + 1-hour PG >155 mg/dL + metabolic syndrome")
            }
            HighRiskTrigger::CombinedIfgIgt => f.write_str("Combined IFG and IGT"),
            HighRiskTrigger::IfgOneHourMets => {
                f.write_str("IFG + 1-hour PG >155 mg/dL + metabolic syndrome")
            }
            HighRiskTrigger::OneHourA1cMidRange => {
                f.write_str("IGT or IFG + 1-hour PG >155 mg/dL + HbA1c 6.0–6.4%")
            }
            HighRiskTrigger::OneHourLowSecretion { igi_low, stumvoll_low } => {
                let mut markers = Vec::new();
                if *igi_low {
                    markers.push("IGI ≤0.82");
                }
                if *stumvoll_low {
                    markers.push("1st-phase ≤899 pmol/L");
                }
                write!(f, "IGT or IFG + 1-hour PG >155 mg/dL + {}", markers.join(" and "))
            }
        }
    }
}

impl Serialize for HighRiskTrigger {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HighRiskMarkers {
    pub status: RiskStatus,
    pub triggers: Vec<HighRiskTrigger>,
    /// Fasting glucose 100-125 mg/dL
    pub ifg: bool,
    /// 2-hour glucose 140-199 mg/dL
    pub igt: bool,
    /// Fasting glucose ≥126 mg/dL
    pub diabetes_fasting: bool,
    /// 2-hour glucose ≥200 mg/dL
    pub diabetes_2hr: bool,
    /// 1-hour glucose >155 mg/dL
    pub one_hour_high: bool,
    /// HbA1c 6.0-6.4%
    pub a1c_mid_range: bool,
    pub igi: Option<f64>,
    pub igi_low: bool,
    pub stumvoll_first_phase: Option<f64>,
    pub stumvoll_low: bool,
}

impl HighRiskMarkers {
    pub fn is_high_risk(&self) -> bool {
        self.status == RiskStatus::HighRisk
    }
}

// ============================================================================
// Step 4: age-gated recommendation
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeBand {
    /// Under 40
    NotCandidate,
    /// 40 to under 50
    Conditional,
    /// 50 and over
    Acceptable,
}

impl AgeBand {
    pub fn for_age(age: f64) -> Self {
        if age < 40.0 {
            AgeBand::NotCandidate
        } else if age < 50.0 {
            AgeBand::Conditional
        } else {
            AgeBand::Acceptable
        }
    }

    pub fn text(&self) -> &'static str {
        match self {
            AgeBand::NotCandidate => "Age <40 years — Not a candidate (high risk).",
            AgeBand::Conditional => {
                "Age 40–49 years — Consider only if able to reverse high-risk prognostic markers with weight loss on repeat OGTT."
            }
            AgeBand::Acceptable => {
                "Age ≥50 years — Can be accepted after risk mitigation with 5–10% weight loss."
            }
        }
    }
}

pub const NOT_APPLICABLE_TEXT: &str = "Not in high-risk group based on Step 3 criteria.";
pub const AGE_NEEDED_TEXT: &str = "Enter age to apply Step 4.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    /// True only when Step 3 reported high risk
    pub applicable: bool,
    /// `None` when not applicable or age is missing
    pub band: Option<AgeBand>,
    pub text: String,
}

impl Recommendation {
    pub fn not_applicable() -> Self {
        Self {
            applicable: false,
            band: None,
            text: NOT_APPLICABLE_TEXT.to_string(),
        }
    }

    pub fn age_needed() -> Self {
        Self {
            applicable: true,
            band: None,
            text: AGE_NEEDED_TEXT.to_string(),
        }
    }

    pub fn for_band(band: AgeBand) -> Self {
        Self {
            applicable: true,
            band: Some(band),
            text: band.text().to_string(),
        }
    }
}

// ============================================================================
// Aggregate
// ============================================================================

/// Everything the four-step algorithm concluded for one observation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskAssessment {
    pub observation: CanonicalObservation,
    pub bmi: Option<f64>,
    pub step1: OgttIndication,
    pub step2: MetabolicSyndrome,
    pub step3: HighRiskMarkers,
    pub step4: Recommendation,
    pub indices: IndexSet,
}
