//! Observation models
//!
//! Raw entry-form observations (tagged with the active measurement system) and
//! their canonical, unit-invariant counterpart.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// Measurement system used to interpret raw numeric entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MeasurementSystem {
    /// US conventional: mg/dL, µU/mL, lb, in
    #[default]
    US,
    /// SI: mmol/L, pmol/L, kg, cm
    SI,
}

impl MeasurementSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeasurementSystem::US => "US",
            MeasurementSystem::SI => "SI",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "us" | "conventional" => Some(MeasurementSystem::US),
            "si" | "metric" => Some(MeasurementSystem::SI),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sex {
    M,
    F,
}

impl Sex {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "m" | "male" => Some(Sex::M),
            "f" | "female" => Some(Sex::F),
            _ => None,
        }
    }
}

/// Self-reported ethnicity, as far as the algorithm distinguishes it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum Ethnicity {
    #[serde(rename = "Asian American")]
    AsianAmerican,
    #[serde(rename = "African American")]
    AfricanAmerican,
    #[serde(rename = "Hispanic/Latino")]
    HispanicLatino,
    #[serde(rename = "Native American")]
    NativeAmerican,
    #[serde(rename = "Other")]
    Other,
}

impl Ethnicity {
    /// Parse from a form value; anything unrecognized is `Other`
    pub fn from_str(s: &str) -> Self {
        let normalized: String = s
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();

        match normalized.as_str() {
            "asianamerican" => Ethnicity::AsianAmerican,
            "africanamerican" => Ethnicity::AfricanAmerican,
            "hispaniclatino" => Ethnicity::HispanicLatino,
            "nativeamerican" => Ethnicity::NativeAmerican,
            _ => Ethnicity::Other,
        }
    }

    /// Ethnicities listed as an additional risk factor for OGTT indication
    pub fn is_high_risk(&self) -> bool {
        !matches!(self, Ethnicity::Other)
    }
}

impl From<String> for Ethnicity {
    fn from(s: String) -> Self {
        Ethnicity::from_str(&s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BpMedication {
    Yes,
    No,
}

impl BpMedication {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "yes" | "y" | "true" => Some(BpMedication::Yes),
            "no" | "n" | "false" => Some(BpMedication::No),
            _ => None,
        }
    }
}

/// Entry unit for HbA1c, selected independently of the measurement system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hba1cUnit {
    /// NGSP percent
    #[default]
    Percent,
    /// IFCC mmol/mol
    Ifcc,
}

impl Hba1cUnit {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "percent" | "%" | "ngsp" => Some(Hba1cUnit::Percent),
            "ifcc" | "mmol/mol" => Some(Hba1cUnit::Ifcc),
            _ => None,
        }
    }
}

/// Five OGTT timepoints (0, 30, 60, 90 and 120 minutes)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OgttSeries {
    #[serde(deserialize_with = "entered_measurement")]
    pub fasting: Option<f64>,
    #[serde(deserialize_with = "entered_measurement")]
    pub min30: Option<f64>,
    #[serde(deserialize_with = "entered_measurement")]
    pub min60: Option<f64>,
    #[serde(deserialize_with = "entered_measurement")]
    pub min90: Option<f64>,
    #[serde(deserialize_with = "entered_measurement")]
    pub min120: Option<f64>,
}

impl OgttSeries {
    pub fn values(&self) -> [Option<f64>; 5] {
        [self.fasting, self.min30, self.min60, self.min90, self.min120]
    }

    /// Values that were actually entered, in timepoint order
    pub fn present(&self) -> Vec<f64> {
        self.values().into_iter().flatten().collect()
    }

    /// Apply `f` to every present timepoint; non-finite results are dropped
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        self.and_then(|v| Some(f(v)))
    }

    /// Like `map`, but `f` may drop a timepoint by returning `None`
    pub fn and_then(&self, f: impl Fn(f64) -> Option<f64>) -> Self {
        let apply = |value: Option<f64>| value.and_then(&f).filter(|v| v.is_finite());
        Self {
            fasting: apply(self.fasting),
            min30: apply(self.min30),
            min60: apply(self.min60),
            min90: apply(self.min90),
            min120: apply(self.min120),
        }
    }
}

/// Observation as entered, interpreted under the active measurement system
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawObservation {
    pub test_date: Option<NaiveDate>,
    /// Years
    #[serde(deserialize_with = "entered_measurement")]
    pub age: Option<f64>,
    pub sex: Option<Sex>,
    #[serde(deserialize_with = "entered_ethnicity")]
    pub ethnicity: Option<Ethnicity>,
    /// lb (US) or kg (SI)
    #[serde(deserialize_with = "entered_measurement")]
    pub weight: Option<f64>,
    /// in (US) or cm (SI)
    #[serde(deserialize_with = "entered_measurement")]
    pub height: Option<f64>,
    /// in (US) or cm (SI)
    #[serde(deserialize_with = "entered_measurement")]
    pub waist: Option<f64>,
    /// mg/dL (US) or mmol/L (SI)
    #[serde(deserialize_with = "entered_measurement")]
    pub triglycerides: Option<f64>,
    /// mg/dL (US) or mmol/L (SI)
    #[serde(deserialize_with = "entered_measurement")]
    pub hdl: Option<f64>,
    /// mm Hg in both systems
    #[serde(deserialize_with = "entered_measurement")]
    pub systolic_bp: Option<f64>,
    #[serde(deserialize_with = "entered_measurement")]
    pub diastolic_bp: Option<f64>,
    pub bp_medication: Option<BpMedication>,
    /// Interpreted by `hba1c_unit`, not by the measurement system
    #[serde(deserialize_with = "entered_measurement")]
    pub hba1c: Option<f64>,
    pub hba1c_unit: Option<Hba1cUnit>,
    pub gestational_diabetes: bool,
    pub pancreatitis: bool,
    pub masld: bool,
    pub pcos: bool,
    pub first_degree_relative_t2d: bool,
    /// mg/dL (US) or mmol/L (SI)
    pub glucose: OgttSeries,
    /// µU/mL (US) or pmol/L (SI)
    pub insulin: OgttSeries,
}

/// Observation normalized to fixed physical units
///
/// Glucose and lipids in mg/dL, insulin in pmol/L, weight in kg, lengths in cm and
/// HbA1c in percent. Fields missing from the raw observation stay `None`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CanonicalObservation {
    pub test_date: Option<NaiveDate>,
    pub age: Option<f64>,
    pub sex: Option<Sex>,
    pub ethnicity: Option<Ethnicity>,
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub waist_cm: Option<f64>,
    pub triglycerides_mg_dl: Option<f64>,
    pub hdl_mg_dl: Option<f64>,
    pub systolic_bp: Option<f64>,
    pub diastolic_bp: Option<f64>,
    pub bp_medication: Option<BpMedication>,
    pub hba1c_percent: Option<f64>,
    pub gestational_diabetes: bool,
    pub pancreatitis: bool,
    pub masld: bool,
    pub pcos: bool,
    pub first_degree_relative_t2d: bool,
    pub glucose_mg_dl: OgttSeries,
    pub insulin_pmol_l: OgttSeries,
}

impl CanonicalObservation {
    pub fn on_bp_medication(&self) -> bool {
        self.bp_medication == Some(BpMedication::Yes)
    }

    pub fn is_high_risk_ethnicity(&self) -> bool {
        self.ethnicity.is_some_and(|e| e.is_high_risk())
    }
}

/// Parse a numeric form field
///
/// Commas are stripped and surrounding whitespace trimmed. Anything other than
/// digits with at most one decimal point yields `None`, as does blank text.
pub fn parse_measurement(text: &str) -> Option<f64> {
    let cleaned: String = text.trim().chars().filter(|c| *c != ',').collect();

    let mut digits = 0;
    let mut points = 0;
    for c in cleaned.chars() {
        match c {
            '0'..='9' => digits += 1,
            '.' => points += 1,
            _ => return None,
        }
    }
    if digits == 0 || points > 1 {
        return None;
    }

    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Accept an entered number only when it is finite and non-negative
pub fn measurement_value(value: f64) -> Option<f64> {
    (value.is_finite() && value >= 0.0).then_some(value)
}

/// A numeric field given as a JSON number or as numeric text
#[derive(Deserialize)]
#[serde(untagged)]
enum MeasurementEntry {
    Number(f64),
    Text(String),
}

/// Numeric fields follow the entry-form rules: anything unusable is `None`
fn entered_measurement<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    Ok(match Option::<MeasurementEntry>::deserialize(d)? {
        Some(MeasurementEntry::Number(n)) => measurement_value(n),
        Some(MeasurementEntry::Text(s)) => parse_measurement(&s),
        None => None,
    })
}

/// Blank ethnicity is not provided; unrecognized text is `Other`
fn entered_ethnicity<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Ethnicity>, D::Error> {
    let text = Option::<String>::deserialize(d)?;
    Ok(text
        .filter(|s| !s.trim().is_empty())
        .map(|s| Ethnicity::from_str(&s)))
}
