//! OGTT Risk MCP Server Implementation
//!
//! Implements the MCP server with all OGTT risk tools.

use std::sync::Arc;

use chrono::NaiveDate;
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::config::ServerConfig;
use crate::models::{
    measurement_value, parse_measurement, BpMedication, Ethnicity, Hba1cUnit, MeasurementSystem, OgttSeries,
    RawObservation, Sex,
};
use crate::tools::assessment;
use crate::tools::status::StatusTracker;

/// Tool parameter validation errors
#[derive(Debug, Error)]
pub enum ParamError {
    #[error("Unknown measurement system '{0}' (expected US or SI)")]
    MeasurementSystem(String),

    #[error("Unknown sex '{0}' (expected M or F)")]
    Sex(String),

    #[error("Unknown bp_medication value '{0}' (expected yes or no)")]
    BpMedication(String),

    #[error("Unknown hba1c_unit '{0}' (expected percent or ifcc)")]
    Hba1cUnit(String),

    #[error("Invalid test_date '{0}' (expected YYYY-MM-DD)")]
    TestDate(String),
}

impl From<ParamError> for McpError {
    fn from(e: ParamError) -> Self {
        McpError::invalid_params(e.to_string(), None)
    }
}

/// OGTT Risk MCP Service
#[derive(Clone)]
pub struct OgttService {
    status_tracker: Arc<Mutex<StatusTracker>>,
    config: ServerConfig,
    tool_router: ToolRouter<OgttService>,
}

impl OgttService {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            status_tracker: Arc::new(Mutex::new(StatusTracker::new(config.clone()))),
            config,
            tool_router: Self::tool_router(),
        }
    }

    fn resolve_system(&self, value: Option<&str>) -> Result<MeasurementSystem, ParamError> {
        match non_blank(value) {
            Some(s) => MeasurementSystem::from_str(s)
                .ok_or_else(|| ParamError::MeasurementSystem(s.to_string())),
            None => Ok(self.config.default_system),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// Parse an optional enum field; blank means not provided
fn parse_choice<T>(
    value: Option<&str>,
    parse: fn(&str) -> Option<T>,
    error: fn(String) -> ParamError,
) -> Result<Option<T>, ParamError> {
    match non_blank(value) {
        Some(s) => parse(s).map(Some).ok_or_else(|| error(s.to_string())),
        None => Ok(None),
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("Serialization error: {}", e), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

// ============================================================================
// Observation Parameter Structs
// ============================================================================

/// A numeric entry: a JSON number or numeric text such as "1,250"
#[derive(Debug, Clone, Deserialize, schemars::JsonSchema)]
#[serde(untagged)]
pub enum FieldInput {
    Number(f64),
    Text(String),
}

impl FieldInput {
    /// The entered value, or `None` when it is not a plain non-negative number
    pub fn value(&self) -> Option<f64> {
        match self {
            FieldInput::Number(n) => measurement_value(*n),
            FieldInput::Text(s) => parse_measurement(s),
        }
    }
}

fn field(input: &Option<FieldInput>) -> Option<f64> {
    input.as_ref().and_then(FieldInput::value)
}

#[derive(Debug, Clone, Default, Deserialize, schemars::JsonSchema)]
pub struct ObservationParams {
    /// Date of the OGTT (YYYY-MM-DD)
    pub test_date: Option<String>,
    /// Age in years
    pub age: Option<FieldInput>,
    /// M or F
    pub sex: Option<String>,
    /// Asian American, African American, Hispanic/Latino, Native American, or other
    pub ethnicity: Option<String>,
    /// Weight (lb in US, kg in SI)
    pub weight: Option<FieldInput>,
    /// Height (in in US, cm in SI)
    pub height: Option<FieldInput>,
    /// Waist circumference (in in US, cm in SI)
    pub waist: Option<FieldInput>,
    /// Triglycerides (mg/dL in US, mmol/L in SI)
    pub triglycerides: Option<FieldInput>,
    /// HDL cholesterol (mg/dL in US, mmol/L in SI)
    pub hdl: Option<FieldInput>,
    /// Systolic blood pressure, mm Hg
    pub systolic_bp: Option<FieldInput>,
    /// Diastolic blood pressure, mm Hg
    pub diastolic_bp: Option<FieldInput>,
    /// On blood pressure medication: yes or no
    pub bp_medication: Option<String>,
    /// HbA1c in the unit given by hba1c_unit
    pub hba1c: Option<FieldInput>,
    /// percent (default) or ifcc (mmol/mol)
    pub hba1c_unit: Option<String>,
    #[serde(default)]
    pub gestational_diabetes: bool,
    #[serde(default)]
    pub pancreatitis: bool,
    #[serde(default)]
    pub masld: bool,
    #[serde(default)]
    pub pcos: bool,
    #[serde(default)]
    pub first_degree_relative_t2d: bool,
    /// Glucose at 0, 30, 60, 90, 120 minutes (mg/dL in US, mmol/L in SI)
    pub glucose_0: Option<FieldInput>,
    pub glucose_30: Option<FieldInput>,
    pub glucose_60: Option<FieldInput>,
    pub glucose_90: Option<FieldInput>,
    pub glucose_120: Option<FieldInput>,
    /// Insulin at 0, 30, 60, 90, 120 minutes (µU/mL in US, pmol/L in SI)
    pub insulin_0: Option<FieldInput>,
    pub insulin_30: Option<FieldInput>,
    pub insulin_60: Option<FieldInput>,
    pub insulin_90: Option<FieldInput>,
    pub insulin_120: Option<FieldInput>,
}

impl ObservationParams {
    /// Build a raw observation; numeric fields never fail, enum fields must be recognized
    pub fn to_raw(&self) -> Result<RawObservation, ParamError> {
        let test_date = match non_blank(self.test_date.as_deref()) {
            Some(s) => Some(
                NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .map_err(|_| ParamError::TestDate(s.to_string()))?,
            ),
            None => None,
        };

        Ok(RawObservation {
            test_date,
            age: field(&self.age),
            sex: parse_choice(self.sex.as_deref(), Sex::from_str, ParamError::Sex)?,
            ethnicity: non_blank(self.ethnicity.as_deref()).map(Ethnicity::from_str),
            weight: field(&self.weight),
            height: field(&self.height),
            waist: field(&self.waist),
            triglycerides: field(&self.triglycerides),
            hdl: field(&self.hdl),
            systolic_bp: field(&self.systolic_bp),
            diastolic_bp: field(&self.diastolic_bp),
            bp_medication: parse_choice(
                self.bp_medication.as_deref(),
                BpMedication::from_str,
                ParamError::BpMedication,
            )?,
            hba1c: field(&self.hba1c),
            hba1c_unit: parse_choice(
                self.hba1c_unit.as_deref(),
                Hba1cUnit::from_str,
                ParamError::Hba1cUnit,
            )?,
            gestational_diabetes: self.gestational_diabetes,
            pancreatitis: self.pancreatitis,
            masld: self.masld,
            pcos: self.pcos,
            first_degree_relative_t2d: self.first_degree_relative_t2d,
            glucose: OgttSeries {
                fasting: field(&self.glucose_0),
                min30: field(&self.glucose_30),
                min60: field(&self.glucose_60),
                min90: field(&self.glucose_90),
                min120: field(&self.glucose_120),
            },
            insulin: OgttSeries {
                fasting: field(&self.insulin_0),
                min30: field(&self.insulin_30),
                min60: field(&self.insulin_60),
                min90: field(&self.insulin_90),
                min120: field(&self.insulin_120),
            },
        })
    }
}

// ============================================================================
// Tool Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct EvaluateOgttRiskParams {
    /// US or SI (defaults to the server setting)
    pub measurement_system: Option<String>,
    /// Include the plain-text summary (default true)
    #[serde(default = "default_true")]
    pub include_summary: bool,
    #[serde(flatten)]
    pub observation: ObservationParams,
}

fn default_true() -> bool { true }

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CalculateIndicesParams {
    /// US or SI (defaults to the server setting)
    pub measurement_system: Option<String>,
    #[serde(flatten)]
    pub observation: ObservationParams,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ConvertDisplayedValuesParams {
    /// System the values are currently entered in: US or SI
    pub from: String,
    /// System to convert to: US or SI
    pub to: String,
    #[serde(flatten)]
    pub observation: ObservationParams,
}

// ============================================================================
// Tool Implementations
// ============================================================================

#[tool_router]
impl OgttService {
    // --- Status ---

    #[tool(description = "Get the current status of the OGTT risk service including build info, default measurement system, and process information")]
    async fn ogtt_status(&self) -> Result<CallToolResult, McpError> {
        let tracker = self.status_tracker.lock().await;
        let status = tracker.get_status();
        to_json(&status)
    }

    #[tool(description = "Get instructions for entering observations and reading the four-step risk assessment. Call this before the first evaluation or when unsure about units.")]
    fn ogtt_instructions(&self) -> Result<CallToolResult, McpError> {
        use crate::tools::status::OGTT_INSTRUCTIONS;
        Ok(CallToolResult::success(vec![Content::text(OGTT_INSTRUCTIONS)]))
    }

    // --- Assessment ---

    #[tool(description = "Evaluate one patient's anthropometric, laboratory and OGTT values with the four-step algorithm: OGTT indication, ATP III metabolic syndrome, high-risk prognostic markers, and age-gated recommendation. Also returns IGI, Matsuda, HOMA-IR, disposition index, weighted glucose AUC and Stumvoll first-phase.")]
    fn evaluate_ogtt_risk(&self, Parameters(p): Parameters<EvaluateOgttRiskParams>) -> Result<CallToolResult, McpError> {
        let system = self.resolve_system(p.measurement_system.as_deref())?;
        let raw = p.observation.to_raw()?;
        let response = assessment::evaluate_observation(&raw, system, p.include_summary);
        to_json(&response)
    }

    #[tool(description = "Calculate derived metabolic indices (IGI, Matsuda, HOMA-IR, disposition index, weighted glucose AUC, Stumvoll first-phase) from OGTT glucose and insulin values")]
    fn calculate_metabolic_indices(&self, Parameters(p): Parameters<CalculateIndicesParams>) -> Result<CallToolResult, McpError> {
        let system = self.resolve_system(p.measurement_system.as_deref())?;
        let raw = p.observation.to_raw()?;
        to_json(&assessment::calculate_indices(&raw, system))
    }

    #[tool(description = "Re-express entered values from one measurement system to the other, rounded for display. HbA1c switches to IFCC (mmol/mol) for SI and to percent for US.")]
    fn convert_displayed_values(&self, Parameters(p): Parameters<ConvertDisplayedValuesParams>) -> Result<CallToolResult, McpError> {
        let from = MeasurementSystem::from_str(&p.from)
            .ok_or_else(|| ParamError::MeasurementSystem(p.from.clone()))?;
        let to = MeasurementSystem::from_str(&p.to)
            .ok_or_else(|| ParamError::MeasurementSystem(p.to.clone()))?;
        let raw = p.observation.to_raw()?;
        to_json(&assessment::convert_observation(&raw, from, to))
    }
}

// ============================================================================
// Server Handler
// ============================================================================

#[tool_handler]
impl ServerHandler for OgttService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "ogtt-risk".into(),
                version: crate::build_info::VERSION.into(),
                title: Some("OGTT Risk Stratifier".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "OGTT Risk Stratifier - four-step diabetes-risk assessment from one patient's \
                 measurements. IMPORTANT: Call ogtt_instructions before the first evaluation. \
                 Assessment: evaluate_ogtt_risk, calculate_metabolic_indices. \
                 Units: convert_displayed_values (US <-> SI). \
                 Status: ogtt_status. Nothing is stored between calls."
                    .into(),
            ),
        }
    }
}
