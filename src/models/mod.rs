//! Data models
//!
//! Observations as entered, their canonical form, and assessment results.

mod assessment;
mod observation;

pub use assessment::{
    AgeBand, CriterionStatus, HighRiskMarkers, HighRiskTrigger, IndexSet, IndicationReason,
    MetabolicSyndrome, MetsCriterion, OgttIndication, Recommendation, RiskAssessment, RiskStatus,
    AGE_NEEDED_TEXT, NOT_APPLICABLE_TEXT,
};
pub use observation::{
    measurement_value, parse_measurement, BpMedication, CanonicalObservation, Ethnicity, Hba1cUnit,
    MeasurementSystem, OgttSeries, RawObservation, Sex,
};
