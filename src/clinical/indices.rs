//! Derived metabolic indices
//!
//! Pure functions over a canonical observation. Insulin is converted from pmol/L to
//! mU/L wherever the published coefficients assume conventional units (all but the
//! Stumvoll estimate). Every result is finite or `None`.

use crate::models::{CanonicalObservation, IndexSet};

use super::units::{glucose_mg_dl_to_mmol, insulin_pmol_to_mu};

/// Constant of the HOMA-IR approximation with glucose in mg/dL
const HOMA_IR_DIVISOR: f64 = 405.0;
/// Numerator of the Matsuda composite index
const MATSUDA_NUMERATOR: f64 = 10_000.0;

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Insulinogenic index: Δinsulin(0-30) / Δglucose(0-30)
pub fn igi(x: &CanonicalObservation) -> Option<f64> {
    let i0 = insulin_pmol_to_mu(x.insulin_pmol_l.fasting?);
    let i30 = insulin_pmol_to_mu(x.insulin_pmol_l.min30?);
    let g0 = x.glucose_mg_dl.fasting?;
    let g30 = x.glucose_mg_dl.min30?;

    let delta_glucose = g30 - g0;
    if delta_glucose == 0.0 {
        return None;
    }
    finite((i30 - i0) / delta_glucose)
}

/// Weighted plasma-glucose AUC; the 90-minute point is not used
pub fn weighted_glucose_auc(x: &CanonicalObservation) -> Option<f64> {
    let g = &x.glucose_mg_dl;
    let (g0, g30, g60, g120) = (g.fasting?, g.min30?, g.min60?, g.min120?);
    finite((g0 + 2.0 * g30 + 3.0 * g60 + 2.0 * g120) / 4.0)
}

/// Matsuda whole-body insulin sensitivity index
///
/// Uses the mean of whichever timepoints are present; needs fasting values and at
/// least two glucose and two insulin timepoints.
pub fn matsuda_index(x: &CanonicalObservation) -> Option<f64> {
    let g0 = x.glucose_mg_dl.fasting?;
    let i0 = insulin_pmol_to_mu(x.insulin_pmol_l.fasting?);

    let glucose = x.glucose_mg_dl.present();
    let insulin: Vec<f64> = x
        .insulin_pmol_l
        .present()
        .into_iter()
        .map(insulin_pmol_to_mu)
        .collect();
    if glucose.len() < 2 || insulin.len() < 2 {
        return None;
    }

    let denominator = ((g0 * i0) * (mean(&glucose) * mean(&insulin))).sqrt();
    if !denominator.is_finite() || denominator <= 0.0 {
        return None;
    }
    finite(MATSUDA_NUMERATOR / denominator)
}

pub fn homa_ir(x: &CanonicalObservation) -> Option<f64> {
    let g0 = x.glucose_mg_dl.fasting?;
    let i0 = insulin_pmol_to_mu(x.insulin_pmol_l.fasting?);
    finite(g0 * i0 / HOMA_IR_DIVISOR)
}

/// Oral disposition index: Matsuda × IGI
pub fn disposition_index(x: &CanonicalObservation) -> Option<f64> {
    finite(matsuda_index(x)? * igi(x)?)
}

/// Stumvoll first-phase insulin secretion estimate
///
/// Coefficients expect insulin in pmol/L and glucose in mmol/L.
pub fn stumvoll_first_phase(x: &CanonicalObservation) -> Option<f64> {
    let i0 = x.insulin_pmol_l.fasting?;
    let i30 = x.insulin_pmol_l.min30?;
    let g30 = glucose_mg_dl_to_mmol(x.glucose_mg_dl.min30?);
    finite(1283.0 + 1.829 * i30 - 138.7 * g30 + 3.772 * i0)
}

impl IndexSet {
    /// Calculate all indices for an observation
    pub fn calculate(x: &CanonicalObservation) -> Self {
        Self {
            igi: igi(x),
            matsuda_index: matsuda_index(x),
            homa_ir: homa_ir(x),
            disposition_index: disposition_index(x),
            weighted_glucose_auc: weighted_glucose_auc(x),
            stumvoll_first_phase: stumvoll_first_phase(x),
        }
    }
}
