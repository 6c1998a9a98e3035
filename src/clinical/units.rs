//! Unit conversion constants and functions
//!
//! Forward and inverse conversions between US conventional and SI units for each
//! physical quantity the algorithm reads. Callers check for missing values first.

// ============================================================================
// Conversion Constants
// ============================================================================

/// mg/dL per mmol/L of glucose
pub const MG_DL_PER_MMOL_GLUCOSE: f64 = 18.0;
/// pmol/L per µU/mL (mU/L) of insulin
pub const PMOL_PER_MU_INSULIN: f64 = 6.0;
/// Kilograms per pound
pub const KG_PER_LB: f64 = 0.45359237;
/// Centimeters per inch
pub const CM_PER_IN: f64 = 2.54;
/// mmol/L per mg/dL of triglycerides
pub const MMOL_PER_MG_DL_TG: f64 = 0.01129;
/// mmol/L per mg/dL of HDL cholesterol
pub const MMOL_PER_MG_DL_HDL: f64 = 0.02586;
/// Slope of the IFCC to NGSP master equation
pub const A1C_IFCC_SLOPE: f64 = 0.09148;
/// Intercept of the IFCC to NGSP master equation
pub const A1C_IFCC_INTERCEPT: f64 = 2.152;

// ============================================================================
// Glucose
// ============================================================================

pub fn glucose_mg_dl_to_mmol(mg_dl: f64) -> f64 {
    mg_dl / MG_DL_PER_MMOL_GLUCOSE
}

pub fn glucose_mmol_to_mg_dl(mmol: f64) -> f64 {
    mmol * MG_DL_PER_MMOL_GLUCOSE
}

// ============================================================================
// Insulin (µU/mL is the same as mU/L)
// ============================================================================

pub fn insulin_mu_to_pmol(mu: f64) -> f64 {
    mu * PMOL_PER_MU_INSULIN
}

pub fn insulin_pmol_to_mu(pmol: f64) -> f64 {
    pmol / PMOL_PER_MU_INSULIN
}

// ============================================================================
// Anthropometrics
// ============================================================================

pub fn lb_to_kg(lb: f64) -> f64 {
    lb * KG_PER_LB
}

pub fn kg_to_lb(kg: f64) -> f64 {
    kg / KG_PER_LB
}

pub fn in_to_cm(inches: f64) -> f64 {
    inches * CM_PER_IN
}

pub fn cm_to_in(cm: f64) -> f64 {
    cm / CM_PER_IN
}

// ============================================================================
// Lipids
// ============================================================================

pub fn tg_mg_dl_to_mmol(mg_dl: f64) -> f64 {
    mg_dl * MMOL_PER_MG_DL_TG
}

pub fn tg_mmol_to_mg_dl(mmol: f64) -> f64 {
    mmol / MMOL_PER_MG_DL_TG
}

pub fn hdl_mg_dl_to_mmol(mg_dl: f64) -> f64 {
    mg_dl * MMOL_PER_MG_DL_HDL
}

pub fn hdl_mmol_to_mg_dl(mmol: f64) -> f64 {
    mmol / MMOL_PER_MG_DL_HDL
}

// ============================================================================
// HbA1c
// ============================================================================

/// IFCC mmol/mol to NGSP percent
pub fn a1c_ifcc_to_percent(mmol_mol: f64) -> f64 {
    A1C_IFCC_SLOPE * mmol_mol + A1C_IFCC_INTERCEPT
}

/// NGSP percent to IFCC mmol/mol
pub fn a1c_percent_to_ifcc(percent: f64) -> f64 {
    (percent - A1C_IFCC_INTERCEPT) / A1C_IFCC_SLOPE
}

/// Round to a fixed number of decimals for display
///
/// Returns `None` for non-finite input, or when scaling overflows.
pub fn round_to(value: f64, decimals: u32) -> Option<f64> {
    if !value.is_finite() {
        return None;
    }
    let p = 10f64.powi(decimals as i32);
    let rounded = (value * p).round() / p;
    rounded.is_finite().then_some(rounded)
}
