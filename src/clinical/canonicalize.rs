//! Canonicalization of raw observations
//!
//! Turns a raw observation entered under a measurement system into the canonical
//! units the algorithm works in, and re-expresses entry values when the
//! measurement system changes.

use crate::models::{
    CanonicalObservation, Hba1cUnit, MeasurementSystem, OgttSeries, RawObservation,
};

use super::units::{
    a1c_ifcc_to_percent, a1c_percent_to_ifcc, cm_to_in, glucose_mg_dl_to_mmol,
    glucose_mmol_to_mg_dl, hdl_mg_dl_to_mmol, hdl_mmol_to_mg_dl, in_to_cm, insulin_mu_to_pmol,
    insulin_pmol_to_mu, kg_to_lb, lb_to_kg, round_to, tg_mg_dl_to_mmol, tg_mmol_to_mg_dl,
};

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// Pick the conversion for the active system; `None` stays `None`
///
/// A conversion that overflows yields `None`.
fn by_system(
    value: Option<f64>,
    system: MeasurementSystem,
    from_us: fn(f64) -> f64,
    from_si: fn(f64) -> f64,
) -> Option<f64> {
    finite(value.map(|v| match system {
        MeasurementSystem::US => from_us(v),
        MeasurementSystem::SI => from_si(v),
    }))
}

fn identity(v: f64) -> f64 {
    v
}

/// Normalize a raw observation to canonical units
///
/// Insulin always lands in pmol/L. HbA1c follows its own unit tag rather than
/// the measurement system.
pub fn canonicalize(raw: &RawObservation, system: MeasurementSystem) -> CanonicalObservation {
    let hba1c_unit = raw.hba1c_unit.unwrap_or_default();
    let hba1c_percent = finite(raw.hba1c.map(|v| match hba1c_unit {
        Hba1cUnit::Percent => v,
        Hba1cUnit::Ifcc => a1c_ifcc_to_percent(v),
    }));

    let (glucose_mg_dl, insulin_pmol_l) = match system {
        MeasurementSystem::US => (
            raw.glucose.map(identity),
            raw.insulin.map(insulin_mu_to_pmol),
        ),
        MeasurementSystem::SI => (
            raw.glucose.map(glucose_mmol_to_mg_dl),
            raw.insulin.map(identity),
        ),
    };

    CanonicalObservation {
        test_date: raw.test_date,
        age: finite(raw.age),
        sex: raw.sex,
        ethnicity: raw.ethnicity,
        weight_kg: by_system(raw.weight, system, lb_to_kg, identity),
        height_cm: by_system(raw.height, system, in_to_cm, identity),
        waist_cm: by_system(raw.waist, system, in_to_cm, identity),
        triglycerides_mg_dl: by_system(raw.triglycerides, system, identity, tg_mmol_to_mg_dl),
        hdl_mg_dl: by_system(raw.hdl, system, identity, hdl_mmol_to_mg_dl),
        systolic_bp: finite(raw.systolic_bp),
        diastolic_bp: finite(raw.diastolic_bp),
        bp_medication: raw.bp_medication,
        hba1c_percent,
        gestational_diabetes: raw.gestational_diabetes,
        pancreatitis: raw.pancreatitis,
        masld: raw.masld,
        pcos: raw.pcos,
        first_degree_relative_t2d: raw.first_degree_relative_t2d,
        glucose_mg_dl,
        insulin_pmol_l,
    }
}

/// Convert and round a displayed value; `None` stays `None`
fn redisplay(value: Option<f64>, convert: fn(f64) -> f64, decimals: u32) -> Option<f64> {
    value.and_then(|v| round_to(convert(v), decimals))
}

fn redisplay_series(series: OgttSeries, convert: fn(f64) -> f64, decimals: u32) -> OgttSeries {
    series.and_then(|v| redisplay(Some(v), convert, decimals))
}

/// Re-express entry values after the measurement system changes
///
/// Values are rounded the way the entry form displays them. HbA1c switches to
/// IFCC when moving to SI and back to percent when moving to US. Returns the
/// input unchanged when the systems are equal.
pub fn convert_displayed_values(
    raw: &RawObservation,
    old: MeasurementSystem,
    new: MeasurementSystem,
) -> RawObservation {
    let mut converted = raw.clone();
    if old == new {
        return converted;
    }

    match new {
        MeasurementSystem::SI => {
            converted.glucose = redisplay_series(raw.glucose, glucose_mg_dl_to_mmol, 1);
            converted.insulin = redisplay_series(raw.insulin, insulin_mu_to_pmol, 1);
            converted.weight = redisplay(raw.weight, lb_to_kg, 1);
            converted.height = redisplay(raw.height, in_to_cm, 1);
            converted.waist = redisplay(raw.waist, in_to_cm, 1);
            converted.triglycerides = redisplay(raw.triglycerides, tg_mg_dl_to_mmol, 2);
            converted.hdl = redisplay(raw.hdl, hdl_mg_dl_to_mmol, 2);

            if raw.hba1c_unit.unwrap_or_default() == Hba1cUnit::Percent {
                converted.hba1c = redisplay(raw.hba1c, a1c_percent_to_ifcc, 0);
                converted.hba1c_unit = Some(Hba1cUnit::Ifcc);
            }
        }
        MeasurementSystem::US => {
            converted.glucose = redisplay_series(raw.glucose, glucose_mmol_to_mg_dl, 1);
            converted.insulin = redisplay_series(raw.insulin, insulin_pmol_to_mu, 1);
            converted.weight = redisplay(raw.weight, kg_to_lb, 1);
            converted.height = redisplay(raw.height, cm_to_in, 1);
            converted.waist = redisplay(raw.waist, cm_to_in, 1);
            converted.triglycerides = redisplay(raw.triglycerides, tg_mmol_to_mg_dl, 1);
            converted.hdl = redisplay(raw.hdl, hdl_mmol_to_mg_dl, 1);

            if raw.hba1c_unit == Some(Hba1cUnit::Ifcc) {
                converted.hba1c = redisplay(raw.hba1c, a1c_ifcc_to_percent, 1);
                converted.hba1c_unit = Some(Hba1cUnit::Percent);
            }
        }
    }

    tracing::debug!(
        "Converted displayed values from {} to {}",
        old.as_str(),
        new.as_str()
    );
    converted
}
