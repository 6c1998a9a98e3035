//! Four-step risk classification
//!
//! Step 1 decides whether an OGTT was indicated, step 2 classifies ATP III
//! metabolic syndrome, step 3 looks for high-risk prognostic combinations and
//! step 4 turns a high-risk result into an age-gated recommendation.
//! `evaluate` runs the whole pipeline from a raw observation.

use crate::models::{
    AgeBand, CanonicalObservation, CriterionStatus, Ethnicity, HighRiskMarkers, HighRiskTrigger,
    IndexSet, IndicationReason, MeasurementSystem, MetabolicSyndrome, MetsCriterion,
    OgttIndication, RawObservation, Recommendation, RiskAssessment, RiskStatus, Sex,
};

use super::canonicalize::canonicalize;

// ============================================================================
// Thresholds (canonical units)
// ============================================================================

/// Lower bound of impaired fasting glucose, mg/dL
pub const IFG_LOWER: f64 = 100.0;
/// Fasting glucose in the diabetes range, mg/dL
pub const DIABETES_FASTING: f64 = 126.0;
/// Lower bound of impaired glucose tolerance, mg/dL
pub const IGT_LOWER: f64 = 140.0;
/// 2-hour glucose in the diabetes range, mg/dL
pub const DIABETES_2HR: f64 = 200.0;
/// 1-hour glucose must exceed this, mg/dL
pub const ONE_HOUR_HIGH: f64 = 155.0;
pub const IGI_LOW: f64 = 0.82;
pub const STUMVOLL_LOW: f64 = 899.0;

pub const BMI_THRESHOLD: f64 = 25.0;
pub const BMI_THRESHOLD_ASIAN_AMERICAN: f64 = 23.0;

// ============================================================================
// Shared helpers
// ============================================================================

/// BMI in kg/m²; `None` when either operand is missing or height is not positive
pub fn bmi(weight_kg: Option<f64>, height_cm: Option<f64>) -> Option<f64> {
    let kg = weight_kg?;
    let cm = height_cm?;
    if cm <= 0.0 {
        return None;
    }
    let m = cm / 100.0;
    let value = kg / (m * m);
    value.is_finite().then_some(value)
}

fn in_range(value: Option<f64>, low: f64, high_exclusive: f64) -> bool {
    value.is_some_and(|v| v >= low && v < high_exclusive)
}

/// Both blood pressure readings, or `None` if either is missing
fn bp_reading(x: &CanonicalObservation) -> Option<(f64, f64)> {
    Some((x.systolic_bp?, x.diastolic_bp?))
}

// ============================================================================
// Step 1
// ============================================================================

/// Decide whether an OGTT was indicated
pub fn ogtt_indication(x: &CanonicalObservation) -> OgttIndication {
    let mut reasons = Vec::new();

    if in_range(x.glucose_mg_dl.fasting, IFG_LOWER, DIABETES_FASTING) {
        reasons.push(IndicationReason::FastingGlucose);
    }
    if x.hba1c_percent.is_some_and(|a1c| (5.7..=6.4).contains(&a1c)) {
        reasons.push(IndicationReason::Hba1c);
    }
    if x.gestational_diabetes {
        reasons.push(IndicationReason::GestationalDiabetes);
    }
    if x.pancreatitis {
        reasons.push(IndicationReason::Pancreatitis);
    }

    let bmi = bmi(x.weight_kg, x.height_cm);
    let bmi_threshold = if x.ethnicity == Some(Ethnicity::AsianAmerican) {
        BMI_THRESHOLD_ASIAN_AMERICAN
    } else {
        BMI_THRESHOLD
    };

    if bmi.is_some_and(|b| b >= bmi_threshold) {
        let hypertension = x.on_bp_medication()
            || bp_reading(x).is_some_and(|(sbp, dbp)| sbp >= 130.0 || dbp >= 80.0);
        let dyslipidemia = x.hdl_mg_dl.is_some_and(|hdl| hdl < 35.0)
            || x.triglycerides_mg_dl.is_some_and(|tg| tg > 250.0);

        let factors: Vec<IndicationReason> = [
            (x.masld, IndicationReason::Masld),
            (hypertension, IndicationReason::Hypertension),
            (dyslipidemia, IndicationReason::Dyslipidemia),
            (x.pcos, IndicationReason::Pcos),
            (x.first_degree_relative_t2d, IndicationReason::FirstDegreeRelative),
            (x.is_high_risk_ethnicity(), IndicationReason::HighRiskEthnicity),
        ]
        .into_iter()
        .filter_map(|(matched, reason)| matched.then_some(reason))
        .collect();

        if !factors.is_empty() {
            reasons.push(IndicationReason::BmiPlusRiskFactors {
                threshold: bmi_threshold,
            });
            reasons.extend(factors);
        }
    }

    OgttIndication {
        indicated: !reasons.is_empty(),
        reasons,
        bmi,
        bmi_threshold,
    }
}

// ============================================================================
// Step 2
// ============================================================================

/// Evaluate one ATP III criterion; `None` means the data is missing
fn mets_check(x: &CanonicalObservation, criterion: MetsCriterion) -> Option<bool> {
    match criterion {
        MetsCriterion::WaistCircumference => {
            let waist = x.waist_cm?;
            Some(match x.sex? {
                Sex::M => waist > 102.0,
                Sex::F => waist > 88.0,
            })
        }
        MetsCriterion::Triglycerides => Some(x.triglycerides_mg_dl? >= 150.0),
        MetsCriterion::Hdl => {
            let hdl = x.hdl_mg_dl?;
            Some(match x.sex? {
                Sex::M => hdl < 40.0,
                Sex::F => hdl < 50.0,
            })
        }
        MetsCriterion::BloodPressure => {
            if x.on_bp_medication() {
                return Some(true);
            }
            let (sbp, dbp) = bp_reading(x)?;
            Some(sbp >= 130.0 || dbp >= 85.0)
        }
        MetsCriterion::FastingGlucose => Some(x.glucose_mg_dl.fasting? >= IFG_LOWER),
    }
}

/// Classify ATP III metabolic syndrome
///
/// Present only when at least three criteria are met and none is unknown.
pub fn metabolic_syndrome(x: &CanonicalObservation) -> MetabolicSyndrome {
    let outcomes: Vec<(MetsCriterion, CriterionStatus)> = MetsCriterion::ALL
        .into_iter()
        .map(|criterion| (criterion, CriterionStatus::from_check(mets_check(x, criterion))))
        .collect();

    MetabolicSyndrome::from_outcomes(&outcomes)
}

// ============================================================================
// Step 3
// ============================================================================

/// Look for high-risk prognostic marker combinations
///
/// Incomplete metabolic syndrome data counts as not present here.
pub fn high_risk_markers(
    x: &CanonicalObservation,
    mets: &MetabolicSyndrome,
    indices: &IndexSet,
) -> HighRiskMarkers {
    let g = &x.glucose_mg_dl;

    let ifg = in_range(g.fasting, IFG_LOWER, DIABETES_FASTING);
    let igt = in_range(g.min120, IGT_LOWER, DIABETES_2HR);
    let diabetes_fasting = g.fasting.is_some_and(|v| v >= DIABETES_FASTING);
    let diabetes_2hr = g.min120.is_some_and(|v| v >= DIABETES_2HR);
    let one_hour_high = g.min60.is_some_and(|v| v > ONE_HOUR_HIGH);
    let a1c_mid_range = x.hba1c_percent.is_some_and(|a1c| (6.0..=6.4).contains(&a1c));

    let igi_low = indices.igi.is_some_and(|v| v <= IGI_LOW);
    let stumvoll_low = indices.stumvoll_first_phase.is_some_and(|v| v <= STUMVOLL_LOW);

    let mets_present = mets.present;
    let dysglycemia = igt || ifg;

    let clauses = [
        (igt && one_hour_high && mets_present, HighRiskTrigger::IgtOneHourMets),
        (ifg && igt, HighRiskTrigger::CombinedIfgIgt),
        (ifg && one_hour_high && mets_present, HighRiskTrigger::IfgOneHourMets),
        (dysglycemia && one_hour_high && a1c_mid_range, HighRiskTrigger::OneHourA1cMidRange),
        (
            dysglycemia && one_hour_high && (igi_low || stumvoll_low),
            HighRiskTrigger::OneHourLowSecretion { igi_low, stumvoll_low },
        ),
    ];
    let triggers: Vec<HighRiskTrigger> = clauses
        .into_iter()
        .filter_map(|(fired, trigger)| fired.then_some(trigger))
        .collect();

    let status = if triggers.is_empty() {
        RiskStatus::NotHighRisk
    } else {
        RiskStatus::HighRisk
    };

    HighRiskMarkers {
        status,
        triggers,
        ifg,
        igt,
        diabetes_fasting,
        diabetes_2hr,
        one_hour_high,
        a1c_mid_range,
        igi: indices.igi,
        igi_low,
        stumvoll_first_phase: indices.stumvoll_first_phase,
        stumvoll_low,
    }
}

// ============================================================================
// Step 4
// ============================================================================

pub fn recommendation(age: Option<f64>, markers: &HighRiskMarkers) -> Recommendation {
    if !markers.is_high_risk() {
        return Recommendation::not_applicable();
    }
    match age {
        Some(age) => Recommendation::for_band(AgeBand::for_age(age)),
        None => Recommendation::age_needed(),
    }
}

// ============================================================================
// Pipeline
// ============================================================================

/// Run the full pipeline for a raw observation
///
/// Pure: the same observation and system always give the same assessment.
pub fn evaluate(raw: &RawObservation, system: MeasurementSystem) -> RiskAssessment {
    let observation = canonicalize(raw, system);
    let indices = IndexSet::calculate(&observation);

    let step1 = ogtt_indication(&observation);
    let step2 = metabolic_syndrome(&observation);
    let step3 = high_risk_markers(&observation, &step2, &indices);
    let step4 = recommendation(observation.age, &step3);

    tracing::debug!(
        system = system.as_str(),
        indicated = step1.indicated,
        mets_count = step2.count,
        mets_complete = step2.complete,
        triggers = step3.triggers.len(),
        "Evaluated observation"
    );

    RiskAssessment {
        bmi: step1.bmi,
        observation,
        step1,
        step2,
        step3,
        step4,
        indices,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clinical::canonicalize::convert_displayed_values;
    use crate::models::{BpMedication, OgttSeries};

    fn glucose(fasting: Option<f64>, min60: Option<f64>, min120: Option<f64>) -> OgttSeries {
        OgttSeries {
            fasting,
            min60,
            min120,
            ..Default::default()
        }
    }

    fn mets_present() -> MetabolicSyndrome {
        MetabolicSyndrome::from_outcomes(
            &MetsCriterion::ALL.map(|c| (c, CriterionStatus::Met)),
        )
    }

    fn mets_absent() -> MetabolicSyndrome {
        MetabolicSyndrome::from_outcomes(
            &MetsCriterion::ALL.map(|c| (c, CriterionStatus::NotMet)),
        )
    }

    // --- Step 1 ---

    #[test]
    fn test_step1_fasting_glucose_range() {
        let mut x = CanonicalObservation::default();
        for (fpg, expected) in [(99.9, false), (100.0, true), (125.9, true), (126.0, false)] {
            x.glucose_mg_dl.fasting = Some(fpg);
            let result = ogtt_indication(&x);
            assert_eq!(result.indicated, expected, "FPG {}", fpg);
        }
    }

    #[test]
    fn test_step1_hba1c_range_is_inclusive() {
        let mut x = CanonicalObservation::default();
        for (a1c, expected) in [(5.6, false), (5.7, true), (6.4, true), (6.5, false)] {
            x.hba1c_percent = Some(a1c);
            assert_eq!(ogtt_indication(&x).indicated, expected, "HbA1c {}", a1c);
        }
    }

    #[test]
    fn test_step1_history_reasons_in_order() {
        let x = CanonicalObservation {
            gestational_diabetes: true,
            pancreatitis: true,
            glucose_mg_dl: glucose(Some(110.0), None, None),
            ..Default::default()
        };
        let result = ogtt_indication(&x);
        assert_eq!(
            result.reasons,
            vec![
                IndicationReason::FastingGlucose,
                IndicationReason::GestationalDiabetes,
                IndicationReason::Pancreatitis,
            ]
        );
    }

    #[test]
    fn test_step1_bmi_alone_is_not_enough() {
        let x = CanonicalObservation {
            weight_kg: Some(100.0),
            height_cm: Some(170.0),
            ..Default::default()
        };
        let result = ogtt_indication(&x);
        assert!(!result.indicated);
        assert!(result.bmi.unwrap() > 34.0);
    }

    #[test]
    fn test_step1_bmi_with_risk_factors() {
        // BMI 27.7
        let x = CanonicalObservation {
            weight_kg: Some(80.0),
            height_cm: Some(170.0),
            masld: true,
            first_degree_relative_t2d: true,
            bp_medication: Some(BpMedication::Yes),
            ..Default::default()
        };
        let result = ogtt_indication(&x);
        assert!(result.indicated);
        assert_eq!(result.bmi_threshold, 25.0);
        assert_eq!(
            result.reasons,
            vec![
                IndicationReason::BmiPlusRiskFactors { threshold: 25.0 },
                IndicationReason::Masld,
                IndicationReason::Hypertension,
                IndicationReason::FirstDegreeRelative,
            ]
        );
    }

    #[test]
    fn test_step1_asian_american_threshold() {
        // BMI ~24.2: below 25, above 23
        let x = CanonicalObservation {
            weight_kg: Some(70.0),
            height_cm: Some(170.0),
            ethnicity: Some(Ethnicity::AsianAmerican),
            ..Default::default()
        };
        let result = ogtt_indication(&x);
        assert_eq!(result.bmi_threshold, 23.0);
        assert!(result.indicated);
        assert_eq!(
            result.reasons,
            vec![
                IndicationReason::BmiPlusRiskFactors { threshold: 23.0 },
                IndicationReason::HighRiskEthnicity,
            ]
        );

        let other = CanonicalObservation {
            ethnicity: Some(Ethnicity::AfricanAmerican),
            ..x
        };
        assert!(!ogtt_indication(&other).indicated);
    }

    #[test]
    fn test_step1_hypertension_and_dyslipidemia() {
        let base = CanonicalObservation {
            weight_kg: Some(90.0),
            height_cm: Some(175.0),
            ..Default::default()
        };

        let diastolic = CanonicalObservation {
            systolic_bp: Some(120.0),
            diastolic_bp: Some(80.0),
            ..base.clone()
        };
        assert!(ogtt_indication(&diastolic)
            .reasons
            .contains(&IndicationReason::Hypertension));

        let systolic_only = CanonicalObservation {
            systolic_bp: Some(150.0),
            ..base.clone()
        };
        assert!(!ogtt_indication(&systolic_only).indicated);

        let low_hdl = CanonicalObservation {
            hdl_mg_dl: Some(34.0),
            ..base.clone()
        };
        assert!(ogtt_indication(&low_hdl)
            .reasons
            .contains(&IndicationReason::Dyslipidemia));

        let tg_at_limit = CanonicalObservation {
            triglycerides_mg_dl: Some(250.0),
            ..base
        };
        assert!(!ogtt_indication(&tg_at_limit).indicated);
    }

    #[test]
    fn test_bmi_guards() {
        assert_eq!(bmi(Some(80.0), Some(0.0)), None);
        assert_eq!(bmi(None, Some(170.0)), None);
        assert_eq!(bmi(Some(80.0), None), None);
        assert!((bmi(Some(81.0), Some(180.0)).unwrap() - 25.0).abs() < 1e-9);
    }

    // --- Step 2 ---

    #[test]
    fn test_step2_all_criteria_met() {
        let x = CanonicalObservation {
            sex: Some(Sex::M),
            waist_cm: Some(105.0),
            triglycerides_mg_dl: Some(180.0),
            hdl_mg_dl: Some(35.0),
            bp_medication: Some(BpMedication::Yes),
            glucose_mg_dl: glucose(Some(110.0), None, None),
            ..Default::default()
        };
        let mets = metabolic_syndrome(&x);
        assert_eq!(mets.count, 5);
        assert!(mets.complete);
        assert!(mets.present);
    }

    #[test]
    fn test_step2_sex_specific_thresholds() {
        let female = CanonicalObservation {
            sex: Some(Sex::F),
            waist_cm: Some(90.0),
            hdl_mg_dl: Some(45.0),
            ..Default::default()
        };
        let male = CanonicalObservation {
            sex: Some(Sex::M),
            ..female.clone()
        };
        assert_eq!(
            metabolic_syndrome(&female).met,
            vec![MetsCriterion::WaistCircumference, MetsCriterion::Hdl]
        );
        assert_eq!(
            metabolic_syndrome(&male).not_met,
            vec![MetsCriterion::WaistCircumference, MetsCriterion::Hdl]
        );
    }

    #[test]
    fn test_step2_missing_sex_is_unknown() {
        let x = CanonicalObservation {
            waist_cm: Some(120.0),
            hdl_mg_dl: Some(20.0),
            ..Default::default()
        };
        let mets = metabolic_syndrome(&x);
        assert!(mets.unknown.contains(&MetsCriterion::WaistCircumference));
        assert!(mets.unknown.contains(&MetsCriterion::Hdl));
    }

    #[test]
    fn test_step2_partial_data_is_indeterminate() {
        let x = CanonicalObservation {
            sex: Some(Sex::M),
            waist_cm: Some(110.0),
            triglycerides_mg_dl: Some(200.0),
            hdl_mg_dl: Some(30.0),
            ..Default::default()
        };
        let mets = metabolic_syndrome(&x);
        assert_eq!(mets.count, 3);
        assert!(!mets.complete);
        assert!(!mets.present);
        assert_eq!(
            mets.unknown,
            vec![MetsCriterion::BloodPressure, MetsCriterion::FastingGlucose]
        );
    }

    #[test]
    fn test_step2_blood_pressure_thresholds() {
        let mut x = CanonicalObservation {
            systolic_bp: Some(129.0),
            diastolic_bp: Some(84.0),
            ..Default::default()
        };
        assert!(metabolic_syndrome(&x).not_met.contains(&MetsCriterion::BloodPressure));
        x.diastolic_bp = Some(85.0);
        assert!(metabolic_syndrome(&x).met.contains(&MetsCriterion::BloodPressure));
        x.diastolic_bp = None;
        assert!(metabolic_syndrome(&x).unknown.contains(&MetsCriterion::BloodPressure));
        x.bp_medication = Some(BpMedication::Yes);
        assert!(metabolic_syndrome(&x).met.contains(&MetsCriterion::BloodPressure));
    }

    #[test]
    fn test_step2_invariants() {
        let samples = [
            CanonicalObservation::default(),
            CanonicalObservation {
                sex: Some(Sex::F),
                waist_cm: Some(80.0),
                triglycerides_mg_dl: Some(100.0),
                hdl_mg_dl: Some(60.0),
                systolic_bp: Some(110.0),
                diastolic_bp: Some(70.0),
                glucose_mg_dl: glucose(Some(90.0), None, None),
                ..Default::default()
            },
        ];
        for x in &samples {
            let mets = metabolic_syndrome(x);
            assert!(mets.count <= 5);
            assert_eq!(mets.met.len() + mets.not_met.len() + mets.unknown.len(), 5);
            if mets.present {
                assert!(mets.count >= 3 && mets.complete);
            }
            if mets.complete && mets.count < 3 {
                assert!(!mets.present);
            }
        }
    }

    // --- Step 3 ---

    #[test]
    fn test_step3_glucose_category_boundaries() {
        let indices = IndexSet::default();
        let mets = mets_absent();

        let at_126 = CanonicalObservation {
            glucose_mg_dl: glucose(Some(126.0), Some(155.0), Some(200.0)),
            ..Default::default()
        };
        let markers = high_risk_markers(&at_126, &mets, &indices);
        assert!(!markers.ifg);
        assert!(markers.diabetes_fasting);
        assert!(!markers.igt);
        assert!(markers.diabetes_2hr);
        assert!(!markers.one_hour_high);

        let in_range = CanonicalObservation {
            glucose_mg_dl: glucose(Some(100.0), Some(155.1), Some(140.0)),
            ..Default::default()
        };
        let markers = high_risk_markers(&in_range, &mets, &indices);
        assert!(markers.ifg);
        assert!(markers.igt);
        assert!(markers.one_hour_high);
        assert!(!markers.diabetes_fasting);
        assert!(!markers.diabetes_2hr);
    }

    #[test]
    fn test_step3_scenario_ifg_igt_with_mets() {
        let x = CanonicalObservation {
            glucose_mg_dl: glucose(Some(115.0), Some(170.0), Some(160.0)),
            ..Default::default()
        };
        let markers = high_risk_markers(&x, &mets_present(), &IndexSet::default());
        assert_eq!(markers.status, RiskStatus::HighRisk);
        assert!(markers.triggers.contains(&HighRiskTrigger::IgtOneHourMets));
        assert!(markers.triggers.contains(&HighRiskTrigger::CombinedIfgIgt));
        assert!(markers.triggers.contains(&HighRiskTrigger::IfgOneHourMets));
        assert_eq!(
            markers.triggers[0].to_string(),
            "IGT + 1-hour PG >155 mg/dL + metabolic syndrome"
        );
        assert_eq!(markers.triggers[1].to_string(), "Combined IFG and IGT");
    }

    #[test]
    fn test_step3_incomplete_mets_does_not_trigger() {
        let x = CanonicalObservation {
            glucose_mg_dl: glucose(None, Some(170.0), Some(160.0)),
            ..Default::default()
        };
        let incomplete = MetabolicSyndrome::from_outcomes(&[
            (MetsCriterion::WaistCircumference, CriterionStatus::Met),
            (MetsCriterion::Triglycerides, CriterionStatus::Met),
            (MetsCriterion::Hdl, CriterionStatus::Met),
            (MetsCriterion::BloodPressure, CriterionStatus::Unknown),
            (MetsCriterion::FastingGlucose, CriterionStatus::Unknown),
        ]);
        let markers = high_risk_markers(&x, &incomplete, &IndexSet::default());
        assert_eq!(markers.status, RiskStatus::NotHighRisk);
        assert!(markers.triggers.is_empty());
    }

    #[test]
    fn test_step3_one_hour_flip_changes_only_its_clauses() {
        // IGT without IFG, HbA1c mid-range, MetS present
        let mut x = CanonicalObservation {
            hba1c_percent: Some(6.2),
            glucose_mg_dl: glucose(Some(95.0), Some(155.0), Some(150.0)),
            ..Default::default()
        };
        let mets = mets_present();
        let before = high_risk_markers(&x, &mets, &IndexSet::default());
        assert!(before.triggers.is_empty());

        x.glucose_mg_dl.min60 = Some(156.0);
        let after = high_risk_markers(&x, &mets, &IndexSet::default());
        assert_eq!(
            after.triggers,
            vec![HighRiskTrigger::IgtOneHourMets, HighRiskTrigger::OneHourA1cMidRange]
        );
    }

    fn triggers(x: &CanonicalObservation) -> Vec<HighRiskTrigger> {
        high_risk_markers(x, &mets_present(), &IndexSet::default()).triggers
    }

    #[test]
    fn test_step3_ifg_flip_changes_only_its_clauses() {
        // IGT already present: only the clauses needing IFG itself change
        let mut x = CanonicalObservation {
            hba1c_percent: Some(6.2),
            glucose_mg_dl: glucose(Some(95.0), Some(170.0), Some(150.0)),
            ..Default::default()
        };
        assert_eq!(
            triggers(&x),
            vec![HighRiskTrigger::IgtOneHourMets, HighRiskTrigger::OneHourA1cMidRange]
        );
        x.glucose_mg_dl.fasting = Some(100.0);
        assert_eq!(
            triggers(&x),
            vec![
                HighRiskTrigger::IgtOneHourMets,
                HighRiskTrigger::CombinedIfgIgt,
                HighRiskTrigger::IfgOneHourMets,
                HighRiskTrigger::OneHourA1cMidRange,
            ]
        );

        // No IGT: IFG alone carries the dysglycemia clauses
        let mut x = CanonicalObservation {
            hba1c_percent: Some(6.2),
            glucose_mg_dl: glucose(Some(99.9), Some(170.0), Some(139.9)),
            ..Default::default()
        };
        assert!(triggers(&x).is_empty());
        x.glucose_mg_dl.fasting = Some(100.0);
        assert_eq!(
            triggers(&x),
            vec![HighRiskTrigger::IfgOneHourMets, HighRiskTrigger::OneHourA1cMidRange]
        );
        x.glucose_mg_dl.fasting = Some(126.0);
        assert!(triggers(&x).is_empty());
    }

    #[test]
    fn test_step3_igt_flip_changes_only_its_clauses() {
        let mut x = CanonicalObservation {
            hba1c_percent: Some(6.2),
            glucose_mg_dl: glucose(Some(110.0), Some(170.0), Some(139.9)),
            ..Default::default()
        };
        assert_eq!(
            triggers(&x),
            vec![HighRiskTrigger::IfgOneHourMets, HighRiskTrigger::OneHourA1cMidRange]
        );
        x.glucose_mg_dl.min120 = Some(140.0);
        assert_eq!(
            triggers(&x),
            vec![
                HighRiskTrigger::IgtOneHourMets,
                HighRiskTrigger::CombinedIfgIgt,
                HighRiskTrigger::IfgOneHourMets,
                HighRiskTrigger::OneHourA1cMidRange,
            ]
        );

        let mut x = CanonicalObservation {
            hba1c_percent: Some(6.2),
            glucose_mg_dl: glucose(Some(95.0), Some(170.0), Some(139.9)),
            ..Default::default()
        };
        assert!(triggers(&x).is_empty());
        x.glucose_mg_dl.min120 = Some(140.0);
        assert_eq!(
            triggers(&x),
            vec![HighRiskTrigger::IgtOneHourMets, HighRiskTrigger::OneHourA1cMidRange]
        );
        x.glucose_mg_dl.min120 = Some(200.0);
        assert!(triggers(&x).is_empty());
    }

    #[test]
    fn test_step3_a1c_flip_changes_only_its_clause() {
        let mut x = CanonicalObservation {
            hba1c_percent: Some(5.9),
            glucose_mg_dl: glucose(Some(95.0), Some(170.0), Some(150.0)),
            ..Default::default()
        };
        assert_eq!(triggers(&x), vec![HighRiskTrigger::IgtOneHourMets]);
        x.hba1c_percent = Some(6.0);
        assert_eq!(
            triggers(&x),
            vec![HighRiskTrigger::IgtOneHourMets, HighRiskTrigger::OneHourA1cMidRange]
        );
        x.hba1c_percent = Some(6.5);
        assert_eq!(triggers(&x), vec![HighRiskTrigger::IgtOneHourMets]);
    }

    #[test]
    fn test_step3_low_secretion_clause() {
        let x = CanonicalObservation {
            glucose_mg_dl: glucose(Some(105.0), Some(180.0), Some(130.0)),
            ..Default::default()
        };
        let indices = IndexSet {
            igi: Some(0.82),
            stumvoll_first_phase: Some(900.0),
            ..Default::default()
        };
        let markers = high_risk_markers(&x, &mets_absent(), &indices);
        assert!(markers.igi_low);
        assert!(!markers.stumvoll_low);
        assert_eq!(
            markers.triggers,
            vec![HighRiskTrigger::OneHourLowSecretion {
                igi_low: true,
                stumvoll_low: false
            }]
        );

        let not_low = IndexSet {
            igi: Some(0.83),
            stumvoll_first_phase: Some(899.5),
            ..Default::default()
        };
        assert!(high_risk_markers(&x, &mets_absent(), &not_low).triggers.is_empty());
    }

    #[test]
    fn test_step3_a1c_mid_range_boundaries() {
        let mut x = CanonicalObservation {
            glucose_mg_dl: glucose(None, Some(160.0), Some(150.0)),
            ..Default::default()
        };
        for (a1c, expected) in [(5.9, false), (6.0, true), (6.4, true), (6.5, false)] {
            x.hba1c_percent = Some(a1c);
            let markers = high_risk_markers(&x, &mets_absent(), &IndexSet::default());
            assert_eq!(markers.a1c_mid_range, expected, "HbA1c {}", a1c);
            assert_eq!(markers.is_high_risk(), expected, "HbA1c {}", a1c);
        }
    }

    // --- Step 4 ---

    #[test]
    fn test_step4_not_applicable_without_high_risk() {
        let markers = high_risk_markers(
            &CanonicalObservation::default(),
            &mets_absent(),
            &IndexSet::default(),
        );
        let rec = recommendation(Some(55.0), &markers);
        assert!(!rec.applicable);
        assert_eq!(rec.band, None);
    }

    #[test]
    fn test_step4_bands() {
        let x = CanonicalObservation {
            glucose_mg_dl: glucose(Some(110.0), None, Some(150.0)),
            ..Default::default()
        };
        let markers = high_risk_markers(&x, &mets_absent(), &IndexSet::default());
        assert!(markers.is_high_risk());

        assert_eq!(recommendation(None, &markers).band, None);
        assert_eq!(
            recommendation(None, &markers).text,
            crate::models::AGE_NEEDED_TEXT
        );
        assert_eq!(recommendation(Some(39.0), &markers).band, Some(AgeBand::NotCandidate));
        assert_eq!(recommendation(Some(40.0), &markers).band, Some(AgeBand::Conditional));
        assert_eq!(recommendation(Some(45.0), &markers).band, Some(AgeBand::Conditional));
        assert_eq!(recommendation(Some(49.9), &markers).band, Some(AgeBand::Conditional));
        assert_eq!(recommendation(Some(50.0), &markers).band, Some(AgeBand::Acceptable));
    }

    // --- Pipeline ---

    #[test]
    fn test_evaluate_full_pipeline_us_units() {
        let raw = RawObservation {
            age: Some(45.0),
            sex: Some(Sex::M),
            weight: Some(220.0),
            height: Some(70.0),
            waist: Some(42.0),
            triglycerides: Some(180.0),
            hdl: Some(35.0),
            bp_medication: Some(BpMedication::Yes),
            glucose: OgttSeries {
                fasting: Some(115.0),
                min30: Some(165.0),
                min60: Some(170.0),
                min90: None,
                min120: Some(160.0),
            },
            insulin: OgttSeries {
                fasting: Some(12.0),
                min30: Some(40.0),
                ..Default::default()
            },
            ..Default::default()
        };
        let assessment = evaluate(&raw, MeasurementSystem::US);

        assert!(assessment.step1.indicated);
        assert_eq!(assessment.step2.count, 5);
        assert!(assessment.step2.present);
        assert_eq!(assessment.step3.status, RiskStatus::HighRisk);
        assert_eq!(assessment.step4.band, Some(AgeBand::Conditional));
        assert_eq!(assessment.observation.insulin_pmol_l.fasting, Some(72.0));
        assert_eq!(assessment.bmi, assessment.step1.bmi);

        // (40 - 12) / (165 - 115)
        assert!((assessment.indices.igi.unwrap() - 0.56).abs() < 1e-9);
        assert!(assessment.step3.igi_low);
    }

    #[test]
    fn test_evaluate_same_result_in_either_system() {
        let us = RawObservation {
            glucose: OgttSeries {
                fasting: Some(108.0),
                min30: Some(162.0),
                min60: Some(180.0),
                min90: None,
                min120: Some(144.0),
            },
            insulin: OgttSeries {
                fasting: Some(10.0),
                min30: Some(50.0),
                ..Default::default()
            },
            ..Default::default()
        };
        let si = convert_displayed_values(&us, MeasurementSystem::US, MeasurementSystem::SI);
        let a = evaluate(&us, MeasurementSystem::US);
        let b = evaluate(&si, MeasurementSystem::SI);
        assert_eq!(a.step3.status, b.step3.status);
        assert_eq!(a.step3.triggers, b.step3.triggers);
        assert!((a.indices.igi.unwrap() - b.indices.igi.unwrap()).abs() < 1e-9);
    }

    #[test]
    fn test_evaluate_empty_observation() {
        let assessment = evaluate(&RawObservation::default(), MeasurementSystem::US);
        assert!(!assessment.step1.indicated);
        assert_eq!(assessment.step2.count, 0);
        assert_eq!(assessment.step2.unknown.len(), 5);
        assert_eq!(assessment.step3.status, RiskStatus::NotHighRisk);
        assert!(!assessment.step4.applicable);
        assert_eq!(assessment.indices, IndexSet::default());
    }
}
