//! Clinical calculation module
//!
//! Unit canonicalization, derived metabolic indices and the four-step
//! risk classification.

pub mod canonicalize;
pub mod classifier;
pub mod indices;
pub mod units;

pub use canonicalize::{canonicalize, convert_displayed_values};
pub use classifier::{
    bmi, evaluate, high_risk_markers, metabolic_syndrome, ogtt_indication, recommendation,
};
pub use indices::{
    disposition_index, homa_ir, igi, matsuda_index, stumvoll_first_phase, weighted_glucose_auc,
};
pub use units::round_to;
