//! Final estimate assembly: visibility filtering, rule evaluation, and the
//! guide's presentation settings packaged into one value.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::form::{relevant_answers, Answers, Form};
use crate::pricing::{calculate_price, AppliedRule, EstimationMode, PriceGuide, PricingPlan};

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct PriceEstimate {
    pub mode: EstimationMode,
    pub show_to_customer: bool,
    pub currency: String,
    /// Absent when estimation is disabled
    pub min: Option<f64>,
    pub max: Option<f64>,
    #[serde(default)]
    pub applied_rules: Vec<AppliedRule>,
    #[serde(default)]
    pub disclaimer: Option<String>,
    pub guide_version: u32,
    /// Evaluation anomalies worth surfacing (e.g. a collapsed range)
    #[serde(default)]
    pub warnings: Vec<String>,
    /// How many rule conditions were checked
    #[serde(default)]
    pub rules_evaluated: usize,
}

impl PriceEstimate {
    fn disabled(guide: &PriceGuide) -> Self {
        Self {
            mode: EstimationMode::Disabled,
            show_to_customer: false,
            currency: guide.currency.clone(),
            min: None,
            max: None,
            applied_rules: Vec::new(),
            disclaimer: guide.disclaimer.clone(),
            guide_version: guide.version,
            warnings: Vec::new(),
            rules_evaluated: 0,
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.mode == EstimationMode::Disabled
    }
}

/// Compute the estimate for a set of answers.
///
/// Answers to questions that are currently hidden are dropped before any
/// rule sees them. A disabled or inactive guide returns immediately without
/// evaluating a single rule. A guide whose actions do not parse yields a
/// disabled estimate carrying the errors as warnings; callers should have
/// rejected it with [`crate::pricing::validate_guide`] first.
pub fn estimate(form: &Form, guide: &PriceGuide, answers: &Answers) -> PriceEstimate {
    if guide.mode == EstimationMode::Disabled || !guide.active {
        debug!(form = %form.id, version = guide.version, "estimation disabled");
        return PriceEstimate::disabled(guide);
    }

    let plan = match PricingPlan::compile(guide) {
        Ok(plan) => plan,
        Err(errors) => {
            warn!(form = %form.id, errors = errors.len(), "price guide does not compile");
            return PriceEstimate {
                warnings: errors,
                ..PriceEstimate::disabled(guide)
            };
        }
    };

    let relevant = relevant_answers(form, answers);
    if relevant.len() < answers.len() {
        debug!(
            ignored = answers.len() - relevant.len(),
            "ignoring answers to hidden questions"
        );
    }

    let outcome = calculate_price(&plan, &relevant);

    PriceEstimate {
        mode: guide.mode,
        show_to_customer: guide.show_to_customer && guide.mode != EstimationMode::Internal,
        currency: guide.currency.clone(),
        min: Some(outcome.range.min),
        max: Some(outcome.range.max),
        applied_rules: outcome.applied,
        disclaimer: guide.disclaimer.clone(),
        guide_version: guide.version,
        warnings: outcome.warnings,
        rules_evaluated: outcome.evaluated,
    }
}
