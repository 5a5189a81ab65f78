use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::actions::{Action, PriceRange};
use super::config::PriceGuide;
use crate::form::{evaluate, Answers, Condition};

/// A rule with its action parsed and its sort key captured.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub id: String,
    pub order: i64,
    /// Position in the guide's rule list, breaks `order` ties
    pub position: usize,
    pub when: Condition,
    pub action: Action,
    pub note: Option<String>,
}

impl CompiledRule {
    pub fn sort_key(&self) -> (i64, usize) {
        (self.order, self.position)
    }
}

/// A price guide ready for evaluation: base amount, clamps, and enabled
/// rules sorted by `(order, position)`. Built once per guide version and
/// reused across evaluations.
#[derive(Debug, Clone)]
pub struct PricingPlan {
    pub base: f64,
    pub global_min: Option<f64>,
    pub global_max: Option<f64>,
    rules: Vec<CompiledRule>,
}

impl PricingPlan {
    /// Parse every enabled rule's action and fix the evaluation order.
    /// Returns all action errors at once.
    pub fn compile(guide: &PriceGuide) -> Result<Self, Vec<String>> {
        let mut errors = Vec::new();
        let mut rules = Vec::new();

        for (position, rule) in guide.rules.iter().enumerate() {
            if !rule.enabled {
                continue;
            }
            match Action::parse(&rule.action) {
                Ok(action) => rules.push(CompiledRule {
                    id: rule.id.clone(),
                    order: rule.order,
                    position,
                    when: rule.when.clone(),
                    action,
                    note: rule.note.clone(),
                }),
                Err(e) => errors.push(format!(
                    "guide.rules[{}].action: invalid '{}' - {}",
                    position, rule.action, e
                )),
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        rules.sort_by_key(CompiledRule::sort_key);

        Ok(Self {
            base: guide.base_amount(),
            global_min: guide.global_min,
            global_max: guide.global_max,
            rules,
        })
    }

    /// Enabled rules in evaluation order.
    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }
}

/// One rule that fired, with the range it saw and the range it left.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct AppliedRule {
    pub rule_id: String,
    pub order: i64,
    pub adjustment: Action,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub before: PriceRange,
    pub after: PriceRange,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceOutcome {
    pub range: PriceRange,
    /// Fired rules in firing order
    pub applied: Vec<AppliedRule>,
    /// Number of rule conditions evaluated
    pub evaluated: usize,
    pub warnings: Vec<String>,
}

/// Fold the plan's rules over the answers, starting from the base amount.
///
/// No rounding happens here; currency rounding is a display concern.
pub fn calculate_price(plan: &PricingPlan, answers: &Answers) -> PriceOutcome {
    let mut range = PriceRange::fixed(plan.base);
    let mut applied = Vec::new();
    let mut evaluated = 0;
    let mut warnings = Vec::new();

    for rule in &plan.rules {
        evaluated += 1;
        if !evaluate(&rule.when, answers) {
            continue;
        }

        let before = range;
        range = rule.action.apply(range);
        debug!(rule = %rule.id, action = %rule.action, %before, after = %range, "rule fired");

        applied.push(AppliedRule {
            rule_id: rule.id.clone(),
            order: rule.order,
            adjustment: rule.action,
            note: rule.note.clone(),
            before,
            after: range,
        });
    }

    let range = clamp_range(range, plan.global_min, plan.global_max, &mut warnings);

    PriceOutcome {
        range,
        applied,
        evaluated,
        warnings,
    }
}

fn clamp_to(value: f64, low: Option<f64>, high: Option<f64>) -> f64 {
    let mut value = value;
    if let Some(low) = low {
        value = value.max(low);
    }
    if let Some(high) = high {
        value = value.min(high);
    }
    value
}

/// Clamp min then max into the global bounds. Inverted clamps
/// (`global_min > global_max`) collapse to the midpoint of the two bounds.
/// An inverted range from narrowing rules collapses to its own midpoint.
/// Both cases are reported as a warning.
fn clamp_range(
    range: PriceRange,
    low: Option<f64>,
    high: Option<f64>,
    warnings: &mut Vec<String>,
) -> PriceRange {
    if let (Some(low), Some(high)) = (low, high) {
        if low > high {
            let mid = (low + high) / 2.0;
            warn!(low, high, mid, "global clamps inverted, collapsing to midpoint");
            warnings.push(format!(
                "global clamps inverted ({} > {}), collapsed to {}",
                low, high, mid
            ));
            return PriceRange::fixed(mid);
        }
    }

    let min = clamp_to(range.min, low, high);
    let max = clamp_to(range.max, low, high);

    if min > max {
        let mid = (min + max) / 2.0;
        warn!(min, max, mid, "price range inverted, collapsing to midpoint");
        warnings.push(format!(
            "price range inverted ({} > {}), collapsed to {}",
            min, max, mid
        ));
        return PriceRange::fixed(mid);
    }

    PriceRange { min, max }
}
