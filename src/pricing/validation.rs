use std::collections::HashSet;

use super::actions::Action;
use super::config::PriceGuide;
use crate::form::{check_condition, Form};

/// Validate a price guide against the form it prices.
/// Returns all validation errors at once (not just the first).
///
/// Rule conditions may reference any question in the form, including
/// `between` comparisons; disabled rules are validated too so they can be
/// switched on safely later.
pub fn validate_guide(guide: &PriceGuide, form: &Form) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    for (name, value) in [
        ("base_price", guide.base_price),
        ("base_callout_fee", guide.base_callout_fee),
    ] {
        if let Some(v) = value {
            if !v.is_finite() || v < 0.0 {
                errors.push(format!("guide.{}: must be a non-negative number", name));
            }
        }
    }

    if guide.currency.len() != 3 || !guide.currency.chars().all(|c| c.is_ascii_uppercase()) {
        errors.push(format!(
            "guide.currency: '{}' is not a three-letter ISO 4217 code",
            guide.currency
        ));
    }

    if let (Some(min), Some(max)) = (guide.global_min, guide.global_max) {
        if min > max {
            errors.push(format!(
                "guide.global_min: {} is greater than global_max {}",
                min, max
            ));
        }
    }

    let mut ids = HashSet::new();
    for (i, rule) in guide.rules.iter().enumerate() {
        let path = format!("guide.rules[{}]", i);

        if rule.id.trim().is_empty() {
            errors.push(format!("{}.id: must not be empty", path));
        } else if !ids.insert(rule.id.as_str()) {
            errors.push(format!("{}.id: duplicate rule id '{}'", path, rule.id));
        }

        if let Err(e) = check_condition(&rule.when, form) {
            errors.push(format!("{}.when: {}", path, e));
        }

        match Action::parse(&rule.action) {
            Err(e) => errors.push(format!(
                "{}.action: invalid '{}' - {}",
                path, rule.action, e
            )),
            Ok(Action::SetBand { min, max }) if min > max => errors.push(format!(
                "{}.action: band min {} is greater than max {}",
                path, min, max
            )),
            Ok(Action::Multiply(n)) if n < 0.0 => errors.push(format!(
                "{}.action: multiplier must be non-negative",
                path
            )),
            Ok(_) => {}
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
