use std::io::IsTerminal;

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use terminal_size::{terminal_size, Width};

use crate::estimate::PriceEstimate;
use crate::form::{Answers, Question};
use crate::pricing::{EstimationMode, PriceRange};

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate text to fit available width, accounting for Unicode
fn truncate(text: &str, max_width: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_width {
        text.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

/// Format an amount for display, rounded to two decimals.
/// This is the only place amounts are rounded.
pub fn format_money(amount: f64, currency: &str) -> String {
    let symbol = match currency {
        "USD" | "AUD" | "CAD" | "NZD" => Some("$"),
        "EUR" => Some("€"),
        "GBP" => Some("£"),
        "JPY" => Some("¥"),
        _ => None,
    };
    let sign = if amount < 0.0 { "-" } else { "" };
    let digits = format!("{:.2}", amount.abs());
    match symbol {
        Some(s) => format!("{}{}{}", sign, s, digits),
        None => format!("{}{} {}", sign, digits, currency),
    }
}

fn format_range(range: PriceRange, currency: &str) -> String {
    if range.min == range.max {
        format_money(range.min, currency)
    } else {
        format!(
            "{} - {}",
            format_money(range.min, currency),
            format_money(range.max, currency)
        )
    }
}

/// Format visible questions as one line each:
/// "{order}. {label} [{type}] = {answer}", with `*` marking required ones.
pub fn format_question_list(questions: &[&Question], answers: &Answers, use_colors: bool) -> String {
    if questions.is_empty() {
        return "No visible questions.".to_string();
    }

    let term_width = get_terminal_width();
    let order_width = questions
        .iter()
        .map(|q| q.order.to_string().len())
        .max()
        .unwrap_or(1);

    questions
        .iter()
        .map(|q| {
            let marker = if q.required { "*" } else { " " };
            let kind = format!("[{}]", q.kind);
            let answer = answers
                .get(&q.id)
                .map(|a| a.to_string())
                .unwrap_or_default();

            // Width of everything on the line except the label
            let answer_width = if answer.is_empty() { 0 } else { 3 + answer.chars().count() };
            let fixed = order_width + 4 + kind.len() + answer_width;
            let label = match term_width {
                Some(w) if w > fixed + 10 => truncate(&q.label, w - fixed),
                _ => q.label.clone(),
            };

            let answer_part = if answer.is_empty() {
                String::new()
            } else if use_colors {
                format!(" = {}", answer.green())
            } else {
                format!(" = {}", answer)
            };

            if use_colors {
                format!(
                    "{:>width$}. {}{} {}{}",
                    q.order,
                    marker.red(),
                    label.bold(),
                    kind.dimmed(),
                    answer_part,
                    width = order_width
                )
            } else {
                format!(
                    "{:>width$}. {}{} {}{}",
                    q.order,
                    marker,
                    label,
                    kind,
                    answer_part,
                    width = order_width
                )
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format an estimate the way its mode presents it, followed by the
/// disclaimer and any warnings.
pub fn format_estimate(estimate: &PriceEstimate, use_colors: bool) -> String {
    let mut lines = Vec::new();

    let range = match (estimate.min, estimate.max) {
        (Some(min), Some(max)) => Some(PriceRange { min, max }),
        _ => None,
    };

    let headline = match (estimate.mode, range) {
        (EstimationMode::Disabled, _) | (_, None) => "Estimates are disabled for this form.".to_string(),
        (EstimationMode::StartingFrom, Some(r)) => {
            format!("From {}", format_money(r.min, &estimate.currency))
        }
        (EstimationMode::Range | EstimationMode::Internal, Some(r)) => {
            format_range(r, &estimate.currency)
        }
    };

    let headline = if use_colors && range.is_some() {
        headline.bold().to_string()
    } else {
        headline
    };

    if estimate.mode != EstimationMode::Disabled && !estimate.show_to_customer {
        lines.push(format!("{} (not shown to customer)", headline));
    } else {
        lines.push(headline);
    }

    if let Some(ref disclaimer) = estimate.disclaimer {
        if !estimate.is_disabled() {
            lines.push(if use_colors {
                disclaimer.dimmed().to_string()
            } else {
                disclaimer.clone()
            });
        }
    }

    for warning in &estimate.warnings {
        lines.push(if use_colors {
            format!("{} {}", "warning:".yellow(), warning)
        } else {
            format!("warning: {}", warning)
        });
    }

    lines.join("\n")
}

/// Format the applied rules: one line per rule with its adjustment and the
/// range before and after.
pub fn format_breakdown(estimate: &PriceEstimate, use_colors: bool) -> String {
    if estimate.applied_rules.is_empty() {
        return "No rules applied.".to_string();
    }

    let id_width = estimate
        .applied_rules
        .iter()
        .map(|r| r.rule_id.chars().count())
        .max()
        .unwrap_or(0);

    estimate
        .applied_rules
        .iter()
        .map(|rule| {
            let adjustment = rule.adjustment.to_string();
            let before = format_range(rule.before, &estimate.currency);
            let after = format_range(rule.after, &estimate.currency);
            let note = rule
                .note
                .as_deref()
                .map(|n| format!("  ({})", n))
                .unwrap_or_default();
            if use_colors {
                format!(
                    "  {:<width$}  {:>10}  {} -> {}{}",
                    rule.rule_id.cyan(),
                    adjustment.yellow(),
                    before,
                    after.bold(),
                    note.dimmed(),
                    width = id_width
                )
            } else {
                format!(
                    "  {:<width$}  {:>10}  {} -> {}{}",
                    rule.rule_id,
                    adjustment,
                    before,
                    after,
                    note,
                    width = id_width
                )
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Pretty-printed JSON for machine consumers.
pub fn format_json(estimate: &PriceEstimate) -> Result<String> {
    serde_json::to_string_pretty(estimate).context("Failed to serialize estimate")
}
