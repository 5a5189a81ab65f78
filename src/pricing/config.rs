use std::fmt;

use serde::{Deserialize, Serialize};

use crate::form::types::default_version;
use crate::form::Condition;

/// Per-form price guide.
///
/// Defines how an estimate is calculated from the customer's answers. The
/// base price and call-out fee are optional (absent means zero). Rules run
/// in ascending `order`, ties broken by their position in the list.
///
/// Example YAML:
/// ```yaml
/// guide:
///   version: 3
///   mode: range
///   show_to_customer: true
///   base_price: 100
///   base_callout_fee: 20
///   currency: GBP
///   global_max: 900
///   rules:
///     - id: big-house
///       order: 10
///       when: { op: greater_than, question: storeys, value: 2 }
///       action: "+50..100"
///       note: "Scaffolding may be needed"
///     - id: guards
///       order: 20
///       when: { op: equals, question: has_guards, value: true }
///       action: "x1.5"
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PriceGuide {
    /// Bumped on every edit; estimates cached under an older version are stale
    #[serde(default = "default_version")]
    pub version: u32,

    /// Inactive guides produce no estimate
    #[serde(default = "default_true")]
    pub active: bool,

    #[serde(default)]
    pub mode: EstimationMode,

    #[serde(default = "default_true")]
    pub show_to_customer: bool,

    #[serde(default)]
    pub base_price: Option<f64>,

    #[serde(default)]
    pub base_callout_fee: Option<f64>,

    /// ISO 4217 code (default: USD)
    #[serde(default = "default_currency")]
    pub currency: String,

    #[serde(default)]
    pub global_min: Option<f64>,

    #[serde(default)]
    pub global_max: Option<f64>,

    #[serde(default = "default_disclaimer")]
    pub disclaimer: Option<String>,

    #[serde(default)]
    pub rules: Vec<PriceRule>,
}

impl Default for PriceGuide {
    fn default() -> Self {
        Self {
            version: 1,
            active: true,
            mode: EstimationMode::Range,
            show_to_customer: true,
            base_price: None,
            base_callout_fee: None,
            currency: default_currency(),
            global_min: None,
            global_max: None,
            disclaimer: default_disclaimer(),
            rules: Vec::new(),
        }
    }
}

impl PriceGuide {
    /// Starting point of every estimate: base price plus call-out fee.
    pub fn base_amount(&self) -> f64 {
        self.base_price.unwrap_or(0.0) + self.base_callout_fee.unwrap_or(0.0)
    }
}

fn default_true() -> bool {
    true
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_disclaimer() -> Option<String> {
    Some("This is an estimate only. Final price confirmed after inspection.".to_string())
}

/// How an estimate is presented.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EstimationMode {
    /// Computed for the business only, never shown to the customer
    Internal,
    /// Shown as "min - max"
    #[default]
    Range,
    /// Shown as "from min"
    StartingFrom,
    Disabled,
}

impl fmt::Display for EstimationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EstimationMode::Internal => "internal",
            EstimationMode::Range => "range",
            EstimationMode::StartingFrom => "starting_from",
            EstimationMode::Disabled => "disabled",
        };
        f.write_str(name)
    }
}

/// A conditional adjustment to the running price range.
///
/// `action` uses the compact syntax parsed by [`crate::pricing::Action`]:
/// `+N`, `+MIN..MAX`, `xN`, `=N` or `=MIN..MAX`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PriceRule {
    pub id: String,

    #[serde(default)]
    pub order: i64,

    #[serde(default = "default_true")]
    pub enabled: bool,

    pub when: Condition,

    pub action: String,

    #[serde(default)]
    pub note: Option<String>,
}
