use std::fmt;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Running price bounds.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

impl PriceRange {
    pub fn fixed(amount: f64) -> Self {
        Self {
            min: amount,
            max: amount,
        }
    }
}

impl fmt::Display for PriceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.min == self.max {
            write!(f, "{}", self.min)
        } else {
            write!(f, "{}..{}", self.min, self.max)
        }
    }
}

/// What a rule does to the running range once its condition holds.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Action {
    /// `+N`: add to both bounds
    Add(f64),
    /// `+MIN..MAX`: add each end to its bound
    AddRange { min: f64, max: f64 },
    /// `xN`: scale both bounds
    Multiply(f64),
    /// `=N` or `=MIN..MAX`: replace the range, discarding prior accumulation
    SetBand { min: f64, max: f64 },
}

impl Action {
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();

        if let Some(val) = s.strip_prefix('+') {
            match parse_span(val)? {
                (n, None) => Ok(Action::Add(n)),
                (min, Some(max)) => Ok(Action::AddRange { min, max }),
            }
        } else if s.starts_with('-') {
            // "-10" reads more naturally than "+-10" for discounts
            match parse_span(s)? {
                (n, None) => Ok(Action::Add(n)),
                (min, Some(max)) => Ok(Action::AddRange { min, max }),
            }
        } else if let Some(val) = s.strip_prefix('x').or_else(|| s.strip_prefix('*')) {
            Ok(Action::Multiply(parse_amount(val)?))
        } else if let Some(val) = s.strip_prefix('=') {
            match parse_span(val)? {
                (n, None) => Ok(Action::SetBand { min: n, max: n }),
                (min, Some(max)) => Ok(Action::SetBand { min, max }),
            }
        } else {
            bail!("Action must start with +, x or =: {}", s)
        }
    }

    pub fn apply(&self, range: PriceRange) -> PriceRange {
        match *self {
            Action::Add(n) => PriceRange {
                min: range.min + n,
                max: range.max + n,
            },
            Action::AddRange { min, max } => PriceRange {
                min: range.min + min,
                max: range.max + max,
            },
            Action::Multiply(n) => PriceRange {
                min: range.min * n,
                max: range.max * n,
            },
            Action::SetBand { min, max } => PriceRange { min, max },
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Add(n) => write!(f, "{:+}", n),
            Action::AddRange { min, max } => write!(f, "{:+}..{}", min, max),
            Action::Multiply(n) => write!(f, "x{}", n),
            Action::SetBand { min, max } if min == max => write!(f, "={}", min),
            Action::SetBand { min, max } => write!(f, "={}..{}", min, max),
        }
    }
}

fn parse_amount(s: &str) -> Result<f64> {
    let value: f64 = s.trim().parse()?;
    if !value.is_finite() {
        bail!("Amount must be a finite number: {}", s.trim())
    }
    Ok(value)
}

/// "N" or "MIN..MAX"
fn parse_span(s: &str) -> Result<(f64, Option<f64>)> {
    match s.split_once("..") {
        Some((low, high)) => Ok((parse_amount(low)?, Some(parse_amount(high)?))),
        None => Ok((parse_amount(s)?, None)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start() -> PriceRange {
        PriceRange::fixed(120.0)
    }

    #[test]
    fn test_parse_add() {
        let action = Action::parse("+25").unwrap();
        assert_eq!(action, Action::Add(25.0));
        assert_eq!(action.apply(start()), PriceRange::fixed(145.0));
    }

    #[test]
    fn test_parse_add_range() {
        let action = Action::parse("+50..100").unwrap();
        assert_eq!(action, Action::AddRange { min: 50.0, max: 100.0 });
        assert_eq!(
            action.apply(start()),
            PriceRange {
                min: 170.0,
                max: 220.0
            }
        );
    }

    #[test]
    fn test_parse_negative_add() {
        assert_eq!(Action::parse("+-5").unwrap(), Action::Add(-5.0));
        assert_eq!(Action::parse("-5").unwrap(), Action::Add(-5.0));
        assert_eq!(
            Action::parse("-10..-5").unwrap(),
            Action::AddRange {
                min: -10.0,
                max: -5.0
            }
        );
    }

    #[test]
    fn test_parse_multiply() {
        let action = Action::parse("x1.5").unwrap();
        let range = PriceRange {
            min: 170.0,
            max: 220.0,
        };
        assert_eq!(
            action.apply(range),
            PriceRange {
                min: 255.0,
                max: 330.0
            }
        );
        assert_eq!(Action::parse("*0.5").unwrap(), Action::Multiply(0.5));
    }

    #[test]
    fn test_parse_set_band() {
        let action = Action::parse("=300").unwrap();
        assert_eq!(action, Action::SetBand { min: 300.0, max: 300.0 });
        let range = PriceRange {
            min: 255.0,
            max: 330.0,
        };
        assert_eq!(action.apply(range), PriceRange::fixed(300.0));

        assert_eq!(
            Action::parse("= 250 .. 400").unwrap(),
            Action::SetBand {
                min: 250.0,
                max: 400.0
            }
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Action::parse("50").is_err());
        assert!(Action::parse("+").is_err());
        assert!(Action::parse("+ten").is_err());
        assert!(Action::parse("x").is_err());
        assert!(Action::parse("=1..").is_err());
        assert!(Action::parse("+inf").is_err());
        assert!(Action::parse("").is_err());
    }

    #[test]
    fn test_display_matches_syntax() {
        for s in ["+25", "+50..100", "x1.5", "=300", "=250..400", "-5"] {
            let action = Action::parse(s).unwrap();
            assert_eq!(Action::parse(&action.to_string()).unwrap(), action);
        }
        assert_eq!(Action::parse("=300").unwrap().to_string(), "=300");
        assert_eq!(Action::parse("+25").unwrap().to_string(), "+25");
    }

    #[test]
    fn test_action_json_shape() {
        let json = serde_json::to_string(&Action::Add(25.0)).unwrap();
        assert_eq!(json, r#"{"kind":"add","value":25.0}"#);
        let json = serde_json::to_string(&Action::SetBand { min: 1.0, max: 2.0 }).unwrap();
        assert_eq!(json, r#"{"kind":"set_band","value":{"min":1.0,"max":2.0}}"#);
    }
}
