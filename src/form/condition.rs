use std::fmt;

use serde::{Deserialize, Serialize};

use super::types::{AnswerValue, Answers, Form, QuestionType};

/// A predicate over a single answer.
///
/// Written in YAML as a map tagged by `op`:
/// ```yaml
/// show_if: { op: equals, question: roof, value: tile }
/// when: { op: between, question: area, min: 50, max: 120 }
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Condition {
    Equals { question: String, value: Literal },
    Contains { question: String, value: Literal },
    GreaterThan { question: String, value: f64 },
    LessThan { question: String, value: f64 },
    /// Inclusive on both ends. Pricing rules only.
    Between { question: String, min: f64, max: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Equals,
    Contains,
    GreaterThan,
    LessThan,
    Between,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operator::Equals => "equals",
            Operator::Contains => "contains",
            Operator::GreaterThan => "greater_than",
            Operator::LessThan => "less_than",
            Operator::Between => "between",
        };
        f.write_str(name)
    }
}

/// Comparison value for `equals` and `contains`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Literal {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Number(n) => write!(f, "{}", n),
            Literal::Text(s) => write!(f, "'{}'", s),
        }
    }
}

impl Condition {
    /// Id of the question this condition reads.
    pub fn question(&self) -> &str {
        match self {
            Condition::Equals { question, .. }
            | Condition::Contains { question, .. }
            | Condition::GreaterThan { question, .. }
            | Condition::LessThan { question, .. }
            | Condition::Between { question, .. } => question,
        }
    }

    pub fn operator(&self) -> Operator {
        match self {
            Condition::Equals { .. } => Operator::Equals,
            Condition::Contains { .. } => Operator::Contains,
            Condition::GreaterThan { .. } => Operator::GreaterThan,
            Condition::LessThan { .. } => Operator::LessThan,
            Condition::Between { .. } => Operator::Between,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Equals { question, value } | Condition::Contains { question, value } => {
                write!(f, "{} {} {}", question, self.operator(), value)
            }
            Condition::GreaterThan { question, value } | Condition::LessThan { question, value } => {
                write!(f, "{} {} {}", question, self.operator(), value)
            }
            Condition::Between { question, min, max } => {
                write!(f, "{} between {}..{}", question, min, max)
            }
        }
    }
}

/// Evaluate a condition against an answer set.
///
/// Never fails: an unanswered question, or an answer of the wrong shape for
/// the operator, simply does not satisfy the condition.
pub fn evaluate(condition: &Condition, answers: &Answers) -> bool {
    let Some(answer) = answers.get(condition.question()) else {
        return false;
    };

    match condition {
        Condition::Equals { value, .. } => answer_equals(answer, value),
        Condition::Contains { value, .. } => answer_contains(answer, value),
        Condition::GreaterThan { value, .. } => answer.as_number().is_some_and(|n| n > *value),
        Condition::LessThan { value, .. } => answer.as_number().is_some_and(|n| n < *value),
        Condition::Between { min, max, .. } => answer
            .as_number()
            .is_some_and(|n| n >= *min && n <= *max),
    }
}

fn answer_equals(answer: &AnswerValue, expected: &Literal) -> bool {
    match (answer, expected) {
        (AnswerValue::Bool(a), Literal::Bool(b)) => a == b,
        (AnswerValue::Number(a), Literal::Number(b)) => a == b,
        (AnswerValue::Text(a), Literal::Text(b)) => a == b,
        // Multi select: equality means "this option was picked"
        (AnswerValue::Choices(ids), Literal::Text(b)) => ids.iter().any(|id| id == b),
        _ => false,
    }
}

fn answer_contains(answer: &AnswerValue, needle: &Literal) -> bool {
    let Literal::Text(needle) = needle else {
        return false;
    };
    match answer {
        AnswerValue::Text(s) => s.contains(needle.as_str()),
        AnswerValue::Choices(ids) => ids.iter().any(|id| id == needle),
        AnswerValue::Address(addr) => addr.fields().any(|field| field.contains(needle.as_str())),
        AnswerValue::Bool(_) | AnswerValue::Number(_) => false,
    }
}

/// Check that a condition is well formed against a form: the question
/// exists, and the operator and comparison value fit its type.
///
/// Ordering constraints (no forward references) are checked by the caller,
/// since they differ between visibility conditions and pricing rules.
pub fn check_condition(condition: &Condition, form: &Form) -> Result<(), String> {
    let id = condition.question();
    let Some(target) = form.question(id) else {
        return Err(format!("references unknown question '{}'", id));
    };
    let kind = target.kind;

    let known_option = |option: &str| -> Result<(), String> {
        if target.option(option).is_some() {
            Ok(())
        } else {
            Err(format!("question '{}' has no option '{}'", id, option))
        }
    };

    match condition {
        Condition::Equals { value, .. } => match (kind, value) {
            (QuestionType::YesNo, Literal::Bool(_)) => Ok(()),
            (QuestionType::Number, Literal::Number(_)) => Ok(()),
            (QuestionType::SingleChoice | QuestionType::MultiSelect, Literal::Text(option)) => {
                known_option(option)
            }
            (
                QuestionType::ShortText | QuestionType::LongText | QuestionType::DateTime,
                Literal::Text(_),
            ) => Ok(()),
            _ => Err(format!(
                "equals {} does not fit {} question '{}'",
                value, kind, id
            )),
        },
        Condition::Contains { value, .. } => match (kind, value) {
            (QuestionType::MultiSelect, Literal::Text(option)) => known_option(option),
            (
                QuestionType::ShortText | QuestionType::LongText | QuestionType::Address,
                Literal::Text(_),
            ) => Ok(()),
            _ => Err(format!(
                "contains {} does not fit {} question '{}'",
                value, kind, id
            )),
        },
        Condition::GreaterThan { value, .. } | Condition::LessThan { value, .. } => {
            if kind != QuestionType::Number {
                Err(format!(
                    "{} needs a number question, '{}' is {}",
                    condition.operator(),
                    id,
                    kind
                ))
            } else if !value.is_finite() {
                Err(format!("{} value must be finite", condition.operator()))
            } else {
                Ok(())
            }
        }
        Condition::Between { min, max, .. } => {
            if kind != QuestionType::Number {
                Err(format!(
                    "between needs a number question, '{}' is {}",
                    id, kind
                ))
            } else if min > max {
                Err(format!("between min {} is greater than max {}", min, max))
            } else {
                Ok(())
            }
        }
    }
}
