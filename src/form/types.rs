use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use super::condition::Condition;

/// Customer answers keyed by question id.
///
/// A `BTreeMap` keeps iteration and serialization order stable, so two
/// identical answer sets always produce identical output and cache keys.
pub type Answers = BTreeMap<String, AnswerValue>;

/// A quote form: an ordered set of questions shown to a customer.
///
/// Example YAML:
/// ```yaml
/// form:
///   id: gutter-cleaning
///   title: Gutter cleaning quote
///   questions:
///     - { id: storeys, label: "How many storeys?", type: number, order: 1 }
///     - id: has_guards
///       label: "Do you have gutter guards?"
///       type: yes_no
///       order: 2
///       show_if: { op: greater_than, question: storeys, value: 1 }
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Form {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Bumped by the owner on every edit (default: 1)
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub published: bool,

    pub questions: Vec<Question>,
}

impl Form {
    /// Look up a question by id.
    pub fn question(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    /// Questions sorted by ascending display order.
    ///
    /// The sort is stable, so a form that failed validation with duplicate
    /// orders still yields a deterministic sequence.
    pub fn questions_in_order(&self) -> Vec<&Question> {
        let mut ordered: Vec<&Question> = self.questions.iter().collect();
        ordered.sort_by_key(|q| q.order);
        ordered
    }
}

pub(crate) fn default_version() -> u32 {
    1
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Question {
    pub id: String,

    pub label: String,

    #[serde(rename = "type")]
    pub kind: QuestionType,

    #[serde(default)]
    pub required: bool,

    /// Display order; also the evaluation order for visibility
    pub order: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,

    /// Choices for `single_choice` and `multi_select` questions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<ChoiceOption>,

    /// Numeric limits for `number` questions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<NumericBounds>,

    /// Visibility condition over answers to earlier questions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_if: Option<Condition>,
}

impl Question {
    pub fn option(&self, id: &str) -> Option<&ChoiceOption> {
        self.options.iter().find(|o| o.id == id)
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    YesNo,
    SingleChoice,
    MultiSelect,
    ShortText,
    LongText,
    Number,
    Address,
    DateTime,
}

impl QuestionType {
    pub fn is_choice(&self) -> bool {
        matches!(self, QuestionType::SingleChoice | QuestionType::MultiSelect)
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QuestionType::YesNo => "yes/no",
            QuestionType::SingleChoice => "single choice",
            QuestionType::MultiSelect => "multi select",
            QuestionType::ShortText => "short text",
            QuestionType::LongText => "long text",
            QuestionType::Number => "number",
            QuestionType::Address => "address",
            QuestionType::DateTime => "date/time",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ChoiceOption {
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct NumericBounds {
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default)]
    pub step: Option<f64>,
    /// Display unit, e.g. "m²" or "hours"
    #[serde(default)]
    pub unit: Option<String>,
}

/// A single answer. The expected shape depends on the question type:
/// booleans for yes/no, numbers, a string for text, single choice (the
/// option id) and date/time (RFC 3339), a list of option ids for multi
/// select, and a map for addresses.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum AnswerValue {
    Bool(bool),
    Number(f64),
    Text(String),
    Choices(Vec<String>),
    Address(Address),
}

impl AnswerValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AnswerValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AnswerValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Parse a text answer as an RFC 3339 timestamp.
    pub fn as_datetime(&self) -> Option<DateTime<FixedOffset>> {
        self.as_text()
            .and_then(|s| DateTime::parse_from_rfc3339(s.trim()).ok())
    }
}

impl fmt::Display for AnswerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnswerValue::Bool(true) => f.write_str("yes"),
            AnswerValue::Bool(false) => f.write_str("no"),
            AnswerValue::Number(n) => write!(f, "{}", n),
            AnswerValue::Text(s) => f.write_str(s),
            AnswerValue::Choices(ids) => f.write_str(&ids.join(", ")),
            AnswerValue::Address(addr) => write!(f, "{}", addr),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Address {
    pub line1: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    pub city: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    pub postcode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl Address {
    /// Non-empty address fields in display order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        [
            Some(self.line1.as_str()),
            self.line2.as_deref(),
            Some(self.city.as_str()),
            self.region.as_deref(),
            Some(self.postcode.as_str()),
            self.country.as_deref(),
        ]
        .into_iter()
        .flatten()
        .filter(|s| !s.is_empty())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fields().collect::<Vec<_>>().join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_question_yaml() {
        let yaml = r#"
id: roof
label: "Roof type"
type: single_choice
order: 3
required: true
options:
  - { id: tile, label: Tile }
  - { id: metal, label: Metal, value: "m" }
"#;
        let q: Question = serde_saphyr::from_str(yaml).unwrap();
        assert_eq!(q.kind, QuestionType::SingleChoice);
        assert!(q.required);
        assert_eq!(q.options.len(), 2);
        assert_eq!(q.option("metal").unwrap().value.as_deref(), Some("m"));
        assert!(q.show_if.is_none());
    }

    #[test]
    fn test_unknown_question_field_rejected() {
        let yaml = r#"
id: roof
label: "Roof"
type: number
order: 1
colour: red
"#;
        assert!(serde_saphyr::from_str::<Question>(yaml).is_err());
    }

    #[test]
    fn test_answer_shapes_from_json() {
        let json = r#"{
            "pets": true,
            "area": 42.5,
            "rooms": 3,
            "roof": "tile",
            "extras": ["windows", "gutters"],
            "site": { "line1": "1 High St", "city": "Leeds", "postcode": "LS1 1AA" }
        }"#;
        let answers: Answers = serde_json::from_str(json).unwrap();
        assert_eq!(answers["pets"], AnswerValue::Bool(true));
        assert_eq!(answers["area"], AnswerValue::Number(42.5));
        assert_eq!(answers["rooms"], AnswerValue::Number(3.0));
        assert_eq!(answers["roof"], AnswerValue::Text("tile".to_string()));
        assert_eq!(
            answers["extras"],
            AnswerValue::Choices(vec!["windows".to_string(), "gutters".to_string()])
        );
        match &answers["site"] {
            AnswerValue::Address(addr) => {
                assert_eq!(addr.city, "Leeds");
                assert_eq!(addr.to_string(), "1 High St, Leeds, LS1 1AA");
            }
            other => panic!("expected address, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_map_is_not_an_address() {
        assert!(serde_json::from_str::<AnswerValue>(r#"{"min": 1}"#).is_err());
        assert!(serde_json::from_str::<Answers>(r#"{"area": {"min": 1}}"#).is_err());
        assert!(serde_saphyr::from_str::<Answers>("site: { town: York }").is_err());
    }

    #[test]
    fn test_answers_from_yaml() {
        let yaml = r#"
storeys: 2
has_guards: false
notes: "Side gate is locked"
"#;
        let answers: Answers = serde_saphyr::from_str(yaml).unwrap();
        assert_eq!(answers["storeys"].as_number(), Some(2.0));
        assert_eq!(answers["has_guards"], AnswerValue::Bool(false));
        assert_eq!(answers["notes"].as_text(), Some("Side gate is locked"));
    }

    #[test]
    fn test_answer_datetime() {
        let value = AnswerValue::Text("2026-03-01T09:30:00+01:00".to_string());
        assert!(value.as_datetime().is_some());
        assert!(AnswerValue::Text("next tuesday".to_string())
            .as_datetime()
            .is_none());
        assert!(AnswerValue::Number(1.0).as_datetime().is_none());
    }

    #[test]
    fn test_questions_in_order() {
        let form = Form {
            id: "f".to_string(),
            title: None,
            version: 1,
            published: true,
            questions: vec![
                Question {
                    id: "b".to_string(),
                    label: "B".to_string(),
                    kind: QuestionType::ShortText,
                    required: false,
                    order: 20,
                    help: None,
                    options: vec![],
                    bounds: None,
                    show_if: None,
                },
                Question {
                    id: "a".to_string(),
                    label: "A".to_string(),
                    kind: QuestionType::YesNo,
                    required: false,
                    order: 10,
                    help: None,
                    options: vec![],
                    bounds: None,
                    show_if: None,
                },
            ],
        };
        let ids: Vec<&str> = form
            .questions_in_order()
            .iter()
            .map(|q| q.id.as_str())
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert!(form.question("b").is_some());
        assert!(form.question("z").is_none());
    }
}
