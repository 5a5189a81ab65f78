use std::collections::{HashMap, HashSet};

use super::condition::{check_condition, Condition};
use super::types::{AnswerValue, Answers, Form, QuestionType};
use super::visibility::visible_questions;

/// Validate a form before it is published.
/// Returns all validation errors at once (not just the first).
///
/// Besides field sanity this enforces the ordering invariant: a visibility
/// condition may only reference a question with a strictly lower display
/// order. That rules out forward references, self references, and cycles,
/// so evaluation never has to look for them.
pub fn validate_form(form: &Form) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if form.id.trim().is_empty() {
        errors.push("form.id: must not be empty".to_string());
    }
    if form.questions.is_empty() {
        errors.push("form.questions: must contain at least one question".to_string());
    }

    let mut ids: HashSet<&str> = HashSet::new();
    let mut orders: HashMap<i64, &str> = HashMap::new();

    for (i, question) in form.questions.iter().enumerate() {
        let path = format!("form.questions[{}]", i);

        if question.id.trim().is_empty() {
            errors.push(format!("{}.id: must not be empty", path));
        } else if !ids.insert(question.id.as_str()) {
            errors.push(format!("{}.id: duplicate question id '{}'", path, question.id));
        }

        if let Some(other) = orders.insert(question.order, question.id.as_str()) {
            errors.push(format!(
                "{}.order: {} is already used by '{}'",
                path, question.order, other
            ));
        }

        if question.kind.is_choice() {
            if question.options.is_empty() {
                errors.push(format!("{}.options: {} question needs options", path, question.kind));
            }
            let mut option_ids = HashSet::new();
            for (j, option) in question.options.iter().enumerate() {
                if !option_ids.insert(option.id.as_str()) {
                    errors.push(format!(
                        "{}.options[{}].id: duplicate option id '{}'",
                        path, j, option.id
                    ));
                }
            }
        } else if !question.options.is_empty() {
            errors.push(format!(
                "{}.options: only choice questions take options, '{}' is {}",
                path, question.id, question.kind
            ));
        }

        if let Some(ref bounds) = question.bounds {
            if question.kind != QuestionType::Number {
                errors.push(format!(
                    "{}.bounds: only number questions take bounds, '{}' is {}",
                    path, question.id, question.kind
                ));
            }
            if let (Some(min), Some(max)) = (bounds.min, bounds.max) {
                if min > max {
                    errors.push(format!("{}.bounds: min {} is greater than max {}", path, min, max));
                }
            }
            if let Some(step) = bounds.step {
                if step <= 0.0 {
                    errors.push(format!("{}.bounds.step: must be positive", path));
                }
            }
        }

        if let Some(ref condition) = question.show_if {
            let path = format!("{}.show_if", path);
            if matches!(condition, Condition::Between { .. }) {
                errors.push(format!(
                    "{}: between is only allowed in pricing rules",
                    path
                ));
            }
            match check_condition(condition, form) {
                Err(e) => errors.push(format!("{}: {}", path, e)),
                Ok(()) => {
                    // check_condition guarantees the target exists
                    if let Some(target) = form.question(condition.question()) {
                        if target.id == question.id {
                            errors.push(format!("{}: question '{}' references itself", path, question.id));
                        } else if target.order >= question.order {
                            errors.push(format!(
                                "{}: references '{}' (order {}) which is not before '{}' (order {})",
                                path, target.id, target.order, question.id, question.order
                            ));
                        }
                    }
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Check an answer set against a form and describe anything off.
///
/// These are advisory: an in-progress form is expected to have gaps, and
/// evaluation tolerates every issue reported here. Reports answers to
/// unknown questions, answers whose shape does not match the question type,
/// out-of-bounds numbers, unknown option ids, unparseable date/times, and
/// required visible questions without an answer.
pub fn check_answers(form: &Form, answers: &Answers) -> Vec<String> {
    let mut issues = Vec::new();

    for (id, answer) in answers {
        let Some(question) = form.question(id) else {
            issues.push(format!("answers.{}: no such question", id));
            continue;
        };

        match (question.kind, answer) {
            (QuestionType::YesNo, AnswerValue::Bool(_)) => {}
            (QuestionType::Number, AnswerValue::Number(n)) => {
                if let Some(ref bounds) = question.bounds {
                    if bounds.min.is_some_and(|min| *n < min) || bounds.max.is_some_and(|max| *n > max) {
                        issues.push(format!(
                            "answers.{}: {} is outside {}..{}",
                            id,
                            n,
                            bounds.min.map(|v| v.to_string()).unwrap_or_default(),
                            bounds.max.map(|v| v.to_string()).unwrap_or_default()
                        ));
                    }
                }
            }
            (QuestionType::SingleChoice, AnswerValue::Text(option)) => {
                if question.option(option).is_none() {
                    issues.push(format!("answers.{}: unknown option '{}'", id, option));
                }
            }
            (QuestionType::MultiSelect, AnswerValue::Choices(options)) => {
                for option in options {
                    if question.option(option).is_none() {
                        issues.push(format!("answers.{}: unknown option '{}'", id, option));
                    }
                }
            }
            (QuestionType::ShortText | QuestionType::LongText, AnswerValue::Text(_)) => {}
            (QuestionType::Address, AnswerValue::Address(_)) => {}
            (QuestionType::DateTime, AnswerValue::Text(raw)) => {
                if answer.as_datetime().is_none() {
                    issues.push(format!("answers.{}: '{}' is not an RFC 3339 date/time", id, raw));
                }
            }
            (kind, _) => {
                issues.push(format!("answers.{}: answer does not fit a {} question", id, kind));
            }
        }
    }

    for question in visible_questions(form, answers) {
        if question.required && !answers.contains_key(&question.id) {
            issues.push(format!("answers.{}: required question is unanswered", question.id));
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::condition::Literal;
    use crate::form::types::{ChoiceOption, NumericBounds, Question};

    fn question(id: &str, kind: QuestionType, order: i64) -> Question {
        Question {
            id: id.to_string(),
            label: id.to_string(),
            kind,
            required: false,
            order,
            help: None,
            options: vec![],
            bounds: None,
            show_if: None,
        }
    }

    fn form(questions: Vec<Question>) -> Form {
        Form {
            id: "cleaning".into(),
            title: None,
            version: 1,
            published: false,
            questions,
        }
    }

    fn gt(question: &str, value: f64) -> Option<Condition> {
        Some(Condition::GreaterThan {
            question: question.to_string(),
            value,
        })
    }

    #[test]
    fn test_valid_form() {
        let mut pets = question("pets", QuestionType::YesNo, 2);
        pets.show_if = gt("rooms", 2.0);
        let f = form(vec![question("rooms", QuestionType::Number, 1), pets]);
        assert!(validate_form(&f).is_ok());
    }

    #[test]
    fn test_empty_form() {
        let f = form(vec![]);
        let errors = validate_form(&f).unwrap_err();
        assert!(errors[0].contains("form.questions"));
    }

    #[test]
    fn test_duplicate_ids_and_orders() {
        let f = form(vec![
            question("rooms", QuestionType::Number, 1),
            question("rooms", QuestionType::Number, 1),
        ]);
        let errors = validate_form(&f).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].contains("duplicate question id 'rooms'"));
        assert!(errors[1].contains("already used"));
    }

    #[test]
    fn test_forward_reference_rejected() {
        let mut early = question("early", QuestionType::YesNo, 1);
        early.show_if = gt("later", 1.0);
        let f = form(vec![early, question("later", QuestionType::Number, 2)]);
        let errors = validate_form(&f).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("form.questions[0].show_if"));
        assert!(errors[0].contains("not before"));
    }

    #[test]
    fn test_self_reference_rejected() {
        let mut rooms = question("rooms", QuestionType::Number, 1);
        rooms.show_if = gt("rooms", 1.0);
        let errors = validate_form(&form(vec![rooms])).unwrap_err();
        assert!(errors[0].contains("references itself"));
    }

    #[test]
    fn test_cycle_rejected() {
        // a shows if b, b shows if a: one of the two must point forward
        let mut a = question("a", QuestionType::Number, 1);
        a.show_if = gt("b", 1.0);
        let mut b = question("b", QuestionType::Number, 2);
        b.show_if = gt("a", 1.0);
        let errors = validate_form(&form(vec![a, b])).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("form.questions[0]"));
    }

    #[test]
    fn test_dangling_reference_rejected() {
        let mut pets = question("pets", QuestionType::YesNo, 2);
        pets.show_if = gt("ghost", 1.0);
        let errors = validate_form(&form(vec![pets])).unwrap_err();
        assert!(errors[0].contains("unknown question 'ghost'"));
    }

    #[test]
    fn test_between_not_allowed_for_visibility() {
        let mut pets = question("pets", QuestionType::YesNo, 2);
        pets.show_if = Some(Condition::Between {
            question: "rooms".into(),
            min: 1.0,
            max: 3.0,
        });
        let f = form(vec![question("rooms", QuestionType::Number, 1), pets]);
        let errors = validate_form(&f).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("only allowed in pricing rules"));
    }

    #[test]
    fn test_choice_questions_need_options() {
        let f = form(vec![question("roof", QuestionType::SingleChoice, 1)]);
        let errors = validate_form(&f).unwrap_err();
        assert!(errors[0].contains("needs options"));
    }

    #[test]
    fn test_bounds_checked() {
        let mut area = question("area", QuestionType::Number, 1);
        area.bounds = Some(NumericBounds {
            min: Some(10.0),
            max: Some(5.0),
            step: Some(0.0),
            unit: None,
        });
        let errors = validate_form(&form(vec![area])).unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_collects_all_errors() {
        let mut pets = question("pets", QuestionType::YesNo, 1);
        pets.show_if = gt("ghost", 1.0); // Error 1
        let f = Form {
            id: "".into(), // Error 2
            ..form(vec![pets, question("roof", QuestionType::MultiSelect, 2)]) // Error 3
        };
        let errors = validate_form(&f).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    fn answer_form() -> Form {
        let mut roof = question("roof", QuestionType::SingleChoice, 2);
        roof.options = vec![ChoiceOption {
            id: "tile".into(),
            label: "Tile".into(),
            value: None,
        }];
        let mut area = question("area", QuestionType::Number, 1);
        area.required = true;
        area.bounds = Some(NumericBounds {
            min: Some(1.0),
            max: Some(500.0),
            step: None,
            unit: Some("m2".into()),
        });
        let mut when = question("when", QuestionType::DateTime, 3);
        when.required = true;
        when.show_if = Some(Condition::Equals {
            question: "roof".into(),
            value: Literal::Text("tile".into()),
        });
        form(vec![area, roof, when])
    }

    #[test]
    fn test_check_answers_clean() {
        let f = answer_form();
        let answers: Answers = [
            ("area".to_string(), AnswerValue::Number(120.0)),
            ("roof".to_string(), AnswerValue::Text("tile".into())),
            (
                "when".to_string(),
                AnswerValue::Text("2026-05-01T08:00:00Z".into()),
            ),
        ]
        .into_iter()
        .collect();
        assert!(check_answers(&f, &answers).is_empty());
    }

    #[test]
    fn test_check_answers_reports_issues() {
        let f = answer_form();
        let answers: Answers = [
            ("area".to_string(), AnswerValue::Number(900.0)),
            ("roof".to_string(), AnswerValue::Text("tile".into())),
            ("when".to_string(), AnswerValue::Text("soon".into())),
            ("colour".to_string(), AnswerValue::Text("red".into())),
        ]
        .into_iter()
        .collect();
        let issues = check_answers(&f, &answers);
        assert_eq!(issues.len(), 3);
        assert!(issues.iter().any(|i| i.contains("outside 1..500")));
        assert!(issues.iter().any(|i| i.contains("RFC 3339")));
        assert!(issues.iter().any(|i| i.contains("answers.colour")));
    }

    #[test]
    fn test_check_answers_required_only_when_visible() {
        let f = answer_form();
        // roof unanswered: "when" stays hidden, only area is missing
        let issues = check_answers(&f, &Answers::new());
        assert_eq!(issues, vec!["answers.area: required question is unanswered"]);
    }
}
