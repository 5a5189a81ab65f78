use tracing::debug;

use super::condition::evaluate;
use super::types::{Answers, Form, Question};

/// Questions currently visible to the customer, in display order.
///
/// A question without `show_if` is always visible. A conditional question
/// is visible when its condition holds against the answers given to
/// earlier *visible* questions. Answers left over for hidden questions are
/// never read, so a caller that has not pruned stale answers still gets the
/// right result. Relies on validated forms only referencing earlier
/// questions, which makes a single pass sufficient.
pub fn visible_questions<'a>(form: &'a Form, answers: &Answers) -> Vec<&'a Question> {
    let mut visible = Vec::new();
    let mut seen = Answers::new();

    for question in form.questions_in_order() {
        let shown = match &question.show_if {
            None => true,
            Some(condition) => {
                let result = evaluate(condition, &seen);
                debug!(question = %question.id, condition = %condition, shown = result, "visibility");
                result
            }
        };

        if shown {
            if let Some(answer) = answers.get(&question.id) {
                seen.insert(question.id.clone(), answer.clone());
            }
            visible.push(question);
        }
    }

    visible
}

/// The subset of `answers` that belongs to visible questions.
pub fn relevant_answers(form: &Form, answers: &Answers) -> Answers {
    visible_questions(form, answers)
        .into_iter()
        .filter_map(|q| answers.get(&q.id).map(|a| (q.id.clone(), a.clone())))
        .collect()
}
