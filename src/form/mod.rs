pub mod condition;
pub mod types;
pub mod validation;
pub mod visibility;

pub use condition::{check_condition, evaluate, Condition, Literal, Operator};
pub use types::*;
pub use validation::{check_answers, validate_form};
pub use visibility::{relevant_answers, visible_questions};
