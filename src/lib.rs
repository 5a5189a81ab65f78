//! Conditional quote forms and rule-based price estimates.
//!
//! Three pure entry points sit at the core:
//! - [`visible_questions`]: which questions a customer sees given their answers
//! - [`calculate_price`]: fold a compiled price guide's rules over the answers
//! - [`estimate`]: the full pipeline, packaged with the guide's presentation settings
//!
//! Definitions should be checked with [`validate_form`] and [`validate_guide`]
//! before they are evaluated.

pub mod cache;
pub mod config;
pub mod estimate;
pub mod form;
pub mod output;
pub mod pricing;

pub use estimate::{estimate, PriceEstimate};
pub use form::{check_answers, validate_form, visible_questions, Answers, Form};
pub use pricing::{calculate_price, validate_guide, PriceGuide, PricingPlan};
