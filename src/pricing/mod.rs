pub mod actions;
pub mod config;
pub mod engine;
pub mod validation;

pub use actions::{Action, PriceRange};
pub use config::*;
pub use engine::{calculate_price, AppliedRule, CompiledRule, PriceOutcome, PricingPlan};
pub use validation::validate_guide;
