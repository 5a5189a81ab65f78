use serde::{Deserialize, Serialize};

use crate::form::{validate_form, Form};
use crate::pricing::{validate_guide, PriceGuide};

/// A quote definition file: one form and the price guide that prices it.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct QuoteDefinition {
    pub form: Form,

    #[serde(default)]
    pub guide: PriceGuide,
}

impl QuoteDefinition {
    /// Validate the form, then the guide against it.
    /// Returns all validation errors at once.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        if let Err(e) = validate_form(&self.form) {
            errors.extend(e);
        }
        if let Err(e) = validate_guide(&self.guide, &self.form) {
            errors.extend(e);
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
