use super::models::CreateCategoryRequest;
use crate::common::{ValidationResult, Validator};

impl Validator for CreateCategoryRequest {
    fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::new();
        result.require_non_empty("name", &self.name);
        result
    }
}
