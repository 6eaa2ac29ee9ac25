use super::models::{CreatePostRequest, UpdatePostRequest};
use crate::common::{ValidationResult, Validator};

impl Validator for CreatePostRequest {
    fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::new();

        result.require_non_empty("title", &self.title);
        result.require_non_empty("content", &self.content);

        result
    }
}

/// Omitted fields are left alone; present ones follow the create rules
impl Validator for UpdatePostRequest {
    fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::new();

        if let Some(title) = &self.title {
            result.require_non_empty("title", title);
        }
        if let Some(content) = &self.content {
            result.require_non_empty("content", content);
        }

        result
    }
}
