use jsonschema::Validator;
use serde::Serialize;
use serde_json::Value;

/// A single schema deviation at a JSON pointer within the document.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SchemaViolation {
    pub pointer: String,
    pub message: String,
}

impl SchemaViolation {
    /// The pointer with the empty root rendered as `<root>`.
    pub fn display_pointer(&self) -> &str {
        if self.pointer.is_empty() {
            "<root>"
        } else {
            &self.pointer
        }
    }
}

impl std::fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.display_pointer(), self.message)
    }
}

/// Collect every schema violation in the document, in validator order.
pub fn validate_document(validator: &Validator, document: &Value) -> Vec<SchemaViolation> {
    if validator.is_valid(document) {
        return Vec::new();
    }
    validator
        .iter_errors(document)
        .map(|error| SchemaViolation {
            pointer: error.instance_path.to_string(),
            message: error.to_string(),
        })
        .collect()
}
