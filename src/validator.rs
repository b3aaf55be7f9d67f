//! Structural validation of CSDL JSON documents.

use serde_json::Value;

use crate::error::{SchemaError, ValidateError};

/// JSON Schema describing the subset of CSDL JSON the reader relies on.
const CSDL_SCHEMA: &str = include_str!("../schemas/csdl.schema.json");

/// Validate a CSDL JSON document against the bundled structural schema.
///
/// # Errors
///
/// Returns `ValidateError::Invalid` with every violation found, or
/// `ValidateError::Schema` if the bundled schema itself cannot be compiled.
pub fn validate_csdl(document: &Value) -> Result<(), ValidateError> {
    let schema: Value = serde_json::from_str(CSDL_SCHEMA).map_err(|e| ValidateError::Schema {
        message: e.to_string(),
    })?;
    validate_against_schema(&schema, document)
}

/// Validate a document against an arbitrary JSON Schema.
pub fn validate_against_schema(schema: &Value, document: &Value) -> Result<(), ValidateError> {
    let validator = jsonschema::validator_for(schema).map_err(|e| ValidateError::Schema {
        message: e.to_string(),
    })?;

    let errors: Vec<SchemaError> = validator
        .iter_errors(document)
        .map(|e| SchemaError {
            path: e.instance_path.to_string(),
            message: e.to_string(),
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidateError::Invalid { errors })
    }
}
