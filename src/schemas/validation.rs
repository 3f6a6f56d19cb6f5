use jsonschema::JSONSchema;
use serde_json::Value;

use crate::{
    error::{PlannerError, Result},
    schemas::{ResponseSchema, SchemaHandle},
};

const MAX_SCHEMA_ERRORS: usize = 3;

/// Validate a generated payload against a response schema.
///
/// Reports at most three violations, each prefixed with its instance path.
pub fn validate_response(schema: &SchemaHandle, payload: &Value) -> Result<()> {
    let validator: &JSONSchema = schema.validator().map_err(|reason| {
        PlannerError::Config(format!(
            "`{}` schema cannot be used for validation: {}",
            schema.name(),
            reason
        ))
    })?;

    let Err(errors) = validator.validate(payload) else {
        return Ok(());
    };

    let mut details: Vec<String> = errors
        .take(MAX_SCHEMA_ERRORS + 1)
        .map(|error| {
            let path = error.instance_path.to_string();
            let path = if path.is_empty() { "<root>" } else { path.as_str() };
            format!("{path}: {error}")
        })
        .collect();
    if details.len() > MAX_SCHEMA_ERRORS {
        details.truncate(MAX_SCHEMA_ERRORS);
        details.push("additional errors truncated".to_string());
    }

    Err(PlannerError::GenerationInvalidShape(format!(
        "does not match `{}` schema: {}",
        schema.name(),
        details.join("; ")
    )))
}

/// Deserialize a validated payload, naming the failing path on error.
pub fn deserialize_response<T>(payload: Value) -> Result<T>
where
    T: ResponseSchema,
{
    let schema = T::schema();

    serde_path_to_error::deserialize(payload).map_err(|err| {
        let path = err.path().to_string();
        let location = if path.is_empty() || path == "." {
            "<root>".to_string()
        } else {
            path
        };
        PlannerError::GenerationInvalidShape(format!(
            "failed to deserialize `{}` at {}: {}",
            schema.name(),
            location,
            err.into_inner()
        ))
    })
}
