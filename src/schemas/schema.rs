use jsonschema::{Draft, JSONSchema};
use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Schema of a generated response, serialized and compiled once.
pub struct SchemaHandle {
    name: &'static str,
    schema_json: Value,
    validator: std::result::Result<JSONSchema, String>,
}

impl SchemaHandle {
    /// Derive the schema for `T`; its doc comments become descriptions.
    pub fn derive<T: JsonSchema>(name: &'static str) -> Self {
        let schema_json = match serde_json::to_value(schema_for!(T)) {
            Ok(json) => json,
            Err(err) => {
                return Self {
                    name,
                    schema_json: Value::Null,
                    validator: Err(err.to_string()),
                }
            }
        };

        let validator = JSONSchema::options()
            .with_draft(Draft::Draft7)
            .compile(&schema_json)
            .map_err(|err| err.to_string());

        Self {
            name,
            schema_json,
            validator,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn schema_json(&self) -> &Value {
        &self.schema_json
    }

    /// The compiled validator, or why the schema could not be compiled.
    pub fn validator(&self) -> std::result::Result<&JSONSchema, &str> {
        self.validator.as_ref().map_err(String::as_str)
    }
}

impl std::fmt::Debug for SchemaHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaHandle")
            .field("name", &self.name)
            .field("compiled", &self.validator.is_ok())
            .finish()
    }
}

/// A type the generator is asked to produce, with its schema built once.
pub trait ResponseSchema: DeserializeOwned + Send + Sync + 'static {
    fn schema() -> &'static SchemaHandle;
}
