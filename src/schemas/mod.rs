//! JSON schemas for generated responses and validation against them

pub mod schema;
pub mod validation;

pub use schema::{ResponseSchema, SchemaHandle};
pub use validation::{deserialize_response, validate_response};
