//! Table schema descriptors: loading, structural and key validation, row casting,
//! editing and inference.

pub mod builder;
pub mod errors;
pub mod infer;
pub mod schema;
pub mod validator;

pub use builder::SchemaBuilder;
pub use errors::{Result, SchemaError};
pub use infer::InferSchema;
pub use schema::{Schema, SchemaSource};
pub use validator::{TABLE_SCHEMA, validate_descriptor};
