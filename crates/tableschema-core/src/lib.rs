//! Core types shared by the table schema crates: descriptors, native values and validation errors.

pub mod descriptor;
pub mod error;
pub mod validation;
pub mod value;

pub use descriptor::{Constraints, FieldDescriptor, ForeignKey, ForeignKeyReference, SchemaDescriptor};
pub use error::{ErrorKind, ValidationError, ValidationErrors, join_messages};
pub use validation::validate_keys;
pub use value::{GeoPoint, IsoDuration, RawRow, Row, Value, display_raw, tuple_key};
