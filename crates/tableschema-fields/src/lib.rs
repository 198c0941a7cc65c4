//! Typed table schema fields: casting raw values, checking constraints and inferring types.

mod constraints;
pub mod field;
pub mod inferrer;
pub mod kind;
pub mod registry;
mod types;

pub use field::{CastMode, Field};
pub use inferrer::FieldsInferrer;
pub use kind::{FieldKind, INFER_ORDER};
pub use registry::FieldRegistry;
