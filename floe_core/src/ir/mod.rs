//! The type model: primitive and nested types, fields, and literal values.

mod types;
mod value;

pub use types::{ListType, MapType, NestedField, PrimitiveType, StructType, Type};
pub use value::{Literal, StructLike};
