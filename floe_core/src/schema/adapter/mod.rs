//! Foreign-schema adapters.
//!
//! [`Schema::union_by_name`](super::Schema::union_by_name) accepts anything
//! that can be lowered to a core [`Schema`]: an ordered sequence of
//! `(name, type, nullable)` fields whose types map onto the core type model.
//! Lowering must fail before the union begins when a foreign type has no
//! counterpart.

use super::error::ConversionError;
use super::Schema;

#[cfg(feature = "arrow")]
mod arrow;

#[cfg(feature = "arrow")]
pub use arrow::{schema_to_arrow, PARQUET_FIELD_ID_KEY};

/// Lowers a schema-like input to the core [`Schema`].
pub trait ToSchema {
    fn to_schema(&self) -> Result<Schema, ConversionError>;
}

impl ToSchema for Schema {
    fn to_schema(&self) -> Result<Schema, ConversionError> {
        Ok(self.clone())
    }
}
