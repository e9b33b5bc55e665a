//! # Floe
//!
//! Floe is an Iceberg-compatible table schema library: immutable,
//! id-addressed schema trees together with the algorithms that index,
//! project, traverse and evolve them.
//!
//! - Look fields up by stable id or dotted name path, case-sensitively or
//!   not, and build position accessors into struct-like rows.
//! - Project a schema down to a set of column ids with [`prune_columns`],
//!   or by name with [`Schema::select`].
//! - Evolve a schema by merging in a newer one with
//!   [`Schema::union_by_name`]: existing ids survive name overlap, new
//!   subtrees get fresh ids, and only the safe type promotions of
//!   [`promote`] are applied.
//! - Round-trip every schema through its canonical JSON form via serde.
//!
//! ## Example
//!
//! ```
//! use floe::{NestedField, PrimitiveType, Schema, Type};
//!
//! let current = Schema::new(
//!     0,
//!     vec![NestedField::required(1, "id", Type::Primitive(PrimitiveType::Long))],
//! )
//! .expect("valid schema");
//!
//! let observed = Schema::new(
//!     0,
//!     vec![
//!         NestedField::required(1, "id", Type::Primitive(PrimitiveType::Long)),
//!         NestedField::optional(2, "payload", Type::Primitive(PrimitiveType::String)),
//!     ],
//! )
//! .expect("valid schema");
//!
//! let evolved = current.union_by_name(&observed).expect("compatible schemas");
//! assert_eq!(2, evolved.highest_field_id());
//! ```

// The type model: types, fields, and literal row values.
pub use floe_core::ir::{
    ListType, Literal, MapType, NestedField, PrimitiveType, StructLike, StructType, Type,
};

// The schema value and its algorithms.
pub use floe_core::schema::{
    build_position_accessors, index_by_id, index_by_name, index_name_by_id, promote,
    prune_columns, sanitize_column_names, Accessor, Schema, ToSchema,
};

// Error surface.
pub use floe_core::schema::{
    ConversionError, InvalidSchemaError, ProjectError, ResolveError, ValidationError,
};

// Arrow interop, behind the `arrow` feature.
#[cfg(feature = "arrow")]
pub use floe_core::schema::adapter::{schema_to_arrow, PARQUET_FIELD_ID_KEY};

/// Components needed to implement custom schema traversals.
pub mod visitor {
    pub use floe_core::schema::visitor::{
        visit_schema, visit_schema_with_partner, visit_struct, visit_type, PartnerAccessor,
        SchemaVisitor, SchemaWithPartnerVisitor,
    };
}

/// Merge `new_schema` into `current` by name, resolving the result through
/// any schema-like input.
pub fn union_by_name<S: ToSchema + ?Sized>(
    current: &Schema,
    new_schema: &S,
) -> anyhow::Result<Schema> {
    Ok(current.union_by_name(new_schema)?)
}
