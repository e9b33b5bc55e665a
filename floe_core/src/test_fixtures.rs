//! Schemas and type shorthands shared across the test modules.

use crate::ir::{ListType, MapType, NestedField, PrimitiveType, StructType, Type};
use crate::schema::Schema;

pub(crate) fn boolean() -> Type {
    Type::Primitive(PrimitiveType::Boolean)
}

pub(crate) fn int() -> Type {
    Type::Primitive(PrimitiveType::Int)
}

pub(crate) fn long() -> Type {
    Type::Primitive(PrimitiveType::Long)
}

pub(crate) fn float() -> Type {
    Type::Primitive(PrimitiveType::Float)
}

pub(crate) fn double() -> Type {
    Type::Primitive(PrimitiveType::Double)
}

pub(crate) fn decimal(precision: u32, scale: u32) -> Type {
    Type::Primitive(PrimitiveType::Decimal { precision, scale })
}

pub(crate) fn date() -> Type {
    Type::Primitive(PrimitiveType::Date)
}

pub(crate) fn time() -> Type {
    Type::Primitive(PrimitiveType::Time)
}

pub(crate) fn timestamp() -> Type {
    Type::Primitive(PrimitiveType::Timestamp)
}

pub(crate) fn timestamptz() -> Type {
    Type::Primitive(PrimitiveType::Timestamptz)
}

pub(crate) fn string() -> Type {
    Type::Primitive(PrimitiveType::String)
}

pub(crate) fn uuid() -> Type {
    Type::Primitive(PrimitiveType::Uuid)
}

pub(crate) fn binary() -> Type {
    Type::Primitive(PrimitiveType::Binary)
}

pub(crate) fn fixed(length: u64) -> Type {
    Type::Primitive(PrimitiveType::Fixed(length))
}

/// One of every primitive, plus a second decimal and fixed so the promotion
/// grid covers precision widening and the `fixed[16]` special case.
pub(crate) fn test_primitive_types() -> Vec<Type> {
    vec![
        boolean(),
        int(),
        long(),
        float(),
        double(),
        decimal(10, 2),
        decimal(100, 2),
        string(),
        date(),
        time(),
        timestamptz(),
        timestamp(),
        binary(),
        fixed(16),
        fixed(20),
        uuid(),
    ]
}

pub(crate) fn table_schema_simple() -> Schema {
    Schema::with_identifier_fields(
        1,
        vec![
            NestedField::optional(1, "foo", string()),
            NestedField::required(2, "bar", int()),
            NestedField::optional(3, "baz", boolean()),
        ],
        [2],
    )
    .expect("valid schema")
}

pub(crate) fn table_schema_nested() -> Schema {
    Schema::with_identifier_fields(
        1,
        vec![
            NestedField::optional(1, "foo", string()),
            NestedField::required(2, "bar", int()),
            NestedField::optional(3, "baz", boolean()),
            NestedField::required(4, "qux", Type::List(ListType::new(5, string(), true))),
            NestedField::required(
                6,
                "quux",
                Type::Map(MapType::new(
                    7,
                    string(),
                    8,
                    Type::Map(MapType::new(9, string(), 10, int(), true)),
                    true,
                )),
            ),
            NestedField::required(
                11,
                "location",
                Type::List(ListType::new(
                    12,
                    Type::Struct(StructType::new(vec![
                        NestedField::optional(13, "latitude", float()),
                        NestedField::optional(14, "longitude", float()),
                    ])),
                    true,
                )),
            ),
            NestedField::optional(
                15,
                "person",
                Type::Struct(StructType::new(vec![
                    NestedField::optional(16, "name", string()),
                    NestedField::required(17, "age", int()),
                ])),
            ),
        ],
        [2],
    )
    .expect("valid schema")
}

/// Adds a struct-keyed map, a list of structs and top-level floats, so the
/// identifier-field rules all have something to trip over.
pub(crate) fn table_schema_nested_with_struct_key_map() -> Schema {
    Schema::with_identifier_fields(
        1,
        vec![
            NestedField::required(1, "foo", string()),
            NestedField::required(2, "bar", int()),
            NestedField::optional(3, "baz", boolean()),
            NestedField::required(4, "qux", Type::List(ListType::new(5, string(), true))),
            NestedField::required(
                6,
                "quux",
                Type::Map(MapType::new(
                    7,
                    string(),
                    8,
                    Type::Map(MapType::new(9, string(), 10, int(), true)),
                    true,
                )),
            ),
            NestedField::required(
                11,
                "location",
                Type::List(ListType::new(
                    12,
                    Type::Struct(StructType::new(vec![
                        NestedField::optional(13, "latitude", float()),
                        NestedField::optional(14, "longitude", float()),
                        NestedField::required(23, "zip", int()),
                    ])),
                    true,
                )),
            ),
            NestedField::optional(
                15,
                "person",
                Type::Struct(StructType::new(vec![
                    NestedField::optional(16, "name", string()),
                    NestedField::required(17, "age", int()),
                ])),
            ),
            NestedField::required(
                19,
                "points",
                Type::Map(MapType::new(
                    25,
                    Type::Struct(StructType::new(vec![
                        NestedField::required(26, "x", long()),
                        NestedField::required(27, "y", long()),
                    ])),
                    21,
                    long(),
                    true,
                )),
            ),
            NestedField::required(28, "feet", float()),
            NestedField::required(29, "meters", double()),
        ],
        [1],
    )
    .expect("valid schema")
}

pub(crate) fn table_schema_with_full_nested_fields() -> Schema {
    Schema::with_identifier_fields(
        1,
        vec![
            NestedField::optional(1, "foo", string())
                .with_doc("foo doc")
                .with_initial_default("foo initial")
                .with_write_default("foo write"),
            NestedField::required(2, "bar", int())
                .with_doc("bar doc")
                .with_initial_default(42)
                .with_write_default(43),
            NestedField::optional(3, "baz", boolean())
                .with_doc("baz doc")
                .with_initial_default(true)
                .with_write_default(false),
        ],
        [2],
    )
    .expect("valid schema")
}
