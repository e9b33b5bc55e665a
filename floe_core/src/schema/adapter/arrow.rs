//! Arrow schema interop.
//!
//! Lowering maps Arrow's physical types onto the core model (`large_string`
//! and `string` both become `string`, `int32` becomes `int`, nullability
//! becomes optionality). Field ids round-trip through the `PARQUET:field_id`
//! metadata key; when any field in the tree lacks one, all ids are assigned
//! fresh in walk order instead.

use std::collections::HashMap;
use std::sync::Arc;

use arrow_schema::{DataType, Field, Fields, Schema as ArrowSchema, TimeUnit};

use crate::ir::{ListType, MapType, NestedField, PrimitiveType, StructType, Type};
use crate::schema::error::ConversionError;
use crate::schema::Schema;

use super::ToSchema;

/// Metadata key carrying the stable field id on an Arrow field.
pub const PARQUET_FIELD_ID_KEY: &str = "PARQUET:field_id";

impl ToSchema for ArrowSchema {
    fn to_schema(&self) -> Result<Schema, ConversionError> {
        let use_metadata_ids = self.fields().iter().all(|field| tree_has_field_ids(field));
        let mut next_id = 0;
        let mut fields = Vec::with_capacity(self.fields().len());
        for field in self.fields() {
            fields.push(convert_field(field, use_metadata_ids, &mut next_id)?);
        }
        Schema::new(0, fields).map_err(ConversionError::from)
    }
}

/// Converts a core schema to an Arrow schema, using the large variants
/// (`LargeUtf8`, `LargeBinary`, `LargeList`) and stamping every field with
/// its id under [`PARQUET_FIELD_ID_KEY`].
pub fn schema_to_arrow(schema: &Schema) -> ArrowSchema {
    let fields: Vec<Field> = schema.fields().iter().map(field_to_arrow).collect();
    ArrowSchema::new(fields)
}

fn field_id_from_metadata(field: &Field) -> Option<i32> {
    field.metadata().get(PARQUET_FIELD_ID_KEY).and_then(|value| value.parse().ok())
}

fn tree_has_field_ids(field: &Field) -> bool {
    if field_id_from_metadata(field).is_none() {
        return false;
    }
    match field.data_type() {
        DataType::Struct(children) => children.iter().all(|child| tree_has_field_ids(child)),
        DataType::List(element) | DataType::LargeList(element) => tree_has_field_ids(element),
        DataType::Map(entries, _) => match entries.data_type() {
            DataType::Struct(entry_fields) => {
                entry_fields.iter().all(|child| tree_has_field_ids(child))
            }
            _ => false,
        },
        _ => true,
    }
}

fn resolve_id(field: &Field, use_metadata_ids: bool, next_id: &mut i32) -> i32 {
    if use_metadata_ids {
        if let Some(field_id) = field_id_from_metadata(field) {
            return field_id;
        }
    }
    *next_id += 1;
    *next_id
}

fn convert_field(
    field: &Field,
    use_metadata_ids: bool,
    next_id: &mut i32,
) -> Result<NestedField, ConversionError> {
    let field_id = resolve_id(field, use_metadata_ids, next_id);
    let field_type = convert_type(field.data_type(), use_metadata_ids, next_id)?;
    Ok(NestedField::new(field_id, field.name().as_str(), field_type, !field.is_nullable()))
}

fn convert_type(
    data_type: &DataType,
    use_metadata_ids: bool,
    next_id: &mut i32,
) -> Result<Type, ConversionError> {
    let converted = match data_type {
        DataType::Boolean => Type::Primitive(PrimitiveType::Boolean),
        DataType::Int32 => Type::Primitive(PrimitiveType::Int),
        DataType::Int64 => Type::Primitive(PrimitiveType::Long),
        DataType::Float32 => Type::Primitive(PrimitiveType::Float),
        DataType::Float64 => Type::Primitive(PrimitiveType::Double),
        DataType::Utf8 | DataType::LargeUtf8 => Type::Primitive(PrimitiveType::String),
        DataType::Binary | DataType::LargeBinary => Type::Primitive(PrimitiveType::Binary),
        DataType::FixedSizeBinary(length) if *length > 0 => {
            Type::Primitive(PrimitiveType::Fixed(*length as u64))
        }
        DataType::Date32 => Type::Primitive(PrimitiveType::Date),
        DataType::Time64(TimeUnit::Microsecond) => Type::Primitive(PrimitiveType::Time),
        DataType::Timestamp(TimeUnit::Microsecond, Some(_)) => {
            Type::Primitive(PrimitiveType::Timestamptz)
        }
        DataType::Timestamp(TimeUnit::Microsecond, None) => {
            Type::Primitive(PrimitiveType::Timestamp)
        }
        DataType::Decimal128(precision, scale) if *scale >= 0 => Type::Primitive(
            PrimitiveType::Decimal { precision: *precision as u32, scale: *scale as u32 },
        ),
        DataType::Struct(children) => {
            let mut fields = Vec::with_capacity(children.len());
            for child in children {
                fields.push(convert_field(child, use_metadata_ids, next_id)?);
            }
            Type::Struct(StructType::new(fields))
        }
        DataType::List(element) | DataType::LargeList(element) => {
            let element_id = resolve_id(element, use_metadata_ids, next_id);
            let element_type = convert_type(element.data_type(), use_metadata_ids, next_id)?;
            Type::List(ListType::new(element_id, element_type, !element.is_nullable()))
        }
        DataType::Map(entries, _) => match entries.data_type() {
            DataType::Struct(entry_fields) if entry_fields.len() == 2 => {
                let key = &entry_fields[0];
                let value = &entry_fields[1];
                let key_id = resolve_id(key, use_metadata_ids, next_id);
                let value_id = resolve_id(value, use_metadata_ids, next_id);
                let key_type = convert_type(key.data_type(), use_metadata_ids, next_id)?;
                let value_type = convert_type(value.data_type(), use_metadata_ids, next_id)?;
                Type::Map(MapType::new(
                    key_id,
                    key_type,
                    value_id,
                    value_type,
                    !value.is_nullable(),
                ))
            }
            _ => return Err(ConversionError::UnsupportedArrowType(data_type.to_string())),
        },
        other => return Err(ConversionError::UnsupportedArrowType(other.to_string())),
    };
    Ok(converted)
}

fn field_to_arrow(field: &NestedField) -> Field {
    Field::new(field.name.clone(), type_to_arrow(&field.field_type), !field.required)
        .with_metadata(HashMap::from([(
            PARQUET_FIELD_ID_KEY.to_string(),
            field.field_id.to_string(),
        )]))
}

fn type_to_arrow(ty: &Type) -> DataType {
    match ty {
        Type::Primitive(primitive) => primitive_to_arrow(primitive),
        Type::Struct(struct_type) => {
            DataType::Struct(struct_type.fields().iter().map(field_to_arrow).collect::<Fields>())
        }
        Type::List(list_type) => {
            DataType::LargeList(Arc::new(field_to_arrow(&list_type.element_field())))
        }
        Type::Map(map_type) => {
            let key = field_to_arrow(&map_type.key_field());
            let value = field_to_arrow(&map_type.value_field());
            let entries =
                Field::new("entries", DataType::Struct(Fields::from(vec![key, value])), false);
            DataType::Map(Arc::new(entries), false)
        }
    }
}

fn primitive_to_arrow(primitive: &PrimitiveType) -> DataType {
    match primitive {
        PrimitiveType::Boolean => DataType::Boolean,
        PrimitiveType::Int => DataType::Int32,
        PrimitiveType::Long => DataType::Int64,
        PrimitiveType::Float => DataType::Float32,
        PrimitiveType::Double => DataType::Float64,
        PrimitiveType::Decimal { precision, scale } => {
            DataType::Decimal128(*precision as u8, *scale as i8)
        }
        PrimitiveType::Date => DataType::Date32,
        PrimitiveType::Time => DataType::Time64(TimeUnit::Microsecond),
        PrimitiveType::Timestamp => DataType::Timestamp(TimeUnit::Microsecond, None),
        PrimitiveType::Timestamptz => {
            DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into()))
        }
        PrimitiveType::String => DataType::LargeUtf8,
        PrimitiveType::Uuid => DataType::FixedSizeBinary(16),
        PrimitiveType::Binary => DataType::LargeBinary,
        PrimitiveType::Fixed(length) => DataType::FixedSizeBinary(*length as i32),
    }
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;

    use super::*;
    use crate::test_fixtures::{boolean, int, string, table_schema_nested};

    #[test]
    fn union_with_arrow_schema() {
        let base =
            Schema::new(0, vec![NestedField::required(1, "foo", string())]).unwrap();
        let arrow = ArrowSchema::new(vec![
            Field::new("foo", DataType::Utf8, false),
            Field::new("bar", DataType::Int32, true),
            Field::new("baz", DataType::Boolean, true),
        ]);

        let applied = base.union_by_name(&arrow).unwrap();

        let expected = Schema::new(
            0,
            vec![
                NestedField::required(1, "foo", string()),
                NestedField::optional(2, "bar", int()),
                NestedField::optional(3, "baz", boolean()),
            ],
        )
        .unwrap();
        assert_eq!(expected, applied);
    }

    #[test]
    fn arrow_schema_uses_large_types_and_field_id_metadata() {
        let schema = Schema::new(
            0,
            vec![
                NestedField::required(1, "foo", string()),
                NestedField::optional(2, "bar", int()),
            ],
        )
        .unwrap();
        let arrow = schema_to_arrow(&schema);

        let foo = arrow.field(0);
        assert_eq!(&DataType::LargeUtf8, foo.data_type());
        assert!(!foo.is_nullable());
        assert_eq!(Some("1"), foo.metadata().get(PARQUET_FIELD_ID_KEY).map(String::as_str));

        let bar = arrow.field(1);
        assert_eq!(&DataType::Int32, bar.data_type());
        assert!(bar.is_nullable());
    }

    #[test]
    fn arrow_round_trip_preserves_ids_and_shape() {
        let schema = table_schema_nested();
        let round_tripped = schema_to_arrow(&schema).to_schema().unwrap();
        assert_eq!(schema.as_struct(), round_tripped.as_struct());
    }

    #[test]
    fn unknown_arrow_type_fails_before_the_union() {
        let base = Schema::default();
        let arrow = ArrowSchema::new(vec![Field::new(
            "elapsed",
            DataType::Duration(TimeUnit::Millisecond),
            true,
        )]);
        let err = base.union_by_name(&arrow).unwrap_err();
        assert!(err.to_string().contains("Unsupported Arrow data type"), "{err}");
    }
}
