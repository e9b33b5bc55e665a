use std::convert::Infallible;

use crate::ir::{ListType, MapType, NestedField, PrimitiveType, StructType, Type};

use super::error::InvalidSchemaError;
use super::visitor::{into_ok, visit_schema, SchemaVisitor};
use super::Schema;

/// Rewrites every field name to the restricted character set
/// `[A-Za-z0-9_]`, keeping ids, shape, requiredness, docs and defaults.
///
/// A leading digit becomes `_<digit>`; any other invalid character becomes
/// `_xHH` with `HH` the uppercase hex code of the character. Rewriting can
/// make two sibling names collide, which fails like any other duplicate.
pub fn sanitize_column_names(schema: &Schema) -> Result<Schema, InvalidSchemaError> {
    let mut visitor = SanitizeColumns;
    let result = into_ok(visit_schema(schema, &mut visitor));
    let fields = match result {
        Type::Struct(struct_type) => struct_type.into_fields(),
        _ => unreachable!("sanitizing a schema always yields a struct"),
    };
    Schema::with_identifier_fields(
        schema.schema_id(),
        fields,
        schema.identifier_field_ids().iter().copied(),
    )
}

fn sanitize_name(name: &str) -> String {
    let mut sanitized = String::with_capacity(name.len());
    for (position, character) in name.chars().enumerate() {
        let valid = if position == 0 {
            character.is_alphabetic() || character == '_'
        } else {
            character.is_alphanumeric() || character == '_'
        };
        if valid {
            sanitized.push(character);
        } else if character.is_ascii_digit() {
            sanitized.push('_');
            sanitized.push(character);
        } else {
            sanitized.push_str(&format!("_x{:X}", character as u32));
        }
    }
    sanitized
}

fn sanitize_field(field: &NestedField, sanitized_type: Type) -> NestedField {
    NestedField {
        name: sanitize_name(&field.name),
        field_type: sanitized_type,
        ..field.clone()
    }
}

struct SanitizeColumns;

impl SchemaVisitor for SanitizeColumns {
    type Output = Type;
    type Error = Infallible;

    fn schema(&mut self, _schema: &Schema, struct_result: Type) -> Result<Type, Infallible> {
        Ok(struct_result)
    }

    fn r#struct(
        &mut self,
        struct_type: &StructType,
        field_results: Vec<Type>,
    ) -> Result<Type, Infallible> {
        let fields = struct_type
            .fields()
            .iter()
            .zip(field_results)
            .map(|(field, sanitized_type)| sanitize_field(field, sanitized_type))
            .collect();
        Ok(Type::Struct(StructType::new(fields)))
    }

    fn field(&mut self, _field: &NestedField, field_result: Type) -> Result<Type, Infallible> {
        Ok(field_result)
    }

    fn list(&mut self, list_type: &ListType, element_result: Type) -> Result<Type, Infallible> {
        Ok(Type::List(ListType::new(
            list_type.element_id,
            element_result,
            list_type.element_required,
        )))
    }

    fn map(
        &mut self,
        map_type: &MapType,
        key_result: Type,
        value_result: Type,
    ) -> Result<Type, Infallible> {
        Ok(Type::Map(MapType::new(
            map_type.key_id,
            key_result,
            map_type.value_id,
            value_result,
            map_type.value_required,
        )))
    }

    fn primitive(&mut self, primitive: &PrimitiveType) -> Result<Type, Infallible> {
        Ok(Type::Primitive(primitive.clone()))
    }
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;

    use super::*;
    use crate::test_fixtures::{float, int, long, string};

    #[test]
    fn sanitize_name_rules() {
        assert_eq!("foo_x2Fbar", sanitize_name("foo/bar"));
        assert_eq!("_9x", sanitize_name("9x"));
        assert_eq!("a9", sanitize_name("a9"));
        assert_eq!("already_valid_1", sanitize_name("already_valid_1"));
        assert_eq!("a_x20b", sanitize_name("a b"));
    }

    #[test]
    fn sanitize_is_idempotent() {
        let once = sanitize_name("foo/bar");
        assert_eq!(once.clone(), sanitize_name(&once));
    }

    #[test]
    fn sanitize_rewrites_names_at_every_depth() {
        let schema = Schema::with_identifier_fields(
            1,
            vec![
                NestedField::required(1, "foo_field/bar", string()),
                NestedField::required(
                    2,
                    "foo_list/bar",
                    Type::List(ListType::new(3, string(), true)),
                ),
                NestedField::required(
                    4,
                    "foo_map/bar",
                    Type::Map(MapType::new(
                        5,
                        string(),
                        6,
                        Type::Map(MapType::new(7, string(), 10, int(), true)),
                        true,
                    )),
                ),
                NestedField::optional(
                    8,
                    "foo_struct/bar",
                    Type::Struct(StructType::new(vec![
                        NestedField::optional(9, "foo_struct_1/bar", string()),
                        NestedField::required(17, "foo_struct_2/bar", int()),
                    ])),
                ),
                NestedField::optional(
                    11,
                    "foo_list_2/bar",
                    Type::List(ListType::new(
                        12,
                        Type::Struct(StructType::new(vec![
                            NestedField::required(13, "foo_list_2_1/bar", long()),
                            NestedField::required(14, "foo_list_2_2/bar", long()),
                        ])),
                        false,
                    )),
                ),
                NestedField::required(
                    15,
                    "foo_map_2/bar",
                    Type::Map(MapType::new(
                        16,
                        Type::Struct(StructType::new(vec![NestedField::required(
                            18,
                            "foo_map_2_1/bar",
                            string(),
                        )])),
                        19,
                        Type::Struct(StructType::new(vec![NestedField::required(
                            20,
                            "foo_map_2_2/bar",
                            float(),
                        )])),
                        true,
                    )),
                ),
            ],
            [1],
        )
        .unwrap();

        let expected = Schema::with_identifier_fields(
            1,
            vec![
                NestedField::required(1, "foo_field_x2Fbar", string()),
                NestedField::required(
                    2,
                    "foo_list_x2Fbar",
                    Type::List(ListType::new(3, string(), true)),
                ),
                NestedField::required(
                    4,
                    "foo_map_x2Fbar",
                    Type::Map(MapType::new(
                        5,
                        string(),
                        6,
                        Type::Map(MapType::new(7, string(), 10, int(), true)),
                        true,
                    )),
                ),
                NestedField::optional(
                    8,
                    "foo_struct_x2Fbar",
                    Type::Struct(StructType::new(vec![
                        NestedField::optional(9, "foo_struct_1_x2Fbar", string()),
                        NestedField::required(17, "foo_struct_2_x2Fbar", int()),
                    ])),
                ),
                NestedField::optional(
                    11,
                    "foo_list_2_x2Fbar",
                    Type::List(ListType::new(
                        12,
                        Type::Struct(StructType::new(vec![
                            NestedField::required(13, "foo_list_2_1_x2Fbar", long()),
                            NestedField::required(14, "foo_list_2_2_x2Fbar", long()),
                        ])),
                        false,
                    )),
                ),
                NestedField::required(
                    15,
                    "foo_map_2_x2Fbar",
                    Type::Map(MapType::new(
                        16,
                        Type::Struct(StructType::new(vec![NestedField::required(
                            18,
                            "foo_map_2_1_x2Fbar",
                            string(),
                        )])),
                        19,
                        Type::Struct(StructType::new(vec![NestedField::required(
                            20,
                            "foo_map_2_2_x2Fbar",
                            float(),
                        )])),
                        true,
                    )),
                ),
            ],
            [1],
        )
        .unwrap();

        assert_eq!(expected, sanitize_column_names(&schema).unwrap());
    }

    #[test]
    fn sanitize_twice_is_the_same_schema() {
        let schema = Schema::new(
            0,
            vec![NestedField::required(1, "a/b", string())],
        )
        .unwrap();
        let once = sanitize_column_names(&schema).unwrap();
        let twice = sanitize_column_names(&once).unwrap();
        assert_eq!(once, twice);
    }
}
