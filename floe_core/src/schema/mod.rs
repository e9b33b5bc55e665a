//! The schema value and its derived state.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt::{self, Display, Formatter};

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::ir::{NestedField, StructType, Type};

mod accessor;
pub mod adapter;
pub mod error;
mod index;
mod promote;
mod prune;
mod sanitize;
mod union;
pub mod visitor;

pub use accessor::Accessor;
pub use adapter::ToSchema;
pub use error::{
    ConversionError, InvalidSchemaError, ProjectError, ResolveError, ValidationError,
};
pub use index::{build_position_accessors, index_by_id, index_by_name, index_name_by_id};
pub use promote::promote;
pub use prune::prune_columns;
pub use sanitize::sanitize_column_names;

/// An immutable table schema: a top-level struct with a schema id and a set
/// of identifier fields.
///
/// Every field in the tree is addressable two ways: by its stable numeric id
/// and by its dotted name path. Construction validates name uniqueness per
/// struct level and all identifier-field rules; all transforms
/// ([`Schema::select`], [`prune_columns`], [`Schema::union_by_name`],
/// [`sanitize_column_names`]) return new schemas.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "SchemaSer", into = "SchemaSer")]
pub struct Schema {
    schema_id: i32,
    identifier_field_ids: BTreeSet<i32>,
    struct_type: StructType,
    highest_field_id: i32,
    id_to_field: HashMap<i32, NestedField>,
    name_to_id: HashMap<String, i32>,
    id_to_name: HashMap<i32, String>,
    // Memoized lazily; racing readers observe identical results.
    lowercase_name_to_id: OnceCell<HashMap<String, i32>>,
    position_accessors: OnceCell<HashMap<i32, Accessor>>,
}

impl Schema {
    /// Builds a schema with no identifier fields.
    pub fn new(schema_id: i32, fields: Vec<NestedField>) -> Result<Self, InvalidSchemaError> {
        Self::with_identifier_fields(schema_id, fields, [])
    }

    /// Builds a schema, validating the identifier-field rules: each id must
    /// name a required primitive that is neither float nor double, with no
    /// list, map or optional struct among its ancestors.
    pub fn with_identifier_fields(
        schema_id: i32,
        fields: Vec<NestedField>,
        identifier_field_ids: impl IntoIterator<Item = i32>,
    ) -> Result<Self, InvalidSchemaError> {
        let struct_type = StructType::new(fields);
        let identifier_field_ids: BTreeSet<i32> = identifier_field_ids.into_iter().collect();

        let mut errors = vec![];

        let (name_to_id, id_to_name) = match index::build_name_index(&struct_type) {
            Ok(name_index) => (name_index.name_to_id, name_index.id_to_name),
            Err(e) => {
                errors.push(e);
                (HashMap::new(), HashMap::new())
            }
        };

        let id_to_field = index::index_struct_by_id(&struct_type);
        let parents = index::index_parents(&struct_type);
        for &field_id in &identifier_field_ids {
            if let Err(e) = validate_identifier_field(field_id, &id_to_field, &parents) {
                errors.push(e);
            }
        }

        if !errors.is_empty() {
            return Err(errors.into());
        }

        let highest_field_id = id_to_field.keys().max().copied().unwrap_or(0);
        Ok(Self {
            schema_id,
            identifier_field_ids,
            struct_type,
            highest_field_id,
            id_to_field,
            name_to_id,
            id_to_name,
            lowercase_name_to_id: OnceCell::new(),
            position_accessors: OnceCell::new(),
        })
    }

    pub fn schema_id(&self) -> i32 {
        self.schema_id
    }

    pub fn identifier_field_ids(&self) -> &BTreeSet<i32> {
        &self.identifier_field_ids
    }

    /// The schema's fields, viewed as a struct type.
    pub fn as_struct(&self) -> &StructType {
        &self.struct_type
    }

    pub fn fields(&self) -> &[NestedField] {
        self.struct_type.fields()
    }

    /// The maximum field id anywhere in the tree, or 0 for an empty schema.
    pub fn highest_field_id(&self) -> i32 {
        self.highest_field_id
    }

    /// Looks up a field anywhere in the tree by id, including the synthetic
    /// `element`/`key`/`value` fields of lists and maps.
    pub fn field_by_id(&self, field_id: i32) -> Option<&NestedField> {
        self.id_to_field.get(&field_id)
    }

    pub fn find_field_by_id(&self, field_id: i32) -> Result<&NestedField, ResolveError> {
        self.field_by_id(field_id).ok_or(ResolveError::FieldIdNotFound(field_id))
    }

    /// Looks up a field by name or dotted name path. Case-insensitive lookup
    /// folds names to lowercase before matching.
    pub fn find_field(
        &self,
        name: &str,
        case_sensitive: bool,
    ) -> Result<&NestedField, ResolveError> {
        let field_id = if case_sensitive {
            self.name_to_id.get(name)
        } else {
            self.lowercase_index().get(&name.to_lowercase())
        };
        let field_id = field_id.ok_or_else(|| ResolveError::FieldNameNotFound {
            name: name.to_string(),
            case_sensitive,
        })?;
        self.find_field_by_id(*field_id)
    }

    pub fn find_type(&self, name: &str, case_sensitive: bool) -> Result<&Type, ResolveError> {
        self.find_field(name, case_sensitive).map(|field| &field.field_type)
    }

    pub fn find_type_by_id(&self, field_id: i32) -> Result<&Type, ResolveError> {
        self.find_field_by_id(field_id).map(|field| &field.field_type)
    }

    /// The full dotted name path for a field id, or `None` when the id is
    /// not in the tree.
    pub fn find_column_name(&self, field_id: i32) -> Option<&str> {
        self.id_to_name.get(&field_id).map(String::as_str)
    }

    /// The position accessor for a field id. Only fields whose ancestors are
    /// all structs are position-addressable.
    pub fn accessor_for(&self, field_id: i32) -> Option<&Accessor> {
        self.position_accessors
            .get_or_init(|| index::build_position_accessors(self))
            .get(&field_id)
    }

    /// Returns a new schema with only the fields reachable from the named
    /// roots, preserving declaration order. Identifier fields are kept only
    /// when selected.
    pub fn select<S: AsRef<str>>(
        &self,
        names: &[S],
        case_sensitive: bool,
    ) -> Result<Schema, ProjectError> {
        let mut selected = HashSet::new();
        for name in names {
            let name = name.as_ref();
            let field_id = if case_sensitive {
                self.name_to_id.get(name)
            } else {
                self.lowercase_index().get(&name.to_lowercase())
            };
            match field_id {
                Some(&field_id) => {
                    selected.insert(field_id);
                }
                None => return Err(ProjectError::ColumnNotFound(name.to_string())),
            }
        }
        prune_columns(self, &selected, true)
    }

    /// Merges another schema (or anything lowered through [`ToSchema`]) into
    /// this one by name, preserving existing ids and allocating fresh ids
    /// for genuinely new subtrees.
    pub fn union_by_name<S: ToSchema + ?Sized>(
        &self,
        new_schema: &S,
    ) -> Result<Schema, ValidationError> {
        let new_schema = new_schema.to_schema()?;
        union::union_by_name(self, &new_schema, true)
    }

    pub(crate) fn name_index(&self) -> &HashMap<String, i32> {
        &self.name_to_id
    }

    pub(crate) fn id_to_name_index(&self) -> &HashMap<i32, String> {
        &self.id_to_name
    }

    fn lowercase_index(&self) -> &HashMap<String, i32> {
        self.lowercase_name_to_id.get_or_init(|| {
            self.name_to_id.iter().map(|(name, &id)| (name.to_lowercase(), id)).collect()
        })
    }
}

fn validate_identifier_field(
    field_id: i32,
    id_to_field: &HashMap<i32, NestedField>,
    parents: &HashMap<i32, i32>,
) -> Result<(), InvalidSchemaError> {
    let field = id_to_field
        .get(&field_id)
        .ok_or(InvalidSchemaError::MissingIdentifierField(field_id))?;
    if !field.field_type.is_primitive() {
        return Err(InvalidSchemaError::IdentifierFieldNotPrimitive(field_id));
    }
    if !field.required {
        return Err(InvalidSchemaError::IdentifierFieldNotRequired(field_id));
    }
    if field.field_type.is_floating_point() {
        return Err(InvalidSchemaError::IdentifierFieldFloatingPoint(field_id));
    }

    let mut parent_id = parents.get(&field_id);
    while let Some(&id) = parent_id {
        let parent = id_to_field
            .get(&id)
            .ok_or(InvalidSchemaError::MissingIdentifierField(id))?;
        if !parent.field_type.is_struct() {
            return Err(InvalidSchemaError::IdentifierFieldInCollection {
                name: field.name.clone(),
                ancestor: parent.to_string(),
            });
        }
        if !parent.required {
            return Err(InvalidSchemaError::IdentifierFieldInOptionalStruct {
                name: field.name.clone(),
                ancestor: parent.to_string(),
            });
        }
        parent_id = parents.get(&id);
    }
    Ok(())
}

impl Default for Schema {
    fn default() -> Self {
        Self::new(0, Vec::new()).expect("the empty schema is always valid")
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.schema_id == other.schema_id
            && self.identifier_field_ids == other.identifier_field_ids
            && self.struct_type == other.struct_type
    }
}

impl Eq for Schema {}

impl Display for Schema {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "table {{")?;
        for field in self.fields() {
            writeln!(f, "  {field}")?;
        }
        write!(f, "}}")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum StructTag {
    Struct,
}

/// The canonical JSON form: `type`/`fields`/`schema-id`/`identifier-field-ids`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SchemaSer {
    #[serde(rename = "type")]
    tag: StructTag,
    fields: Vec<NestedField>,
    #[serde(rename = "schema-id", default)]
    schema_id: i32,
    #[serde(rename = "identifier-field-ids", default)]
    identifier_field_ids: Vec<i32>,
}

impl From<Schema> for SchemaSer {
    fn from(schema: Schema) -> Self {
        SchemaSer {
            tag: StructTag::Struct,
            schema_id: schema.schema_id,
            identifier_field_ids: schema.identifier_field_ids.iter().copied().collect(),
            fields: schema.struct_type.into_fields(),
        }
    }
}

impl TryFrom<SchemaSer> for Schema {
    type Error = InvalidSchemaError;

    fn try_from(ser: SchemaSer) -> Result<Self, Self::Error> {
        Schema::with_identifier_fields(ser.schema_id, ser.fields, ser.identifier_field_ids)
    }
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;

    use super::*;
    use crate::ir::{ListType, PrimitiveType};
    use crate::test_fixtures::{
        boolean, int, string, table_schema_nested, table_schema_nested_with_struct_key_map,
        table_schema_simple, table_schema_with_full_nested_fields,
    };

    #[test]
    fn schema_display() {
        let expected = "table {\n  1: foo: optional string\n  2: bar: required int\n  3: baz: optional boolean\n}";
        assert_eq!(expected, table_schema_simple().to_string());
    }

    #[test]
    fn duplicate_names_in_one_struct_level_are_rejected() {
        let err = Schema::with_identifier_fields(
            1,
            vec![
                NestedField::optional(1, "foo", string()),
                NestedField::required(2, "bar", int()),
                NestedField::optional(3, "baz", boolean()),
                NestedField::optional(4, "baz", boolean()),
            ],
            [2],
        )
        .unwrap_err();
        assert!(
            err.to_string().contains("Invalid schema, multiple fields for name baz: 3 and 4"),
            "{err}"
        );
    }

    #[test]
    fn duplicate_names_are_allowed_across_levels() {
        let schema = Schema::new(
            0,
            vec![
                NestedField::optional(1, "name", string()),
                NestedField::optional(
                    2,
                    "person",
                    Type::Struct(StructType::new(vec![NestedField::optional(3, "name", string())])),
                ),
            ],
        )
        .unwrap();
        assert_eq!(Some("person.name"), schema.find_column_name(3));
    }

    #[test]
    fn identifier_field_validation() {
        let fields = table_schema_nested_with_struct_key_map().fields().to_vec();
        let build = |ids: [i32; 1]| {
            Schema::with_identifier_fields(1, fields.clone(), ids).unwrap_err().to_string()
        };

        assert!(build([999]).contains("Could not find field with id: 999"));
        assert!(build([11]).contains("Identifier field 11 invalid: not a primitive type field"));
        assert!(build([3]).contains("Identifier field 3 invalid: not a required field"));
        assert!(build([28]).contains("Identifier field 28 invalid: must not be float or double field"));
        assert!(build([29]).contains("Identifier field 29 invalid: must not be float or double field"));

        let schema = table_schema_nested_with_struct_key_map();
        let location = schema.find_field("location", true).unwrap();
        assert!(build([23]).contains(&format!(
            "Cannot add field zip as an identifier field: must not be nested in {location}"
        )));

        let points = schema.find_field("points", true).unwrap();
        assert!(build([26]).contains(&format!(
            "Cannot add field x as an identifier field: must not be nested in {points}"
        )));

        let person = schema.find_field("person", true).unwrap();
        assert!(build([17]).contains(&format!(
            "Cannot add field age as an identifier field: \
             must not be nested in an optional field {person}"
        )));
    }

    #[test]
    fn multiple_identifier_violations_are_all_reported() {
        let fields = table_schema_nested_with_struct_key_map().fields().to_vec();
        let err = Schema::with_identifier_fields(1, fields, [3, 11]).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Multiple schema errors"), "{message}");
        assert!(message.contains("Identifier field 3 invalid: not a required field"));
        assert!(message.contains("Identifier field 11 invalid: not a primitive type field"));
    }

    #[test]
    fn find_field_by_id_and_name() {
        let schema = table_schema_simple();
        let expected = NestedField::optional(1, "foo", string());
        assert_eq!(&expected, schema.find_field_by_id(1).unwrap());
        assert_eq!(&expected, schema.find_field("foo", true).unwrap());
        assert_eq!(&expected, schema.find_field("FOO", false).unwrap());

        let err = schema.find_field_by_id(4).unwrap_err();
        assert_eq!("Could not find field with id: 4", err.to_string());

        let err = schema.find_field("FOO", true).unwrap_err();
        assert!(err.to_string().contains("Could not find field with name FOO"), "{err}");
    }

    #[test]
    fn find_type() {
        let schema = table_schema_simple();
        assert_eq!(&string(), schema.find_type("foo", true).unwrap());
        assert_eq!(&int(), schema.find_type("BAR", false).unwrap());
        assert_eq!(&boolean(), schema.find_type_by_id(3).unwrap());
    }

    #[test]
    fn find_column_name_uses_long_paths() {
        let schema = table_schema_nested();
        assert_eq!(Some("foo"), schema.find_column_name(1));
        assert_eq!(Some("qux.element"), schema.find_column_name(5));
        assert_eq!(Some("quux.value.key"), schema.find_column_name(9));
        assert_eq!(Some("location.element.latitude"), schema.find_column_name(13));
        assert_eq!(None, schema.find_column_name(99));
    }

    #[test]
    fn highest_field_id() {
        assert_eq!(17, table_schema_nested().highest_field_id());
        assert_eq!(0, Schema::default().highest_field_id());
    }

    #[test]
    fn select_keeps_declaration_order_and_identifiers() {
        let schema = table_schema_nested();
        let expected = Schema::with_identifier_fields(
            1,
            vec![
                NestedField::required(2, "bar", int()),
                NestedField::optional(3, "baz", boolean()),
            ],
            [2],
        )
        .unwrap();
        assert_eq!(expected, schema.select(&["bar", "baz"], true).unwrap());
    }

    #[test]
    fn select_case_insensitive() {
        let schema = table_schema_nested();
        let expected =
            Schema::new(1, vec![NestedField::optional(3, "baz", boolean())]).unwrap();
        assert_eq!(expected, schema.select(&["BAZ"], false).unwrap());
    }

    #[test]
    fn select_missing_column() {
        let schema = table_schema_nested();
        let err = schema.select(&["BAZ"], true).unwrap_err();
        assert_eq!("Could not find column: 'BAZ'", err.to_string());
    }

    #[test]
    fn serialize_schema_canonical_json() {
        let schema = table_schema_with_full_nested_fields();
        let expected = "{\"type\":\"struct\",\"fields\":[\
            {\"id\":1,\"name\":\"foo\",\"type\":\"string\",\"required\":false,\"doc\":\"foo doc\",\"initial-default\":\"foo initial\",\"write-default\":\"foo write\"},\
            {\"id\":2,\"name\":\"bar\",\"type\":\"int\",\"required\":true,\"doc\":\"bar doc\",\"initial-default\":42,\"write-default\":43},\
            {\"id\":3,\"name\":\"baz\",\"type\":\"boolean\",\"required\":false,\"doc\":\"baz doc\",\"initial-default\":true,\"write-default\":false}\
            ],\"schema-id\":1,\"identifier-field-ids\":[2]}";
        assert_eq!(expected, serde_json::to_string(&schema).unwrap());
    }

    #[test]
    fn deserialize_schema_canonical_json() {
        let parsed: Schema = serde_json::from_str(
            "{\"type\": \"struct\", \"fields\": [\
             {\"id\": 1, \"name\": \"foo\", \"type\": \"string\", \"required\": false, \"doc\": \"foo doc\", \"initial-default\": \"foo initial\", \"write-default\": \"foo write\"}, \
             {\"id\": 2, \"name\": \"bar\", \"type\": \"int\", \"required\": true, \"doc\": \"bar doc\", \"initial-default\": 42, \"write-default\": 43}, \
             {\"id\": 3, \"name\": \"baz\", \"type\": \"boolean\", \"required\": false, \"doc\": \"baz doc\", \"initial-default\": true, \"write-default\": false}\
             ], \"schema-id\": 1, \"identifier-field-ids\": [2]}",
        )
        .unwrap();
        assert_eq!(table_schema_with_full_nested_fields(), parsed);
    }

    #[test]
    fn json_round_trip_nested() {
        let schema = table_schema_nested();
        let json = serde_json::to_string(&schema).unwrap();
        let parsed: Schema = serde_json::from_str(&json).unwrap();
        assert_eq!(schema, parsed);
    }

    #[test]
    fn deserialize_rejects_invalid_identifier_fields() {
        let err = serde_json::from_str::<Schema>(
            "{\"type\": \"struct\", \"fields\": [\
             {\"id\": 1, \"name\": \"foo\", \"type\": \"string\", \"required\": false}\
             ], \"schema-id\": 0, \"identifier-field-ids\": [1]}",
        )
        .unwrap_err();
        assert!(
            err.to_string().contains("Identifier field 1 invalid: not a required field"),
            "{err}"
        );
    }

    #[test]
    fn accessor_for_nested_struct_field() {
        let schema = table_schema_nested();
        assert_eq!(Some(&Accessor::nested(6, Accessor::new(1))), schema.accessor_for(17));
        // Fields under a list or map are not position-addressable.
        assert_eq!(None, schema.accessor_for(5));
    }

    #[test]
    fn every_reachable_id_is_indexed_exactly_once() {
        let schema = table_schema_nested();
        let index = index_by_id(&schema);
        for field_id in 1..=schema.highest_field_id() {
            let field = index.get(&field_id).expect("all ids 1..=17 are present");
            let column_name = schema.find_column_name(field_id).expect("indexed ids have names");
            let last_segment = column_name.rsplit('.').next().expect("paths are non-empty");
            assert_eq!(field.name, last_segment);
        }
    }

    #[test]
    fn empty_struct_fields_are_valid() {
        let schema = Schema::new(
            0,
            vec![NestedField::optional(
                1,
                "empty",
                Type::Struct(StructType::default()),
            )],
        )
        .unwrap();
        assert_eq!(1, schema.highest_field_id());
        assert_eq!(
            &Type::Struct(StructType::default()),
            schema.find_type_by_id(1).unwrap()
        );
    }

    #[test]
    fn list_ids_are_reachable_by_path() {
        let schema = Schema::new(
            0,
            vec![NestedField::required(
                4,
                "qux",
                Type::List(ListType::new(5, Type::Primitive(PrimitiveType::String), true)),
            )],
        )
        .unwrap();
        assert_eq!(&NestedField::required(5, "element", string()), schema.find_field("qux.element", true).unwrap());
    }
}
