//! Derived indexes over a schema tree, each built by a single visit.

use std::collections::HashMap;
use std::convert::Infallible;

use crate::ir::{ListType, MapType, NestedField, PrimitiveType, StructType};

use super::accessor::Accessor;
use super::error::InvalidSchemaError;
use super::visitor::{into_ok, visit_schema, visit_struct, SchemaVisitor};
use super::Schema;

/// Maps every field id in the schema to its field, including the synthetic
/// `element`, `key` and `value` fields of lists and maps.
pub fn index_by_id(schema: &Schema) -> HashMap<i32, NestedField> {
    index_struct_by_id(schema.as_struct())
}

/// Maps every dotted name path in the schema to its field id. Struct-typed
/// list elements additionally contribute short paths that omit the `element`
/// segment; the full path wins when both name the same id.
pub fn index_by_name(schema: &Schema) -> HashMap<String, i32> {
    schema.name_index().clone()
}

/// Maps every field id to its full dotted name path.
pub fn index_name_by_id(schema: &Schema) -> HashMap<i32, String> {
    schema.id_to_name_index().clone()
}

/// Maps field ids to position [`Accessor`]s. Only fields whose ancestors are
/// all structs are position-addressable, so fields under a list or map do
/// not appear.
pub fn build_position_accessors(schema: &Schema) -> HashMap<i32, Accessor> {
    let mut visitor = BuildPositionAccessors;
    into_ok(visit_schema(schema, &mut visitor))
}

pub(crate) fn index_struct_by_id(struct_type: &StructType) -> HashMap<i32, NestedField> {
    let mut visitor = IndexById::default();
    into_ok(visit_struct(struct_type, &mut visitor));
    visitor.index
}

pub(crate) fn index_parents(struct_type: &StructType) -> HashMap<i32, i32> {
    let mut visitor = IndexParents::default();
    into_ok(visit_struct(struct_type, &mut visitor));
    visitor.parents
}

pub(crate) struct NameIndex {
    pub(crate) name_to_id: HashMap<String, i32>,
    pub(crate) id_to_name: HashMap<i32, String>,
}

pub(crate) fn build_name_index(struct_type: &StructType) -> Result<NameIndex, InvalidSchemaError> {
    let mut visitor = IndexByName::default();
    visit_struct(struct_type, &mut visitor)?;
    Ok(visitor.into_name_index())
}

#[derive(Default)]
struct IndexById {
    index: HashMap<i32, NestedField>,
}

impl SchemaVisitor for IndexById {
    type Output = ();
    type Error = Infallible;

    fn schema(&mut self, _schema: &Schema, _result: ()) -> Result<(), Infallible> {
        Ok(())
    }

    fn r#struct(&mut self, _struct_type: &StructType, _results: Vec<()>) -> Result<(), Infallible> {
        Ok(())
    }

    fn field(&mut self, field: &NestedField, _result: ()) -> Result<(), Infallible> {
        self.index.insert(field.field_id, field.clone());
        Ok(())
    }

    fn list(&mut self, list_type: &ListType, _result: ()) -> Result<(), Infallible> {
        self.index.insert(list_type.element_id, list_type.element_field());
        Ok(())
    }

    fn map(&mut self, map_type: &MapType, _key: (), _value: ()) -> Result<(), Infallible> {
        self.index.insert(map_type.key_id, map_type.key_field());
        self.index.insert(map_type.value_id, map_type.value_field());
        Ok(())
    }

    fn primitive(&mut self, _primitive: &PrimitiveType) -> Result<(), Infallible> {
        Ok(())
    }
}

/// Tracks the enclosing field of every field id. List elements and map
/// keys/values hang off the field carrying the container; struct members
/// hang off the enclosing struct's field.
#[derive(Default)]
struct IndexParents {
    parents: HashMap<i32, i32>,
    id_stack: Vec<i32>,
}

impl SchemaVisitor for IndexParents {
    type Output = ();
    type Error = Infallible;

    fn before_field(&mut self, field: &NestedField) {
        if let Some(&parent) = self.id_stack.last() {
            self.parents.insert(field.field_id, parent);
        }
        self.id_stack.push(field.field_id);
    }

    fn after_field(&mut self, _field: &NestedField) {
        self.id_stack.pop();
    }

    fn schema(&mut self, _schema: &Schema, _result: ()) -> Result<(), Infallible> {
        Ok(())
    }

    fn r#struct(&mut self, _struct_type: &StructType, _results: Vec<()>) -> Result<(), Infallible> {
        Ok(())
    }

    fn field(&mut self, _field: &NestedField, _result: ()) -> Result<(), Infallible> {
        Ok(())
    }

    fn list(&mut self, _list_type: &ListType, _result: ()) -> Result<(), Infallible> {
        Ok(())
    }

    fn map(&mut self, _map_type: &MapType, _key: (), _value: ()) -> Result<(), Infallible> {
        Ok(())
    }

    fn primitive(&mut self, _primitive: &PrimitiveType) -> Result<(), Infallible> {
        Ok(())
    }
}

#[derive(Default)]
struct IndexByName {
    index: HashMap<String, i32>,
    short_name_to_id: HashMap<String, i32>,
    field_names: Vec<String>,
    short_field_names: Vec<String>,
}

impl IndexByName {
    fn add_field(&mut self, name: &str, field_id: i32) -> Result<(), InvalidSchemaError> {
        let full_name = if self.field_names.is_empty() {
            name.to_string()
        } else {
            format!("{}.{name}", self.field_names.join("."))
        };
        if let Some(&existing) = self.index.get(&full_name) {
            return Err(InvalidSchemaError::DuplicateFieldName {
                name: full_name,
                first_field_id: existing,
                second_field_id: field_id,
            });
        }
        self.index.insert(full_name, field_id);

        if !self.short_field_names.is_empty() {
            let short_name = format!("{}.{name}", self.short_field_names.join("."));
            self.short_name_to_id.insert(short_name, field_id);
        }
        Ok(())
    }

    fn into_name_index(self) -> NameIndex {
        let id_to_name =
            self.index.iter().map(|(name, &id)| (id, name.clone())).collect();

        // Short names resolve too, but the full path wins on collision.
        let mut name_to_id = self.short_name_to_id;
        name_to_id.extend(self.index);

        NameIndex { name_to_id, id_to_name }
    }
}

impl SchemaVisitor for IndexByName {
    type Output = ();
    type Error = InvalidSchemaError;

    fn before_field(&mut self, field: &NestedField) {
        self.field_names.push(field.name.clone());
        self.short_field_names.push(field.name.clone());
    }

    fn after_field(&mut self, _field: &NestedField) {
        self.field_names.pop();
        self.short_field_names.pop();
    }

    // Short paths skip the `element` segment only when the element is a
    // struct. Map keys and values always keep their segment.
    fn before_list_element(&mut self, field: &NestedField) {
        if !field.field_type.is_struct() {
            self.short_field_names.push(field.name.clone());
        }
        self.field_names.push(field.name.clone());
    }

    fn after_list_element(&mut self, field: &NestedField) {
        if !field.field_type.is_struct() {
            self.short_field_names.pop();
        }
        self.field_names.pop();
    }

    fn schema(&mut self, _schema: &Schema, _result: ()) -> Result<(), InvalidSchemaError> {
        Ok(())
    }

    fn r#struct(
        &mut self,
        _struct_type: &StructType,
        _results: Vec<()>,
    ) -> Result<(), InvalidSchemaError> {
        Ok(())
    }

    fn field(&mut self, field: &NestedField, _result: ()) -> Result<(), InvalidSchemaError> {
        self.add_field(&field.name, field.field_id)
    }

    fn list(&mut self, list_type: &ListType, _result: ()) -> Result<(), InvalidSchemaError> {
        self.add_field("element", list_type.element_id)
    }

    fn map(&mut self, map_type: &MapType, _key: (), _value: ()) -> Result<(), InvalidSchemaError> {
        self.add_field("key", map_type.key_id)?;
        self.add_field("value", map_type.value_id)
    }

    fn primitive(&mut self, _primitive: &PrimitiveType) -> Result<(), InvalidSchemaError> {
        Ok(())
    }
}

struct BuildPositionAccessors;

impl SchemaVisitor for BuildPositionAccessors {
    type Output = HashMap<i32, Accessor>;
    type Error = Infallible;

    fn schema(
        &mut self,
        _schema: &Schema,
        struct_result: Self::Output,
    ) -> Result<Self::Output, Infallible> {
        Ok(struct_result)
    }

    fn r#struct(
        &mut self,
        struct_type: &StructType,
        field_results: Vec<Self::Output>,
    ) -> Result<Self::Output, Infallible> {
        let mut result = HashMap::new();
        for (position, (field, inner)) in
            struct_type.fields().iter().zip(field_results).enumerate()
        {
            for (field_id, accessor) in inner {
                result.insert(field_id, Accessor::nested(position, accessor));
            }
            result.insert(field.field_id, Accessor::new(position));
        }
        Ok(result)
    }

    fn field(
        &mut self,
        _field: &NestedField,
        field_result: Self::Output,
    ) -> Result<Self::Output, Infallible> {
        Ok(field_result)
    }

    fn list(
        &mut self,
        _list_type: &ListType,
        _element_result: Self::Output,
    ) -> Result<Self::Output, Infallible> {
        Ok(HashMap::new())
    }

    fn map(
        &mut self,
        _map_type: &MapType,
        _key_result: Self::Output,
        _value_result: Self::Output,
    ) -> Result<Self::Output, Infallible> {
        Ok(HashMap::new())
    }

    fn primitive(&mut self, _primitive: &PrimitiveType) -> Result<Self::Output, Infallible> {
        Ok(HashMap::new())
    }
}
