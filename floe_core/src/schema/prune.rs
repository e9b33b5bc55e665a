use std::collections::HashSet;

use crate::ir::{ListType, MapType, NestedField, PrimitiveType, StructType, Type};

use super::error::ProjectError;
use super::visitor::{visit_schema, SchemaVisitor};
use super::Schema;

/// Projects a schema down to the smallest sub-schema in which every selected
/// id is still reachable, adding the ancestors required to reach them.
///
/// Lists and maps cannot be projected by their own id: they are only
/// retained because a descendant was selected, and a map always keeps its
/// key subtree intact. With `select_full_types`, a selected field keeps its
/// entire subtree instead of being pruned recursively.
pub fn prune_columns(
    schema: &Schema,
    selected: &HashSet<i32>,
    select_full_types: bool,
) -> Result<Schema, ProjectError> {
    let mut visitor = PruneColumns { selected, select_full_types };
    let result = visit_schema(schema, &mut visitor)?;
    let fields = match result {
        Some(Type::Struct(struct_type)) => struct_type.into_fields(),
        _ => Vec::new(),
    };
    let identifier_field_ids =
        schema.identifier_field_ids().iter().copied().filter(|id| selected.contains(id));
    Schema::with_identifier_fields(schema.schema_id(), fields, identifier_field_ids)
        .map_err(ProjectError::from)
}

struct PruneColumns<'a> {
    selected: &'a HashSet<i32>,
    select_full_types: bool,
}

impl PruneColumns<'_> {
    fn project_selected_struct(projected: Option<Type>) -> StructType {
        match projected {
            Some(Type::Struct(struct_type)) => struct_type,
            None => StructType::default(),
            Some(_) => unreachable!("a struct field's projection is always a struct"),
        }
    }

    fn project_list(list_type: &ListType, element: Type) -> ListType {
        if *list_type.element_type == element {
            list_type.clone()
        } else {
            ListType::new(list_type.element_id, element, list_type.element_required)
        }
    }

    fn project_map(map_type: &MapType, value: Type) -> MapType {
        if *map_type.value_type == value {
            map_type.clone()
        } else {
            MapType::new(
                map_type.key_id,
                (*map_type.key_type).clone(),
                map_type.value_id,
                value,
                map_type.value_required,
            )
        }
    }
}

impl SchemaVisitor for PruneColumns<'_> {
    type Output = Option<Type>;
    type Error = ProjectError;

    fn schema(
        &mut self,
        _schema: &Schema,
        struct_result: Option<Type>,
    ) -> Result<Option<Type>, ProjectError> {
        Ok(struct_result)
    }

    fn r#struct(
        &mut self,
        struct_type: &StructType,
        field_results: Vec<Option<Type>>,
    ) -> Result<Option<Type>, ProjectError> {
        let fields = struct_type.fields();
        let mut selected_fields = Vec::new();
        let mut same_types = true;
        for (field, projected) in fields.iter().zip(field_results) {
            if let Some(projected_type) = projected {
                if field.field_type == projected_type {
                    selected_fields.push(field.clone());
                } else {
                    same_types = false;
                    selected_fields.push(NestedField {
                        field_type: projected_type,
                        ..field.clone()
                    });
                }
            }
        }

        if selected_fields.is_empty() {
            Ok(None)
        } else if selected_fields.len() == fields.len() && same_types {
            Ok(Some(Type::Struct(struct_type.clone())))
        } else {
            Ok(Some(Type::Struct(StructType::new(selected_fields))))
        }
    }

    fn field(
        &mut self,
        field: &NestedField,
        field_result: Option<Type>,
    ) -> Result<Option<Type>, ProjectError> {
        if self.selected.contains(&field.field_id) {
            if self.select_full_types {
                Ok(Some(field.field_type.clone()))
            } else if field.field_type.is_struct() {
                Ok(Some(Type::Struct(Self::project_selected_struct(field_result))))
            } else if field.field_type.is_primitive() {
                Ok(Some(field.field_type.clone()))
            } else {
                Err(ProjectError::CannotProjectContainerField {
                    field_id: field.field_id,
                    name: field.name.clone(),
                    field_type: field.field_type.clone(),
                })
            }
        } else {
            Ok(field_result)
        }
    }

    fn list(
        &mut self,
        list_type: &ListType,
        element_result: Option<Type>,
    ) -> Result<Option<Type>, ProjectError> {
        if self.selected.contains(&list_type.element_id) {
            if self.select_full_types {
                Ok(Some(Type::List(list_type.clone())))
            } else if list_type.element_type.is_struct() {
                let projected = Self::project_selected_struct(element_result);
                Ok(Some(Type::List(Self::project_list(list_type, Type::Struct(projected)))))
            } else if list_type.element_type.is_primitive() {
                Ok(Some(Type::List(list_type.clone())))
            } else {
                Err(ProjectError::CannotProjectContainerElement {
                    id: list_type.element_id,
                    field_type: (*list_type.element_type).clone(),
                })
            }
        } else if let Some(element) = element_result {
            Ok(Some(Type::List(Self::project_list(list_type, element))))
        } else {
            Ok(None)
        }
    }

    fn map(
        &mut self,
        map_type: &MapType,
        _key_result: Option<Type>,
        value_result: Option<Type>,
    ) -> Result<Option<Type>, ProjectError> {
        if self.selected.contains(&map_type.value_id) {
            if self.select_full_types {
                Ok(Some(Type::Map(map_type.clone())))
            } else if map_type.value_type.is_struct() {
                let projected = Self::project_selected_struct(value_result);
                Ok(Some(Type::Map(Self::project_map(map_type, Type::Struct(projected)))))
            } else if map_type.value_type.is_primitive() {
                Ok(Some(Type::Map(map_type.clone())))
            } else {
                Err(ProjectError::CannotProjectContainerElement {
                    id: map_type.value_id,
                    field_type: (*map_type.value_type).clone(),
                })
            }
        } else if let Some(value) = value_result {
            Ok(Some(Type::Map(Self::project_map(map_type, value))))
        } else if self.selected.contains(&map_type.key_id) {
            // A partial map is meaningless: keeping the key keeps the value too.
            Ok(Some(Type::Map(map_type.clone())))
        } else {
            Ok(None)
        }
    }

    fn primitive(&mut self, _primitive: &PrimitiveType) -> Result<Option<Type>, ProjectError> {
        Ok(None)
    }
}
