//! Schema evolution by name union.
//!
//! The new schema is walked with the current schema as its partner, matched
//! by name at each struct level. Name overlap preserves the current field id
//! and requiredness and recurses into the types; a field with no partner is
//! an entirely new subtree and is appended with fresh ids. The id counter is
//! seeded at the current schema's highest field id and every allocation is
//! observable only in the output.

use crate::ir::{ListType, MapType, NestedField, PrimitiveType, StructType, Type};

use super::error::ValidationError;
use super::promote::promote;
use super::visitor::{
    visit_schema_with_partner, PartnerAccessor, SchemaWithPartnerVisitor,
};
use super::Schema;

pub(crate) fn union_by_name(
    existing: &Schema,
    new_schema: &Schema,
    case_sensitive: bool,
) -> Result<Schema, ValidationError> {
    let accessor = IdByNameAccessor { existing, case_sensitive };
    let mut visitor = UnionByName {
        existing,
        next_field_id: existing.highest_field_id(),
        field_names: Vec::new(),
        case_sensitive,
    };
    let result = visit_schema_with_partner(new_schema, Partner::Root, &mut visitor, &accessor)?;

    let fields = match result {
        Some(Type::Struct(struct_type)) => struct_type.into_fields(),
        _ => unreachable!("the root always has a partner and is always a struct"),
    };
    Schema::with_identifier_fields(
        existing.schema_id(),
        fields,
        existing.identifier_field_ids().iter().copied(),
    )
    .map_err(ValidationError::from)
}

/// A position in the existing schema: the root struct, or a field id
/// (including the synthetic list element and map key/value ids).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Partner {
    Root,
    Field(i32),
}

fn partner_type(existing: &Schema, partner: Partner) -> Option<&Type> {
    match partner {
        Partner::Root => None,
        Partner::Field(field_id) => existing.field_by_id(field_id).map(|field| &field.field_type),
    }
}

fn partner_struct(existing: &Schema, partner: Partner) -> Option<&StructType> {
    match partner {
        Partner::Root => Some(existing.as_struct()),
        Partner::Field(_) => match partner_type(existing, partner) {
            Some(Type::Struct(struct_type)) => Some(struct_type),
            _ => None,
        },
    }
}

/// Resolves partners for the visited (new) schema by name within the
/// existing schema's matching struct level.
struct IdByNameAccessor<'a> {
    existing: &'a Schema,
    case_sensitive: bool,
}

impl PartnerAccessor<Partner> for IdByNameAccessor<'_> {
    fn field_partner(&self, struct_partner: &Partner, field: &NestedField) -> Option<Partner> {
        let struct_type = partner_struct(self.existing, *struct_partner)?;
        let existing_field = if self.case_sensitive {
            struct_type.field_by_name(&field.name)
        } else {
            struct_type.field_by_name_case_insensitive(&field.name)
        }?;
        Some(Partner::Field(existing_field.field_id))
    }

    fn list_element_partner(&self, list_partner: &Partner) -> Option<Partner> {
        match partner_type(self.existing, *list_partner)? {
            Type::List(list_type) => Some(Partner::Field(list_type.element_id)),
            _ => None,
        }
    }

    fn map_key_partner(&self, map_partner: &Partner) -> Option<Partner> {
        match partner_type(self.existing, *map_partner)? {
            Type::Map(map_type) => Some(Partner::Field(map_type.key_id)),
            _ => None,
        }
    }

    fn map_value_partner(&self, map_partner: &Partner) -> Option<Partner> {
        match partner_type(self.existing, *map_partner)? {
            Type::Map(map_type) => Some(Partner::Field(map_type.value_id)),
            _ => None,
        }
    }
}

struct UnionByName<'a> {
    existing: &'a Schema,
    next_field_id: i32,
    field_names: Vec<String>,
    case_sensitive: bool,
}

impl UnionByName<'_> {
    fn assign_fresh_field_id(&mut self) -> i32 {
        self.next_field_id += 1;
        self.next_field_id
    }

    /// Reifies an entirely new field with fresh ids: the field id first, then
    /// its subtree with struct levels before their children and map key and
    /// value ids together.
    fn reassign_field(&mut self, field: &NestedField) -> NestedField {
        let field_id = self.assign_fresh_field_id();
        let field_type = self.reassign_type(&field.field_type);
        NestedField { field_id, field_type, ..field.clone() }
    }

    fn reassign_type(&mut self, ty: &Type) -> Type {
        match ty {
            Type::Primitive(primitive) => Type::Primitive(primitive.clone()),
            Type::Struct(struct_type) => {
                let field_ids: Vec<i32> = struct_type
                    .fields()
                    .iter()
                    .map(|_| self.assign_fresh_field_id())
                    .collect();
                let fields = struct_type
                    .fields()
                    .iter()
                    .zip(field_ids)
                    .map(|(field, field_id)| NestedField {
                        field_id,
                        field_type: self.reassign_type(&field.field_type),
                        ..field.clone()
                    })
                    .collect();
                Type::Struct(StructType::new(fields))
            }
            Type::List(list_type) => {
                let element_id = self.assign_fresh_field_id();
                Type::List(ListType::new(
                    element_id,
                    self.reassign_type(&list_type.element_type),
                    list_type.element_required,
                ))
            }
            Type::Map(map_type) => {
                let key_id = self.assign_fresh_field_id();
                let value_id = self.assign_fresh_field_id();
                let key_type = self.reassign_type(&map_type.key_type);
                let value_type = self.reassign_type(&map_type.value_type);
                Type::Map(MapType::new(
                    key_id,
                    key_type,
                    value_id,
                    value_type,
                    map_type.value_required,
                ))
            }
        }
    }

    fn path(&self) -> String {
        self.field_names.join(".")
    }
}

impl SchemaWithPartnerVisitor<Partner> for UnionByName<'_> {
    type Output = Option<Type>;
    type Error = ValidationError;

    fn before_field(&mut self, field: &NestedField) {
        self.field_names.push(field.name.clone());
    }

    fn after_field(&mut self, _field: &NestedField) {
        self.field_names.pop();
    }

    fn schema(
        &mut self,
        _schema: &Schema,
        _partner: Option<&Partner>,
        struct_result: Option<Type>,
    ) -> Result<Option<Type>, ValidationError> {
        Ok(struct_result)
    }

    fn r#struct(
        &mut self,
        struct_type: &StructType,
        partner: Option<&Partner>,
        field_results: Vec<Option<Type>>,
    ) -> Result<Option<Type>, ValidationError> {
        let Some(&partner) = partner else {
            return Ok(None);
        };
        let Some(existing_struct) = partner_struct(self.existing, partner) else {
            let current = partner_type(self.existing, partner)
                .cloned()
                .unwrap_or_else(|| Type::Struct(StructType::default()));
            return Err(ValidationError::IncompatibleColumnType {
                path: self.path(),
                current,
                requested: Type::Struct(struct_type.clone()),
            });
        };

        let mut evolved: Vec<NestedField> = existing_struct.fields().to_vec();
        let mut appended: Vec<NestedField> = Vec::new();
        for (field, result) in struct_type.fields().iter().zip(field_results) {
            let position = evolved.iter().position(|existing_field| {
                if self.case_sensitive {
                    existing_field.name == field.name
                } else {
                    existing_field.name.to_lowercase() == field.name.to_lowercase()
                }
            });
            match position {
                Some(position) => {
                    if let Some(evolved_type) = result {
                        if evolved[position].field_type != evolved_type {
                            evolved[position].field_type = evolved_type;
                        }
                    }
                }
                None => appended.push(self.reassign_field(field)),
            }
        }
        evolved.extend(appended);
        Ok(Some(Type::Struct(StructType::new(evolved))))
    }

    fn field(
        &mut self,
        _field: &NestedField,
        partner: Option<&Partner>,
        field_result: Option<Type>,
    ) -> Result<Option<Type>, ValidationError> {
        match partner {
            None => Ok(None),
            Some(_) => Ok(field_result),
        }
    }

    fn list(
        &mut self,
        list_type: &ListType,
        partner: Option<&Partner>,
        element_result: Option<Type>,
    ) -> Result<Option<Type>, ValidationError> {
        let Some(&partner) = partner else {
            return Ok(None);
        };
        let Some(current) = partner_type(self.existing, partner) else {
            return Ok(None);
        };
        let Type::List(existing_list) = current else {
            return Err(ValidationError::IncompatibleColumnType {
                path: self.path(),
                current: current.clone(),
                requested: Type::List(list_type.clone()),
            });
        };
        match element_result {
            Some(element) => Ok(Some(Type::List(ListType::new(
                existing_list.element_id,
                element,
                existing_list.element_required,
            )))),
            None => Ok(Some(Type::List(existing_list.clone()))),
        }
    }

    fn map(
        &mut self,
        map_type: &MapType,
        partner: Option<&Partner>,
        key_result: Option<Type>,
        value_result: Option<Type>,
    ) -> Result<Option<Type>, ValidationError> {
        let Some(&partner) = partner else {
            return Ok(None);
        };
        let Some(current) = partner_type(self.existing, partner) else {
            return Ok(None);
        };
        let Type::Map(existing_map) = current else {
            return Err(ValidationError::IncompatibleColumnType {
                path: self.path(),
                current: current.clone(),
                requested: Type::Map(map_type.clone()),
            });
        };
        match (key_result, value_result) {
            (Some(key), Some(value)) => Ok(Some(Type::Map(MapType::new(
                existing_map.key_id,
                key,
                existing_map.value_id,
                value,
                existing_map.value_required,
            )))),
            _ => Ok(Some(Type::Map(existing_map.clone()))),
        }
    }

    fn primitive(
        &mut self,
        primitive: &PrimitiveType,
        partner: Option<&Partner>,
    ) -> Result<Option<Type>, ValidationError> {
        let Some(&partner) = partner else {
            return Ok(None);
        };
        let Some(current) = partner_type(self.existing, partner) else {
            return Ok(None);
        };
        if !current.is_primitive() {
            return Err(ValidationError::NotAPrimitive(current.clone()));
        }

        let requested = Type::Primitive(primitive.clone());
        if *current == requested {
            return Ok(Some(requested));
        }
        if promote(current, &requested).is_ok() {
            return Ok(Some(requested));
        }
        // The new side is narrower along a promotion edge: keep the wider
        // current type rather than downgrading.
        if promote(&requested, current).is_ok() {
            return Ok(Some(current.clone()));
        }
        Err(ValidationError::IncompatibleColumnType {
            path: self.path(),
            current: current.clone(),
            requested,
        })
    }
}
