//! Generic pre/post-order folds over a schema tree.
//!
//! [`visit_schema`] drives a [`SchemaVisitor`] depth-first through a schema
//! in declared field order: each field's type is visited before the `field`
//! hook fires, each struct's members before its `struct` hook, and the
//! `before_*`/`after_*` callbacks bracket every descent so visitors can keep
//! path or ancestry stacks.
//!
//! [`visit_schema_with_partner`] is the two-tree variant: it walks one schema
//! while a [`PartnerAccessor`] resolves, for every position, the matching
//! position in another tree. A position with no counterpart gets a `None`
//! partner and the walk continues, so visitors can classify additions.

use std::convert::Infallible;

use crate::ir::{ListType, MapType, NestedField, PrimitiveType, StructType, Type};

use super::Schema;

pub trait SchemaVisitor {
    type Output;
    type Error;

    fn before_field(&mut self, _field: &NestedField) {}
    fn after_field(&mut self, _field: &NestedField) {}

    fn before_list_element(&mut self, field: &NestedField) {
        self.before_field(field);
    }
    fn after_list_element(&mut self, field: &NestedField) {
        self.after_field(field);
    }

    fn before_map_key(&mut self, field: &NestedField) {
        self.before_field(field);
    }
    fn after_map_key(&mut self, field: &NestedField) {
        self.after_field(field);
    }

    fn before_map_value(&mut self, field: &NestedField) {
        self.before_field(field);
    }
    fn after_map_value(&mut self, field: &NestedField) {
        self.after_field(field);
    }

    fn schema(
        &mut self,
        schema: &Schema,
        struct_result: Self::Output,
    ) -> Result<Self::Output, Self::Error>;

    fn r#struct(
        &mut self,
        struct_type: &StructType,
        field_results: Vec<Self::Output>,
    ) -> Result<Self::Output, Self::Error>;

    fn field(
        &mut self,
        field: &NestedField,
        field_result: Self::Output,
    ) -> Result<Self::Output, Self::Error>;

    fn list(
        &mut self,
        list_type: &ListType,
        element_result: Self::Output,
    ) -> Result<Self::Output, Self::Error>;

    fn map(
        &mut self,
        map_type: &MapType,
        key_result: Self::Output,
        value_result: Self::Output,
    ) -> Result<Self::Output, Self::Error>;

    fn primitive(&mut self, primitive: &PrimitiveType) -> Result<Self::Output, Self::Error>;
}

pub fn visit_schema<V: SchemaVisitor>(
    schema: &Schema,
    visitor: &mut V,
) -> Result<V::Output, V::Error> {
    let result = visit_struct(schema.as_struct(), visitor)?;
    visitor.schema(schema, result)
}

pub fn visit_struct<V: SchemaVisitor>(
    struct_type: &StructType,
    visitor: &mut V,
) -> Result<V::Output, V::Error> {
    let mut results = Vec::with_capacity(struct_type.fields().len());
    for field in struct_type.fields() {
        visitor.before_field(field);
        let result = visit_type(&field.field_type, visitor);
        visitor.after_field(field);
        results.push(visitor.field(field, result?)?);
    }
    visitor.r#struct(struct_type, results)
}

pub fn visit_type<V: SchemaVisitor>(ty: &Type, visitor: &mut V) -> Result<V::Output, V::Error> {
    match ty {
        Type::Primitive(primitive) => visitor.primitive(primitive),
        Type::Struct(struct_type) => visit_struct(struct_type, visitor),
        Type::List(list_type) => {
            let element_field = list_type.element_field();
            visitor.before_list_element(&element_field);
            let result = visit_type(&list_type.element_type, visitor);
            visitor.after_list_element(&element_field);
            visitor.list(list_type, result?)
        }
        Type::Map(map_type) => {
            let key_field = map_type.key_field();
            visitor.before_map_key(&key_field);
            let key_result = visit_type(&map_type.key_type, visitor);
            visitor.after_map_key(&key_field);
            let key_result = key_result?;

            let value_field = map_type.value_field();
            visitor.before_map_value(&value_field);
            let value_result = visit_type(&map_type.value_type, visitor);
            visitor.after_map_value(&value_field);

            visitor.map(map_type, key_result, value_result?)
        }
    }
}

/// Unwraps the result of a visitor that cannot fail.
pub(crate) fn into_ok<T>(result: Result<T, Infallible>) -> T {
    match result {
        Ok(value) => value,
        Err(never) => match never {},
    }
}

/// Resolves, for each position of the visited tree, the matching position in
/// a partner tree. Returning `None` marks the position as having no partner.
pub trait PartnerAccessor<P> {
    fn field_partner(&self, struct_partner: &P, field: &NestedField) -> Option<P>;
    fn list_element_partner(&self, list_partner: &P) -> Option<P>;
    fn map_key_partner(&self, map_partner: &P) -> Option<P>;
    fn map_value_partner(&self, map_partner: &P) -> Option<P>;
}

pub trait SchemaWithPartnerVisitor<P> {
    type Output;
    type Error;

    fn before_field(&mut self, _field: &NestedField) {}
    fn after_field(&mut self, _field: &NestedField) {}

    fn before_list_element(&mut self, field: &NestedField) {
        self.before_field(field);
    }
    fn after_list_element(&mut self, field: &NestedField) {
        self.after_field(field);
    }

    fn before_map_key(&mut self, field: &NestedField) {
        self.before_field(field);
    }
    fn after_map_key(&mut self, field: &NestedField) {
        self.after_field(field);
    }

    fn before_map_value(&mut self, field: &NestedField) {
        self.before_field(field);
    }
    fn after_map_value(&mut self, field: &NestedField) {
        self.after_field(field);
    }

    fn schema(
        &mut self,
        schema: &Schema,
        partner: Option<&P>,
        struct_result: Self::Output,
    ) -> Result<Self::Output, Self::Error>;

    fn r#struct(
        &mut self,
        struct_type: &StructType,
        partner: Option<&P>,
        field_results: Vec<Self::Output>,
    ) -> Result<Self::Output, Self::Error>;

    fn field(
        &mut self,
        field: &NestedField,
        partner: Option<&P>,
        field_result: Self::Output,
    ) -> Result<Self::Output, Self::Error>;

    fn list(
        &mut self,
        list_type: &ListType,
        partner: Option<&P>,
        element_result: Self::Output,
    ) -> Result<Self::Output, Self::Error>;

    fn map(
        &mut self,
        map_type: &MapType,
        partner: Option<&P>,
        key_result: Self::Output,
        value_result: Self::Output,
    ) -> Result<Self::Output, Self::Error>;

    fn primitive(
        &mut self,
        primitive: &PrimitiveType,
        partner: Option<&P>,
    ) -> Result<Self::Output, Self::Error>;
}

pub fn visit_schema_with_partner<P, V, A>(
    schema: &Schema,
    partner: P,
    visitor: &mut V,
    accessor: &A,
) -> Result<V::Output, V::Error>
where
    V: SchemaWithPartnerVisitor<P>,
    A: PartnerAccessor<P>,
{
    let result = visit_struct_with_partner(schema.as_struct(), Some(&partner), visitor, accessor)?;
    visitor.schema(schema, Some(&partner), result)
}

pub fn visit_struct_with_partner<P, V, A>(
    struct_type: &StructType,
    partner: Option<&P>,
    visitor: &mut V,
    accessor: &A,
) -> Result<V::Output, V::Error>
where
    V: SchemaWithPartnerVisitor<P>,
    A: PartnerAccessor<P>,
{
    let mut results = Vec::with_capacity(struct_type.fields().len());
    for field in struct_type.fields() {
        let field_partner = partner.and_then(|p| accessor.field_partner(p, field));
        visitor.before_field(field);
        let result =
            visit_type_with_partner(&field.field_type, field_partner.as_ref(), visitor, accessor);
        visitor.after_field(field);
        results.push(visitor.field(field, field_partner.as_ref(), result?)?);
    }
    visitor.r#struct(struct_type, partner, results)
}

pub fn visit_type_with_partner<P, V, A>(
    ty: &Type,
    partner: Option<&P>,
    visitor: &mut V,
    accessor: &A,
) -> Result<V::Output, V::Error>
where
    V: SchemaWithPartnerVisitor<P>,
    A: PartnerAccessor<P>,
{
    match ty {
        Type::Primitive(primitive) => visitor.primitive(primitive, partner),
        Type::Struct(struct_type) => {
            visit_struct_with_partner(struct_type, partner, visitor, accessor)
        }
        Type::List(list_type) => {
            let element_partner = partner.and_then(|p| accessor.list_element_partner(p));
            let element_field = list_type.element_field();
            visitor.before_list_element(&element_field);
            let result = visit_type_with_partner(
                &list_type.element_type,
                element_partner.as_ref(),
                visitor,
                accessor,
            );
            visitor.after_list_element(&element_field);
            visitor.list(list_type, partner, result?)
        }
        Type::Map(map_type) => {
            let key_partner = partner.and_then(|p| accessor.map_key_partner(p));
            let key_field = map_type.key_field();
            visitor.before_map_key(&key_field);
            let key_result =
                visit_type_with_partner(&map_type.key_type, key_partner.as_ref(), visitor, accessor);
            visitor.after_map_key(&key_field);
            let key_result = key_result?;

            let value_partner = partner.and_then(|p| accessor.map_value_partner(p));
            let value_field = map_type.value_field();
            visitor.before_map_value(&value_field);
            let value_result = visit_type_with_partner(
                &map_type.value_type,
                value_partner.as_ref(),
                visitor,
                accessor,
            );
            visitor.after_map_value(&value_field);

            visitor.map(map_type, partner, key_result, value_result?)
        }
    }
}
