use serde::{Deserialize, Serialize};

use crate::ir::Type;
use crate::util::DisplayVec;

/// Construction-time invariant violations: duplicate names within a struct
/// level, or identifier fields that break the identifier rules.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, thiserror::Error)]
pub enum InvalidSchemaError {
    #[error("Multiple schema errors: {0}")]
    MultipleErrors(DisplayVec<InvalidSchemaError>),

    #[error("Invalid schema, multiple fields for name {name}: {first_field_id} and {second_field_id}")]
    DuplicateFieldName { name: String, first_field_id: i32, second_field_id: i32 },

    #[error("Could not find field with id: {0}")]
    MissingIdentifierField(i32),

    #[error("Identifier field {0} invalid: not a primitive type field")]
    IdentifierFieldNotPrimitive(i32),

    #[error("Identifier field {0} invalid: not a required field")]
    IdentifierFieldNotRequired(i32),

    #[error("Identifier field {0} invalid: must not be float or double field")]
    IdentifierFieldFloatingPoint(i32),

    #[error("Cannot add field {name} as an identifier field: must not be nested in {ancestor}")]
    IdentifierFieldInCollection { name: String, ancestor: String },

    #[error(
        "Cannot add field {name} as an identifier field: \
        must not be nested in an optional field {ancestor}"
    )]
    IdentifierFieldInOptionalStruct { name: String, ancestor: String },
}

impl From<Vec<InvalidSchemaError>> for InvalidSchemaError {
    fn from(v: Vec<InvalidSchemaError>) -> Self {
        assert!(!v.is_empty());
        if v.len() == 1 {
            v.into_iter().next().expect("non-empty vec")
        } else {
            Self::MultipleErrors(DisplayVec(v))
        }
    }
}

/// Lookup failures and impossible type promotions.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, thiserror::Error)]
pub enum ResolveError {
    #[error("Could not find field with id: {0}")]
    FieldIdNotFound(i32),

    #[error("Could not find field with name {name} (case sensitive: {case_sensitive})")]
    FieldNameNotFound { name: String, case_sensitive: bool },

    #[error("Cannot promote {from} to {to}")]
    CannotPromote { from: Type, to: Type },
}

/// Failures while narrowing a schema to a set of columns.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, thiserror::Error)]
pub enum ProjectError {
    #[error("Could not find column: '{0}'")]
    ColumnNotFound(String),

    #[error(
        "Cannot explicitly project List or Map types, \
        {field_id}:{name} of type {field_type} was selected"
    )]
    CannotProjectContainerField { field_id: i32, name: String, field_type: Type },

    #[error("Cannot explicitly project List or Map types, {id} of type {field_type} was selected")]
    CannotProjectContainerElement { id: i32, field_type: Type },

    #[error(transparent)]
    InvalidSchema(#[from] InvalidSchemaError),
}

/// Failures while lowering a foreign schema into the core type model.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, thiserror::Error)]
pub enum ConversionError {
    #[error("Unsupported Arrow data type: {0}")]
    UnsupportedArrowType(String),

    #[error(transparent)]
    InvalidSchema(#[from] InvalidSchemaError),
}

/// Evolution-time incompatibilities. Evolution is all-or-nothing: the first
/// incompatibility, in declaration order, wins.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, thiserror::Error)]
pub enum ValidationError {
    #[error("Cannot change column type: {path}: {current} -> {requested}")]
    IncompatibleColumnType { path: String, current: Type, requested: Type },

    #[error("Cannot change column type: {0} is not a primitive")]
    NotAPrimitive(Type),

    #[error(transparent)]
    InvalidSchema(#[from] InvalidSchemaError),

    #[error(transparent)]
    Conversion(#[from] ConversionError),
}
