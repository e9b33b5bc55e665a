use core::fmt::{self, Formatter};
use std::fmt::Display;

use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::ser::SerializeStruct;
use serde::{de::Visitor, Deserialize, Deserializer, Serialize, Serializer};

use super::value::Literal;

static DECIMAL_TYPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^decimal\((\d+),\s*(\d+)\)$").expect("valid regex"));
static FIXED_TYPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^fixed\[(\d+)\]$").expect("valid regex"));

/// A primitive column type.
///
/// Primitives serialize to their display form: `"int"`, `"decimal(10, 2)"`,
/// `"fixed[16]"` and so on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrimitiveType {
    Boolean,
    /// 32-bit signed integer.
    Int,
    /// 64-bit signed integer.
    Long,
    Float,
    Double,
    Decimal {
        precision: u32,
        scale: u32,
    },
    Date,
    /// Time of day, microsecond precision.
    Time,
    /// Timestamp without timezone, microsecond precision.
    Timestamp,
    /// Timestamp in UTC, microsecond precision.
    Timestamptz,
    String,
    Uuid,
    Binary,
    /// Fixed-length byte array of the given length.
    Fixed(u64),
}

impl PrimitiveType {
    /// Parses the display form of a primitive type.
    /// Returns `None` if the string is not a valid primitive type.
    ///
    /// # Example
    /// ```
    /// use floe_core::ir::PrimitiveType;
    ///
    /// let ty = PrimitiveType::parse("decimal(10, 2)").unwrap();
    /// assert_eq!(ty, PrimitiveType::Decimal { precision: 10, scale: 2 });
    /// assert!(PrimitiveType::parse("struct").is_none());
    /// ```
    pub fn parse(value: &str) -> Option<PrimitiveType> {
        let primitive = match value {
            "boolean" => Self::Boolean,
            "int" => Self::Int,
            "long" => Self::Long,
            "float" => Self::Float,
            "double" => Self::Double,
            "date" => Self::Date,
            "time" => Self::Time,
            "timestamp" => Self::Timestamp,
            "timestamptz" => Self::Timestamptz,
            "string" => Self::String,
            "uuid" => Self::Uuid,
            "binary" => Self::Binary,
            other => {
                if let Some(captures) = DECIMAL_TYPE.captures(other) {
                    Self::Decimal {
                        precision: captures[1].parse().ok()?,
                        scale: captures[2].parse().ok()?,
                    }
                } else if let Some(captures) = FIXED_TYPE.captures(other) {
                    Self::Fixed(captures[1].parse().ok()?)
                } else {
                    return None;
                }
            }
        };
        Some(primitive)
    }

    pub fn is_floating_point(&self) -> bool {
        matches!(self, Self::Float | Self::Double)
    }
}

impl Display for PrimitiveType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean => write!(f, "boolean"),
            Self::Int => write!(f, "int"),
            Self::Long => write!(f, "long"),
            Self::Float => write!(f, "float"),
            Self::Double => write!(f, "double"),
            Self::Decimal { precision, scale } => write!(f, "decimal({precision}, {scale})"),
            Self::Date => write!(f, "date"),
            Self::Time => write!(f, "time"),
            Self::Timestamp => write!(f, "timestamp"),
            Self::Timestamptz => write!(f, "timestamptz"),
            Self::String => write!(f, "string"),
            Self::Uuid => write!(f, "uuid"),
            Self::Binary => write!(f, "binary"),
            Self::Fixed(length) => write!(f, "fixed[{length}]"),
        }
    }
}

impl Serialize for PrimitiveType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PrimitiveType {
    fn deserialize<D>(deserializer: D) -> Result<PrimitiveType, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct PrimitiveTypeDeserializer;

        impl Visitor<'_> for PrimitiveTypeDeserializer {
            type Value = PrimitiveType;

            fn expecting(&self, formatter: &mut Formatter) -> fmt::Result {
                formatter.write_str("primitive type")
            }

            fn visit_str<E>(self, s: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                PrimitiveType::parse(s)
                    .ok_or_else(|| serde::de::Error::custom(format!("Cannot visit non-type: {s}")))
            }
        }

        deserializer.deserialize_str(PrimitiveTypeDeserializer)
    }
}

/// A column type: a primitive, or a nested struct, list or map.
///
/// Equality is structural, including the element/key/value ids and the
/// requiredness flags carried by nested types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Primitive(PrimitiveType),
    Struct(StructType),
    List(ListType),
    Map(MapType),
}

impl Type {
    pub fn is_primitive(&self) -> bool {
        matches!(self, Self::Primitive(_))
    }

    pub fn is_struct(&self) -> bool {
        matches!(self, Self::Struct(_))
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    pub fn is_map(&self) -> bool {
        matches!(self, Self::Map(_))
    }

    pub fn is_nested(&self) -> bool {
        !self.is_primitive()
    }

    pub fn is_floating_point(&self) -> bool {
        matches!(self, Self::Primitive(p) if p.is_floating_point())
    }

    pub fn as_struct_type(&self) -> Option<&StructType> {
        match self {
            Self::Struct(struct_type) => Some(struct_type),
            _ => None,
        }
    }

    pub(crate) fn try_from_json(value: &serde_json::Value) -> Result<Type, String> {
        match value {
            serde_json::Value::String(s) => PrimitiveType::parse(s)
                .map(Type::Primitive)
                .ok_or_else(|| format!("Cannot visit non-type: {s}")),
            serde_json::Value::Object(object) => {
                let tag = object.get("type").and_then(serde_json::Value::as_str);
                match tag {
                    Some("struct") => {
                        let fields = object
                            .get("fields")
                            .cloned()
                            .ok_or_else(|| "struct type is missing its fields".to_string())?;
                        let fields: Vec<NestedField> =
                            serde_json::from_value(fields).map_err(|e| e.to_string())?;
                        Ok(Type::Struct(StructType::new(fields)))
                    }
                    Some("list") => {
                        let element_id = get_i32(object, "element-id")?;
                        let element = object
                            .get("element")
                            .ok_or_else(|| "list type is missing its element".to_string())?;
                        let element_required = get_bool_or(object, "element-required", true)?;
                        Ok(Type::List(ListType::new(
                            element_id,
                            Type::try_from_json(element)?,
                            element_required,
                        )))
                    }
                    Some("map") => {
                        let key_id = get_i32(object, "key-id")?;
                        let key = object
                            .get("key")
                            .ok_or_else(|| "map type is missing its key".to_string())?;
                        let value_id = get_i32(object, "value-id")?;
                        let map_value = object
                            .get("value")
                            .ok_or_else(|| "map type is missing its value".to_string())?;
                        let value_required = get_bool_or(object, "value-required", true)?;
                        Ok(Type::Map(MapType::new(
                            key_id,
                            Type::try_from_json(key)?,
                            value_id,
                            Type::try_from_json(map_value)?,
                            value_required,
                        )))
                    }
                    _ => Err(format!("Cannot visit non-type: {value}")),
                }
            }
            other => Err(format!("Cannot visit non-type: {other}")),
        }
    }
}

fn get_i32(object: &serde_json::Map<String, serde_json::Value>, key: &str) -> Result<i32, String> {
    object
        .get(key)
        .and_then(serde_json::Value::as_i64)
        .and_then(|id| i32::try_from(id).ok())
        .ok_or_else(|| format!("missing or invalid {key}"))
}

fn get_bool_or(
    object: &serde_json::Map<String, serde_json::Value>,
    key: &str,
    default: bool,
) -> Result<bool, String> {
    match object.get(key) {
        None => Ok(default),
        Some(value) => value.as_bool().ok_or_else(|| format!("invalid {key}")),
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(primitive) => write!(f, "{primitive}"),
            Self::Struct(struct_type) => write!(f, "{struct_type}"),
            Self::List(list_type) => write!(f, "{list_type}"),
            Self::Map(map_type) => write!(f, "{map_type}"),
        }
    }
}

impl Serialize for Type {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Primitive(primitive) => primitive.serialize(serializer),
            Self::Struct(struct_type) => struct_type.serialize(serializer),
            Self::List(list_type) => list_type.serialize(serializer),
            Self::Map(map_type) => map_type.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Type {
    fn deserialize<D>(deserializer: D) -> Result<Type, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        Type::try_from_json(&value).map_err(serde::de::Error::custom)
    }
}

impl From<PrimitiveType> for Type {
    fn from(primitive: PrimitiveType) -> Self {
        Self::Primitive(primitive)
    }
}

impl From<StructType> for Type {
    fn from(struct_type: StructType) -> Self {
        Self::Struct(struct_type)
    }
}

impl From<ListType> for Type {
    fn from(list_type: ListType) -> Self {
        Self::List(list_type)
    }
}

impl From<MapType> for Type {
    fn from(map_type: MapType) -> Self {
        Self::Map(map_type)
    }
}

/// An ordered collection of named, id-addressed fields.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StructType {
    fields: Vec<NestedField>,
}

impl StructType {
    pub fn new(fields: Vec<NestedField>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[NestedField] {
        &self.fields
    }

    pub fn into_fields(self) -> Vec<NestedField> {
        self.fields
    }

    pub fn field_by_name(&self, name: &str) -> Option<&NestedField> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn field_by_name_case_insensitive(&self, name: &str) -> Option<&NestedField> {
        let lowered = name.to_lowercase();
        self.fields.iter().find(|field| field.name.to_lowercase() == lowered)
    }
}

impl Display for StructType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "struct<{}>", self.fields.iter().join(", "))
    }
}

impl Serialize for StructType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("StructType", 2)?;
        state.serialize_field("type", "struct")?;
        state.serialize_field("fields", &self.fields)?;
        state.end()
    }
}

/// A list type: an element id, an element type, and whether elements may be null.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListType {
    pub element_id: i32,
    pub element_type: Box<Type>,
    pub element_required: bool,
}

impl ListType {
    pub fn new(element_id: i32, element_type: Type, element_required: bool) -> Self {
        Self { element_id, element_type: Box::new(element_type), element_required }
    }

    /// The synthetic field representing this list's element, named `element`.
    pub fn element_field(&self) -> NestedField {
        NestedField::new(
            self.element_id,
            "element",
            (*self.element_type).clone(),
            self.element_required,
        )
    }
}

impl Display for ListType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "list<{}>", self.element_type)
    }
}

impl Serialize for ListType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("ListType", 4)?;
        state.serialize_field("type", "list")?;
        state.serialize_field("element-id", &self.element_id)?;
        state.serialize_field("element", &self.element_type)?;
        state.serialize_field("element-required", &self.element_required)?;
        state.end()
    }
}

/// A map type. Keys are always required; values may be optional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapType {
    pub key_id: i32,
    pub key_type: Box<Type>,
    pub value_id: i32,
    pub value_type: Box<Type>,
    pub value_required: bool,
}

impl MapType {
    pub fn new(
        key_id: i32,
        key_type: Type,
        value_id: i32,
        value_type: Type,
        value_required: bool,
    ) -> Self {
        Self {
            key_id,
            key_type: Box::new(key_type),
            value_id,
            value_type: Box::new(value_type),
            value_required,
        }
    }

    /// The synthetic field representing this map's key, named `key`.
    pub fn key_field(&self) -> NestedField {
        NestedField::new(self.key_id, "key", (*self.key_type).clone(), true)
    }

    /// The synthetic field representing this map's value, named `value`.
    pub fn value_field(&self) -> NestedField {
        NestedField::new(self.value_id, "value", (*self.value_type).clone(), self.value_required)
    }
}

impl Display for MapType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "map<{}, {}>", self.key_type, self.value_type)
    }
}

impl Serialize for MapType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("MapType", 6)?;
        state.serialize_field("type", "map")?;
        state.serialize_field("key-id", &self.key_id)?;
        state.serialize_field("key", &self.key_type)?;
        state.serialize_field("value-id", &self.value_id)?;
        state.serialize_field("value", &self.value_type)?;
        state.serialize_field("value-required", &self.value_required)?;
        state.end()
    }
}

/// A named, id-addressed field of a struct.
///
/// The `field_id` is the stable handle for the column: renames and reorders
/// never change it, and schema evolution preserves it on name overlap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NestedField {
    #[serde(rename = "id")]
    pub field_id: i32,
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: Type,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    #[serde(rename = "initial-default", default, skip_serializing_if = "Option::is_none")]
    pub initial_default: Option<Literal>,
    #[serde(rename = "write-default", default, skip_serializing_if = "Option::is_none")]
    pub write_default: Option<Literal>,
}

impl NestedField {
    pub fn new(field_id: i32, name: impl Into<String>, field_type: Type, required: bool) -> Self {
        Self {
            field_id,
            name: name.into(),
            field_type,
            required,
            doc: None,
            initial_default: None,
            write_default: None,
        }
    }

    /// A field whose values may not be null.
    pub fn required(field_id: i32, name: impl Into<String>, field_type: Type) -> Self {
        Self::new(field_id, name, field_type, true)
    }

    /// A field whose values may be null.
    pub fn optional(field_id: i32, name: impl Into<String>, field_type: Type) -> Self {
        Self::new(field_id, name, field_type, false)
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn with_initial_default(mut self, value: impl Into<Literal>) -> Self {
        self.initial_default = Some(value.into());
        self
    }

    pub fn with_write_default(mut self, value: impl Into<Literal>) -> Self {
        self.write_default = Some(value.into());
        self
    }
}

impl Display for NestedField {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let requirement = if self.required { "required" } else { "optional" };
        write!(f, "{}: {}: {} {}", self.field_id, self.name, requirement, self.field_type)?;
        if let Some(doc) = &self.doc {
            write!(f, " ({doc})")?;
        }
        Ok(())
    }
}
