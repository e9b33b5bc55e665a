use serde::{Deserialize, Serialize};

/// A literal value: a field default, or a cell of a row being accessed
/// by position.
///
/// Serialized untagged, so scalar defaults appear as bare JSON values
/// (`42`, `"foo"`, `true`). Struct values serialize positionally, like lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    // Order may matter here! Untagged deserialization attempts each variant
    // in order until the first one that matches. Boolean must come before the
    // numeric variants, and Long before Double so that exact integers are not
    // turned into lossy floats.
    Null,
    Boolean(bool),
    Long(i64),
    Double(f64),
    String(String),
    List(Vec<Literal>),
    Struct(Vec<Literal>),
}

impl PartialEq for Literal {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Boolean(l0), Self::Boolean(r0)) => l0 == r0,
            (Self::Long(l0), Self::Long(r0)) => l0 == r0,
            (Self::Double(l0), Self::Double(r0)) => {
                assert!(l0.is_finite());
                assert!(r0.is_finite());
                l0 == r0
            }
            (Self::String(l0), Self::String(r0)) => l0 == r0,
            (Self::List(l0), Self::List(r0)) => l0 == r0,
            (Self::Struct(l0), Self::Struct(r0)) => l0 == r0,
            _ => core::mem::discriminant(self) == core::mem::discriminant(other),
        }
    }
}

impl Eq for Literal {}

impl From<bool> for Literal {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<&str> for Literal {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for Literal {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

macro_rules! impl_literal_from_int {
    ( $( $Int: ident )+ ) => {
        $(
            impl From<$Int> for Literal {
                fn from(v: $Int) -> Self {
                    Self::Long(v.into())
                }
            }
        )+
    }
}

impl_literal_from_int!(i8 i16 i32 i64);

impl<T: Into<Literal>> From<Option<T>> for Literal {
    fn from(opt: Option<T>) -> Literal {
        match opt {
            Some(inner) => inner.into(),
            None => Literal::Null,
        }
    }
}

/// Indexed access by integer position, the capability that position
/// [`Accessor`](crate::schema::Accessor)s evaluate against.
///
/// Any row shape that can hand out a [`Literal`] for a position qualifies;
/// nested struct cells are themselves [`StructLike`].
pub trait StructLike {
    fn get(&self, pos: usize) -> Option<&Literal>;
}

impl StructLike for [Literal] {
    fn get(&self, pos: usize) -> Option<&Literal> {
        <[Literal]>::get(self, pos)
    }
}

impl StructLike for Vec<Literal> {
    fn get(&self, pos: usize) -> Option<&Literal> {
        self.as_slice().get(pos)
    }
}

impl StructLike for Literal {
    fn get(&self, pos: usize) -> Option<&Literal> {
        match self {
            Literal::Struct(items) => items.as_slice().get(pos),
            _ => None,
        }
    }
}
