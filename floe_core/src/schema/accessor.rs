use serde::{Deserialize, Serialize};

use crate::ir::{Literal, StructLike};

/// A lazily evaluated coordinate into a struct-like row.
///
/// Each link holds a position within one struct level; `inner` descends into
/// the struct cell at that position. Only fields whose ancestors are all
/// structs receive accessors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Accessor {
    pub position: usize,
    pub inner: Option<Box<Accessor>>,
}

impl Accessor {
    pub fn new(position: usize) -> Self {
        Self { position, inner: None }
    }

    pub fn nested(position: usize, inner: Accessor) -> Self {
        Self { position, inner: Some(Box::new(inner)) }
    }

    /// Resolves this accessor against a row, descending through nested
    /// struct cells. Returns `None` when a position is absent or a non-leaf
    /// cell is not a struct.
    pub fn get<'a, S: StructLike + ?Sized>(&self, container: &'a S) -> Option<&'a Literal> {
        let mut value = container.get(self.position)?;
        let mut inner = &self.inner;
        while let Some(accessor) = inner {
            value = StructLike::get(value, accessor.position)?;
            inner = &accessor.inner;
        }
        Some(value)
    }
}
