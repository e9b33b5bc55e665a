#![forbid(unsafe_code)]

//! The schema core of the Floe table library.
//!
//! Schemas are immutable, id-addressed trees of struct, list, map and
//! primitive types. This crate holds the in-memory representation together
//! with the algorithms that index, project, traverse and evolve it:
//!
//! - [`ir`] — the type model ([`ir::Type`], [`ir::NestedField`]) and the
//!   [`ir::Literal`] values that position accessors resolve against rows.
//! - [`schema`] — the [`schema::Schema`] value itself, its visitors and
//!   indexes, column projection ([`schema::prune_columns`]), the type
//!   promotion lattice ([`schema::promote`]), name-based schema evolution
//!   ([`schema::Schema::union_by_name`]) and name sanitization.
//!
//! Everything here is a pure function over immutable values: no I/O, no
//! retries, no logging. Errors carry the full diagnostic content.

pub mod ir;
pub mod schema;
mod util;

#[cfg(test)]
pub(crate) mod test_fixtures;
