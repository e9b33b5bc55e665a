use crate::ir::{PrimitiveType, Type};

use super::error::ResolveError;

/// Widens a file type to a requested read type, when that widening is safe.
///
/// The allowed promotions are exactly: identity, `int -> long`,
/// `float -> double`, `string <-> binary`, `decimal(P1, S) -> decimal(P2, S)`
/// with `P1 <= P2`, and `fixed[16] -> uuid`. Everything else is refused.
pub fn promote(file_type: &Type, read_type: &Type) -> Result<Type, ResolveError> {
    if file_type == read_type {
        return Ok(read_type.clone());
    }

    if let (Type::Primitive(file), Type::Primitive(read)) = (file_type, read_type) {
        let allowed = matches!(
            (file, read),
            (PrimitiveType::Int, PrimitiveType::Long)
                | (PrimitiveType::Float, PrimitiveType::Double)
                | (PrimitiveType::String, PrimitiveType::Binary)
                | (PrimitiveType::Binary, PrimitiveType::String)
                | (PrimitiveType::Fixed(16), PrimitiveType::Uuid)
        ) || matches!(
            (file, read),
            (
                PrimitiveType::Decimal { precision: file_precision, scale: file_scale },
                PrimitiveType::Decimal { precision: read_precision, scale: read_scale },
            ) if file_precision <= read_precision && file_scale == read_scale
        );
        if allowed {
            return Ok(read_type.clone());
        }
    }

    Err(ResolveError::CannotPromote { from: file_type.clone(), to: read_type.clone() })
}
