//! Strong-typing validation layer
//!
//! Shared by every data type in the crate:
//!
//! - [`typing`]: dynamic type checks against declared type expressions, plus
//!   the semantic checks (non-empty, ranges, uniqueness, limits)
//! - [`timezone`]: the UTC policy for every datetime field
//! - [`value`]: the dynamic value model used at the host boundary

pub mod timezone;
pub mod typing;
pub mod value;

pub use timezone::{require_optional_utc, require_utc, TzDateTime};
pub use typing::{
    field_path, require_at_most, require_in_range, require_non_empty, require_optional_non_empty,
    require_positive, require_unique, type_mismatch, validate_type, TypeCheck,
};
pub use value::{TypeExpr, Value};
