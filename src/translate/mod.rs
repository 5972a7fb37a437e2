//! Dialect-specific catalog values to portable forms.

pub mod default_value;
pub mod type_mapping;

pub use default_value::{normalize, PortableDefault};
pub use type_mapping::{translate, IntWidth, PortableType, Precision, TypeKind};
