//! Serialized form of a class, as emitted by the front end.
//!
//! The types here mirror the JSON layout one-to-one and carry no semantic
//! checks; see `bridge` for the validated representation.

pub mod class;
pub mod instruction;
pub mod typing;
pub mod value;
