use serde::{Deserialize, Serialize};

/// A representation of a declared type
#[derive(Serialize, Deserialize, Eq, PartialEq, Clone, Debug)]
#[serde(rename_all = "snake_case")]
pub enum Type {
    /// 32-bit integer
    Int,
    /// Floating point
    Double,
    /// Reference to an object of the named class
    Object(String),
    /// Array of elements
    Array(Box<Type>),
}
