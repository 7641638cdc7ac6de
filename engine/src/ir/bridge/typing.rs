use std::fmt::{Display, Formatter};

use crate::ir::adapter;
use crate::ir::bridge::shared::Identifier;

/// A declared type, as far as the analysis distinguishes them
#[derive(Eq, PartialEq, Ord, PartialOrd, Hash, Clone, Debug)]
pub enum Type {
    Int,
    Double,
    Object(Identifier),
    Array(Box<Type>),
}

impl Type {
    pub fn convert(ty: &adapter::typing::Type) -> Self {
        use adapter::typing::Type as AdaptedType;
        match ty {
            AdaptedType::Int => Self::Int,
            AdaptedType::Double => Self::Double,
            AdaptedType::Object(name) => Self::Object(name.into()),
            AdaptedType::Array(element) => Self::Array(Box::new(Self::convert(element))),
        }
    }

    /// Check whether this is a reference to an object of the given class
    pub fn is_object_of(&self, class: &str) -> bool {
        matches!(self, Self::Object(name) if name.as_ref() == class)
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int => write!(f, "int"),
            Self::Double => write!(f, "double"),
            Self::Object(name) => write!(f, "{}", name),
            Self::Array(element) => write!(f, "{}[]", element),
        }
    }
}
