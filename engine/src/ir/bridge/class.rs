use std::fmt::{Display, Formatter};

use crate::error::EngineResult;
use crate::ir::adapter;
use crate::ir::bridge::method::Method;
use crate::ir::bridge::shared::Identifier;

/// Position of an instruction within a class: method index and instruction index
#[derive(Eq, PartialEq, Ord, PartialOrd, Hash, Copy, Clone, Debug)]
pub struct Site {
    pub method: usize,
    pub index: usize,
}

impl Display for Site {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}:{}", self.method, self.index)
    }
}

/// An adapted representation of a class
pub struct Class {
    /// class name
    pub name: Identifier,
    /// methods in declaration order; their position is the method id
    pub methods: Vec<Method>,
}

impl Class {
    pub fn convert(class: &adapter::class::Class) -> EngineResult<Self> {
        let adapter::class::Class { name, methods } = class;
        let methods_new = methods
            .iter()
            .map(Method::convert)
            .collect::<EngineResult<_>>()?;
        Ok(Self {
            name: name.into(),
            methods: methods_new,
        })
    }
}
