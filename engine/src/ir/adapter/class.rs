use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ir::adapter::instruction::Instruction;
use crate::ir::adapter::typing::Type;

/// A representation of a method
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
pub struct Method {
    /// name of the method
    pub name: String,
    /// parameter types, in declaration order
    #[serde(default)]
    pub params: Vec<Type>,
    /// declared locals and their types
    #[serde(default)]
    pub locals: BTreeMap<String, Type>,
    /// instruction stream (absent for abstract or native methods)
    #[serde(default)]
    pub body: Option<Vec<Instruction>>,
}

/// A representation of a class
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
pub struct Class {
    /// fully qualified name
    pub name: String,
    /// methods of the class
    pub methods: Vec<Method>,
}
