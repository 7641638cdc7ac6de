use serde::{Deserialize, Serialize};

use crate::ir::adapter::value::Value;

/// Target of an assignment
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
#[serde(rename_all = "snake_case")]
pub enum Place {
    Local(String),
    Field { base: String, field: String },
    StaticField { class: String, field: String },
    ArrayRef { base: String, index: Value },
}

#[derive(Serialize, Deserialize, Eq, PartialEq, Copy, Clone, Debug)]
#[serde(rename_all = "snake_case")]
pub enum InvokeKind {
    Virtual,
    Special,
    Static,
    Interface,
}

#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
pub struct Invoke {
    /// dispatch kind
    pub kind: InvokeKind,
    /// declaring class of the callee
    pub class: String,
    /// name of the callee
    pub method: String,
    /// receiver, absent for static calls
    #[serde(default)]
    pub base: Option<String>,
    /// arguments
    #[serde(default)]
    pub args: Vec<Value>,
}

#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
#[serde(rename_all = "snake_case")]
pub enum Instruction {
    Assign { target: Place, value: Value },
    If { cond: Value, target: usize },
    Goto { target: usize },
    Invoke(Invoke),
    ReturnVoid,
    Return { value: Value },
    Throw { value: Value },
}
