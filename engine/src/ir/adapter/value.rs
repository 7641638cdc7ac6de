use serde::{Deserialize, Serialize};

use crate::ir::adapter::typing::Type;

/// A representation of a right-hand-side value
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    // constants
    Int(i32),
    Double(f64),
    Null,
    // identity references
    This,
    Param(usize),
    // locals
    Local(String),
    // allocation
    New(String),
    NewArray { element: Type, size: Box<Value> },
    // memory access
    Field { base: String, field: String },
    StaticField { class: String, field: String },
    ArrayRef { base: String, index: Box<Value> },
    // arithmetic
    Neg(Box<Value>),
    Add(Box<Value>, Box<Value>),
    Sub(Box<Value>, Box<Value>),
    Mul(Box<Value>, Box<Value>),
    Div(Box<Value>, Box<Value>),
    Rem(Box<Value>, Box<Value>),
    // comparison
    Eq(Box<Value>, Box<Value>),
    Ne(Box<Value>, Box<Value>),
    Gt(Box<Value>, Box<Value>),
    Ge(Box<Value>, Box<Value>),
    Lt(Box<Value>, Box<Value>),
    Le(Box<Value>, Box<Value>),
}
