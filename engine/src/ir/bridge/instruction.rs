use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use crate::error::{EngineError, EngineResult};
use crate::ir::adapter;
use crate::ir::bridge::shared::Identifier;
use crate::ir::bridge::typing::Type;
use crate::ir::bridge::value::{BinaryOp, CmpOp, Expr, Local, Place};

#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub enum InvokeKind {
    Virtual,
    Special,
    Static,
    Interface,
}

/// A method invocation
#[derive(PartialEq, Clone, Debug)]
pub struct Invoke {
    pub kind: InvokeKind,
    pub class: Identifier,
    pub method: Identifier,
    pub base: Option<Local>,
    pub args: Vec<Expr>,
}

impl Display for Invoke {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let kind = match self.kind {
            InvokeKind::Virtual => "virtualinvoke",
            InvokeKind::Special => "specialinvoke",
            InvokeKind::Static => "staticinvoke",
            InvokeKind::Interface => "interfaceinvoke",
        };
        let args: Vec<_> = self.args.iter().map(|a| a.to_string()).collect();
        match &self.base {
            None => write!(
                f,
                "{} {}.{}({})",
                kind,
                self.class,
                self.method,
                args.join(", ")
            ),
            Some(base) => write!(
                f,
                "{} {}.<{}: {}>({})",
                kind,
                base,
                self.class,
                self.method,
                args.join(", ")
            ),
        }
    }
}

/// A statement in three-address form
#[derive(PartialEq, Clone, Debug)]
pub enum Instruction {
    Assign { target: Place, value: Expr },
    If { cond: Expr, target: usize },
    Goto { target: usize },
    Invoke(Invoke),
    ReturnVoid,
    Return { value: Expr },
    Throw { value: Expr },
}

impl Instruction {
    /// Whether control may continue to the next instruction in sequence
    pub fn falls_through(&self) -> bool {
        match self {
            Self::Assign { .. } | Self::If { .. } | Self::Invoke(..) => true,
            Self::Goto { .. } | Self::ReturnVoid | Self::Return { .. } | Self::Throw { .. } => {
                false
            }
        }
    }

    /// Explicit jump target, if any
    pub fn branch_target(&self) -> Option<usize> {
        match self {
            Self::If { target, .. } | Self::Goto { target } => Some(*target),
            Self::Assign { .. }
            | Self::Invoke(..)
            | Self::ReturnVoid
            | Self::Return { .. }
            | Self::Throw { .. } => None,
        }
    }
}

impl Display for Instruction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Assign { target, value } => write!(f, "{} = {}", target, value),
            Self::If { cond, target } => write!(f, "if {} goto {}", cond, target),
            Self::Goto { target } => write!(f, "goto {}", target),
            Self::Invoke(invoke) => write!(f, "{}", invoke),
            Self::ReturnVoid => write!(f, "return"),
            Self::Return { value } => write!(f, "return {}", value),
            Self::Throw { value } => write!(f, "throw {}", value),
        }
    }
}

/// A context manager for converting instructions
pub struct Context<'a> {
    pub method: &'a str,
    pub locals: BTreeMap<String, Type>,
    pub params: &'a [Type],
    pub length: usize,
}

impl<'a> Context<'a> {
    fn parse_local(&self, name: &str) -> EngineResult<Local> {
        match self.locals.get(name) {
            None => Err(EngineError::InvariantViolation(format!(
                "unknown local `{}` in method `{}`",
                name, self.method
            ))),
            Some(ty) => Ok(Local {
                name: name.into(),
                ty: ty.clone(),
            }),
        }
    }

    fn parse_binary(
        &self,
        op: BinaryOp,
        lhs: &adapter::value::Value,
        rhs: &adapter::value::Value,
    ) -> EngineResult<Expr> {
        Ok(Expr::Binary {
            op,
            lhs: Box::new(self.parse_value(lhs)?),
            rhs: Box::new(self.parse_value(rhs)?),
        })
    }

    fn parse_compare(
        &self,
        op: CmpOp,
        lhs: &adapter::value::Value,
        rhs: &adapter::value::Value,
    ) -> EngineResult<Expr> {
        Ok(Expr::Compare {
            op,
            lhs: Box::new(self.parse_value(lhs)?),
            rhs: Box::new(self.parse_value(rhs)?),
        })
    }

    /// convert a value
    pub fn parse_value(&self, val: &adapter::value::Value) -> EngineResult<Expr> {
        use adapter::value::Value as AdaptedValue;

        let converted = match val {
            AdaptedValue::Int(v) => Expr::Int(*v),
            AdaptedValue::Double(v) => Expr::Double(*v),
            AdaptedValue::Null => Expr::Null,
            AdaptedValue::This => Expr::This,
            AdaptedValue::Param(index) => match self.params.get(*index) {
                None => {
                    return Err(EngineError::InvariantViolation(format!(
                        "invalid parameter index {} in method `{}`",
                        index, self.method
                    )));
                }
                Some(ty) => Expr::Param {
                    index: *index,
                    ty: ty.clone(),
                },
            },
            AdaptedValue::Local(name) => Expr::Local(self.parse_local(name)?),
            AdaptedValue::New(class) => Expr::New(class.into()),
            AdaptedValue::NewArray { element, size } => Expr::NewArray {
                element: Type::convert(element),
                size: Box::new(self.parse_value(size)?),
            },
            AdaptedValue::Field { base, field } => Expr::Field {
                base: self.parse_local(base)?,
                field: field.into(),
            },
            AdaptedValue::StaticField { class, field } => Expr::StaticField {
                class: class.into(),
                field: field.into(),
            },
            AdaptedValue::ArrayRef { base, index } => Expr::ArrayRef {
                base: self.parse_local(base)?,
                index: Box::new(self.parse_value(index)?),
            },
            AdaptedValue::Neg(operand) => Expr::Neg(Box::new(self.parse_value(operand)?)),
            AdaptedValue::Add(lhs, rhs) => self.parse_binary(BinaryOp::Add, lhs, rhs)?,
            AdaptedValue::Sub(lhs, rhs) => self.parse_binary(BinaryOp::Sub, lhs, rhs)?,
            AdaptedValue::Mul(lhs, rhs) => self.parse_binary(BinaryOp::Mul, lhs, rhs)?,
            AdaptedValue::Div(lhs, rhs) => self.parse_binary(BinaryOp::Div, lhs, rhs)?,
            AdaptedValue::Rem(lhs, rhs) => self.parse_binary(BinaryOp::Rem, lhs, rhs)?,
            AdaptedValue::Eq(lhs, rhs) => self.parse_compare(CmpOp::Eq, lhs, rhs)?,
            AdaptedValue::Ne(lhs, rhs) => self.parse_compare(CmpOp::Ne, lhs, rhs)?,
            AdaptedValue::Gt(lhs, rhs) => self.parse_compare(CmpOp::Gt, lhs, rhs)?,
            AdaptedValue::Ge(lhs, rhs) => self.parse_compare(CmpOp::Ge, lhs, rhs)?,
            AdaptedValue::Lt(lhs, rhs) => self.parse_compare(CmpOp::Lt, lhs, rhs)?,
            AdaptedValue::Le(lhs, rhs) => self.parse_compare(CmpOp::Le, lhs, rhs)?,
        };
        Ok(converted)
    }

    /// convert an assignment target
    pub fn parse_place(&self, place: &adapter::instruction::Place) -> EngineResult<Place> {
        use adapter::instruction::Place as AdaptedPlace;

        let converted = match place {
            AdaptedPlace::Local(name) => Place::Local(self.parse_local(name)?),
            AdaptedPlace::Field { base, field } => Place::Field {
                base: self.parse_local(base)?,
                field: field.into(),
            },
            AdaptedPlace::StaticField { class, field } => Place::StaticField {
                class: class.into(),
                field: field.into(),
            },
            AdaptedPlace::ArrayRef { base, index } => Place::ArrayElement {
                base: self.parse_local(base)?,
                index: self.parse_value(index)?,
            },
        };
        Ok(converted)
    }

    fn parse_target(&self, target: usize) -> EngineResult<usize> {
        if target >= self.length {
            return Err(EngineError::InvariantViolation(format!(
                "branch target {} out of range in method `{}`",
                target, self.method
            )));
        }
        Ok(target)
    }

    /// convert an instruction
    pub fn parse_instruction(
        &self,
        inst: &adapter::instruction::Instruction,
    ) -> EngineResult<Instruction> {
        use adapter::instruction::Instruction as AdaptedInst;
        use adapter::instruction::InvokeKind as AdaptedInvokeKind;

        let item = match inst {
            AdaptedInst::Assign { target, value } => {
                let target_new = self.parse_place(target)?;
                let value_new = self.parse_value(value)?;

                // identity statements must agree with the declared parameter type
                if let (Place::Local(local), Expr::Param { index, ty }) = (&target_new, &value_new)
                {
                    if &local.ty != ty {
                        return Err(EngineError::InvalidAssumption(format!(
                            "parameter {} of type {} assigned to local `{}` of type {}",
                            index, ty, local, local.ty
                        )));
                    }
                }
                Instruction::Assign {
                    target: target_new,
                    value: value_new,
                }
            }
            AdaptedInst::If { cond, target } => Instruction::If {
                cond: self.parse_value(cond)?,
                target: self.parse_target(*target)?,
            },
            AdaptedInst::Goto { target } => Instruction::Goto {
                target: self.parse_target(*target)?,
            },
            AdaptedInst::Invoke(adapter::instruction::Invoke {
                kind,
                class,
                method,
                base,
                args,
            }) => {
                let kind_new = match kind {
                    AdaptedInvokeKind::Virtual => InvokeKind::Virtual,
                    AdaptedInvokeKind::Special => InvokeKind::Special,
                    AdaptedInvokeKind::Static => InvokeKind::Static,
                    AdaptedInvokeKind::Interface => InvokeKind::Interface,
                };
                let base_new = match (kind_new, base) {
                    (InvokeKind::Static, None) => None,
                    (InvokeKind::Static, Some(_)) => {
                        return Err(EngineError::InvalidAssumption(format!(
                            "static invocation of {}.{} with a receiver",
                            class, method
                        )));
                    }
                    (_, None) => {
                        return Err(EngineError::InvalidAssumption(format!(
                            "instance invocation of {}.{} without a receiver",
                            class, method
                        )));
                    }
                    (_, Some(name)) => Some(self.parse_local(name)?),
                };
                let args_new = args
                    .iter()
                    .map(|arg| self.parse_value(arg))
                    .collect::<EngineResult<_>>()?;
                Instruction::Invoke(Invoke {
                    kind: kind_new,
                    class: class.into(),
                    method: method.into(),
                    base: base_new,
                    args: args_new,
                })
            }
            AdaptedInst::ReturnVoid => Instruction::ReturnVoid,
            AdaptedInst::Return { value } => Instruction::Return {
                value: self.parse_value(value)?,
            },
            AdaptedInst::Throw { value } => Instruction::Throw {
                value: self.parse_value(value)?,
            },
        };
        Ok(item)
    }
}
