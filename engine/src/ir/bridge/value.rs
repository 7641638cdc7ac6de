use std::fmt::{Display, Formatter};

use crate::ir::bridge::shared::Identifier;
use crate::ir::bridge::typing::Type;

/// A typed local variable of a method
#[derive(Eq, PartialEq, Ord, PartialOrd, Hash, Clone, Debug)]
pub struct Local {
    pub name: Identifier,
    pub ty: Type,
}

impl Display for Local {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.name.fmt(f)
    }
}

#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl Display for BinaryOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let sym = match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
        };
        write!(f, "{}", sym)
    }
}

#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub enum CmpOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl Display for CmpOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let sym = match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Lt => "<",
            Self::Le => "<=",
        };
        write!(f, "{}", sym)
    }
}

/// A right-hand-side expression in three-address form
#[derive(PartialEq, Clone, Debug)]
pub enum Expr {
    Int(i32),
    Double(f64),
    Null,
    This,
    Param {
        index: usize,
        ty: Type,
    },
    Local(Local),
    New(Identifier),
    NewArray {
        element: Type,
        size: Box<Expr>,
    },
    Field {
        base: Local,
        field: Identifier,
    },
    StaticField {
        class: Identifier,
        field: Identifier,
    },
    ArrayRef {
        base: Local,
        index: Box<Expr>,
    },
    Neg(Box<Expr>),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Compare {
        op: CmpOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

impl Expr {
    /// Integer literal carried by this expression, if any
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{}", v),
            Self::Double(v) => write!(f, "{:?}", v),
            Self::Null => write!(f, "null"),
            Self::This => write!(f, "@this"),
            Self::Param { index, .. } => write!(f, "@parameter{}", index),
            Self::Local(local) => write!(f, "{}", local),
            Self::New(class) => write!(f, "new {}", class),
            Self::NewArray { element, size } => write!(f, "new {}[{}]", element, size),
            Self::Field { base, field } => write!(f, "{}.{}", base, field),
            Self::StaticField { class, field } => write!(f, "{}.{}", class, field),
            Self::ArrayRef { base, index } => write!(f, "{}[{}]", base, index),
            Self::Neg(operand) => write!(f, "-{}", operand),
            Self::Binary { op, lhs, rhs } => write!(f, "{} {} {}", lhs, op, rhs),
            Self::Compare { op, lhs, rhs } => write!(f, "{} {} {}", lhs, op, rhs),
        }
    }
}

/// Target of an assignment
#[derive(PartialEq, Clone, Debug)]
pub enum Place {
    Local(Local),
    Field { base: Local, field: Identifier },
    StaticField { class: Identifier, field: Identifier },
    ArrayElement { base: Local, index: Expr },
}

impl Display for Place {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local(local) => write!(f, "{}", local),
            Self::Field { base, field } => write!(f, "{}.{}", base, field),
            Self::StaticField { class, field } => write!(f, "{}.{}", class, field),
            Self::ArrayElement { base, index } => write!(f, "{}[{}]", base, index),
        }
    }
}
