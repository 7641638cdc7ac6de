use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

use crate::analysis::generic::AbstractDomain;
use crate::error::{EngineError, EngineResult};
use crate::ir::bridge::shared::Identifier;

/// Name of a scalar integer dimension of a numeric state
pub type Variable = Identifier;

/// The ordered universe of integer variables of one method
#[derive(Eq, PartialEq, Clone, Debug)]
pub struct Environment {
    vars: Vec<Variable>,
    index: BTreeMap<Variable, usize>,
}

impl Environment {
    pub fn new(vars: Vec<Variable>) -> EngineResult<Self> {
        let mut index = BTreeMap::new();
        for (i, var) in vars.iter().enumerate() {
            if index.insert(var.clone(), i).is_some() {
                return Err(EngineError::DomainFailure(format!(
                    "duplicated variable `{}` in environment",
                    var
                )));
            }
        }
        Ok(Self { vars, index })
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn vars(&self) -> &[Variable] {
        &self.vars
    }

    pub fn contains(&self, var: &Variable) -> bool {
        self.index.contains_key(var)
    }

    pub fn index_of(&self, var: &Variable) -> EngineResult<usize> {
        self.index.get(var).copied().ok_or_else(|| {
            EngineError::DomainFailure(format!("variable `{}` not in environment", var))
        })
    }
}

impl Display for Environment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let names: Vec<_> = self.vars.iter().map(|v| v.as_ref()).collect();
        write!(f, "[{}]", names.join(", "))
    }
}

/// An integer arithmetic term over environment variables
#[derive(Eq, PartialEq, Clone, Debug)]
pub enum Term {
    Const(i64),
    Var(Variable),
    Add(Box<Term>, Box<Term>),
    Sub(Box<Term>, Box<Term>),
    Mul(Box<Term>, Box<Term>),
}

impl Term {
    pub fn var<V: Into<Variable>>(name: V) -> Self {
        Self::Var(name.into())
    }

    pub fn add(lhs: Term, rhs: Term) -> Self {
        Self::Add(Box::new(lhs), Box::new(rhs))
    }

    pub fn sub(lhs: Term, rhs: Term) -> Self {
        Self::Sub(Box::new(lhs), Box::new(rhs))
    }

    pub fn mul(lhs: Term, rhs: Term) -> Self {
        Self::Mul(Box::new(lhs), Box::new(rhs))
    }

    /// Concrete value under an assignment of the variables, `None` on an
    /// unassigned variable or on overflow
    pub fn evaluate<F>(&self, lookup: &F) -> Option<i64>
    where
        F: Fn(&Variable) -> Option<i64>,
    {
        match self {
            Self::Const(v) => Some(*v),
            Self::Var(var) => lookup(var),
            Self::Add(lhs, rhs) => lhs.evaluate(lookup)?.checked_add(rhs.evaluate(lookup)?),
            Self::Sub(lhs, rhs) => lhs.evaluate(lookup)?.checked_sub(rhs.evaluate(lookup)?),
            Self::Mul(lhs, rhs) => lhs.evaluate(lookup)?.checked_mul(rhs.evaluate(lookup)?),
        }
    }

    /// Fold the term if it mentions no variable
    pub fn as_constant(&self) -> Option<i64> {
        self.evaluate(&|_| None)
    }
}

impl Display for Term {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Const(v) => write!(f, "{}", v),
            Self::Var(var) => write!(f, "{}", var),
            Self::Add(lhs, rhs) => write!(f, "({} + {})", lhs, rhs),
            Self::Sub(lhs, rhs) => write!(f, "({} - {})", lhs, rhs),
            Self::Mul(lhs, rhs) => write!(f, "({} * {})", lhs, rhs),
        }
    }
}

/// How a term compares against zero
#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub enum Relation {
    Eq,
    Ne,
    Gt,
    Ge,
}

impl Display for Relation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let sym = match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Ge => ">=",
        };
        write!(f, "{}", sym)
    }
}

/// `term <relation> 0`
#[derive(Eq, PartialEq, Clone, Debug)]
pub struct Constraint {
    pub term: Term,
    pub relation: Relation,
}

impl Constraint {
    pub fn new(term: Term, relation: Relation) -> Self {
        Self { term, relation }
    }

    /// Concrete truth value under an assignment of the variables
    pub fn holds<F>(&self, lookup: &F) -> Option<bool>
    where
        F: Fn(&Variable) -> Option<i64>,
    {
        let v = self.term.evaluate(lookup)?;
        let result = match self.relation {
            Relation::Eq => v == 0,
            Relation::Ne => v != 0,
            Relation::Gt => v > 0,
            Relation::Ge => v >= 0,
        };
        Some(result)
    }
}

impl Display for Constraint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} 0", self.term, self.relation)
    }
}

/// A relational numeric abstract domain over a fixed environment
pub trait NumericDomain: AbstractDomain + Display + Send + Sync {
    /// No information
    fn top(env: &Arc<Environment>) -> Self;

    /// Unreachable
    fn bottom(env: &Arc<Environment>) -> Self;

    fn is_bottom(&self) -> bool;

    /// Restrict the state with a constraint
    fn meet(&self, constraint: &Constraint) -> EngineResult<Self>;

    /// Strong update of one variable
    fn assign(&self, var: &Variable, term: &Term) -> EngineResult<Self>;

    /// Whether every concrete state described satisfies the constraint
    fn satisfies(&self, constraint: &Constraint) -> EngineResult<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicated_variables_rejected() {
        let result = Environment::new(vec!["i".into(), "j".into(), "i".into()]);
        assert!(matches!(result, Err(EngineError::DomainFailure(_))));
    }

    #[test]
    fn term_evaluation() {
        // (i - 2) * j + 1
        let term = Term::add(
            Term::mul(Term::sub(Term::var("i"), Term::Const(2)), Term::var("j")),
            Term::Const(1),
        );
        let lookup = |v: &Variable| match v.as_ref() {
            "i" => Some(5),
            "j" => Some(-3),
            _ => None,
        };
        assert_eq!(term.evaluate(&lookup), Some(-8));
        assert_eq!(term.as_constant(), None);
        assert_eq!(
            Term::sub(Term::Const(7), Term::Const(3)).as_constant(),
            Some(4)
        );
        assert_eq!(term.to_string(), "(((i - 2) * j) + 1)");
    }

    #[test]
    fn overflow_is_not_a_value() {
        let term = Term::mul(Term::Const(i64::MAX), Term::Const(2));
        assert_eq!(term.as_constant(), None);
    }
}
