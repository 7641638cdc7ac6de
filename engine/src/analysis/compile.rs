use crate::analysis::domain::{Constraint, Relation, Term};
use crate::error::{EngineError, EngineResult, Unsupported};
use crate::ir::bridge::typing::Type;
use crate::ir::bridge::value::{BinaryOp, CmpOp, Expr};

/// Translate an integer expression into an arithmetic term
pub fn compile_expression(expr: &Expr) -> EngineResult<Term> {
    let term = match expr {
        Expr::Int(v) => Term::Const(*v as i64),
        Expr::Local(local) => match local.ty {
            Type::Int => Term::Var(local.name.clone()),
            _ => {
                return Err(EngineError::NotSupportedYet(Unsupported::Expression(
                    format!("{} of type {}", local, local.ty),
                )));
            }
        },
        Expr::Binary { op, lhs, rhs } => {
            let l = compile_expression(lhs)?;
            let r = compile_expression(rhs)?;
            match op {
                BinaryOp::Add => Term::add(l, r),
                BinaryOp::Sub => Term::sub(l, r),
                BinaryOp::Mul => Term::mul(l, r),
                BinaryOp::Div | BinaryOp::Rem => {
                    return Err(EngineError::NotSupportedYet(Unsupported::Expression(
                        expr.to_string(),
                    )));
                }
            }
        }
        Expr::Double(_)
        | Expr::Null
        | Expr::This
        | Expr::Param { .. }
        | Expr::New(_)
        | Expr::NewArray { .. }
        | Expr::Field { .. }
        | Expr::StaticField { .. }
        | Expr::ArrayRef { .. }
        | Expr::Neg(_)
        | Expr::Compare { .. } => {
            return Err(EngineError::NotSupportedYet(Unsupported::Expression(
                expr.to_string(),
            )));
        }
    };
    Ok(term)
}

/// Translate a branch condition into the constraint it establishes when taken,
/// and the constraint on the fall-through edge
pub fn compile_condition(cond: &Expr) -> EngineResult<(Constraint, Constraint)> {
    let Expr::Compare { op, lhs, rhs } = cond else {
        return Err(EngineError::NotSupportedYet(Unsupported::Condition(
            cond.to_string(),
        )));
    };
    let l = compile_expression(lhs)?;
    let r = compile_expression(rhs)?;

    let l_minus_r = Term::sub(l.clone(), r.clone());
    let r_minus_l = Term::sub(r, l);
    let pair = match op {
        CmpOp::Eq => (
            Constraint::new(l_minus_r.clone(), Relation::Eq),
            Constraint::new(l_minus_r, Relation::Ne),
        ),
        CmpOp::Ne => (
            Constraint::new(l_minus_r.clone(), Relation::Ne),
            Constraint::new(l_minus_r, Relation::Eq),
        ),
        CmpOp::Gt => (
            Constraint::new(l_minus_r, Relation::Gt),
            Constraint::new(r_minus_l, Relation::Ge),
        ),
        CmpOp::Ge => (
            Constraint::new(l_minus_r, Relation::Ge),
            Constraint::new(r_minus_l, Relation::Gt),
        ),
        CmpOp::Lt => (
            Constraint::new(r_minus_l, Relation::Gt),
            Constraint::new(l_minus_r, Relation::Ge),
        ),
        CmpOp::Le => (
            Constraint::new(r_minus_l, Relation::Ge),
            Constraint::new(l_minus_r, Relation::Gt),
        ),
    };
    Ok(pair)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::domain::Variable;
    use crate::ir::bridge::value::Local;

    fn local(name: &str, ty: Type) -> Box<Expr> {
        Box::new(Expr::Local(Local {
            name: name.into(),
            ty,
        }))
    }

    fn int(v: i32) -> Box<Expr> {
        Box::new(Expr::Int(v))
    }

    fn compare(op: CmpOp, lhs: Box<Expr>, rhs: Box<Expr>) -> Expr {
        Expr::Compare { op, lhs, rhs }
    }

    #[test]
    fn arithmetic() {
        let expr = Expr::Binary {
            op: BinaryOp::Mul,
            lhs: Box::new(Expr::Binary {
                op: BinaryOp::Add,
                lhs: local("i", Type::Int),
                rhs: int(2),
            }),
            rhs: local("j", Type::Int),
        };
        let term = compile_expression(&expr).unwrap();
        assert_eq!(term.to_string(), "((i + 2) * j)");
        let lookup = |v: &Variable| match v.as_ref() {
            "i" => Some(1),
            "j" => Some(7),
            _ => None,
        };
        assert_eq!(term.evaluate(&lookup), Some(21));
    }

    #[test]
    fn unsupported_expressions() {
        let cases = [
            Expr::Binary {
                op: BinaryOp::Div,
                lhs: local("i", Type::Int),
                rhs: int(2),
            },
            Expr::Binary {
                op: BinaryOp::Rem,
                lhs: local("i", Type::Int),
                rhs: int(2),
            },
            Expr::Neg(local("i", Type::Int)),
            Expr::Double(1.5),
            Expr::Param {
                index: 0,
                ty: Type::Int,
            },
            Expr::Field {
                base: Local {
                    name: "o".into(),
                    ty: Type::Object("A".into()),
                },
                field: "f".into(),
            },
            *local("d", Type::Double),
            *local("e", Type::Object("Interval".into())),
        ];
        for expr in cases {
            assert!(matches!(
                compile_expression(&expr),
                Err(EngineError::NotSupportedYet(Unsupported::Expression(_)))
            ));
        }
    }

    #[test]
    fn unsupported_condition() {
        assert!(matches!(
            compile_condition(&Expr::Local(Local {
                name: "b".into(),
                ty: Type::Int
            })),
            Err(EngineError::NotSupportedYet(Unsupported::Condition(_)))
        ));
    }

    #[test]
    fn negation_is_exact_complement() {
        let ops = [
            CmpOp::Eq,
            CmpOp::Ne,
            CmpOp::Gt,
            CmpOp::Ge,
            CmpOp::Lt,
            CmpOp::Le,
        ];
        for op in ops {
            let cond = compare(op, local("a", Type::Int), local("b", Type::Int));
            let (taken, fall) = compile_condition(&cond).unwrap();
            for a in -3..=3 {
                for b in -3..=3 {
                    let lookup = |v: &Variable| match v.as_ref() {
                        "a" => Some(a),
                        "b" => Some(b),
                        _ => None,
                    };
                    let expected = match op {
                        CmpOp::Eq => a == b,
                        CmpOp::Ne => a != b,
                        CmpOp::Gt => a > b,
                        CmpOp::Ge => a >= b,
                        CmpOp::Lt => a < b,
                        CmpOp::Le => a <= b,
                    };
                    assert_eq!(taken.holds(&lookup), Some(expected), "{} {} {}", a, op, b);
                    assert_eq!(fall.holds(&lookup), Some(!expected), "{} {} {}", a, op, b);
                }
            }
        }
    }

    #[test]
    fn condition_shapes() {
        let (taken, fall) =
            compile_condition(&compare(CmpOp::Lt, local("i", Type::Int), int(10))).unwrap();
        assert_eq!(taken.to_string(), "(10 - i) > 0");
        assert_eq!(fall.to_string(), "(i - 10) >= 0");
    }
}
