use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

use crate::analysis::domain::{Constraint, Environment, NumericDomain, Relation, Term, Variable};
use crate::analysis::generic::AbstractDomain;
use crate::error::{EngineError, EngineResult};

/// Sentinel for an absent bound
const INF: i128 = i128::MAX / 4;

fn add_bound(a: i128, b: i128) -> i128 {
    if a >= INF || b >= INF {
        INF
    } else {
        (a + b).min(INF)
    }
}

fn max_opt(a: Option<i128>, b: Option<i128>) -> Option<i128> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.max(y)),
        (Some(x), None) | (None, Some(x)) => Some(x),
        (None, None) => None,
    }
}

fn min_opt(a: Option<i128>, b: Option<i128>) -> Option<i128> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.min(y)),
        (Some(x), None) | (None, Some(x)) => Some(x),
        (None, None) => None,
    }
}

fn sum_opt(a: Option<i128>, b: Option<i128>) -> Option<i128> {
    a?.checked_add(b?)
}

/// Index of the literal `+x` or `-x`
fn lit(x: usize, positive: bool) -> usize {
    if positive {
        2 * x
    } else {
        2 * x + 1
    }
}

/// Index of the opposite literal
fn bar(i: usize) -> usize {
    i ^ 1
}

/// A possibly unbounded integer interval
#[derive(Eq, PartialEq, Copy, Clone, Debug)]
struct Itv {
    lo: Option<i128>,
    hi: Option<i128>,
}

impl Itv {
    const TOP: Self = Self { lo: None, hi: None };

    fn point(v: i128) -> Self {
        Self {
            lo: Some(v),
            hi: Some(v),
        }
    }

    fn add(self, other: Self) -> Self {
        Self {
            lo: sum_opt(self.lo, other.lo),
            hi: sum_opt(self.hi, other.hi),
        }
    }

    fn neg(self) -> Self {
        Self {
            lo: self.hi.map(|v| -v),
            hi: self.lo.map(|v| -v),
        }
    }

    fn scale(self, k: i128) -> Self {
        if k == 0 {
            return Self::point(0);
        }
        let lo = self.lo.and_then(|v| v.checked_mul(k));
        let hi = self.hi.and_then(|v| v.checked_mul(k));
        if k > 0 {
            Self { lo, hi }
        } else {
            Self { lo: hi, hi: lo }
        }
    }

    fn mul(self, other: Self) -> Self {
        if self == Self::point(0) || other == Self::point(0) {
            return Self::point(0);
        }
        let (Some(a), Some(b), Some(c), Some(d)) = (self.lo, self.hi, other.lo, other.hi) else {
            return Self::TOP;
        };
        let products = [a.checked_mul(c), a.checked_mul(d), b.checked_mul(c), b.checked_mul(d)];
        if products.iter().any(|p| p.is_none()) {
            return Self::TOP;
        }
        let values: Vec<_> = products.iter().flatten().copied().collect();
        Self {
            lo: values.iter().min().copied(),
            hi: values.iter().max().copied(),
        }
    }

    fn intersect(self, other: Self) -> Self {
        Self {
            lo: max_opt(self.lo, other.lo),
            hi: min_opt(self.hi, other.hi),
        }
    }

    /// Whether every value in the interval satisfies `v <relation> 0`
    fn entails(&self, relation: Relation) -> bool {
        match relation {
            Relation::Ge => matches!(self.lo, Some(l) if l >= 0),
            Relation::Gt => matches!(self.lo, Some(l) if l >= 1),
            Relation::Eq => *self == Self::point(0),
            Relation::Ne => {
                matches!(self.lo, Some(l) if l >= 1) || matches!(self.hi, Some(h) if h <= -1)
            }
        }
    }

    /// Whether no value in the interval satisfies `v <relation> 0`
    fn refutes(&self, relation: Relation) -> bool {
        match relation {
            Relation::Ge => matches!(self.hi, Some(h) if h < 0),
            Relation::Gt => matches!(self.hi, Some(h) if h < 1),
            Relation::Eq => self.entails(Relation::Ne),
            Relation::Ne => *self == Self::point(0),
        }
    }
}

/// `sum(coeffs[x] * x) + constant`, over variable indices
#[derive(Eq, PartialEq, Clone, Debug, Default)]
struct Linear {
    coeffs: BTreeMap<usize, i128>,
    constant: i128,
}

impl Linear {
    fn constant(c: i128) -> Self {
        Self {
            coeffs: BTreeMap::new(),
            constant: c,
        }
    }

    fn var(x: usize) -> Self {
        Self {
            coeffs: BTreeMap::from([(x, 1)]),
            constant: 0,
        }
    }

    /// `self + k * other`
    fn combine(mut self, other: &Self, k: i128) -> Option<Self> {
        for (x, a) in &other.coeffs {
            let entry = self.coeffs.entry(*x).or_insert(0);
            *entry = entry.checked_add(a.checked_mul(k)?)?;
        }
        self.coeffs.retain(|_, a| *a != 0);
        self.constant = self.constant.checked_add(other.constant.checked_mul(k)?)?;
        Some(self)
    }

    fn scale(mut self, k: i128) -> Option<Self> {
        for a in self.coeffs.values_mut() {
            *a = a.checked_mul(k)?;
        }
        self.coeffs.retain(|_, a| *a != 0);
        self.constant = self.constant.checked_mul(k)?;
        Some(self)
    }

    fn offset(mut self, c: i128) -> Self {
        self.constant += c;
        self
    }

    fn negate(&self) -> Self {
        Self {
            coeffs: self.coeffs.iter().map(|(x, a)| (*x, -*a)).collect(),
            constant: -self.constant,
        }
    }

    fn without(&self, x: usize) -> Self {
        let mut result = self.clone();
        result.coeffs.remove(&x);
        result
    }
}

/// Convert a term into a linear form, `None` when it is not linear
fn linearize(env: &Environment, term: &Term) -> EngineResult<Option<Linear>> {
    let form = match term {
        Term::Const(c) => Some(Linear::constant(*c as i128)),
        Term::Var(var) => Some(Linear::var(env.index_of(var)?)),
        Term::Add(lhs, rhs) | Term::Sub(lhs, rhs) => {
            let k = if matches!(term, Term::Add(..)) { 1 } else { -1 };
            match (linearize(env, lhs)?, linearize(env, rhs)?) {
                (Some(l), Some(r)) => l.combine(&r, k),
                _ => None,
            }
        }
        Term::Mul(lhs, rhs) => match (linearize(env, lhs)?, linearize(env, rhs)?) {
            (Some(l), Some(r)) if l.coeffs.is_empty() => r.scale(l.constant),
            (Some(l), Some(r)) if r.coeffs.is_empty() => l.scale(r.constant),
            _ => None,
        },
    };
    Ok(form)
}

/// Difference-bound matrix over the literals `+x` and `-x` of every variable:
/// cell `(i, j)` bounds `V_j - V_i`
#[derive(Eq, PartialEq, Clone, Debug)]
struct Matrix {
    dim: usize,
    cells: Vec<i128>,
}

impl Matrix {
    fn top(vars: usize) -> Self {
        let dim = 2 * vars;
        let mut cells = vec![INF; dim * dim];
        for i in 0..dim {
            cells[i * dim + i] = 0;
        }
        Self { dim, cells }
    }

    fn get(&self, i: usize, j: usize) -> i128 {
        self.cells[i * self.dim + j]
    }

    fn set(&mut self, i: usize, j: usize, v: i128) {
        self.cells[i * self.dim + j] = v.min(INF);
    }

    fn refine(&mut self, i: usize, j: usize, v: i128) {
        if v < self.get(i, j) {
            self.set(i, j, v);
        }
    }

    /// `sx * x + sy * y <= c` for distinct variables
    fn add_pair(&mut self, (px, x): (bool, usize), (py, y): (bool, usize), c: i128) {
        let a = lit(x, px);
        let b = lit(y, !py);
        self.refine(b, a, c);
        self.refine(bar(a), bar(b), c);
    }

    /// `s * x <= c`
    fn add_unary(&mut self, positive: bool, x: usize, c: i128) {
        let a = lit(x, positive);
        self.refine(bar(a), a, c.saturating_mul(2));
    }

    /// `k * x <= c` for any non-zero `k`
    fn add_scaled(&mut self, x: usize, k: i128, c: i128) {
        if k > 0 {
            self.add_unary(true, x, c.div_euclid(k));
        } else if k < 0 {
            self.add_unary(false, x, c.div_euclid(-k));
        }
    }

    fn add_interval(&mut self, x: usize, itv: Itv) {
        if let Some(hi) = itv.hi {
            self.add_unary(true, x, hi);
        }
        if let Some(lo) = itv.lo {
            self.add_unary(false, x, -lo);
        }
    }

    /// Upper bound of `s * x`
    fn upper_unary(&self, positive: bool, x: usize) -> Option<i128> {
        let a = lit(x, positive);
        let v = self.get(bar(a), a);
        (v < INF).then(|| v.div_euclid(2))
    }

    /// Upper bound of `sx * x + sy * y` for distinct variables
    fn upper_pair(&self, (px, x): (bool, usize), (py, y): (bool, usize)) -> Option<i128> {
        let v = self.get(lit(y, !py), lit(x, px));
        (v < INF).then_some(v)
    }

    fn interval(&self, x: usize) -> Itv {
        Itv {
            lo: self.upper_unary(false, x).map(|v| -v),
            hi: self.upper_unary(true, x),
        }
    }

    /// Tight closure for integer octagons, returns false if the octagon is empty
    fn close(&mut self) -> bool {
        let dim = self.dim;

        // shortest paths
        for k in 0..dim {
            for i in 0..dim {
                let ik = self.get(i, k);
                if ik >= INF {
                    continue;
                }
                for j in 0..dim {
                    let v = add_bound(ik, self.get(k, j));
                    if v < self.get(i, j) {
                        self.set(i, j, v);
                    }
                }
            }
        }
        if (0..dim).any(|i| self.get(i, i) < 0) {
            return false;
        }

        // unary bounds on integers are even
        for i in 0..dim {
            let v = self.get(i, bar(i));
            if v < INF {
                self.set(i, bar(i), 2 * v.div_euclid(2));
            }
        }

        // strengthening
        for i in 0..dim {
            let a = self.get(i, bar(i));
            if a >= INF {
                continue;
            }
            for j in 0..dim {
                let b = self.get(bar(j), j);
                if b >= INF {
                    continue;
                }
                self.refine(i, j, (a + b).div_euclid(2));
            }
        }

        for i in 0..dim {
            if add_bound(self.get(i, bar(i)), self.get(bar(i), i)) < 0 {
                return false;
            }
            if self.get(i, i) < 0 {
                return false;
            }
            self.set(i, i, 0);
        }
        true
    }

    /// Drop every constraint on `x`
    fn forget(&mut self, x: usize) {
        for a in [lit(x, true), lit(x, false)] {
            for k in 0..self.dim {
                if k != a {
                    self.set(a, k, INF);
                    self.set(k, a, INF);
                }
            }
        }
    }

    /// `x := x + c`
    fn shift(&mut self, x: usize, c: i128) {
        let delta = |i: usize| {
            if i == lit(x, true) {
                c
            } else if i == lit(x, false) {
                -c
            } else {
                0
            }
        };
        for i in 0..self.dim {
            for j in 0..self.dim {
                let v = self.get(i, j);
                if v < INF {
                    self.set(i, j, v + delta(j) - delta(i));
                }
            }
        }
    }
}

/// Range of a linear form, using relational bounds where the form is octagonal
fn bounds_of(m: &Matrix, form: &Linear) -> Itv {
    let base = Itv::point(form.constant);
    let terms: Vec<(usize, i128)> = form.coeffs.iter().map(|(x, a)| (*x, *a)).collect();
    let sum = terms
        .iter()
        .fold(Itv::point(0), |acc, (x, a)| acc.add(m.interval(*x).scale(*a)));

    let range = match terms.as_slice() {
        [(x, kx), (y, ky)] if kx.abs() == 1 && ky.abs() == 1 => {
            let relational = Itv {
                lo: m
                    .upper_pair((*kx < 0, *x), (*ky < 0, *y))
                    .map(|v| -v),
                hi: m.upper_pair((*kx > 0, *x), (*ky > 0, *y)),
            };
            relational.intersect(sum)
        }
        _ => sum,
    };
    range.add(base)
}

/// Range of an arbitrary term by interval arithmetic
fn interval_of(env: &Environment, m: &Matrix, term: &Term) -> EngineResult<Itv> {
    let itv = match term {
        Term::Const(c) => Itv::point(*c as i128),
        Term::Var(var) => m.interval(env.index_of(var)?),
        Term::Add(lhs, rhs) => interval_of(env, m, lhs)?.add(interval_of(env, m, rhs)?),
        Term::Sub(lhs, rhs) => interval_of(env, m, lhs)?.add(interval_of(env, m, rhs)?.neg()),
        Term::Mul(lhs, rhs) => interval_of(env, m, lhs)?.mul(interval_of(env, m, rhs)?),
    };
    Ok(itv)
}

/// Add `form >= 0`, returns false if this is found infeasible right away
fn add_nonneg(m: &mut Matrix, form: &Linear) -> bool {
    if bounds_of(m, form).refutes(Relation::Ge) {
        return false;
    }

    // sum(-a * x) <= c
    let c = form.constant;
    let terms: Vec<(usize, i128)> = form.coeffs.iter().map(|(x, a)| (*x, -*a)).collect();
    match terms.as_slice() {
        [] => c >= 0,
        [(x, k)] => {
            m.add_scaled(*x, *k, c);
            true
        }
        [(x, kx), (y, ky)] if kx.abs() == 1 && ky.abs() == 1 => {
            m.add_pair((*kx > 0, *x), (*ky > 0, *y), c);
            true
        }
        _ => {
            // not octagonal: propagate onto the bound of each variable
            for (i, (x, k)) in terms.iter().enumerate() {
                let rest = terms
                    .iter()
                    .enumerate()
                    .filter(|(j, _)| *j != i)
                    .fold(Itv::point(0), |acc, (_, (y, ky))| {
                        acc.add(m.interval(*y).scale(*ky))
                    });
                if let Some(lo) = rest.lo {
                    m.add_scaled(*x, *k, c - lo);
                }
            }
            true
        }
    }
}

/// An integer octagon: conjunction of `±x ± y <= c` constraints
#[derive(Clone, Debug)]
pub struct Octagon {
    env: Arc<Environment>,
    /// `None` encodes the empty octagon
    matrix: Option<Matrix>,
    /// whether `matrix` is known to be tightly closed
    closed: bool,
}

impl Octagon {
    pub fn env(&self) -> &Arc<Environment> {
        &self.env
    }

    fn closure(&self) -> Option<Matrix> {
        let matrix = self.matrix.as_ref()?;
        if self.closed {
            return Some(matrix.clone());
        }
        let mut m = matrix.clone();
        m.close().then_some(m)
    }

    fn normalize(env: &Arc<Environment>, mut m: Matrix) -> Self {
        if m.close() {
            Self {
                env: env.clone(),
                matrix: Some(m),
                closed: true,
            }
        } else {
            Self::bottom(env)
        }
    }

    fn check_compatible(&self, other: &Self) -> EngineResult<()> {
        if Arc::ptr_eq(&self.env, &other.env) || self.env == other.env {
            Ok(())
        } else {
            Err(EngineError::DomainFailure(format!(
                "incompatible environments {} and {}",
                self.env, other.env
            )))
        }
    }

    /// Range of a term given the closed matrix of this state
    fn range(&self, m: &Matrix, term: &Term) -> EngineResult<Itv> {
        match linearize(&self.env, term)? {
            Some(form) => Ok(bounds_of(m, &form)),
            None => interval_of(&self.env, m, term),
        }
    }
}

impl PartialEq for Octagon {
    fn eq(&self, other: &Self) -> bool {
        self.env == other.env && self.closure() == other.closure()
    }
}

impl Eq for Octagon {}

impl AbstractDomain for Octagon {
    fn join(&self, other: &Self) -> EngineResult<Self> {
        self.check_compatible(other)?;
        let joined = match (self.closure(), other.closure()) {
            (None, None) => return Ok(Self::bottom(&self.env)),
            (Some(m), None) | (None, Some(m)) => m,
            (Some(a), Some(b)) => Matrix {
                dim: a.dim,
                cells: a
                    .cells
                    .iter()
                    .zip(b.cells.iter())
                    .map(|(x, y)| *x.max(y))
                    .collect(),
            },
        };
        Ok(Self {
            env: self.env.clone(),
            matrix: Some(joined),
            closed: false,
        })
    }

    fn widen(&self, other: &Self) -> EngineResult<Self> {
        self.check_compatible(other)?;
        // the older matrix is used as is, closing it would break termination
        let Some(old) = &self.matrix else {
            return Ok(other.clone());
        };
        let Some(new) = other.closure() else {
            return Ok(self.clone());
        };
        let cells = old
            .cells
            .iter()
            .zip(new.cells.iter())
            .map(|(o, n)| if n <= o { *o } else { INF })
            .collect();
        Ok(Self {
            env: self.env.clone(),
            matrix: Some(Matrix {
                dim: old.dim,
                cells,
            }),
            closed: false,
        })
    }
}

impl NumericDomain for Octagon {
    fn top(env: &Arc<Environment>) -> Self {
        Self {
            env: env.clone(),
            matrix: Some(Matrix::top(env.len())),
            closed: true,
        }
    }

    fn bottom(env: &Arc<Environment>) -> Self {
        Self {
            env: env.clone(),
            matrix: None,
            closed: true,
        }
    }

    fn is_bottom(&self) -> bool {
        self.closure().is_none()
    }

    fn meet(&self, constraint: &Constraint) -> EngineResult<Self> {
        let form = linearize(&self.env, &constraint.term)?;
        let Some(mut m) = self.closure() else {
            return Ok(Self::bottom(&self.env));
        };

        let Some(form) = form else {
            // non-linear, only check for infeasibility
            let itv = interval_of(&self.env, &m, &constraint.term)?;
            if itv.refutes(constraint.relation) {
                return Ok(Self::bottom(&self.env));
            }
            return Ok(Self::normalize(&self.env, m));
        };

        let feasible = match constraint.relation {
            Relation::Ge => add_nonneg(&mut m, &form),
            Relation::Gt => add_nonneg(&mut m, &form.clone().offset(-1)),
            Relation::Eq => add_nonneg(&mut m, &form) && add_nonneg(&mut m, &form.negate()),
            Relation::Ne => {
                // only a value at either end of the range can be cut off
                let itv = bounds_of(&m, &form);
                if itv == Itv::point(0) {
                    false
                } else if itv.lo == Some(0) {
                    add_nonneg(&mut m, &form.clone().offset(-1))
                } else if itv.hi == Some(0) {
                    add_nonneg(&mut m, &form.negate().offset(-1))
                } else {
                    true
                }
            }
        };
        if !feasible {
            return Ok(Self::bottom(&self.env));
        }
        Ok(Self::normalize(&self.env, m))
    }

    fn assign(&self, var: &Variable, term: &Term) -> EngineResult<Self> {
        let x = self.env.index_of(var)?;
        let form = linearize(&self.env, term)?;
        let Some(mut m) = self.closure() else {
            return Ok(Self::bottom(&self.env));
        };

        match form {
            None => {
                let itv = interval_of(&self.env, &m, term)?;
                m.forget(x);
                m.add_interval(x, itv);
            }
            Some(form) => {
                if form.coeffs.len() == 1 && form.coeffs.get(&x) == Some(&1) {
                    // translation keeps the matrix closed
                    m.shift(x, form.constant);
                    return Ok(Self {
                        env: self.env.clone(),
                        matrix: Some(m),
                        closed: true,
                    });
                }

                // collect everything about the new value before `x` is dropped
                let itv = bounds_of(&m, &form);
                let relations: Vec<_> = form
                    .coeffs
                    .iter()
                    .filter(|(y, a)| **y != x && a.abs() == 1)
                    .map(|(y, a)| (*y, *a > 0, bounds_of(&m, &form.without(*y))))
                    .collect();

                m.forget(x);
                m.add_interval(x, itv);
                for (y, positive, rest) in relations {
                    // x - s * y == rest
                    if let Some(hi) = rest.hi {
                        m.add_pair((true, x), (!positive, y), hi);
                    }
                    if let Some(lo) = rest.lo {
                        m.add_pair((false, x), (positive, y), -lo);
                    }
                }
            }
        }
        Ok(Self::normalize(&self.env, m))
    }

    fn satisfies(&self, constraint: &Constraint) -> EngineResult<bool> {
        let Some(m) = self.closure() else {
            // validate the term anyway
            linearize(&self.env, &constraint.term)?;
            return Ok(true);
        };
        let itv = self.range(&m, &constraint.term)?;
        Ok(itv.entails(constraint.relation))
    }
}

impl Display for Octagon {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let Some(m) = self.closure() else {
            return write!(f, "⊥");
        };

        let names = self.env.vars();
        let mut items = vec![];
        for (x, name) in names.iter().enumerate() {
            let itv = m.interval(x);
            match (itv.lo, itv.hi) {
                (None, None) => (),
                (Some(l), Some(h)) if l == h => items.push(format!("{} == {}", name, l)),
                (lo, hi) => {
                    let lo = lo.map_or("-oo".to_string(), |v| v.to_string());
                    let hi = hi.map_or("+oo".to_string(), |v| v.to_string());
                    items.push(format!("{} in [{}, {}]", name, lo, hi));
                }
            }
        }
        for x in 0..names.len() {
            for y in (x + 1)..names.len() {
                for (px, py) in [(true, true), (true, false), (false, true), (false, false)] {
                    let Some(v) = m.upper_pair((px, x), (py, y)) else {
                        continue;
                    };
                    // skip what the unary bounds already imply
                    let implied = sum_opt(m.upper_unary(px, x), m.upper_unary(py, y));
                    if matches!(implied, Some(i) if i <= v) {
                        continue;
                    }
                    items.push(format!(
                        "{}{} {} {} <= {}",
                        if px { "" } else { "-" },
                        names[x],
                        if py { "+" } else { "-" },
                        names[y],
                        v
                    ));
                }
            }
        }

        if items.is_empty() {
            write!(f, "⊤")
        } else {
            write!(f, "{{{}}}", items.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(names: &[&str]) -> Arc<Environment> {
        Arc::new(Environment::new(names.iter().map(|n| (*n).into()).collect()).unwrap())
    }

    fn ge(lhs: Term, rhs: Term) -> Constraint {
        Constraint::new(Term::sub(lhs, rhs), Relation::Ge)
    }

    fn cmp(lhs: Term, rhs: Term, relation: Relation) -> Constraint {
        Constraint::new(Term::sub(lhs, rhs), relation)
    }

    fn var(name: &str) -> Term {
        Term::var(name)
    }

    fn num(v: i64) -> Term {
        Term::Const(v)
    }

    #[test]
    fn top_and_bottom() {
        let env = env(&["x"]);
        let top = Octagon::top(&env);
        let bottom = Octagon::bottom(&env);
        assert!(!top.is_bottom());
        assert!(bottom.is_bottom());
        assert!(!top.satisfies(&ge(var("x"), num(0))).unwrap());
        assert!(bottom.satisfies(&ge(var("x"), num(0))).unwrap());
        assert!(top.satisfies(&ge(var("x"), var("x"))).unwrap());
        assert_eq!(top.join(&bottom).unwrap(), top);
        assert_eq!(bottom.join(&top).unwrap(), top);
    }

    #[test]
    fn constant_assignment() {
        let env = env(&["x", "y"]);
        let s = Octagon::top(&env).assign(&"x".into(), &num(3)).unwrap();
        assert!(s.satisfies(&cmp(var("x"), num(3), Relation::Eq)).unwrap());
        assert!(!s.satisfies(&ge(var("y"), num(0))).unwrap());
        assert_eq!(s.to_string(), "{x == 3}");
    }

    #[test]
    fn relational_assignment_and_shift() {
        let env = env(&["x", "y"]);
        let s = Octagon::top(&env)
            .assign(&"x".into(), &Term::add(var("y"), num(2)))
            .unwrap();
        assert!(s.satisfies(&cmp(var("x"), var("y"), Relation::Gt)).unwrap());
        assert!(s
            .satisfies(&cmp(var("x"), Term::add(var("y"), num(2)), Relation::Eq))
            .unwrap());

        let s = s.assign(&"y".into(), &Term::add(var("y"), num(1))).unwrap();
        assert!(s.satisfies(&ge(var("x"), var("y"))).unwrap());
        assert!(!s.satisfies(&ge(var("x"), Term::add(var("y"), num(2)))).unwrap());
    }

    #[test]
    fn self_referencing_assignment() {
        let env = env(&["x", "y"]);
        let s = Octagon::top(&env)
            .meet(&cmp(var("x"), num(1), Relation::Eq))
            .unwrap()
            .meet(&cmp(var("y"), num(4), Relation::Eq))
            .unwrap()
            .assign(&"x".into(), &Term::add(var("x"), var("y")))
            .unwrap();
        assert!(s.satisfies(&cmp(var("x"), num(5), Relation::Eq)).unwrap());
        assert!(s.satisfies(&cmp(var("x"), Term::add(var("y"), num(1)), Relation::Eq)).unwrap());
    }

    #[test]
    fn transitive_closure() {
        let env = env(&["x", "y", "z"]);
        let s = Octagon::top(&env)
            .meet(&ge(var("y"), var("x")))
            .unwrap()
            .meet(&ge(var("z"), var("y")))
            .unwrap();
        assert!(s.satisfies(&ge(var("z"), var("x"))).unwrap());
        assert!(!s.satisfies(&ge(var("x"), var("z"))).unwrap());
    }

    #[test]
    fn disequality_at_interval_end() {
        let env = env(&["x"]);
        let s = Octagon::top(&env)
            .meet(&ge(var("x"), num(0)))
            .unwrap()
            .meet(&ge(num(3), var("x")))
            .unwrap();

        let cut = s.meet(&cmp(var("x"), num(3), Relation::Ne)).unwrap();
        assert!(cut.satisfies(&ge(num(2), var("x"))).unwrap());

        // a value strictly inside the range cannot be excluded
        let inner = s.meet(&cmp(var("x"), num(1), Relation::Ne)).unwrap();
        assert_eq!(inner, s);

        let point = s.meet(&cmp(var("x"), num(0), Relation::Eq)).unwrap();
        assert!(point.meet(&cmp(var("x"), num(0), Relation::Ne)).unwrap().is_bottom());
    }

    #[test]
    fn integer_tightening() {
        let env = env(&["x"]);
        let twice = Term::mul(num(2), var("x"));
        let s = Octagon::top(&env)
            .meet(&ge(twice.clone(), num(1)))
            .unwrap()
            .meet(&ge(num(1), twice))
            .unwrap();
        assert!(s.is_bottom());

        let s = Octagon::top(&env)
            .meet(&cmp(var("x"), num(0), Relation::Gt))
            .unwrap();
        assert!(s.satisfies(&ge(var("x"), num(1))).unwrap());
    }

    #[test]
    fn join_and_widen() {
        let env = env(&["x"]);
        let one = Octagon::top(&env).assign(&"x".into(), &num(1)).unwrap();
        let five = Octagon::top(&env).assign(&"x".into(), &num(5)).unwrap();
        let joined = one.join(&five).unwrap();
        assert!(joined.satisfies(&ge(var("x"), num(1))).unwrap());
        assert!(joined.satisfies(&ge(num(5), var("x"))).unwrap());
        assert!(!joined.satisfies(&ge(var("x"), num(2))).unwrap());

        let grown = joined
            .join(&Octagon::top(&env).assign(&"x".into(), &num(6)).unwrap())
            .unwrap();
        let widened = joined.widen(&grown).unwrap();
        assert!(widened.satisfies(&ge(var("x"), num(1))).unwrap());
        assert!(!widened.satisfies(&ge(num(100), var("x"))).unwrap());

        // stable once nothing grows
        assert_eq!(widened.widen(&grown).unwrap(), widened);
    }

    #[test]
    fn constraint_and_negation_partition_points() {
        let env = env(&["x", "y"]);
        let relations = [Relation::Eq, Relation::Ne, Relation::Gt, Relation::Ge];
        for vx in -2..=2 {
            for vy in -2..=2 {
                let point = Octagon::top(&env)
                    .assign(&"x".into(), &num(vx))
                    .unwrap()
                    .assign(&"y".into(), &num(vy))
                    .unwrap();
                for relation in relations {
                    let c = cmp(var("x"), var("y"), relation);
                    let expected = match relation {
                        Relation::Eq => vx == vy,
                        Relation::Ne => vx != vy,
                        Relation::Gt => vx > vy,
                        Relation::Ge => vx >= vy,
                    };
                    assert_eq!(!point.meet(&c).unwrap().is_bottom(), expected);
                    assert_eq!(point.satisfies(&c).unwrap(), expected);
                }
            }
        }
    }

    #[test]
    fn nonlinear_terms() {
        let env = env(&["x", "y", "z"]);
        let s = Octagon::top(&env)
            .meet(&ge(var("x"), num(2)))
            .unwrap()
            .meet(&ge(num(3), var("x")))
            .unwrap()
            .meet(&ge(var("y"), num(4)))
            .unwrap()
            .meet(&ge(num(5), var("y")))
            .unwrap()
            .assign(&"z".into(), &Term::mul(var("x"), var("y")))
            .unwrap();
        assert!(s.satisfies(&ge(var("z"), num(8))).unwrap());
        assert!(s.satisfies(&ge(num(15), var("z"))).unwrap());
        assert!(!s.satisfies(&ge(num(14), var("z"))).unwrap());

        let refuted = s
            .meet(&ge(Term::mul(var("x"), var("y")), num(16)))
            .unwrap();
        assert!(refuted.is_bottom());
    }

    #[test]
    fn wide_linear_constraints() {
        let env = env(&["x", "y", "z"]);
        let s = Octagon::top(&env)
            .meet(&ge(num(1), var("y")))
            .unwrap()
            .meet(&ge(num(1), var("z")))
            .unwrap()
            .meet(&ge(
                Term::add(var("x"), Term::add(var("y"), var("z"))),
                num(10),
            ))
            .unwrap();
        assert!(s.satisfies(&ge(var("x"), num(8))).unwrap());
    }

    #[test]
    fn unknown_variable() {
        let env = env(&["x"]);
        let s = Octagon::top(&env);
        assert!(matches!(
            s.assign(&"y".into(), &num(0)),
            Err(EngineError::DomainFailure(_))
        ));
        assert!(matches!(
            s.meet(&ge(var("y"), num(0))),
            Err(EngineError::DomainFailure(_))
        ));
        assert!(matches!(
            Octagon::bottom(&env).satisfies(&ge(var("y"), num(0))),
            Err(EngineError::DomainFailure(_))
        ));
    }

    #[test]
    fn incompatible_environments() {
        let a = Octagon::top(&env(&["x"]));
        let b = Octagon::top(&env(&["y"]));
        assert!(matches!(a.join(&b), Err(EngineError::DomainFailure(_))));
    }
}
