use std::collections::{BTreeMap, BTreeSet};

use log::{debug, info};
use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::analysis::compile::compile_expression;
use crate::analysis::domain::{Constraint, NumericDomain, Relation, Term};
use crate::analysis::numerical::NumericalAnalysis;
use crate::analysis::octagon::Octagon;
use crate::error::{EngineError, EngineResult, Unsupported};
use crate::ir::bridge::class::Class;
use crate::pointer::resolver::{Initializer, QuerySite, Resolver};
use crate::settings::Settings;
use crate::verify::Property;
use timeguard_shared::config::PARALLEL;
use timeguard_shared::logging::Tracer;

/// Whether `lhs >= rhs` holds in every concrete state described by `state`
fn entails_ge<N: NumericDomain>(state: &N, lhs: &Term, rhs: &Term) -> EngineResult<bool> {
    match (lhs.as_constant(), rhs.as_constant()) {
        (Some(l), Some(r)) => Ok(l >= r),
        _ => state.satisfies(&Constraint::new(
            Term::sub(lhs.clone(), rhs.clone()),
            Relation::Ge,
        )),
    }
}

/// Checks temporal properties of the interval objects of one class
pub struct Verifier<'a, N: NumericDomain = Octagon> {
    class: &'a Class,
    settings: Settings,
    resolver: Resolver,
    analyses: Option<BTreeMap<usize, NumericalAnalysis<N>>>,
    analyzed: BTreeSet<Property>,
}

impl<'a, N: NumericDomain> Verifier<'a, N> {
    pub fn new(class: &'a Class, settings: Settings) -> EngineResult<Self> {
        let resolver = Resolver::new(class, &settings)?;
        Ok(Self::with_resolver(class, settings, resolver))
    }

    pub fn with_resolver(class: &'a Class, settings: Settings, resolver: Resolver) -> Self {
        Self {
            class,
            settings,
            resolver,
            analyses: None,
            analyzed: BTreeSet::new(),
        }
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Numeric states of a method, available after the analysis has run
    pub fn analysis(&self, method: usize) -> Option<&NumericalAnalysis<N>> {
        self.analyses.as_ref()?.get(&method)
    }

    fn analyze_methods(&self) -> EngineResult<BTreeMap<usize, NumericalAnalysis<N>>> {
        let methods: Vec<_> = self.class.methods.iter().enumerate().collect();
        let resolver = &self.resolver;
        let results: Vec<_> = if *PARALLEL {
            methods
                .into_par_iter()
                .map(|(id, method)| NumericalAnalysis::analyze(id, method, resolver))
                .collect::<EngineResult<_>>()?
        } else {
            methods
                .into_iter()
                .map(|(id, method)| NumericalAnalysis::analyze(id, method, resolver))
                .collect::<EngineResult<_>>()?
        };
        Ok(results
            .into_iter()
            .flatten()
            .map(|analysis| (analysis.method(), analysis))
            .collect())
    }

    /// Compute the fixedpoint states needed by the property, once for all properties
    pub fn run_numerical_analysis(&mut self, property: Property) -> EngineResult<()> {
        if self.analyses.is_none() {
            let tracer = Tracer::new(format!("numerical analysis of {}", self.class.name));
            self.analyses = Some(self.analyze_methods()?);
            info!(
                "numerical analysis of {} done in {}ms",
                self.class.name,
                tracer.elapsed_ms()
            );
        }
        self.analyzed.insert(property);
        Ok(())
    }

    /// Analyze (if needed) and decide the property
    pub fn check(&mut self, property: Property) -> EngineResult<bool> {
        self.run_numerical_analysis(property)?;
        let _tracer = Tracer::new(format!("checking {} on {}", property, self.class.name));
        let holds = match property {
            Property::StartEndOrder => self.check_start_end_order()?,
            Property::AfterStart => self.check_after_start()?,
            Property::BeforeEnd => self.check_before_end()?,
        };
        info!("{} of {}: {}", property, self.class.name, holds);
        Ok(holds)
    }

    fn analysis_of(&self, method: usize) -> EngineResult<&NumericalAnalysis<N>> {
        self.analysis(method).ok_or_else(|| {
            EngineError::InvariantViolation(format!("method #{} is not analyzed", method))
        })
    }

    /// Initializers a query may be about, rejecting receivers that resolve to none
    fn resolve_query(&self, query: &QuerySite) -> EngineResult<Vec<&Initializer>> {
        let resolved = self.resolver.resolve(query.site, &query.receiver);
        if resolved.is_empty() && !self.settings.allow_unresolved_receivers {
            return Err(EngineError::NotSupportedYet(
                Unsupported::UnresolvedReceiver(format!(
                    "{} at {}",
                    query.receiver, query.site
                )),
            ));
        }
        Ok(resolved)
    }

    /// Run `decide` on every (query, initializer) pair until one fails
    fn check_queries<F>(&self, decide: F) -> EngineResult<bool>
    where
        F: Fn(&N, &Term, &Initializer) -> EngineResult<bool>,
    {
        for method in 0..self.class.methods.len() {
            let queries = self.resolver.queries_of(method);
            if queries.is_empty() {
                continue;
            }
            let analysis = self.analysis_of(method)?;
            for query in queries {
                let state = analysis.fall_after(query.site.index);
                let time = compile_expression(&query.time)?;
                for init in self.resolve_query(query)? {
                    let holds = decide(state, &time, init)?;
                    debug!(
                        "query {} at {} on {}: {}",
                        time, query.site, init, holds
                    );
                    if !holds {
                        return Ok(false);
                    }
                }
            }
        }
        Ok(true)
    }

    /// `end >= start` right after each construction
    pub fn check_start_end_order(&self) -> EngineResult<bool> {
        if !self.analyzed.contains(&Property::StartEndOrder) {
            return Ok(false);
        }
        for init in self.resolver.initializers() {
            let analysis = self.analysis_of(init.site.method)?;
            let state = analysis.fall_after(init.site.index);
            let end = compile_expression(&init.end)?;
            let holds = entails_ge(state, &end, &Term::Const(init.start as i64))?;
            debug!(
                "{} at {}: {} >= {}: {}",
                init, init.site, end, init.start, holds
            );
            if !holds {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// `time >= start` at each query
    pub fn check_after_start(&self) -> EngineResult<bool> {
        if !self.analyzed.contains(&Property::AfterStart) {
            return Ok(false);
        }
        self.check_queries(|state, time, init| {
            entails_ge(state, time, &Term::Const(init.start as i64))
        })
    }

    /// `end >= time` at each query
    pub fn check_before_end(&self) -> EngineResult<bool> {
        if !self.analyzed.contains(&Property::BeforeEnd) {
            return Ok(false);
        }
        self.check_queries(|state, time, init| {
            let end = match init.end.as_int() {
                Some(v) => Term::Const(v as i64),
                None => Term::Var(init.ghost()),
            };
            entails_ge(state, &end, time)
        })
    }
}
