use std::marker::PhantomData;
use std::sync::Arc;

use log::info;

use crate::analysis::compile::{compile_condition, compile_expression};
use crate::analysis::domain::{Environment, NumericDomain};
use crate::analysis::environment::build_environment;
use crate::analysis::generic::{execute, AbstractDomain, FlowAnalysis, FlowOut, FlowResult};
use crate::error::{EngineError, EngineResult, Unsupported};
use crate::ir::bridge::cfg::ControlFlowGraph;
use crate::ir::bridge::class::Site;
use crate::ir::bridge::instruction::{Instruction, Invoke, InvokeKind};
use crate::ir::bridge::method::Method;
use crate::ir::bridge::typing::Type;
use crate::ir::bridge::value::{Expr, Place};
use crate::pointer::resolver::Resolver;
use timeguard_shared::config::CONSTRUCTOR_NAME;
use timeguard_shared::logging::Tracer;

/// Number of visits of a loop header before join is replaced by widening
pub const WIDENING_THRESHOLD: usize = 6;

/// Transfer functions of integer locals over a numeric domain
struct NumericalTransfer<'a, N: NumericDomain> {
    method: usize,
    env: Arc<Environment>,
    cfg: &'a ControlFlowGraph,
    resolver: &'a Resolver,
    _domain: PhantomData<N>,
}

impl<'a, N: NumericDomain> NumericalTransfer<'a, N> {
    fn transfer_assign(&self, target: &Place, value: &Expr, incoming: &N) -> EngineResult<N> {
        let local = match target {
            Place::Local(local) => local,
            Place::Field { .. } => {
                return Err(EngineError::NotSupportedYet(Unsupported::AssignToField(
                    format!("{} = {}", target, value),
                )));
            }
            Place::StaticField { .. } => {
                return Err(EngineError::NotSupportedYet(
                    Unsupported::AssignToNonLocal(format!("{} = {}", target, value)),
                ));
            }
            Place::ArrayElement { .. } => {
                return Err(EngineError::NotSupportedYet(
                    Unsupported::AssignToArrayElement(format!("{} = {}", target, value)),
                ));
            }
        };

        match &local.ty {
            Type::Int => (),
            Type::Double => {
                return Err(EngineError::NotSupportedYet(Unsupported::AssignToDouble(
                    format!("{} = {}", target, value),
                )));
            }
            Type::Array(_) => {
                return Err(EngineError::NotSupportedYet(Unsupported::AssignToArray(
                    format!("{} = {}", target, value),
                )));
            }
            // references are the business of the points-to analysis
            Type::Object(_) => return Ok(incoming.clone()),
        }

        // parameters are unconstrained on entry
        if matches!(value, Expr::Param { .. }) {
            return Ok(incoming.clone());
        }
        let term = compile_expression(value)?;
        incoming.assign(&local.name, &term)
    }

    fn transfer_invoke(&self, index: usize, invoke: &Invoke, incoming: &N) -> EngineResult<N> {
        match invoke.kind {
            InvokeKind::Virtual => Ok(incoming.clone()),
            InvokeKind::Special if invoke.method.as_ref() == CONSTRUCTOR_NAME => {
                let site = Site {
                    method: self.method,
                    index,
                };
                match self.resolver.initializer_at(site) {
                    None => Ok(incoming.clone()),
                    Some(init) => {
                        let end = compile_expression(&init.end)?;
                        let assigned = incoming.assign(&init.ghost(), &end)?;
                        // objects built on earlier iterations share the ghost
                        if self.cfg.is_on_cycle(index) {
                            incoming.join(&assigned)
                        } else {
                            Ok(assigned)
                        }
                    }
                }
            }
            InvokeKind::Special | InvokeKind::Static | InvokeKind::Interface => Err(
                EngineError::NotSupportedYet(Unsupported::Invocation(invoke.to_string())),
            ),
        }
    }
}

impl<'a, N: NumericDomain> FlowAnalysis for NumericalTransfer<'a, N> {
    type Domain = N;

    fn bottom(&self) -> N {
        N::bottom(&self.env)
    }

    fn entry(&self) -> N {
        N::top(&self.env)
    }

    fn transfer(
        &self,
        index: usize,
        inst: &Instruction,
        incoming: &N,
    ) -> EngineResult<FlowOut<N>> {
        let out = match inst {
            Instruction::Assign { target, value } => FlowOut {
                fall: Some(self.transfer_assign(target, value, incoming)?),
                branch: None,
            },
            Instruction::If { cond, .. } => {
                let (taken, otherwise) = compile_condition(cond)?;
                FlowOut {
                    fall: Some(incoming.meet(&otherwise)?),
                    branch: Some(incoming.meet(&taken)?),
                }
            }
            Instruction::Goto { .. } => FlowOut {
                fall: None,
                branch: Some(incoming.clone()),
            },
            Instruction::Invoke(invoke) => FlowOut {
                fall: Some(self.transfer_invoke(index, invoke, incoming)?),
                branch: None,
            },
            Instruction::ReturnVoid => FlowOut {
                fall: Some(incoming.clone()),
                branch: None,
            },
            Instruction::Return { .. } | Instruction::Throw { .. } => {
                return Err(EngineError::NotSupportedYet(Unsupported::Statement(
                    inst.to_string(),
                )));
            }
        };
        Ok(out)
    }
}

/// Fixedpoint numeric states of one method
pub struct NumericalAnalysis<N: NumericDomain> {
    method: usize,
    env: Arc<Environment>,
    result: FlowResult<N>,
}

impl<N: NumericDomain> NumericalAnalysis<N> {
    /// Analyze a method of the class, `None` if it has no body
    pub fn analyze(
        id: usize,
        method: &Method,
        resolver: &Resolver,
    ) -> EngineResult<Option<Self>> {
        let Some(body) = &method.body else {
            return Ok(None);
        };

        let tracer = Tracer::new(format!("numerical analysis of {}", method.name));
        let env = Arc::new(build_environment(method, &resolver.initializers_of(id))?);
        tracer.log(&format!("environment {}", env));
        let transfer = NumericalTransfer::<N> {
            method: id,
            env: env.clone(),
            cfg: &body.cfg,
            resolver,
            _domain: PhantomData,
        };
        let result = execute(&transfer, body, Some(WIDENING_THRESHOLD))?;
        info!(
            "analyzed {} over {} in {} steps",
            method.name,
            env,
            result.steps()
        );
        Ok(Some(Self {
            method: id,
            env,
            result,
        }))
    }

    pub fn method(&self) -> usize {
        self.method
    }

    pub fn env(&self) -> &Arc<Environment> {
        &self.env
    }

    pub fn steps(&self) -> usize {
        self.result.steps()
    }

    pub fn incoming(&self, index: usize) -> &N {
        self.result.incoming(index)
    }

    /// State on the fall-through edge of an instruction
    pub fn fall_after(&self, index: usize) -> &N {
        self.result.fall_after(index)
    }

    /// State on the taken-branch edge of an instruction
    pub fn branch_after(&self, index: usize) -> &N {
        self.result.branch_after(index)
    }
}
