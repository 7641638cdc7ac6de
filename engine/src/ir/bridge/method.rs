use crate::error::{EngineError, EngineResult};
use crate::ir::adapter;
use crate::ir::bridge::cfg::ControlFlowGraph;
use crate::ir::bridge::instruction::{Context, Instruction};
use crate::ir::bridge::shared::Identifier;
use crate::ir::bridge::typing::Type;
use timeguard_shared::config::CONSTRUCTOR_NAME;

/// Instructions of a concrete method and the CFG over them
pub struct Body {
    pub instructions: Vec<Instruction>,
    pub cfg: ControlFlowGraph,
}

/// An adapted representation of a method
pub struct Method {
    /// method name
    pub name: Identifier,
    /// parameter types
    pub params: Vec<Type>,
    /// body of the method (absent for abstract or native methods)
    pub body: Option<Body>,
}

impl Method {
    pub fn convert(method: &adapter::class::Method) -> EngineResult<Self> {
        let adapter::class::Method {
            name,
            params,
            locals,
            body,
        } = method;

        let params_new: Vec<_> = params.iter().map(Type::convert).collect();
        // qualified names are reserved for ghost variables
        if let Some(local) = locals.keys().find(|k| Identifier::from(*k).is_member()) {
            return Err(EngineError::InvalidAssumption(format!(
                "invalid local name {} in {}",
                local, name
            )));
        }
        let body_new = match body {
            None => None,
            Some(insts) => {
                let ctxt = Context {
                    method: name,
                    locals: locals
                        .iter()
                        .map(|(k, v)| (k.clone(), Type::convert(v)))
                        .collect(),
                    params: &params_new,
                    length: insts.len(),
                };
                let instructions = insts
                    .iter()
                    .map(|inst| ctxt.parse_instruction(inst))
                    .collect::<EngineResult<Vec<_>>>()?;
                let cfg = ControlFlowGraph::build(name, &instructions)?;
                Some(Body { instructions, cfg })
            }
        };

        Ok(Self {
            name: name.into(),
            params: params_new,
            body: body_new,
        })
    }

    pub fn is_constructor(&self) -> bool {
        self.name.as_ref() == CONSTRUCTOR_NAME
    }

    /// Instruction stream, empty for methods without a body
    pub fn instructions(&self) -> &[Instruction] {
        match &self.body {
            None => &[],
            Some(body) => &body.instructions,
        }
    }
}
