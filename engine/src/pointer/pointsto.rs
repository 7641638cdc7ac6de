use std::collections::{BTreeMap, BTreeSet};

use log::debug;

use crate::analysis::generic::{
    execute, FiniteSetDomain, FlowAnalysis, FlowOut, FlowResult, MapDomain,
};
use crate::error::EngineResult;
use crate::ir::bridge::class::{Class, Site};
use crate::ir::bridge::instruction::Instruction;
use crate::ir::bridge::shared::Identifier;
use crate::ir::bridge::typing::Type;
use crate::ir::bridge::value::{Expr, Local, Place};

/// An abstract heap object, identified by the site of its allocation
#[derive(Eq, PartialEq, Ord, PartialOrd, Hash, Copy, Clone, Debug)]
pub struct AllocNode(pub Site);

/// Source of may-alias facts about reference locals
pub trait PointsToOracle: Send + Sync {
    /// Allocation nodes `local` may reference right before the instruction at `site`
    fn nodes_at(&self, site: Site, local: &Local) -> BTreeSet<AllocNode>;
}

type PointsToState = MapDomain<Identifier, FiniteSetDomain<AllocNode>>;

fn is_reference(ty: &Type) -> bool {
    matches!(ty, Type::Object(_) | Type::Array(_))
}

/// Allocation-site abstraction with strong update of locals
struct PointsToTransfer {
    method: usize,
}

impl FlowAnalysis for PointsToTransfer {
    type Domain = PointsToState;

    fn bottom(&self) -> Self::Domain {
        MapDomain::empty()
    }

    fn entry(&self) -> Self::Domain {
        MapDomain::empty()
    }

    fn transfer(
        &self,
        index: usize,
        inst: &Instruction,
        incoming: &Self::Domain,
    ) -> EngineResult<FlowOut<Self::Domain>> {
        let mut state = incoming.clone();
        if let Instruction::Assign {
            target: Place::Local(local),
            value,
        } = inst
        {
            if is_reference(&local.ty) {
                let nodes = match value {
                    Expr::New(_) | Expr::NewArray { .. } => {
                        FiniteSetDomain::singleton(AllocNode(Site {
                            method: self.method,
                            index,
                        }))
                    }
                    Expr::Local(src) => incoming
                        .map
                        .get(&src.name)
                        .cloned()
                        .unwrap_or_else(FiniteSetDomain::empty),
                    // parameters, fields, nulls, etc. denote no local allocation
                    _ => FiniteSetDomain::empty(),
                };
                state.map.insert(local.name.clone(), nodes);
            }
        }
        Ok(FlowOut::uniform(state))
    }
}

/// Flow-sensitive, intra-procedural points-to facts of every method in a class
pub struct FlowPointsTo {
    results: BTreeMap<usize, FlowResult<PointsToState>>,
}

impl FlowPointsTo {
    pub fn analyze(class: &Class) -> EngineResult<Self> {
        let mut results = BTreeMap::new();
        for (id, method) in class.methods.iter().enumerate() {
            let Some(body) = &method.body else {
                continue;
            };
            let result = execute(&PointsToTransfer { method: id }, body, None)?;
            debug!(
                "points-to of {} stabilized after {} steps",
                method.name,
                result.steps()
            );
            results.insert(id, result);
        }
        Ok(Self { results })
    }
}

impl PointsToOracle for FlowPointsTo {
    fn nodes_at(&self, site: Site, local: &Local) -> BTreeSet<AllocNode> {
        self.results
            .get(&site.method)
            .filter(|result| site.index < result.len())
            .and_then(|result| result.incoming(site.index).map.get(&local.name))
            .map(|nodes| nodes.elements.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::flow::shared::convert;

    fn interval(name: &str) -> Local {
        Local {
            name: name.into(),
            ty: Type::Object("Interval".into()),
        }
    }

    #[test]
    fn copy_and_strong_update() {
        let class = convert(json!({
            "name": "Pointer",
            "methods": [{
                "name": "m",
                "locals": {
                    "e": {"object": "Interval"},
                    "foo": {"object": "Interval"}
                },
                "body": [
                    {"assign": {"target": {"local": "e"}, "value": {"new": "Interval"}}},
                    {"assign": {"target": {"local": "foo"}, "value": {"new": "Interval"}}},
                    {"assign": {"target": {"local": "foo"}, "value": {"local": "e"}}},
                    {"assign": {"target": {"local": "e"}, "value": "null"}},
                    "return_void"
                ]
            }]
        }))
        .unwrap();
        let pta = FlowPointsTo::analyze(&class).unwrap();
        let node_e = AllocNode(Site {
            method: 0,
            index: 0,
        });
        let node_foo = AllocNode(Site {
            method: 0,
            index: 1,
        });
        let at = |index| Site { method: 0, index };

        assert!(pta.nodes_at(at(0), &interval("e")).is_empty());
        assert_eq!(pta.nodes_at(at(2), &interval("foo")), BTreeSet::from([node_foo]));
        assert_eq!(pta.nodes_at(at(3), &interval("foo")), BTreeSet::from([node_e]));
        assert_eq!(pta.nodes_at(at(3), &interval("e")), BTreeSet::from([node_e]));
        assert!(pta.nodes_at(at(4), &interval("e")).is_empty());
        assert!(pta.nodes_at(at(9), &interval("e")).is_empty());
    }

    #[test]
    fn merge_of_branches() {
        let class = convert(json!({
            "name": "Branch",
            "methods": [{
                "name": "m",
                "params": ["int"],
                "locals": {
                    "k": "int",
                    "e": {"object": "Interval"}
                },
                "body": [
                    {"assign": {"target": {"local": "k"}, "value": {"param": 0}}},
                    {"if": {"cond": {"gt": [{"local": "k"}, {"int": 0}]}, "target": 4}},
                    {"assign": {"target": {"local": "e"}, "value": {"new": "Interval"}}},
                    {"goto": {"target": 5}},
                    {"assign": {"target": {"local": "e"}, "value": {"new": "Interval"}}},
                    "return_void"
                ]
            }]
        }))
        .unwrap();
        let pta = FlowPointsTo::analyze(&class).unwrap();
        let nodes = pta.nodes_at(
            Site {
                method: 0,
                index: 5,
            },
            &interval("e"),
        );
        assert_eq!(nodes.len(), 2);
    }
}
