use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;

use log::trace;

use crate::error::EngineResult;
use crate::ir::bridge::cfg::Edge;
use crate::ir::bridge::instruction::Instruction;
use crate::ir::bridge::method::Body;

/// An abstract domain which forms a lattice
pub trait AbstractDomain: Clone + Eq + Debug {
    /// Join two abstract values
    fn join(&self, other: &Self) -> EngineResult<Self>;

    /// Widening of two abstract values, `self` being the older one
    fn widen(&self, other: &Self) -> EngineResult<Self>;
}

//
// Abstract Domain Combinators
//

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct FiniteSetDomain<A: Ord + Clone + Debug> {
    pub elements: BTreeSet<A>,
}

impl<A: Ord + Clone + Debug> FiniteSetDomain<A> {
    pub fn empty() -> Self {
        Self {
            elements: BTreeSet::new(),
        }
    }

    pub fn singleton(item: A) -> Self {
        Self {
            elements: BTreeSet::from([item]),
        }
    }
}

impl<A: Ord + Clone + Debug> AbstractDomain for FiniteSetDomain<A> {
    fn join(&self, other: &Self) -> EngineResult<Self> {
        let mut new_elements = self.elements.clone();
        new_elements.extend(other.elements.iter().cloned());
        Ok(FiniteSetDomain {
            elements: new_elements,
        })
    }

    fn widen(&self, other: &Self) -> EngineResult<Self> {
        // finite height, join is enough
        self.join(other)
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct MapDomain<K: Ord + Clone + Debug, V: AbstractDomain> {
    pub map: BTreeMap<K, V>,
}

impl<K: Ord + Clone + Debug, V: AbstractDomain> MapDomain<K, V> {
    pub fn empty() -> Self {
        Self {
            map: BTreeMap::new(),
        }
    }
}

impl<K: Ord + Clone + Debug, V: AbstractDomain> AbstractDomain for MapDomain<K, V> {
    fn join(&self, other: &Self) -> EngineResult<Self> {
        let mut new_map = self.map.clone();
        for (k, v) in &other.map {
            let merged = match new_map.get(k) {
                None => v.clone(),
                Some(existing) => existing.join(v)?,
            };
            new_map.insert(k.clone(), merged);
        }
        Ok(MapDomain { map: new_map })
    }

    fn widen(&self, other: &Self) -> EngineResult<Self> {
        let mut new_map = self.map.clone();
        for (k, v) in &other.map {
            let merged = match new_map.get(k) {
                None => v.clone(),
                Some(existing) => existing.widen(v)?,
            };
            new_map.insert(k.clone(), merged);
        }
        Ok(MapDomain { map: new_map })
    }
}

/// States leaving an instruction, one per kind of outgoing edge
pub struct FlowOut<D> {
    pub fall: Option<D>,
    pub branch: Option<D>,
}

impl<D: Clone> FlowOut<D> {
    /// Same state on every outgoing edge
    pub fn uniform(state: D) -> Self {
        Self {
            fall: Some(state.clone()),
            branch: Some(state),
        }
    }
}

/// A forward, branch-sensitive dataflow problem over the instructions of one method
pub trait FlowAnalysis {
    type Domain: AbstractDomain;

    /// State of instructions not reached (yet)
    fn bottom(&self) -> Self::Domain;

    /// State flowing into the entry instruction
    fn entry(&self) -> Self::Domain;

    /// Transfer function of one instruction
    fn transfer(
        &self,
        index: usize,
        inst: &Instruction,
        incoming: &Self::Domain,
    ) -> EngineResult<FlowOut<Self::Domain>>;
}

/// (Incoming, Fall-through outgoing, Branch outgoing)
#[derive(Eq, PartialEq, Clone, Debug)]
pub struct NodeState<D: AbstractDomain> {
    pub incoming: D,
    pub fall: D,
    pub branch: D,
}

impl<D: AbstractDomain> NodeState<D> {
    fn outgoing(&self, edge: Edge) -> &D {
        match edge {
            Edge::Fallthrough => &self.fall,
            Edge::Branch => &self.branch,
        }
    }

    fn outgoing_mut(&mut self, edge: Edge) -> &mut D {
        match edge {
            Edge::Fallthrough => &mut self.fall,
            Edge::Branch => &mut self.branch,
        }
    }
}

/// Per loop header: how many times its incoming state was recomputed, and the last one
struct LoopHead<D> {
    visits: usize,
    last: D,
}

/// Fixedpoint states of a method, only obtainable once the iteration has stabilized
pub struct FlowResult<D: AbstractDomain> {
    states: Vec<NodeState<D>>,
    steps: usize,
}

impl<D: AbstractDomain> FlowResult<D> {
    pub fn incoming(&self, index: usize) -> &D {
        &self.states[index].incoming
    }

    /// State on the fall-through edge after the instruction
    pub fn fall_after(&self, index: usize) -> &D {
        &self.states[index].fall
    }

    /// State on the taken-branch edge after the instruction
    pub fn branch_after(&self, index: usize) -> &D {
        &self.states[index].branch
    }

    /// Number of instructions processed until the fixedpoint was reached
    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

/// Worklist iteration over one method body
pub struct FixedPoint<'a, A: FlowAnalysis> {
    analysis: &'a A,
    body: &'a Body,
    /// number of visits of a loop header after which widening replaces join
    threshold: Option<usize>,
    states: Vec<NodeState<A::Domain>>,
    loop_heads: Vec<Option<LoopHead<A::Domain>>>,
}

impl<'a, A: FlowAnalysis> FixedPoint<'a, A> {
    pub fn new(analysis: &'a A, body: &'a Body, threshold: Option<usize>) -> Self {
        let size = body.instructions.len();
        let bottom = analysis.bottom();
        let states = (0..size)
            .map(|_| NodeState {
                incoming: bottom.clone(),
                fall: bottom.clone(),
                branch: bottom.clone(),
            })
            .collect();
        let loop_heads = (0..size)
            .map(|i| {
                body.cfg.is_loop_head(i).then(|| LoopHead {
                    visits: 0,
                    last: bottom.clone(),
                })
            })
            .collect();
        Self {
            analysis,
            body,
            threshold,
            states,
            loop_heads,
        }
    }

    /// Join all incoming edges, widening at loop headers once past the threshold
    fn merge(&mut self, index: usize) -> EngineResult<A::Domain> {
        let cfg = &self.body.cfg;
        let mut merged = if index == cfg.entry() {
            self.analysis.entry()
        } else {
            self.analysis.bottom()
        };
        for (pred, edge) in cfg.predecessors(index) {
            merged = merged.join(self.states[pred].outgoing(edge))?;
        }

        if let Some(head) = self.loop_heads[index].as_mut() {
            head.visits += 1;
            if matches!(self.threshold, Some(limit) if head.visits >= limit) {
                merged = head.last.widen(&merged)?;
                trace!("widening at loop head {} (visit {})", index, head.visits);
            }
            head.last = merged.clone();
        }
        Ok(merged)
    }

    /// Compute a forward iterated fixedpoint
    pub fn run(mut self) -> EngineResult<FlowResult<A::Domain>> {
        // every instruction is interpreted at least once
        let mut worklist: BTreeSet<usize> = (0..self.states.len()).collect();
        let mut steps = 0;

        while let Some(index) = worklist.pop_first() {
            steps += 1;
            let incoming = self.merge(index)?;
            let inst = &self.body.instructions[index];
            let FlowOut { fall, branch } = self.analysis.transfer(index, inst, &incoming)?;
            trace!("[{}] {} => {:?} / {:?}", index, inst, fall, branch);

            let node = &mut self.states[index];
            node.incoming = incoming;
            let mut changed = BTreeSet::new();
            for (edge, outgoing) in [(Edge::Fallthrough, fall), (Edge::Branch, branch)] {
                let Some(outgoing) = outgoing else {
                    continue;
                };
                let slot = node.outgoing_mut(edge);
                if *slot != outgoing {
                    *slot = outgoing;
                    changed.insert(edge);
                }
            }

            for (succ, edge) in self.body.cfg.successors(index) {
                if changed.contains(&edge) {
                    worklist.insert(succ);
                }
            }
        }

        Ok(FlowResult {
            states: self.states,
            steps,
        })
    }
}

/// Run a forward analysis on a method body until a fixedpoint
pub fn execute<A: FlowAnalysis>(
    analysis: &A,
    body: &Body,
    threshold: Option<usize>,
) -> EngineResult<FlowResult<A::Domain>> {
    FixedPoint::new(analysis, body, threshold).run()
}
