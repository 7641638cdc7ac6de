use std::collections::BTreeSet;

use petgraph::algo::dominators::simple_fast;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use crate::error::{EngineError, EngineResult};
use crate::ir::bridge::instruction::Instruction;

/// A representation of CFG edges
#[derive(Eq, PartialEq, Ord, PartialOrd, Hash, Copy, Clone, Debug)]
pub enum Edge {
    /// control continues with the next instruction in sequence
    Fallthrough,
    /// control follows an explicit jump (taken branch or goto)
    Branch,
}

/// Control-flow graph over the instructions of one method, one node per instruction
pub struct ControlFlowGraph {
    graph: DiGraph<usize, Edge>,
    /// instruction index to index in the graph
    nodes: Vec<NodeIndex>,
    /// targets of back edges
    loop_heads: BTreeSet<usize>,
    /// instructions that may execute more than once
    on_cycle: BTreeSet<usize>,
}

impl ControlFlowGraph {
    pub fn build(method: &str, instructions: &[Instruction]) -> EngineResult<Self> {
        if instructions.is_empty() {
            return Err(EngineError::InvariantViolation(format!(
                "empty body in method `{}`",
                method
            )));
        }

        let mut graph = DiGraph::new();
        let nodes: Vec<_> = (0..instructions.len()).map(|i| graph.add_node(i)).collect();

        // collect the edges
        for (i, inst) in instructions.iter().enumerate() {
            if inst.falls_through() {
                let next = i + 1;
                if next >= instructions.len() {
                    return Err(EngineError::InvariantViolation(format!(
                        "control falls off the end of method `{}`",
                        method
                    )));
                }
                graph.add_edge(nodes[i], nodes[next], Edge::Fallthrough);
            }
            if let Some(target) = inst.branch_target() {
                let dst = nodes.get(target).ok_or_else(|| {
                    EngineError::InvariantViolation(format!(
                        "branch target {} out of range in method `{}`",
                        target, method
                    ))
                })?;
                graph.add_edge(nodes[i], *dst, Edge::Branch);
            }
        }

        // a back edge goes into a node that dominates its source
        let dominators = simple_fast(&graph, nodes[0]);
        let mut loop_heads = BTreeSet::new();
        for edge in graph.edge_references() {
            let is_back_edge = match dominators.dominators(edge.source()) {
                None => false,
                Some(mut doms) => doms.any(|d| d == edge.target()),
            };
            if is_back_edge {
                loop_heads.insert(graph[edge.target()]);
            }
        }

        let mut on_cycle = BTreeSet::new();
        for scc in tarjan_scc(&graph) {
            let cyclic = match scc.as_slice() {
                [node] => graph.contains_edge(*node, *node),
                _ => true,
            };
            if cyclic {
                on_cycle.extend(scc.iter().map(|n| graph[*n]));
            }
        }

        Ok(Self {
            graph,
            nodes,
            loop_heads,
            on_cycle,
        })
    }

    /// Number of instructions covered by this graph
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The unique entry instruction
    pub fn entry(&self) -> usize {
        0
    }

    fn neighbors(&self, index: usize, dir: Direction) -> Vec<(usize, Edge)> {
        let mut result: Vec<_> = self
            .graph
            .edges_directed(self.nodes[index], dir)
            .map(|e| {
                let other = match dir {
                    Direction::Outgoing => e.target(),
                    Direction::Incoming => e.source(),
                };
                (self.graph[other], *e.weight())
            })
            .collect();
        result.sort();
        result
    }

    /// Successor instructions together with the kind of edge leading to them
    pub fn successors(&self, index: usize) -> Vec<(usize, Edge)> {
        self.neighbors(index, Direction::Outgoing)
    }

    /// Predecessor instructions together with the kind of edge leaving them
    pub fn predecessors(&self, index: usize) -> Vec<(usize, Edge)> {
        self.neighbors(index, Direction::Incoming)
    }

    pub fn loop_heads(&self) -> &BTreeSet<usize> {
        &self.loop_heads
    }

    pub fn is_loop_head(&self, index: usize) -> bool {
        self.loop_heads.contains(&index)
    }

    /// Whether the instruction lies on a cycle of the graph
    pub fn is_on_cycle(&self, index: usize) -> bool {
        self.on_cycle.contains(&index)
    }
}
