//! Which interval objects a reference may denote
//!
//! Allocation sites are tracked by a flow-sensitive points-to analysis, and the
//! resolver maps them to the constructor calls that initialize them.

pub mod pointsto;
pub mod resolver;
