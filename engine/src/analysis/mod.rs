//
// Abstract Interpretation framework
//
pub mod compile;
pub mod domain;
pub mod environment;
pub mod generic;
pub mod numerical;
pub mod octagon;
