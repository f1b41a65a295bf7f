//! Elaboration and call-graph lowering for `UntimedModule` circuit
//! descriptions: turns Method-IO / Method-Call annotations into
//! instantiated submodules and concrete wiring (see [`collect_calls`]).

pub mod annotations;
pub mod collect_calls;
pub mod errors;
pub mod ir;

pub use collect_calls::collect_calls;
