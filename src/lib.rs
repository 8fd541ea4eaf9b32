pub mod config;
mod core;
pub mod emit;
pub mod generate;

pub use crate::core::{
    disjunction::{BranchOp, Disjunction, DisjunctionError, Translation},
    gate::Gate,
    wire::Wire,
};
pub use emit::{
    Artifacts, Backend, CdnBackend, CompileError, Ctx, GenericBackend, compile,
};
