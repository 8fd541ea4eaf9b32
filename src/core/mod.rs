pub mod disjunction;
pub mod gate;
pub mod wire;
