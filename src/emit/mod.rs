pub mod backend;
mod ctx;
pub mod runner;
pub mod script;

pub use backend::{Backend, CdnBackend, CompileError, GenericBackend, compile};
pub use ctx::{Artifacts, Ctx};
