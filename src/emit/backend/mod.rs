//! Emission backends. Both walk the flat gate list in ascending wire
//! order and share the translator and the additive-sharing primitives;
//! they differ only in the shape of the produced artifacts.

use log::info;

use crate::{
    Gate,
    core::disjunction::DisjunctionError,
    emit::{Artifacts, Ctx, runner::FuncSig},
};

mod cdn;
mod generic;

pub use cdn::CdnBackend;
pub use generic::GenericBackend;

#[derive(Clone, Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error(transparent)]
    Disjunction(#[from] DisjunctionError),
    #[error("{kind} gate at wire {wire} not supported at top level by the {backend} backend")]
    UnsupportedTopLevel {
        wire: usize,
        kind: &'static str,
        backend: &'static str,
    },
}
pub type CompileError = Error;

/// One emission strategy over the shared gate-list walk.
///
/// `prologue` sees the whole program so a backend can size its runtime
/// state up front; `emit_gate` receives the wire index of the gate's first
/// output. A failing `emit_gate` aborts compilation before any artifact
/// text exists.
pub trait Backend {
    fn name(&self) -> &'static str;

    fn signature(&self) -> FuncSig;

    fn prologue(&mut self, ctx: &mut Ctx, gates: &[Gate]);

    fn emit_gate(&mut self, ctx: &mut Ctx, wire: usize, gate: &Gate) -> Result<(), Error>;

    fn epilogue(&mut self, ctx: &mut Ctx);
}

/// Compile a gate program into its two artifacts.
///
/// Statements are emitted strictly in ascending wire order; a disjunction
/// advances the wire cursor by its branch size, one position per internal
/// gate.
pub fn compile<B: Backend>(
    mut backend: B,
    players: usize,
    prime: u64,
    gates: &[Gate],
) -> Result<Artifacts, Error> {
    let mut ctx = Ctx::new(players, prime);
    info!(
        "compiling {} gates for {players} players over F_{prime} ({} backend)",
        gates.len(),
        backend.name()
    );

    backend.prologue(&mut ctx, gates);
    let mut wire = 0;
    for gate in gates {
        backend.emit_gate(&mut ctx, wire, gate)?;
        wire += gate.width();
    }
    backend.epilogue(&mut ctx);

    Ok(ctx.finish(&backend.signature()))
}

/// Total number of wire positions a program occupies.
pub(crate) fn wire_count(gates: &[Gate]) -> usize {
    gates.iter().map(Gate::width).sum()
}
