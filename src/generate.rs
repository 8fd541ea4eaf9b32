//! Random branch and program generation for benchmarks and tests.
//!
//! Branches are uniform Add/Mul circuits over a growing operand pool; the
//! `blocks` schedule controls when freshly produced outputs join the pool,
//! which shapes the level structure the translator discovers.

use rand::{Rng, seq::IndexedRandom};

use crate::{
    Gate, Wire,
    core::disjunction::{Disjunction, DisjunctionError},
};

/// Generate `length` random Add/Mul gates over `wires`.
///
/// Outputs accumulate in blocks of the sizes yielded by `blocks`; once a
/// block fills, its outputs join the operand pool (or replace it entirely
/// when `leveled` is set, forcing every later gate to depend on the block).
pub fn random_circuit<R: Rng>(
    rng: &mut R,
    wires: &[Wire],
    start: usize,
    mut blocks: impl Iterator<Item = usize>,
    length: usize,
    leveled: bool,
) -> Vec<Gate> {
    let mut gates = Vec::with_capacity(length);
    let mut pool: Vec<Wire> = wires.to_vec();
    let mut outputs: Vec<Wire> = Vec::new();
    let mut next_block = blocks.next();

    for i in 0..length {
        let l = *pool.choose(rng).expect("operand pool is never empty");
        let r = *pool.choose(rng).expect("operand pool is never empty");
        gates.push(if rng.random_range(0..2) == 0 {
            Gate::Add { l, r }
        } else {
            Gate::Mul { l, r }
        });

        outputs.push(Wire(start + i));
        if let Some(block) = next_block {
            if outputs.len() >= block {
                if leveled {
                    pool = std::mem::take(&mut outputs);
                } else {
                    pool.append(&mut outputs);
                }
                next_block = blocks.next();
            }
        }
    }

    gates
}

/// A disjunction whose branches all share one fixed block size.
pub fn random_disjunction<R: Rng>(
    rng: &mut R,
    selector: Vec<Wire>,
    wires: &[Wire],
    start: usize,
    per_block: usize,
    length: usize,
) -> Result<Disjunction, DisjunctionError> {
    let branches = (0..selector.len())
        .map(|_| random_circuit(rng, wires, start, std::iter::repeat(per_block), length, false))
        .collect();
    Disjunction::new(selector, branches)
}

/// A disjunction with halving block sizes, starting wide: blocks of
/// `2^log_length, 2^(log_length-1), .., 1`, total length `2^(log_length+1) - 1`.
pub fn leveled_disjunction<R: Rng>(
    rng: &mut R,
    selector: Vec<Wire>,
    wires: &[Wire],
    start: usize,
    log_length: usize,
) -> Result<Disjunction, DisjunctionError> {
    let blocks: Vec<usize> = (0..=log_length).rev().map(|i| 1 << i).collect();
    let length = (1 << (log_length + 1)) - 1;
    let branches = (0..selector.len())
        .map(|_| random_circuit(rng, wires, start, blocks.iter().copied(), length, false))
        .collect();
    Disjunction::new(selector, branches)
}

/// The benchmark program shape: three data inputs from party 0, one
/// selector input per branch from party 1, one leveled disjunction over
/// everything, and a reveal of the last internal gate.
pub fn benchmark_program<R: Rng>(
    rng: &mut R,
    branches: usize,
    log_length: usize,
) -> Result<Vec<Gate>, DisjunctionError> {
    let start = 3 + branches;
    let mut program: Vec<Gate> = (0..3).map(|_| Gate::input(0)).collect();
    program.extend((0..branches).map(|_| Gate::input(1)));

    let selector: Vec<Wire> = (3..start).map(Wire).collect();
    let pool: Vec<Wire> = (0..start).map(Wire).collect();
    let disj = leveled_disjunction(rng, selector, &pool, start, log_length)?;
    let last = start + disj.branch_size() - 1;
    program.push(Gate::Disjunction(disj));
    program.push(Gate::output(last));

    Ok(program)
}

/// Like [`benchmark_program`] but with a flat layered disjunction, matching
/// the declarative benchmark configuration shape.
pub fn layered_program<R: Rng>(
    rng: &mut R,
    branches: usize,
    per_layer: usize,
    length: usize,
) -> Result<Vec<Gate>, DisjunctionError> {
    let start = 3 + branches;
    let mut program: Vec<Gate> = (0..3).map(|_| Gate::input(0)).collect();
    program.extend((0..branches).map(|_| Gate::input(1)));

    let selector: Vec<Wire> = (3..start).map(Wire).collect();
    let pool: Vec<Wire> = (0..start).map(Wire).collect();
    let disj = random_disjunction(rng, selector, &pool, start, per_layer, length)?;
    let last = start + disj.branch_size() - 1;
    program.push(Gate::Disjunction(disj));
    program.push(Gate::output(last));

    Ok(program)
}
