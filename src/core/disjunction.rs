use std::collections::HashMap;

use itertools::Itertools;
use log::debug;

use crate::core::{gate::Gate, wire::Wire};

/// Errors raised while constructing or translating a disjunction.
#[derive(Clone, Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("selector width {selectors} does not match branch count {branches}")]
    SelectorMismatch { selectors: usize, branches: usize },
    #[error("branch {branch} has {found} gates, expected {expected}")]
    UnevenBranch {
        branch: usize,
        expected: usize,
        found: usize,
    },
    #[error("{kind} gate at position {position} of branch {branch} not supported in disjunction")]
    UnsupportedBranchGate {
        branch: usize,
        position: usize,
        kind: &'static str,
    },
    #[error("branch {branch} gate {position} reads wire {wire} before it is produced")]
    ForwardReference {
        branch: usize,
        position: usize,
        wire: Wire,
    },
    #[error("level schedule of length {len} exceeds branch size {branch_size}")]
    BadLevels { len: usize, branch_size: usize },
    #[error("disjunction requires at least one branch with at least one gate")]
    Empty,
}
pub type DisjunctionError = Error;

/// Operation tag for one branch position: the "programming" bit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BranchOp {
    Add = 0,
    Mul = 1,
}

impl BranchOp {
    pub fn is_mul(self) -> bool {
        matches!(self, BranchOp::Mul)
    }

    pub fn bit(self) -> u8 {
        self as u8
    }
}

/// A branching gate: several candidate sub-circuits of equal gate count,
/// of which exactly one (picked by a secret one-hot selector) is evaluated.
///
/// Branch gates are restricted to `Add` and `Mul` so that every branch can
/// be expressed as one uniform sequence of universal gates; which operation
/// each position performs is part of the per-branch programming derived by
/// [`Disjunction::translate`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Disjunction {
    selector: Vec<Wire>,
    branches: Vec<Vec<Gate>>,
    branch_size: usize,
    fixed_levels: Option<Vec<usize>>,
}

/// Position-independent description of a disjunction, derived once at the
/// gate's program position and borrowed read-only during emission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Translation {
    /// Sorted, deduplicated wires produced before the disjunction that at
    /// least one branch reads. Handled identically for every branch so the
    /// access pattern cannot leak which branch is active.
    pub disj_inputs: Vec<Wire>,
    /// Per branch: two local operand addresses per branch gate, flattened.
    pub perms: Vec<Vec<usize>>,
    /// Per branch: one operation tag per branch gate.
    pub progs: Vec<Vec<BranchOp>>,
    /// Unified global output wires of the internal gates, one per position.
    pub gate_wires: Vec<Wire>,
    /// Ascending branch positions at which every branch's operands stay
    /// within the already-available window; synchronization barriers for
    /// leveled evaluation.
    pub levels: Vec<usize>,
}

impl Translation {
    pub fn branch_size(&self) -> usize {
        self.gate_wires.len()
    }

    /// Values flowing out of the selection: masked externals plus one slot
    /// per internal gate.
    pub fn out_dim(&self) -> usize {
        self.disj_inputs.len() + self.branch_size()
    }

    /// Values flowing back in: left and right operand per internal gate.
    pub fn in_dim(&self) -> usize {
        2 * self.branch_size()
    }
}

impl Disjunction {
    pub fn new(selector: Vec<Wire>, branches: Vec<Vec<Gate>>) -> Result<Self, Error> {
        Self::build(selector, branches, None)
    }

    /// Like [`Disjunction::new`] but with a caller-supplied level schedule,
    /// taken as authoritative instead of the computed one.
    pub fn with_levels(
        selector: Vec<Wire>,
        branches: Vec<Vec<Gate>>,
        levels: Vec<usize>,
    ) -> Result<Self, Error> {
        Self::build(selector, branches, Some(levels))
    }

    fn build(
        selector: Vec<Wire>,
        branches: Vec<Vec<Gate>>,
        fixed_levels: Option<Vec<usize>>,
    ) -> Result<Self, Error> {
        if branches.is_empty() || branches[0].is_empty() {
            return Err(Error::Empty);
        }
        if selector.len() != branches.len() {
            return Err(Error::SelectorMismatch {
                selectors: selector.len(),
                branches: branches.len(),
            });
        }

        let branch_size = branches[0].len();
        for (b, branch) in branches.iter().enumerate() {
            if branch.len() != branch_size {
                return Err(Error::UnevenBranch {
                    branch: b,
                    expected: branch_size,
                    found: branch.len(),
                });
            }
            for (i, gate) in branch.iter().enumerate() {
                if !matches!(gate, Gate::Add { .. } | Gate::Mul { .. }) {
                    return Err(Error::UnsupportedBranchGate {
                        branch: b,
                        position: i,
                        kind: gate.kind(),
                    });
                }
            }
        }

        if let Some(levels) = &fixed_levels {
            if levels.len() > branch_size {
                return Err(Error::BadLevels {
                    len: levels.len(),
                    branch_size,
                });
            }
        }

        Ok(Self {
            selector,
            branches,
            branch_size,
            fixed_levels,
        })
    }

    pub fn selector(&self) -> &[Wire] {
        &self.selector
    }

    pub fn branches(&self) -> &[Vec<Gate>] {
        &self.branches
    }

    pub fn branch_size(&self) -> usize {
        self.branch_size
    }

    /// Derive the position-independent meta-circuit description, taking
    /// `start` as the wire index of the first internal gate.
    ///
    /// Every wire reference inside a branch is rewritten into a local
    /// address space shared by all branches: external wires map to their
    /// slot in `disj_inputs`, internal wires to `position + |disj_inputs|`.
    /// Identical input always yields an identical translation.
    pub fn translate(&self, start: usize) -> Result<Translation, Error> {
        let end = start + self.branch_size;

        let disj_inputs: Vec<Wire> = self
            .branches
            .iter()
            .flatten()
            .flat_map(|gate| gate.inputs())
            .filter(|w| w.0 < start)
            .sorted_unstable()
            .dedup()
            .collect();
        let slots: HashMap<Wire, usize> = disj_inputs
            .iter()
            .copied()
            .enumerate()
            .map(|(slot, w)| (w, slot))
            .collect();
        let ext = disj_inputs.len();

        let mut perms = Vec::with_capacity(self.branches.len());
        let mut progs = Vec::with_capacity(self.branches.len());

        for (b, branch) in self.branches.iter().enumerate() {
            let mut perm = Vec::with_capacity(2 * self.branch_size);
            let mut prog = Vec::with_capacity(self.branch_size);

            for (i, gate) in branch.iter().enumerate() {
                let (op, l, r) = match *gate {
                    Gate::Add { l, r } => (BranchOp::Add, l, r),
                    Gate::Mul { l, r } => (BranchOp::Mul, l, r),
                    ref other => {
                        return Err(Error::UnsupportedBranchGate {
                            branch: b,
                            position: i,
                            kind: other.kind(),
                        });
                    }
                };

                for w in [l, r] {
                    let addr = match slots.get(&w) {
                        Some(&slot) => slot,
                        None if w.0 >= start && w.0 < end => (w.0 - start) + ext,
                        None => {
                            return Err(Error::ForwardReference {
                                branch: b,
                                position: i,
                                wire: w,
                            });
                        }
                    };
                    // a gate may only read values produced before its own position
                    if addr >= ext + i {
                        return Err(Error::ForwardReference {
                            branch: b,
                            position: i,
                            wire: w,
                        });
                    }
                    perm.push(addr);
                }
                prog.push(op);
            }

            debug_assert_eq!(perm.len(), 2 * prog.len());
            perms.push(perm);
            progs.push(prog);
        }

        let levels = match &self.fixed_levels {
            Some(fixed) => fixed.clone(),
            None => Self::compute_levels(&perms, ext, self.branch_size),
        };
        if levels.len() > self.branch_size {
            return Err(Error::BadLevels {
                len: levels.len(),
                branch_size: self.branch_size,
            });
        }
        debug!(
            "disjunction at {start}: {} branches, {} external inputs, levels {levels:?}",
            self.branches.len(),
            ext
        );

        Ok(Translation {
            disj_inputs,
            perms,
            progs,
            gate_wires: (start..end).map(Wire).collect(),
            levels,
        })
    }

    /// Cut a level whenever some branch's operands at a position fall outside
    /// the window of values available to every branch (external inputs plus
    /// internal gates up to the previous cut).
    fn compute_levels(perms: &[Vec<usize>], ext: usize, branch_size: usize) -> Vec<usize> {
        let mut levels = Vec::new();
        let mut window = ext;
        for i in 0..branch_size {
            let blocked = perms
                .iter()
                .any(|perm| perm[2 * i] >= window || perm[2 * i + 1] >= window);
            if blocked {
                levels.push(i - 1);
                window = ext + i;
            }
        }
        levels.push(branch_size - 1);
        levels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{generate, test_utils::trng};

    fn scenario() -> Disjunction {
        // 3 data inputs from party 0 (wires 0..3), a 2-wide one-hot selector
        // from party 1 (wires 3..5), disjunction starting at wire 5
        Disjunction::new(
            vec![Wire(3), Wire(4)],
            vec![
                vec![Gate::add(0, 1), Gate::mul(1, 2)],
                vec![Gate::mul(0, 1), Gate::add(1, 2)],
            ],
        )
        .unwrap()
    }

    #[test]
    fn scenario_translation() {
        let t = scenario().translate(5).unwrap();

        assert_eq!(t.disj_inputs, vec![Wire(0), Wire(1), Wire(2)]);
        assert_eq!(t.branch_size(), 2);
        assert_eq!(t.perms, vec![vec![0, 1, 1, 2], vec![0, 1, 1, 2]]);
        assert_eq!(
            t.progs,
            vec![
                vec![BranchOp::Add, BranchOp::Mul],
                vec![BranchOp::Mul, BranchOp::Add],
            ]
        );
        assert_eq!(t.gate_wires, vec![Wire(5), Wire(6)]);
        assert_eq!(t.levels, vec![1]);
        assert_eq!(t.out_dim(), 5);
        assert_eq!(t.in_dim(), 4);
    }

    #[test]
    fn translation_is_deterministic() {
        let disj = scenario();
        assert_eq!(disj.translate(5).unwrap(), disj.translate(5).unwrap());
    }

    #[test]
    fn selector_branch_mismatch() {
        let err = Disjunction::new(
            vec![Wire(3)],
            vec![vec![Gate::add(0, 1)], vec![Gate::mul(0, 1)]],
        )
        .unwrap_err();
        assert_eq!(
            err,
            Error::SelectorMismatch {
                selectors: 1,
                branches: 2
            }
        );
    }

    #[test]
    fn uneven_branches() {
        let err = Disjunction::new(
            vec![Wire(3), Wire(4)],
            vec![
                vec![Gate::add(0, 1), Gate::mul(0, 1)],
                vec![Gate::mul(0, 1)],
            ],
        )
        .unwrap_err();
        assert_eq!(
            err,
            Error::UnevenBranch {
                branch: 1,
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn non_arithmetic_branch_gate() {
        let err = Disjunction::new(
            vec![Wire(3), Wire(4)],
            vec![vec![Gate::add(0, 1)], vec![Gate::input(0)]],
        )
        .unwrap_err();
        assert_eq!(
            err,
            Error::UnsupportedBranchGate {
                branch: 1,
                position: 0,
                kind: "input"
            }
        );
    }

    #[test]
    fn forward_reference_is_rejected() {
        // gate 0 of the branch reads the branch's own second output
        let disj = Disjunction::new(
            vec![Wire(2), Wire(3)],
            vec![
                vec![Gate::add(6, 0), Gate::mul(0, 1)],
                vec![Gate::add(0, 1), Gate::mul(0, 1)],
            ],
        )
        .unwrap();
        assert_eq!(
            disj.translate(5).unwrap_err(),
            Error::ForwardReference {
                branch: 0,
                position: 0,
                wire: Wire(6)
            }
        );
    }

    #[test]
    fn fixed_levels_are_authoritative() {
        let disj = Disjunction::with_levels(
            vec![Wire(3), Wire(4)],
            vec![
                vec![Gate::add(0, 1), Gate::mul(1, 2)],
                vec![Gate::mul(0, 1), Gate::add(1, 2)],
            ],
            vec![0, 1],
        )
        .unwrap();
        assert_eq!(disj.translate(5).unwrap().levels, vec![0, 1]);
    }

    #[test]
    fn oversized_fixed_levels_are_rejected() {
        let err = Disjunction::with_levels(
            vec![Wire(3), Wire(4)],
            vec![
                vec![Gate::add(0, 1), Gate::mul(1, 2)],
                vec![Gate::mul(0, 1), Gate::add(1, 2)],
            ],
            vec![0, 1, 1],
        )
        .unwrap_err();
        assert_eq!(
            err,
            Error::BadLevels {
                len: 3,
                branch_size: 2
            }
        );
    }

    #[test]
    fn level_cut_on_cross_branch_dependency() {
        // Branch 0 uses only externals; branch 1's second gate reads the
        // first internal output, forcing a cut after position 0.
        let disj = Disjunction::new(
            vec![Wire(2), Wire(3)],
            vec![
                vec![Gate::add(0, 1), Gate::mul(0, 1), Gate::add(0, 0)],
                vec![Gate::mul(0, 1), Gate::add(4, 0), Gate::mul(5, 1)],
            ],
        )
        .unwrap();
        let t = disj.translate(4).unwrap();
        // position 1 reads address 2 (internal gate 0) while window is 2,
        // position 2 reads address 3 while window is 3
        assert_eq!(t.levels, vec![0, 1, 2]);
    }

    #[test]
    fn random_branch_invariants() {
        let mut rng = trng();
        let pool: Vec<Wire> = (0..8).map(Wire).collect();
        let start = 8;

        for _ in 0..32 {
            let branches: Vec<Vec<Gate>> = (0..4)
                .map(|_| {
                    generate::random_circuit(
                        &mut rng,
                        &pool,
                        start,
                        std::iter::repeat(8),
                        64,
                        false,
                    )
                })
                .collect();
            let disj =
                Disjunction::new((4..8).map(Wire).collect(), branches).unwrap();
            let t = disj.translate(start).unwrap();
            let ext = t.disj_inputs.len();
            let branch_size = t.branch_size();

            // perm/prog length laws
            for (perm, prog) in t.perms.iter().zip(&t.progs) {
                assert_eq!(perm.len(), 2 * prog.len());
                assert_eq!(prog.len(), branch_size);
            }

            // external inputs: strictly sorted, exact
            assert!(t.disj_inputs.windows(2).all(|w| w[0] < w[1]));
            let referenced: std::collections::BTreeSet<Wire> = disj
                .branches()
                .iter()
                .flatten()
                .flat_map(|g| g.inputs())
                .filter(|w| w.0 < start)
                .collect();
            assert_eq!(t.disj_inputs, referenced.into_iter().collect::<Vec<_>>());

            // addresses stay within the meta-circuit window
            for perm in &t.perms {
                for (i, &addr) in perm.iter().enumerate() {
                    assert!(addr < ext + branch_size);
                    assert!(addr < ext + i / 2);
                }
            }

            // level schedule laws
            assert!(t.levels.len() <= branch_size);
            assert_eq!(*t.levels.last().unwrap(), branch_size - 1);
            assert!(t.levels.windows(2).all(|w| w[0] < w[1]));

            // every gate of a level reads only values available before the
            // level begins
            let mut window = ext;
            let mut pos = 0;
            for &cut in &t.levels {
                for i in pos..=cut {
                    for perm in &t.perms {
                        assert!(perm[2 * i] < window);
                        assert!(perm[2 * i + 1] < window);
                    }
                }
                pos = cut + 1;
                window = ext + pos;
            }
        }
    }
}
