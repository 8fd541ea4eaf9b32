use crate::core::{disjunction::Disjunction, wire::Wire};

/// A single gate of the flat circuit program.
///
/// The program is an ordered list of gates; the output of the gate at
/// position `w` is addressed as wire `w`. A `Disjunction` occupies
/// `branch_size` consecutive wire positions, one per internal gate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Gate {
    /// Private input owned by a single party; `dim` is the vector width.
    Input { player: usize, dim: usize },
    /// Terminal gate revealing a wire to all parties.
    Output { wire: Wire, dim: usize },
    Add { l: Wire, r: Wire },
    Mul { l: Wire, r: Wire },
    /// Gate whose behavior (add vs mul) is controlled by wire `g`.
    Universal { g: Wire, l: Wire, r: Wire },
    Disjunction(Disjunction),
}

impl Gate {
    #[must_use]
    pub fn input(player: usize) -> Self {
        Gate::Input { player, dim: 1 }
    }

    #[must_use]
    pub fn output(wire: impl Into<Wire>) -> Self {
        Gate::Output {
            wire: wire.into(),
            dim: 1,
        }
    }

    #[must_use]
    pub fn add(l: impl Into<Wire>, r: impl Into<Wire>) -> Self {
        Gate::Add {
            l: l.into(),
            r: r.into(),
        }
    }

    #[must_use]
    pub fn mul(l: impl Into<Wire>, r: impl Into<Wire>) -> Self {
        Gate::Mul {
            l: l.into(),
            r: r.into(),
        }
    }

    #[must_use]
    pub fn universal(g: impl Into<Wire>, l: impl Into<Wire>, r: impl Into<Wire>) -> Self {
        Gate::Universal {
            g: g.into(),
            l: l.into(),
            r: r.into(),
        }
    }

    /// Ordered wires this gate reads.
    ///
    /// A disjunction declares no inputs here: its true dependency set is
    /// derived by translation, not by the gate itself.
    pub fn inputs(&self) -> Vec<Wire> {
        match self {
            Gate::Input { .. } => Vec::new(),
            Gate::Output { wire, .. } => vec![*wire],
            Gate::Add { l, r } | Gate::Mul { l, r } => vec![*l, *r],
            Gate::Universal { g, l, r } => vec![*g, *l, *r],
            Gate::Disjunction(_) => Vec::new(),
        }
    }

    /// Number of wire positions this gate occupies in the program.
    pub fn width(&self) -> usize {
        match self {
            Gate::Disjunction(disj) => disj.branch_size(),
            _ => 1,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Gate::Input { .. } => "input",
            Gate::Output { .. } => "output",
            Gate::Add { .. } => "add",
            Gate::Mul { .. } => "mul",
            Gate::Universal { .. } => "universal",
            Gate::Disjunction(_) => "disjunction",
        }
    }
}
