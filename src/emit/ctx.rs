use log::trace;

use crate::emit::{
    runner::{self, FuncSig, GoExpr, GoStmt},
    script::{self, Expr, Stmt},
};

/// The two text artifacts produced by a successful compilation.
#[derive(Clone, Debug)]
pub struct Artifacts {
    /// Secret-sharing circuit program (preamble-only for the specialized
    /// backend).
    pub circuit: String,
    /// Per-party runner program.
    pub runner: String,
}

/// Emission context: the append-only circuit and runner buffers plus the
/// additive-sharing primitives shared by both backends.
///
/// Nothing is rendered to text until [`Ctx::finish`]; a compilation that
/// fails mid-walk therefore never produces partial artifacts.
pub struct Ctx {
    players: usize,
    prime: u64,
    circuit: Vec<Stmt>,
    // stack of runner blocks; the bottom entry is the `run` body, pushed
    // entries collect the statements of an open protocol bracket
    blocks: Vec<Vec<GoStmt>>,
}

impl Ctx {
    pub fn new(players: usize, prime: u64) -> Self {
        Self {
            players,
            prime,
            circuit: Vec::new(),
            blocks: vec![Vec::new()],
        }
    }

    pub fn players(&self) -> usize {
        self.players
    }

    pub fn prime(&self) -> u64 {
        self.prime
    }

    /// Append a circuit statement.
    pub fn circ(&mut self, stmt: Stmt) {
        trace!("circ: {stmt}");
        self.circuit.push(stmt);
    }

    /// Append a runner statement to the innermost open block.
    pub fn run(&mut self, stmt: GoStmt) {
        self.blocks
            .last_mut()
            .expect("runner block stack is never empty")
            .push(stmt);
    }

    /// Open a nested runner block (a protocol bracket body).
    pub fn push_block(&mut self) {
        self.blocks.push(Vec::new());
    }

    /// Close the innermost runner block and return its statements.
    pub fn pop_block(&mut self) -> Vec<GoStmt> {
        debug_assert!(self.blocks.len() > 1, "cannot pop the run body");
        self.blocks.pop().unwrap_or_default()
    }

    /// Declare a secret array and fill it element by element.
    pub fn pack(&mut self, name: &str, elems: Vec<Expr>) {
        self.circ(Stmt::ArrayDecl {
            name: name.into(),
            kind: script::ArrayKind::Secret,
            size: elems.len(),
        });
        for (i, elem) in elems.into_iter().enumerate() {
            self.circ(Stmt::assign_index(name, i, elem));
        }
    }

    /// Sum one private vector per party into a single native secret-shared
    /// vector `name`; the runner feeds each party's share in.
    pub fn additive_input(&mut self, name: &str, size: usize) {
        for p in 0..self.players {
            self.circ(Stmt::assign_var(
                format!("t{p}"),
                Expr::InputFrom { player: p, size },
            ));
        }
        self.run(GoStmt::call("mpc.TryInput", vec![GoExpr::ident(name)]));
        let mask = Expr::Sum(
            (0..self.players)
                .map(|p| Expr::var(format!("t{p}")))
                .collect(),
        );
        self.circ(Stmt::assign_var(name, mask));
    }

    /// Each party independently samples `size` field elements; the sum is a
    /// fresh uniformly random secret-shared vector `name`.
    pub fn additive_random(&mut self, name: &str, size: usize) {
        self.run(GoStmt::decl(
            name,
            GoExpr::call("random", vec![GoExpr::Int(size)]),
        ));
        self.additive_input(name, size);
    }

    /// Convert the native sharing `elem` into an additive sharing held by
    /// the runner: reveal `elem` masked by a fresh random vector, then let
    /// party 0 add the mask back while every other party keeps only its
    /// random contribution.
    pub fn additive_output(&mut self, elem: &str, size: usize) {
        const TMP: &str = "t";
        self.additive_random(TMP, size);
        self.circ(Stmt::Output(Expr::reveal(Expr::paren(Expr::sub(
            Expr::var(elem),
            Expr::var(TMP),
        )))));

        self.run(GoStmt::decl(
            elem,
            GoExpr::call("mpc.TryOutput", vec![GoExpr::Int(size)]),
        ));
        let idx = |name: &str| GoExpr::index(name, GoExpr::ident("i"));
        let unmask = GoStmt::For {
            var: "i".into(),
            bound: GoExpr::Int(size),
            body: vec![GoStmt::Assign {
                lhs: idx(elem),
                rhs: GoExpr::call("add", vec![idx(elem), idx(TMP)]),
            }],
        };
        let keep = GoStmt::For {
            var: "i".into(),
            bound: GoExpr::Int(size),
            body: vec![GoStmt::Assign {
                lhs: idx(elem),
                rhs: idx(TMP),
            }],
        };
        self.run(GoStmt::If {
            cond: GoExpr::binary("==", GoExpr::ident("player"), GoExpr::Int(0)),
            then: vec![unmask],
            els: vec![keep],
        });
    }

    /// Render both artifacts.
    pub fn finish(self, sig: &FuncSig) -> Artifacts {
        debug_assert_eq!(self.blocks.len(), 1, "unbalanced runner blocks");
        let body = self.blocks.into_iter().next().unwrap_or_default();
        Artifacts {
            circuit: script::render(&self.circuit),
            runner: runner::render(sig, &body),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig() -> FuncSig {
        FuncSig {
            name: "run".into(),
            params: vec![("player".into(), "int".into())],
            results: vec!["[]uint64".into(), "error".into()],
        }
    }

    #[test]
    fn additive_input_sums_per_party_shares() {
        let mut ctx = Ctx::new(3, 65537);
        ctx.additive_input("D", 4);
        let out = ctx.finish(&sig());

        assert!(out.circuit.contains("t0 = sint.get_input_from(0, size=4)"));
        assert!(out.circuit.contains("t2 = sint.get_input_from(2, size=4)"));
        assert!(out.circuit.contains("D = t0 + t1 + t2"));
        assert!(out.runner.contains("mpc.TryInput(D)"));
    }

    #[test]
    fn additive_output_masks_and_unmasks() {
        let mut ctx = Ctx::new(2, 65537);
        ctx.additive_output("b", 2);
        let out = ctx.finish(&sig());

        // circuit: fresh mask, masked reveal
        assert!(out.circuit.contains("t = t0 + t1"));
        assert!(out.circuit.contains("output((b - t).reveal())"));

        // runner: party 0 folds the mask back, others keep the mask share
        assert!(out.runner.contains("t := random(2)"));
        assert!(out.runner.contains("b := mpc.TryOutput(2)"));
        assert!(out.runner.contains("if player == 0 {"));
        assert!(out.runner.contains("b[i] = add(b[i], t[i])"));
        assert!(out.runner.contains("b[i] = t[i]"));
    }
}
