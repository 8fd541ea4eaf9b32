use std::collections::BTreeMap;

use crate::{
    Gate, Wire,
    core::disjunction::{BranchOp, Disjunction},
    emit::{
        Ctx,
        backend::{Backend, Error},
        runner::{FuncSig, GoExpr, GoStmt},
        script::{ArrayKind, Expr, Stmt},
    },
};

/// Per-position gate programming of the meta-circuit, as a linear
/// combination over the one-hot selector bits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Indicator {
    /// No branch multiplies here.
    Zero,
    /// Every branch multiplies here.
    One,
    /// Exactly the listed selector bits multiply here; their sum is 0 or 1
    /// because the selector is one-hot.
    Sum(Vec<usize>),
}

/// Compute `g[i]`, the is-multiplication indicator for position `i`.
pub(crate) fn programming_indicator(progs: &[Vec<BranchOp>], i: usize) -> Indicator {
    let mul_branches: Vec<usize> = progs
        .iter()
        .enumerate()
        .filter(|(_, prog)| prog[i].is_mul())
        .map(|(b, _)| b)
        .collect();

    if mul_branches.is_empty() {
        Indicator::Zero
    } else if mul_branches.len() == progs.len() {
        Indicator::One
    } else {
        Indicator::Sum(mul_branches)
    }
}

/// Backend targeting the general secret-sharing circuit DSL plus a generic
/// oblivious-selection (`OIP`) call in the runner.
#[derive(Debug, Default)]
pub struct GenericBackend {
    // player -> pending (wire, dim) input gates, flushed in batches
    pending_inputs: BTreeMap<usize, Vec<(usize, usize)>>,
}

impl GenericBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit all deferred input gates: one circuit read per input wire and
    /// one runner delivery block per owning player.
    fn flush_inputs(&mut self, ctx: &mut Ctx) {
        for (player, inputs) in std::mem::take(&mut self.pending_inputs) {
            let mut length = 0;
            for &(wire, dim) in &inputs {
                ctx.circ(Stmt::assign_wire(
                    Wire(wire),
                    Expr::InputFrom { player, size: dim },
                ));
                length += dim;
            }
            ctx.run(GoStmt::if_player(
                "player",
                player,
                vec![
                    GoStmt::call(
                        "mpc.TryInput",
                        vec![GoExpr::SliceAt {
                            name: "inputs".into(),
                            cursor: "nxt".into(),
                            len: length,
                        }],
                    ),
                    GoStmt::AddAssign {
                        name: "nxt".into(),
                        amount: length,
                    },
                ],
            ));
        }
    }

    fn emit_disjunction(&mut self, ctx: &mut Ctx, start: usize, disj: &Disjunction) -> Result<(), Error> {
        let t = disj.translate(start)?;
        let selector_len = disj.selector().len();
        let branch_size = t.branch_size();
        let ext = t.disj_inputs.len();
        let out_dim = t.out_dim();
        let in_dim = t.in_dim();

        ctx.push_block();

        ctx.circ(Stmt::Blank);
        ctx.circ(Stmt::comment("pack selection wires"));
        ctx.pack(
            "b",
            disj.selector().iter().map(|&w| Expr::Wire(w)).collect(),
        );

        ctx.circ(Stmt::Blank);
        ctx.circ(Stmt::comment("compute gate programming"));
        ctx.circ(Stmt::ArrayDecl {
            name: "g".into(),
            kind: ArrayKind::Secret,
            size: branch_size,
        });
        for i in 0..branch_size {
            let expr = match programming_indicator(&t.progs, i) {
                Indicator::Zero => Expr::Const(0),
                Indicator::One => Expr::Const(1),
                Indicator::Sum(branches) => Expr::Sum(
                    branches.into_iter().map(|b| Expr::index("b", b)).collect(),
                ),
            };
            ctx.circ(Stmt::assign_index("g", i, expr));
        }

        // export the permutation table and run the selection on a random mask
        ctx.run(GoStmt::decl("mapping", GoExpr::IntMatrix(t.perms.clone())));
        ctx.additive_random("out", out_dim);
        ctx.additive_output("b", selector_len);
        ctx.run(GoStmt::decl(
            "v",
            GoExpr::call(
                "apply_mapping",
                vec![GoExpr::ident("mapping"), GoExpr::ident("out")],
            ),
        ));
        ctx.run(GoStmt::DeclErr {
            name: "D".into(),
            expr: GoExpr::call("oip.Select", vec![GoExpr::ident("b"), GoExpr::ident("v")]),
        });
        ctx.run(GoStmt::CheckErr);

        // selected masked operands flow back into the native sharing
        ctx.additive_input("D", in_dim);

        ctx.circ(Stmt::Blank);
        ctx.circ(Stmt::comment("pack outputs to the disjunction"));
        ctx.circ(Stmt::ArrayDecl {
            name: "u".into(),
            kind: ArrayKind::Clear,
            size: out_dim,
        });
        for (i, &w) in t.disj_inputs.iter().enumerate() {
            ctx.circ(Stmt::assign_index(
                "u",
                i,
                Expr::reveal(Expr::paren(Expr::Sum(vec![
                    Expr::index("out", i),
                    Expr::Wire(w),
                ]))),
            ));
        }

        let mut next_idx = ext;
        for i in 0..branch_size {
            ctx.circ(Stmt::Blank);
            ctx.circ(Stmt::comment(format!("gate number {i}")));

            // recover the active branch's operands without revealing which
            // branch that is: selector-weighted sum across the permutations
            // minus the selected mask
            for (name, slot) in [("l", 2 * i), ("r", 2 * i + 1)] {
                let summation = t
                    .perms
                    .iter()
                    .enumerate()
                    .map(|(b, perm)| {
                        Expr::paren(Expr::mul(Expr::index("b", b), Expr::index("u", perm[slot])))
                    })
                    .collect();
                ctx.circ(Stmt::assign_var(
                    name,
                    Expr::sub(Expr::Sum(summation), Expr::index("D", slot)),
                ));
            }

            let l = Expr::var("l");
            let r = Expr::var("r");
            let interpolated = Expr::Sum(vec![
                Expr::mul(
                    Expr::paren(Expr::sub(Expr::Const(1), Expr::index("g", i))),
                    Expr::paren(Expr::Sum(vec![l.clone(), r.clone()])),
                ),
                Expr::mul(Expr::index("g", i), Expr::paren(Expr::mul(l, r))),
            ]);
            ctx.circ(Stmt::assign_wire(t.gate_wires[i], interpolated));

            // fold the fresh output into the revealed window for later levels
            ctx.circ(Stmt::assign_index(
                "u",
                next_idx,
                Expr::reveal(Expr::paren(Expr::Sum(vec![
                    Expr::Wire(t.gate_wires[i]),
                    Expr::index("out", next_idx),
                ]))),
            ));
            next_idx += 1;
        }

        let bracket = ctx.pop_block();
        ctx.run(GoStmt::Guard(bracket));
        Ok(())
    }
}

impl Backend for GenericBackend {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn signature(&self) -> FuncSig {
        FuncSig {
            name: "run".into(),
            params: vec![
                ("player".into(), "int".into()),
                ("inputs".into(), "[]uint64".into()),
                ("mpc".into(), "*MPC".into()),
                ("oip".into(), "*OIP".into()),
            ],
            results: vec!["[]uint64".into(), "error".into()],
        }
    }

    fn prologue(&mut self, ctx: &mut Ctx, _gates: &[Gate]) {
        ctx.run(GoStmt::decl(
            "output",
            GoExpr::MakeSlice {
                elem: "uint64".into(),
                len: Box::new(GoExpr::Int(0)),
                cap: Some(Box::new(GoExpr::Int(128))),
            },
        ));
        ctx.run(GoStmt::decl("nxt", GoExpr::Int(0)));
    }

    fn emit_gate(&mut self, ctx: &mut Ctx, wire: usize, gate: &Gate) -> Result<(), Error> {
        // keep circuit statements in wire order: pending inputs must land
        // before the first gate that could read them
        if !matches!(gate, Gate::Input { .. }) {
            self.flush_inputs(ctx);
        }

        match gate {
            Gate::Input { player, dim } => {
                self.pending_inputs
                    .entry(*player)
                    .or_default()
                    .push((wire, *dim));
            }
            Gate::Output { wire: src, dim } => {
                ctx.circ(Stmt::Output(Expr::reveal(Expr::Wire(*src))));
                ctx.run(GoStmt::Assign {
                    lhs: GoExpr::ident("output"),
                    rhs: GoExpr::call(
                        "append",
                        vec![
                            GoExpr::ident("output"),
                            GoExpr::spread(GoExpr::call(
                                "mpc.TryOutput",
                                vec![GoExpr::Int(*dim)],
                            )),
                        ],
                    ),
                });
            }
            Gate::Add { l, r } => {
                ctx.circ(Stmt::assign_wire(
                    Wire(wire),
                    Expr::Sum(vec![Expr::Wire(*l), Expr::Wire(*r)]),
                ));
            }
            Gate::Mul { l, r } => {
                ctx.circ(Stmt::assign_wire(
                    Wire(wire),
                    Expr::mul(Expr::Wire(*l), Expr::Wire(*r)),
                ));
            }
            Gate::Universal { g, l, r } => {
                ctx.circ(Stmt::assign_wire(
                    Wire(wire),
                    Expr::Universal {
                        g: *g,
                        l: *l,
                        r: *r,
                    },
                ));
            }
            Gate::Disjunction(disj) => {
                self.emit_disjunction(ctx, wire, disj)?;
            }
        }
        Ok(())
    }

    fn epilogue(&mut self, ctx: &mut Ctx) {
        self.flush_inputs(ctx);
        ctx.run(GoStmt::Return(vec![
            GoExpr::ident("output"),
            GoExpr::ident("nil"),
        ]));
    }
}
