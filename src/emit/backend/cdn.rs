use crate::{
    Gate,
    core::disjunction::Disjunction,
    emit::{
        Ctx,
        backend::{Backend, Error, wire_count},
        runner::{FuncSig, GoExpr, GoStmt},
    },
};

/// Backend targeting the specialized secure-computation runtime with a
/// native disjunction primitive.
///
/// No circuit-DSL text is emitted (the artifact stays preamble-only); the
/// whole program becomes runner code over `wires`, an array of shares
/// indexed by wire. Only Input, Output and Disjunction are legal at top
/// level — bare arithmetic gates have no counterpart in this runtime.
#[derive(Debug, Default)]
pub struct CdnBackend;

impl CdnBackend {
    pub fn new() -> Self {
        Self
    }

    fn emit_disjunction(&self, ctx: &mut Ctx, start: usize, disj: &Disjunction) -> Result<(), Error> {
        let t = disj.translate(start)?;
        let branch_size = t.branch_size();

        ctx.push_block();

        ctx.run(GoStmt::decl("levels", GoExpr::IntSlice(t.levels.clone())));
        ctx.run(GoStmt::decl("mapping", GoExpr::IntMatrix(t.perms.clone())));
        ctx.run(GoStmt::decl(
            "programming",
            GoExpr::BoolMatrix(
                t.progs
                    .iter()
                    .map(|prog| prog.iter().map(|op| op.is_mul()).collect())
                    .collect(),
            ),
        ));
        ctx.run(GoStmt::decl(
            "sel",
            GoExpr::ShareSlice(
                disj.selector()
                    .iter()
                    .map(|&w| GoExpr::index_at("wires", w.0))
                    .collect(),
            ),
        ));
        ctx.run(GoStmt::decl(
            "disj",
            GoExpr::ShareSlice(
                t.disj_inputs
                    .iter()
                    .map(|&w| GoExpr::index_at("wires", w.0))
                    .collect(),
            ),
        ));

        ctx.run(GoStmt::DeclErr {
            name: "res".into(),
            expr: GoExpr::call(
                "cdn.Disjunction",
                vec![
                    GoExpr::ident("levels"),
                    GoExpr::ident("mapping"),
                    GoExpr::ident("disj"),
                    GoExpr::ident("sel"),
                    GoExpr::ident("programming"),
                ],
            ),
        });
        ctx.run(GoStmt::CheckErr);

        // scatter the branch outputs back into the wire table
        ctx.run(GoStmt::For {
            var: "i".into(),
            bound: GoExpr::Int(branch_size),
            body: vec![GoStmt::Assign {
                lhs: GoExpr::index(
                    "wires",
                    GoExpr::binary("+", GoExpr::Int(start), GoExpr::ident("i")),
                ),
                rhs: GoExpr::index("res", GoExpr::ident("i")),
            }],
        });

        let bracket = ctx.pop_block();
        ctx.run(GoStmt::Guard(bracket));
        Ok(())
    }
}

impl Backend for CdnBackend {
    fn name(&self) -> &'static str {
        "cdn"
    }

    fn signature(&self) -> FuncSig {
        FuncSig {
            name: "run".into(),
            params: vec![
                ("me".into(), "int".into()),
                ("inputs".into(), "[]FieldElem".into()),
                ("oip".into(), "*OIP".into()),
            ],
            results: vec!["[]uint64".into(), "error".into()],
        }
    }

    fn prologue(&mut self, ctx: &mut Ctx, gates: &[Gate]) {
        ctx.run(GoStmt::decl("nxt_input", GoExpr::Int(0)));
        ctx.run(GoStmt::decl(
            "output",
            GoExpr::MakeSlice {
                elem: "uint64".into(),
                len: Box::new(GoExpr::Int(0)),
                cap: Some(Box::new(GoExpr::Int(16))),
            },
        ));
        ctx.run(GoStmt::decl(
            "wires",
            GoExpr::MakeSlice {
                elem: "Share".into(),
                len: Box::new(GoExpr::Int(wire_count(gates))),
                cap: None,
            },
        ));
        ctx.run(GoStmt::decl(
            "cdn",
            GoExpr::call("NewCDN", vec![GoExpr::ident("oip")]),
        ));
    }

    fn emit_gate(&mut self, ctx: &mut Ctx, wire: usize, gate: &Gate) -> Result<(), Error> {
        match gate {
            Gate::Input { player, .. } => {
                ctx.run(GoStmt::if_player(
                    "me",
                    *player,
                    vec![
                        GoStmt::Assign {
                            lhs: GoExpr::index_at("wires", wire),
                            rhs: GoExpr::index("inputs", GoExpr::ident("nxt_input")),
                        },
                        GoStmt::AddAssign {
                            name: "nxt_input".into(),
                            amount: 1,
                        },
                    ],
                ));
            }
            Gate::Output { wire: src, .. } => {
                let name = format!("out{wire}");
                ctx.run(GoStmt::DeclErr {
                    name: name.clone(),
                    expr: GoExpr::call(
                        "cdn.Reconstruct",
                        vec![GoExpr::ShareSlice(vec![GoExpr::index_at("wires", src.0)])],
                    ),
                });
                ctx.run(GoStmt::CheckErrNil);
                ctx.run(GoStmt::Assign {
                    lhs: GoExpr::ident("output"),
                    rhs: GoExpr::call(
                        "append",
                        vec![GoExpr::ident("output"), GoExpr::spread(GoExpr::ident(name))],
                    ),
                });
            }
            Gate::Disjunction(disj) => {
                self.emit_disjunction(ctx, wire, disj)?;
            }
            Gate::Add { .. } | Gate::Mul { .. } | Gate::Universal { .. } => {
                return Err(Error::UnsupportedTopLevel {
                    wire,
                    kind: gate.kind(),
                    backend: "cdn",
                });
            }
        }
        Ok(())
    }

    fn epilogue(&mut self, ctx: &mut Ctx) {
        ctx.run(GoStmt::Return(vec![
            GoExpr::ident("output"),
            GoExpr::ident("nil"),
        ]));
    }
}
