//! Structured representation of the emitted runner program: the per-party
//! orchestration code driving the oblivious-selection protocol. Rendered as
//! a standalone Go module that only requires the externally supplied
//! runtime types (`MPC`, `OIP`, `CDN`).

use std::fmt::Write as _;

const INDENT: &str = "    ";

/// Signature of the emitted `run` function; backends differ in parameter
/// and result shapes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FuncSig {
    pub name: String,
    pub params: Vec<(String, String)>,
    pub results: Vec<String>,
}

impl FuncSig {
    fn header(&self) -> String {
        let params = self
            .params
            .iter()
            .map(|(name, ty)| format!("{name} {ty}"))
            .collect::<Vec<_>>()
            .join(", ");
        let results = match self.results.len() {
            0 => String::new(),
            1 => format!(" {}", self.results[0]),
            _ => format!(" ({})", self.results.join(", ")),
        };
        format!("func {}({params}){results} {{", self.name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GoExpr {
    Ident(String),
    Int(usize),
    /// `name[index]`
    Index(String, Box<GoExpr>),
    /// `name[cursor:cursor+len]` — the moving input-delivery window.
    SliceAt {
        name: String,
        cursor: String,
        len: usize,
    },
    Call(String, Vec<GoExpr>),
    Binary(&'static str, Box<GoExpr>, Box<GoExpr>),
    /// `expr...` (variadic spread)
    Spread(Box<GoExpr>),
    /// `make([]elem, len)` or `make([]elem, len, cap)`
    MakeSlice {
        elem: String,
        len: Box<GoExpr>,
        cap: Option<Box<GoExpr>>,
    },
    /// Multi-line `[][]int{...}` literal.
    IntMatrix(Vec<Vec<usize>>),
    /// Multi-line `[][]bool{...}` literal.
    BoolMatrix(Vec<Vec<bool>>),
    /// `[]int{...}` literal.
    IntSlice(Vec<usize>),
    /// `[]Share{...}` literal.
    ShareSlice(Vec<GoExpr>),
}

impl GoExpr {
    pub fn ident(name: impl Into<String>) -> Self {
        GoExpr::Ident(name.into())
    }

    pub fn index(name: impl Into<String>, index: GoExpr) -> Self {
        GoExpr::Index(name.into(), Box::new(index))
    }

    pub fn index_at(name: impl Into<String>, index: usize) -> Self {
        Self::index(name, GoExpr::Int(index))
    }

    pub fn call(func: impl Into<String>, args: Vec<GoExpr>) -> Self {
        GoExpr::Call(func.into(), args)
    }

    pub fn binary(op: &'static str, l: GoExpr, r: GoExpr) -> Self {
        GoExpr::Binary(op, Box::new(l), Box::new(r))
    }

    pub fn spread(e: GoExpr) -> Self {
        GoExpr::Spread(Box::new(e))
    }

    fn is_multiline(&self) -> bool {
        matches!(self, GoExpr::IntMatrix(_) | GoExpr::BoolMatrix(_))
    }

    fn render(&self) -> String {
        match self {
            GoExpr::Ident(name) => name.clone(),
            GoExpr::Int(v) => v.to_string(),
            GoExpr::Index(name, index) => format!("{name}[{}]", index.render()),
            GoExpr::SliceAt { name, cursor, len } => {
                format!("{name}[{cursor}:{cursor}+{len}]")
            }
            GoExpr::Call(func, args) => {
                let args = args
                    .iter()
                    .map(GoExpr::render)
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{func}({args})")
            }
            GoExpr::Binary(op, l, r) => format!("{} {op} {}", l.render(), r.render()),
            GoExpr::Spread(e) => format!("{}...", e.render()),
            GoExpr::MakeSlice { elem, len, cap } => match cap {
                Some(cap) => format!("make([]{elem}, {}, {})", len.render(), cap.render()),
                None => format!("make([]{elem}, {})", len.render()),
            },
            GoExpr::IntSlice(values) => {
                let values = values
                    .iter()
                    .map(usize::to_string)
                    .collect::<Vec<_>>()
                    .join(",");
                format!("[]int{{{values}}}")
            }
            GoExpr::ShareSlice(elems) => {
                let elems = elems
                    .iter()
                    .map(GoExpr::render)
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("[]Share{{{elems}}}")
            }
            GoExpr::IntMatrix(_) | GoExpr::BoolMatrix(_) => {
                unreachable!("matrix literals are rendered by their declaration")
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GoStmt {
    /// `name := expr`
    Decl { name: String, expr: GoExpr },
    /// `name, err := expr`
    DeclErr { name: String, expr: GoExpr },
    /// `lhs = rhs`
    Assign { lhs: GoExpr, rhs: GoExpr },
    /// `name += amount`
    AddAssign { name: String, amount: usize },
    If {
        cond: GoExpr,
        then: Vec<GoStmt>,
        els: Vec<GoStmt>,
    },
    /// `for var := 0; var < bound; var++ { ... }`
    For {
        var: String,
        bound: GoExpr,
        body: Vec<GoStmt>,
    },
    Call(GoExpr),
    Return(Vec<GoExpr>),
    /// `if err != nil { return err }` — inside a protocol bracket.
    CheckErr,
    /// `if err != nil { return nil, err }` — in the `run` body.
    CheckErrNil,
    /// The protocol bracket: an error-returning closure, invoked in place,
    /// whose failure aborts the party's run.
    Guard(Vec<GoStmt>),
    Comment(String),
}

impl GoStmt {
    pub fn decl(name: impl Into<String>, expr: GoExpr) -> Self {
        GoStmt::Decl {
            name: name.into(),
            expr,
        }
    }

    pub fn call(func: impl Into<String>, args: Vec<GoExpr>) -> Self {
        GoStmt::Call(GoExpr::call(func, args))
    }

    pub fn if_player(player_var: &str, player: usize, then: Vec<GoStmt>) -> Self {
        GoStmt::If {
            cond: GoExpr::binary(
                "==",
                GoExpr::ident(player_var),
                GoExpr::Int(player),
            ),
            then,
            els: Vec::new(),
        }
    }
}

fn write_block(out: &mut String, stmts: &[GoStmt], depth: usize) {
    for stmt in stmts {
        write_stmt(out, stmt, depth);
    }
}

fn write_line(out: &mut String, depth: usize, line: &str) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
    out.push_str(line);
    out.push('\n');
}

fn write_matrix_decl(out: &mut String, depth: usize, name: &str, expr: &GoExpr) {
    let (ty, rows): (&str, Vec<String>) = match expr {
        GoExpr::IntMatrix(rows) => (
            "[][]int",
            rows.iter()
                .map(|row| {
                    row.iter()
                        .map(usize::to_string)
                        .collect::<Vec<_>>()
                        .join(",")
                })
                .collect(),
        ),
        GoExpr::BoolMatrix(rows) => (
            "[][]bool",
            rows.iter()
                .map(|row| {
                    row.iter()
                        .map(|b| b.to_string())
                        .collect::<Vec<_>>()
                        .join(",")
                })
                .collect(),
        ),
        _ => unreachable!(),
    };
    write_line(out, depth, &format!("{name} := {ty}{{"));
    for row in rows {
        write_line(out, depth + 1, &format!("{{{row}}},"));
    }
    write_line(out, depth, "}");
}

fn write_stmt(out: &mut String, stmt: &GoStmt, depth: usize) {
    match stmt {
        GoStmt::Decl { name, expr } if expr.is_multiline() => {
            write_matrix_decl(out, depth, name, expr);
        }
        GoStmt::Decl { name, expr } => {
            write_line(out, depth, &format!("{name} := {}", expr.render()));
        }
        GoStmt::DeclErr { name, expr } => {
            write_line(out, depth, &format!("{name}, err := {}", expr.render()));
        }
        GoStmt::Assign { lhs, rhs } => {
            write_line(out, depth, &format!("{} = {}", lhs.render(), rhs.render()));
        }
        GoStmt::AddAssign { name, amount } => {
            write_line(out, depth, &format!("{name} += {amount}"));
        }
        GoStmt::If { cond, then, els } => {
            write_line(out, depth, &format!("if {} {{", cond.render()));
            write_block(out, then, depth + 1);
            if !els.is_empty() {
                write_line(out, depth, "} else {");
                write_block(out, els, depth + 1);
            }
            write_line(out, depth, "}");
        }
        GoStmt::For { var, bound, body } => {
            write_line(
                out,
                depth,
                &format!("for {var} := 0; {var} < {}; {var}++ {{", bound.render()),
            );
            write_block(out, body, depth + 1);
            write_line(out, depth, "}");
        }
        GoStmt::Call(expr) => {
            write_line(out, depth, &expr.render());
        }
        GoStmt::Return(exprs) => {
            if exprs.is_empty() {
                write_line(out, depth, "return");
            } else {
                let exprs = exprs
                    .iter()
                    .map(GoExpr::render)
                    .collect::<Vec<_>>()
                    .join(", ");
                write_line(out, depth, &format!("return {exprs}"));
            }
        }
        GoStmt::CheckErr => {
            write_line(out, depth, "if err != nil { return err }");
        }
        GoStmt::CheckErrNil => {
            write_line(out, depth, "if err != nil { return nil, err }");
        }
        GoStmt::Guard(body) => {
            write_line(out, depth, "if err := func() error {");
            write_block(out, body, depth + 1);
            write_line(out, depth + 1, "return nil");
            write_line(out, depth, "}(); err != nil {");
            write_line(out, depth + 1, "return nil, err");
            write_line(out, depth, "}");
        }
        GoStmt::Comment(text) => {
            write_line(out, depth, &format!("// {text}"));
        }
    }
}

/// Render a full runner artifact: package clause plus the `run` function.
pub fn render(sig: &FuncSig, body: &[GoStmt]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "package main");
    out.push('\n');
    let _ = writeln!(out, "{}", sig.header());
    write_block(&mut out, body, 1);
    out.push_str("}\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_function_shell() {
        let sig = FuncSig {
            name: "run".into(),
            params: vec![
                ("player".into(), "int".into()),
                ("inputs".into(), "[]uint64".into()),
                ("mpc".into(), "*MPC".into()),
                ("oip".into(), "*OIP".into()),
            ],
            results: vec!["[]uint64".into(), "error".into()],
        };
        let body = vec![
            GoStmt::decl("nxt", GoExpr::Int(0)),
            GoStmt::Return(vec![GoExpr::ident("output"), GoExpr::ident("nil")]),
        ];
        let text = render(&sig, &body);
        assert!(text.starts_with("package main\n\n"));
        assert!(text.contains(
            "func run(player int, inputs []uint64, mpc *MPC, oip *OIP) ([]uint64, error) {"
        ));
        assert!(text.contains("    nxt := 0\n"));
        assert!(text.contains("    return output, nil\n"));
        assert!(text.ends_with("}\n"));
    }

    #[test]
    fn renders_mapping_table() {
        let mut out = String::new();
        write_stmt(
            &mut out,
            &GoStmt::decl("mapping", GoExpr::IntMatrix(vec![vec![0, 1, 1, 2], vec![0, 1, 1, 2]])),
            0,
        );
        assert_eq!(out, "mapping := [][]int{\n    {0,1,1,2},\n    {0,1,1,2},\n}\n");
    }

    #[test]
    fn renders_guard_bracket() {
        let mut out = String::new();
        write_stmt(
            &mut out,
            &GoStmt::Guard(vec![
                GoStmt::DeclErr {
                    name: "D".into(),
                    expr: GoExpr::call(
                        "oip.Select",
                        vec![GoExpr::ident("b"), GoExpr::ident("v")],
                    ),
                },
                GoStmt::CheckErr,
            ]),
            0,
        );
        let expected = "if err := func() error {\n    D, err := oip.Select(b, v)\n    if err != nil { return err }\n    return nil\n}(); err != nil {\n    return nil, err\n}\n";
        assert_eq!(out, expected);
    }

    #[test]
    fn renders_input_delivery() {
        let mut out = String::new();
        write_stmt(
            &mut out,
            &GoStmt::if_player(
                "player",
                1,
                vec![
                    GoStmt::call(
                        "mpc.TryInput",
                        vec![GoExpr::SliceAt {
                            name: "inputs".into(),
                            cursor: "nxt".into(),
                            len: 2,
                        }],
                    ),
                    GoStmt::AddAssign {
                        name: "nxt".into(),
                        amount: 2,
                    },
                ],
            ),
            0,
        );
        let expected =
            "if player == 1 {\n    mpc.TryInput(inputs[nxt:nxt+2])\n    nxt += 2\n}\n";
        assert_eq!(out, expected);
    }
}
