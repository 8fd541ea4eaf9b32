//! Structured representation of the secret-sharing circuit description
//! language, rendered line by line. The printer keeps the exact line
//! formats the external MPC runtime expects, so parenthesization is
//! explicit in the tree rather than derived from precedence.

use std::fmt;

use crate::Wire;

/// Fixed preamble defining the output-printing helper; every circuit
/// artifact starts with this block.
pub const CIRCUIT_PREAMBLE: &str = "def output(r):
    f = 'Output: '
    for _ in range(len(r)):
        f += '%s '
    f = f[:-1]
    print_ln(f, *list(r))
";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expr {
    Var(String),
    Wire(Wire),
    Index(String, usize),
    Const(u64),
    /// Terms joined with ` + `.
    Sum(Vec<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Paren(Box<Expr>),
    Reveal(Box<Expr>),
    InputFrom { player: usize, size: usize },
    Universal { g: Wire, l: Wire, r: Wire },
}

impl Expr {
    pub fn var(name: impl Into<String>) -> Self {
        Expr::Var(name.into())
    }

    pub fn index(name: impl Into<String>, i: usize) -> Self {
        Expr::Index(name.into(), i)
    }

    pub fn sub(l: Expr, r: Expr) -> Self {
        Expr::Sub(Box::new(l), Box::new(r))
    }

    pub fn mul(l: Expr, r: Expr) -> Self {
        Expr::Mul(Box::new(l), Box::new(r))
    }

    pub fn paren(e: Expr) -> Self {
        Expr::Paren(Box::new(e))
    }

    pub fn reveal(e: Expr) -> Self {
        Expr::Reveal(Box::new(e))
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Var(name) => write!(f, "{name}"),
            Expr::Wire(w) => write!(f, "{}", w.name()),
            Expr::Index(name, i) => write!(f, "{name}[{i}]"),
            Expr::Const(v) => write!(f, "{v}"),
            Expr::Sum(terms) => {
                for (i, term) in terms.iter().enumerate() {
                    if i > 0 {
                        write!(f, " + ")?;
                    }
                    write!(f, "{term}")?;
                }
                Ok(())
            }
            Expr::Sub(l, r) => write!(f, "{l} - {r}"),
            Expr::Mul(l, r) => write!(f, "{l} * {r}"),
            Expr::Paren(e) => write!(f, "({e})"),
            Expr::Reveal(e) => write!(f, "{e}.reveal()"),
            Expr::InputFrom { player, size } => {
                write!(f, "sint.get_input_from({player}, size={size})")
            }
            Expr::Universal { g, l, r } => {
                write!(f, "universal({}, {}, {})", g.name(), l.name(), r.name())
            }
        }
    }
}

/// Assignment target of a circuit statement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Target {
    Var(String),
    Wire(Wire),
    Index(String, usize),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Var(name) => write!(f, "{name}"),
            Target::Wire(w) => write!(f, "{}", w.name()),
            Target::Index(name, i) => write!(f, "{name}[{i}]"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArrayKind {
    /// Secret-shared array (`sint`).
    Secret,
    /// Clear (revealed) array (`cint`).
    Clear,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Stmt {
    Assign { target: Target, expr: Expr },
    ArrayDecl { name: String, kind: ArrayKind, size: usize },
    Output(Expr),
    Comment(String),
    Blank,
}

impl Stmt {
    pub fn assign(target: Target, expr: Expr) -> Self {
        Stmt::Assign { target, expr }
    }

    pub fn assign_var(name: impl Into<String>, expr: Expr) -> Self {
        Stmt::Assign {
            target: Target::Var(name.into()),
            expr,
        }
    }

    pub fn assign_wire(wire: Wire, expr: Expr) -> Self {
        Stmt::Assign {
            target: Target::Wire(wire),
            expr,
        }
    }

    pub fn assign_index(name: impl Into<String>, index: usize, expr: Expr) -> Self {
        Stmt::Assign {
            target: Target::Index(name.into(), index),
            expr,
        }
    }

    pub fn comment(text: impl Into<String>) -> Self {
        Stmt::Comment(text.into())
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::Assign { target, expr } => write!(f, "{target} = {expr}"),
            Stmt::ArrayDecl { name, kind, size } => {
                let ty = match kind {
                    ArrayKind::Secret => "sint",
                    ArrayKind::Clear => "cint",
                };
                write!(f, "{name} = {ty}.Array(size={size})")
            }
            Stmt::Output(e) => write!(f, "output({e})"),
            Stmt::Comment(text) => write!(f, "# {text}"),
            Stmt::Blank => Ok(()),
        }
    }
}

/// Render a full circuit artifact: preamble plus one line per statement.
pub fn render(stmts: &[Stmt]) -> String {
    let mut out = String::from(CIRCUIT_PREAMBLE);
    for stmt in stmts {
        out.push_str(&stmt.to_string());
        out.push('\n');
    }
    out
}
