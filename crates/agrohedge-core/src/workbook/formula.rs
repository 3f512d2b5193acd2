//! Formula expression trees.
//!
//! Formulas are assembled as [`Expr`] values and only rendered to spreadsheet
//! syntax at the end, so cell references are never spliced into strings by
//! hand. Rendering keeps the tree's evaluation order: every same-precedence
//! right operand is parenthesized, so `a + (b + c)` never flattens into the
//! differently rounded `a + b + c`.

use serde::Serialize;
use std::ops::{Add, Div, Mul, Neg, Sub};

use super::address::{CellRef, RangeRef, SheetKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinOp {
    fn symbol(self) -> char {
        match self {
            BinOp::Add => '+',
            BinOp::Sub => '-',
            BinOp::Mul => '*',
            BinOp::Div => '/',
        }
    }

    fn precedence(self) -> u8 {
        match self {
            BinOp::Add | BinOp::Sub => 1,
            BinOp::Mul | BinOp::Div => 2,
        }
    }
}

/// Spreadsheet functions the compiler emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Sum,
    Max,
    Index,
    Match,
}

impl Function {
    pub fn name(self) -> &'static str {
        match self {
            Function::Sum => "SUM",
            Function::Max => "MAX",
            Function::Index => "INDEX",
            Function::Match => "MATCH",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Cell(CellRef),
    Range(RangeRef),
    Neg(Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    Call(Function, Vec<Expr>),
}

impl Expr {
    pub fn num(value: f64) -> Self {
        Expr::Number(value)
    }

    pub fn cell(cell: CellRef) -> Self {
        Expr::Cell(cell)
    }

    pub fn sum(range: RangeRef) -> Self {
        Expr::Call(Function::Sum, vec![Expr::Range(range)])
    }

    pub fn max(range: RangeRef) -> Self {
        Expr::Call(Function::Max, vec![Expr::Range(range)])
    }

    /// `INDEX(values, MATCH(MAX(keys), keys, 0))`: the entry of `values` on
    /// the first row where `keys` reaches its maximum.
    pub fn index_of_max(values: RangeRef, keys: RangeRef) -> Self {
        let position = Expr::Call(
            Function::Match,
            vec![Expr::max(keys), Expr::Range(keys), Expr::num(0.0)],
        );
        Expr::Call(Function::Index, vec![Expr::Range(values), position])
    }

    fn binary(op: BinOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary(op, Box::new(lhs), Box::new(rhs))
    }

    fn precedence(&self) -> u8 {
        match self {
            Expr::Binary(op, _, _) => op.precedence(),
            Expr::Neg(_) => 3,
            _ => 4,
        }
    }

    /// Render without the leading `=`.
    pub fn render(&self, host: SheetKind) -> String {
        let mut out = String::new();
        self.write(host, &mut out);
        out
    }

    fn write(&self, host: SheetKind, out: &mut String) {
        match self {
            Expr::Number(n) => out.push_str(&n.to_string()),
            Expr::Cell(cell) => out.push_str(&cell.render_from(host)),
            Expr::Range(range) => out.push_str(&range.render_from(host)),
            Expr::Neg(inner) => {
                out.push('-');
                inner.write_operand(host, out, inner.precedence() < 3);
            }
            Expr::Binary(op, lhs, rhs) => {
                let prec = op.precedence();
                lhs.write_operand(host, out, lhs.precedence() < prec);
                out.push(op.symbol());
                rhs.write_operand(host, out, rhs.precedence() <= prec);
            }
            Expr::Call(func, args) => {
                out.push_str(func.name());
                out.push('(');
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    arg.write(host, out);
                }
                out.push(')');
            }
        }
    }

    fn write_operand(&self, host: SheetKind, out: &mut String, parens: bool) {
        if parens {
            out.push('(');
            self.write(host, out);
            out.push(')');
        } else {
            self.write(host, out);
        }
    }

    /// Every cell the expression reads, ranges expanded, first occurrence order.
    pub fn references(&self) -> Vec<CellRef> {
        let mut refs = Vec::new();
        self.collect_refs(&mut refs);
        refs
    }

    fn collect_refs(&self, refs: &mut Vec<CellRef>) {
        match self {
            Expr::Number(_) => {}
            Expr::Cell(cell) => push_unique(refs, *cell),
            Expr::Range(range) => range.cells().for_each(|cell| push_unique(refs, cell)),
            Expr::Neg(inner) => inner.collect_refs(refs),
            Expr::Binary(_, lhs, rhs) => {
                lhs.collect_refs(refs);
                rhs.collect_refs(refs);
            }
            Expr::Call(_, args) => args.iter().for_each(|a| a.collect_refs(refs)),
        }
    }
}

fn push_unique(refs: &mut Vec<CellRef>, cell: CellRef) {
    if !refs.contains(&cell) {
        refs.push(cell);
    }
}

impl Add for Expr {
    type Output = Expr;
    fn add(self, rhs: Expr) -> Expr {
        Expr::binary(BinOp::Add, self, rhs)
    }
}

impl Sub for Expr {
    type Output = Expr;
    fn sub(self, rhs: Expr) -> Expr {
        Expr::binary(BinOp::Sub, self, rhs)
    }
}

impl Mul for Expr {
    type Output = Expr;
    fn mul(self, rhs: Expr) -> Expr {
        Expr::binary(BinOp::Mul, self, rhs)
    }
}

impl Div for Expr {
    type Output = Expr;
    fn div(self, rhs: Expr) -> Expr {
        Expr::binary(BinOp::Div, self, rhs)
    }
}

impl Neg for Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        Expr::Neg(Box::new(self))
    }
}

impl From<CellRef> for Expr {
    fn from(cell: CellRef) -> Self {
        Expr::Cell(cell)
    }
}

/// A formula cell: the expression, its rendered text and the cells it reads.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Formula {
    #[serde(skip)]
    expr: Expr,
    #[serde(rename = "formula")]
    text: String,
    references: Vec<CellRef>,
}

impl Formula {
    pub fn new(host: SheetKind, expr: Expr) -> Self {
        let text = format!("={}", expr.render(host));
        let references = expr.references();
        Formula {
            expr,
            text,
            references,
        }
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Spreadsheet syntax including the leading `=`.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn references(&self) -> &[CellRef] {
        &self.references
    }
}
