//! Evaluator for the formula subset the compiler emits.
//!
//! Formula cells are evaluated in dependency order (literals first, then each
//! formula after everything it reads). Arithmetic is plain IEEE-754: a zero
//! divisor gives NaN or ±Infinity rather than `#DIV/0!`, the same values the
//! engine produces, so an evaluated workbook can be compared against
//! [`compute_outcome`](crate::engine::compute_outcome) directly.

use rustc_hash::FxHashMap;
use serde::Serialize;

use super::address::{CellRef, RangeRef, SheetKind};
use super::formula::{BinOp, Expr, Function};
use super::grid::{Cell, CellValue, Workbook};
use crate::error::HedgeError;
use crate::HedgeResult;

/// Evaluated value of one cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Text(String),
    Empty,
    /// Spreadsheet error code such as `#N/A` or `#VALUE!`.
    Error(String),
}

impl Value {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    fn to_number(&self) -> Result<f64, Value> {
        match self {
            Value::Number(n) => Ok(*n),
            Value::Empty => Ok(0.0),
            Value::Text(_) => Err(Value::Error("#VALUE!".into())),
            Value::Error(_) => Err(self.clone()),
        }
    }

    pub fn to_display(&self) -> String {
        match self {
            Value::Number(n) => {
                if n.is_nan() {
                    "#NUM!".to_string()
                } else if n.is_infinite() {
                    "#DIV/0!".to_string()
                } else if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{:.4}", n)
                        .trim_end_matches('0')
                        .trim_end_matches('.')
                        .to_string()
                }
            }
            Value::Text(s) => s.clone(),
            Value::Empty => String::new(),
            Value::Error(e) => e.clone(),
        }
    }
}

impl From<&CellValue> for Value {
    fn from(value: &CellValue) -> Self {
        match value {
            CellValue::Empty => Value::Empty,
            CellValue::Number(n) => Value::Number(*n),
            CellValue::Text(s) => Value::Text(s.clone()),
        }
    }
}

/// Values of every non-empty cell of a workbook.
#[derive(Debug, Clone, Default)]
pub struct Evaluation {
    values: FxHashMap<CellRef, Value>,
    formula_count: usize,
}

impl Evaluation {
    /// Value at `at`; unset cells are [`Value::Empty`].
    pub fn value(&self, at: CellRef) -> Value {
        self.values.get(&at).cloned().unwrap_or(Value::Empty)
    }

    pub fn number(&self, at: CellRef) -> Option<f64> {
        self.values.get(&at).and_then(Value::as_number)
    }

    pub fn formula_count(&self) -> usize {
        self.formula_count
    }

    /// One sheet as rows of evaluated values, for display.
    pub fn grid(&self, workbook: &Workbook, kind: SheetKind) -> Vec<Vec<Value>> {
        let Some(sheet) = workbook.sheet(kind) else {
            return Vec::new();
        };
        sheet
            .rows()
            .iter()
            .enumerate()
            .map(|(r, cells)| {
                (0..cells.len())
                    .map(|c| self.value(CellRef::new(kind, r as u32, c as u32)))
                    .collect()
            })
            .collect()
    }
}

/// Evaluate every formula in `workbook`.
///
/// Fails with [`HedgeError::Evaluation`] on a circular reference.
pub fn evaluate_workbook(workbook: &Workbook) -> HedgeResult<Evaluation> {
    let mut values: FxHashMap<CellRef, Value> = FxHashMap::default();
    let mut formulas = FxHashMap::default();
    for sheet in workbook.sheets() {
        for (at, cell) in sheet.cells() {
            match cell {
                Cell::Literal(value) => {
                    values.insert(at, Value::from(value));
                }
                Cell::Formula(formula) => {
                    formulas.insert(at, formula.expr());
                }
            }
        }
    }

    let span = tracing::debug_span!("evaluate_workbook", formulas = formulas.len());
    let _guard = span.enter();

    let graph = workbook.dependency_graph();
    let order = graph
        .evaluation_order(formulas.keys().copied())
        .map_err(|cycle| {
            let cells: Vec<String> = cycle.iter().map(|c| c.qualified()).collect();
            HedgeError::Evaluation(format!("Circular reference through {}", cells.join(", ")))
        })?;

    for at in order {
        if let Some(expr) = formulas.get(&at) {
            let value = eval(expr, &values);
            values.insert(at, value);
        }
    }

    let errors = values
        .values()
        .filter(|v| matches!(v, Value::Error(_)))
        .count();
    if errors > 0 {
        tracing::warn!(errors, "workbook evaluated with error values");
    }
    tracing::debug!(cells = values.len(), "workbook evaluated");

    Ok(Evaluation {
        values,
        formula_count: formulas.len(),
    })
}

fn lookup(values: &FxHashMap<CellRef, Value>, at: CellRef) -> Value {
    values.get(&at).cloned().unwrap_or(Value::Empty)
}

fn range_values(values: &FxHashMap<CellRef, Value>, range: &RangeRef) -> Vec<Value> {
    range.cells().map(|at| lookup(values, at)).collect()
}

fn eval(expr: &Expr, values: &FxHashMap<CellRef, Value>) -> Value {
    match expr {
        Expr::Number(n) => Value::Number(*n),
        Expr::Cell(at) => match lookup(values, *at) {
            Value::Empty => Value::Number(0.0),
            other => other,
        },
        Expr::Range(_) => Value::Error("#VALUE!".into()),
        Expr::Neg(inner) => match eval(inner, values).to_number() {
            Ok(n) => Value::Number(-n),
            Err(e) => e,
        },
        Expr::Binary(op, lhs, rhs) => {
            let a = match eval(lhs, values).to_number() {
                Ok(n) => n,
                Err(e) => return e,
            };
            let b = match eval(rhs, values).to_number() {
                Ok(n) => n,
                Err(e) => return e,
            };
            Value::Number(match op {
                BinOp::Add => a + b,
                BinOp::Sub => a - b,
                BinOp::Mul => a * b,
                BinOp::Div => a / b,
            })
        }
        Expr::Call(func, args) => call(*func, args, values),
    }
}

/// Numbers from the arguments. Text and blanks inside ranges are skipped;
/// error values propagate.
fn collect_numbers(args: &[Expr], values: &FxHashMap<CellRef, Value>) -> Result<Vec<f64>, Value> {
    let mut out = Vec::new();
    for arg in args {
        match arg {
            Expr::Range(range) => {
                for value in range_values(values, range) {
                    match value {
                        Value::Number(n) => out.push(n),
                        Value::Error(_) => return Err(value),
                        Value::Text(_) | Value::Empty => {}
                    }
                }
            }
            other => out.push(eval(other, values).to_number()?),
        }
    }
    Ok(out)
}

fn call(func: Function, args: &[Expr], values: &FxHashMap<CellRef, Value>) -> Value {
    match func {
        Function::Sum => match collect_numbers(args, values) {
            Ok(vals) => Value::Number(vals.iter().sum()),
            Err(e) => e,
        },
        // Undefined rows never win; an all-undefined set behaves like an empty one.
        Function::Max => match collect_numbers(args, values) {
            Ok(vals) => {
                let mut defined = vals.into_iter().filter(|v| !v.is_nan()).peekable();
                if defined.peek().is_none() {
                    Value::Number(0.0)
                } else {
                    Value::Number(defined.fold(f64::NEG_INFINITY, f64::max))
                }
            }
            Err(e) => e,
        },
        Function::Index => {
            let (Some(Expr::Range(range)), Some(position)) = (args.first(), args.get(1)) else {
                return Value::Error("#VALUE!".into());
            };
            let position = match eval(position, values).to_number() {
                Ok(n) => n,
                Err(e) => return e,
            };
            if !(position >= 1.0) || position as usize > range.len() {
                return Value::Error("#REF!".into());
            }
            let entries = range_values(values, range);
            entries[position as usize - 1].clone()
        }
        Function::Match => {
            let (Some(key), Some(Expr::Range(range))) = (args.first(), args.get(1)) else {
                return Value::Error("#VALUE!".into());
            };
            let mode = match args.get(2).map(|m| eval(m, values).to_number()) {
                Some(Ok(m)) => m,
                Some(Err(e)) => return e,
                None => 1.0,
            };
            if mode != 0.0 {
                // Only exact lookups are emitted.
                return Value::Error("#N/A".into());
            }
            let key = eval(key, values);
            if let Value::Error(_) = key {
                return key;
            }
            range_values(values, range)
                .iter()
                .position(|candidate| exact_match(&key, candidate))
                .map(|i| Value::Number((i + 1) as f64))
                .unwrap_or_else(|| Value::Error("#N/A".into()))
        }
    }
}

fn exact_match(key: &Value, candidate: &Value) -> bool {
    match (key, candidate) {
        (Value::Number(a), Value::Number(b)) => a == b,
        (Value::Text(a), Value::Text(b)) => a.eq_ignore_ascii_case(b),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workbook::grid::Sheet;

    fn at(row: u32, col: u32) -> CellRef {
        CellRef::new(SheetKind::Dashboard, row, col)
    }

    fn workbook(cells: Vec<(CellRef, Cell)>) -> Workbook {
        let mut sheet = Sheet::new(SheetKind::Dashboard);
        for (at, cell) in cells {
            sheet.set(at.row, at.col, cell);
        }
        let mut workbook = Workbook::new();
        workbook.push(sheet);
        workbook
    }

    fn formula(expr: Expr) -> Cell {
        Cell::formula(SheetKind::Dashboard, expr)
    }

    #[test]
    fn test_chain_evaluated_in_order() {
        // B3 = B2 * 2 is written before B2 = B1 + 1
        let wb = workbook(vec![
            (at(2, 1), formula(Expr::cell(at(1, 1)) * Expr::num(2.0))),
            (at(1, 1), formula(Expr::cell(at(0, 1)) + Expr::num(1.0))),
            (at(0, 1), Cell::literal(4.0)),
        ]);
        let ev = evaluate_workbook(&wb).unwrap();
        assert_eq!(ev.number(at(2, 1)), Some(10.0));
        assert_eq!(ev.formula_count(), 2);
    }

    #[test]
    fn test_division_by_zero_is_ieee() {
        let wb = workbook(vec![
            (at(0, 1), Cell::literal(1.0)),
            (at(1, 1), formula(Expr::cell(at(0, 1)) / Expr::cell(at(5, 5)))),
            (at(2, 1), formula(Expr::num(0.0) / Expr::num(0.0))),
        ]);
        let ev = evaluate_workbook(&wb).unwrap();
        assert_eq!(ev.number(at(1, 1)), Some(f64::INFINITY));
        assert!(ev.number(at(2, 1)).unwrap().is_nan());
    }

    #[test]
    fn test_text_in_arithmetic_is_value_error() {
        let wb = workbook(vec![
            (at(0, 1), Cell::literal("CIF")),
            (at(1, 1), formula(Expr::cell(at(0, 1)) + Expr::num(1.0))),
        ]);
        let ev = evaluate_workbook(&wb).unwrap();
        assert_eq!(ev.value(at(1, 1)), Value::Error("#VALUE!".into()));
    }

    #[test]
    fn test_sum_and_max_skip_text() {
        let range = RangeRef::column(SheetKind::Dashboard, 0, 0, 3);
        let wb = workbook(vec![
            (at(0, 0), Cell::literal("header")),
            (at(1, 0), Cell::literal(3.0)),
            (at(2, 0), Cell::literal(7.0)),
            (at(3, 0), Cell::literal(5.0)),
            (at(0, 1), formula(Expr::sum(range))),
            (at(1, 1), formula(Expr::max(range))),
        ]);
        let ev = evaluate_workbook(&wb).unwrap();
        assert_eq!(ev.number(at(0, 1)), Some(15.0));
        assert_eq!(ev.number(at(1, 1)), Some(7.0));
    }

    #[test]
    fn test_index_match_first_maximum() {
        let names = RangeRef::column(SheetKind::Dashboard, 0, 0, 2);
        let values = RangeRef::column(SheetKind::Dashboard, 1, 0, 2);
        let wb = workbook(vec![
            (at(0, 0), Cell::literal("low")),
            (at(1, 0), Cell::literal("high")),
            (at(2, 0), Cell::literal("also high")),
            (at(0, 1), Cell::literal(1.0)),
            (at(1, 1), Cell::literal(9.0)),
            (at(2, 1), Cell::literal(9.0)),
            (at(5, 0), formula(Expr::index_of_max(names, values))),
        ]);
        let ev = evaluate_workbook(&wb).unwrap();
        assert_eq!(ev.value(at(5, 0)), Value::Text("high".into()));
    }

    #[test]
    fn test_max_ignores_nan() {
        let names = RangeRef::column(SheetKind::Dashboard, 0, 0, 1);
        let values = RangeRef::column(SheetKind::Dashboard, 1, 0, 1);
        let wb = workbook(vec![
            (at(0, 0), Cell::literal("undefined")),
            (at(1, 0), Cell::literal("defined")),
            (at(0, 1), formula(Expr::num(0.0) / Expr::num(0.0))),
            (at(1, 1), Cell::literal(-3.0)),
            (at(3, 0), formula(Expr::index_of_max(names, values))),
        ]);
        let ev = evaluate_workbook(&wb).unwrap();
        assert_eq!(ev.value(at(3, 0)), Value::Text("defined".into()));
    }

    #[test]
    fn test_max_of_only_nan_is_zero() {
        let names = RangeRef::column(SheetKind::Dashboard, 0, 0, 1);
        let values = RangeRef::column(SheetKind::Dashboard, 1, 0, 1);
        let wb = workbook(vec![
            (at(0, 0), Cell::literal("a")),
            (at(1, 0), Cell::literal("b")),
            (at(0, 1), formula(Expr::num(0.0) / Expr::num(0.0))),
            (at(1, 1), formula(Expr::num(0.0) / Expr::num(0.0))),
            (at(3, 1), formula(Expr::max(values))),
            (at(3, 0), formula(Expr::index_of_max(names, values))),
        ]);
        let ev = evaluate_workbook(&wb).unwrap();
        assert_eq!(ev.number(at(3, 1)), Some(0.0));
        assert_eq!(ev.value(at(3, 0)), Value::Error("#N/A".into()));
    }

    #[test]
    fn test_cycle_is_an_error() {
        let wb = workbook(vec![
            (at(0, 1), formula(Expr::cell(at(1, 1)))),
            (at(1, 1), formula(Expr::cell(at(0, 1)))),
        ]);
        let err = evaluate_workbook(&wb).unwrap_err();
        assert!(matches!(err, HedgeError::Evaluation(msg) if msg.contains("Dashboard!B1")));
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Number(45000.0).to_display(), "45000");
        assert_eq!(Value::Number(2.5).to_display(), "2.5");
        assert_eq!(Value::Number(f64::INFINITY).to_display(), "#DIV/0!");
        assert_eq!(Value::Empty.to_display(), "");
    }
}
