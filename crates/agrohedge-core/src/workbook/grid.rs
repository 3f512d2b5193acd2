//! Inert workbook data: sheets of literal and formula cells.
//!
//! Nothing here knows about file formats. An exporter walks [`Workbook::sheets`]
//! and writes each cell's value or formula text.

use serde::Serialize;

use super::address::{CellRef, SheetKind};
use super::deps::DepGraph;
use super::formula::{Expr, Formula};

/// A literal cell value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Empty,
    Number(f64),
    Text(String),
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Literal(CellValue),
    Formula(Formula),
}

impl Cell {
    pub fn empty() -> Self {
        Cell::Literal(CellValue::Empty)
    }

    pub fn literal(value: impl Into<CellValue>) -> Self {
        Cell::Literal(value.into())
    }

    pub fn formula(host: SheetKind, expr: Expr) -> Self {
        Cell::Formula(Formula::new(host, expr))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Literal(CellValue::Empty))
    }

    pub fn as_formula(&self) -> Option<&Formula> {
        match self {
            Cell::Formula(f) => Some(f),
            Cell::Literal(_) => None,
        }
    }
}

/// One named 2-D grid. Rows grow on demand; unset cells are empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sheet {
    #[serde(rename = "name")]
    kind: SheetKind,
    rows: Vec<Vec<Cell>>,
}

impl Sheet {
    pub fn new(kind: SheetKind) -> Self {
        Sheet {
            kind,
            rows: Vec::new(),
        }
    }

    pub fn kind(&self) -> SheetKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn set(&mut self, row: u32, col: u32, cell: Cell) {
        let (row, col) = (row as usize, col as usize);
        if self.rows.len() <= row {
            self.rows.resize_with(row + 1, Vec::new);
        }
        let cells = &mut self.rows[row];
        if cells.len() <= col {
            cells.resize_with(col + 1, Cell::empty);
        }
        cells[col] = cell;
    }

    pub fn get(&self, row: u32, col: u32) -> Option<&Cell> {
        self.rows.get(row as usize)?.get(col as usize)
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn row_count(&self) -> u32 {
        self.rows.len() as u32
    }

    /// Every non-empty cell with its address.
    pub fn cells(&self) -> impl Iterator<Item = (CellRef, &Cell)> + '_ {
        let kind = self.kind;
        self.rows.iter().enumerate().flat_map(move |(r, cells)| {
            cells
                .iter()
                .enumerate()
                .filter(|(_, cell)| !cell.is_empty())
                .map(move |(c, cell)| (CellRef::new(kind, r as u32, c as u32), cell))
        })
    }

    pub fn formulas(&self) -> impl Iterator<Item = (CellRef, &Formula)> + '_ {
        self.cells()
            .filter_map(|(at, cell)| cell.as_formula().map(|f| (at, f)))
    }
}

/// Ordered collection of sheets.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sheet: Sheet) {
        self.sheets.push(sheet);
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheet(&self, kind: SheetKind) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.kind == kind)
    }

    pub fn sheet_names(&self) -> Vec<&'static str> {
        self.sheets.iter().map(|s| s.name()).collect()
    }

    pub fn cell(&self, at: CellRef) -> Option<&Cell> {
        self.sheet(at.sheet)?.get(at.row, at.col)
    }

    pub fn formulas(&self) -> impl Iterator<Item = (CellRef, &Formula)> + '_ {
        self.sheets.iter().flat_map(|s| s.formulas())
    }

    /// Precedent/dependent graph of every formula cell.
    pub fn dependency_graph(&self) -> DepGraph {
        let mut graph = DepGraph::new();
        for (at, formula) in self.formulas() {
            graph.replace_edges(at, formula.references().iter().copied());
        }
        graph
    }
}
