//! Sheet identity and A1-style cell addressing.
//!
//! Rows and columns are 0-based internally and rendered 1-based/lettered,
//! so `CellRef { row: 4, col: 1 }` prints as `B5`.

use serde::{Serialize, Serializer};
use std::fmt;

/// The sheets a hedge workbook can contain, in workbook order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SheetKind {
    Costs,
    MarketPrices,
    HedgeLock,
    Estimates,
    Dashboard,
    Scenarios,
}

impl SheetKind {
    pub const ALL: [SheetKind; 6] = [
        SheetKind::Costs,
        SheetKind::MarketPrices,
        SheetKind::HedgeLock,
        SheetKind::Estimates,
        SheetKind::Dashboard,
        SheetKind::Scenarios,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SheetKind::Costs => "Costs",
            SheetKind::MarketPrices => "Market Prices",
            SheetKind::HedgeLock => "Hedge Lock",
            SheetKind::Estimates => "Estimates",
            SheetKind::Dashboard => "Dashboard",
            SheetKind::Scenarios => "Scenarios",
        }
    }

    /// Sheet prefix for a cross-sheet reference, quoted when the name has spaces.
    fn prefix(self) -> String {
        let name = self.name();
        if name.contains(' ') {
            format!("'{name}'!")
        } else {
            format!("{name}!")
        }
    }
}

impl fmt::Display for SheetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for SheetKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Convert 0-based column index to Excel-style letter(s).
pub fn col_to_letters(col: u32) -> String {
    let mut result = String::new();
    let mut n = col;
    loop {
        result.insert(0, (b'A' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    result
}

/// A single cell anywhere in the workbook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellRef {
    pub sheet: SheetKind,
    pub row: u32,
    pub col: u32,
}

impl CellRef {
    pub fn new(sheet: SheetKind, row: u32, col: u32) -> Self {
        Self { sheet, row, col }
    }

    /// Same row, another column.
    pub fn with_col(self, col: u32) -> Self {
        Self { col, ..self }
    }

    /// Unqualified A1 form, e.g. `B5`.
    pub fn a1(&self) -> String {
        format!("{}{}", col_to_letters(self.col), self.row + 1)
    }

    /// A1 form as written inside a formula on `host`: qualified only when the
    /// cell lives on another sheet.
    pub fn render_from(&self, host: SheetKind) -> String {
        if self.sheet == host {
            self.a1()
        } else {
            format!("{}{}", self.sheet.prefix(), self.a1())
        }
    }

    /// Always sheet-qualified, e.g. `'Hedge Lock'!B8`.
    pub fn qualified(&self) -> String {
        format!("{}{}", self.sheet.prefix(), self.a1())
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified())
    }
}

impl Serialize for CellRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.qualified())
    }
}

/// Rectangular block of cells on one sheet, bounds inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RangeRef {
    pub start: CellRef,
    pub end: CellRef,
}

impl RangeRef {
    /// Single-column range from `first_row` to `last_row` inclusive.
    pub fn column(sheet: SheetKind, col: u32, first_row: u32, last_row: u32) -> Self {
        Self {
            start: CellRef::new(sheet, first_row, col),
            end: CellRef::new(sheet, last_row, col),
        }
    }

    pub fn sheet(&self) -> SheetKind {
        self.start.sheet
    }

    pub fn len(&self) -> usize {
        let rows = (self.end.row - self.start.row + 1) as usize;
        let cols = (self.end.col - self.start.col + 1) as usize;
        rows * cols
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = CellRef> + '_ {
        let sheet = self.sheet();
        (self.start.row..=self.end.row).flat_map(move |row| {
            (self.start.col..=self.end.col).map(move |col| CellRef::new(sheet, row, col))
        })
    }

    pub fn render_from(&self, host: SheetKind) -> String {
        let body = format!("{}:{}", self.start.a1(), self.end.a1());
        if self.sheet() == host {
            body
        } else {
            format!("{}{}", self.sheet().prefix(), body)
        }
    }
}
