pub mod address;
pub mod compiler;
pub mod deps;
pub mod eval;
pub mod formula;
pub mod grid;
pub mod layout;

pub use address::{col_to_letters, CellRef, RangeRef, SheetKind};
pub use compiler::{best_name_cell, compile_workbook, WorkbookInput};
pub use eval::{evaluate_workbook, Evaluation, Value};
pub use formula::{Expr, Formula};
pub use grid::{Cell, CellValue, Sheet, Workbook};
pub use layout::{Layout, Quantity, ScenarioBlock, ScenarioColumn};
