use clap::Args;
use serde_json::{json, Value};

use agrohedge_core::engine::HedgeInput;
use agrohedge_core::workbook::{self, Cell, CellValue, SheetKind, WorkbookInput};

use crate::commands::scenarios::default_scenarios;
use crate::input;

/// Arguments for workbook export
#[derive(Args)]
pub struct WorkbookArgs {
    /// Path to JSON input file (WorkbookInput); defaults to the reference
    /// position with three preset scenarios
    #[arg(long)]
    pub input: Option<String>,

    /// Evaluate every formula and include the computed values
    #[arg(long)]
    pub evaluate: bool,

    /// Only emit this sheet (e.g. "Dashboard", "Hedge Lock")
    #[arg(long)]
    pub sheet: Option<String>,
}

fn load_workbook_input(path: Option<&str>) -> Result<WorkbookInput, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        input::file::read_json(path)
    } else if let Some(parsed) = input::stdin::read_stdin()? {
        Ok(parsed)
    } else {
        let base = HedgeInput::reference();
        let scenarios = default_scenarios(&base.simulation);
        Ok(WorkbookInput::from_hedge_input(&base, scenarios))
    }
}

fn parse_sheet(name: &str) -> Result<SheetKind, Box<dyn std::error::Error>> {
    SheetKind::ALL
        .into_iter()
        .find(|kind| kind.name().eq_ignore_ascii_case(name.trim()))
        .ok_or_else(|| format!("Unknown sheet '{}'", name).into())
}

/// What a cell shows before evaluation: the literal or the formula text.
fn cell_text(cell: &Cell) -> String {
    match cell {
        Cell::Literal(CellValue::Empty) => String::new(),
        Cell::Literal(CellValue::Number(n)) => n.to_string(),
        Cell::Literal(CellValue::Text(s)) => s.clone(),
        Cell::Formula(f) => f.text().to_string(),
    }
}

pub fn run_workbook(args: WorkbookArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let workbook_input = load_workbook_input(args.input.as_deref())?;
    let compiled = workbook::compile_workbook(&workbook_input)?;
    let only = args.sheet.as_deref().map(parse_sheet).transpose()?;

    let evaluation = if args.evaluate {
        Some(workbook::evaluate_workbook(&compiled)?)
    } else {
        None
    };

    let mut sheets = Vec::new();
    for sheet in compiled.sheets() {
        if only.is_some_and(|kind| kind != sheet.kind()) {
            continue;
        }
        let rows: Vec<Vec<String>> = match &evaluation {
            Some(ev) => ev
                .grid(&compiled, sheet.kind())
                .iter()
                .map(|row| row.iter().map(|v| v.to_display()).collect())
                .collect(),
            None => sheet
                .rows()
                .iter()
                .map(|row| row.iter().map(cell_text).collect())
                .collect(),
        };
        sheets.push(json!({
            "name": sheet.name(),
            "formulas": sheet.formulas().count(),
            "rows": rows,
        }));
    }

    let mut warnings = Vec::new();
    if workbook_input.scenarios.is_empty() {
        warnings.push("No scenarios: the Scenarios sheet is omitted".to_string());
    }

    Ok(json!({
        "result": {
            "sheets": sheets,
            "evaluated": evaluation.is_some(),
            "formula_count": compiled.formulas().count(),
        },
        "workbook": compiled,
        "warnings": warnings,
    }))
}
