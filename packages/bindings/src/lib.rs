use napi::Result as NapiResult;
use napi_derive::napi;

use agrohedge_core::engine::HedgeInput;
use agrohedge_core::scenarios::ScenarioComparisonInput;
use agrohedge_core::workbook::WorkbookInput;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

#[napi]
pub fn analyze_hedge(input_json: String) -> NapiResult<String> {
    let input: HedgeInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = agrohedge_core::engine::analyze_hedge(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn reference_input() -> NapiResult<String> {
    serde_json::to_string(&HedgeInput::reference()).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[napi]
pub fn compare_scenarios(input_json: String) -> NapiResult<String> {
    let input: ScenarioComparisonInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = agrohedge_core::scenarios::compare_scenarios(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Workbook
// ---------------------------------------------------------------------------

#[napi]
pub fn compile_workbook(input_json: String) -> NapiResult<String> {
    let input: WorkbookInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let workbook = agrohedge_core::workbook::compile_workbook(&input).map_err(to_napi_error)?;
    serde_json::to_string(&workbook).map_err(to_napi_error)
}

/// Compile and evaluate, returning each sheet's computed values by row.
#[napi]
pub fn evaluate_workbook(input_json: String) -> NapiResult<String> {
    let input: WorkbookInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let workbook = agrohedge_core::workbook::compile_workbook(&input).map_err(to_napi_error)?;
    let evaluation =
        agrohedge_core::workbook::evaluate_workbook(&workbook).map_err(to_napi_error)?;
    let sheets: serde_json::Map<String, serde_json::Value> = workbook
        .sheets()
        .iter()
        .map(|sheet| {
            let grid = evaluation.grid(&workbook, sheet.kind());
            serde_json::to_value(grid).map(|v| (sheet.name().to_string(), v))
        })
        .collect::<Result<_, _>>()
        .map_err(to_napi_error)?;
    serde_json::to_string(&sheets).map_err(to_napi_error)
}
