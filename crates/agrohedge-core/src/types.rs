use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Cost ledger amounts. Decimal keeps the cost totals exact sums of their line items.
pub type Money = Decimal;

/// Prices, rates and volumes fed to the engine. Plain IEEE-754 doubles: a zero
/// divisor yields NaN or ±Infinity exactly as a spreadsheet cell would.
pub type Real = f64;

/// Percentages expressed on a 0-100 scale (margin, ROI).
pub type Percent = f64;

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "f64_ieee754; cost ledger rust_decimal_128bit".to_string(),
        },
    }
}

/// Require a finite input value, naming the offending field otherwise.
pub(crate) fn require_finite(field: &str, value: Real) -> crate::HedgeResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(crate::HedgeError::InvalidInput {
            field: field.to_string(),
            reason: format!("must be a finite number (got {value})"),
        })
    }
}
