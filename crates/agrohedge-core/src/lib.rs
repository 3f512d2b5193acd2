pub mod engine;
pub mod error;
pub mod model;
pub mod types;

#[cfg(feature = "scenarios")]
pub mod scenarios;

#[cfg(feature = "workbook")]
pub mod workbook;

pub use error::HedgeError;
pub use types::*;

/// Standard result type for all hedge computations
pub type HedgeResult<T> = Result<T, HedgeError>;
