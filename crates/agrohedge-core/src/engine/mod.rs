pub mod outcome;

pub use outcome::{analyze_hedge, compute_outcome, HedgeContext, HedgeInput, HedgeOutcome};
