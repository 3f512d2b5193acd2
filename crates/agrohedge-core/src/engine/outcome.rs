//! Forward-hedge outcome for a grain producer.
//!
//! Total production is split into a **protected** volume, covered by the
//! locked soy NDF (bushels converted to sacks at 2.204 bushels/sack), and an
//! **exposed** volume sold at the physical spot price. The protected leg
//! carries two settlement adjustments:
//!
//! - soy: `(locked soy - Chicago) * bushels`, in USD, converted at the spot FX
//! - FX: `(locked FX - spot FX) * (bushels * locked soy)`, already in BRL
//!
//! Operating cost is allocated to each leg pro rata by volume.
//!
//! Every quotient is a plain `f64` division. Zero production, zero cover,
//! zero revenue or zero cost produce NaN or ±Infinity rather than an error,
//! matching what the exported spreadsheet formulas evaluate to.

use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::model::hedge_lock::BUSHELS_PER_SACK;
use crate::model::{CostStructure, HedgeLock, MarketPrices, ProductionEstimate, SimulationInputs};
use crate::types::{require_finite, with_metadata, ComputationOutput, Percent, Real};
use crate::HedgeResult;

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

/// The position held fixed while simulation inputs vary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HedgeContext {
    pub hedge_lock: HedgeLock,
    pub production: ProductionEstimate,
    /// Operating cost of the whole cultivated area.
    pub operating_cost: Real,
}

/// Full input snapshot supplied by the caller for one computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HedgeInput {
    pub costs: CostStructure,
    pub market: MarketPrices,
    pub hedge_lock: HedgeLock,
    pub production: ProductionEstimate,
    pub simulation: SimulationInputs,
}

impl HedgeInput {
    /// Reference soybean position used as the default dataset.
    pub fn reference() -> Self {
        HedgeInput {
            costs: CostStructure::reference(),
            market: MarketPrices::reference(),
            hedge_lock: HedgeLock::reference(),
            production: ProductionEstimate::reference(),
            simulation: SimulationInputs::reference(),
        }
    }

    pub fn operating_cost(&self) -> Real {
        self.costs.operating_cost_for_area(self.production.area)
    }

    pub fn context(&self) -> HedgeContext {
        HedgeContext {
            hedge_lock: self.hedge_lock.clone(),
            production: self.production,
            operating_cost: self.operating_cost(),
        }
    }

    /// Reject NaN or infinite inputs before they reach the engine.
    pub fn validate(&self) -> HedgeResult<()> {
        let lock = &self.hedge_lock;
        let fields = [
            ("market.fob_price", self.market.fob_price),
            ("market.cif_price", self.market.cif_price),
            ("hedge_lock.locked_forward_soy_price", lock.locked_forward_soy_price),
            ("hedge_lock.locked_forward_fx_rate", lock.locked_forward_fx_rate),
            ("hedge_lock.closing_soy_price", lock.closing_soy_price),
            ("hedge_lock.spot_fx_rate", lock.spot_fx_rate),
            ("hedge_lock.bushel_quantity", lock.bushel_quantity),
            ("hedge_lock.realized_price_per_sack", lock.realized_price_per_sack),
            ("production.sacks_per_hectare", self.production.sacks_per_hectare),
            ("production.area", self.production.area),
            ("production.freight_cost_total", self.production.freight_cost_total),
        ];
        for (field, value) in fields {
            require_finite(field, value)?;
        }
        validate_simulation("simulation", &self.simulation)
    }
}

pub(crate) fn validate_simulation(prefix: &str, sim: &SimulationInputs) -> HedgeResult<()> {
    require_finite(&format!("{prefix}.chicago_price"), sim.chicago_price)?;
    require_finite(&format!("{prefix}.physical_price"), sim.physical_price)?;
    require_finite(&format!("{prefix}.fx_rate"), sim.fx_rate)?;
    require_finite(&format!("{prefix}.freight_cost"), sim.freight_cost)
}

/// Protected/exposed split of a hedged harvest.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HedgeOutcome {
    pub total_sacks: Real,
    pub protected_sacks: Real,
    pub exposed_sacks: Real,
    /// Protected / total. Exceeds 1 when the lock covers more than the harvest.
    pub coverage_ratio: Real,
    /// Soy NDF settlement in USD.
    pub soy_adjustment: Real,
    /// FX NDF settlement in BRL.
    pub fx_adjustment: Real,
    pub revenue_protected: Real,
    pub revenue_exposed: Real,
    pub revenue_total: Real,
    pub cost_protected: Real,
    pub cost_exposed: Real,
    pub profit_protected: Real,
    pub profit_exposed: Real,
    pub profit_total: Real,
    pub value_per_sack_total: Real,
    pub value_per_sack_protected: Real,
    pub value_per_sack_exposed: Real,
    pub margin_pct: Percent,
    pub roi_pct: Percent,
    /// Protected value per sack over the price realized at lock.
    pub lock_premium: Real,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Compute the hedge outcome for one set of simulation inputs.
///
/// Pure and deterministic: identical inputs give bit-identical outputs.
pub fn compute_outcome(
    sim: &SimulationInputs,
    lock: &HedgeLock,
    production: &ProductionEstimate,
    operating_cost: Real,
) -> HedgeOutcome {
    let total_sacks = production.total_sacks();
    let protected_sacks = lock.protected_sacks();
    let exposed_sacks = total_sacks - protected_sacks;
    let coverage_ratio = protected_sacks / total_sacks;

    let soy_adjustment =
        (lock.locked_forward_soy_price - sim.chicago_price) * lock.bushel_quantity;
    let fx_adjustment = (lock.locked_forward_fx_rate - sim.fx_rate) * lock.dollar_notional();

    let revenue_protected =
        sim.physical_price * protected_sacks + soy_adjustment * sim.fx_rate + fx_adjustment;
    let revenue_exposed = sim.physical_price * exposed_sacks;
    let revenue_total = revenue_protected + revenue_exposed;

    let cost_protected = operating_cost * (protected_sacks / total_sacks);
    let cost_exposed = operating_cost * (exposed_sacks / total_sacks);

    let profit_protected = revenue_protected - cost_protected;
    let profit_exposed = revenue_exposed - cost_exposed;
    let profit_total = profit_protected + profit_exposed;

    let value_per_sack_total = revenue_total / total_sacks;
    let value_per_sack_protected = revenue_protected / protected_sacks;

    HedgeOutcome {
        total_sacks,
        protected_sacks,
        exposed_sacks,
        coverage_ratio,
        soy_adjustment,
        fx_adjustment,
        revenue_protected,
        revenue_exposed,
        revenue_total,
        cost_protected,
        cost_exposed,
        profit_protected,
        profit_exposed,
        profit_total,
        value_per_sack_total,
        value_per_sack_protected,
        value_per_sack_exposed: sim.physical_price,
        margin_pct: profit_total / revenue_total * 100.0,
        roi_pct: profit_total / operating_cost * 100.0,
        lock_premium: value_per_sack_protected - lock.realized_price_per_sack,
    }
}

impl HedgeOutcome {
    /// Named fields that did not come out finite, in declaration order.
    pub fn non_finite_fields(&self) -> Vec<&'static str> {
        let fields = [
            ("coverage_ratio", self.coverage_ratio),
            ("cost_protected", self.cost_protected),
            ("cost_exposed", self.cost_exposed),
            ("profit_total", self.profit_total),
            ("value_per_sack_total", self.value_per_sack_total),
            ("value_per_sack_protected", self.value_per_sack_protected),
            ("margin_pct", self.margin_pct),
            ("roi_pct", self.roi_pct),
            ("lock_premium", self.lock_premium),
        ];
        fields
            .into_iter()
            .filter(|(_, v)| !v.is_finite())
            .map(|(name, _)| name)
            .collect()
    }
}

/// Explain undefined outputs so the caller can render them as blanks.
pub(crate) fn undefined_value_warnings(
    outcome: &HedgeOutcome,
    operating_cost: Real,
) -> Vec<String> {
    let mut warnings = Vec::new();
    if outcome.total_sacks == 0.0 {
        warnings.push(
            "Total sacks is zero; coverage, cost split and per-sack values are undefined".into(),
        );
    }
    if outcome.protected_sacks == 0.0 {
        warnings.push("No bushels locked; protected value per sack is undefined".into());
    }
    if outcome.revenue_total == 0.0 {
        warnings.push("Total revenue is zero; margin is undefined".into());
    }
    if operating_cost == 0.0 {
        warnings.push("Operating cost is zero; ROI is undefined".into());
    }
    let undefined = outcome.non_finite_fields();
    if !undefined.is_empty() {
        tracing::warn!(fields = ?undefined, "hedge outcome has non-finite values");
        warnings.push(format!("Non-finite outputs: {}", undefined.join(", ")));
    }
    warnings
}

/// Validate the snapshot, run the engine and wrap the result in the standard
/// computation envelope.
pub fn analyze_hedge(input: &HedgeInput) -> HedgeResult<ComputationOutput<HedgeOutcome>> {
    let start = Instant::now();
    input.validate()?;

    let operating_cost = input.operating_cost();
    let outcome = compute_outcome(
        &input.simulation,
        &input.hedge_lock,
        &input.production,
        operating_cost,
    );
    let warnings = undefined_value_warnings(&outcome, operating_cost);

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Forward hedge split: NDF-protected volume plus spot-exposed volume",
        &serde_json::json!({
            "bushels_per_sack": BUSHELS_PER_SACK,
            "operating_cost": operating_cost,
            "total_cost_per_hectare": input.costs.total_cost().to_string(),
            "delivery_mode": input.simulation.delivery_mode,
            "lock_date": input.hedge_lock.lock_date,
            "cost_allocation": "pro rata by volume",
        }),
        warnings,
        elapsed,
        outcome,
    ))
}
