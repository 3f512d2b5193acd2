pub mod costs;
pub mod hedge_lock;
pub mod market;
pub mod production;
pub mod scenario;

pub use costs::{CostCategory, CostItem, CostLine, CostLineItems, CostStructure, CostTotals};
pub use hedge_lock::HedgeLock;
pub use market::{DeliveryMode, MarketPrices};
pub use production::ProductionEstimate;
pub use scenario::{
    ensure_unique_ids, Scenario, ScenarioBook, ScenarioId, ScenarioKind, SimulationInputs,
};
