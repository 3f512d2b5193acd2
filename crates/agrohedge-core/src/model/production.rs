use serde::{Deserialize, Serialize};

use crate::types::Real;

/// Expected harvest and the logistics cost of moving it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProductionEstimate {
    pub sacks_per_hectare: Real,
    /// Cultivated area in hectares.
    pub area: Real,
    /// Total freight cost for the origin-to-port leg.
    #[serde(default)]
    pub freight_cost_total: Real,
}

impl ProductionEstimate {
    pub fn reference() -> Self {
        ProductionEstimate {
            sacks_per_hectare: 90.0,
            area: 500.0,
            freight_cost_total: 8500.0,
        }
    }

    pub fn total_sacks(&self) -> Real {
        self.sacks_per_hectare * self.area
    }
}
