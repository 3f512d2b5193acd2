use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::Real;

/// Bushels in one 60 kg sack; the conversion is fixed, not configurable.
pub const BUSHELS_PER_SACK: Real = 2.204;

/// Terms of the forward contract fixed at lock time.
///
/// `spot_fx_rate` and `closing_soy_price` are the market references observed
/// when the lock was recorded; simulations override them with their own
/// Chicago price and FX rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HedgeLock {
    pub lock_date: NaiveDate,
    /// NDF soy price agreed at lock (USD/bushel).
    pub locked_forward_soy_price: Real,
    /// NDF FX rate agreed at lock (BRL/USD).
    pub locked_forward_fx_rate: Real,
    /// Chicago closing soy price at lock (USD/bushel).
    pub closing_soy_price: Real,
    /// Ptax spot FX rate at lock (BRL/USD).
    pub spot_fx_rate: Real,
    /// Contracted volume in bushels.
    pub bushel_quantity: Real,
    /// Price per sack realized when the lock was struck.
    pub realized_price_per_sack: Real,
}

impl HedgeLock {
    pub fn reference() -> Self {
        HedgeLock {
            lock_date: NaiveDate::from_ymd_opt(2025, 10, 30).unwrap_or_default(),
            locked_forward_soy_price: 11.14,
            locked_forward_fx_rate: 5.5605,
            closing_soy_price: 11.29,
            spot_fx_rate: 5.3832,
            bushel_quantity: 45000.0,
            realized_price_per_sack: 136.5245099,
        }
    }

    /// Contracted volume expressed in sacks.
    pub fn protected_sacks(&self) -> Real {
        self.bushel_quantity / BUSHELS_PER_SACK
    }

    /// USD notional of the soy forward (`bushels * locked soy price`).
    pub fn dollar_notional(&self) -> Real {
        self.bushel_quantity * self.locked_forward_soy_price
    }
}
