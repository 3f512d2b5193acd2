use serde::{Deserialize, Serialize};

use crate::types::Real;

/// Where the physical grain is priced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DeliveryMode {
    /// Free on board at the origin warehouse.
    Fob,
    /// Cost, insurance and freight at the export port.
    #[default]
    Cif,
}

impl DeliveryMode {
    pub fn code(self) -> &'static str {
        match self {
            DeliveryMode::Fob => "FOB",
            DeliveryMode::Cif => "CIF",
        }
    }
}

/// Physical market reference prices, per sack.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketPrices {
    pub fob_price: Real,
    pub cif_price: Real,
}

impl MarketPrices {
    pub fn reference() -> Self {
        MarketPrices {
            fob_price: 124.00,
            cif_price: 134.00,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_mode_wire_format() {
        assert_eq!(serde_json::to_string(&DeliveryMode::Fob).unwrap(), "\"FOB\"");
        let mode: DeliveryMode = serde_json::from_str("\"CIF\"").unwrap();
        assert_eq!(mode, DeliveryMode::Cif);
    }
}
