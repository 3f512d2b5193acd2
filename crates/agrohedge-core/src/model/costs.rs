//! Per-hectare production cost ledger.
//!
//! Seventeen editable line items split into variable (10) and fixed (7)
//! groups. The four totals are derived and only ever change through
//! [`CostStructure::set`], which recomputes them after each edit:
//!
//! - `total_variable_costs` = sum of the variable items
//! - `total_fixed_costs`    = sum of the fixed items
//! - `operating_cost`       = `total_variable_costs`
//! - `total_cost`           = `total_variable_costs + total_fixed_costs`

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{Money, Real};

pub const VARIABLE_ITEM_COUNT: usize = 10;
pub const FIXED_ITEM_COUNT: usize = 7;
pub const COST_ITEM_COUNT: usize = VARIABLE_ITEM_COUNT + FIXED_ITEM_COUNT;

// ---------------------------------------------------------------------------
// Line item identity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostCategory {
    Variable,
    Fixed,
}

/// One editable cost line, in ledger order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostItem {
    MachineryOperation,
    FacilityMaintenance,
    TemporaryLabor,
    Seeds,
    Fertilizers,
    Pesticides,
    GeneralExpenses,
    ExternalTransport,
    TechnicalAssistance,
    CropInsurance,
    MachineryDepreciation,
    FacilityDepreciation,
    SoilManagement,
    CapitalInsurance,
    PermanentLabor,
    CapitalRemuneration,
    LandRemuneration,
}

impl CostItem {
    pub const ALL: [CostItem; COST_ITEM_COUNT] = [
        CostItem::MachineryOperation,
        CostItem::FacilityMaintenance,
        CostItem::TemporaryLabor,
        CostItem::Seeds,
        CostItem::Fertilizers,
        CostItem::Pesticides,
        CostItem::GeneralExpenses,
        CostItem::ExternalTransport,
        CostItem::TechnicalAssistance,
        CostItem::CropInsurance,
        CostItem::MachineryDepreciation,
        CostItem::FacilityDepreciation,
        CostItem::SoilManagement,
        CostItem::CapitalInsurance,
        CostItem::PermanentLabor,
        CostItem::CapitalRemuneration,
        CostItem::LandRemuneration,
    ];

    pub fn category(self) -> CostCategory {
        match self {
            CostItem::MachineryOperation
            | CostItem::FacilityMaintenance
            | CostItem::TemporaryLabor
            | CostItem::Seeds
            | CostItem::Fertilizers
            | CostItem::Pesticides
            | CostItem::GeneralExpenses
            | CostItem::ExternalTransport
            | CostItem::TechnicalAssistance
            | CostItem::CropInsurance => CostCategory::Variable,
            _ => CostCategory::Fixed,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CostItem::MachineryOperation => "Machinery Operation",
            CostItem::FacilityMaintenance => "Facility Maintenance",
            CostItem::TemporaryLabor => "Temporary Labor",
            CostItem::Seeds => "Seeds",
            CostItem::Fertilizers => "Fertilizers",
            CostItem::Pesticides => "Pesticides",
            CostItem::GeneralExpenses => "General Expenses",
            CostItem::ExternalTransport => "External Transport",
            CostItem::TechnicalAssistance => "Technical Assistance",
            CostItem::CropInsurance => "Crop Insurance",
            CostItem::MachineryDepreciation => "Machinery Depreciation",
            CostItem::FacilityDepreciation => "Facility Depreciation",
            CostItem::SoilManagement => "Soil Management",
            CostItem::CapitalInsurance => "Capital Insurance",
            CostItem::PermanentLabor => "Permanent Labor",
            CostItem::CapitalRemuneration => "Capital Remuneration",
            CostItem::LandRemuneration => "Land Remuneration",
        }
    }
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// Editable line items, as supplied by the caller (values per hectare).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostLineItems {
    pub machinery_operation: Money,
    pub facility_maintenance: Money,
    pub temporary_labor: Money,
    pub seeds: Money,
    pub fertilizers: Money,
    pub pesticides: Money,
    pub general_expenses: Money,
    pub external_transport: Money,
    pub technical_assistance: Money,
    pub crop_insurance: Money,
    pub machinery_depreciation: Money,
    pub facility_depreciation: Money,
    pub soil_management: Money,
    pub capital_insurance: Money,
    pub permanent_labor: Money,
    pub capital_remuneration: Money,
    pub land_remuneration: Money,
}

impl CostLineItems {
    fn slot(&mut self, item: CostItem) -> &mut Money {
        match item {
            CostItem::MachineryOperation => &mut self.machinery_operation,
            CostItem::FacilityMaintenance => &mut self.facility_maintenance,
            CostItem::TemporaryLabor => &mut self.temporary_labor,
            CostItem::Seeds => &mut self.seeds,
            CostItem::Fertilizers => &mut self.fertilizers,
            CostItem::Pesticides => &mut self.pesticides,
            CostItem::GeneralExpenses => &mut self.general_expenses,
            CostItem::ExternalTransport => &mut self.external_transport,
            CostItem::TechnicalAssistance => &mut self.technical_assistance,
            CostItem::CropInsurance => &mut self.crop_insurance,
            CostItem::MachineryDepreciation => &mut self.machinery_depreciation,
            CostItem::FacilityDepreciation => &mut self.facility_depreciation,
            CostItem::SoilManagement => &mut self.soil_management,
            CostItem::CapitalInsurance => &mut self.capital_insurance,
            CostItem::PermanentLabor => &mut self.permanent_labor,
            CostItem::CapitalRemuneration => &mut self.capital_remuneration,
            CostItem::LandRemuneration => &mut self.land_remuneration,
        }
    }

    pub fn get(&self, item: CostItem) -> Money {
        match item {
            CostItem::MachineryOperation => self.machinery_operation,
            CostItem::FacilityMaintenance => self.facility_maintenance,
            CostItem::TemporaryLabor => self.temporary_labor,
            CostItem::Seeds => self.seeds,
            CostItem::Fertilizers => self.fertilizers,
            CostItem::Pesticides => self.pesticides,
            CostItem::GeneralExpenses => self.general_expenses,
            CostItem::ExternalTransport => self.external_transport,
            CostItem::TechnicalAssistance => self.technical_assistance,
            CostItem::CropInsurance => self.crop_insurance,
            CostItem::MachineryDepreciation => self.machinery_depreciation,
            CostItem::FacilityDepreciation => self.facility_depreciation,
            CostItem::SoilManagement => self.soil_management,
            CostItem::CapitalInsurance => self.capital_insurance,
            CostItem::PermanentLabor => self.permanent_labor,
            CostItem::CapitalRemuneration => self.capital_remuneration,
            CostItem::LandRemuneration => self.land_remuneration,
        }
    }
}

/// Derived totals. Never edited directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostTotals {
    pub total_variable_costs: Money,
    pub total_fixed_costs: Money,
    pub operating_cost: Money,
    pub total_cost: Money,
}

impl CostTotals {
    fn from_items(items: &CostLineItems) -> Self {
        let sum_of = |category: CostCategory| -> Money {
            CostItem::ALL
                .iter()
                .filter(|item| item.category() == category)
                .map(|item| items.get(*item))
                .sum()
        };
        let total_variable_costs = sum_of(CostCategory::Variable);
        let total_fixed_costs = sum_of(CostCategory::Fixed);
        CostTotals {
            total_variable_costs,
            total_fixed_costs,
            operating_cost: total_variable_costs,
            total_cost: total_variable_costs + total_fixed_costs,
        }
    }
}

/// A line as handed to the workbook compiler: label, group and per-hectare value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostLine {
    pub label: String,
    pub category: CostCategory,
    pub per_hectare: Money,
}

/// Cost ledger with its derived totals kept in sync.
///
/// Deserializes from the bare line items; any totals present in the input are
/// ignored and recomputed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "CostLineItems")]
pub struct CostStructure {
    #[serde(flatten)]
    items: CostLineItems,
    #[serde(flatten)]
    totals: CostTotals,
}

impl From<CostLineItems> for CostStructure {
    fn from(items: CostLineItems) -> Self {
        let totals = CostTotals::from_items(&items);
        CostStructure { items, totals }
    }
}

impl CostStructure {
    pub fn new(items: CostLineItems) -> Self {
        Self::from(items)
    }

    /// Reference soybean budget (per hectare).
    pub fn reference() -> Self {
        Self::new(CostLineItems {
            machinery_operation: dec!(414.14),
            facility_maintenance: dec!(55.33),
            temporary_labor: dec!(68.40),
            seeds: dec!(761.40),
            fertilizers: dec!(924.34),
            pesticides: dec!(493.48),
            general_expenses: dec!(51.46),
            external_transport: dec!(188.10),
            technical_assistance: dec!(55.37),
            crop_insurance: dec!(165.74),
            machinery_depreciation: dec!(410.21),
            facility_depreciation: dec!(73.78),
            soil_management: dec!(159.33),
            capital_insurance: dec!(44.31),
            permanent_labor: dec!(254.94),
            capital_remuneration: dec!(296.38),
            land_remuneration: dec!(1453.92),
        })
    }

    pub fn items(&self) -> &CostLineItems {
        &self.items
    }

    pub fn get(&self, item: CostItem) -> Money {
        self.items.get(item)
    }

    /// Replace one line item and recompute every total.
    pub fn set(&mut self, item: CostItem, value: Money) {
        *self.items.slot(item) = value;
        self.totals = CostTotals::from_items(&self.items);
    }

    pub fn totals(&self) -> &CostTotals {
        &self.totals
    }

    pub fn total_variable_costs(&self) -> Money {
        self.totals.total_variable_costs
    }

    pub fn total_fixed_costs(&self) -> Money {
        self.totals.total_fixed_costs
    }

    pub fn operating_cost(&self) -> Money {
        self.totals.operating_cost
    }

    pub fn total_cost(&self) -> Money {
        self.totals.total_cost
    }

    /// Operating cost of the whole cultivated area, as fed to the engine.
    pub fn operating_cost_for_area(&self, area: Real) -> Real {
        to_real(self.totals.operating_cost) * area
    }

    /// Ledger lines in order, for the workbook compiler.
    pub fn lines(&self) -> Vec<CostLine> {
        CostItem::ALL
            .iter()
            .map(|item| CostLine {
                label: item.label().to_string(),
                category: item.category(),
                per_hectare: self.items.get(*item),
            })
            .collect()
    }
}

impl Default for CostStructure {
    fn default() -> Self {
        Self::new(CostLineItems {
            machinery_operation: Decimal::ZERO,
            facility_maintenance: Decimal::ZERO,
            temporary_labor: Decimal::ZERO,
            seeds: Decimal::ZERO,
            fertilizers: Decimal::ZERO,
            pesticides: Decimal::ZERO,
            general_expenses: Decimal::ZERO,
            external_transport: Decimal::ZERO,
            technical_assistance: Decimal::ZERO,
            crop_insurance: Decimal::ZERO,
            machinery_depreciation: Decimal::ZERO,
            facility_depreciation: Decimal::ZERO,
            soil_management: Decimal::ZERO,
            capital_insurance: Decimal::ZERO,
            permanent_labor: Decimal::ZERO,
            capital_remuneration: Decimal::ZERO,
            land_remuneration: Decimal::ZERO,
        })
    }
}

/// Decimal ledger amount as an engine double.
pub fn to_real(value: Money) -> Real {
    value.to_f64().unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_reference_totals() {
        let costs = CostStructure::reference();
        assert_eq!(costs.total_variable_costs(), dec!(3177.76));
        assert_eq!(costs.total_fixed_costs(), dec!(2692.87));
        assert_eq!(costs.operating_cost(), dec!(3177.76));
        assert_eq!(costs.total_cost(), dec!(5870.63));
    }

    #[test]
    fn test_set_recomputes_totals() {
        let mut costs = CostStructure::reference();
        costs.set(CostItem::Seeds, dec!(800.00));
        assert_eq!(costs.get(CostItem::Seeds), dec!(800.00));
        assert_eq!(costs.total_variable_costs(), dec!(3216.36));
        assert_eq!(costs.operating_cost(), costs.total_variable_costs());
        assert_eq!(costs.total_fixed_costs(), dec!(2692.87));

        costs.set(CostItem::LandRemuneration, Decimal::ZERO);
        assert_eq!(costs.total_fixed_costs(), dec!(1238.95));
        assert_eq!(
            costs.total_cost(),
            costs.total_variable_costs() + costs.total_fixed_costs()
        );
    }

    #[test]
    fn test_sum_invariants_hold_for_every_item() {
        let mut costs = CostStructure::default();
        for (i, item) in CostItem::ALL.iter().enumerate() {
            costs.set(*item, Decimal::from(i as u32 + 1));
        }
        // 1..=10 and 11..=17
        assert_eq!(costs.total_variable_costs(), Decimal::from(55));
        assert_eq!(costs.total_fixed_costs(), Decimal::from(98));
        assert_eq!(costs.total_cost(), Decimal::from(153));
    }

    #[test]
    fn test_category_counts() {
        let variable = CostItem::ALL
            .iter()
            .filter(|i| i.category() == CostCategory::Variable)
            .count();
        assert_eq!(variable, VARIABLE_ITEM_COUNT);
        assert_eq!(CostItem::ALL.len() - variable, FIXED_ITEM_COUNT);
    }

    #[test]
    fn test_deserialize_ignores_supplied_totals() {
        let mut json = serde_json::to_value(CostStructure::reference()).unwrap();
        json["total_cost"] = serde_json::json!("1.00");
        json["operating_cost"] = serde_json::json!("2.00");
        let costs: CostStructure = serde_json::from_value(json).unwrap();
        assert_eq!(costs.total_cost(), dec!(5870.63));
        assert_eq!(costs.operating_cost(), dec!(3177.76));
    }

    #[test]
    fn test_lines_in_ledger_order() {
        let lines = CostStructure::reference().lines();
        assert_eq!(lines.len(), COST_ITEM_COUNT);
        assert_eq!(lines[0].label, "Machinery Operation");
        assert_eq!(lines[9].category, CostCategory::Variable);
        assert_eq!(lines[10].category, CostCategory::Fixed);
        assert_eq!(lines[16].per_hectare, dec!(1453.92));
    }

    #[test]
    fn test_operating_cost_for_area() {
        let costs = CostStructure::reference();
        let total = costs.operating_cost_for_area(500.0);
        assert!((total - 1_588_880.0).abs() < 1e-6);
    }
}
