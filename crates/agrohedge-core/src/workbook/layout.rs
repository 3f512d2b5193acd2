//! Row layout of the hedge workbook.
//!
//! Every addressable quantity gets its cell from one table built up front from
//! the collection lengths (cost lines, scenarios). Formulas never compute an
//! address themselves; they ask [`Layout::addr`], so inserting a row in a plan
//! moves every reference to it.

use rustc_hash::FxHashMap;

use super::address::{CellRef, RangeRef, SheetKind};
use crate::error::HedgeError;
use crate::model::costs::{FIXED_ITEM_COUNT, VARIABLE_ITEM_COUNT};
use crate::model::{CostCategory, CostLine};
use crate::scenarios::ScenarioMetric;
use crate::HedgeResult;

/// Label column on every sheet.
pub const LABEL_COL: u32 = 0;
/// Per-hectare column on the Costs sheet.
pub const PER_HECTARE_COL: u32 = 1;
/// Area column on the Costs sheet.
pub const AREA_COL: u32 = 2;
/// Value column on the Costs sheet (per hectare times area).
pub const COST_TOTAL_COL: u32 = 3;
/// Value column on every other static sheet.
pub const VALUE_COL: u32 = 1;
/// Unit column on every other static sheet.
pub const UNIT_COL: u32 = 2;

/// Rows above the first scenario row: title, note, blank, column headers.
pub const SCENARIO_HEADER_ROWS: u32 = 4;

/// A named quantity with exactly one cell in the workbook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quantity {
    // Costs
    VariableCostsTotal,
    FixedCostsTotal,
    OperatingCost,
    TotalCost,
    OperatingCostPerSack,
    TotalCostPerSack,
    // Market Prices
    FobPrice,
    CifPrice,
    // Hedge Lock
    LockDate,
    LockedSoyPrice,
    LockedFxRate,
    ClosingSoyPrice,
    SpotFxRate,
    BushelQuantity,
    DollarNotional,
    LockedSacks,
    RealizedPricePerSack,
    // Estimates
    SacksPerHectare,
    Area,
    TotalSacks,
    FreightCostTotal,
    FreightPerSack,
    // Dashboard
    ChicagoPrice,
    PhysicalPrice,
    FxRate,
    DeliveryMode,
    FreightCost,
    ProtectedSacks,
    ExposedSacks,
    CoverageRatio,
    SoyAdjustment,
    FxAdjustment,
    RevenueProtected,
    RevenueExposed,
    RevenueTotal,
    CostProtected,
    CostExposed,
    ProfitProtected,
    ProfitExposed,
    ProfitTotal,
    ValuePerSackTotal,
    ValuePerSackProtected,
    ValuePerSackExposed,
    MarginPct,
    RoiPct,
    LockPremium,
}

impl Quantity {
    pub const ALL: [Quantity; 46] = [
        Quantity::VariableCostsTotal,
        Quantity::FixedCostsTotal,
        Quantity::OperatingCost,
        Quantity::TotalCost,
        Quantity::OperatingCostPerSack,
        Quantity::TotalCostPerSack,
        Quantity::FobPrice,
        Quantity::CifPrice,
        Quantity::LockDate,
        Quantity::LockedSoyPrice,
        Quantity::LockedFxRate,
        Quantity::ClosingSoyPrice,
        Quantity::SpotFxRate,
        Quantity::BushelQuantity,
        Quantity::DollarNotional,
        Quantity::LockedSacks,
        Quantity::RealizedPricePerSack,
        Quantity::SacksPerHectare,
        Quantity::Area,
        Quantity::TotalSacks,
        Quantity::FreightCostTotal,
        Quantity::FreightPerSack,
        Quantity::ChicagoPrice,
        Quantity::PhysicalPrice,
        Quantity::FxRate,
        Quantity::DeliveryMode,
        Quantity::FreightCost,
        Quantity::ProtectedSacks,
        Quantity::ExposedSacks,
        Quantity::CoverageRatio,
        Quantity::SoyAdjustment,
        Quantity::FxAdjustment,
        Quantity::RevenueProtected,
        Quantity::RevenueExposed,
        Quantity::RevenueTotal,
        Quantity::CostProtected,
        Quantity::CostExposed,
        Quantity::ProfitProtected,
        Quantity::ProfitExposed,
        Quantity::ProfitTotal,
        Quantity::ValuePerSackTotal,
        Quantity::ValuePerSackProtected,
        Quantity::ValuePerSackExposed,
        Quantity::MarginPct,
        Quantity::RoiPct,
        Quantity::LockPremium,
    ];

    /// The sheet the quantity lives on.
    pub fn sheet(self) -> SheetKind {
        use Quantity::*;
        match self {
            VariableCostsTotal | FixedCostsTotal | OperatingCost | TotalCost
            | OperatingCostPerSack | TotalCostPerSack => SheetKind::Costs,
            FobPrice | CifPrice => SheetKind::MarketPrices,
            LockDate | LockedSoyPrice | LockedFxRate | ClosingSoyPrice | SpotFxRate
            | BushelQuantity | DollarNotional | LockedSacks | RealizedPricePerSack => {
                SheetKind::HedgeLock
            }
            SacksPerHectare | Area | TotalSacks | FreightCostTotal | FreightPerSack => {
                SheetKind::Estimates
            }
            _ => SheetKind::Dashboard,
        }
    }
}

/// Columns of the Scenarios sheet, left to right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScenarioColumn {
    Name,
    Kind,
    Chicago,
    Physical,
    Fx,
    Revenue,
    Profit,
    ValuePerSack,
    MarginPct,
    RoiPct,
}

impl ScenarioColumn {
    pub const ALL: [ScenarioColumn; 10] = [
        ScenarioColumn::Name,
        ScenarioColumn::Kind,
        ScenarioColumn::Chicago,
        ScenarioColumn::Physical,
        ScenarioColumn::Fx,
        ScenarioColumn::Revenue,
        ScenarioColumn::Profit,
        ScenarioColumn::ValuePerSack,
        ScenarioColumn::MarginPct,
        ScenarioColumn::RoiPct,
    ];

    pub fn index(self) -> u32 {
        self as u32
    }

    pub fn header(self) -> &'static str {
        match self {
            ScenarioColumn::Name => "Name",
            ScenarioColumn::Kind => "Type",
            ScenarioColumn::Chicago => "Chicago",
            ScenarioColumn::Physical => "Physical",
            ScenarioColumn::Fx => "FX",
            ScenarioColumn::Revenue => "Revenue",
            ScenarioColumn::Profit => "Profit",
            ScenarioColumn::ValuePerSack => "Value/Sack",
            ScenarioColumn::MarginPct => "Margin%",
            ScenarioColumn::RoiPct => "ROI%",
        }
    }

    /// Column a ranking metric is read from.
    pub fn for_metric(metric: ScenarioMetric) -> Self {
        match metric {
            ScenarioMetric::RevenueTotal => ScenarioColumn::Revenue,
            ScenarioMetric::ProfitTotal => ScenarioColumn::Profit,
            ScenarioMetric::ValuePerSackTotal => ScenarioColumn::ValuePerSack,
            ScenarioMetric::RoiPct => ScenarioColumn::RoiPct,
        }
    }
}

/// One row of a sheet plan.
#[derive(Debug, Clone, PartialEq)]
pub enum Row {
    Title(&'static str),
    Note(&'static str),
    Blank,
    Header(Vec<&'static str>),
    Section(&'static str),
    Quantity {
        quantity: Quantity,
        label: &'static str,
        unit: &'static str,
    },
    /// Index into the cost line list.
    CostLine(usize),
    /// Index into the scenario list.
    Scenario(usize),
    Best(ScenarioMetric),
}

fn q(quantity: Quantity, label: &'static str, unit: &'static str) -> Row {
    Row::Quantity {
        quantity,
        label,
        unit,
    }
}

/// A sheet and its rows, top to bottom.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetPlan {
    pub kind: SheetKind,
    pub rows: Vec<Row>,
}

/// Position of the scenario rows and their comparative summary.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioBlock {
    first_row: u32,
    count: u32,
    best_rows: Vec<(ScenarioMetric, u32)>,
}

impl ScenarioBlock {
    pub fn len(&self) -> usize {
        self.count as usize
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn first_row(&self) -> u32 {
        self.first_row
    }

    pub fn last_row(&self) -> u32 {
        self.first_row + self.count - 1
    }

    /// Row of scenario `index`: `header rows + index`.
    pub fn row(&self, index: usize) -> u32 {
        self.first_row + index as u32
    }

    pub fn cell(&self, index: usize, column: ScenarioColumn) -> CellRef {
        CellRef::new(SheetKind::Scenarios, self.row(index), column.index())
    }

    /// The whole column across every scenario row.
    pub fn column(&self, column: ScenarioColumn) -> RangeRef {
        RangeRef::column(
            SheetKind::Scenarios,
            column.index(),
            self.first_row,
            self.last_row(),
        )
    }

    pub fn best_row(&self, metric: ScenarioMetric) -> Option<u32> {
        self.best_rows
            .iter()
            .find(|(m, _)| *m == metric)
            .map(|(_, row)| *row)
    }
}

/// Addresses of every cell the compiler writes, computed once.
#[derive(Debug, Clone)]
pub struct Layout {
    plans: Vec<SheetPlan>,
    addrs: FxHashMap<Quantity, CellRef>,
    cost_rows: Vec<u32>,
    variable_lines: (u32, u32),
    fixed_lines: (u32, u32),
    scenarios: Option<ScenarioBlock>,
}

impl Layout {
    /// Build the layout for `cost_lines` and `scenario_count` scenarios.
    ///
    /// The cost list must hold exactly the variable lines followed by the
    /// fixed lines; anything else cannot be laid out.
    pub fn new(cost_lines: &[CostLine], scenario_count: usize) -> HedgeResult<Self> {
        check_cost_shape(cost_lines)?;

        let mut plans = vec![
            costs_plan(),
            market_plan(),
            hedge_lock_plan(),
            estimates_plan(),
            dashboard_plan(),
        ];
        if scenario_count > 0 {
            plans.push(scenarios_plan(scenario_count));
        }

        let mut layout = Layout {
            plans: Vec::new(),
            addrs: FxHashMap::default(),
            cost_rows: vec![0; cost_lines.len()],
            variable_lines: (0, 0),
            fixed_lines: (0, 0),
            scenarios: None,
        };
        for plan in &plans {
            layout.place(plan)?;
        }
        for quantity in Quantity::ALL {
            if !layout.addrs.contains_key(&quantity) {
                return Err(HedgeError::Configuration {
                    context: "workbook layout".into(),
                    reason: format!("{quantity:?} has no row"),
                });
            }
        }
        layout.variable_lines = (layout.cost_rows[0], layout.cost_rows[VARIABLE_ITEM_COUNT - 1]);
        layout.fixed_lines = (
            layout.cost_rows[VARIABLE_ITEM_COUNT],
            layout.cost_rows[cost_lines.len() - 1],
        );
        layout.plans = plans;
        Ok(layout)
    }

    fn place(&mut self, plan: &SheetPlan) -> HedgeResult<()> {
        let mut block: Option<ScenarioBlock> = None;
        for (row, entry) in plan.rows.iter().enumerate() {
            let row = row as u32;
            match entry {
                Row::Quantity { quantity, .. } => {
                    if quantity.sheet() != plan.kind {
                        return Err(HedgeError::Configuration {
                            context: "workbook layout".into(),
                            reason: format!("{quantity:?} placed on {}", plan.kind),
                        });
                    }
                    let col = if plan.kind == SheetKind::Costs {
                        COST_TOTAL_COL
                    } else {
                        VALUE_COL
                    };
                    let cell = CellRef::new(plan.kind, row, col);
                    if self.addrs.insert(*quantity, cell).is_some() {
                        return Err(HedgeError::Configuration {
                            context: "workbook layout".into(),
                            reason: format!("{quantity:?} placed twice"),
                        });
                    }
                }
                Row::CostLine(index) => self.cost_rows[*index] = row,
                Row::Scenario(index) => {
                    let b = block.get_or_insert(ScenarioBlock {
                        first_row: row,
                        count: 0,
                        best_rows: Vec::new(),
                    });
                    debug_assert_eq!(b.row(*index), row);
                    b.count += 1;
                }
                Row::Best(metric) => {
                    if let Some(b) = block.as_mut() {
                        b.best_rows.push((*metric, row));
                    }
                }
                Row::Title(_) | Row::Note(_) | Row::Blank | Row::Header(_) | Row::Section(_) => {}
            }
        }
        if block.is_some() {
            self.scenarios = block;
        }
        Ok(())
    }

    pub fn plans(&self) -> &[SheetPlan] {
        &self.plans
    }

    /// Cell holding `quantity`.
    pub fn addr(&self, quantity: Quantity) -> CellRef {
        // Completeness is checked in `new`.
        self.addrs[&quantity]
    }

    /// Value cell (per hectare times area) of cost line `index`.
    pub fn cost_line(&self, index: usize) -> CellRef {
        CellRef::new(SheetKind::Costs, self.cost_rows[index], COST_TOTAL_COL)
    }

    /// The lines of one cost group in column `col`.
    pub fn cost_range(&self, category: CostCategory, col: u32) -> RangeRef {
        let (first, last) = match category {
            CostCategory::Variable => self.variable_lines,
            CostCategory::Fixed => self.fixed_lines,
        };
        RangeRef::column(SheetKind::Costs, col, first, last)
    }

    pub fn scenarios(&self) -> Option<&ScenarioBlock> {
        self.scenarios.as_ref()
    }
}

fn check_cost_shape(cost_lines: &[CostLine]) -> HedgeResult<()> {
    let shape_error = |reason: String| HedgeError::Configuration {
        context: "cost lines".into(),
        reason,
    };
    let expected = VARIABLE_ITEM_COUNT + FIXED_ITEM_COUNT;
    if cost_lines.len() != expected {
        return Err(shape_error(format!(
            "expected {expected} lines ({VARIABLE_ITEM_COUNT} variable, {FIXED_ITEM_COUNT} fixed), got {}",
            cost_lines.len()
        )));
    }
    for (i, line) in cost_lines.iter().enumerate() {
        let expected = if i < VARIABLE_ITEM_COUNT {
            CostCategory::Variable
        } else {
            CostCategory::Fixed
        };
        if line.category != expected {
            return Err(shape_error(format!(
                "line {} ({}) should be {expected:?}",
                i + 1,
                line.label
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Sheet plans
// ---------------------------------------------------------------------------

fn costs_plan() -> SheetPlan {
    let mut rows = vec![
        Row::Title("PRODUCTION COSTS"),
        Row::Note("Values per hectare (R$/ha); totals over the cultivated area"),
        Row::Blank,
        Row::Header(vec!["Variable Costs", "R$/ha", "Area (ha)", "Total (R$)"]),
    ];
    rows.extend((0..VARIABLE_ITEM_COUNT).map(Row::CostLine));
    rows.push(q(Quantity::VariableCostsTotal, "Total Variable Costs", ""));
    rows.push(Row::Blank);
    rows.push(Row::Header(vec!["Fixed Costs", "R$/ha", "Area (ha)", "Total (R$)"]));
    rows.extend((VARIABLE_ITEM_COUNT..VARIABLE_ITEM_COUNT + FIXED_ITEM_COUNT).map(Row::CostLine));
    rows.extend([
        q(Quantity::FixedCostsTotal, "Total Fixed Costs", ""),
        Row::Blank,
        Row::Section("TOTALS"),
        q(Quantity::OperatingCost, "Operating Cost", ""),
        q(Quantity::TotalCost, "Total Cost", ""),
        Row::Blank,
        q(Quantity::OperatingCostPerSack, "Operating Cost per Sack", ""),
        q(Quantity::TotalCostPerSack, "Total Cost per Sack", ""),
    ]);
    SheetPlan {
        kind: SheetKind::Costs,
        rows,
    }
}

fn market_plan() -> SheetPlan {
    SheetPlan {
        kind: SheetKind::MarketPrices,
        rows: vec![
            Row::Title("MARKET PRICES"),
            Row::Note("Physical soybean price per 60 kg sack by delivery mode"),
            Row::Blank,
            Row::Header(vec!["Delivery", "Price", "Unit"]),
            q(Quantity::FobPrice, "FOB", "R$/sack"),
            q(Quantity::CifPrice, "CIF", "R$/sack"),
        ],
    }
}

fn hedge_lock_plan() -> SheetPlan {
    SheetPlan {
        kind: SheetKind::HedgeLock,
        rows: vec![
            Row::Title("HEDGE LOCK"),
            Row::Note("Soy and FX NDF terms fixed at lock"),
            Row::Blank,
            Row::Header(vec!["Parameter", "Value", "Unit"]),
            q(Quantity::LockDate, "Lock Date", ""),
            q(Quantity::LockedSoyPrice, "Locked Forward Soy", "USD/bu"),
            q(Quantity::LockedFxRate, "Locked Forward FX", "BRL/USD"),
            q(Quantity::ClosingSoyPrice, "Chicago Close at Lock", "USD/bu"),
            q(Quantity::SpotFxRate, "Spot FX at Lock", "BRL/USD"),
            q(Quantity::BushelQuantity, "Locked Quantity", "bu"),
            Row::Blank,
            q(Quantity::DollarNotional, "Dollar Notional", "USD"),
            q(Quantity::LockedSacks, "Protected Sacks", "sacks"),
            q(Quantity::RealizedPricePerSack, "Realized Price at Lock", "R$/sack"),
        ],
    }
}

fn estimates_plan() -> SheetPlan {
    SheetPlan {
        kind: SheetKind::Estimates,
        rows: vec![
            Row::Title("PRODUCTION ESTIMATES"),
            Row::Blank,
            Row::Header(vec!["Item", "Value", "Unit"]),
            q(Quantity::SacksPerHectare, "Yield", "sacks/ha"),
            q(Quantity::Area, "Area", "ha"),
            q(Quantity::TotalSacks, "Total Production", "sacks"),
            Row::Blank,
            q(Quantity::FreightCostTotal, "Freight Cost", "R$"),
            q(Quantity::FreightPerSack, "Freight per Sack", "R$/sack"),
        ],
    }
}

fn dashboard_plan() -> SheetPlan {
    SheetPlan {
        kind: SheetKind::Dashboard,
        rows: vec![
            Row::Title("HEDGE DASHBOARD"),
            Row::Note("Simulated settlement of the locked position"),
            Row::Blank,
            Row::Section("SIMULATION INPUTS"),
            q(Quantity::ChicagoPrice, "Chicago Price", "USD/bu"),
            q(Quantity::PhysicalPrice, "Physical Price", "R$/sack"),
            q(Quantity::FxRate, "FX Rate", "BRL/USD"),
            q(Quantity::DeliveryMode, "Delivery Mode", ""),
            q(Quantity::FreightCost, "Freight Cost", "R$"),
            Row::Blank,
            Row::Section("VOLUMES"),
            q(Quantity::ProtectedSacks, "Protected Sacks", "sacks"),
            q(Quantity::ExposedSacks, "Exposed Sacks", "sacks"),
            q(Quantity::CoverageRatio, "Coverage", "ratio"),
            Row::Blank,
            Row::Section("ADJUSTMENTS"),
            q(Quantity::SoyAdjustment, "Soy NDF Adjustment", "USD"),
            q(Quantity::FxAdjustment, "FX NDF Adjustment", "R$"),
            Row::Blank,
            Row::Section("REVENUE"),
            q(Quantity::RevenueProtected, "Protected Revenue", "R$"),
            q(Quantity::RevenueExposed, "Exposed Revenue", "R$"),
            q(Quantity::RevenueTotal, "Total Revenue", "R$"),
            Row::Blank,
            Row::Section("COSTS"),
            q(Quantity::CostProtected, "Protected Cost", "R$"),
            q(Quantity::CostExposed, "Exposed Cost", "R$"),
            Row::Blank,
            Row::Section("PROFIT"),
            q(Quantity::ProfitProtected, "Protected Profit", "R$"),
            q(Quantity::ProfitExposed, "Exposed Profit", "R$"),
            q(Quantity::ProfitTotal, "Total Profit", "R$"),
            Row::Blank,
            Row::Section("INDICATORS"),
            q(Quantity::ValuePerSackTotal, "Value per Sack", "R$/sack"),
            q(Quantity::ValuePerSackProtected, "Protected Value per Sack", "R$/sack"),
            q(Quantity::ValuePerSackExposed, "Exposed Value per Sack", "R$/sack"),
            q(Quantity::MarginPct, "Margin", "%"),
            q(Quantity::RoiPct, "ROI", "%"),
            q(Quantity::LockPremium, "Lock Premium", "R$/sack"),
        ],
    }
}

fn scenarios_plan(count: usize) -> SheetPlan {
    let mut rows = vec![
        Row::Title("SAVED SCENARIOS"),
        Row::Note("Each row re-prices the locked position at the scenario's market inputs"),
        Row::Blank,
        Row::Header(ScenarioColumn::ALL.iter().map(|c| c.header()).collect()),
    ];
    debug_assert_eq!(rows.len() as u32, SCENARIO_HEADER_ROWS);
    rows.extend((0..count).map(Row::Scenario));
    rows.push(Row::Blank);
    rows.push(Row::Section("COMPARATIVE ANALYSIS"));
    rows.extend(ScenarioMetric::ALL.iter().map(|m| Row::Best(*m)));
    SheetPlan {
        kind: SheetKind::Scenarios,
        rows,
    }
}
