//! Compile a hedge position into a workbook of live formulas.
//!
//! Inputs become literal cells; every derived quantity becomes a formula over
//! those cells, built in the same operation order as the engine so the
//! evaluated workbook matches [`compute_outcome`](crate::engine::compute_outcome).

use serde::{Deserialize, Serialize};

use super::address::{CellRef, SheetKind};
use super::formula::Expr;
use super::grid::{Cell, Sheet, Workbook};
use super::layout::{
    Layout, Quantity, Row, ScenarioBlock, ScenarioColumn, SheetPlan, AREA_COL, COST_TOTAL_COL,
    LABEL_COL, PER_HECTARE_COL, UNIT_COL,
};
use crate::engine::HedgeInput;
use crate::model::costs::to_real;
use crate::model::hedge_lock::BUSHELS_PER_SACK;
use crate::model::{
    ensure_unique_ids, CostCategory, CostLine, HedgeLock, MarketPrices, ProductionEstimate,
    Scenario, SimulationInputs,
};
use crate::scenarios::ScenarioMetric;
use crate::HedgeResult;

/// Everything the compiler needs, as one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkbookInput {
    /// Ledger lines in order: the variable group, then the fixed group.
    pub cost_lines: Vec<CostLine>,
    pub market: MarketPrices,
    pub hedge_lock: HedgeLock,
    pub production: ProductionEstimate,
    pub simulation: SimulationInputs,
    #[serde(default)]
    pub scenarios: Vec<Scenario>,
}

impl WorkbookInput {
    pub fn from_hedge_input(input: &HedgeInput, scenarios: Vec<Scenario>) -> Self {
        WorkbookInput {
            cost_lines: input.costs.lines(),
            market: input.market,
            hedge_lock: input.hedge_lock.clone(),
            production: input.production,
            simulation: input.simulation,
            scenarios,
        }
    }
}

/// Build the workbook for `input`.
///
/// Fails with [`HedgeError::Configuration`](crate::HedgeError::Configuration) when the cost lines are not the
/// expected variable/fixed groups or two scenarios share an id.
pub fn compile_workbook(input: &WorkbookInput) -> HedgeResult<Workbook> {
    let span = tracing::debug_span!(
        "compile_workbook",
        scenarios = input.scenarios.len(),
        cost_lines = input.cost_lines.len()
    );
    let _guard = span.enter();

    ensure_unique_ids(&input.scenarios)?;

    let layout = Layout::new(&input.cost_lines, input.scenarios.len())?;
    let compiler = Compiler {
        input,
        layout: &layout,
    };

    let mut workbook = Workbook::new();
    for plan in layout.plans() {
        let sheet = compiler.sheet(plan);
        tracing::debug!(
            sheet = plan.kind.name(),
            rows = sheet.row_count(),
            formulas = sheet.formulas().count(),
            "sheet compiled"
        );
        workbook.push(sheet);
    }
    Ok(workbook)
}

struct Compiler<'a> {
    input: &'a WorkbookInput,
    layout: &'a Layout,
}

impl Compiler<'_> {
    fn at(&self, quantity: Quantity) -> Expr {
        Expr::cell(self.layout.addr(quantity))
    }

    fn sheet(&self, plan: &SheetPlan) -> Sheet {
        let mut sheet = Sheet::new(plan.kind);
        for (row, entry) in plan.rows.iter().enumerate() {
            let row = row as u32;
            match entry {
                Row::Title(text) | Row::Note(text) | Row::Section(text) => {
                    sheet.set(row, LABEL_COL, Cell::literal(*text));
                }
                Row::Blank => {}
                Row::Header(columns) => {
                    for (col, text) in columns.iter().enumerate() {
                        sheet.set(row, col as u32, Cell::literal(*text));
                    }
                }
                Row::Quantity {
                    quantity,
                    label,
                    unit,
                } => {
                    let at = self.layout.addr(*quantity);
                    sheet.set(row, LABEL_COL, Cell::literal(*label));
                    sheet.set(row, at.col, self.quantity(*quantity));
                    if plan.kind == SheetKind::Costs {
                        if let Some(expr) = self.per_hectare(*quantity) {
                            sheet.set(row, PER_HECTARE_COL, Cell::formula(plan.kind, expr));
                        }
                    } else if !unit.is_empty() {
                        sheet.set(row, UNIT_COL, Cell::literal(*unit));
                    }
                }
                Row::CostLine(index) => self.cost_line(&mut sheet, row, *index),
                Row::Scenario(index) => {
                    if let Some(block) = self.layout.scenarios() {
                        self.scenario_row(&mut sheet, block, *index);
                    }
                }
                Row::Best(metric) => {
                    if let Some(block) = self.layout.scenarios() {
                        self.best_row(&mut sheet, block, row, *metric);
                    }
                }
            }
        }
        sheet
    }

    fn cost_line(&self, sheet: &mut Sheet, row: u32, index: usize) {
        let line = &self.input.cost_lines[index];
        let total = self.layout.cost_line(index);
        let per_ha = total.with_col(PER_HECTARE_COL);
        let area = total.with_col(AREA_COL);
        sheet.set(row, LABEL_COL, Cell::literal(line.label.as_str()));
        sheet.set(row, PER_HECTARE_COL, Cell::literal(to_real(line.per_hectare)));
        sheet.set(row, AREA_COL, Cell::formula(SheetKind::Costs, self.at(Quantity::Area)));
        sheet.set(
            row,
            COST_TOTAL_COL,
            Cell::formula(SheetKind::Costs, Expr::cell(per_ha) * Expr::cell(area)),
        );
    }

    /// Per-hectare twin of a Costs total, written in the R$/ha column.
    fn per_hectare(&self, quantity: Quantity) -> Option<Expr> {
        let per_ha = |q: Quantity| Expr::cell(self.layout.addr(q).with_col(PER_HECTARE_COL));
        let expr = match quantity {
            Quantity::VariableCostsTotal => Expr::sum(
                self.layout
                    .cost_range(CostCategory::Variable, PER_HECTARE_COL),
            ),
            Quantity::FixedCostsTotal => {
                Expr::sum(self.layout.cost_range(CostCategory::Fixed, PER_HECTARE_COL))
            }
            Quantity::OperatingCost => per_ha(Quantity::VariableCostsTotal),
            Quantity::TotalCost => {
                per_ha(Quantity::VariableCostsTotal) + per_ha(Quantity::FixedCostsTotal)
            }
            _ => return None,
        };
        Some(expr)
    }

    /// The cell for one named quantity: a literal input or a formula.
    fn quantity(&self, quantity: Quantity) -> Cell {
        use Quantity as Q;
        let WorkbookInput {
            market,
            hedge_lock: lock,
            production,
            simulation: sim,
            ..
        } = self.input;

        let expr = match quantity {
            // Costs
            Q::VariableCostsTotal => {
                Expr::sum(self.layout.cost_range(CostCategory::Variable, COST_TOTAL_COL))
            }
            Q::FixedCostsTotal => {
                Expr::sum(self.layout.cost_range(CostCategory::Fixed, COST_TOTAL_COL))
            }
            Q::OperatingCost => self.at(Q::VariableCostsTotal),
            Q::TotalCost => self.at(Q::VariableCostsTotal) + self.at(Q::FixedCostsTotal),
            Q::OperatingCostPerSack => self.at(Q::OperatingCost) / self.at(Q::TotalSacks),
            Q::TotalCostPerSack => self.at(Q::TotalCost) / self.at(Q::TotalSacks),

            // Market Prices
            Q::FobPrice => return Cell::literal(market.fob_price),
            Q::CifPrice => return Cell::literal(market.cif_price),

            // Hedge Lock
            Q::LockDate => return Cell::literal(lock.lock_date.format("%Y-%m-%d").to_string()),
            Q::LockedSoyPrice => return Cell::literal(lock.locked_forward_soy_price),
            Q::LockedFxRate => return Cell::literal(lock.locked_forward_fx_rate),
            Q::ClosingSoyPrice => return Cell::literal(lock.closing_soy_price),
            Q::SpotFxRate => return Cell::literal(lock.spot_fx_rate),
            Q::BushelQuantity => return Cell::literal(lock.bushel_quantity),
            Q::RealizedPricePerSack => return Cell::literal(lock.realized_price_per_sack),
            Q::DollarNotional => self.at(Q::BushelQuantity) * self.at(Q::LockedSoyPrice),
            Q::LockedSacks => self.at(Q::BushelQuantity) / Expr::num(BUSHELS_PER_SACK),

            // Estimates
            Q::SacksPerHectare => return Cell::literal(production.sacks_per_hectare),
            Q::Area => return Cell::literal(production.area),
            Q::FreightCostTotal => return Cell::literal(production.freight_cost_total),
            Q::TotalSacks => self.at(Q::SacksPerHectare) * self.at(Q::Area),
            Q::FreightPerSack => self.at(Q::FreightCostTotal) / self.at(Q::TotalSacks),

            // Dashboard inputs
            Q::ChicagoPrice => return Cell::literal(sim.chicago_price),
            Q::PhysicalPrice => return Cell::literal(sim.physical_price),
            Q::FxRate => return Cell::literal(sim.fx_rate),
            Q::DeliveryMode => return Cell::literal(sim.delivery_mode.code()),
            Q::FreightCost => return Cell::literal(sim.freight_cost),

            // Dashboard outcome
            Q::ProtectedSacks => self.at(Q::LockedSacks),
            Q::ExposedSacks => self.at(Q::TotalSacks) - self.at(Q::ProtectedSacks),
            Q::CoverageRatio => self.at(Q::ProtectedSacks) / self.at(Q::TotalSacks),
            Q::SoyAdjustment => {
                (self.at(Q::LockedSoyPrice) - self.at(Q::ChicagoPrice)) * self.at(Q::BushelQuantity)
            }
            Q::FxAdjustment => {
                (self.at(Q::LockedFxRate) - self.at(Q::FxRate)) * self.at(Q::DollarNotional)
            }
            Q::RevenueProtected => {
                self.at(Q::PhysicalPrice) * self.at(Q::ProtectedSacks)
                    + self.at(Q::SoyAdjustment) * self.at(Q::FxRate)
                    + self.at(Q::FxAdjustment)
            }
            Q::RevenueExposed => self.at(Q::PhysicalPrice) * self.at(Q::ExposedSacks),
            Q::RevenueTotal => self.at(Q::RevenueProtected) + self.at(Q::RevenueExposed),
            Q::CostProtected => {
                self.at(Q::OperatingCost) * (self.at(Q::ProtectedSacks) / self.at(Q::TotalSacks))
            }
            Q::CostExposed => {
                self.at(Q::OperatingCost) * (self.at(Q::ExposedSacks) / self.at(Q::TotalSacks))
            }
            Q::ProfitProtected => self.at(Q::RevenueProtected) - self.at(Q::CostProtected),
            Q::ProfitExposed => self.at(Q::RevenueExposed) - self.at(Q::CostExposed),
            Q::ProfitTotal => self.at(Q::ProfitProtected) + self.at(Q::ProfitExposed),
            Q::ValuePerSackTotal => self.at(Q::RevenueTotal) / self.at(Q::TotalSacks),
            Q::ValuePerSackProtected => self.at(Q::RevenueProtected) / self.at(Q::ProtectedSacks),
            Q::ValuePerSackExposed => self.at(Q::PhysicalPrice),
            Q::MarginPct => self.at(Q::ProfitTotal) / self.at(Q::RevenueTotal) * Expr::num(100.0),
            Q::RoiPct => self.at(Q::ProfitTotal) / self.at(Q::OperatingCost) * Expr::num(100.0),
            Q::LockPremium => {
                self.at(Q::ValuePerSackProtected) - self.at(Q::RealizedPricePerSack)
            }
        };
        Cell::formula(quantity.sheet(), expr)
    }

    fn scenario_row(&self, sheet: &mut Sheet, block: &ScenarioBlock, index: usize) {
        use Quantity as Q;
        let scenario = &self.input.scenarios[index];
        let row = block.row(index);
        let col = |c: ScenarioColumn| Expr::cell(block.cell(index, c));
        let set = |sheet: &mut Sheet, c: ScenarioColumn, cell: Cell| sheet.set(row, c.index(), cell);

        set(sheet, ScenarioColumn::Name, Cell::literal(scenario.name.as_str()));
        set(sheet, ScenarioColumn::Kind, Cell::literal(scenario.kind.as_str()));
        set(sheet, ScenarioColumn::Chicago, Cell::literal(scenario.inputs.chicago_price));
        set(sheet, ScenarioColumn::Physical, Cell::literal(scenario.inputs.physical_price));
        set(sheet, ScenarioColumn::Fx, Cell::literal(scenario.inputs.fx_rate));

        // Dashboard revenue formula with this row's prices in place of the simulation inputs.
        let physical = || col(ScenarioColumn::Physical);
        let fx = || col(ScenarioColumn::Fx);
        let revenue = physical() * self.at(Q::ProtectedSacks)
            + (self.at(Q::LockedSoyPrice) - col(ScenarioColumn::Chicago))
                * self.at(Q::BushelQuantity)
                * fx()
            + (self.at(Q::LockedFxRate) - fx()) * self.at(Q::DollarNotional)
            + physical() * self.at(Q::ExposedSacks);
        let profit =
            col(ScenarioColumn::Revenue) - self.at(Q::CostProtected) - self.at(Q::CostExposed);
        let per_sack = col(ScenarioColumn::Revenue) / self.at(Q::TotalSacks);
        let margin = col(ScenarioColumn::Profit) / col(ScenarioColumn::Revenue) * Expr::num(100.0);
        let roi = col(ScenarioColumn::Profit) / self.at(Q::OperatingCost) * Expr::num(100.0);

        let host = SheetKind::Scenarios;
        set(sheet, ScenarioColumn::Revenue, Cell::formula(host, revenue));
        set(sheet, ScenarioColumn::Profit, Cell::formula(host, profit));
        set(sheet, ScenarioColumn::ValuePerSack, Cell::formula(host, per_sack));
        set(sheet, ScenarioColumn::MarginPct, Cell::formula(host, margin));
        set(sheet, ScenarioColumn::RoiPct, Cell::formula(host, roi));
    }

    fn best_row(&self, sheet: &mut Sheet, block: &ScenarioBlock, row: u32, metric: ScenarioMetric) {
        let host = SheetKind::Scenarios;
        let names = block.column(ScenarioColumn::Name);
        let values = block.column(ScenarioColumn::for_metric(metric));
        sheet.set(
            row,
            LABEL_COL,
            Cell::literal(format!("Best {}", metric.label())),
        );
        sheet.set(row, 1, Cell::formula(host, Expr::index_of_max(names, values)));
        sheet.set(row, 2, Cell::formula(host, Expr::max(values)));
    }
}

/// Cell of the Scenarios sheet naming the best scenario for `metric`.
pub fn best_name_cell(block: &ScenarioBlock, metric: ScenarioMetric) -> Option<CellRef> {
    block
        .best_row(metric)
        .map(|row| CellRef::new(SheetKind::Scenarios, row, 1))
}
