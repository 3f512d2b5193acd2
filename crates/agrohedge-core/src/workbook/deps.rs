//! Dependency graph for formula cells.
//!
//! ```text
//! A → B  means  "B depends on A"  (A is a precedent of B)
//! ```
//!
//! Invariant: if A ∈ preds[B] then B ∈ succs[A], and no empty sets are stored.

use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::BTreeSet;

use super::address::CellRef;

#[derive(Default, Debug, Clone)]
pub struct DepGraph {
    /// For each formula cell, the cells it reads.
    preds: FxHashMap<CellRef, FxHashSet<CellRef>>,
    /// For each referenced cell, the formula cells reading it.
    succs: FxHashMap<CellRef, FxHashSet<CellRef>>,
}

impl DepGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn precedents(&self, cell: CellRef) -> impl Iterator<Item = CellRef> + '_ {
        self.preds
            .get(&cell)
            .into_iter()
            .flat_map(|s| s.iter().copied())
    }

    pub fn dependents(&self, cell: CellRef) -> impl Iterator<Item = CellRef> + '_ {
        self.succs
            .get(&cell)
            .into_iter()
            .flat_map(|s| s.iter().copied())
    }

    pub fn is_formula_cell(&self, cell: CellRef) -> bool {
        self.preds.contains_key(&cell)
    }

    pub fn formula_cell_count(&self) -> usize {
        self.preds.len()
    }

    /// Replace all precedents of `formula_cell` in one step.
    pub fn replace_edges(
        &mut self,
        formula_cell: CellRef,
        new_preds: impl IntoIterator<Item = CellRef>,
    ) {
        if let Some(old_preds) = self.preds.remove(&formula_cell) {
            for pred in old_preds {
                if let Some(deps) = self.succs.get_mut(&pred) {
                    deps.remove(&formula_cell);
                    if deps.is_empty() {
                        self.succs.remove(&pred);
                    }
                }
            }
        }

        let new_preds: FxHashSet<CellRef> = new_preds.into_iter().collect();
        if new_preds.is_empty() {
            return;
        }
        for pred in &new_preds {
            self.succs.entry(*pred).or_default().insert(formula_cell);
        }
        self.preds.insert(formula_cell, new_preds);
    }

    /// Order `cells` so every cell comes after the formula cells it reads.
    ///
    /// Ties are broken by address so the order is reproducible. On a cycle,
    /// returns the cells that could not be ordered.
    pub fn evaluation_order(
        &self,
        cells: impl IntoIterator<Item = CellRef>,
    ) -> Result<Vec<CellRef>, Vec<CellRef>> {
        let cells: BTreeSet<CellRef> = cells.into_iter().collect();
        let mut pending: FxHashMap<CellRef, usize> = cells
            .iter()
            .map(|cell| {
                let n = self.precedents(*cell).filter(|p| cells.contains(p)).count();
                (*cell, n)
            })
            .collect();

        let mut ready: BTreeSet<CellRef> = pending
            .iter()
            .filter(|(_, n)| **n == 0)
            .map(|(cell, _)| *cell)
            .collect();
        let mut order = Vec::with_capacity(cells.len());

        while let Some(cell) = ready.pop_first() {
            pending.remove(&cell);
            order.push(cell);
            for dep in self.dependents(cell) {
                if let Some(n) = pending.get_mut(&dep) {
                    *n -= 1;
                    if *n == 0 {
                        ready.insert(dep);
                    }
                }
            }
        }

        if pending.is_empty() {
            Ok(order)
        } else {
            let mut stuck: Vec<CellRef> = pending.into_keys().collect();
            stuck.sort();
            Err(stuck)
        }
    }
}
