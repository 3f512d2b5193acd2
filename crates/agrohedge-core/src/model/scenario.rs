//! Saved what-if scenarios.
//!
//! A [`Scenario`] is a named, immutable snapshot of the simulation inputs.
//! [`ScenarioBook`] is the caller-owned ordered collection: scenarios are
//! appended or removed, never edited, and ids stay unique.

use chrono::{DateTime, Utc};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::HedgeError;
use crate::model::market::DeliveryMode;
use crate::types::Real;
use crate::HedgeResult;

/// The values a user can move when simulating settlement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationInputs {
    /// Chicago soy price at expiry (USD/bushel).
    pub chicago_price: Real,
    /// Physical price per sack.
    pub physical_price: Real,
    /// Ptax FX rate at expiry (BRL/USD).
    pub fx_rate: Real,
    #[serde(default)]
    pub delivery_mode: DeliveryMode,
    /// Freight cost per 60-ton load.
    #[serde(default)]
    pub freight_cost: Real,
}

impl SimulationInputs {
    /// Current market snapshot of the reference dataset.
    pub fn reference() -> Self {
        SimulationInputs {
            chicago_price: 11.29,
            physical_price: 134.00,
            fx_rate: 5.3832,
            delivery_mode: DeliveryMode::Cif,
            freight_cost: 8500.00,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKind {
    Optimistic,
    #[default]
    Realistic,
    Pessimistic,
    Custom,
}

impl ScenarioKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ScenarioKind::Optimistic => "optimistic",
            ScenarioKind::Realistic => "realistic",
            ScenarioKind::Pessimistic => "pessimistic",
            ScenarioKind::Custom => "custom",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScenarioId(String);

impl ScenarioId {
    pub fn new(id: impl Into<String>) -> Self {
        ScenarioId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub id: ScenarioId,
    pub name: String,
    pub kind: ScenarioKind,
    pub created_at: DateTime<Utc>,
    pub inputs: SimulationInputs,
}

impl Scenario {
    /// Build a scenario, rejecting a blank name.
    pub fn new(
        id: ScenarioId,
        name: impl Into<String>,
        kind: ScenarioKind,
        inputs: SimulationInputs,
        created_at: DateTime<Utc>,
    ) -> HedgeResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(HedgeError::InvalidInput {
                field: "name".into(),
                reason: "Scenario name must not be empty".into(),
            });
        }
        Ok(Scenario {
            id,
            name,
            kind,
            created_at,
            inputs,
        })
    }
}

/// Insertion-ordered scenario collection with unique ids.
///
/// Serializes as a plain array; deserializing re-validates every entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(into = "Vec<Scenario>", try_from = "Vec<Scenario>")]
pub struct ScenarioBook {
    scenarios: Vec<Scenario>,
    next_seq: u64,
}

impl ScenarioBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and append a scenario with a freshly assigned id.
    pub fn create(
        &mut self,
        name: impl Into<String>,
        kind: ScenarioKind,
        inputs: SimulationInputs,
        created_at: DateTime<Utc>,
    ) -> HedgeResult<&Scenario> {
        let mut seq = self.next_seq;
        let mut id = ScenarioId::new(format!("scenario-{seq}"));
        while self.contains(&id) {
            seq += 1;
            id = ScenarioId::new(format!("scenario-{seq}"));
        }
        let scenario = Scenario::new(id, name, kind, inputs, created_at)?;
        self.next_seq = seq + 1;
        self.scenarios.push(scenario);
        Ok(&self.scenarios[self.scenarios.len() - 1])
    }

    /// Append an already-built scenario; its id must be unused.
    pub fn insert(&mut self, scenario: Scenario) -> HedgeResult<()> {
        if scenario.name.trim().is_empty() {
            return Err(HedgeError::InvalidInput {
                field: "name".into(),
                reason: "Scenario name must not be empty".into(),
            });
        }
        if self.contains(&scenario.id) {
            return Err(HedgeError::InvalidInput {
                field: "id".into(),
                reason: format!("Scenario id '{}' already exists", scenario.id),
            });
        }
        self.scenarios.push(scenario);
        Ok(())
    }

    pub fn remove(&mut self, id: &ScenarioId) -> Option<Scenario> {
        let pos = self.scenarios.iter().position(|s| &s.id == id)?;
        Some(self.scenarios.remove(pos))
    }

    pub fn contains(&self, id: &ScenarioId) -> bool {
        self.scenarios.iter().any(|s| &s.id == id)
    }

    pub fn get(&self, id: &ScenarioId) -> Option<&Scenario> {
        self.scenarios.iter().find(|s| &s.id == id)
    }

    pub fn as_slice(&self) -> &[Scenario] {
        &self.scenarios
    }

    pub fn iter(&self) -> impl Iterator<Item = &Scenario> {
        self.scenarios.iter()
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }
}

/// Fail with [`HedgeError::Configuration`] when two scenarios share an id.
pub fn ensure_unique_ids(scenarios: &[Scenario]) -> HedgeResult<()> {
    let mut seen = FxHashSet::default();
    for scenario in scenarios {
        if !seen.insert(scenario.id.as_str()) {
            return Err(HedgeError::Configuration {
                context: "scenarios".into(),
                reason: format!("duplicate scenario id '{}'", scenario.id),
            });
        }
    }
    Ok(())
}

impl TryFrom<Vec<Scenario>> for ScenarioBook {
    type Error = HedgeError;

    fn try_from(scenarios: Vec<Scenario>) -> HedgeResult<Self> {
        let mut book = ScenarioBook::new();
        for scenario in scenarios {
            book.insert(scenario)?;
        }
        book.next_seq = book.scenarios.len() as u64;
        Ok(book)
    }
}

impl From<ScenarioBook> for Vec<Scenario> {
    fn from(book: ScenarioBook) -> Self {
        book.scenarios
    }
}
