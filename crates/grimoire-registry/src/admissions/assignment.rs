//! Weighted grimoire draw and the one-shot assignment that records it.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Mutex;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use serde::Serialize;
use tracing::debug;

use super::domain::{Assignment, CloverCategory, Request};
use super::repository::AdmissionTransaction;
use super::service::{ConflictReason, RegistryError};

/// Default clover weights: one and two leaves are common, five leaves are very rare.
pub const STANDARD_WEIGHTS: [(CloverCategory, f64); 5] = [
    (CloverCategory::OneLeafClover, 4.0),
    (CloverCategory::TwoLeafClover, 3.0),
    (CloverCategory::ThreeLeafClover, 2.0),
    (CloverCategory::FourLeafClover, 1.0),
    (CloverCategory::FiveLeafClover, 0.5),
];

/// Rejections raised when building a custom [`WeightTable`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WeightTableError {
    #[error("weight table must contain at least one category")]
    Empty,
    #[error("weight for {category} must be positive and finite, found {weight}")]
    InvalidWeight {
        category: CloverCategory,
        weight: f64,
    },
    #[error("category {0} appears more than once")]
    DuplicateCategory(CloverCategory),
    #[error("weights must sum to a finite total")]
    TotalOverflow,
}

/// Immutable category → weight mapping. Higher weight means more common.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightTable {
    entries: Vec<(CloverCategory, f64)>,
    total: f64,
}

impl WeightTable {
    pub fn new(
        entries: impl IntoIterator<Item = (CloverCategory, f64)>,
    ) -> Result<Self, WeightTableError> {
        let entries: Vec<(CloverCategory, f64)> = entries.into_iter().collect();
        if entries.is_empty() {
            return Err(WeightTableError::Empty);
        }

        let mut seen = BTreeSet::new();
        for &(category, weight) in &entries {
            if !weight.is_finite() || weight <= 0.0 {
                return Err(WeightTableError::InvalidWeight { category, weight });
            }
            if !seen.insert(category) {
                return Err(WeightTableError::DuplicateCategory(category));
            }
        }

        let total: f64 = entries.iter().map(|(_, weight)| weight).sum();
        if !total.is_finite() {
            return Err(WeightTableError::TotalOverflow);
        }
        Ok(Self { entries, total })
    }

    pub fn standard() -> Self {
        Self {
            entries: STANDARD_WEIGHTS.to_vec(),
            total: STANDARD_WEIGHTS.iter().map(|(_, weight)| weight).sum(),
        }
    }

    pub fn entries(&self) -> &[(CloverCategory, f64)] {
        &self.entries
    }

    pub fn total_weight(&self) -> f64 {
        self.total
    }

    pub fn weight_of(&self, category: CloverCategory) -> Option<f64> {
        self.entries
            .iter()
            .find(|(candidate, _)| *candidate == category)
            .map(|(_, weight)| *weight)
    }

    /// Expected share of draws landing on `category`.
    pub fn probability_of(&self, category: CloverCategory) -> f64 {
        self.weight_of(category)
            .map(|weight| weight / self.total)
            .unwrap_or(0.0)
    }

    fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> (CloverCategory, f64) {
        let mut remaining = rng.gen_range(0.0..self.total);
        for &(category, weight) in &self.entries {
            if remaining < weight {
                return (category, weight);
            }
            remaining -= weight;
        }
        // Rounding can leave a sliver past the final bucket.
        self.entries[self.entries.len() - 1]
    }
}

impl Default for WeightTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Single weighted draw.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Draw {
    pub category: CloverCategory,
    pub weight: f64,
}

/// Performs weighted draws and records the winning category for approved requests.
pub struct AssignmentEngine {
    table: WeightTable,
    rng: Mutex<Box<dyn RngCore + Send>>,
}

impl fmt::Debug for AssignmentEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssignmentEngine")
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

impl AssignmentEngine {
    /// Engine drawing from an entropy-seeded generator.
    pub fn new(table: WeightTable) -> Self {
        Self::with_rng(table, StdRng::from_entropy())
    }

    /// Engine with a reproducible draw sequence.
    pub fn seeded(table: WeightTable, seed: u64) -> Self {
        Self::with_rng(table, StdRng::seed_from_u64(seed))
    }

    pub fn with_rng<G>(table: WeightTable, rng: G) -> Self
    where
        G: RngCore + Send + 'static,
    {
        Self {
            table,
            rng: Mutex::new(Box::new(rng)),
        }
    }

    pub fn table(&self) -> &WeightTable {
        &self.table
    }

    pub fn draw(&self) -> Draw {
        // A panic mid-draw cannot leave the generator in an unusable state.
        let mut rng = self
            .rng
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let (category, weight) = self.table.pick(&mut **rng);
        Draw { category, weight }
    }

    /// Draw a category for `request` and persist the assignment through `tx`.
    ///
    /// Fails with a conflict when the request already holds an assignment. The draw is not
    /// retried: if persistence fails the result is discarded and the error is returned.
    pub fn assign(
        &self,
        tx: &mut dyn AdmissionTransaction,
        request: &Request,
    ) -> Result<Draw, RegistryError> {
        if tx.assignment(&request.identity)?.is_some() {
            return Err(RegistryError::Conflict(ConflictReason::DuplicateAssignment(
                request.identity.clone(),
            )));
        }

        let draw = self.draw();
        tx.insert_assignment(Assignment {
            request_identity: request.identity.clone(),
            category: draw.category,
            rarity_weight: draw.weight,
            assigned_at: Utc::now(),
        })?;

        debug!(identity = %request.identity, category = %draw.category, "grimoire drawn");
        Ok(draw)
    }
}

impl Default for AssignmentEngine {
    fn default() -> Self {
        Self::new(WeightTable::standard())
    }
}
