//! # registry
//!
//! [`AlertRegistry`] — pending threshold conditions, grouped per destination.
//!
//! The registry itself is plain data; [`crate::state::AppState`] wraps it in a
//! single `tokio::sync::Mutex` so that every mutation (Command Surface and
//! alert evaluator alike) is serialised.

use std::collections::HashMap;

use chrono::Utc;
use rust_decimal::Decimal;

use crate::error::{EngineError, EngineResult};
use crate::models::{AlertCondition, AlertId, Destination, Side};

#[derive(Debug, Default)]
pub struct AlertRegistry {
    by_destination: HashMap<Destination, Vec<AlertCondition>>,
    next_id:        u64,
}

impl AlertRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a condition to `destination`'s list.  Duplicates are allowed and
    /// stay independent of each other.
    pub fn add_alert(
        &mut self,
        destination: &Destination,
        price: Decimal,
        side: Side,
    ) -> EngineResult<AlertCondition> {
        if price <= Decimal::ZERO {
            return Err(EngineError::InvalidInput(format!(
                "alert price must be positive, got {price}"
            )));
        }

        self.next_id += 1;
        let condition = AlertCondition {
            id:         AlertId(self.next_id),
            threshold:  price,
            side,
            created_at: Utc::now(),
        };

        self.by_destination
            .entry(destination.clone())
            .or_default()
            .push(condition.clone());

        Ok(condition)
    }

    /// Conditions for `destination` in insertion order; empty if none.
    pub fn list_alerts(&self, destination: &Destination) -> &[AlertCondition] {
        self.by_destination
            .get(destination)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Drop every condition of `destination`.  Returns how many were removed.
    pub fn clear_alerts(&mut self, destination: &Destination) -> usize {
        self.by_destination
            .remove(destination)
            .map(|conditions| conditions.len())
            .unwrap_or(0)
    }

    /// Remove exactly the given condition instances.  Ids that are no longer
    /// present are ignored.  Returns how many were removed.
    pub fn remove_triggered(&mut self, destination: &Destination, ids: &[AlertId]) -> usize {
        let Some(conditions) = self.by_destination.get_mut(destination) else {
            return 0;
        };

        let before = conditions.len();
        conditions.retain(|c| !ids.contains(&c.id));
        let removed = before - conditions.len();

        if conditions.is_empty() {
            self.by_destination.remove(destination);
        }
        removed
    }

    pub fn contains(&self, destination: &Destination, id: AlertId) -> bool {
        self.list_alerts(destination).iter().any(|c| c.id == id)
    }

    /// Owned copy of every non-empty destination's conditions, for evaluation
    /// outside the lock.  Destinations come out in a stable order.
    pub fn snapshot(&self) -> Vec<(Destination, Vec<AlertCondition>)> {
        let mut all: Vec<_> = self
            .by_destination
            .iter()
            .filter(|(_, conditions)| !conditions.is_empty())
            .map(|(dest, conditions)| (dest.clone(), conditions.clone()))
            .collect();
        all.sort_by(|a, b| a.0.cmp(&b.0));
        all
    }

    /// Drop every destination's conditions.  Returns how many were removed.
    pub fn clear_all(&mut self) -> usize {
        let total = self.pending_count();
        self.by_destination.clear();
        total
    }

    /// Total number of pending conditions across all destinations.
    pub fn pending_count(&self) -> usize {
        self.by_destination.values().map(Vec::len).sum()
    }
}
