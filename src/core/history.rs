//! Transition history tracking.
//!
//! Every committed transition that changes the active configuration is
//! recorded with the trigger that caused it and a UTC timestamp.

use super::event::Trigger;
use super::state::StateValue;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

/// Record of a single transition.
///
/// # Example
///
/// ```rust
/// use harel::core::{StateValue, TransitionRecord, Trigger};
/// use chrono::Utc;
///
/// let record = TransitionRecord {
///     from: StateValue::from_path("relaxed"),
///     to: StateValue::from_path("toggled"),
///     trigger: Trigger::event("TOGGLE"),
///     timestamp: Utc::now(),
/// };
///
/// assert_eq!(record.trigger.event_type(), "TOGGLE");
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// The active configuration before the transition
    pub from: StateValue,
    /// The active configuration after the transition
    pub to: StateValue,
    /// The trigger whose candidate fired
    pub trigger: Trigger,
    /// When the transition was committed
    pub timestamp: DateTime<Utc>,
}

/// Ordered, bounded history of transitions.
///
/// Once `limit` records are held, recording a new one evicts the oldest.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StateHistory {
    records: VecDeque<TransitionRecord>,
    limit: usize,
}

impl Default for StateHistory {
    fn default() -> Self {
        Self::new(100)
    }
}

impl StateHistory {
    /// Create an empty history keeping at most `limit` records.
    pub fn new(limit: usize) -> Self {
        Self {
            records: VecDeque::new(),
            limit,
        }
    }

    /// Record a transition, evicting the oldest record when full.
    pub fn record(&mut self, record: TransitionRecord) {
        if self.limit == 0 {
            return;
        }
        while self.records.len() >= self.limit {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    /// Change the bound, evicting the oldest records if needed.
    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit;
        while self.records.len() > limit {
            self.records.pop_front();
        }
    }

    /// The state values traversed: the first `from`, then every `to`.
    pub fn get_path(&self) -> Vec<&StateValue> {
        let mut path = Vec::new();
        if let Some(first) = self.records.front() {
            path.push(&first.from);
        }
        for record in &self.records {
            path.push(&record.to);
        }
        path
    }

    /// Duration from the first to the last recorded transition.
    pub fn duration(&self) -> Option<Duration> {
        if let (Some(first), Some(last)) = (self.records.front(), self.records.back()) {
            last.timestamp
                .signed_duration_since(first.timestamp)
                .to_std()
                .ok()
        } else {
            None
        }
    }

    pub fn records(&self) -> impl Iterator<Item = &TransitionRecord> {
        self.records.iter()
    }

    pub fn last(&self) -> Option<&TransitionRecord> {
        self.records.back()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
