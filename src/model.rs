//!
//! Model parameters of HMM
//!
//! Two tables of base-2 log probabilities
//!
//! * transitions `P(to | from)` keyed by `Transition`
//! * emissions `P(token | state)` keyed by `Emission`
//!
//! A `ModelParameters` is built once per iteration (seeded randomly at
//! iteration 0, aggregated afterwards) and then only read.
//!
pub mod definitions;
pub mod states;
pub mod text;

use crate::common::{Emission, Grouped, Transition};
use crate::error::{HmmError, Result};
use crate::prob::LogProb;
use fnv::FnvHashMap as HashMap;
use std::hash::Hash;

pub use definitions::InitialModel;
pub use states::StateSet;
pub use text::TextSource;

/// Map from a parameter key to its log probability (or log count)
pub type LogProbMap<K> = HashMap<K, LogProb>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelParameters {
    pub transitions: LogProbMap<Transition>,
    pub emissions: LogProbMap<Emission>,
}

impl ModelParameters {
    pub fn new(
        transitions: LogProbMap<Transition>,
        emissions: LogProbMap<Emission>,
    ) -> ModelParameters {
        ModelParameters {
            transitions,
            emissions,
        }
    }
    ///
    /// `log P(to | from)`, absent if the key is not in the model
    ///
    pub fn transition(&self, from: &str, to: &str) -> LogProb {
        self.transitions
            .get(&Transition::new(from, to))
            .copied()
            .unwrap_or_default()
    }
    ///
    /// `log P(token | state)`, absent if the key is not in the model
    ///
    pub fn emission(&self, state: &str, token: &str) -> LogProb {
        self.emissions
            .get(&Emission::new(state, token))
            .copied()
            .unwrap_or_default()
    }
    pub fn n_transitions(&self) -> usize {
        self.transitions.len()
    }
    pub fn n_emissions(&self) -> usize {
        self.emissions.len()
    }
    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty() && self.emissions.is_empty()
    }
    ///
    /// Full state inventory (distinct `to` of transitions)
    ///
    pub fn state_set(&self) -> StateSet {
        StateSet::from_transitions(&self.transitions)
    }
    ///
    /// Normalize both tables per group
    ///
    pub fn normalize(&mut self) {
        normalize(&mut self.transitions);
        normalize(&mut self.emissions);
    }
    ///
    /// Check that every group of both tables sums to 1.0 within `epsilon`
    ///
    pub fn is_normalized(&self, epsilon: f64) -> bool {
        let ok = |sums: HashMap<String, f64>| sums.values().all(|s| (s - 1.0).abs() < epsilon);
        ok(group_sums(&self.transitions)) && ok(group_sums(&self.emissions))
    }
    ///
    /// Add all keys of `other` into this model.
    /// Fails with `DuplicateKey` if a key is present in both.
    ///
    pub fn merge(&mut self, other: ModelParameters, location: &str) -> Result<()> {
        for (key, value) in other.transitions {
            if self.transitions.contains_key(&key) {
                return Err(HmmError::duplicate(key, location));
            }
            self.transitions.insert(key, value);
        }
        for (key, value) in other.emissions {
            if self.emissions.contains_key(&key) {
                return Err(HmmError::duplicate(key, location));
            }
            self.emissions.insert(key, value);
        }
        Ok(())
    }
}

///
/// Normalize log values so that, for each distinct group, the values
/// sum to 1.0 in probability space.
///
/// ```text
/// lp(k) <- lp(k) - log sum_{k': group(k') = group(k)} 2^lp(k')
/// ```
///
/// Absent entries (no mass) are removed.
///
pub fn normalize<K: Grouped + Eq + Hash>(map: &mut LogProbMap<K>) {
    map.retain(|_, v| !v.is_absent());
    let mut sums: HashMap<String, LogProb> = HashMap::default();
    for (key, &value) in map.iter() {
        *sums.entry(key.group().to_string()).or_default() += value;
    }
    for (key, value) in map.iter_mut() {
        *value = *value / sums[key.group()];
    }
}

///
/// Sum of probabilities (not logs) for each group
///
pub fn group_sums<K: Grouped>(map: &LogProbMap<K>) -> HashMap<String, f64> {
    let mut sums: HashMap<String, f64> = HashMap::default();
    for (key, value) in map.iter() {
        *sums.entry(key.group().to_string()).or_default() += value.to_value();
    }
    sums
}
