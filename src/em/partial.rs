//!
//! Keyed partial statistics emitted by the expectation step
//!
use crate::common::{Emission, Grouped, State, Transition};
use crate::hmm::ExpectedCounts;
use crate::prob::LogProb;
use fnv::FnvHasher;
use std::hash::{Hash, Hasher};

///
/// Grouping key of partials sent to one aggregation unit.
///
/// Transitions are grouped by `from`, emissions by their state, so both
/// tables of one state meet in the same group. All alpha partials share the
/// reserved `Alpha` key.
///
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GroupKey {
    State(State),
    Alpha,
}

impl GroupKey {
    ///
    /// Output file index of this key, stable across runs.
    ///
    pub fn partition(&self, n_partitions: usize) -> usize {
        let mut hasher = FnvHasher::default();
        self.hash(&mut hasher);
        (hasher.finish() % n_partitions.max(1) as u64) as usize
    }
}

impl std::fmt::Display for GroupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            GroupKey::State(state) => write!(f, "{}", state),
            GroupKey::Alpha => write!(f, "<alpha>"),
        }
    }
}

///
/// One log-domain statistic of one sequence
///
#[derive(Clone, Debug, PartialEq)]
pub enum Partial {
    /// expected count of a transition
    Transition(Transition, LogProb),
    /// expected count of an emission
    Emission(Emission, LogProb),
    /// sequence log-likelihood
    Alpha(LogProb),
}

impl Partial {
    pub fn group_key(&self) -> GroupKey {
        match self {
            Partial::Transition(t, _) => GroupKey::State(t.group().to_string()),
            Partial::Emission(e, _) => GroupKey::State(e.group().to_string()),
            Partial::Alpha(_) => GroupKey::Alpha,
        }
    }
    pub fn value(&self) -> LogProb {
        match self {
            Partial::Transition(_, v) | Partial::Emission(_, v) | Partial::Alpha(v) => *v,
        }
    }
    pub fn keyed(self) -> (GroupKey, Partial) {
        (self.group_key(), self)
    }
}

impl ExpectedCounts {
    ///
    /// Flatten into one alpha partial followed by every present count.
    ///
    pub fn into_partials(self) -> Vec<Partial> {
        let mut partials = Vec::with_capacity(1 + self.transitions.len() + self.emissions.len());
        partials.push(Partial::Alpha(self.log_alpha));
        partials.extend(
            self.transitions
                .into_iter()
                .filter(|(_, v)| !v.is_absent())
                .map(|(t, v)| Partial::Transition(t, v)),
        );
        partials.extend(
            self.emissions
                .into_iter()
                .filter(|(_, v)| !v.is_absent())
                .map(|(e, v)| Partial::Emission(e, v)),
        );
        partials
    }
}
