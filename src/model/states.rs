//!
//! State inventory of a model
//!
use super::LogProbMap;
use crate::common::{State, Transition};
use fnv::FnvHashMap as HashMap;
use std::collections::BTreeSet;

///
/// Distinct `to` states of all transitions, in a fixed (sorted) order.
///
/// States reachable only through emissions are not part of it. The order is
/// the state iteration order used by forward/backward and by Viterbi
/// tie-breaking, so it must not depend on hash order.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateSet {
    states: Vec<State>,
    index: HashMap<State, usize>,
}

impl StateSet {
    pub fn from_transitions(transitions: &LogProbMap<Transition>) -> StateSet {
        let sorted: BTreeSet<&State> = transitions.keys().map(|t| &t.to).collect();
        StateSet::from_states(sorted.into_iter().cloned().collect())
    }
    ///
    /// State set in the given order. Duplicated states are ignored.
    ///
    pub fn from_states(states: Vec<State>) -> StateSet {
        let mut uniq = Vec::with_capacity(states.len());
        let mut index = HashMap::default();
        for state in states {
            if !index.contains_key(&state) {
                index.insert(state.clone(), uniq.len());
                uniq.push(state);
            }
        }
        StateSet {
            states: uniq,
            index,
        }
    }
    pub fn len(&self) -> usize {
        self.states.len()
    }
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
    /// state of the index
    pub fn state(&self, k: usize) -> &State {
        &self.states[k]
    }
    /// index of the state, if it is in the set
    pub fn index_of(&self, state: &str) -> Option<usize> {
        self.index.get(state).copied()
    }
    pub fn contains(&self, state: &str) -> bool {
        self.index.contains_key(state)
    }
    /// iterator of `(index, &State)`
    pub fn iter(&self) -> impl Iterator<Item = (usize, &State)> + '_ {
        self.states.iter().enumerate()
    }
    pub fn as_slice(&self) -> &[State] {
        &self.states
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prob::p;

    #[test]
    fn state_set_from_transitions() {
        let mut t = LogProbMap::default();
        for (a, b) in [("#", "V"), ("#", "C"), ("V", "V"), ("V", "C"), ("C", "V")].iter() {
            t.insert(Transition::new(*a, *b), p(0.5));
        }
        let s = StateSet::from_transitions(&t);
        assert_eq!(s.as_slice(), &["C".to_string(), "V".to_string()]);
        assert!(!s.contains("#"));
        assert_eq!(s.index_of("V"), Some(1));
        assert_eq!(s.state(0), "C");
    }
    #[test]
    fn state_set_dedup() {
        let s = StateSet::from_states(vec!["b".into(), "a".into(), "b".into()]);
        assert_eq!(s.len(), 2);
        assert_eq!(s.index_of("a"), Some(1));
    }
}
