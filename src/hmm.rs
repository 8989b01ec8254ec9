//!
//! HMM calculation over one observation sequence
//!
//! # Overview of calculation
//!
//! x = x[0],...,x[n-1] : Emissions of length n
//! s : start state (emits nothing)
//!
//! Forward
//! F[i][k]
//!  = P(emits x[0:i+1]=x[0],...,x[i] and is in state k at i) for 0<=i<n
//!
//! Backward
//! B[i][k]
//!  = P(emits x[i+1:n] | in state k at i) for 0<=i<n, B[n-1][k] = 1
//!
//! Likelihood
//! P(x) = sum_k F[n-1][k] = sum_k F[i][k] B[i][k] (for any i)
//!
//! Viterbi
//! V[i][k]
//!  = max over paths of P(emits x[0:i+1] along the path and ends in k)
//!
//! All values are base-2 `LogProb`.
//!
pub mod backward;
pub mod forward;
pub mod freq;
pub mod table;
pub mod viterbi;

use crate::common::State;
use crate::model::{ModelParameters, StateSet};
use crate::prob::LogProb;
use fnv::FnvHashMap as HashMap;

pub use freq::{ExpectedCounts, HmmOutput};
pub use table::LogTable;

///
/// Model parameters compiled against a state set and a start state.
///
/// * `init[k]` = P(k | start)
/// * `trans[l][k]` = P(k | l)
/// * `emit[token][k]` = P(token | k)
///
/// Keys whose states are not in the state set are never used by the
/// dynamic programming and are dropped here.
///
#[derive(Debug, Clone)]
pub struct Hmm {
    states: StateSet,
    start_state: State,
    init: Vec<LogProb>,
    trans: Vec<Vec<LogProb>>,
    emit: HashMap<String, Vec<LogProb>>,
    /// emission row of a token that no state emits
    never: Vec<LogProb>,
}

impl Hmm {
    ///
    /// Compile `params` with the state set derived from its transitions.
    ///
    pub fn new(params: &ModelParameters, start_state: &str) -> Hmm {
        Hmm::with_states(params, params.state_set(), start_state)
    }
    ///
    /// Compile `params` with an explicit state iteration order.
    ///
    pub fn with_states(params: &ModelParameters, states: StateSet, start_state: &str) -> Hmm {
        let n = states.len();
        let mut init = vec![LogProb::absent(); n];
        let mut trans = vec![vec![LogProb::absent(); n]; n];
        for (t, &lp) in params.transitions.iter() {
            let k = match states.index_of(&t.to) {
                Some(k) => k,
                None => continue,
            };
            if t.from == start_state {
                init[k] = lp;
            }
            if let Some(l) = states.index_of(&t.from) {
                trans[l][k] = lp;
            }
        }
        let mut emit: HashMap<String, Vec<LogProb>> = HashMap::default();
        for (e, &lp) in params.emissions.iter() {
            if let Some(k) = states.index_of(&e.state) {
                emit.entry(e.token.clone())
                    .or_insert_with(|| vec![LogProb::absent(); n])[k] = lp;
            }
        }
        Hmm {
            states,
            start_state: start_state.to_string(),
            init,
            trans,
            emit,
            never: vec![LogProb::absent(); n],
        }
    }
    pub fn states(&self) -> &StateSet {
        &self.states
    }
    pub fn n_states(&self) -> usize {
        self.states.len()
    }
    pub fn start_state(&self) -> &str {
        &self.start_state
    }
    ///
    /// P(k | start)
    ///
    pub fn p_init(&self, k: usize) -> LogProb {
        self.init[k]
    }
    ///
    /// P(k | l)
    ///
    pub fn p_trans(&self, l: usize, k: usize) -> LogProb {
        self.trans[l][k]
    }
    ///
    /// P(token | k) for all k
    ///
    pub fn p_emits(&self, token: &str) -> &[LogProb] {
        self.emit.get(token).unwrap_or(&self.never)
    }
}
