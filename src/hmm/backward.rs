//!
//! Backward algorithm definitions
//!
use super::table::LogTable;
use super::Hmm;
use crate::prob::LogProb;

///
/// Backward Algorithm
///
impl Hmm {
    ///
    /// Run Backward algorithm to the emissions
    ///
    /// `B[i][k]` = P(emits `x[i+1:] = x[i+1], ..., x[n-1]` | in state `k` at `i`)
    ///
    pub fn backward<T: AsRef<str>>(&self, emissions: &[T]) -> LogTable {
        let n = emissions.len();
        let mut table = LogTable::new(n, self.n_states());
        // feed the emissions backward
        for i in (0..n).rev() {
            if i == n - 1 {
                self.b_init(&mut table, i);
            } else {
                self.b_step(&mut table, i, emissions[i + 1].as_ref());
            }
        }
        table
    }
    ///
    /// log-likelihood of the emissions computed from the backward table
    ///
    /// ```text
    /// P(x) = sum_k P(k | start) P(x[0] | k) B[0][k]
    /// ```
    pub fn backward_prob<T: AsRef<str>>(&self, emissions: &[T]) -> LogProb {
        if emissions.is_empty() {
            return LogProb::absent();
        }
        let b = self.backward(emissions);
        let p_emits = self.p_emits(emissions[0].as_ref());
        (0..self.n_states())
            .map(|k| (self.p_init(k) * p_emits[k]) * b.get(0, k))
            .sum()
    }
    ///
    /// ```text
    /// B[n-1][k] = 1
    /// ```
    fn b_init(&self, table: &mut LogTable, last: usize) {
        for k in 0..self.n_states() {
            table.set(last, k, LogProb::one());
        }
    }
    ///
    /// Fill position `i` from position `i+1`
    ///
    /// ```text
    /// B[i][k] = sum_l P(l | k) P(x[i+1] | l) B[i+1][l]
    /// ```
    fn b_step(&self, table: &mut LogTable, i: usize, next_emission: &str) {
        let p_emits = self.p_emits(next_emission);
        for k in 0..self.n_states() {
            let p: LogProb = (0..self.n_states())
                .map(|l| (self.p_trans(k, l) * p_emits[l]) * table.get(i + 1, l))
                .sum();
            table.set(i, k, p);
        }
    }
}
