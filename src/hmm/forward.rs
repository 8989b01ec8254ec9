//!
//! Forward algorithm definitions
//!
use super::table::LogTable;
use super::Hmm;
use crate::prob::LogProb;

// wrappers and exposed functions
impl Hmm {
    ///
    /// Run Forward algorithm to the emissions
    ///
    /// `F[i][k]` = P(emits `x[:i+1] = x[0],...,x[i]` and now in state `k`)
    ///
    pub fn forward<T: AsRef<str>>(&self, emissions: &[T]) -> LogTable {
        let mut table = LogTable::new(emissions.len(), self.n_states());
        for (i, emission) in emissions.iter().enumerate() {
            if i == 0 {
                self.f_init(&mut table, emission.as_ref());
            } else {
                self.f_step(&mut table, i, emission.as_ref());
            }
        }
        table
    }
    ///
    /// log-likelihood of the emissions `P(x) = sum_k F[n-1][k]`
    ///
    /// absent if the model cannot emit the sequence (or it is empty).
    ///
    pub fn forward_prob<T: AsRef<str>>(&self, emissions: &[T]) -> LogProb {
        if emissions.is_empty() {
            return LogProb::absent();
        }
        self.forward(emissions).sum_at(emissions.len() - 1)
    }
    ///
    /// Fill the first position
    ///
    /// ```text
    /// F[0][k] = P(k | start) P(x[0] | k)
    /// ```
    fn f_init(&self, table: &mut LogTable, emission: &str) {
        let p_emits = self.p_emits(emission);
        for k in 0..self.n_states() {
            table.set(0, k, self.p_init(k) * p_emits[k]);
        }
    }
    ///
    /// Fill position `i > 0` from position `i-1`
    ///
    /// ```text
    /// F[i][k] = sum_l P(k | l) P(x[i] | k) F[i-1][l]
    /// ```
    fn f_step(&self, table: &mut LogTable, i: usize, emission: &str) {
        let p_emits = self.p_emits(emission);
        for k in 0..self.n_states() {
            let p: LogProb = (0..self.n_states())
                .map(|l| (self.p_trans(l, k) * p_emits[k]) * table.get(i - 1, l))
                .sum();
            table.set(i, k, p);
        }
    }
}
