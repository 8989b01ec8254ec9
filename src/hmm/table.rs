//!
//! Dynamic programming table of log probabilities
//!
use crate::prob::LogProb;

///
/// `n_positions x n_states` table, `table[i][k]` for position `i` and state
/// index `k`. Every cell starts absent.
///
#[derive(Debug, Clone, PartialEq)]
pub struct LogTable {
    n_states: usize,
    cells: Vec<LogProb>,
}

impl LogTable {
    pub fn new(n_positions: usize, n_states: usize) -> LogTable {
        LogTable {
            n_states,
            cells: vec![LogProb::absent(); n_positions * n_states],
        }
    }
    pub fn n_states(&self) -> usize {
        self.n_states
    }
    pub fn n_positions(&self) -> usize {
        if self.n_states == 0 {
            0
        } else {
            self.cells.len() / self.n_states
        }
    }
    #[inline]
    pub fn get(&self, i: usize, k: usize) -> LogProb {
        self.cells[i * self.n_states + k]
    }
    #[inline]
    pub fn set(&mut self, i: usize, k: usize, value: LogProb) {
        self.cells[i * self.n_states + k] = value;
    }
    ///
    /// All states at position `i`
    ///
    pub fn column(&self, i: usize) -> &[LogProb] {
        &self.cells[i * self.n_states..(i + 1) * self.n_states]
    }
    ///
    /// log-sum over states at position `i`
    ///
    pub fn sum_at(&self, i: usize) -> LogProb {
        self.column(i).iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prob::p;

    #[test]
    fn table_ops() {
        let mut t = LogTable::new(3, 2);
        assert_eq!(t.n_positions(), 3);
        assert!(t.get(2, 1).is_absent());
        t.set(1, 0, p(0.25));
        t.set(1, 1, p(0.25));
        assert_eq!(t.column(1), &[p(0.25), p(0.25)]);
        assert_abs_diff_eq!(t.sum_at(1), p(0.5), epsilon = 1e-12);
        assert!(t.sum_at(0).is_absent());
    }
}
