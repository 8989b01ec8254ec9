//!
//! Expected counts (E-step of Baum-Welch) from forward/backward tables
//!
use super::table::LogTable;
use super::Hmm;
use crate::common::{Emission, Transition};
use crate::model::LogProbMap;
use crate::prob::LogProb;

///
/// Output of forward and backward runs of one emission sequence
///
#[derive(Debug, Clone)]
pub struct HmmOutput {
    /// table of forward run
    pub forward: LogTable,
    /// table of backward run
    pub backward: LogTable,
}

impl HmmOutput {
    fn new(forward: LogTable, backward: LogTable) -> Self {
        assert_eq!(forward.n_positions(), backward.n_positions());
        assert_eq!(forward.n_states(), backward.n_states());
        HmmOutput { forward, backward }
    }
    pub fn n_positions(&self) -> usize {
        self.forward.n_positions()
    }
    ///
    /// `P(x) = sum_k F[n-1][k]`, absent for an empty sequence
    ///
    pub fn to_full_prob_forward(&self) -> LogProb {
        match self.n_positions() {
            0 => LogProb::absent(),
            n => self.forward.sum_at(n - 1),
        }
    }
    ///
    /// `P(x) = sum_k F[i][k] B[i][k]` at position `i`.
    ///
    /// Equal to `to_full_prob_forward` for any `i`.
    ///
    pub fn to_full_prob_at(&self, i: usize) -> LogProb {
        self.forward
            .column(i)
            .iter()
            .zip(self.backward.column(i).iter())
            .map(|(&f, &b)| f * b)
            .sum()
    }
}

///
/// Expected counts of one sequence, already divided by its likelihood.
///
/// Only keys with non-zero counts are stored.
///
#[derive(Debug, Clone, PartialEq)]
pub struct ExpectedCounts {
    /// sequence log-likelihood `log P(x)`
    pub log_alpha: LogProb,
    pub transitions: LogProbMap<Transition>,
    pub emissions: LogProbMap<Emission>,
}

impl Hmm {
    ///
    /// Run forward and backward for the emissions and returns HmmOutput.
    ///
    pub fn run<T: AsRef<str>>(&self, emissions: &[T]) -> HmmOutput {
        let forward = self.forward(emissions);
        let backward = self.backward(emissions);
        HmmOutput::new(forward, backward)
    }
    ///
    /// Expected transition and emission counts of the emissions.
    ///
    /// `None` if the sequence is empty or has zero likelihood under this
    /// model; such a sequence contributes nothing.
    ///
    /// ```text
    /// boundary    (start, k): F[0][k] B[0][k]
    /// interior    (l, k):     sum_i F[i][l] P(k|l) P(x[i+1]|k) B[i+1][k]
    /// emission    (k, t):     sum_{i: x[i]=t} F[i][k] B[i][k]
    /// ```
    ///
    /// Each accumulated count is divided by `P(x)` once.
    ///
    pub fn expected_counts<T: AsRef<str>>(&self, emissions: &[T]) -> Option<ExpectedCounts> {
        let o = self.run(emissions);
        let log_alpha = o.to_full_prob_forward();
        if log_alpha.is_absent() {
            return None;
        }

        let mut transitions: LogProbMap<Transition> = LogProbMap::default();
        let mut emission_counts: LogProbMap<Emission> = LogProbMap::default();

        for (k, state) in self.states().iter() {
            let count = o.forward.get(0, k) * o.backward.get(0, k);
            *transitions
                .entry(Transition::new(self.start_state(), state.as_str()))
                .or_default() += count;
        }

        for i in 0..o.n_positions() - 1 {
            let p_emits = self.p_emits(emissions[i + 1].as_ref());
            for (l, from) in self.states().iter() {
                let f = o.forward.get(i, l);
                if f.is_absent() {
                    continue;
                }
                for (k, to) in self.states().iter() {
                    let count = f * self.p_trans(l, k) * p_emits[k] * o.backward.get(i + 1, k);
                    if count.is_absent() {
                        continue;
                    }
                    *transitions
                        .entry(Transition::new(from.as_str(), to.as_str()))
                        .or_default() += count;
                }
            }
        }

        for (i, emission) in emissions.iter().enumerate() {
            for (k, state) in self.states().iter() {
                let count = o.forward.get(i, k) * o.backward.get(i, k);
                if count.is_absent() {
                    continue;
                }
                *emission_counts
                    .entry(Emission::new(state.as_str(), emission.as_ref()))
                    .or_default() += count;
            }
        }

        transitions.retain(|_, v| !v.is_absent());
        emission_counts.retain(|_, v| !v.is_absent());
        for v in transitions.values_mut().chain(emission_counts.values_mut()) {
            *v = *v / log_alpha;
        }

        Some(ExpectedCounts {
            log_alpha,
            transitions,
            emissions: emission_counts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::mocks::*;
    use super::*;
    use crate::model::group_sums;
    use itertools::Itertools;

    ///
    /// `P(x)` summed over every state path by enumeration
    ///
    fn brute_force_prob(hmm: &Hmm, emissions: &[&str]) -> f64 {
        let n = hmm.n_states();
        (0..emissions.len())
            .map(|_| 0..n)
            .multi_cartesian_product()
            .map(|path| {
                let mut p = hmm.p_init(path[0]) * hmm.p_emits(emissions[0])[path[0]];
                for i in 1..emissions.len() {
                    p = p * hmm.p_trans(path[i - 1], path[i]) * hmm.p_emits(emissions[i])[path[i]];
                }
                p.to_value()
            })
            .sum()
    }

    #[test]
    fn coin_xyx_likelihood_by_hand() {
        let hmm = Hmm::new(&mock_coin(), "#");
        let x = ["x", "y", "x"];
        // F[0] = (H: .54, T: .08)
        let f0: (f64, f64) = (0.6 * 0.9, 0.4 * 0.2);
        // F[1] = (H: (.7 .54 + .4 .08) .1, T: (.3 .54 + .6 .08) .8)
        let f1 = (
            (0.7 * f0.0 + 0.4 * f0.1) * 0.1,
            (0.3 * f0.0 + 0.6 * f0.1) * 0.8,
        );
        let f2 = (
            (0.7 * f1.0 + 0.4 * f1.1) * 0.9,
            (0.3 * f1.0 + 0.6 * f1.1) * 0.2,
        );
        let expected = (f2.0 + f2.1).log2();
        let o = hmm.run(&x);
        assert_abs_diff_eq!(o.to_full_prob_forward().to_log_value(), expected, epsilon = 1e-9);
        assert_abs_diff_eq!(
            o.to_full_prob_forward().to_value(),
            brute_force_prob(&hmm, &x),
            epsilon = 1e-12
        );
        let counts = hmm.expected_counts(&x).unwrap();
        assert_abs_diff_eq!(counts.log_alpha.to_log_value(), expected, epsilon = 1e-9);
    }

    #[test]
    fn forward_backward_consistent_at_every_position() {
        let hmm = Hmm::new(&mock_coin(), "#");
        let x = ["y", "y", "x", "y", "x", "x", "x", "y"];
        let o = hmm.run(&x);
        let p = o.to_full_prob_forward();
        for i in 0..x.len() {
            assert_abs_diff_eq!(o.to_full_prob_at(i), p, epsilon = 1e-9);
        }
        assert_abs_diff_eq!(p.to_value(), brute_force_prob(&hmm, &x), epsilon = 1e-12);
    }

    #[test]
    fn expected_counts_sum_to_sequence_length() {
        let hmm = Hmm::new(&mock_coin(), "#");
        let x = ["x", "y", "x", "x"];
        let counts = hmm.expected_counts(&x).unwrap();
        let t = group_sums(&counts.transitions);
        let e = group_sums(&counts.emissions);
        // exactly one boundary transition per sequence
        assert_abs_diff_eq!(t["#"], 1.0, epsilon = 1e-9);
        // n-1 interior transitions
        assert_abs_diff_eq!(t["H"] + t["T"], 3.0, epsilon = 1e-9);
        // n emissions
        assert_abs_diff_eq!(e["H"] + e["T"], 4.0, epsilon = 1e-9);
        // emission of x is observed 3 times
        let n_x = counts.emissions[&Emission::new("H", "x")].to_value()
            + counts.emissions[&Emission::new("T", "x")].to_value();
        assert_abs_diff_eq!(n_x, 3.0, epsilon = 1e-9);
    }

    #[test]
    fn length_one_has_only_boundary_transitions() {
        let hmm = Hmm::new(&mock_coin(), "#");
        let counts = hmm.expected_counts(&["y"]).unwrap();
        assert!(counts.transitions.keys().all(|t| t.from == "#"));
        assert_eq!(counts.transitions.len(), 2);
        // posterior of H given y: .6*.1 / (.6*.1 + .4*.8)
        let h = counts.transitions[&Transition::new("#", "H")].to_value();
        assert_abs_diff_eq!(h, 0.06 / (0.06 + 0.32), epsilon = 1e-12);
    }

    #[test]
    fn zero_likelihood_has_no_counts() {
        let hmm = Hmm::new(&mock_coin(), "#");
        assert!(hmm.expected_counts(&["x", "unknown"]).is_none());
        let empty: [&str; 0] = [];
        assert!(hmm.expected_counts(&empty).is_none());
    }

    #[test]
    fn impossible_keys_are_not_emitted() {
        let hmm = Hmm::new(&mock_single(), "#");
        let counts = hmm.expected_counts(&["a", "a", "a"]).unwrap();
        assert!(counts.log_alpha.is_one());
        assert_eq!(counts.transitions.len(), 2);
        assert_abs_diff_eq!(
            counts.transitions[&Transition::new("S", "S")].to_value(),
            2.0,
            epsilon = 1e-12
        );
        assert_eq!(counts.emissions.len(), 1);
    }
}
