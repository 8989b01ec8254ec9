//!
//! Viterbi algorithm (most probable state path)
//!
use super::Hmm;
use crate::observation::{ObservationSequence, TaggedSequence};
use crate::prob::LogProb;

impl Hmm {
    ///
    /// Most probable state path of the emissions and its log probability.
    ///
    /// ```text
    /// V[0][k] = P(k | start) P(x[0] | k)
    /// V[i][k] = max_l P(k | l) P(x[i] | k) V[i-1][l]
    /// ```
    ///
    /// Ties are resolved to the first state in state set order.
    /// `None` if the sequence is empty or no path has non-zero probability.
    ///
    pub fn viterbi<T: AsRef<str>>(&self, emissions: &[T]) -> Option<(Vec<usize>, LogProb)> {
        let n = emissions.len();
        let n_states = self.n_states();
        if n == 0 || n_states == 0 {
            return None;
        }

        // backpointers[i][k]: previous state of k at i on the best path
        let mut backpointers: Vec<Vec<Option<usize>>> = Vec::with_capacity(n);
        let p_emits = self.p_emits(emissions[0].as_ref());
        let mut v: Vec<LogProb> = (0..n_states)
            .map(|k| self.p_init(k) * p_emits[k])
            .collect();
        backpointers.push(vec![None; n_states]);

        for emission in emissions.iter().skip(1) {
            let p_emits = self.p_emits(emission.as_ref());
            let mut v_next = vec![LogProb::absent(); n_states];
            let mut bp = vec![None; n_states];
            for k in 0..n_states {
                for l in 0..n_states {
                    let p = self.p_trans(l, k) * p_emits[k] * v[l];
                    if p.is_absent() {
                        continue;
                    }
                    if bp[k].is_none() || p > v_next[k] {
                        v_next[k] = p;
                        bp[k] = Some(l);
                    }
                }
            }
            v = v_next;
            backpointers.push(bp);
        }

        let (last, p) = argmax(&v)?;
        let mut path = vec![last; n];
        for i in (1..n).rev() {
            // a present cell always has a predecessor
            path[i - 1] = backpointers[i][path[i]]?;
        }
        Some((path, p))
    }
    ///
    /// Tag each token of the sequence with the state of the most probable
    /// path. A sequence with zero likelihood gets no tags.
    ///
    pub fn tag(&self, sequence: &ObservationSequence) -> TaggedSequence {
        let tags = match self.viterbi(&sequence.tokens) {
            Some((path, _)) => sequence
                .tokens
                .iter()
                .zip(path.into_iter())
                .map(|(token, k)| (token.clone(), self.states().state(k).clone()))
                .collect(),
            None => Vec::new(),
        };
        TaggedSequence::new(sequence.position, tags)
    }
}

///
/// First index with the maximum present value
///
fn argmax(values: &[LogProb]) -> Option<(usize, LogProb)> {
    let mut best: Option<(usize, LogProb)> = None;
    for (k, &p) in values.iter().enumerate() {
        if p.is_absent() {
            continue;
        }
        match best {
            Some((_, q)) if p <= q => {}
            _ => best = Some((k, p)),
        }
    }
    best
}
