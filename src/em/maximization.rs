//!
//! Maximization step
//!
//! Partials are grouped by `GroupKey`. For a state group, counts of the
//! same key are log-summed over sequences and then normalized within the
//! group, giving the new `P(. | state)` rows. The alpha group multiplies
//! every sequence likelihood into the total log alpha.
//!
use super::executor::Executor;
use super::partial::{GroupKey, Partial};
use super::store::{Layout, Store};
use crate::error::{HmmError, Result};
use crate::model::text::alpha_to_text;
use crate::model::ModelParameters;
use crate::prob::LogProb;
use log::debug;

///
/// Result of one aggregation unit
///
#[derive(Debug, Clone, PartialEq)]
pub struct GroupAggregate {
    pub key: GroupKey,
    /// normalized rows of the state (empty for the alpha group)
    pub params: ModelParameters,
    /// product of the sequence likelihoods (alpha group only)
    pub total_log_alpha: Option<LogProb>,
}

///
/// Aggregate all partials of one group key.
///
pub fn aggregate(key: &GroupKey, partials: Vec<Partial>) -> Result<GroupAggregate> {
    let mut params = ModelParameters::default();
    let mut total_log_alpha = None;
    for partial in partials {
        match partial {
            Partial::Transition(t, v) => *params.transitions.entry(t).or_default() += v,
            Partial::Emission(e, v) => *params.emissions.entry(e).or_default() += v,
            Partial::Alpha(v) => {
                if *key != GroupKey::Alpha {
                    return Err(HmmError::parse(key, "alpha partial outside the alpha group"));
                }
                *total_log_alpha.get_or_insert_with(LogProb::one) *= v;
            }
        }
    }
    params.normalize();
    Ok(GroupAggregate {
        key: key.clone(),
        params,
        total_log_alpha,
    })
}

///
/// New model and total log alpha of one iteration
///
#[derive(Debug, Clone)]
pub struct Maximized {
    pub groups: Vec<GroupAggregate>,
    pub params: ModelParameters,
    /// absent if no sequence had non-zero likelihood
    pub total_log_alpha: LogProb,
}

///
/// Run the aggregation units of one iteration on the executor.
///
pub fn maximize<E: Executor>(executor: &E, partials: Vec<(GroupKey, Partial)>) -> Result<Maximized> {
    let groups = executor.reduce_by_key(partials, aggregate)?;
    let mut params = ModelParameters::default();
    let mut total_log_alpha = LogProb::absent();
    for group in groups.iter() {
        params.merge(group.params.clone(), &group.key.to_string())?;
        if let Some(alpha) = group.total_log_alpha {
            total_log_alpha = alpha;
        }
    }
    debug!(
        "maximized {} groups into {} transitions, {} emissions",
        groups.len(),
        params.n_transitions(),
        params.n_emissions()
    );
    Ok(Maximized {
        groups,
        params,
        total_log_alpha,
    })
}

impl Maximized {
    ///
    /// Write the new model as `n_partitions` part files (groups assigned by
    /// key hash) and the reserved total log alpha file.
    ///
    pub fn write<S: Store + ?Sized>(
        &self,
        store: &S,
        layout: &Layout,
        restart: usize,
        iteration: usize,
        n_partitions: usize,
    ) -> Result<()> {
        let n_partitions = n_partitions.max(1);
        let mut parts = vec![String::new(); n_partitions];
        for group in self.groups.iter() {
            if group.key == GroupKey::Alpha {
                continue;
            }
            parts[group.key.partition(n_partitions)].push_str(&group.params.to_text());
        }
        for (index, text) in parts.iter().enumerate() {
            store.write_new(&layout.part_file(restart, iteration, index), text)?;
        }
        store.write_new(
            &layout.total_log_alpha_file(restart, iteration),
            &alpha_to_text(self.total_log_alpha),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{Emission, Transition};
    use crate::em::executor::{RayonExecutor, SequentialExecutor};
    use crate::em::store::{load_model, load_total_log_alpha, FsStore};
    use crate::prob::{lp, p};

    fn partials() -> Vec<(GroupKey, Partial)> {
        vec![
            Partial::Transition(Transition::new("H", "H"), p(1.0)),
            Partial::Transition(Transition::new("H", "T"), p(0.5)),
            Partial::Transition(Transition::new("H", "H"), p(0.5)),
            Partial::Emission(Emission::new("H", "x"), p(3.0)),
            Partial::Transition(Transition::new("#", "H"), p(0.25)),
            Partial::Transition(Transition::new("#", "T"), p(0.75)),
            Partial::Emission(Emission::new("T", "y"), p(2.0)),
            Partial::Alpha(lp(-2.0)),
            Partial::Alpha(lp(-3.5)),
        ]
        .into_iter()
        .map(Partial::keyed)
        .collect()
    }

    #[test]
    fn aggregate_state_group() {
        let key = GroupKey::State("H".into());
        let g = aggregate(
            &key,
            vec![
                Partial::Transition(Transition::new("H", "H"), p(1.0)),
                Partial::Transition(Transition::new("H", "T"), p(1.0)),
                Partial::Transition(Transition::new("H", "H"), p(2.0)),
                Partial::Emission(Emission::new("H", "x"), p(0.1)),
            ],
        )
        .unwrap();
        assert!(g.total_log_alpha.is_none());
        assert_abs_diff_eq!(g.params.transition("H", "H"), p(0.75), epsilon = 1e-12);
        assert_abs_diff_eq!(g.params.transition("H", "T"), p(0.25), epsilon = 1e-12);
        assert!(g.params.emission("H", "x").is_one());
    }
    #[test]
    fn aggregate_alpha_group_is_product() {
        let g = aggregate(
            &GroupKey::Alpha,
            vec![Partial::Alpha(lp(-1.5)), Partial::Alpha(lp(-2.0))],
        )
        .unwrap();
        assert_eq!(g.total_log_alpha, Some(lp(-3.5)));
        assert!(g.params.is_empty());
    }
    #[test]
    fn alpha_partial_in_state_group_is_rejected() {
        let r = aggregate(&GroupKey::State("H".into()), vec![Partial::Alpha(lp(-1.0))]);
        assert!(r.is_err());
    }
    #[test]
    fn maximize_on_both_executors() {
        let a = maximize(&RayonExecutor, partials()).unwrap();
        let b = maximize(&SequentialExecutor, partials()).unwrap();
        assert_eq!(a.params, b.params);
        assert_eq!(a.total_log_alpha, lp(-5.5));
        assert!(a.params.is_normalized(1e-9));
        assert_abs_diff_eq!(a.params.transition("H", "H"), p(0.75), epsilon = 1e-12);
        assert_abs_diff_eq!(a.params.transition("#", "T"), p(0.75), epsilon = 1e-12);
        assert!(a.params.emission("T", "y").is_one());
    }
    #[test]
    fn maximize_without_alpha_is_absent() {
        let m = maximize(&SequentialExecutor, Vec::new()).unwrap();
        assert!(m.total_log_alpha.is_absent());
        assert!(m.params.is_empty());
    }
    #[test]
    fn write_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let layout = Layout::new(dir.path());
        let m = maximize(&RayonExecutor, partials()).unwrap();
        m.write(&FsStore, &layout, 0, 1, 3).unwrap();
        for index in 0..3 {
            assert!(layout.part_file(0, 1, index).exists());
        }
        let d = layout.iteration_dir(0, 1);
        let reloaded = load_model(&FsStore, &d).unwrap();
        assert_eq!(reloaded.n_transitions(), m.params.n_transitions());
        for (t, v) in m.params.transitions.iter() {
            assert_abs_diff_eq!(reloaded.transitions[t], *v, epsilon = 1e-12);
        }
        assert_eq!(load_total_log_alpha(&FsStore, &d).unwrap(), lp(-5.5));
        // files of an iteration are never overwritten
        assert!(m.write(&FsStore, &layout, 0, 1, 3).is_err());
    }
}
