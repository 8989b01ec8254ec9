//!
//! Expectation step
//!
//! Runs forward-backward for each observation sequence under the current
//! model and emits its keyed partial statistics.
//!
use super::partial::{GroupKey, Partial};
use super::store::{load_model, Store};
use super::worker::{RecordTask, Worker};
use crate::error::{HmmError, Result};
use crate::hmm::Hmm;
use crate::model::ModelParameters;
use crate::observation::ObservationSequence;
use log::{debug, warn};
use std::path::Path;

///
/// Expectation of one sequence under a fixed model
///
#[derive(Debug, Clone)]
pub struct ExpectationTask {
    hmm: Hmm,
}

impl ExpectationTask {
    pub fn new(params: &ModelParameters, start_state: &str) -> ExpectationTask {
        ExpectationTask {
            hmm: Hmm::new(params, start_state),
        }
    }
    ///
    /// Setup phase: load the model directory of the previous iteration.
    ///
    pub fn setup<S: Store + ?Sized>(
        store: &S,
        model_dir: &Path,
        start_state: &str,
    ) -> Result<ExpectationTask> {
        let params = load_model(store, model_dir)?;
        if params.n_transitions() == 0 {
            return Err(HmmError::MissingModel(format!(
                "no transitions in {}",
                model_dir.display()
            )));
        }
        debug!(
            "loaded model {} ({} transitions, {} emissions)",
            model_dir.display(),
            params.n_transitions(),
            params.n_emissions()
        );
        Ok(ExpectationTask::new(&params, start_state))
    }
    ///
    /// Worker whose setup result is deferred to its first record
    ///
    pub fn worker<S: Store + ?Sized>(
        store: &S,
        model_dir: &Path,
        start_state: &str,
    ) -> Worker<ExpectationTask> {
        Worker::configure(ExpectationTask::setup(store, model_dir, start_state))
    }
    pub fn hmm(&self) -> &Hmm {
        &self.hmm
    }
}

impl RecordTask for ExpectationTask {
    type Output = (GroupKey, Partial);
    fn run(&self, sequence: &ObservationSequence) -> Result<Vec<(GroupKey, Partial)>> {
        match self.hmm.expected_counts(&sequence.tokens) {
            Some(counts) => Ok(counts
                .into_partials()
                .into_iter()
                .map(Partial::keyed)
                .collect()),
            None => {
                warn!(
                    "sequence at {} has zero likelihood and is skipped",
                    sequence.position
                );
                Ok(Vec::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::em::store::FsStore;
    use crate::hmm::mocks::mock_coin;

    #[test]
    fn expectation_of_zero_likelihood_is_empty() {
        let task = ExpectationTask::new(&mock_coin(), "#");
        let s = ObservationSequence::new(0, vec!["x".into(), "q".into()]);
        assert!(task.run(&s).unwrap().is_empty());
        let s = ObservationSequence::new(0, vec!["x".into(), "y".into()]);
        let out = task.run(&s).unwrap();
        assert_eq!(out.iter().filter(|(k, _)| *k == GroupKey::Alpha).count(), 1);
        assert!(out.iter().all(|(k, p)| *k == p.group_key()));
    }
    #[test]
    fn worker_with_missing_model_fails_on_first_record() {
        let dir = tempfile::tempdir().unwrap();
        let worker = ExpectationTask::worker(&FsStore, &dir.path().join("0"), "#");
        assert!(!worker.is_ready());
        let s = ObservationSequence::new(0, vec!["x".into()]);
        assert!(matches!(worker.run(&s), Err(HmmError::MissingModel(_))));
    }
    #[test]
    fn worker_loads_model_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("part-00000");
        FsStore.write_new(&path, &mock_coin().to_text()).unwrap();
        let worker = ExpectationTask::worker(&FsStore, dir.path(), "#");
        assert!(worker.is_ready());
        assert_eq!(worker.task().unwrap().hmm().n_states(), 2);
    }
}
