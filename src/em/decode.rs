//!
//! Viterbi tagging of observation sequences with a fixed model
//!
use super::executor::Executor;
use super::store::{load_model, Store};
use super::worker::{RecordTask, Worker};
use crate::error::Result;
use crate::hmm::Hmm;
use crate::model::ModelParameters;
use crate::observation::{ObservationSequence, Observations, TaggedSequence};
use log::info;
use std::path::Path;

///
/// Tagging of one sequence
///
#[derive(Debug, Clone)]
pub struct ViterbiTask {
    hmm: Hmm,
}

impl ViterbiTask {
    pub fn new(params: &ModelParameters, start_state: &str) -> ViterbiTask {
        ViterbiTask {
            hmm: Hmm::new(params, start_state),
        }
    }
    pub fn setup<S: Store + ?Sized>(
        store: &S,
        model_dir: &Path,
        start_state: &str,
    ) -> Result<ViterbiTask> {
        let params = load_model(store, model_dir)?;
        Ok(ViterbiTask::new(&params, start_state))
    }
    pub fn worker<S: Store + ?Sized>(
        store: &S,
        model_dir: &Path,
        start_state: &str,
    ) -> Worker<ViterbiTask> {
        Worker::configure(ViterbiTask::setup(store, model_dir, start_state))
    }
}

impl RecordTask for ViterbiTask {
    type Output = TaggedSequence;
    fn run(&self, sequence: &ObservationSequence) -> Result<Vec<TaggedSequence>> {
        Ok(vec![self.hmm.tag(sequence)])
    }
}

///
/// Tag every sequence, sorted by position.
///
pub fn decode<E, T>(executor: &E, task: &T, observations: &Observations) -> Result<Vec<TaggedSequence>>
where
    E: Executor,
    T: RecordTask<Output = TaggedSequence> + Sync,
{
    let mut tagged = executor.map_records(task, observations)?;
    tagged.sort_by_key(|t| t.position);
    Ok(tagged)
}

///
/// One line per sequence
///
pub fn tagged_to_text(tagged: &[TaggedSequence]) -> String {
    let mut s = String::new();
    for t in tagged {
        s.push_str(&t.to_string());
        s.push('\n');
    }
    s
}

///
/// Tag `observations` with the model in `model_dir` and write the lines to
/// `output`. Returns the number of tagged sequences.
///
pub fn decode_to_file<E: Executor, S: Store + ?Sized>(
    executor: &E,
    store: &S,
    model_dir: &Path,
    start_state: &str,
    observations: &Observations,
    output: &Path,
) -> Result<usize> {
    let worker = ViterbiTask::worker(store, model_dir, start_state);
    worker.check()?;
    let tagged = decode(executor, &worker, observations)?;
    store.write_new(output, &tagged_to_text(&tagged))?;
    info!(
        "tagged {} sequences with {} into {}",
        tagged.len(),
        model_dir.display(),
        output.display()
    );
    Ok(tagged.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::em::executor::{RayonExecutor, SequentialExecutor};
    use crate::em::store::FsStore;
    use crate::error::HmmError;
    use crate::hmm::mocks::mock_coin;

    #[test]
    fn decode_keeps_positions_and_order() {
        let obs = Observations::parse("x y y\n\ny\nx q\n", 0);
        let task = ViterbiTask::new(&mock_coin(), "#");
        let tagged = decode(&RayonExecutor, &task, &obs).unwrap();
        assert_eq!(
            tagged_to_text(&tagged),
            "0: (x,H) (y,T) (y,T)\n7: (y,T)\n9:\n"
        );
        let sequential = decode(&SequentialExecutor, &task, &obs).unwrap();
        assert_eq!(tagged, sequential);
    }
    #[test]
    fn decode_to_file_writes_once() {
        let dir = tempfile::tempdir().unwrap();
        let model_dir = dir.path().join("model");
        FsStore
            .write_new(&model_dir.join("part-00000"), &mock_coin().to_text())
            .unwrap();
        let obs = Observations::parse("x\ny\n", 0);
        let out = dir.path().join("viterbi/part-00000");
        let n = decode_to_file(&RayonExecutor, &FsStore, &model_dir, "#", &obs, &out).unwrap();
        assert_eq!(n, 2);
        assert_eq!(FsStore.read_to_string(&out).unwrap(), "0: (x,H)\n2: (y,T)\n");
        assert!(decode_to_file(&RayonExecutor, &FsStore, &model_dir, "#", &obs, &out).is_err());
    }
    #[test]
    fn decode_with_missing_model_fails() {
        let dir = tempfile::tempdir().unwrap();
        let obs = Observations::parse("x\n", 0);
        let r = decode_to_file(
            &SequentialExecutor,
            &FsStore,
            &dir.path().join("none"),
            "#",
            &obs,
            &dir.path().join("out"),
        );
        assert!(matches!(r, Err(HmmError::MissingModel(_))));
    }
    #[test]
    fn decode_of_empty_input_still_reports_missing_model() {
        let dir = tempfile::tempdir().unwrap();
        let obs = Observations::parse("\n\n", 0);
        assert!(obs.is_empty());
        let out = dir.path().join("out");
        let r = decode_to_file(
            &RayonExecutor,
            &FsStore,
            &dir.path().join("nope"),
            "#",
            &obs,
            &out,
        );
        assert!(matches!(r, Err(HmmError::MissingModel(_))));
        assert!(!FsStore.exists(&out));
    }
    #[test]
    fn decode_with_duplicate_across_part_files() {
        let dir = tempfile::tempdir().unwrap();
        let model_dir = dir.path().join("model");
        let text = mock_coin().to_text();
        FsStore.write_new(&model_dir.join("part-00000"), &text).unwrap();
        FsStore
            .write_new(&model_dir.join("part-00001"), "Emission: H x -1.0\n")
            .unwrap();
        let obs = Observations::parse("x\n", 0);
        let r = decode_to_file(
            &SequentialExecutor,
            &FsStore,
            &model_dir,
            "#",
            &obs,
            &dir.path().join("out"),
        );
        match r {
            Err(HmmError::DuplicateKey { key, location }) => {
                assert_eq!(key, "(H,x)");
                assert!(location.ends_with("part-00001:1"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
    #[test]
    fn decode_with_malformed_model_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let model_dir = dir.path().join("model");
        FsStore
            .write_new(&model_dir.join("part-00000"), "Transition: # H\n")
            .unwrap();
        let obs = Observations::parse("x\n", 0);
        let r = decode_to_file(
            &SequentialExecutor,
            &FsStore,
            &model_dir,
            "#",
            &obs,
            &dir.path().join("out"),
        );
        assert!(matches!(r, Err(HmmError::Parse { .. })));
    }
}
