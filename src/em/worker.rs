//!
//! Two-phase workers
//!
//! A worker is set up once (e.g. loading the current model) and then asked
//! to process many records. Setup can fail; the failure is kept in the
//! worker and returned, with its original kind, by every record it is asked
//! to process, so that the executor always observes it. `check` raises it
//! before any record is seen.
//!
use crate::error::{HmmError, Result};
use crate::observation::ObservationSequence;

///
/// Per-record work of a map stage
///
pub trait RecordTask {
    type Output;
    fn run(&self, sequence: &ObservationSequence) -> Result<Vec<Self::Output>>;
}

///
/// Worker that is either ready or failed at setup
///
#[derive(Debug)]
pub enum Worker<T> {
    Ready(T),
    Failed(HmmError),
}

impl<T> Worker<T> {
    ///
    /// Finish setup with its result
    ///
    pub fn configure(setup: Result<T>) -> Worker<T> {
        match setup {
            Ok(task) => Worker::Ready(task),
            Err(err) => {
                log::error!("worker setup failed: {}", err);
                Worker::Failed(err)
            }
        }
    }
    pub fn is_ready(&self) -> bool {
        matches!(self, Worker::Ready(_))
    }
    ///
    /// Setup failure as an error, for callers that may have no record to run
    ///
    pub fn check(&self) -> Result<()> {
        match self {
            Worker::Ready(_) => Ok(()),
            Worker::Failed(err) => Err(err.clone()),
        }
    }
    pub fn task(&self) -> Option<&T> {
        match self {
            Worker::Ready(task) => Some(task),
            Worker::Failed(_) => None,
        }
    }
}

impl<T: RecordTask> RecordTask for Worker<T> {
    type Output = T::Output;
    fn run(&self, sequence: &ObservationSequence) -> Result<Vec<Self::Output>> {
        match self {
            Worker::Ready(task) => task.run(sequence),
            Worker::Failed(err) => Err(err.clone()),
        }
    }
}
