//!
//! Execution of map and group-reduce stages
//!
//! One EM iteration is a map stage (one unit per observation sequence)
//! followed by a reduce stage (one unit per grouping key). Each call below
//! returns only after every unit has finished, which is the barrier between
//! the two stages and between iterations.
//!
use super::worker::RecordTask;
use crate::error::Result;
use crate::observation::Observations;
use rayon::prelude::*;
use std::collections::BTreeMap;

///
/// Substrate running independent units of work
///
pub trait Executor {
    ///
    /// Run `task` for every sequence and concatenate the outputs in input
    /// order. The first error of any unit is returned.
    ///
    fn map_records<T>(&self, task: &T, observations: &Observations) -> Result<Vec<T::Output>>
    where
        T: RecordTask + Sync,
        T::Output: Send;

    ///
    /// Group `items` by key and run `reduce` once per key, in key order.
    ///
    fn reduce_by_key<K, V, R, F>(&self, items: Vec<(K, V)>, reduce: F) -> Result<Vec<R>>
    where
        K: Ord + Send,
        V: Send,
        R: Send,
        F: Fn(&K, Vec<V>) -> Result<R> + Sync;

    fn name(&self) -> &'static str;
}

///
/// Group values by key, sorted by key
///
pub fn group_by_key<K: Ord, V>(items: Vec<(K, V)>) -> BTreeMap<K, Vec<V>> {
    let mut groups: BTreeMap<K, Vec<V>> = BTreeMap::new();
    for (key, value) in items {
        groups.entry(key).or_insert_with(Vec::new).push(value);
    }
    groups
}

///
/// Units run on the rayon thread pool
///
#[derive(Debug, Clone, Copy, Default)]
pub struct RayonExecutor;

impl Executor for RayonExecutor {
    fn map_records<T>(&self, task: &T, observations: &Observations) -> Result<Vec<T::Output>>
    where
        T: RecordTask + Sync,
        T::Output: Send,
    {
        let outputs: Vec<Vec<T::Output>> = observations
            .into_par_iter()
            .map(|sequence| task.run(sequence))
            .collect::<Result<_>>()?;
        Ok(outputs.into_iter().flatten().collect())
    }
    fn reduce_by_key<K, V, R, F>(&self, items: Vec<(K, V)>, reduce: F) -> Result<Vec<R>>
    where
        K: Ord + Send,
        V: Send,
        R: Send,
        F: Fn(&K, Vec<V>) -> Result<R> + Sync,
    {
        let groups: Vec<(K, Vec<V>)> = group_by_key(items).into_iter().collect();
        groups
            .into_par_iter()
            .map(|(key, values)| reduce(&key, values))
            .collect()
    }
    fn name(&self) -> &'static str {
        "rayon"
    }
}

///
/// Units run one by one on the calling thread
///
#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialExecutor;

impl Executor for SequentialExecutor {
    fn map_records<T>(&self, task: &T, observations: &Observations) -> Result<Vec<T::Output>>
    where
        T: RecordTask + Sync,
        T::Output: Send,
    {
        let mut outputs = Vec::new();
        for sequence in observations {
            outputs.extend(task.run(sequence)?);
        }
        Ok(outputs)
    }
    fn reduce_by_key<K, V, R, F>(&self, items: Vec<(K, V)>, reduce: F) -> Result<Vec<R>>
    where
        K: Ord + Send,
        V: Send,
        R: Send,
        F: Fn(&K, Vec<V>) -> Result<R> + Sync,
    {
        group_by_key(items)
            .into_iter()
            .map(|(key, values)| reduce(&key, values))
            .collect()
    }
    fn name(&self) -> &'static str {
        "sequential"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HmmError;
    use crate::observation::ObservationSequence;

    struct Tokens;
    impl RecordTask for Tokens {
        type Output = (String, u64);
        fn run(&self, sequence: &ObservationSequence) -> Result<Vec<(String, u64)>> {
            if sequence.tokens.iter().any(|t| t == "bad") {
                return Err(HmmError::parse(sequence.position, "bad token"));
            }
            Ok(sequence
                .tokens
                .iter()
                .map(|t| (t.clone(), sequence.position))
                .collect())
        }
    }

    fn word_count<E: Executor>(executor: &E, text: &str) -> Result<Vec<(String, usize)>> {
        let obs = Observations::parse(text, 0);
        let items = executor.map_records(&Tokens, &obs)?;
        executor.reduce_by_key(items, |key: &String, values| Ok((key.clone(), values.len())))
    }

    #[test]
    fn map_keeps_input_order() {
        let obs = Observations::parse("a b\nc\nd e f\n", 0);
        let r = RayonExecutor.map_records(&Tokens, &obs).unwrap();
        let s = SequentialExecutor.map_records(&Tokens, &obs).unwrap();
        assert_eq!(r, s);
        let tokens: Vec<&str> = r.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(tokens, vec!["a", "b", "c", "d", "e", "f"]);
    }
    #[test]
    fn reduce_groups_in_key_order() {
        let text = "b a\na c a\n\nb\n";
        let expected = vec![
            ("a".to_string(), 3),
            ("b".to_string(), 2),
            ("c".to_string(), 1),
        ];
        assert_eq!(word_count(&RayonExecutor, text).unwrap(), expected);
        assert_eq!(word_count(&SequentialExecutor, text).unwrap(), expected);
    }
    #[test]
    fn unit_error_is_returned() {
        let text = "a\nbad\nc\n";
        assert!(matches!(
            word_count(&RayonExecutor, text),
            Err(HmmError::Parse { .. })
        ));
        assert!(matches!(
            word_count(&SequentialExecutor, text),
            Err(HmmError::Parse { .. })
        ));
    }
}
