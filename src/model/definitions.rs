//!
//! Seeding of iteration 0 from transition/emission definitions
//!
//! Definition lines are `<fromState> <toState>` (transitions) or
//! `<state> <token>` (emissions). Each pair gets an i.i.d. uniform random
//! weight in `[0, 1)`, or the explicit weight given in an optional third
//! column, and each table is then normalized.
//!
use super::text::TextSource;
use super::{LogProbMap, ModelParameters};
use crate::common::{fields, Emission, State, Transition};
use crate::error::{HmmError, Result};
use crate::prob::LogProb;
use fnv::FnvHashSet as HashSet;
use log::debug;
use rand::Rng;

///
/// A parsed definition line
///
#[derive(Debug, Clone, PartialEq)]
pub struct Definition {
    pub x: String,
    pub y: String,
    /// explicit probability weight (third column), if given
    pub weight: Option<f64>,
}

///
/// Parse definition lines. Blank lines are skipped.
///
/// Fails with `Parse` on a line without 2 or 3 fields or with an invalid
/// weight, and with `DuplicateKey` if a pair is defined twice.
///
pub fn parse_definitions(source: TextSource) -> Result<Vec<Definition>> {
    let mut seen: HashSet<(&str, &str)> = HashSet::default();
    let mut defs = Vec::new();
    for (location, line) in source.lines() {
        let tokens = fields(line);
        let weight = match tokens.len() {
            0 => continue,
            2 => None,
            3 => {
                let w: f64 = tokens[2].parse().map_err(|e| {
                    HmmError::parse(&location, format!("invalid weight `{}`: {}", tokens[2], e))
                })?;
                if !w.is_finite() || w < 0.0 {
                    return Err(HmmError::parse(
                        &location,
                        format!("weight must be a finite non-negative number, got {}", w),
                    ));
                }
                Some(w)
            }
            n => {
                return Err(HmmError::parse(
                    &location,
                    format!("expected 2 (or 3 with a weight) fields but got {}: \"{}\"", n, line),
                ))
            }
        };
        if !seen.insert((tokens[0], tokens[1])) {
            return Err(HmmError::duplicate(
                format!("({},{})", tokens[0], tokens[1]),
                &location,
            ));
        }
        defs.push(Definition {
            x: tokens[0].to_string(),
            y: tokens[1].to_string(),
            weight,
        });
    }
    Ok(defs)
}

///
/// Model of iteration 0 and the start state fixed by the first transition
/// definition.
///
#[derive(Debug, Clone)]
pub struct InitialModel {
    pub params: ModelParameters,
    pub start_state: State,
}

impl InitialModel {
    ///
    /// Draw a random model from the definitions and normalize it.
    ///
    pub fn seed<R: Rng>(
        transitions: TextSource,
        emissions: TextSource,
        rng: &mut R,
    ) -> Result<InitialModel> {
        let trans_defs = parse_definitions(transitions)?;
        let emis_defs = parse_definitions(emissions)?;
        let start_state = match trans_defs.first() {
            Some(def) => def.x.clone(),
            None => {
                return Err(HmmError::parse(
                    transitions.name,
                    "no transition definitions; the start state cannot be determined",
                ))
            }
        };

        let mut weight = |def: &Definition| match def.weight {
            Some(w) => LogProb::from_prob(w),
            None => LogProb::from_prob(rng.gen::<f64>()),
        };
        let mut trans: LogProbMap<Transition> = LogProbMap::default();
        for def in trans_defs.iter() {
            trans.insert(Transition::new(def.x.as_str(), def.y.as_str()), weight(def));
        }
        let mut emis: LogProbMap<Emission> = LogProbMap::default();
        for def in emis_defs.iter() {
            emis.insert(Emission::new(def.x.as_str(), def.y.as_str()), weight(def));
        }

        let mut params = ModelParameters::new(trans, emis);
        params.normalize();
        debug!(
            "seeded model start_state={} n_transitions={} n_emissions={}",
            start_state,
            params.n_transitions(),
            params.n_emissions()
        );
        Ok(InitialModel {
            params,
            start_state,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prob::p;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    const TRANS: &str = "# H\n# T\nH H\nH T\n\nT H\nT T\n";
    const EMIS: &str = "H x\nH y\nT x\nT y\n";

    #[test]
    fn seed_random_model() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(0);
        let m = InitialModel::seed(
            TextSource::new("t", TRANS),
            TextSource::new("e", EMIS),
            &mut rng,
        )
        .unwrap();
        assert_eq!(m.start_state, "#");
        assert_eq!(m.params.n_transitions(), 6);
        assert_eq!(m.params.n_emissions(), 4);
        assert!(m.params.is_normalized(1e-9));
        assert_eq!(m.params.state_set().as_slice(), &["H".to_string(), "T".to_string()]);
    }
    #[test]
    fn seed_is_reproducible_and_seed_dependent() {
        let draw = |seed: u64| {
            let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
            InitialModel::seed(TextSource::new("t", TRANS), TextSource::new("e", EMIS), &mut rng)
                .unwrap()
                .params
        };
        assert_eq!(draw(3), draw(3));
        assert_ne!(draw(3), draw(4));
    }
    #[test]
    fn start_state_is_first_from() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(0);
        let m = InitialModel::seed(
            TextSource::new("t", "\n  BEGIN a\na a\nBEGIN b\n"),
            TextSource::new("e", "a x\n"),
            &mut rng,
        )
        .unwrap();
        assert_eq!(m.start_state, "BEGIN");
    }
    #[test]
    fn weighted_definitions() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(0);
        let m = InitialModel::seed(
            TextSource::new("t", "# V 0.3\n# C 0.7\nV V 2\nV C 8\n"),
            TextSource::new("e", "V a 1\nC a 0\nC b 5\n"),
            &mut rng,
        )
        .unwrap();
        assert_abs_diff_eq!(m.params.transition("#", "C"), p(0.7), epsilon = 1e-12);
        assert_abs_diff_eq!(m.params.transition("V", "V"), p(0.2), epsilon = 1e-12);
        assert_abs_diff_eq!(m.params.emission("C", "b"), p(1.0), epsilon = 1e-12);
        // zero weight has no mass
        assert!(!m.params.emissions.contains_key(&Emission::new("C", "a")));
    }
    #[test]
    fn duplicate_definition() {
        let r = parse_definitions(TextSource::new("transitions.txt", "# H\nH T\nT H\nH T\n"));
        match r {
            Err(HmmError::DuplicateKey { key, location }) => {
                assert_eq!(key, "(H,T)");
                assert_eq!(location, "transitions.txt:4");
            }
            r => panic!("unexpected {:?}", r),
        }
    }
    #[test]
    fn malformed_definitions() {
        for bad in ["# H T U\n", "# \n", "# H x\n", "# H -1\n", "# H inf\n"].iter() {
            match parse_definitions(TextSource::new("t", bad)) {
                Err(HmmError::Parse { .. }) => {}
                r => panic!("{:?} gave {:?}", bad, r),
            }
        }
    }
    #[test]
    fn empty_transitions() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(0);
        let r = InitialModel::seed(
            TextSource::new("t", "\n\n"),
            TextSource::new("e", "H x\n"),
            &mut rng,
        );
        assert!(matches!(r, Err(HmmError::Parse { .. })));
    }
}
