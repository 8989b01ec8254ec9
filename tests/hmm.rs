//!
//! test of hmm
//!
#[macro_use]
extern crate approx;

use hmmem::hmm::Hmm;
use hmmem::model::text::TextSource;
use hmmem::model::{InitialModel, ModelParameters};
use hmmem::observation::ObservationSequence;
use hmmem::prob::LogProb;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

const COIN: &str = "\
Transition: # H -0.7369655941662062
Transition: # T -1.3219280948873622
Transition: H H -0.5145731728297583
Transition: H T -1.7369655941662063
Transition: T H -1.3219280948873622
Transition: T T -0.7369655941662062
Emission: H x -0.15200309344504995
Emission: H y -3.321928094887362
Emission: T x -2.321928094887362
Emission: T y -0.3219280948873623
";

fn coin() -> ModelParameters {
    ModelParameters::from_text(TextSource::new("coin", COIN)).unwrap()
}

#[test]
fn coin_model_text_is_normalized() {
    let m = coin();
    assert_eq!(m.n_transitions(), 6);
    assert_eq!(m.n_emissions(), 4);
    assert!(m.is_normalized(1e-12));
    let reparsed = ModelParameters::from_text(TextSource::new("again", &m.to_text())).unwrap();
    assert_eq!(m, reparsed);
}

#[test]
fn coin_xyx_log_alpha_by_hand() {
    let hmm = Hmm::new(&coin(), "#");
    // enumerate the 8 state paths of length 3
    let init = [0.6, 0.4];
    let trans = [[0.7, 0.3], [0.4, 0.6]];
    let emit_x = [0.9, 0.2];
    let emit_y = [0.1, 0.8];
    let mut p: f64 = 0.0;
    for a in 0..2 {
        for b in 0..2 {
            for c in 0..2 {
                p += init[a] * emit_x[a] * trans[a][b] * emit_y[b] * trans[b][c] * emit_x[c];
            }
        }
    }
    let counts = hmm.expected_counts(&["x", "y", "x"]).unwrap();
    assert_abs_diff_eq!(counts.log_alpha.to_log_value(), p.log2(), epsilon = 1e-9);
}

#[test]
fn forward_backward_agree_on_random_models() {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(7);
    let transitions = "# A\n# B\n# C\nA A\nA B\nB B\nB C\nC A\nC C\n";
    let emissions = "A a\nA b\nB b\nB c\nC a\nC c\n";
    for _ in 0..5 {
        let init = InitialModel::seed(
            TextSource::new("t", transitions),
            TextSource::new("e", emissions),
            &mut rng,
        )
        .unwrap();
        let hmm = Hmm::new(&init.params, &init.start_state);
        let x = ["a", "b", "b", "c", "a", "c", "c", "b"];
        let o = hmm.run(&x);
        let p = o.to_full_prob_forward();
        for i in 0..x.len() {
            assert_abs_diff_eq!(o.to_full_prob_at(i), p, epsilon = 1e-9);
        }
        assert_abs_diff_eq!(hmm.backward_prob(&x), p, epsilon = 1e-9);
    }
}

#[test]
fn long_sequence_does_not_underflow() {
    let hmm = Hmm::new(&coin(), "#");
    let x: Vec<&str> = (0..5000).map(|i| if i % 3 == 0 { "y" } else { "x" }).collect();
    let counts = hmm.expected_counts(&x).unwrap();
    assert!(counts.log_alpha.to_log_value().is_finite());
    assert!(counts.log_alpha.to_log_value() < -1000.0);
    assert_ne!(counts.log_alpha, LogProb::absent());
}

#[test]
fn single_state_viterbi() {
    let m = ModelParameters::from_text(TextSource::new(
        "single",
        "Transition: # S 0.0\nTransition: S S 0.0\nEmission: S a 0.0\n",
    ))
    .unwrap();
    let hmm = Hmm::new(&m, "#");
    let seq = ObservationSequence::from_line(42, "a a a a").unwrap();
    let tagged = hmm.tag(&seq);
    assert_eq!(tagged.to_string(), "42: (a,S) (a,S) (a,S) (a,S)");
}
