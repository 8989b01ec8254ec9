//!
//! Labels and parameter keys shared by every stage
//!
//! * `State`: hidden label of the HMM
//! * `Token`: observed symbol
//! * `Transition`: `(from, to)` key of a transition probability
//! * `Emission`: `(state, token)` key of an emission probability
//!
use serde::{Deserialize, Serialize};

/// Opaque hidden state label, compared by exact equality.
pub type State = String;

/// Opaque observation symbol, compared by exact equality.
pub type Token = String;

/// Conventional name of the start state ("before any emission").
///
/// The actual start state is whatever the first transition definition
/// starts from; this is only the name used by convention.
pub const CONVENTIONAL_START_STATE: &str = "#";

///
/// Keys that are normalized in groups: all keys sharing `group()`
/// sum to 1.0 in probability space.
///
pub trait Grouped {
    /// the grouping component (`from` of a transition, `state` of an emission)
    fn group(&self) -> &str;
}

///
/// Transition key `P(to | from)`
///
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Transition {
    pub from: State,
    pub to: State,
}

impl Transition {
    pub fn new<A: Into<State>, B: Into<State>>(from: A, to: B) -> Transition {
        Transition {
            from: from.into(),
            to: to.into(),
        }
    }
}

impl Grouped for Transition {
    fn group(&self) -> &str {
        &self.from
    }
}

impl std::fmt::Display for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "({},{})", self.from, self.to)
    }
}

///
/// Emission key `P(token | state)`
///
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Emission {
    pub state: State,
    pub token: Token,
}

impl Emission {
    pub fn new<A: Into<State>, B: Into<Token>>(state: A, token: B) -> Emission {
        Emission {
            state: state.into(),
            token: token.into(),
        }
    }
}

impl Grouped for Emission {
    fn group(&self) -> &str {
        &self.state
    }
}

impl std::fmt::Display for Emission {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "({},{})", self.state, self.token)
    }
}

///
/// Split a line into whitespace-separated fields
///
pub fn fields(line: &str) -> Vec<&str> {
    line.split_whitespace().collect()
}
