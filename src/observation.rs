//!
//! Observation sequences and their collections
//!
//! ## Single sequence
//!
//! * `ObservationSequence`: tokens of one input record and its position
//! * `TaggedSequence`: Viterbi output, `(token, state)` pairs and the position
//!
//! ## Sequences
//!
//! * `Observations`: all records of the training corpus
//!
use crate::common::{State, Token};
use rayon::prelude::*;

///
/// Tokens of one input record (one whitespace-delimited line).
///
/// `position` is the byte offset of the line in the input, used to restore
/// input order after parallel processing.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservationSequence {
    pub position: u64,
    pub tokens: Vec<Token>,
}

impl ObservationSequence {
    pub fn new(position: u64, tokens: Vec<Token>) -> Self {
        ObservationSequence { position, tokens }
    }
    ///
    /// Parse a line. `None` for a blank line.
    ///
    pub fn from_line(position: u64, line: &str) -> Option<Self> {
        let tokens: Vec<Token> = line.split_whitespace().map(|t| t.to_string()).collect();
        if tokens.is_empty() {
            None
        } else {
            Some(ObservationSequence::new(position, tokens))
        }
    }
    pub fn len(&self) -> usize {
        self.tokens.len()
    }
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Struct for storing all observation sequences of a corpus.
///
#[derive(Debug, Clone, Default)]
pub struct Observations {
    pub sequences: Vec<ObservationSequence>,
}

impl Observations {
    /// Constructor of observations
    pub fn from(sequences: Vec<ObservationSequence>) -> Self {
        Observations { sequences }
    }
    ///
    /// Parse a text of one sequence per line. Blank lines produce nothing.
    ///
    /// `offset` is added to every position, so that concatenated files keep
    /// distinct positions.
    ///
    pub fn parse(text: &str, offset: u64) -> Self {
        let mut sequences = Vec::new();
        let mut position = offset;
        for line in text.split_inclusive('\n') {
            if let Some(seq) = ObservationSequence::from_line(position, line) {
                sequences.push(seq);
            }
            position += line.len() as u64;
        }
        Observations { sequences }
    }
    ///
    /// Append the sequences of another text after the current ones.
    ///
    pub fn extend(&mut self, other: Observations) {
        self.sequences.extend(other.sequences)
    }
    /// get an iterator over the sequences
    pub fn iter(&self) -> impl Iterator<Item = &ObservationSequence> + '_ {
        self.sequences.iter()
    }
    /// the number of sequences.
    pub fn len(&self) -> usize {
        self.sequences.len()
    }
    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }
    /// total number of tokens
    pub fn n_tokens(&self) -> usize {
        self.sequences.iter().map(|s| s.len()).sum()
    }
}

impl<'a> IntoIterator for &'a Observations {
    type Item = &'a ObservationSequence;
    type IntoIter = std::slice::Iter<'a, ObservationSequence>;
    fn into_iter(self) -> std::slice::Iter<'a, ObservationSequence> {
        self.sequences.iter()
    }
}

impl<'a> IntoParallelIterator for &'a Observations {
    type Item = &'a ObservationSequence;
    type Iter = rayon::slice::Iter<'a, ObservationSequence>;
    fn into_par_iter(self) -> rayon::slice::Iter<'a, ObservationSequence> {
        self.sequences.par_iter()
    }
}

///
/// Most likely tagging of one sequence
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedSequence {
    pub position: u64,
    pub tags: Vec<(Token, State)>,
}

impl TaggedSequence {
    pub fn new(position: u64, tags: Vec<(Token, State)>) -> Self {
        TaggedSequence { position, tags }
    }
    /// states of the tagging, in order
    pub fn states(&self) -> impl Iterator<Item = &State> + '_ {
        self.tags.iter().map(|(_, s)| s)
    }
}

///
/// `<position>: (<token1>,<state1>) (<token2>,<state2>) ...`
///
impl std::fmt::Display for TaggedSequence {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}:", self.position)?;
        for (token, state) in self.tags.iter() {
            write!(f, " ({},{})", token, state)?;
        }
        Ok(())
    }
}
