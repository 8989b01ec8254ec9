//!
//! Text encoding of model parameters
//!
//! One record per line, whitespace-separated fields:
//!
//! ```text
//! Transition: <fromState> <toState> <log2Probability>
//! Emission: <state> <token> <log2Probability>
//! Alpha: <log2TotalLikelihood>
//! ```
//!
//! Blank lines are ignored. A directory of such files (minus the reserved
//! alpha file) is one iteration's full `ModelParameters`.
//!
use super::ModelParameters;
use crate::common::{fields, Emission, Transition};
use crate::error::{HmmError, Result};
use crate::prob::LogProb;
use itertools::Itertools;

pub const TRANSITION_PREFIX: &str = "Transition:";
pub const EMISSION_PREFIX: &str = "Emission:";
pub const ALPHA_PREFIX: &str = "Alpha:";

///
/// Named text, used to locate parse errors as `name:line`.
///
#[derive(Debug, Clone, Copy)]
pub struct TextSource<'a> {
    pub name: &'a str,
    pub text: &'a str,
}

impl<'a> TextSource<'a> {
    pub fn new(name: &'a str, text: &'a str) -> TextSource<'a> {
        TextSource { name, text }
    }
    ///
    /// iterator of `(location, line)` where location is `name:lineno` (1-origin)
    ///
    pub fn lines(&self) -> impl Iterator<Item = (String, &'a str)> + '_ {
        let name = self.name;
        self.text
            .lines()
            .enumerate()
            .map(move |(i, line)| (format!("{}:{}", name, i + 1), line))
    }
}

///
/// A single line of the parameter encoding
///
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Transition(Transition, LogProb),
    Emission(Emission, LogProb),
    Alpha(LogProb),
}

impl std::fmt::Display for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Record::Transition(t, lp) => write!(f, "{} {} {} {}", TRANSITION_PREFIX, t.from, t.to, lp),
            Record::Emission(e, lp) => write!(f, "{} {} {} {}", EMISSION_PREFIX, e.state, e.token, lp),
            Record::Alpha(lp) => write!(f, "{} {}", ALPHA_PREFIX, lp),
        }
    }
}

impl Record {
    ///
    /// Parse one line. `Ok(None)` for a blank line.
    ///
    pub fn parse(location: &str, line: &str) -> Result<Option<Record>> {
        let tokens = fields(line);
        if tokens.is_empty() {
            return Ok(None);
        }
        let value = |s: &str| -> Result<LogProb> {
            let v = s
                .parse::<LogProb>()
                .map_err(|e| HmmError::parse(location, format!("invalid log value `{}`: {}", s, e)))?;
            // -inf (absent) is the only non-finite value allowed
            if v.to_log_value().is_finite() || v.is_absent() {
                Ok(v)
            } else {
                Err(HmmError::parse(
                    location,
                    format!("log value `{}` is neither finite nor -inf", s),
                ))
            }
        };
        let arity = |n: usize| {
            if tokens.len() == n {
                Ok(())
            } else {
                Err(HmmError::parse(
                    location,
                    format!(
                        "`{}` record needs {} fields but got {}: \"{}\"",
                        tokens[0],
                        n,
                        tokens.len(),
                        line
                    ),
                ))
            }
        };
        let record = match tokens[0] {
            TRANSITION_PREFIX => {
                arity(4)?;
                Record::Transition(Transition::new(tokens[1], tokens[2]), value(tokens[3])?)
            }
            EMISSION_PREFIX => {
                arity(4)?;
                Record::Emission(Emission::new(tokens[1], tokens[2]), value(tokens[3])?)
            }
            ALPHA_PREFIX => {
                arity(2)?;
                Record::Alpha(value(tokens[1])?)
            }
            other => {
                return Err(HmmError::parse(
                    location,
                    format!("unknown record type `{}` in \"{}\"", other, line),
                ))
            }
        };
        Ok(Some(record))
    }
}

impl ModelParameters {
    ///
    /// Serialize into the text encoding, transitions then emissions,
    /// each sorted by key.
    ///
    pub fn to_text(&self) -> String {
        let mut s = String::new();
        for (t, &lp) in self.transitions.iter().sorted_by(|a, b| a.0.cmp(b.0)) {
            s.push_str(&Record::Transition(t.clone(), lp).to_string());
            s.push('\n');
        }
        for (e, &lp) in self.emissions.iter().sorted_by(|a, b| a.0.cmp(b.0)) {
            s.push_str(&Record::Emission(e.clone(), lp).to_string());
            s.push('\n');
        }
        s
    }
    ///
    /// Deserialize a single parameter file
    ///
    pub fn from_text(source: TextSource) -> Result<ModelParameters> {
        let mut reader = ModelReader::new();
        reader.read(source)?;
        Ok(reader.finish())
    }
}

///
/// Accumulates parameter files of one iteration into a single model.
///
/// A key read twice (within a file or across files) is a `DuplicateKey`.
/// `Alpha:` lines are not model parameters and are skipped.
///
#[derive(Debug, Default)]
pub struct ModelReader {
    params: ModelParameters,
    n_files: usize,
}

impl ModelReader {
    pub fn new() -> ModelReader {
        ModelReader::default()
    }
    pub fn read(&mut self, source: TextSource) -> Result<()> {
        for (location, line) in source.lines() {
            match Record::parse(&location, line)? {
                Some(Record::Transition(t, lp)) => {
                    if self.params.transitions.contains_key(&t) {
                        return Err(HmmError::duplicate(t, location));
                    }
                    self.params.transitions.insert(t, lp);
                }
                Some(Record::Emission(e, lp)) => {
                    if self.params.emissions.contains_key(&e) {
                        return Err(HmmError::duplicate(e, location));
                    }
                    self.params.emissions.insert(e, lp);
                }
                Some(Record::Alpha(_)) | None => {}
            }
        }
        self.n_files += 1;
        Ok(())
    }
    /// number of files read so far
    pub fn n_files(&self) -> usize {
        self.n_files
    }
    pub fn finish(self) -> ModelParameters {
        self.params
    }
}

///
/// Content of the reserved alpha file
///
pub fn alpha_to_text(total_log_alpha: LogProb) -> String {
    format!("{}\n", Record::Alpha(total_log_alpha))
}

///
/// Parse the reserved alpha file; it must hold exactly one `Alpha:` line.
///
pub fn alpha_from_text(source: TextSource) -> Result<LogProb> {
    let mut alpha = None;
    for (location, line) in source.lines() {
        match Record::parse(&location, line)? {
            Some(Record::Alpha(lp)) => {
                if alpha.is_some() {
                    return Err(HmmError::parse(location, "second `Alpha:` line"));
                }
                alpha = Some(lp);
            }
            Some(other) => {
                return Err(HmmError::parse(
                    location,
                    format!("expected an `Alpha:` line but got \"{}\"", other),
                ))
            }
            None => {}
        }
    }
    alpha.ok_or_else(|| HmmError::parse(source.name, "no `Alpha:` line"))
}
