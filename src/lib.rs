pub mod common;
pub mod config;
pub mod em;
pub mod error;
pub mod hmm;
pub mod model;
pub mod observation;
pub mod prelude;
pub mod prob;

#[cfg(test)]
#[macro_use]
extern crate approx;
