//! Feedforward neural networks for fitting models to tabular data.
//!
//! A `feed_forward::Network` is built up one hidden layer at a time, trained
//! by a `trainer::Trainer` with backpropagation, and saved to or restored from
//! a plain-text model.

#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_derive;

pub mod activator;
pub mod connection;
pub mod error;
pub mod feed_forward;
mod model;
pub mod table;
pub mod trainer;

mod utils;

pub use error::{Error, Result};

/// Seed used by networks and trainers that are not given one.
pub const DEFAULT_SEED: u64 = 1;
