//! # pf-model
//!
//! Workspace schema and binned probability-model bookkeeping for prefit.
//!
//! A [`Workspace`] is the pyhf JSON interchange format (channels, samples,
//! modifiers, observations, measurements). A [`Model`] is built from a
//! workspace and exposes what the preparation helpers need: parameter sets
//! in a stable order with their multiplicities, auxiliary data, the nominal
//! per-sample rate tensor, and the interpolation-code settings the model
//! was built with.
//!
//! This crate records interpolation codes as configuration but never
//! evaluates them; likelihoods and fitting live elsewhere entirely.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod model;
pub mod schema;
pub mod simplemodels;
mod workspace;


pub use model::{ChannelInfo, Constraint, InterpCode, Model, ModifierSettings, ParamSet};
pub use schema::*;
