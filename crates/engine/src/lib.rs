//! Execution engine for refsim programs.
//!
//! The [`Engine`] interprets one scenario year by year: it executes the
//! `default` stanza, then each policy the scenario lists, propagates
//! cross-stream recalculations after every mutation, and emits one
//! [`ResultRow`] per (application, substance, year). [`run_program`] drives
//! every scenario of a parsed [`Program`](lang::Program).
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc as std;

mod engine;
mod error;
mod eval;
mod exec;
mod provider;
mod recalc;
mod result;

pub use engine::Engine;
pub use error::EngineError;
pub use exec::{run_program, run_scenario, Runner};
pub use provider::EngineState;
#[cfg(feature = "std")]
pub use result::write_csv;
pub use result::{to_csv_string, ResultRow};
