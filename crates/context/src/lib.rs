//! Execution context for the refsim engine.
//!
//! [`StateProvider`] exposes the engine quantities the unit converter needs;
//! [`OverridingStateProvider`] layers transient overrides on top of any
//! provider so recalculations can reason about hypothetical states without
//! touching the engine. [`Scope`] and [`VariableManager`] implement the
//! four-level lexical variable stack, and [`Cfg`] carries the run
//! configuration.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc as std;

mod cfg;
mod overriding;
mod provider;
mod scope;
mod variables;

pub use cfg::Cfg;
pub use overriding::OverridingStateProvider;
pub use provider::{NullProvider, StateProvider};
pub use scope::Scope;
pub use variables::{
    ContextLevel, VariableError, VariableManager, YEARS_ELAPSED, YEAR_ABSOLUTE,
};
