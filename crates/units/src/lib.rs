//! Dimensional unit conversion over engine state.
//!
//! [`UnitConverter`] rewrites a [`Value`](primitives::Value) into a
//! destination unit, consulting a [`StateProvider`](context::StateProvider)
//! for the contextual totals that make conversions like `% → kg` or
//! `units → tCO2e` meaningful.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc as std;

mod converter;
mod error;

pub use converter::UnitConverter;
pub use error::UnitConversionError;
