//! Primitive types shared by every refsim crate.
//!
//! A [`Value`] is a magnitude paired with a [`UnitSpec`]; all arithmetic on
//! values happens in the converter or the engine, never here. [`YearRange`]
//! gates commands to simulated years and [`StreamId`] names the per-substance
//! quantities the engine tracks.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc as std;

mod error;
mod stream;
mod unit;
mod value;
mod year_range;

pub use error::{ArithmeticError, LifecycleError, NameKind, RangeViolation, UnknownName};
pub use stream::StreamId;
pub use unit::{Unit, UnitFamily, UnitParseError, UnitSpec};
pub use value::Value;
pub use year_range::YearRange;
