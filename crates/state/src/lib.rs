//! Stream state for the refsim engine.
//!
//! The [`StreamKeeper`] owns every per-(application, substance) stream and
//! [`StreamParameterization`]. Values are converted into each stream's base
//! unit on write and guarded against NaN and negative magnitudes.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc as std;

mod error;
mod keeper;
mod params;

pub use error::StateError;
pub use keeper::{StreamKeeper, SubstanceKey};
pub use params::StreamParameterization;
