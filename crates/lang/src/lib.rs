//! Front end for the refsim modelling language.
//!
//! [`parse`] lowers source text into an immutable [`Program`]: an `about`
//! block, a `default` stanza of application/substance definitions, named
//! `policy` stanzas of modifications, and `simulations` scenarios. Placement
//! violations and constructs outside the simplified object model (stochastic
//! sampling, trial counts above one) do not fail parsing; they mark the
//! affected node incompatible so the source can still round-trip through
//! [`Program::to_source`].
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc as std;

mod ast;
mod builder;
mod error;
mod parser;
mod token;
mod writer;

pub use ast::{
    Application, BinaryOp, Command, DefaultStanza, DisplaceTarget, Expr, Operand, Placement,
    PolicyStanza, Program, Scenario, StanzaKind, Substance, Target, UnaryOp,
};
pub use error::{IncompatibleProgram, ParseError, PlacementError};
pub use parser::{parse, TranslationResult};
pub use token::{tokenize, Keyword, Spanned, Token};
