//! Four-level lexical variable stack.

use core::fmt;
use primitives::Value;
use std::{collections::BTreeMap, string::String};

/// Name served by the engine as "current year minus start year".
pub const YEARS_ELAPSED: &str = "yearsElapsed";
/// Name served by the engine as the current absolute year.
pub const YEAR_ABSOLUTE: &str = "yearAbsolute";

/// Depth of a variable context, outermost first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ContextLevel {
    /// Program-wide context.
    #[default]
    Global = 0,
    /// Inside a stanza.
    Stanza = 1,
    /// Inside an application.
    Application = 2,
    /// Inside a substance.
    Substance = 3,
}

impl ContextLevel {
    /// Index into the context array.
    #[inline]
    pub const fn depth(self) -> usize {
        self as usize
    }
}

impl fmt::Display for ContextLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Global => "global",
            Self::Stanza => "stanza",
            Self::Application => "application",
            Self::Substance => "substance",
        })
    }
}

/// Errors from variable definition and lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VariableError {
    /// `define` found the name already bound at the current level.
    AlreadyDefined {
        /// The duplicated name.
        name: String,
    },
    /// `set`/`get` walked every level without finding the name.
    Undefined {
        /// The unresolved name.
        name: String,
    },
    /// The name is defined but was never assigned a value.
    Unset {
        /// The unassigned name.
        name: String,
    },
    /// The name is reserved and served by the engine.
    Reserved {
        /// The reserved name.
        name: String,
    },
}

impl core::error::Error for VariableError {}

impl fmt::Display for VariableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyDefined { name } => {
                write!(f, "variable `{name}` is already defined at this level")
            }
            Self::Undefined { name } => write!(f, "variable `{name}` is not defined"),
            Self::Unset { name } => write!(f, "variable `{name}` has no value"),
            Self::Reserved { name } => write!(f, "variable `{name}` is reserved"),
        }
    }
}

/// Four independent name→value contexts with lexical shadowing.
///
/// Lookup walks from the current level outward to global. Writes update the
/// innermost level that defines the name. Moving to a level clears every
/// non-global context at that level or deeper, so re-entering a stanza
/// starts it (and everything inside it) fresh.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VariableManager {
    level: ContextLevel,
    contexts: [BTreeMap<String, Option<Value>>; 4],
}

impl VariableManager {
    /// Creates a manager at the global level with empty contexts.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current context level.
    #[inline]
    pub const fn level(&self) -> ContextLevel {
        self.level
    }

    /// Returns a manager moved to `level`, with every non-global context at
    /// that level or deeper cleared.
    pub fn with_level(&self, level: ContextLevel) -> Self {
        let mut next = self.clone();
        next.level = level;
        let first_cleared = level.depth().max(ContextLevel::Stanza.depth());
        for context in &mut next.contexts[first_cleared..] {
            context.clear();
        }
        next
    }

    /// Binds `name` (with no value) at the current level.
    pub fn define(&mut self, name: &str) -> Result<(), VariableError> {
        reject_reserved(name)?;
        let context = &mut self.contexts[self.level.depth()];
        if context.contains_key(name) {
            return Err(VariableError::AlreadyDefined { name: name.into() });
        }
        context.insert(name.into(), None);
        Ok(())
    }

    /// Assigns to the innermost level that defines `name`.
    pub fn set(&mut self, name: &str, value: Value) -> Result<(), VariableError> {
        reject_reserved(name)?;
        for depth in (0..=self.level.depth()).rev() {
            if let Some(slot) = self.contexts[depth].get_mut(name) {
                *slot = Some(value);
                return Ok(());
            }
        }
        Err(VariableError::Undefined { name: name.into() })
    }

    /// Reads from the innermost level that defines `name`.
    pub fn get(&self, name: &str) -> Result<Value, VariableError> {
        reject_reserved(name)?;
        for depth in (0..=self.level.depth()).rev() {
            if let Some(slot) = self.contexts[depth].get(name) {
                return slot.ok_or_else(|| VariableError::Unset { name: name.into() });
            }
        }
        Err(VariableError::Undefined { name: name.into() })
    }

    /// Whether `name` is visible from the current level.
    pub fn is_defined(&self, name: &str) -> bool {
        (0..=self.level.depth()).any(|depth| self.contexts[depth].contains_key(name))
    }
}

fn reject_reserved(name: &str) -> Result<(), VariableError> {
    if name == YEARS_ELAPSED || name == YEAR_ABSOLUTE {
        return Err(VariableError::Reserved { name: name.into() });
    }
    Ok(())
}
