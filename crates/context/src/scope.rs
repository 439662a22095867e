//! The (stanza, application, substance) execution scope.

use crate::{ContextLevel, VariableError, VariableManager};
use primitives::{LifecycleError, Value};
use std::string::String;

/// Where execution is currently reading and writing.
///
/// Components form a strict hierarchy: a substance requires an application,
/// an application requires a stanza. Scope transitions return a new scope;
/// the carried [`VariableManager`] moves to the matching context level,
/// which clears any deeper contexts.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Scope {
    stanza: Option<String>,
    application: Option<String>,
    substance: Option<String>,
    variables: VariableManager,
}

impl Scope {
    /// Creates an empty global scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current stanza, if any.
    #[inline]
    pub fn stanza(&self) -> Option<&str> {
        self.stanza.as_deref()
    }

    /// The current application, if any.
    #[inline]
    pub fn application(&self) -> Option<&str> {
        self.application.as_deref()
    }

    /// The current substance, if any.
    #[inline]
    pub fn substance(&self) -> Option<&str> {
        self.substance.as_deref()
    }

    /// The context level implied by the non-null components.
    pub fn level(&self) -> ContextLevel {
        if self.substance.is_some() {
            ContextLevel::Substance
        } else if self.application.is_some() {
            ContextLevel::Application
        } else if self.stanza.is_some() {
            ContextLevel::Stanza
        } else {
            ContextLevel::Global
        }
    }

    /// Enters a stanza, leaving any application/substance scope.
    pub fn with_stanza(&self, name: impl Into<String>) -> Self {
        Self {
            stanza: Some(name.into()),
            application: None,
            substance: None,
            variables: self.variables.with_level(ContextLevel::Stanza),
        }
    }

    /// Enters an application under the current stanza.
    pub fn with_application(&self, name: impl Into<String>) -> Result<Self, LifecycleError> {
        if self.stanza.is_none() {
            return Err(LifecycleError::ApplicationWithoutStanza);
        }
        Ok(Self {
            stanza: self.stanza.clone(),
            application: Some(name.into()),
            substance: None,
            variables: self.variables.with_level(ContextLevel::Application),
        })
    }

    /// Enters a substance under the current application.
    pub fn with_substance(&self, name: impl Into<String>) -> Result<Self, LifecycleError> {
        if self.application.is_none() {
            return Err(LifecycleError::SubstanceWithoutApplication);
        }
        Ok(Self {
            stanza: self.stanza.clone(),
            application: self.application.clone(),
            substance: Some(name.into()),
            variables: self.variables.with_level(ContextLevel::Substance),
        })
    }

    /// Binds a variable at the current level.
    pub fn define(&mut self, name: &str) -> Result<(), VariableError> {
        self.variables.define(name)
    }

    /// Assigns to the innermost level defining `name`.
    pub fn set(&mut self, name: &str, value: Value) -> Result<(), VariableError> {
        self.variables.set(name, value)
    }

    /// Reads the innermost binding of `name`.
    pub fn get(&self, name: &str) -> Result<Value, VariableError> {
        self.variables.get(name)
    }

    /// Whether `name` is visible from the current level.
    pub fn is_defined(&self, name: &str) -> bool {
        self.variables.is_defined(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hierarchy_is_enforced() {
        let scope = Scope::new();
        assert_eq!(
            scope.with_application("domestic refrigeration"),
            Err(LifecycleError::ApplicationWithoutStanza)
        );
        let stanza = scope.with_stanza("default");
        assert_eq!(
            stanza.with_substance("HFC-134a"),
            Err(LifecycleError::SubstanceWithoutApplication)
        );
    }

    #[test]
    fn level_tracks_components() {
        let scope = Scope::new();
        assert_eq!(scope.level(), ContextLevel::Global);
        let scope = scope.with_stanza("default");
        assert_eq!(scope.level(), ContextLevel::Stanza);
        let scope = scope.with_application("app").unwrap();
        assert_eq!(scope.level(), ContextLevel::Application);
        let scope = scope.with_substance("sub").unwrap();
        assert_eq!(scope.level(), ContextLevel::Substance);
        assert_eq!(scope.substance(), Some("sub"));
    }

    #[test]
    fn reentering_stanza_clears_application_and_substance() {
        let scope = Scope::new().with_stanza("default");
        let mut inner = scope
            .with_application("app")
            .unwrap()
            .with_substance("sub")
            .unwrap();
        inner.define("x").unwrap();
        let reentered = inner.with_stanza("policy");
        assert_eq!(reentered.application(), None);
        assert_eq!(reentered.substance(), None);
        assert!(!reentered.is_defined("x"));
    }

    #[test]
    fn global_variables_visible_everywhere() {
        let mut scope = Scope::new();
        scope.define("g").unwrap();
        scope.set("g", Value::scalar(3.0)).unwrap();
        let inner = scope
            .with_stanza("default")
            .with_application("app")
            .unwrap()
            .with_substance("sub")
            .unwrap();
        assert_eq!(inner.get("g").unwrap(), Value::scalar(3.0));
    }
}
