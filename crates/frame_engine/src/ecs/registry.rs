//! Static system registry
//!
//! Scenes name their systems by string. The registry maps those names to
//! constructors registered by the application at startup.

use std::collections::BTreeMap;
use std::fmt;

use super::scheduler::SchedulerError;
use super::System;

/// Constructor producing a fresh system instance
pub type SystemConstructor = Box<dyn Fn() -> Box<dyn System>>;

/// Name to constructor table
#[derive(Default)]
pub struct SystemRegistry {
    constructors: BTreeMap<String, SystemConstructor>,
}

impl SystemRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a constructor; an existing entry with the same name is replaced
    pub fn register<F>(&mut self, name: impl Into<String>, constructor: F) -> &mut Self
    where
        F: Fn() -> Box<dyn System> + 'static,
    {
        let name = name.into();
        if self.constructors.insert(name.clone(), Box::new(constructor)).is_some() {
            log::debug!("System constructor '{}' replaced", name);
        }
        self
    }

    /// Whether a name can be resolved
    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        self.constructors.keys().map(String::as_str).collect()
    }

    /// Build a new instance of a registered system
    pub fn resolve(&self, name: &str) -> Result<Box<dyn System>, SchedulerError> {
        self.constructors
            .get(name)
            .map(|constructor| constructor())
            .ok_or_else(|| SchedulerError::UnknownSystem(name.to_string()))
    }
}

impl fmt::Debug for SystemRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SystemRegistry")
            .field("systems", &self.names())
            .finish()
    }
}
