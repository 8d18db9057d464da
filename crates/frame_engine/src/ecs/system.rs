//! System trait and implementations

use std::fmt;

use thiserror::Error;

use super::{StoreError, World};
use crate::events::EventError;

/// Errors a system hook can return
#[derive(Error, Debug)]
pub enum SystemError {
    /// Entity store operation failed
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Event processing failed
    #[error("Event error: {0}")]
    Events(#[from] EventError),

    /// System-specific failure
    #[error("{0}")]
    Custom(String),
}

impl SystemError {
    /// Build a custom error from any message
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom(message.into())
    }
}

/// Result of a system lifecycle hook
pub type SystemResult = Result<(), SystemError>;

/// Per-tick unit of game logic
///
/// Systems run in ascending [`priority`](Self::priority) order; equal
/// priorities keep insertion order. Errors returned from a hook propagate
/// to whoever drives the scheduler.
pub trait System {
    /// Unique name used for lookup and toggling
    fn name(&self) -> &str;

    /// Lower runs first
    fn priority(&self) -> i32 {
        0
    }

    /// Called once after the system is added to a set-up scheduler
    fn init(&mut self, _world: &mut World) -> SystemResult {
        Ok(())
    }

    /// Called every tick while enabled; `dt` is in milliseconds
    fn update(&mut self, world: &mut World, dt: f64) -> SystemResult;

    /// Called when the system is removed or the scheduler shuts down
    fn destroy(&mut self, _world: &mut World) -> SystemResult {
        Ok(())
    }
}

type UpdateFn = Box<dyn FnMut(&mut World, f64) -> SystemResult>;
type HookFn = Box<dyn FnMut(&mut World) -> SystemResult>;

/// System built from closures
pub struct FnSystem {
    name: String,
    priority: i32,
    update: UpdateFn,
    init: Option<HookFn>,
    destroy: Option<HookFn>,
}

impl FnSystem {
    /// Create a system from an update closure
    pub fn new<F>(name: impl Into<String>, priority: i32, update: F) -> Self
    where
        F: FnMut(&mut World, f64) -> SystemResult + 'static,
    {
        Self {
            name: name.into(),
            priority,
            update: Box::new(update),
            init: None,
            destroy: None,
        }
    }

    /// Attach an init hook (builder pattern)
    #[must_use]
    pub fn with_init<F>(mut self, init: F) -> Self
    where
        F: FnMut(&mut World) -> SystemResult + 'static,
    {
        self.init = Some(Box::new(init));
        self
    }

    /// Attach a destroy hook (builder pattern)
    #[must_use]
    pub fn with_destroy<F>(mut self, destroy: F) -> Self
    where
        F: FnMut(&mut World) -> SystemResult + 'static,
    {
        self.destroy = Some(Box::new(destroy));
        self
    }
}

impl System for FnSystem {
    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn init(&mut self, world: &mut World) -> SystemResult {
        match self.init.as_mut() {
            Some(init) => init(world),
            None => Ok(()),
        }
    }

    fn update(&mut self, world: &mut World, dt: f64) -> SystemResult {
        (self.update)(world, dt)
    }

    fn destroy(&mut self, world: &mut World) -> SystemResult {
        match self.destroy.as_mut() {
            Some(destroy) => destroy(world),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for FnSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnSystem")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_fn_system_hooks() {
        let calls = Rc::new(Cell::new(0.0));
        let seen = Rc::clone(&calls);
        let inits = Rc::new(Cell::new(0));
        let init_count = Rc::clone(&inits);

        let mut system = FnSystem::new("mover", 5, move |_, dt| {
            seen.set(seen.get() + dt);
            Ok(())
        })
        .with_init(move |_| {
            init_count.set(init_count.get() + 1);
            Ok(())
        });

        let mut world = World::new();
        assert_eq!(system.name(), "mover");
        assert_eq!(system.priority(), 5);
        system.init(&mut world).unwrap();
        system.update(&mut world, 16.5).unwrap();
        system.update(&mut world, 0.5).unwrap();
        system.destroy(&mut world).unwrap();

        assert_eq!(inits.get(), 1);
        assert_relative_eq!(calls.get(), 17.0);
    }

    #[test]
    fn test_store_errors_convert() {
        let mut world = World::new();
        let mut system = FnSystem::new("broken", 0, |world, _| {
            world.add_component("missing", "Pos", serde_json::Value::Null)?;
            Ok(())
        });

        let err = system.update(&mut world, 1.0).unwrap_err();
        assert!(matches!(err, SystemError::Store(StoreError::EntityNotFound(_))));
    }
}
