//! Entity-Component-System implementation
//!
//! Entities are string ids, components are dynamic values produced by
//! registered factories, and systems are prioritized units of per-tick
//! logic driven by the scheduler.

pub mod component;
pub mod entity;
pub mod query;
pub mod registry;
pub mod scheduler;
pub mod store;
pub mod system;
pub mod systems;
pub mod world;

#[cfg(test)]
mod tests;

pub use component::{ComponentFactory, ComponentId, ComponentInstance, ComponentKind};
pub use entity::EntityId;
pub use query::{ComponentMap, EntitySnapshot, QueryMatch};
pub use registry::{SystemConstructor, SystemRegistry};
pub use scheduler::{SchedulerError, SystemInfo, SystemScheduler};
pub use store::{EntityStore, StoreError};
pub use system::{FnSystem, System, SystemError, SystemResult};
pub use world::World;
