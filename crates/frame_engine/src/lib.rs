//! # Frame Engine
//!
//! A single-threaded, frame-driven Entity-Component-System runtime.
//!
//! ## Features
//!
//! - **Entity Store**: String entity ids, registered component factories,
//!   ALL/ANY queries and globally unique component ids
//! - **Event Bus**: Deferred and immediate publish/subscribe with isolated
//!   listener failures
//! - **System Scheduler**: Priority-ordered systems with enable/disable
//!   lifecycle and always-on physics/render bridges
//! - **Game Clock**: Variable and fixed timestep callbacks with capped
//!   catch-up
//! - **Scenes**: Data-driven scene descriptors loaded from TOML or RON
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use frame_engine::prelude::*;
//! use serde_json::json;
//!
//! fn main() -> Result<(), EngineError> {
//!     let mut engine = Engine::new(EngineConfig::default())?;
//!     engine.register_component("Position", |raw| raw);
//!     engine.setup(&[])?;
//!
//!     let player = engine.create_with_id("player");
//!     engine.add_component(&player, "Position", json!({"x": 0.0, "y": 0.0}))?;
//!
//!     engine.run_frames(60);
//!     engine.shutdown();
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod clock;
pub mod config;
pub mod ecs;
pub mod events;
pub mod foundation;
pub mod physics;
pub mod render;
pub mod scene;

mod engine;

pub use engine::{Engine, EngineCore, EngineError};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        clock::{CallbackId, FrameReport, GameClock},
        config::{Config, EngineConfig},
        ecs::{
            ComponentId, ComponentKind, EntityId, EntitySnapshot, FnSystem, QueryMatch, System, SystemError,
            SystemRegistry, SystemResult, World,
        },
        events::{names, Event, EventArg, EventBus, Subscription},
        foundation::time::{ManualTime, MonotonicTime, TimeSource},
        physics::{PhysicsCollaborator, NullPhysics},
        render::{RenderCollaborator, NullRenderer},
        scene::{EntityDescriptor, SceneDescriptor, SystemDescriptor},
        Engine, EngineCore, EngineError,
    };
}
