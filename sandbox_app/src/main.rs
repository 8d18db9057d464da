//! Sandbox
//!
//! Spins up the frame engine with a handful of drifting rocks and a ship,
//! runs a bounded number of paced frames and logs collisions along the way.
//!
//! Usage: `sandbox [config.toml|config.ron] [scene.toml|scene.ron]`

mod collaborators;
mod systems;

use std::cell::Cell;
use std::rc::Rc;

use frame_engine::config::ConfigError;
use frame_engine::events::EventArg;
use frame_engine::foundation::logging;
use frame_engine::physics::collision_event;
use frame_engine::physics::CollisionPhase;
use frame_engine::prelude::*;
use rand::Rng;
use serde_json::json;

use collaborators::{CirclePhysics, LogRenderer};

const FRAMES: u32 = 300;
const ROCKS: usize = 6;

#[derive(Debug, thiserror::Error)]
enum AppError {
    #[error("failed to load configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

fn identity(raw: serde_json::Value) -> serde_json::Value {
    raw
}

fn body(raw: serde_json::Value) -> serde_json::Value {
    let radius = raw["radius"].as_f64().unwrap_or(1.0);
    json!({ "radius": radius })
}

fn register_components(engine: &mut Engine) {
    engine
        .register_component("Position", identity)
        .register_component("Velocity", identity)
        .register_component_with_kind("Body", ComponentKind::PhysicsBody, body)
        .register_component_with_kind("Sprite", ComponentKind::Drawable, identity);
}

fn builtin_scene() -> SceneDescriptor {
    let mut rng = rand::thread_rng();
    let mut scene = SceneDescriptor::new("asteroid-field")
        .with_system(SystemDescriptor::new(systems::MOVEMENT))
        .with_system(SystemDescriptor::new(systems::WRAP))
        .with_entity(
            EntityDescriptor::with_id("ship")
                .with_component("Position", json!({"x": 0.0, "y": 0.0}))
                .with_component("Velocity", json!({"x": 0.0, "y": 0.0}))
                .with_component("Body", json!({"radius": 1.5}))
                .with_component("Sprite", json!({"glyph": "A"})),
        );

    for i in 0..ROCKS {
        let x = rng.gen_range(-systems::ARENA_HALF_SIZE..systems::ARENA_HALF_SIZE);
        let y = rng.gen_range(-systems::ARENA_HALF_SIZE..systems::ARENA_HALF_SIZE);
        let vx = rng.gen_range(-4.0..4.0);
        let vy = rng.gen_range(-4.0..4.0);
        scene = scene.with_entity(
            EntityDescriptor::with_id(format!("rock-{i}"))
                .with_component("Position", json!({"x": x, "y": y}))
                .with_component("Velocity", json!({"x": vx, "y": vy}))
                .with_component("Body", json!({"radius": rng.gen_range(1.0..3.0)}))
                .with_component("Sprite", json!({"glyph": "o"})),
        );
    }
    scene
}

fn load_scene_arg(path: Option<String>) -> Result<SceneDescriptor, ConfigError> {
    match path {
        Some(path) => {
            log::info!("Loading scene from {}", path);
            SceneDescriptor::load_from_file(&path)
        }
        None => Ok(builtin_scene()),
    }
}

fn run() -> Result<(), AppError> {
    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => EngineConfig::load_from_file(&path)?,
        None => EngineConfig::default(),
    };
    logging::init(&config.log_level);

    let mut engine = Engine::new(config)?;
    register_components(&mut engine);
    systems::register_all(engine.registry_mut());
    engine.set_physics(Box::new(CirclePhysics::new()));
    engine.set_renderer(Box::new(LogRenderer::new(60)));
    engine.setup(&[])?;

    let scene = load_scene_arg(args.next())?;
    let created = engine.load_scene(&scene)?;
    log::info!("Scene '{}' ready with {} entities", scene.name, created.len());

    let hits = Rc::new(Cell::new(0_u32));
    if engine.get("ship").is_some() {
        let counter = Rc::clone(&hits);
        engine.on(collision_event(CollisionPhase::Enter, "ship"), move |event| {
            if let Some(EventArg::Snapshot(other)) = event.args.first() {
                counter.set(counter.get() + 1);
                log::info!("Ship hit by '{}'", other.entity);
            }
            Ok(())
        });
    }

    let mut remaining = FRAMES;
    engine.on_frame(move |core, _dt| {
        remaining = remaining.saturating_sub(1);
        if remaining == 0 {
            core.world.request_stop();
        }
        Ok(())
    });
    engine.run();
    log::info!("Ship took {} hits", hits.get());

    engine.shutdown();
    Ok(())
}

fn main() {
    if let Err(err) = run() {
        log::error!("{}", err);
        eprintln!("sandbox: {err}");
        std::process::exit(1);
    }
}
