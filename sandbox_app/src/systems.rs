//! Gameplay systems for the sandbox scene

use frame_engine::prelude::*;

/// Registry name of the movement system
pub const MOVEMENT: &str = "movement";

/// Registry name of the arena wrap system
pub const WRAP: &str = "wrap";

/// Half extent of the square arena
pub const ARENA_HALF_SIZE: f64 = 20.0;

/// Integrate `Velocity` (units per second) into `Position`
pub fn movement() -> Box<dyn System> {
    Box::new(FnSystem::new(MOVEMENT, 10, |world, dt| {
        let secs = dt / 1000.0;
        for found in world.query(&["Position", "Velocity"]) {
            let Some(velocity) = found.first("Velocity").cloned() else {
                continue;
            };
            let (vx, vy) = (
                velocity["x"].as_f64().unwrap_or(0.0),
                velocity["y"].as_f64().unwrap_or(0.0),
            );
            for instance in found.instances("Position") {
                if let Some(pos) = world.component_value_mut(instance.id) {
                    pos["x"] = (pos["x"].as_f64().unwrap_or(0.0) + vx * secs).into();
                    pos["y"] = (pos["y"].as_f64().unwrap_or(0.0) + vy * secs).into();
                }
            }
        }
        Ok(())
    }))
}

fn wrap_axis(value: f64) -> f64 {
    let span = ARENA_HALF_SIZE * 2.0;
    (value + ARENA_HALF_SIZE).rem_euclid(span) - ARENA_HALF_SIZE
}

/// Keep every position inside the arena by wrapping at the edges
pub fn wrap() -> Box<dyn System> {
    Box::new(FnSystem::new(WRAP, 20, |world, _dt| {
        for found in world.query(&["Position"]) {
            for instance in found.instances("Position") {
                if let Some(pos) = world.component_value_mut(instance.id) {
                    let x = wrap_axis(pos["x"].as_f64().unwrap_or(0.0));
                    let y = wrap_axis(pos["y"].as_f64().unwrap_or(0.0));
                    pos["x"] = x.into();
                    pos["y"] = y.into();
                }
            }
        }
        Ok(())
    }))
}

/// Register every sandbox system constructor
pub fn register_all(registry: &mut SystemRegistry) {
    registry.register(MOVEMENT, movement).register(WRAP, wrap);
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use serde_json::json;

    #[test]
    fn test_movement_integrates_velocity() {
        let mut world = World::new();
        world.register_component("Position", |raw| raw);
        world.register_component("Velocity", |raw| raw);
        let e = world.create();
        let pos = world.add_component(&e, "Position", json!({"x": 1.0, "y": 2.0})).unwrap();
        world.add_component(&e, "Velocity", json!({"x": 2.0, "y": -4.0})).unwrap();

        let mut system = movement();
        system.update(&mut world, 500.0).unwrap();

        let value = world.component(pos).unwrap().value;
        assert_relative_eq!(value["x"].as_f64().unwrap(), 2.0);
        assert_relative_eq!(value["y"].as_f64().unwrap(), 0.0);
    }

    #[test]
    fn test_wrap_axis() {
        assert_relative_eq!(wrap_axis(21.0), -19.0);
        assert_relative_eq!(wrap_axis(-21.0), 19.0);
        assert_relative_eq!(wrap_axis(5.0), 5.0);
    }
}
