//! Scene descriptors
//!
//! A scene is data: the systems it wants running and the entities it starts
//! with. Descriptors load through [`Config`] like any other settings file,
//! and [`crate::Engine::load_scene`] applies them.
//!
//! ```toml
//! name = "arena"
//!
//! [[systems]]
//! name = "movement"
//!
//! [[entities]]
//! id = "player"
//! [entities.components]
//! Position = { x = 0.0, y = 0.0 }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{Config, ConfigError};

/// One system a scene needs
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SystemDescriptor {
    /// Name the system is scheduled and toggled under
    pub name: String,
    /// Registry entry to build it from, when it differs from `name`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
}

impl SystemDescriptor {
    /// Descriptor resolved by its own name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            module: None,
        }
    }

    /// Resolve through a different registry entry (builder pattern)
    #[must_use]
    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    /// Key to look up in the system registry
    pub fn registry_key(&self) -> &str {
        self.module.as_deref().unwrap_or(&self.name)
    }
}

/// One entity a scene starts with
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EntityDescriptor {
    /// Fixed id; generated when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Component type name mapped to raw data
    #[serde(default)]
    pub components: BTreeMap<String, Value>,
}

impl EntityDescriptor {
    /// Entity with a generated id
    pub fn new() -> Self {
        Self::default()
    }

    /// Entity with a fixed id
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            components: BTreeMap::new(),
        }
    }

    /// Add a component (builder pattern)
    #[must_use]
    pub fn with_component(mut self, type_name: impl Into<String>, raw: Value) -> Self {
        self.components.insert(type_name.into(), raw);
        self
    }
}

/// Systems and entities making up one scene
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneDescriptor {
    /// Scene name, carried by `scene:flush` / `scene:loaded`
    pub name: String,
    /// Systems to resolve and enable
    pub systems: Vec<SystemDescriptor>,
    /// Entities to create
    pub entities: Vec<EntityDescriptor>,
}

impl SceneDescriptor {
    /// Empty scene
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Add a system (builder pattern)
    #[must_use]
    pub fn with_system(mut self, system: SystemDescriptor) -> Self {
        self.systems.push(system);
        self
    }

    /// Add an entity (builder pattern)
    #[must_use]
    pub fn with_entity(mut self, entity: EntityDescriptor) -> Self {
        self.entities.push(entity);
        self
    }

    /// Names of the scene's systems
    pub fn system_names(&self) -> Vec<&str> {
        self.systems.iter().map(|system| system.name.as_str()).collect()
    }
}

impl Config for SceneDescriptor {
    fn check(&self) -> Result<(), ConfigError> {
        if let Some(unnamed) = self.systems.iter().position(|system| system.name.is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "scene '{}': system #{} has no name",
                self.name, unnamed
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_registry_key_prefers_module() {
        assert_eq!(SystemDescriptor::new("move").registry_key(), "move");
        assert_eq!(
            SystemDescriptor::new("move").with_module("systems/movement").registry_key(),
            "systems/movement"
        );
    }

    #[test]
    fn test_scene_from_toml() {
        let text = r#"
            name = "arena"

            [[systems]]
            name = "movement"

            [[systems]]
            name = "spawner"
            module = "waves"

            [[entities]]
            id = "player"
            [entities.components]
            Position = { x = 1.0, y = 2.0 }

            [[entities]]
            [entities.components]
            Tag = "rock"
        "#;
        let scene: SceneDescriptor = toml::from_str(text).unwrap();

        assert_eq!(scene.name, "arena");
        assert_eq!(scene.system_names(), vec!["movement", "spawner"]);
        assert_eq!(scene.systems[1].registry_key(), "waves");
        assert_eq!(scene.entities[0].id.as_deref(), Some("player"));
        assert_eq!(scene.entities[0].components["Position"], json!({"x": 1.0, "y": 2.0}));
        assert_eq!(scene.entities[1].id, None);
        assert_eq!(scene.entities[1].components["Tag"], json!("rock"));
    }

    #[test]
    fn test_builders() {
        let scene = SceneDescriptor::new("s")
            .with_system(SystemDescriptor::new("a"))
            .with_entity(EntityDescriptor::with_id("e").with_component("Pos", json!({"x": 0})));

        assert_eq!(scene.systems.len(), 1);
        assert_eq!(scene.entities[0].components.len(), 1);
    }

    #[test]
    fn test_unnamed_system_rejected_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "name = \"broken\"\n\n[[systems]]\nname = \"\"\n").unwrap();

        let result = SceneDescriptor::load_from_file(&path);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }
}
