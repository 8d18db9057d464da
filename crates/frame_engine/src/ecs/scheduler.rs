//! System scheduling
//!
//! Systems live in one list kept stably sorted by ascending priority, so
//! equal priorities run in insertion order. Execution is strictly
//! sequential: every enabled system is updated once per tick, announced by
//! `system:update:start` / `system:update:end`.
//!
//! Default systems (the collaborator bridges) are added by
//! [`SystemScheduler::setup`] and are exempt from [`SystemScheduler::clear`].

use thiserror::Error;

use super::registry::SystemRegistry;
use super::system::SystemError;
use super::{System, World};
use crate::events::{names, EventArg};
use crate::scene::SystemDescriptor;

/// Scheduler errors
#[derive(Error, Debug)]
pub enum SchedulerError {
    /// A system hook returned an error
    #[error("System '{name}' failed: {source}")]
    SystemFailed {
        /// Name of the failing system
        name: String,
        /// Underlying error
        #[source]
        source: SystemError,
    },

    /// No constructor registered under this name
    #[error("Unknown system: {0}")]
    UnknownSystem(String),

    /// A system with this name is already scheduled
    #[error("System already scheduled: {0}")]
    DuplicateSystem(String),

    /// `setup` was called twice
    #[error("Scheduler is already set up")]
    AlreadySetUp,
}

/// Read-only view of one scheduled system
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemInfo {
    /// System name
    pub name: String,
    /// Execution priority
    pub priority: i32,
    /// Whether the system is ticked
    pub enabled: bool,
    /// Whether the system is a built-in that `clear` leaves alone
    pub is_default: bool,
}

struct Entry {
    system: Box<dyn System>,
    priority: i32,
    enabled: bool,
    is_default: bool,
}

impl Entry {
    fn info(&self) -> SystemInfo {
        SystemInfo {
            name: self.system.name().to_string(),
            priority: self.priority,
            enabled: self.enabled,
            is_default: self.is_default,
        }
    }
}

/// Priority-ordered list of systems
#[derive(Default)]
pub struct SystemScheduler {
    entries: Vec<Entry>,
    set_up: bool,
}

impl SystemScheduler {
    /// Create an empty scheduler
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether [`setup`](Self::setup) has run
    pub const fn is_set_up(&self) -> bool {
        self.set_up
    }

    /// Number of scheduled systems
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no systems are scheduled
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether a system with this name is scheduled
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Install the default systems and resolve scene descriptors
    ///
    /// Defaults go in first. A descriptor that cannot be resolved is logged
    /// and skipped. Every system is then initialized in scheduler order.
    pub fn setup(
        &mut self,
        world: &mut World,
        defaults: Vec<Box<dyn System>>,
        descriptors: &[SystemDescriptor],
        registry: &SystemRegistry,
    ) -> Result<(), SchedulerError> {
        if self.set_up {
            return Err(SchedulerError::AlreadySetUp);
        }

        for system in defaults {
            if let Err(e) = self.insert(system, true) {
                log::warn!("Skipping default system: {}", e);
            }
        }
        let resolved = self.resolve_descriptors(world, descriptors, registry);
        log::debug!(
            "Scheduler setup: {} systems ({} from {} descriptors)",
            self.entries.len(),
            resolved,
            descriptors.len()
        );

        self.set_up = true;
        for entry in &mut self.entries {
            init_entry(entry, world)?;
        }
        Ok(())
    }

    /// Resolve descriptors whose systems are not scheduled yet
    ///
    /// Returns how many systems were added. Once the scheduler is set up,
    /// each new system is initialized immediately. Any failure is logged and
    /// that system left out.
    pub fn resolve_descriptors(
        &mut self,
        world: &mut World,
        descriptors: &[SystemDescriptor],
        registry: &SystemRegistry,
    ) -> usize {
        let mut added = 0;
        for descriptor in descriptors {
            if self.contains(&descriptor.name) {
                continue;
            }
            let result = registry
                .resolve(descriptor.registry_key())
                .and_then(|system| self.add_system(world, system));
            match result {
                Ok(()) => added += 1,
                Err(e) => log::warn!("Could not load system '{}': {}", descriptor.name, e),
            }
        }
        added
    }

    /// Add a system, enabled
    ///
    /// Once the scheduler is set up the system is initialized right away;
    /// if that fails it is not kept.
    pub fn add_system(&mut self, world: &mut World, system: Box<dyn System>) -> Result<(), SchedulerError> {
        let index = self.insert(system, false)?;
        if self.set_up {
            if let Err(e) = init_entry(&mut self.entries[index], world) {
                self.entries.remove(index);
                return Err(e);
            }
        }
        Ok(())
    }

    /// Remove a non-default system, calling its `destroy` hook
    ///
    /// Unknown names and default systems are left alone and return `false`.
    pub fn remove_system(&mut self, world: &mut World, name: &str) -> Result<bool, SchedulerError> {
        let Some(index) = self.position(name) else {
            return Ok(false);
        };
        if self.entries[index].is_default {
            log::warn!("Default system '{}' cannot be removed", name);
            return Ok(false);
        }
        let mut entry = self.entries.remove(index);
        entry
            .system
            .destroy(world)
            .map_err(|source| SchedulerError::SystemFailed {
                name: name.to_string(),
                source,
            })?;
        log::debug!("System '{}' removed", name);
        Ok(true)
    }

    fn insert(&mut self, system: Box<dyn System>, is_default: bool) -> Result<usize, SchedulerError> {
        let name = system.name().to_string();
        if self.contains(&name) {
            return Err(SchedulerError::DuplicateSystem(name));
        }
        let priority = system.priority();
        // Insert after every entry with priority <= ours: a stable sorted insert.
        let index = self.entries.partition_point(|entry| entry.priority <= priority);
        self.entries.insert(
            index,
            Entry {
                system,
                priority,
                enabled: true,
                is_default,
            },
        );
        log::debug!("System '{}' scheduled at priority {}", name, priority);
        Ok(index)
    }

    /// Run every enabled system once
    ///
    /// The first failing system aborts the tick; its start event has been
    /// emitted but its end event is not.
    pub fn update(&mut self, world: &mut World, dt: f64) -> Result<(), SchedulerError> {
        for entry in self.entries.iter_mut().filter(|entry| entry.enabled) {
            let name = entry.system.name().to_string();
            world.emit_immediate(
                names::SYSTEM_UPDATE_START,
                vec![EventArg::Text(name.clone()), EventArg::Number(dt)],
            );
            if let Err(source) = entry.system.update(world, dt) {
                return Err(SchedulerError::SystemFailed { name, source });
            }
            world.emit_immediate(names::SYSTEM_UPDATE_END, vec![EventArg::Text(name), EventArg::Number(dt)]);
        }
        Ok(())
    }

    /// Flip one system's enabled flag; returns the new state
    pub fn toggle(&mut self, name: &str) -> Option<bool> {
        let entry = self.entries.iter_mut().find(|entry| entry.system.name() == name)?;
        entry.enabled = !entry.enabled;
        log::debug!("System '{}' {}", name, if entry.enabled { "enabled" } else { "disabled" });
        Some(entry.enabled)
    }

    /// Enable exactly the named systems; others keep their state
    pub fn setup_scene(&mut self, names: &[&str]) {
        for name in names {
            match self.entries.iter_mut().find(|entry| entry.system.name() == *name) {
                Some(entry) => entry.enabled = true,
                None => log::debug!("Scene system '{}' is not scheduled", name),
            }
        }
    }

    /// Disable every non-default system
    pub fn clear(&mut self) {
        for entry in self.entries.iter_mut().filter(|entry| !entry.is_default) {
            entry.enabled = false;
        }
    }

    /// Destroy every system in scheduler order and empty the list
    ///
    /// Destroy failures are logged; every system still gets its call.
    pub fn shutdown(&mut self, world: &mut World) {
        for mut entry in self.entries.drain(..) {
            if let Err(e) = entry.system.destroy(world) {
                log::error!("System '{}' failed to shut down: {}", entry.system.name(), e);
            }
        }
        self.set_up = false;
    }

    /// Info for one system
    pub fn get_system(&self, name: &str) -> Option<SystemInfo> {
        self.position(name).map(|index| self.entries[index].info())
    }

    /// Every system in execution order
    pub fn get_all(&self) -> Vec<SystemInfo> {
        self.entries.iter().map(Entry::info).collect()
    }

    /// Enabled systems in execution order
    pub fn get_enabled(&self) -> Vec<SystemInfo> {
        self.entries
            .iter()
            .filter(|entry| entry.enabled)
            .map(Entry::info)
            .collect()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|entry| entry.system.name() == name)
    }
}

fn init_entry(entry: &mut Entry, world: &mut World) -> Result<(), SchedulerError> {
    entry.system.init(world).map_err(|source| SchedulerError::SystemFailed {
        name: entry.system.name().to_string(),
        source,
    })
}

impl std::fmt::Debug for SystemScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemScheduler")
            .field("systems", &self.get_all())
            .field("set_up", &self.set_up)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::FnSystem;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Trace = Rc<RefCell<Vec<String>>>;

    fn traced(name: &str, priority: i32, trace: &Trace) -> Box<dyn System> {
        let trace = Rc::clone(trace);
        let label = name.to_string();
        Box::new(FnSystem::new(name, priority, move |_, _| {
            trace.borrow_mut().push(label.clone());
            Ok(())
        }))
    }

    fn names_of(infos: &[SystemInfo]) -> Vec<&str> {
        infos.iter().map(|info| info.name.as_str()).collect()
    }

    #[test]
    fn test_priority_order_is_stable() {
        let mut world = World::new();
        let trace = Trace::default();
        let mut scheduler = SystemScheduler::new();
        scheduler.add_system(&mut world, traced("three", 3, &trace)).unwrap();
        scheduler.add_system(&mut world, traced("one", 1, &trace)).unwrap();
        scheduler.add_system(&mut world, traced("two", 2, &trace)).unwrap();
        scheduler.add_system(&mut world, traced("one_b", 1, &trace)).unwrap();

        assert_eq!(names_of(&scheduler.get_all()), vec!["one", "one_b", "two", "three"]);
    }

    #[test]
    fn test_disabled_system_is_skipped() {
        let mut world = World::new();
        let trace = Trace::default();
        let mut scheduler = SystemScheduler::new();
        scheduler.add_system(&mut world, traced("c", 3, &trace)).unwrap();
        scheduler.add_system(&mut world, traced("a", 1, &trace)).unwrap();
        scheduler.add_system(&mut world, traced("b", 2, &trace)).unwrap();

        assert_eq!(scheduler.toggle("a"), Some(false));
        scheduler.update(&mut world, 16.0).unwrap();

        assert_eq!(*trace.borrow(), vec!["b", "c"]);
        assert_eq!(names_of(&scheduler.get_enabled()), vec!["b", "c"]);
        assert_eq!(scheduler.toggle("ghost"), None);
    }

    #[test]
    fn test_update_announces_each_enabled_system() {
        let mut world = World::new();
        let announced = Trace::default();
        for event in [names::SYSTEM_UPDATE_START, names::SYSTEM_UPDATE_END] {
            let sink = Rc::clone(&announced);
            world.on(event, move |e| {
                let system = e.arg(0).and_then(EventArg::as_str).unwrap_or_default();
                sink.borrow_mut().push(format!("{}:{}", e.name, system));
                Ok(())
            });
        }
        let trace = Trace::default();
        let mut scheduler = SystemScheduler::new();
        scheduler.add_system(&mut world, traced("a", 0, &trace)).unwrap();
        scheduler.add_system(&mut world, traced("b", 0, &trace)).unwrap();
        scheduler.toggle("b");

        scheduler.update(&mut world, 1.0).unwrap();

        assert_eq!(
            *announced.borrow(),
            vec!["system:update:start:a", "system:update:end:a"]
        );
    }

    #[test]
    fn test_failing_system_stops_the_tick() {
        let mut world = World::new();
        let trace = Trace::default();
        let mut scheduler = SystemScheduler::new();
        scheduler
            .add_system(
                &mut world,
                Box::new(FnSystem::new("bad", 0, |_, _| Err(SystemError::custom("boom")))),
            )
            .unwrap();
        scheduler.add_system(&mut world, traced("after", 1, &trace)).unwrap();

        let err = scheduler.update(&mut world, 1.0).unwrap_err();
        assert!(matches!(err, SchedulerError::SystemFailed { ref name, .. } if name == "bad"));
        assert!(trace.borrow().is_empty());
    }

    #[test]
    fn test_setup_installs_defaults_and_skips_unknown() {
        let mut world = World::new();
        let trace = Trace::default();
        let mut registry = SystemRegistry::new();
        let registered = Rc::clone(&trace);
        registry.register("mover", move || traced("mover", 5, &registered));

        let descriptors = vec![SystemDescriptor::new("mover"), SystemDescriptor::new("missing")];
        let mut scheduler = SystemScheduler::new();
        scheduler
            .setup(&mut world, vec![traced("bridge", 100, &trace)], &descriptors, &registry)
            .unwrap();

        let all = scheduler.get_all();
        assert_eq!(names_of(&all), vec!["mover", "bridge"]);
        assert!(all[1].is_default);
        assert!(!all[0].is_default);

        assert!(matches!(
            scheduler.setup(&mut world, Vec::new(), &[], &registry),
            Err(SchedulerError::AlreadySetUp)
        ));
    }

    #[test]
    fn test_clear_spares_defaults_and_setup_scene_enables() {
        let mut world = World::new();
        let trace = Trace::default();
        let mut scheduler = SystemScheduler::new();
        scheduler
            .setup(&mut world, vec![traced("bridge", 100, &trace)], &[], &SystemRegistry::new())
            .unwrap();
        scheduler.add_system(&mut world, traced("a", 0, &trace)).unwrap();
        scheduler.add_system(&mut world, traced("b", 0, &trace)).unwrap();

        scheduler.clear();
        assert_eq!(names_of(&scheduler.get_enabled()), vec!["bridge"]);

        scheduler.setup_scene(&["b", "ghost"]);
        assert_eq!(names_of(&scheduler.get_enabled()), vec!["b", "bridge"]);
    }

    #[test]
    fn test_init_on_add_after_setup_and_destroy_on_remove() {
        let mut world = World::new();
        let hooks = Trace::default();
        let mut scheduler = SystemScheduler::new();
        scheduler.setup(&mut world, Vec::new(), &[], &SystemRegistry::new()).unwrap();

        let (on_init, on_destroy) = (Rc::clone(&hooks), Rc::clone(&hooks));
        let system = FnSystem::new("hooked", 0, |_, _| Ok(()))
            .with_init(move |_| {
                on_init.borrow_mut().push("init".to_string());
                Ok(())
            })
            .with_destroy(move |_| {
                on_destroy.borrow_mut().push("destroy".to_string());
                Ok(())
            });
        scheduler.add_system(&mut world, Box::new(system)).unwrap();
        assert!(scheduler.remove_system(&mut world, "hooked").unwrap());
        assert!(!scheduler.remove_system(&mut world, "hooked").unwrap());

        assert_eq!(*hooks.borrow(), vec!["init", "destroy"]);
    }

    #[test]
    fn test_duplicate_and_default_protection() {
        let mut world = World::new();
        let trace = Trace::default();
        let mut scheduler = SystemScheduler::new();
        scheduler
            .setup(&mut world, vec![traced("bridge", 100, &trace)], &[], &SystemRegistry::new())
            .unwrap();

        assert!(matches!(
            scheduler.add_system(&mut world, traced("bridge", 0, &trace)),
            Err(SchedulerError::DuplicateSystem(_))
        ));
        assert!(!scheduler.remove_system(&mut world, "bridge").unwrap());
        assert_eq!(scheduler.len(), 1);

        scheduler.shutdown(&mut world);
        assert!(scheduler.is_empty());
        assert!(!scheduler.is_set_up());
    }
}
