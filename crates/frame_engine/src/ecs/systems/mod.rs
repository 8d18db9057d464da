//! Default systems
//!
//! The physics and render bridges are the only systems the scheduler always
//! carries. Both follow the same pattern: listeners queue component changes
//! as they happen, and the bridge replays them against its collaborator at
//! the start of its own update. A collaborator therefore only ever sees
//! changes from inside the frame loop, in the order they occurred.

pub mod physics_bridge;
pub mod render_bridge;

pub use physics_bridge::PhysicsBridge;
pub use render_bridge::RenderBridge;

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Value;

use super::{ComponentId, ComponentKind, EntityId, SystemResult, World};
use crate::events::{names, Event, EventArg, EventBus, ListenerResult, Subscription};
use crate::physics::BodyIndex;

/// Collaborator view used by [`ChangeFeed::apply`]
pub(crate) trait Mirror {
    fn attach(&mut self, entity: &EntityId, component: ComponentId, value: &Value) -> SystemResult;
    fn detach(&mut self, entity: &EntityId, component: ComponentId);
    fn reset(&mut self);
}

#[derive(Debug)]
enum Change {
    Attach {
        entity: EntityId,
        component: ComponentId,
        value: Value,
    },
    Detach(ComponentId),
    Flush,
    Resync,
}

/// Queue of component changes for one [`ComponentKind`]
///
/// Tracks which instances the collaborator currently holds, so it is never
/// asked to attach twice or to detach something it never had.
#[derive(Debug)]
pub(crate) struct ChangeFeed {
    kind: ComponentKind,
    queue: Rc<RefCell<Vec<Change>>>,
    synced: BodyIndex<ComponentId>,
    subscriptions: Vec<Subscription>,
}

impl ChangeFeed {
    pub(crate) fn new(kind: ComponentKind) -> Self {
        Self {
            kind,
            queue: Rc::new(RefCell::new(Vec::new())),
            synced: BodyIndex::new(),
            subscriptions: Vec::new(),
        }
    }

    /// Instances the collaborator holds
    pub(crate) fn synced(&self) -> usize {
        self.synced.len()
    }

    pub(crate) fn subscribe(&mut self, bus: &EventBus) {
        if !self.subscriptions.is_empty() {
            return;
        }
        if let Some(added) = self.kind.added_event() {
            self.listen(bus, added, |event| {
                let (Some(entity), Some(component)) = (event.entity(), event.component()) else {
                    return None;
                };
                let value = event.args.iter().find_map(EventArg::as_data).cloned();
                Some(Change::Attach {
                    entity: entity.clone(),
                    component,
                    value: value.unwrap_or(Value::Null),
                })
            });
        }
        // Covers the derived removal and the bulk teardown path alike.
        self.listen(bus, names::COMPONENT_REMOVED, |event| event.component().map(Change::Detach));
        self.listen(bus, names::SCENE_FLUSH, |_| Some(Change::Flush));
        self.listen(bus, names::SCENE_LOADED, |_| Some(Change::Resync));
    }

    /// Queue a full resync, e.g. for components that predate the subscription
    pub(crate) fn resync(&self) {
        self.queue.borrow_mut().push(Change::Resync);
    }

    fn listen<F>(&mut self, bus: &EventBus, event: &str, to_change: F)
    where
        F: Fn(&Event) -> Option<Change> + 'static,
    {
        let queue = Rc::clone(&self.queue);
        let subscription = bus.on(event, move |event: &Event| -> ListenerResult {
            let change = to_change(event)
                .ok_or_else(|| format!("malformed '{}' event: {:?}", event.name, event.args))?;
            queue.borrow_mut().push(change);
            Ok(())
        });
        self.subscriptions.push(subscription);
    }

    pub(crate) fn unsubscribe(&mut self, bus: &EventBus) {
        for subscription in self.subscriptions.drain(..) {
            bus.unsubscribe(&subscription);
        }
        self.queue.borrow_mut().clear();
    }

    /// Replay queued changes against a collaborator
    ///
    /// A failing change is dropped and the error returned; changes queued
    /// after it are kept for the next call.
    pub(crate) fn apply<M>(&mut self, world: &World, mirror: &mut M) -> SystemResult
    where
        M: Mirror + ?Sized,
    {
        let mut changes = std::mem::take(&mut *self.queue.borrow_mut()).into_iter();
        while let Some(change) = changes.next() {
            if let Err(e) = self.apply_one(change, world, mirror) {
                self.queue.borrow_mut().splice(0..0, changes);
                return Err(e);
            }
        }
        Ok(())
    }

    fn apply_one<M>(&mut self, change: Change, world: &World, mirror: &mut M) -> SystemResult
    where
        M: Mirror + ?Sized,
    {
        match change {
            Change::Attach {
                entity,
                component,
                value,
            } => {
                if !self.synced.contains(component) && world.component(component).is_some() {
                    mirror.attach(&entity, component, &value)?;
                    self.synced.insert(component, entity);
                }
            }
            Change::Detach(component) => {
                if let Some(entity) = self.synced.remove(component) {
                    mirror.detach(&entity, component);
                }
            }
            Change::Flush => {
                mirror.reset();
                self.synced.clear();
            }
            Change::Resync => {
                for (entity, instance) in world.store().components_of_kind(self.kind) {
                    if !self.synced.contains(instance.id) {
                        mirror.attach(&entity, instance.id, &instance.value)?;
                        self.synced.insert(instance.id, entity);
                    }
                }
            }
        }
        Ok(())
    }
}
