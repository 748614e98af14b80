use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

use forma_scene::Bounds;

use super::Feedback;

/// Where an active feedback instance is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackParent {
    World,
    Stage,
}

/// Typed handle to a feedback instance owned by the [`FeedbackManager`].
pub struct FeedbackId<T> {
    index: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for FeedbackId<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for FeedbackId<T> {}

impl<T> PartialEq for FeedbackId<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T> fmt::Debug for FeedbackId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FeedbackId({})", self.index)
    }
}

struct Slot {
    instance: Box<dyn Feedback>,
    /// `None` while pooled.
    parent: Option<FeedbackParent>,
}

/// Pool of feedback instances. Each registered kind is cloned from its
/// original when no pooled instance is free. An instance is either pooled
/// or active under exactly one parent.
#[derive(Default)]
pub struct FeedbackManager {
    originals: HashMap<TypeId, Box<dyn Feedback>>,
    slots: Vec<Slot>,
    keyed: HashMap<(TypeId, String), usize>,
    scene_bounds: Bounds,
}

impl FeedbackManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the instance new feedback of type `T` is cloned from.
    pub fn register_original<T: Feedback>(&mut self, original: T) {
        self.originals.insert(TypeId::of::<T>(), Box::new(original));
    }

    /// Registers the linear, angular and tooltip feedback.
    pub fn with_builtin_feedback() -> Self {
        let mut manager = Self::new();
        manager.register_original(super::LinearFeedback::default());
        manager.register_original(super::AngularFeedback::default());
        manager.register_original(super::TooltipFeedback::default());
        manager
    }

    /// Bounds passed to feedback on activation.
    pub fn set_scene_bounds(&mut self, bounds: Bounds) {
        self.scene_bounds = bounds;
    }

    pub fn activate<T: Feedback>(&mut self) -> FeedbackId<T> {
        let type_id = TypeId::of::<T>();
        let free = self
            .slots
            .iter()
            .position(|slot| slot.parent.is_none() && slot.instance.as_any().is::<T>());
        let index = match free {
            Some(index) => index,
            None => {
                let Some(original) = self.originals.get(&type_id) else {
                    panic!("no feedback original registered for {}", std::any::type_name::<T>());
                };
                self.slots.push(Slot {
                    instance: original.clone_feedback(),
                    parent: None,
                });
                self.slots.len() - 1
            }
        };
        let slot = &mut self.slots[index];
        slot.parent = Some(if slot.instance.is_in_world_coordinates() {
            FeedbackParent::World
        } else {
            FeedbackParent::Stage
        });
        slot.instance.activate(&self.scene_bounds);
        tracing::trace!("activated {} feedback", slot.instance.type_name());
        FeedbackId {
            index,
            _marker: PhantomData,
        }
    }

    /// Activates an instance that can later be found by `key`.
    pub fn activate_with_key<T: Feedback>(&mut self, key: &str) -> FeedbackId<T> {
        let map_key = (TypeId::of::<T>(), key.to_string());
        assert!(
            !self.keyed.contains_key(&map_key),
            "feedback key {key:?} is already active"
        );
        let id = self.activate::<T>();
        self.keyed.insert(map_key, id.index);
        id
    }

    pub fn deactivate<T: Feedback>(&mut self, id: FeedbackId<T>) {
        let slot = &mut self.slots[id.index];
        assert!(slot.parent.is_some(), "deactivating inactive feedback");
        slot.instance.deactivate();
        slot.parent = None;
        self.keyed.retain(|_, index| *index != id.index);
    }

    pub fn deactivate_with_key<T: Feedback>(&mut self, key: &str) {
        let Some(index) = self.keyed.remove(&(TypeId::of::<T>(), key.to_string())) else {
            panic!("no active feedback with key {key:?}");
        };
        self.deactivate(FeedbackId::<T> {
            index,
            _marker: PhantomData,
        });
    }

    pub fn find_with_key<T: Feedback>(&self, key: &str) -> Option<FeedbackId<T>> {
        self.keyed
            .get(&(TypeId::of::<T>(), key.to_string()))
            .map(|&index| FeedbackId {
                index,
                _marker: PhantomData,
            })
    }

    pub fn get<T: Feedback>(&self, id: FeedbackId<T>) -> &T {
        match self.slots[id.index].instance.as_any().downcast_ref::<T>() {
            Some(feedback) => feedback,
            None => panic!("feedback handle of the wrong type"),
        }
    }

    pub fn get_mut<T: Feedback>(&mut self, id: FeedbackId<T>) -> &mut T {
        match self.slots[id.index].instance.as_any_mut().downcast_mut::<T>() {
            Some(feedback) => feedback,
            None => panic!("feedback handle of the wrong type"),
        }
    }

    pub fn parent<T: Feedback>(&self, id: FeedbackId<T>) -> Option<FeedbackParent> {
        self.slots[id.index].parent
    }

    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.parent.is_some()).count()
    }

    pub fn pooled_count(&self) -> usize {
        self.slots.len() - self.active_count()
    }
}
