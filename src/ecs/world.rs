//! World wrapper around hecs
//!
//! Besides plain storage access this exposes the registry operations the
//! navigation core depends on: get-or-create, validity checks and name lookup.

use hecs::Entity;

use super::components::{Name, Transform};

/// Simulation world containing all entities and components
pub struct World {
    /// The underlying hecs world
    pub inner: hecs::World,
}

impl World {
    /// Create a new empty world
    pub fn new() -> Self {
        Self {
            inner: hecs::World::new(),
        }
    }

    /// Spawn an entity with the given components
    pub fn spawn(&mut self, components: impl hecs::DynamicBundle) -> Entity {
        self.inner.spawn(components)
    }

    /// Despawn an entity
    pub fn despawn(&mut self, entity: Entity) -> Result<(), hecs::NoSuchEntity> {
        self.inner.despawn(entity)
    }

    /// Get a reference to a component
    pub fn get<T: hecs::Component>(
        &self,
        entity: Entity,
    ) -> Result<hecs::Ref<'_, T>, hecs::ComponentError> {
        self.inner.get::<&T>(entity)
    }

    /// Get a mutable reference to a component
    pub fn get_mut<T: hecs::Component>(
        &mut self,
        entity: Entity,
    ) -> Result<hecs::RefMut<'_, T>, hecs::ComponentError> {
        self.inner.get::<&mut T>(entity)
    }

    /// Check whether an entity has a component
    pub fn has<T: hecs::Component>(&self, entity: Entity) -> bool {
        self.inner
            .entity(entity)
            .map(|e| e.has::<T>())
            .unwrap_or(false)
    }

    /// Insert `value` unless the entity already has a `T`.
    ///
    /// Returns `false` when the entity does not exist.
    pub fn get_or_insert_with<T: hecs::Component>(
        &mut self,
        entity: Entity,
        make: impl FnOnce() -> T,
    ) -> bool {
        if !self.inner.contains(entity) {
            return false;
        }
        if !self.has::<T>(entity) {
            return self.inner.insert_one(entity, make()).is_ok();
        }
        true
    }

    /// Check if an entity exists
    pub fn contains(&self, entity: Entity) -> bool {
        self.inner.contains(entity)
    }

    /// A back-reference is usable when it points at a live entity with a transform
    pub fn is_valid_target(&self, entity: Option<Entity>) -> bool {
        entity.is_some_and(|e| self.has::<Transform>(e))
    }

    /// World position of an entity, if it is alive and has a transform
    pub fn position_of(&self, entity: Entity) -> Option<glam::Vec3> {
        self.get::<Transform>(entity).ok().map(|t| t.position)
    }

    /// First entity whose [`Name`] matches
    pub fn find_by_name(&self, name: &str) -> Option<Entity> {
        if name.is_empty() {
            return None;
        }
        self.inner
            .query::<&Name>()
            .iter()
            .find(|(_, n)| n.as_str() == name)
            .map(|(entity, _)| entity)
    }

    /// Get the number of entities
    pub fn len(&self) -> u32 {
        self.inner.len()
    }

    /// Check if the world is empty
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Clear all entities from the world
    pub fn clear(&mut self) {
        self.inner.clear();
    }

    /// Query for entities with specific components
    pub fn query<Q: hecs::Query>(&self) -> hecs::QueryBorrow<'_, Q> {
        self.inner.query::<Q>()
    }

    /// Query for entities with specific components (mutable)
    pub fn query_mut<Q: hecs::Query>(&mut self) -> hecs::QueryMut<'_, Q> {
        self.inner.query_mut::<Q>()
    }

    /// Collect the entities that currently have a `T`
    pub fn entities_with<T: hecs::Component>(&self) -> Vec<Entity> {
        self.inner
            .query::<&T>()
            .iter()
            .map(|(entity, _)| entity)
            .collect()
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("entities", &self.inner.len())
            .finish()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_find_by_name() {
        let mut world = World::new();
        let _other = world.spawn((Name::new("Crate"),));
        let player = world.spawn((Name::new("Player"), Transform::default()));

        assert_eq!(world.find_by_name("Player"), Some(player));
        assert_eq!(world.find_by_name("Nobody"), None);
        assert_eq!(world.find_by_name(""), None);
    }

    #[test]
    fn test_valid_target_requires_transform() {
        let mut world = World::new();
        let bare = world.spawn((Name::new("Ghost"),));
        let placed = world.spawn((Transform::from_position(Vec3::X),));

        assert!(!world.is_valid_target(None));
        assert!(!world.is_valid_target(Some(bare)));
        assert!(world.is_valid_target(Some(placed)));

        world.despawn(placed).unwrap();
        assert!(!world.is_valid_target(Some(placed)));
        assert_eq!(world.position_of(placed), None);
    }

    #[test]
    fn test_get_or_insert_keeps_existing() {
        let mut world = World::new();
        let entity = world.spawn((Transform::from_position(Vec3::ONE),));

        assert!(world.get_or_insert_with(entity, Transform::default));
        assert_eq!(world.position_of(entity), Some(Vec3::ONE));

        world.despawn(entity).unwrap();
        assert!(!world.get_or_insert_with(entity, Transform::default));
    }
}
