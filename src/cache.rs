use slotmap::SecondaryMap;

use crate::error::CacheError;
use crate::model::ItemId;
use crate::tessellation::Mesh;

/// Completed meshes keyed by solid identity.
///
/// Holds at most one mesh per solid. Meshes live as long as the cache,
/// which is owned by the run that owns the document.
#[derive(Debug, Default)]
pub struct MeshCache {
    meshes: SecondaryMap<ItemId, Mesh>,
}

impl MeshCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached mesh for `item`, if any.
    #[must_use]
    pub fn find(&self, item: ItemId) -> Option<&Mesh> {
        self.meshes.get(item)
    }

    #[must_use]
    pub fn contains(&self, item: ItemId) -> bool {
        self.meshes.contains_key(item)
    }

    /// Takes ownership of `mesh` as the mesh of `item`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::AlreadyCached`] if `item` already has a mesh;
    /// the existing entry is kept.
    pub fn add(&mut self, item: ItemId, mesh: Mesh) -> Result<(), CacheError> {
        if self.meshes.contains_key(item) {
            return Err(CacheError::AlreadyCached(mesh.solid_id()));
        }
        self.meshes.insert(item, mesh);
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ItemId, &Mesh)> {
        self.meshes.iter()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::EntityId;
    use crate::test_support;

    #[test]
    fn second_add_for_the_same_solid_fails() {
        let fx = test_support::two_instance_assembly();
        let mut cache = MeshCache::new();
        let first = Mesh::new(fx.solid, EntityId::from_raw(30), fx.part_shape);
        let second = Mesh::new(fx.solid, EntityId::from_raw(30), fx.asm_shape);

        cache.add(fx.solid, first).unwrap();
        let err = cache.add(fx.solid, second).unwrap_err();
        assert!(matches!(err, CacheError::AlreadyCached(id) if id == EntityId::from_raw(30)));

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.find(fx.solid).unwrap().shape(), fx.part_shape);
    }

    #[test]
    fn lookup_of_unknown_solid_is_empty() {
        let fx = test_support::two_instance_assembly();
        let cache = MeshCache::new();
        assert!(cache.find(fx.solid).is_none());
        assert!(!cache.contains(fx.curve));
        assert!(cache.is_empty());
    }
}
