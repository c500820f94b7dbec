//! Resource storage for the host session.
//!
//! A session keeps two kinds of resources:
//!
//! | Kind | Trait | Lives | Access |
//! |------|-------|-------|--------|
//! | Global | [`GlobalResource`] | Whole session | Shared borrows only |
//! | Session | any [`Resource`] | Until removed | Shared or exclusive |
//!
//! Globals hold settings and shared services inserted while plugins build.
//! Session resources hold state a plugin mutates from its tick updates, such as
//! the reset engine.

use core::any::{Any, TypeId};
use hashbrown::HashMap;
use parking_lot::{
    MappedRwLockReadGuard, MappedRwLockWriteGuard, RwLock, RwLockReadGuard, RwLockWriteGuard,
};

/// Anything the session can hold: every `Send + Sync + 'static` type.
pub trait Resource: Send + Sync + 'static {}

impl<T: Send + Sync + 'static> Resource for T {}

/// Marker for resources that are set once and then only read.
///
/// # Example
///
/// ```
/// use std::path::PathBuf;
/// use restock_system::resource::GlobalResource;
/// use restock_system::server::Server;
///
/// struct SaveRoot(PathBuf);
/// impl GlobalResource for SaveRoot {}
///
/// let mut server = Server::new();
/// server.insert_global(SaveRoot(PathBuf::from("world")));
/// assert!(server.get_global::<SaveRoot>().is_some());
/// ```
pub trait GlobalResource: Resource {}

/// Why a resource could not be borrowed.
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    /// Nothing of that type was inserted.
    #[error("no resource of type {0}")]
    NotFound(&'static str),

    /// A conflicting borrow is still alive.
    #[error("resource {0} is borrowed")]
    BorrowConflict(&'static str),
}

type Slot = RwLock<Box<dyn Any + Send + Sync>>;

/// Type-keyed resource map.
///
/// Every entry has its own `RwLock`, so borrowing one resource never blocks
/// another. Borrows never wait: a conflicting borrow fails immediately with
/// [`ResourceError::BorrowConflict`].
///
/// # Example
///
/// ```
/// use restock_system::resource::Resources;
///
/// struct PassCount(u32);
///
/// let mut resources = Resources::new();
/// resources.insert(PassCount(0));
///
/// resources.get_mut::<PassCount>().unwrap().0 += 1;
/// assert_eq!(resources.get::<PassCount>().unwrap().0, 1);
/// ```
#[derive(Default)]
pub struct Resources {
    slots: HashMap<TypeId, Slot>,
}

impl Resources {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a resource, returning the one it replaced.
    pub fn insert<T: Resource>(&mut self, resource: T) -> Option<T> {
        let previous = self
            .slots
            .insert(TypeId::of::<T>(), RwLock::new(Box::new(resource)))?;
        unbox(previous)
    }

    /// Returns true if a `T` is stored.
    #[must_use]
    pub fn contains<T: Resource>(&self) -> bool {
        self.slots.contains_key(&TypeId::of::<T>())
    }

    /// Borrows the stored `T`.
    ///
    /// # Errors
    ///
    /// [`ResourceError::NotFound`] if there is none, and
    /// [`ResourceError::BorrowConflict`] while it is borrowed mutably.
    pub fn get<T: Resource>(&self) -> Result<ResourceRef<'_, T>, ResourceError> {
        let name = core::any::type_name::<T>();
        let guard = self
            .slot::<T>()?
            .try_read()
            .ok_or(ResourceError::BorrowConflict(name))?;
        RwLockReadGuard::try_map(guard, |value| value.downcast_ref::<T>())
            .map(|guard| ResourceRef { guard })
            .map_err(|_| ResourceError::NotFound(name))
    }

    /// Borrows the stored `T` mutably.
    ///
    /// # Errors
    ///
    /// [`ResourceError::NotFound`] if there is none, and
    /// [`ResourceError::BorrowConflict`] while any other borrow is alive.
    pub fn get_mut<T: Resource>(&self) -> Result<ResourceRefMut<'_, T>, ResourceError> {
        let name = core::any::type_name::<T>();
        let guard = self
            .slot::<T>()?
            .try_write()
            .ok_or(ResourceError::BorrowConflict(name))?;
        RwLockWriteGuard::try_map(guard, |value| value.downcast_mut::<T>())
            .map(|guard| ResourceRefMut { guard })
            .map_err(|_| ResourceError::NotFound(name))
    }

    /// Takes the stored `T` out of the map.
    pub fn remove<T: Resource>(&mut self) -> Option<T> {
        unbox(self.slots.remove(&TypeId::of::<T>())?)
    }

    /// Number of stored resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn slot<T: Resource>(&self) -> Result<&Slot, ResourceError> {
        self.slots
            .get(&TypeId::of::<T>())
            .ok_or(ResourceError::NotFound(core::any::type_name::<T>()))
    }
}

fn unbox<T: Resource>(slot: Slot) -> Option<T> {
    slot.into_inner().downcast::<T>().ok().map(|value| *value)
}

/// Shared borrow of a resource. Released on drop.
pub struct ResourceRef<'a, T: Resource> {
    guard: MappedRwLockReadGuard<'a, T>,
}

impl<T: Resource> core::ops::Deref for ResourceRef<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.guard
    }
}

/// Exclusive borrow of a resource. Released on drop.
pub struct ResourceRefMut<'a, T: Resource> {
    guard: MappedRwLockWriteGuard<'a, T>,
}

impl<T: Resource> core::ops::Deref for ResourceRefMut<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.guard
    }
}

impl<T: Resource> core::ops::DerefMut for ResourceRefMut<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.guard
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct PassCount(u32);

    #[derive(Debug, PartialEq)]
    struct WorldName(String);

    fn with_passes(n: u32) -> Resources {
        let mut resources = Resources::new();
        resources.insert(PassCount(n));
        resources
    }

    #[test]
    fn stored_value_is_readable() {
        let resources = with_passes(3);
        assert_eq!(*resources.get::<PassCount>().unwrap(), PassCount(3));
    }

    #[test]
    fn insert_hands_back_previous_value() {
        let mut resources = with_passes(1);
        assert_eq!(resources.insert(PassCount(2)), Some(PassCount(1)));
        assert_eq!(resources.get::<PassCount>().unwrap().0, 2);
    }

    #[test]
    fn exclusive_borrow_mutates() {
        let resources = with_passes(0);
        resources.get_mut::<PassCount>().unwrap().0 += 10;
        assert_eq!(resources.get::<PassCount>().unwrap().0, 10);
    }

    #[test]
    fn exclusive_borrow_excludes_everything_else() {
        let resources = with_passes(0);
        let _held = resources.get_mut::<PassCount>().unwrap();

        assert!(matches!(
            resources.get::<PassCount>(),
            Err(ResourceError::BorrowConflict(_))
        ));
        assert!(matches!(
            resources.get_mut::<PassCount>(),
            Err(ResourceError::BorrowConflict(_))
        ));
    }

    #[test]
    fn shared_borrows_overlap() {
        let resources = with_passes(7);
        let a = resources.get::<PassCount>().unwrap();
        let b = resources.get::<PassCount>().unwrap();
        assert_eq!(a.0, b.0);
    }

    #[test]
    fn dropping_a_borrow_releases_it() {
        let resources = with_passes(0);
        {
            let _reading = resources.get::<PassCount>().unwrap();
            assert!(resources.get_mut::<PassCount>().is_err());
        }
        assert!(resources.get_mut::<PassCount>().is_ok());
    }

    #[test]
    fn removed_value_is_gone() {
        let mut resources = with_passes(5);
        assert_eq!(resources.remove::<PassCount>(), Some(PassCount(5)));
        assert!(matches!(
            resources.get::<PassCount>(),
            Err(ResourceError::NotFound(_))
        ));
        assert_eq!(resources.remove::<PassCount>(), None);
    }

    #[test]
    fn entries_are_keyed_by_type() {
        let mut resources = Resources::new();
        assert!(resources.is_empty());

        resources.insert(PassCount(1));
        resources.insert(WorldName("overworld".to_string()));
        assert_eq!(resources.len(), 2);
        assert!(resources.contains::<WorldName>());
        assert!(!resources.contains::<u64>());
    }
}
