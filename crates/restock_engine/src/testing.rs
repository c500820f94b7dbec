//! In-memory host for tests.

use crate::error::ResetError;
use crate::host::{AvailabilityOracle, ResettableResource};
use crate::key::{BlockPos, InstanceId, PartitionId, TemplateRef};
use core::sync::atomic::{AtomicUsize, Ordering};
use hashbrown::{HashMap, HashSet};
use parking_lot::{MappedMutexGuard, Mutex, MutexGuard};

/// A container in the mock world.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockContainer {
    /// Number of item stacks held.
    pub items: u32,
    /// Template bound by the last reset.
    pub template: Option<TemplateRef>,
    /// Seed bound by the last reset.
    pub seed: Option<i64>,
    /// Set once the host was told the container changed.
    pub changed: bool,
    /// Number of resets applied.
    pub resets: u32,
    fail_resets: bool,
    refill: u32,
}

impl MockContainer {
    /// An empty container.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// A container holding `items` stacks.
    #[must_use]
    pub fn with_items(items: u32) -> Self {
        Self {
            items,
            ..Self::default()
        }
    }

    /// Makes every reset of this container fail.
    #[must_use]
    pub fn failing(mut self) -> Self {
        self.fail_resets = true;
        self
    }

    /// Makes resets leave `items` stacks behind, as if regenerated eagerly.
    #[must_use]
    pub fn refilling(mut self, items: u32) -> Self {
        self.refill = items;
        self
    }
}

impl ResettableResource for MockContainer {
    fn is_empty(&self) -> bool {
        self.items == 0
    }

    fn clear_and_bind_template(
        &mut self,
        template: &TemplateRef,
        seed: i64,
    ) -> Result<(), ResetError> {
        if self.fail_resets {
            return Err(ResetError::host("container is locked"));
        }
        self.items = self.refill;
        self.template = Some(template.clone());
        self.seed = Some(seed);
        self.resets += 1;
        Ok(())
    }

    fn mark_changed(&mut self) -> Result<(), ResetError> {
        self.changed = true;
        Ok(())
    }
}

/// Lock-holding handle to a container inside a [`MockWorld`].
pub struct MockHandle<'a>(MappedMutexGuard<'a, MockContainer>);

impl ResettableResource for MockHandle<'_> {
    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn clear_and_bind_template(
        &mut self,
        template: &TemplateRef,
        seed: i64,
    ) -> Result<(), ResetError> {
        self.0.clear_and_bind_template(template, seed)
    }

    fn mark_changed(&mut self) -> Result<(), ResetError> {
        self.0.mark_changed()
    }
}

#[derive(Default)]
struct WorldState {
    partitions: HashSet<PartitionId>,
    inactive_chunks: HashSet<(PartitionId, (i32, i32))>,
    containers: HashMap<(PartitionId, BlockPos), MockContainer>,
    entities: HashMap<(PartitionId, InstanceId), (BlockPos, MockContainer)>,
}

/// Mock world implementing [`AvailabilityOracle`].
///
/// All chunks of an existing partition are active unless deactivated.
#[derive(Default)]
pub struct MockWorld {
    state: Mutex<WorldState>,
    resolve_calls: AtomicUsize,
}

impl MockWorld {
    /// Creates an empty world.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a partition.
    #[must_use]
    pub fn with_partition(self, partition: impl Into<PartitionId>) -> Self {
        self.add_partition(partition);
        self
    }

    /// Adds a partition.
    pub fn add_partition(&self, partition: impl Into<PartitionId>) {
        self.state.lock().partitions.insert(partition.into());
    }

    /// Removes a partition.
    pub fn remove_partition(&self, partition: impl Into<PartitionId>) {
        self.state.lock().partitions.remove(&partition.into());
    }

    /// Loads or unloads the chunk containing `pos`.
    pub fn set_chunk_active(&self, partition: impl Into<PartitionId>, pos: BlockPos, active: bool) {
        let entry = (partition.into(), pos.chunk());
        let mut state = self.state.lock();
        if active {
            state.inactive_chunks.remove(&entry);
        } else {
            state.inactive_chunks.insert(entry);
        }
    }

    /// Places a container.
    pub fn add_container(
        &self,
        partition: impl Into<PartitionId>,
        pos: BlockPos,
        container: MockContainer,
    ) {
        self.state
            .lock()
            .containers
            .insert((partition.into(), pos), container);
    }

    /// Breaks a container.
    pub fn remove_container(&self, partition: impl Into<PartitionId>, pos: BlockPos) {
        self.state
            .lock()
            .containers
            .remove(&(partition.into(), pos));
    }

    /// Returns a copy of the container at `pos`.
    #[must_use]
    pub fn container(&self, partition: impl Into<PartitionId>, pos: BlockPos) -> Option<MockContainer> {
        self.state
            .lock()
            .containers
            .get(&(partition.into(), pos))
            .cloned()
    }

    /// Sets the item count of the container at `pos`.
    pub fn set_items(&self, partition: impl Into<PartitionId>, pos: BlockPos, items: u32) {
        if let Some(container) = self
            .state
            .lock()
            .containers
            .get_mut(&(partition.into(), pos))
        {
            container.items = items;
        }
    }

    /// Spawns an entity carrying a container.
    pub fn add_entity(
        &self,
        partition: impl Into<PartitionId>,
        id: impl Into<InstanceId>,
        pos: BlockPos,
        container: MockContainer,
    ) {
        self.state
            .lock()
            .entities
            .insert((partition.into(), id.into()), (pos, container));
    }

    /// Moves an entity.
    pub fn move_entity(&self, partition: impl Into<PartitionId>, id: impl Into<InstanceId>, pos: BlockPos) {
        if let Some(entry) = self
            .state
            .lock()
            .entities
            .get_mut(&(partition.into(), id.into()))
        {
            entry.0 = pos;
        }
    }

    /// Returns a copy of an entity's container.
    #[must_use]
    pub fn entity(
        &self,
        partition: impl Into<PartitionId>,
        id: impl Into<InstanceId>,
    ) -> Option<MockContainer> {
        self.state
            .lock()
            .entities
            .get(&(partition.into(), id.into()))
            .map(|(_, container)| container.clone())
    }

    /// Number of resolve calls made against this world.
    #[must_use]
    pub fn resolve_calls(&self) -> usize {
        self.resolve_calls.load(Ordering::SeqCst)
    }
}

impl AvailabilityOracle for MockWorld {
    fn partition_exists(&self, partition: &PartitionId) -> bool {
        self.state.lock().partitions.contains(partition)
    }

    fn is_zone_active(&self, partition: &PartitionId, pos: BlockPos) -> bool {
        let state = self.state.lock();
        state.partitions.contains(partition)
            && !state
                .inactive_chunks
                .contains(&(partition.clone(), pos.chunk()))
    }

    fn resolve_resource(
        &self,
        partition: &PartitionId,
        pos: BlockPos,
    ) -> Option<Box<dyn ResettableResource + '_>> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        let key = (partition.clone(), pos);
        let guard = MutexGuard::try_map(self.state.lock(), |state| state.containers.get_mut(&key))
            .ok()?;
        Some(Box::new(MockHandle(guard)))
    }

    fn resolve_instance(
        &self,
        partition: &PartitionId,
        id: &InstanceId,
        hint: BlockPos,
        radius: u32,
    ) -> Option<Box<dyn ResettableResource + '_>> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        let key = (partition.clone(), id.clone());
        let guard = MutexGuard::try_map(self.state.lock(), |state| {
            state
                .entities
                .get_mut(&key)
                .filter(|(pos, _)| hint.within(*pos, radius))
                .map(|(_, container)| container)
        })
        .ok()?;
        Some(Box::new(MockHandle(guard)))
    }
}
