//! Seams to the host simulation.
//!
//! The engine never touches the world directly. It asks an
//! [`AvailabilityOracle`] what is loaded and where resources are, and hands
//! eligible resources to a [`ResetInvoker`].

use crate::error::ResetError;
use crate::key::{BlockPos, InstanceId, PartitionId, TemplateRef};

/// A live, content-bearing resource the host resolved for this pass.
pub trait ResettableResource {
    /// Returns true if the resource holds no items.
    fn is_empty(&self) -> bool;

    /// Removes all items and binds `template` with `seed` so that content is
    /// regenerated the next time the resource is opened.
    fn clear_and_bind_template(&mut self, template: &TemplateRef, seed: i64)
    -> Result<(), ResetError>;

    /// Notifies the host that the resource changed and must be saved.
    fn mark_changed(&mut self) -> Result<(), ResetError>;
}

/// Read-only view of what the host currently has loaded.
pub trait AvailabilityOracle: Send + Sync + 'static {
    /// Returns true if the partition still exists.
    fn partition_exists(&self, partition: &PartitionId) -> bool;

    /// Returns true if the zone containing `pos` is loaded and ticking.
    fn is_zone_active(&self, partition: &PartitionId, pos: BlockPos) -> bool;

    /// Resolves the resettable resource at a fixed position.
    fn resolve_resource(
        &self,
        partition: &PartitionId,
        pos: BlockPos,
    ) -> Option<Box<dyn ResettableResource + '_>>;

    /// Resolves a mobile resource by instance id, looking within `radius`
    /// blocks of `hint`.
    fn resolve_instance(
        &self,
        partition: &PartitionId,
        id: &InstanceId,
        hint: BlockPos,
        radius: u32,
    ) -> Option<Box<dyn ResettableResource + '_>>;
}

/// Performs the reset of an eligible resource.
pub trait ResetInvoker: Send + Sync + 'static {
    /// Clears and regenerates `resource` from `template` with `seed`.
    fn reset(
        &self,
        resource: &mut dyn ResettableResource,
        template: &TemplateRef,
        seed: i64,
    ) -> Result<(), ResetError>;
}

/// Default invoker: clear, rebind the template, then mark changed.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegenerateInvoker;

impl ResetInvoker for RegenerateInvoker {
    fn reset(
        &self,
        resource: &mut dyn ResettableResource,
        template: &TemplateRef,
        seed: i64,
    ) -> Result<(), ResetError> {
        resource.clear_and_bind_template(template, seed)?;
        resource.mark_changed()
    }
}
