//! Host interaction events.
//!
//! The host reports a player opening a container through one of two shapes:
//! a block container at a fixed position, or a container carried by an entity.
//! Both reduce to an [`InteractionSnapshot`].

use crate::key::{BlockPos, InstanceId, Locator, PartitionId, TemplateRef};
use crate::state::InteractionSnapshot;

/// Kind of stationary container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ContainerClass {
    /// Chest-like containers, always tracked.
    #[default]
    Primary,
    /// Barrel-like containers, tracked only when enabled in settings.
    Secondary,
}

/// A player opened a stationary container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerInteraction {
    /// Partition the container lives in.
    pub partition: PartitionId,
    /// Block position of the container.
    pub pos: BlockPos,
    /// Container kind.
    pub class: ContainerClass,
    /// Bound template, if any.
    pub template: Option<TemplateRef>,
    /// Bound seed.
    pub seed: i64,
    /// Whether the container held no items.
    pub empty: bool,
}

impl ContainerInteraction {
    /// Creates a primary-class interaction.
    pub fn new(partition: impl Into<PartitionId>, pos: BlockPos) -> Self {
        Self {
            partition: partition.into(),
            pos,
            class: ContainerClass::Primary,
            template: None,
            seed: 0,
            empty: false,
        }
    }

    /// Sets the container class.
    #[must_use]
    pub fn with_class(mut self, class: ContainerClass) -> Self {
        self.class = class;
        self
    }

    /// Sets the bound template and seed.
    #[must_use]
    pub fn with_template(mut self, template: impl Into<TemplateRef>, seed: i64) -> Self {
        self.template = Some(template.into());
        self.seed = seed;
        self
    }

    /// Sets the observed emptiness.
    #[must_use]
    pub fn with_empty(mut self, empty: bool) -> Self {
        self.empty = empty;
        self
    }
}

impl From<ContainerInteraction> for InteractionSnapshot {
    fn from(event: ContainerInteraction) -> Self {
        Self {
            partition: event.partition,
            locator: Locator::Positional(event.pos),
            template: event.template,
            seed: event.seed,
            empty: event.empty,
        }
    }
}

/// A player opened a container carried by an entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityInteraction {
    /// Partition the entity is in.
    pub partition: PartitionId,
    /// Stable entity id.
    pub id: InstanceId,
    /// Block position of the entity when opened.
    pub pos: BlockPos,
    /// Bound template, if any.
    pub template: Option<TemplateRef>,
    /// Bound seed.
    pub seed: i64,
    /// Whether the container held no items.
    pub empty: bool,
}

impl EntityInteraction {
    /// Creates an entity interaction.
    pub fn new(partition: impl Into<PartitionId>, id: impl Into<InstanceId>, pos: BlockPos) -> Self {
        Self {
            partition: partition.into(),
            id: id.into(),
            pos,
            template: None,
            seed: 0,
            empty: false,
        }
    }

    /// Sets the bound template and seed.
    #[must_use]
    pub fn with_template(mut self, template: impl Into<TemplateRef>, seed: i64) -> Self {
        self.template = Some(template.into());
        self.seed = seed;
        self
    }

    /// Sets the observed emptiness.
    #[must_use]
    pub fn with_empty(mut self, empty: bool) -> Self {
        self.empty = empty;
        self
    }
}

impl From<EntityInteraction> for InteractionSnapshot {
    fn from(event: EntityInteraction) -> Self {
        Self {
            partition: event.partition,
            locator: Locator::Instance {
                id: event.id,
                last_known: event.pos,
            },
            template: event.template,
            seed: event.seed,
            empty: event.empty,
        }
    }
}
