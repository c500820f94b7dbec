//! Identity of trackable resources.
//!
//! A tracked resource is identified by the partition it lives in and an
//! [`Anchor`]: either a fixed block position (stationary containers) or a
//! stable instance id (containers carried by a moving entity).
//!
//! The string form of a [`ResourceKey`] is also the key of the persisted
//! state file:
//!
//! | Anchor | Format |
//! |--------|--------|
//! | Position | `<partition>:<x>,<y>,<z>` |
//! | Instance | `<partition>:entity:<id>` |

use core::fmt;
use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Identifiers
// ─────────────────────────────────────────────────────────────────────────────

/// Identifier of an independently loadable region of the world.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartitionId(String);

impl PartitionId {
    /// Creates a partition id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PartitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PartitionId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Stable opaque identifier of a mobile resource's host entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(String);

impl InstanceId {
    /// Creates an instance id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for InstanceId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Identifier of the content-generation template bound to a resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateRef(String);

impl TemplateRef {
    /// Creates a template reference.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the reference as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TemplateRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TemplateRef {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// BlockPos
// ─────────────────────────────────────────────────────────────────────────────

/// Integer block coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockPos {
    /// East/west coordinate.
    pub x: i32,
    /// Vertical coordinate.
    pub y: i32,
    /// North/south coordinate.
    pub z: i32,
}

impl BlockPos {
    /// Creates a block position.
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Returns the horizontal coordinates of the 16x16 column containing this
    /// position, which is the unit hosts load and unload.
    #[must_use]
    pub const fn chunk(&self) -> (i32, i32) {
        (self.x >> 4, self.z >> 4)
    }

    /// Returns true if `other` lies inside the box of half-width `radius`
    /// centred on this position.
    #[must_use]
    pub fn within(&self, other: BlockPos, radius: u32) -> bool {
        let radius = i64::from(radius);
        (i64::from(self.x) - i64::from(other.x)).abs() <= radius
            && (i64::from(self.y) - i64::from(other.y)).abs() <= radius
            && (i64::from(self.z) - i64::from(other.z)).abs() <= radius
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.x, self.y, self.z)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Anchor / ResourceKey
// ─────────────────────────────────────────────────────────────────────────────

/// The identity half of a resource's location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Anchor {
    /// A container fixed at a block position.
    Position(BlockPos),
    /// A container carried by an entity with a stable id.
    Instance(InstanceId),
}

/// Key identifying a tracked resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceKey {
    partition: PartitionId,
    anchor: Anchor,
}

impl ResourceKey {
    /// Key for a stationary container.
    #[must_use]
    pub fn positional(partition: PartitionId, pos: BlockPos) -> Self {
        Self {
            partition,
            anchor: Anchor::Position(pos),
        }
    }

    /// Key for a mobile container.
    #[must_use]
    pub fn instance(partition: PartitionId, id: InstanceId) -> Self {
        Self {
            partition,
            anchor: Anchor::Instance(id),
        }
    }

    /// Returns the partition.
    #[must_use]
    pub fn partition(&self) -> &PartitionId {
        &self.partition
    }

    /// Returns the anchor.
    #[must_use]
    pub fn anchor(&self) -> &Anchor {
        &self.anchor
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.anchor {
            Anchor::Position(pos) => write!(f, "{}:{}", self.partition, pos),
            Anchor::Instance(id) => write!(f, "{}:entity:{}", self.partition, id),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Locator
// ─────────────────────────────────────────────────────────────────────────────

/// Where to find a tracked resource on the next pass.
///
/// Mobile resources keep the position they were last seen at; the reconciler
/// searches a bounded box around it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    /// Fixed block position.
    Positional(BlockPos),
    /// Entity-carried container.
    Instance {
        /// Stable entity id.
        id: InstanceId,
        /// Last position the entity was observed at.
        last_known: BlockPos,
    },
}

impl Locator {
    /// The position used for zone-activity checks.
    #[must_use]
    pub fn position(&self) -> BlockPos {
        match self {
            Self::Positional(pos) => *pos,
            Self::Instance { last_known, .. } => *last_known,
        }
    }

    /// The identity part of this locator.
    #[must_use]
    pub fn anchor(&self) -> Anchor {
        match self {
            Self::Positional(pos) => Anchor::Position(*pos),
            Self::Instance { id, .. } => Anchor::Instance(id.clone()),
        }
    }

    /// Builds the registry key for this locator within `partition`.
    #[must_use]
    pub fn key(&self, partition: &PartitionId) -> ResourceKey {
        ResourceKey {
            partition: partition.clone(),
            anchor: self.anchor(),
        }
    }
}
