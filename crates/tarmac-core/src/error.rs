//! Error types shared across the workspace.

use thiserror::Error;

use crate::resource::ResourceKind;

/// Largest capacity a single resource may be configured with.
pub const MAX_CAPACITY: u32 = 1 << 16;

/// Fatal failure constructing the resource pool.
///
/// Nothing is recoverable: a run with an unusable pool must not start.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PoolError {
    /// A resource was configured with zero units; nothing could ever
    /// acquire it.
    #[error("{kind} capacity must be at least 1")]
    ZeroCapacity {
        /// The offending resource.
        kind: ResourceKind,
    },
    /// A resource was configured beyond [`MAX_CAPACITY`].
    #[error("{kind} capacity {requested} exceeds maximum of {max}", max = MAX_CAPACITY)]
    CapacityTooLarge {
        /// The offending resource.
        kind: ResourceKind,
        /// The configured value.
        requested: u32,
    },
}
