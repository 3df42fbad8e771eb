//! Error types for terrain compilation and visibility queries.

use crate::terrain::{CrossoverId, SectorId};
use thiserror::Error;

/// Errors raised while compiling sector geometry or propagating visibility.
///
/// Every variant is `Clone` so a failed cache entry can be handed to every
/// caller that asks for the same key.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TerrainError {
    /// A crossover's eroded endpoint located inside a hole of the punched
    /// land tree. The sector's static metadata or portal placement is
    /// inconsistent; compilation of the snapshot is aborted.
    #[error("crossover {crossover:?} of sector {sector:?} lies in a hole")]
    CrossoverInHole {
        /// Sector whose punched land was being labeled.
        sector: SectorId,
        /// Logical crossover that resolved into a hole.
        crossover: CrossoverId,
    },

    /// Dilation radii must be finite and non-negative.
    #[error("invalid dilation radius {0}")]
    InvalidRadius(f64),

    /// The polygon algebra backend rejected its input.
    #[error("polygon algebra failed: {0}")]
    PolygonAlgebra(String),

    /// The triangulator rejected a land polygon.
    #[error("triangulation failed: {0}")]
    Triangulation(String),

    /// A sector's world transform has no inverse.
    #[error("world transform of sector {0:?} is not invertible")]
    NonInvertibleTransform(SectorId),

    /// A sector id does not belong to the snapshot.
    #[error("unknown sector {0:?}")]
    UnknownSector(SectorId),

    /// A portal was declared with a sector on both ends.
    #[error("portal connects sector {0:?} to itself")]
    SelfPortal(SectorId),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TerrainError>;
