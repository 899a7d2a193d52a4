//! Network-subsystem error type.

use mm_core::EdgeId;
use thiserror::Error;

use crate::vertex::VertexKey;

/// Errors produced by `mm-network`.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("edge {0} not found in network")]
    EdgeNotFound(EdgeId),

    #[error("no edge between {u} and {v}")]
    NoEdgeBetween { u: VertexKey, v: VertexKey },

    #[error("edge {0}: polyline needs at least 2 coordinates")]
    InvalidPolyline(EdgeId),

    #[error("edge {0} already present in network")]
    DuplicateEdge(EdgeId),

    /// The two candidates cannot be connected.  Recoverable: the matcher
    /// treats the transition as absent.
    #[error("no path from edge {from} to edge {to}")]
    NoPath { from: EdgeId, to: EdgeId },
}

/// Shorthand result type for `mm-network`.
pub type NetworkResult<T> = Result<T, NetworkError>;
