//! Error types for the scene protocol and the geometry kernel.

use thiserror::Error;

use crate::geometry::Topology;

/// Failures while negotiating or decoding the scene stream.
///
/// Every variant is fatal to the session: the protocol carries no
/// resynchronization marker, so a caller that sees one of these must drop
/// the connection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// The width indicator did not map to 1, 2, 4 or 8 bytes.
    #[error("unsupported coordinate width: indicator {indicator} does not give 1, 2, 4 or 8 bytes")]
    UnsupportedWidth {
        /// Raw indicator byte (bits per coordinate) as received.
        indicator: u8,
    },

    /// Fewer bytes were available than the field requires.
    #[error("short read: expected {expected} bytes, got {actual}")]
    ShortRead { expected: usize, actual: usize },

    /// The transport ended before the first byte of a field arrived.
    #[error("transport closed")]
    TransportClosed,

    /// A decoded coordinate lies outside its world bound.
    #[error("coordinate out of range on axis {axis}: {value} > {bound}")]
    CoordinateOutOfRange { axis: char, value: u64, bound: u64 },

    /// The declared point count exceeds the configured cap.
    #[error("declared point count {count} exceeds limit {limit}")]
    TooManyPoints { count: u32, limit: u32 },

    /// A frame was requested before the handshake completed.
    #[error("session has not negotiated a coordinate width yet")]
    NotNegotiated,

    /// A frame was requested after the game-over sentinel.
    #[error("session already ended with score {score}")]
    SessionEnded { score: u32 },

    /// An earlier error already ended the session.
    #[error("session failed on an earlier protocol error")]
    SessionFailed,

    /// Any other transport failure.
    #[error("transport error: {0}")]
    Io(String),
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Recoverable geometry conditions. Public query APIs fold these into
/// "no effect" results; the checked variants surface them.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryError {
    #[error("{topology:?} needs at least {required} points, got {actual}")]
    DegenerateShape {
        topology: Topology,
        required: usize,
        actual: usize,
    },

    #[error("ray is parallel to the triangle plane")]
    SingularRay,

    #[error("{0:?} cannot be triangulated")]
    UnsupportedTopology(Topology),
}

impl From<std::io::Error> for ProtocolError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::UnexpectedEof
            | std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::BrokenPipe => ProtocolError::TransportClosed,
            _ => ProtocolError::Io(err.to_string()),
        }
    }
}
