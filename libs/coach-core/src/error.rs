use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced by the analysis functions.
///
/// All analysis errors are returned as results, never raised through side
/// effects; callers decide how to react.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AnalysisError {
    /// A lap needs at least two frames to be analyzable.
    #[error("lap has {frames} frames, at least 2 required")]
    InsufficientData { frames: usize },

    /// A frame carried a non-finite numeric field.
    #[error("non-finite value in frame field `{field}`")]
    InvalidFrame { field: &'static str },

    /// A demarcation lap does not cover enough of the track to build a
    /// boundary from.
    #[error("invalid boundary input: {0}")]
    InvalidBoundaryInput(String),

    /// Serialized boundary data failed structural validation.
    #[error("malformed boundary data: {0}")]
    MalformedBoundary(String),

    /// Lookup miss for a lap id.
    #[error("lap {0} not found")]
    LapNotFound(Uuid),

    /// Lookup miss for a session id.
    #[error("session {0} not found")]
    SessionNotFound(Uuid),
}
