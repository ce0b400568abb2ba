use thiserror::Error;

/// Top-level error type for the angle measurement library.
#[derive(Debug, Error)]
pub enum AngleKitError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Errors related to geometric computations.
#[derive(Debug, Error, PartialEq)]
pub enum GeometryError {
    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("zero-length vector")]
    ZeroVector,
}

/// Errors raised while validating or loading host configuration.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("parameter {parameter} = {value} is out of range [{min}, {max}]")]
    OutOfRange {
        parameter: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("invalid configuration json: {0}")]
    InvalidJson(String),
}

/// Errors related to the measurement session state machine.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    /// The surface the tool measures on was not supplied by the host.
    #[error("no measurement target surface was supplied")]
    MissingTarget,

    #[error("marker capacity reached")]
    MarkerCapacity,

    #[error("marker {0} is not being dragged")]
    NotDragging(usize),

    #[error("marker index {0} is out of bounds")]
    InvalidMarker(usize),
}

/// Non-fatal conditions reported to the host once per frame.
///
/// None of these stop the session; the host decides whether to log or
/// surface them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Diagnostic {
    /// The probe ray found no target surface within range.
    MissedRaycast,
    /// The angle at this vertex is undefined; its arc and label are suppressed.
    DegenerateAngle { vertex: usize },
    /// Vertex snapping was requested but the surface exposes no mesh data.
    MissingSnapTarget,
    /// A marker was destroyed externally or lost its normal; the session was reset.
    CorruptedSession,
}

/// Convenience type alias for results using [`AngleKitError`].
pub type Result<T> = std::result::Result<T, AngleKitError>;
