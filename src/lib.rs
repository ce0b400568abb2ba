//! Angle measurement on 3D surfaces.
//!
//! Place up to three markers on a surface by ray casting, then get the
//! angle at one vertex (or all three), a filled arc mesh per angle and a
//! billboarded label placement, recomputed every frame. Rendering, physics
//! and input stay with the host behind [`surface::SurfaceQuery`],
//! [`session::MarkerHost`] and [`session::VisualSink`].

pub mod angle;
pub mod config;
pub mod error;
pub mod math;
pub mod session;
pub mod surface;
pub mod tessellation;

pub use config::{AngleMode, AngleToolConfig};
pub use error::{AngleKitError, Diagnostic, Result};
pub use session::{AngleSession, FrameInput, MeasurementFrame, PointerPhase, TickOutput};
