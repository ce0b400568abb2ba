//! The frame-driven measurement session.
//!
//! A session owns the markers and is the only place they are mutated. The
//! host calls [`AngleSession::tick`] once per frame with the pointer state;
//! once three markers exist every angle, arc and label is rebuilt from
//! scratch on each tick.

pub mod host;
pub mod markers;

pub use host::{MarkerHost, VisualSink};
pub use markers::{DragRelease, MarkerHandle, MarkerPoint, PointMarkerSet, MARKER_CAPACITY};

use std::fmt::Debug;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use crate::angle::{centroid, compute_vertex, AngleResult, LabelPlacement, LabelPlacer, PLACEHOLDER};
use crate::config::{AngleMode, AngleToolConfig};
use crate::error::{Diagnostic, Result, SessionError};
use crate::math::intersect_3d::ray_sphere_intersect;
use crate::math::{Point3, Ray};
use crate::surface::{RayHit, SurfaceProbe, SurfaceQuery, SurfaceSample};
use crate::tessellation::{ArcFan, MarkerLine, Polyline, TriangleMesh};

/// Pointer button state for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerPhase {
    #[default]
    Idle,
    /// Went down this frame.
    Pressed,
    /// Still down.
    Held,
    /// Went up this frame.
    Released,
}

/// Everything the session reads from the host in one frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameInput {
    pub pointer: PointerPhase,
    /// Ray through the pointer, if the pointer is over the viewport.
    pub ray: Option<Ray>,
    /// Camera position that labels turn to face.
    pub viewpoint: Point3,
}

impl FrameInput {
    #[must_use]
    pub fn new(pointer: PointerPhase, ray: Option<Ray>, viewpoint: Point3) -> Self {
        Self {
            pointer,
            ray,
            viewpoint,
        }
    }
}

/// Coarse session progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Empty,
    /// One or two markers placed.
    Placing(usize),
    /// Three markers placed; angles are live.
    Complete,
}

/// Visuals for one measured vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct AngleVisual {
    pub vertex_index: usize,
    /// `None` when the angle is degenerate.
    pub angle: Option<AngleResult>,
    /// Empty when the angle is degenerate or the arc too small.
    pub arc: TriangleMesh,
    pub label: LabelPlacement,
}

/// Derived visuals for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementFrame {
    pub polyline: Polyline,
    pub angles: Vec<AngleVisual>,
    /// Summary text; [`PLACEHOLDER`] until the measurement is complete.
    pub readout: String,
}

impl MeasurementFrame {
    #[must_use]
    pub fn placeholder(polyline: Polyline) -> Self {
        Self {
            polyline,
            angles: Vec::new(),
            readout: PLACEHOLDER.to_owned(),
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.angles.is_empty()
    }
}

/// Result of one [`AngleSession::tick`].
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutput {
    pub frame: MeasurementFrame,
    pub diagnostics: Vec<Diagnostic>,
}

/// Serializable record of a measurement, for export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementSnapshot {
    pub mode: AngleMode,
    pub markers: Vec<SurfaceSample>,
    /// Angle per measured vertex; `None` for degenerate ones.
    pub angles_degrees: Vec<(usize, Option<f64>)>,
}

/// Interactive angle measurement on one target surface.
#[derive(Debug)]
pub struct AngleSession<C> {
    config: AngleToolConfig,
    mode: AngleMode,
    target: C,
    markers: PointMarkerSet,
    active: bool,
    last_drag_hit: Option<RayHit<C>>,
}

impl<C: Copy + Eq + Debug> AngleSession<C> {
    /// Creates an inactive session measuring on `target`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::MissingTarget`] when the host has no target
    /// surface, [`SessionError::InvalidMarker`] when `mode` names a vertex
    /// outside `0..3`, or a config error if `config` is out of range. The
    /// host should keep the tool disabled in every case.
    pub fn new(config: AngleToolConfig, mode: AngleMode, target: Option<C>) -> Result<Self> {
        let Some(target) = target else {
            warn!("angle tool has no target surface, staying disabled");
            return Err(SessionError::MissingTarget.into());
        };
        config.validate()?;
        mode.validate()?;
        Ok(Self {
            config,
            mode,
            target,
            markers: PointMarkerSet::new(),
            active: false,
            last_drag_hit: None,
        })
    }

    /// Starts the session from a clean slate.
    pub fn on_activate<H: MarkerHost>(&mut self, host: &mut H) {
        self.reset(host);
        self.active = true;
        info!(mode = ?self.mode, "angle session activated");
    }

    /// Stops the session and removes its markers.
    pub fn on_deactivate<H: MarkerHost>(&mut self, host: &mut H) {
        self.reset(host);
        self.active = false;
        info!("angle session deactivated");
    }

    /// Clears all markers and the drag state. Safe to call at any time.
    pub fn reset<H: MarkerHost>(&mut self, host: &mut H) {
        for handle in self.markers.reset() {
            host.destroy_marker(handle);
        }
        self.last_drag_hit = None;
    }

    /// Advances the session by one frame.
    pub fn tick<S, H>(&mut self, input: &FrameInput, surfaces: &S, host: &mut H) -> TickOutput
    where
        S: SurfaceQuery<Collider = C>,
        H: MarkerHost,
    {
        let mut diagnostics = Vec::new();
        if !self.active {
            return TickOutput {
                frame: MeasurementFrame::placeholder(Polyline::default()),
                diagnostics,
            };
        }

        if !self.markers.is_consistent(|h| host.is_alive(h)) {
            warn!(markers = self.markers.len(), "marker lost, resetting session");
            self.reset(host);
            diagnostics.push(Diagnostic::CorruptedSession);
        }

        self.handle_pointer(input, surfaces, host, &mut diagnostics);
        let frame = self.build_frame(&input.viewpoint, &mut diagnostics);
        TickOutput { frame, diagnostics }
    }

    fn handle_pointer<S, H>(&mut self, input: &FrameInput, surfaces: &S, host: &mut H, diagnostics: &mut Vec<Diagnostic>)
    where
        S: SurfaceQuery<Collider = C>,
        H: MarkerHost,
    {
        match input.pointer {
            PointerPhase::Idle => {}
            PointerPhase::Pressed => {
                // A release we never saw; finish that drag first.
                if self.markers.dragged().is_some() {
                    self.finish_drag(None, surfaces, host, diagnostics);
                }
                if let Some(ray) = input.ray {
                    self.press(&ray, surfaces, host, diagnostics);
                }
            }
            PointerPhase::Held => {
                let (Some(index), Some(ray)) = (self.markers.dragged(), input.ray) else {
                    return;
                };
                let Some(hit) = self.probe_target(surfaces, &ray) else {
                    return;
                };
                if self.markers.update_dragged(index, hit.sample).is_ok() {
                    if let Some(marker) = self.markers.get(index) {
                        host.move_marker(marker.handle, hit.sample.position);
                    }
                    self.last_drag_hit = Some(hit);
                }
            }
            PointerPhase::Released => {
                if self.markers.dragged().is_some() {
                    self.finish_drag(input.ray.as_ref(), surfaces, host, diagnostics);
                }
            }
        }
    }

    /// Click routing: grab a marker, else place a new one, else nothing.
    fn press<S, H>(&mut self, ray: &Ray, surfaces: &S, host: &mut H, diagnostics: &mut Vec<Diagnostic>)
    where
        S: SurfaceQuery<Collider = C>,
        H: MarkerHost,
    {
        if let Some(index) = self.pick_marker(ray) {
            if self.markers.begin_drag(index).is_ok() {
                self.last_drag_hit = None;
            }
            return;
        }
        if self.markers.is_full() {
            return;
        }
        let Some(hit) = self.probe_target(surfaces, ray) else {
            debug!("click missed the target surface");
            diagnostics.push(Diagnostic::MissedRaycast);
            return;
        };
        let sample = if self.config.snap_to_vertices {
            let (sample, snapped) = self.probe().snap(surfaces, &hit);
            if !snapped {
                diagnostics.push(Diagnostic::MissingSnapTarget);
            }
            sample
        } else {
            hit.sample
        };
        let handle = host.spawn_marker(sample.position);
        if self.markers.place(sample, handle).is_err() {
            host.destroy_marker(handle);
        }
    }

    fn finish_drag<S, H>(&mut self, ray: Option<&Ray>, surfaces: &S, host: &mut H, diagnostics: &mut Vec<Diagnostic>)
    where
        S: SurfaceQuery<Collider = C>,
        H: MarkerHost,
    {
        let final_hit = ray
            .and_then(|r| self.probe_target(surfaces, r))
            .or(self.last_drag_hit.take());
        let mesh = final_hit.and_then(|h| surfaces.mesh(h.collider));
        let release = self.markers.end_drag(
            self.config.snap_to_vertices,
            final_hit.map(|h| h.sample),
            mesh.as_ref(),
        );
        if let Some(release) = release {
            if release.snap_missed {
                diagnostics.push(Diagnostic::MissingSnapTarget);
            }
            if let Some(marker) = self.markers.get(release.index) {
                host.move_marker(marker.handle, release.sample.position);
            }
        }
    }

    /// Nearest marker whose pick sphere the ray passes through.
    fn pick_marker(&self, ray: &Ray) -> Option<usize> {
        self.markers
            .iter()
            .enumerate()
            .filter_map(|(i, m)| {
                ray_sphere_intersect(ray, &m.sample.position, self.config.marker_pick_radius).map(|t| (i, t))
            })
            .filter(|&(_, t)| t <= self.config.max_ray_distance)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }

    fn probe(&self) -> SurfaceProbe {
        SurfaceProbe::new(self.config.max_ray_distance, self.config.layer_mask)
    }

    /// Probes and keeps only hits on the target surface.
    fn probe_target<S: SurfaceQuery<Collider = C>>(&self, surfaces: &S, ray: &Ray) -> Option<RayHit<C>> {
        self.probe()
            .probe(surfaces, ray)
            .filter(|hit| hit.collider == self.target)
    }

    fn build_frame(&self, viewpoint: &Point3, diagnostics: &mut Vec<Diagnostic>) -> MeasurementFrame {
        let samples = self.markers.samples();
        let polyline = MarkerLine::new(self.config.line_visual_offset, self.mode.is_closed()).build(&samples);
        let Some(points) = self.markers.triangle() else {
            return MeasurementFrame::placeholder(polyline);
        };

        let center = matches!(self.mode, AngleMode::Triangle).then(|| centroid(&points));
        let fan = ArcFan::from_config(&self.config);
        let placer = LabelPlacer::from_config(&self.config);

        let angles: Vec<AngleVisual> = self
            .mode
            .vertices()
            .iter()
            .map(|&i| match compute_vertex(&points, i, self.config.arc_radius_factor) {
                Ok(angle) => AngleVisual {
                    vertex_index: i,
                    arc: fan.build(&angle),
                    label: placer.place(&angle, center.as_ref(), viewpoint),
                    angle: Some(angle),
                },
                Err(err) => {
                    trace!(vertex = i, %err, "angle undefined");
                    diagnostics.push(Diagnostic::DegenerateAngle { vertex: i });
                    AngleVisual {
                        vertex_index: i,
                        angle: None,
                        arc: TriangleMesh::default(),
                        label: placer.placeholder(i, &points[i], viewpoint),
                    }
                }
            })
            .collect();

        let readout = angles
            .iter()
            .map(|a| a.label.text.as_str())
            .collect::<Vec<_>>()
            .join(" / ");
        trace!(%readout, "frame rebuilt");
        MeasurementFrame {
            polyline,
            angles,
            readout,
        }
    }

    /// Exports the current markers and angles.
    #[must_use]
    pub fn snapshot(&self) -> MeasurementSnapshot {
        let angles_degrees = match self.markers.triangle() {
            Some(points) => self
                .mode
                .vertices()
                .iter()
                .map(|&i| {
                    let angle = compute_vertex(&points, i, self.config.arc_radius_factor).ok();
                    (i, angle.map(|a| a.angle_degrees))
                })
                .collect(),
            None => Vec::new(),
        };
        MeasurementSnapshot {
            mode: self.mode,
            markers: self.markers.samples(),
            angles_degrees,
        }
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        match self.markers.len() {
            0 => SessionPhase::Empty,
            n if n < MARKER_CAPACITY => SessionPhase::Placing(n),
            _ => SessionPhase::Complete,
        }
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.markers.dragged().is_some()
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    #[must_use]
    pub fn markers(&self) -> &PointMarkerSet {
        &self.markers
    }

    #[must_use]
    pub fn target(&self) -> C {
        self.target
    }

    #[must_use]
    pub fn config(&self) -> &AngleToolConfig {
        &self.config
    }

    /// Replaces the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error and keeps the old configuration if `config` is out of range.
    pub fn set_config(&mut self, config: AngleToolConfig) -> Result<()> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    #[must_use]
    pub fn snap_to_vertices(&self) -> bool {
        self.config.snap_to_vertices
    }

    pub fn set_snap_to_vertices(&mut self, enabled: bool) {
        self.config.snap_to_vertices = enabled;
    }

    #[must_use]
    pub fn mode(&self) -> AngleMode {
        self.mode
    }

    /// Switches between single-vertex and triangle measurement; markers are kept.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidMarker`] and keeps the old mode if
    /// `mode` names a vertex outside `0..3`.
    pub fn set_mode(&mut self, mode: AngleMode) -> Result<()> {
        mode.validate()?;
        self.mode = mode;
        Ok(())
    }
}
