use tracing::debug;

use crate::error::{Result, SessionError};
use crate::math::Point3;
use crate::surface::{nearest_vertex, MeshView, SurfaceSample};

/// Maximum number of markers in a session.
pub const MARKER_CAPACITY: usize = 3;

/// Opaque handle to the host's visible marker object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MarkerHandle(pub u64);

/// A placed measurement point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerPoint {
    pub sample: SurfaceSample,
    /// The host object that renders this marker; never owned by the session.
    pub handle: MarkerHandle,
}

/// Outcome of releasing a dragged marker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragRelease {
    pub index: usize,
    pub sample: SurfaceSample,
    /// Snapping was requested but no mesh vertex was available.
    pub snap_missed: bool,
}

/// Ordered markers in placement order, with at most one being dragged.
#[derive(Debug, Clone, Default)]
pub struct PointMarkerSet {
    markers: Vec<MarkerPoint>,
    dragged: Option<usize>,
}

impl PointMarkerSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a marker and returns its index.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::MarkerCapacity`] when three markers are
    /// already placed; the set is left unchanged.
    pub fn place(&mut self, sample: SurfaceSample, handle: MarkerHandle) -> Result<usize> {
        if self.is_full() {
            return Err(SessionError::MarkerCapacity.into());
        }
        self.markers.push(MarkerPoint { sample, handle });
        let index = self.markers.len() - 1;
        debug!(index, position = ?sample.position, "marker placed");
        Ok(index)
    }

    /// Marks `index` as the live drag target.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidMarker`] if no such marker exists.
    pub fn begin_drag(&mut self, index: usize) -> Result<()> {
        if index >= self.markers.len() {
            return Err(SessionError::InvalidMarker(index).into());
        }
        self.dragged = Some(index);
        debug!(index, "drag started");
        Ok(())
    }

    /// Moves the dragged marker to `sample`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotDragging`] if `index` is not the marker
    /// currently being dragged.
    pub fn update_dragged(&mut self, index: usize, sample: SurfaceSample) -> Result<()> {
        if self.dragged != Some(index) {
            return Err(SessionError::NotDragging(index).into());
        }
        self.markers[index].sample = sample;
        Ok(())
    }

    /// Ends the current drag.
    ///
    /// With `snap` set and a `final_sample` available, the marker moves to
    /// the nearest vertex of `mesh`, or to the raw final sample when there
    /// is no mesh to snap to. Returns `None` if nothing was being dragged.
    pub fn end_drag(
        &mut self,
        snap: bool,
        final_sample: Option<SurfaceSample>,
        mesh: Option<&MeshView<'_>>,
    ) -> Option<DragRelease> {
        let index = self.dragged.take()?;
        let mut snap_missed = false;
        if let (true, Some(sample)) = (snap, final_sample) {
            let snapped = mesh.and_then(|m| nearest_vertex(&sample, m));
            snap_missed = snapped.is_none();
            self.markers[index].sample = snapped.unwrap_or(sample);
        }
        let sample = self.markers[index].sample;
        debug!(index, snapped = snap && !snap_missed, "drag ended");
        Some(DragRelease {
            index,
            sample,
            snap_missed,
        })
    }

    /// Clears every marker and the drag state, returning the handles the
    /// host must destroy.
    pub fn reset(&mut self) -> Vec<MarkerHandle> {
        self.dragged = None;
        self.markers.drain(..).map(|m| m.handle).collect()
    }

    /// Returns `true` if every marker is alive on the host and carries a
    /// usable normal.
    pub fn is_consistent(&self, is_alive: impl Fn(MarkerHandle) -> bool) -> bool {
        self.markers
            .iter()
            .all(|m| m.sample.is_valid() && is_alive(m.handle))
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&MarkerPoint> {
        self.markers.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MarkerPoint> {
        self.markers.iter()
    }

    #[must_use]
    pub fn samples(&self) -> Vec<SurfaceSample> {
        self.markers.iter().map(|m| m.sample).collect()
    }

    /// Positions of all three markers, once the set is complete.
    #[must_use]
    pub fn triangle(&self) -> Option<[Point3; 3]> {
        match self.markers.as_slice() {
            [a, b, c] => Some([a.sample.position, b.sample.position, c.sample.position]),
            _ => None,
        }
    }

    #[must_use]
    pub fn dragged(&self) -> Option<usize> {
        self.dragged
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.markers.len() >= MARKER_CAPACITY
    }
}
