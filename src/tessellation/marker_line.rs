use crate::surface::SurfaceSample;

use super::Polyline;

/// Connects placed markers with a polyline lifted off the surface.
#[derive(Debug, Clone, Copy)]
pub struct MarkerLine {
    visual_offset: f64,
    closed: bool,
}

impl MarkerLine {
    /// Creates a new `MarkerLine`. A closed line returns to the first
    /// marker once three or more are placed.
    #[must_use]
    pub fn new(visual_offset: f64, closed: bool) -> Self {
        Self {
            visual_offset,
            closed,
        }
    }

    /// Builds the polyline; each point is offset along its marker's normal.
    #[must_use]
    pub fn build(&self, samples: &[SurfaceSample]) -> Polyline {
        let mut points: Vec<_> = samples
            .iter()
            .map(|s| s.position + s.normal * self.visual_offset)
            .collect();
        if self.closed && points.len() >= 3 {
            points.push(points[0]);
        }
        Polyline { points }
    }
}
