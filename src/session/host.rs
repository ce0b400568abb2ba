use crate::math::{Point3, UnitQuaternion};
use crate::tessellation::TriangleMesh;

use super::markers::{MarkerHandle, MARKER_CAPACITY};
use super::MeasurementFrame;

/// Scene-object lifecycle for the visible markers.
pub trait MarkerHost {
    /// Creates a visible marker at `position` and returns its handle.
    fn spawn_marker(&mut self, position: Point3) -> MarkerHandle;

    fn move_marker(&mut self, handle: MarkerHandle, position: Point3);

    fn destroy_marker(&mut self, handle: MarkerHandle);

    /// Whether the marker still exists; the session resets itself when one
    /// has disappeared.
    fn is_alive(&self, handle: MarkerHandle) -> bool;
}

/// Rendering side of the host. Slots are keyed by marker vertex index.
pub trait VisualSink {
    fn draw_polyline(&mut self, points: &[Point3]);

    fn upload_mesh(&mut self, vertex_index: usize, mesh: &TriangleMesh);

    fn clear_mesh(&mut self, vertex_index: usize);

    fn set_label_text(&mut self, vertex_index: usize, text: &str);

    fn set_label_transform(&mut self, vertex_index: usize, position: Point3, rotation: UnitQuaternion);

    /// Hides the label in one slot.
    fn clear_label(&mut self, vertex_index: usize);

    /// Shows the overall readout (e.g. a HUD text).
    fn set_readout(&mut self, text: &str);

    /// Removes every arc and label.
    fn clear_visuals(&mut self);

    /// Pushes a whole frame through the methods above.
    ///
    /// Slots the frame does not mention are cleared, so a mode switch never
    /// leaves stale arcs or labels behind.
    fn present(&mut self, frame: &MeasurementFrame) {
        self.draw_polyline(&frame.polyline.points);
        self.set_readout(&frame.readout);
        if frame.angles.is_empty() {
            self.clear_visuals();
            return;
        }
        for slot in 0..MARKER_CAPACITY {
            if frame.angles.iter().all(|v| v.vertex_index != slot) {
                self.clear_mesh(slot);
                self.clear_label(slot);
            }
        }
        for visual in &frame.angles {
            let slot = visual.vertex_index;
            if visual.arc.is_empty() {
                self.clear_mesh(slot);
            } else {
                self.upload_mesh(slot, &visual.arc);
            }
            self.set_label_text(slot, &visual.label.text);
            self.set_label_transform(slot, visual.label.position, visual.label.rotation);
        }
    }
}
