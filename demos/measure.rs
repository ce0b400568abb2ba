//! Headless walkthrough of an angle measurement.
//!
//! ```text
//! cargo run --example measure                  # single angle at B
//! cargo run --example measure -- triangle      # all three angles
//! RUST_LOG=anglekit=debug cargo run --example measure
//! ```

use std::collections::HashMap;

use anglekit::math::{Matrix4, Point3, Ray, UnitQuaternion, Vector3};
use anglekit::session::{MarkerHandle, MarkerHost, VisualSink};
use anglekit::surface::{SurfaceData, SurfaceStore};
use anglekit::tessellation::TriangleMesh;
use anglekit::{AngleMode, AngleSession, AngleToolConfig, FrameInput, PointerPhase};

#[derive(Default)]
struct ConsoleHost {
    next: u64,
    markers: HashMap<MarkerHandle, Point3>,
}

impl MarkerHost for ConsoleHost {
    fn spawn_marker(&mut self, position: Point3) -> MarkerHandle {
        self.next += 1;
        let handle = MarkerHandle(self.next);
        self.markers.insert(handle, position);
        println!("spawn marker {} at {:.3?}", handle.0, position.coords.as_slice());
        handle
    }

    fn move_marker(&mut self, handle: MarkerHandle, position: Point3) {
        self.markers.insert(handle, position);
    }

    fn destroy_marker(&mut self, handle: MarkerHandle) {
        self.markers.remove(&handle);
        println!("destroy marker {}", handle.0);
    }

    fn is_alive(&self, handle: MarkerHandle) -> bool {
        self.markers.contains_key(&handle)
    }
}

struct ConsoleSink;

impl VisualSink for ConsoleSink {
    fn draw_polyline(&mut self, points: &[Point3]) {
        println!("  polyline: {} points", points.len());
    }

    fn upload_mesh(&mut self, vertex_index: usize, mesh: &TriangleMesh) {
        println!(
            "  arc[{vertex_index}]: {} vertices, {} triangles",
            mesh.vertices.len(),
            mesh.indices.len()
        );
    }

    fn clear_mesh(&mut self, vertex_index: usize) {
        println!("  arc[{vertex_index}]: cleared");
    }

    fn set_label_text(&mut self, vertex_index: usize, text: &str) {
        println!("  label[{vertex_index}]: {text}");
    }

    fn set_label_transform(&mut self, vertex_index: usize, position: Point3, _rotation: UnitQuaternion) {
        println!("  label[{vertex_index}] at {:.3?}", position.coords.as_slice());
    }

    fn clear_label(&mut self, vertex_index: usize) {
        println!("  label[{vertex_index}]: hidden");
    }

    fn set_readout(&mut self, text: &str) {
        println!("  readout: {text}");
    }

    fn clear_visuals(&mut self) {
        println!("  visuals cleared");
    }
}

fn pointer_ray(x: f64, z: f64) -> Option<Ray> {
    Ray::new(Point3::new(x, 5.0, z), Vector3::new(0.0, -1.0, 0.0)).ok()
}

fn main() -> anglekit::Result<()> {
    // Default: WARN for everything, INFO for anglekit.
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing_subscriber::filter::LevelFilter::WARN.into())
        .add_directive("anglekit=info".parse().unwrap_or_default());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let mode = match std::env::args().nth(1).as_deref() {
        Some("triangle") => AngleMode::Triangle,
        _ => AngleMode::default(),
    };

    let mut store = SurfaceStore::new();
    let target = store.add(
        SurfaceData::quad(10.0).with_transform(Matrix4::new_translation(&Vector3::new(0.0, -0.5, 0.0))),
    );

    let mut host = ConsoleHost::default();
    let mut sink = ConsoleSink;
    let mut session = AngleSession::new(AngleToolConfig::for_mode(mode), mode, Some(target))?;
    session.on_activate(&mut host);

    let viewpoint = Point3::new(0.0, 8.0, -6.0);
    let script = [
        (PointerPhase::Pressed, (0.0, 0.0)),
        (PointerPhase::Released, (0.0, 0.0)),
        (PointerPhase::Pressed, (2.0, 0.0)),
        (PointerPhase::Released, (2.0, 0.0)),
        (PointerPhase::Pressed, (2.0, 2.0)),
        (PointerPhase::Released, (2.0, 2.0)),
        // Drag the last marker around.
        (PointerPhase::Pressed, (2.0, 2.0)),
        (PointerPhase::Held, (3.0, 1.0)),
        (PointerPhase::Held, (4.0, 0.0)),
        (PointerPhase::Released, (4.0, 0.0)),
    ];

    for (frame, (pointer, (x, z))) in script.into_iter().enumerate() {
        println!("frame {frame}: {pointer:?} at ({x}, {z})");
        let output = session.tick(&FrameInput::new(pointer, pointer_ray(x, z), viewpoint), &store, &mut host);
        for diagnostic in &output.diagnostics {
            println!("  diagnostic: {diagnostic:?}");
        }
        sink.present(&output.frame);
    }

    println!("{:#?}", session.snapshot());
    session.on_deactivate(&mut host);
    Ok(())
}
