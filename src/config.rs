use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result, SessionError};

/// Which vertices of the three markers get an angle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum AngleMode {
    /// One angle at `vertex` (0, 1 or 2), between its two cyclic neighbours.
    SingleVertex { vertex: usize },
    /// All three angles of the closed triangle.
    Triangle,
}

impl AngleMode {
    /// Indices of the vertices measured in this mode.
    ///
    /// Empty for a `SingleVertex` index outside `0..3`; see [`Self::validate`].
    #[must_use]
    pub fn vertices(self) -> &'static [usize] {
        match self {
            Self::SingleVertex { vertex: 0 } => &[0],
            Self::SingleVertex { vertex: 1 } => &[1],
            Self::SingleVertex { vertex: 2 } => &[2],
            Self::SingleVertex { .. } => &[],
            Self::Triangle => &[0, 1, 2],
        }
    }

    /// Checks that a `SingleVertex` index names one of the three markers.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidMarker`] for an index outside `0..3`.
    pub fn validate(self) -> std::result::Result<(), SessionError> {
        match self {
            Self::SingleVertex { vertex } if vertex >= 3 => Err(SessionError::InvalidMarker(vertex)),
            _ => Ok(()),
        }
    }

    /// Whether the marker polyline closes back to the first marker.
    #[must_use]
    pub fn is_closed(self) -> bool {
        matches!(self, Self::Triangle)
    }
}

impl Default for AngleMode {
    fn default() -> Self {
        Self::SingleVertex { vertex: 1 }
    }
}

/// Host-supplied tuning for the angle tool.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AngleToolConfig {
    /// Arc radius as a fraction of the shorter leg.
    pub arc_radius_factor: f64,
    /// Number of triangles in each arc fan.
    pub arc_resolution: usize,
    /// Lift of the arc along its rotation axis.
    pub arc_visual_offset: f64,
    /// Lift of the marker polyline along each marker's surface normal.
    pub line_visual_offset: f64,
    /// Label distance from the vertex, in arc radii.
    pub world_text_offset_factor: f64,
    /// Extra outward push of labels away from the triangle centroid.
    pub text_avoidance_factor: f64,
    pub snap_to_vertices: bool,
    /// Arcs smaller than this are not built.
    pub min_arc_radius: f64,
    pub max_ray_distance: f64,
    pub layer_mask: u32,
    /// Radius of the pick sphere around each marker.
    pub marker_pick_radius: f64,
}

impl Default for AngleToolConfig {
    fn default() -> Self {
        Self {
            arc_radius_factor: 0.2,
            arc_resolution: 20,
            arc_visual_offset: 0.001,
            line_visual_offset: 0.002,
            world_text_offset_factor: 1.5,
            text_avoidance_factor: 0.3,
            snap_to_vertices: false,
            min_arc_radius: 0.001,
            max_ray_distance: 1000.0,
            layer_mask: u32::MAX,
            marker_pick_radius: 0.05,
        }
    }
}

impl AngleToolConfig {
    /// Defaults tuned for `mode`; the triangle variant pushes labels further out.
    #[must_use]
    pub fn for_mode(mode: AngleMode) -> Self {
        match mode {
            AngleMode::SingleVertex { .. } => Self::default(),
            AngleMode::Triangle => Self {
                world_text_offset_factor: 2.0,
                ..Self::default()
            },
        }
    }

    /// Checks every numeric field against its allowed range.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::OutOfRange`] for the first offending field.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        #[allow(clippy::cast_precision_loss)]
        let resolution = self.arc_resolution as f64;
        let checks: [(&'static str, f64, f64, f64); 10] = [
            ("arc_radius_factor", self.arc_radius_factor, 0.05, 0.5),
            ("arc_resolution", resolution, 10.0, 40.0),
            ("arc_visual_offset", self.arc_visual_offset, 0.0, f64::MAX),
            ("line_visual_offset", self.line_visual_offset, 0.0, f64::MAX),
            ("world_text_offset_factor", self.world_text_offset_factor, 1.0, 3.0),
            ("text_avoidance_factor", self.text_avoidance_factor, 0.1, 1.0),
            ("min_arc_radius", self.min_arc_radius, 0.0, f64::MAX),
            ("max_ray_distance", self.max_ray_distance, f64::MIN_POSITIVE, f64::MAX),
            ("marker_pick_radius", self.marker_pick_radius, f64::MIN_POSITIVE, f64::MAX),
            ("layer_mask", f64::from(self.layer_mask.count_ones()), 1.0, 32.0),
        ];
        for (parameter, value, min, max) in checks {
            // NaN is never contained.
            if !(min..=max).contains(&value) {
                return Err(ConfigError::OutOfRange {
                    parameter,
                    value,
                    min,
                    max,
                });
            }
        }
        Ok(())
    }

    /// Parses and validates a JSON configuration; missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a field is out of range.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::InvalidJson(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes the configuration as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::InvalidJson(e.to_string()).into())
    }
}
