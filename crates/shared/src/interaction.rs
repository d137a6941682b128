use crate::error::MapError;
use crate::layer::{FeatureLayer, LayerId, VertexRef};
use crate::models::{Coordinate, Geometry, GeometryType};

/// Default pixel tolerance for modify and snap.
pub const DEFAULT_PIXEL_TOLERANCE: f64 = 10.0;

/// Default pixel tolerance for finishing a sketch on its first or last vertex.
pub const DEFAULT_FINISH_TOLERANCE: f64 = 12.0;

/// Pointer interaction attached to a map and bound to one feature layer.
#[derive(Debug)]
pub enum Interaction {
    Draw { source: LayerId, draw: Draw },
    Modify { source: LayerId, modify: Modify },
    Snap { source: LayerId, snap: Snap },
}

impl Interaction {
    pub fn source(&self) -> LayerId {
        match self {
            Interaction::Draw { source, .. }
            | Interaction::Modify { source, .. }
            | Interaction::Snap { source, .. } => *source,
        }
    }

    pub fn as_draw(&self) -> Option<&Draw> {
        match self {
            Interaction::Draw { draw, .. } => Some(draw),
            _ => None,
        }
    }

    pub fn is_draw(&self) -> bool {
        matches!(self, Interaction::Draw { .. })
    }

    pub fn is_modify(&self) -> bool {
        matches!(self, Interaction::Modify { .. })
    }

    pub fn is_snap(&self) -> bool {
        matches!(self, Interaction::Snap { .. })
    }
}

// ---------------------------------------------------------------------------
// Draw
// ---------------------------------------------------------------------------

/// Turns clicks into a new geometry of one type.
#[derive(Debug)]
pub struct Draw {
    kind: GeometryType,
    finish_tolerance_px: f64,
    sketch: Vec<Coordinate>,
}

impl Draw {
    pub fn new(kind: GeometryType) -> Self {
        Draw {
            kind,
            finish_tolerance_px: DEFAULT_FINISH_TOLERANCE,
            sketch: Vec::new(),
        }
    }

    pub fn with_finish_tolerance(mut self, px: f64) -> Self {
        self.finish_tolerance_px = px;
        self
    }

    pub fn kind(&self) -> GeometryType {
        self.kind
    }

    pub fn finish_tolerance_px(&self) -> f64 {
        self.finish_tolerance_px
    }

    /// Vertices placed so far for an unfinished line or polygon.
    pub fn sketch(&self) -> &[Coordinate] {
        &self.sketch
    }

    /// Feed one click. Returns the geometry if this click completed it.
    ///
    /// Lines finish on a click at the last vertex, polygons on a click at
    /// the first or last vertex. `tolerance` is in meters.
    pub fn click(&mut self, at: Coordinate, tolerance: f64) -> Option<Geometry> {
        let near_last = self.sketch.last().is_some_and(|v| v.distance(at) <= tolerance);
        let near_first = self.sketch.first().is_some_and(|v| v.distance(at) <= tolerance);
        match self.kind {
            GeometryType::Point => Some(Geometry::Point(at)),
            GeometryType::LineString => {
                if near_last {
                    return self.finish();
                }
                self.sketch.push(at);
                None
            }
            GeometryType::Polygon => {
                if near_last || (near_first && self.sketch.len() >= 3) {
                    return self.finish();
                }
                self.sketch.push(at);
                None
            }
        }
    }

    /// Complete the sketch if it has enough vertices for its type.
    pub fn finish(&mut self) -> Option<Geometry> {
        let geometry = match self.kind {
            GeometryType::LineString if self.sketch.len() >= 2 => {
                Geometry::LineString(std::mem::take(&mut self.sketch))
            }
            GeometryType::Polygon if self.sketch.len() >= 3 => {
                Geometry::Polygon(std::mem::take(&mut self.sketch))
            }
            _ => return None,
        };
        Some(geometry)
    }
}

// ---------------------------------------------------------------------------
// Modify
// ---------------------------------------------------------------------------

/// Lets the user drag existing vertices.
#[derive(Debug)]
pub struct Modify {
    pixel_tolerance: f64,
    grabbed: Option<VertexRef>,
}

impl Modify {
    pub fn new() -> Self {
        Modify {
            pixel_tolerance: DEFAULT_PIXEL_TOLERANCE,
            grabbed: None,
        }
    }

    pub fn with_pixel_tolerance(mut self, px: f64) -> Self {
        self.pixel_tolerance = px;
        self
    }

    pub fn pixel_tolerance(&self) -> f64 {
        self.pixel_tolerance
    }

    pub fn grabbed(&self) -> Option<VertexRef> {
        self.grabbed
    }

    /// Grab the nearest vertex within `tolerance` meters. Returns whether one was grabbed.
    pub fn press(&mut self, layer: &FeatureLayer, at: Coordinate, tolerance: f64) -> bool {
        self.grabbed = layer.nearest_vertex(at, tolerance).map(|(vref, _)| vref);
        self.grabbed.is_some()
    }

    /// Move the grabbed vertex. Returns false when nothing is grabbed.
    pub fn drag(&mut self, layer: &mut FeatureLayer, to: Coordinate) -> Result<bool, MapError> {
        let Some(vref) = self.grabbed else {
            return Ok(false);
        };
        if let Err(e) = layer.move_vertex(vref, to) {
            self.grabbed = None;
            return Err(e);
        }
        Ok(true)
    }

    pub fn release(&mut self) -> bool {
        self.grabbed.take().is_some()
    }
}

impl Default for Modify {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Snap
// ---------------------------------------------------------------------------

/// Pulls pointer coordinates onto nearby vertices, then edges.
#[derive(Debug)]
pub struct Snap {
    pixel_tolerance: f64,
}

impl Snap {
    pub fn new() -> Self {
        Snap {
            pixel_tolerance: DEFAULT_PIXEL_TOLERANCE,
        }
    }

    pub fn with_pixel_tolerance(mut self, px: f64) -> Self {
        self.pixel_tolerance = px;
        self
    }

    pub fn pixel_tolerance(&self) -> f64 {
        self.pixel_tolerance
    }

    pub fn snap(&self, layer: &FeatureLayer, at: Coordinate, tolerance: f64) -> Option<Coordinate> {
        layer
            .nearest_vertex(at, tolerance)
            .map(|(_, v)| v)
            .or_else(|| layer.nearest_on_edge(at, tolerance))
    }
}

impl Default for Snap {
    fn default() -> Self {
        Self::new()
    }
}
