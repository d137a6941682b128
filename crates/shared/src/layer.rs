use crate::error::MapError;
use crate::models::{Coordinate, Feature, FeatureId, Geometry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerId(pub u32);

impl std::fmt::Display for LayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "layer#{}", self.0)
    }
}

/// A vertex addressed by its feature and index in the vertex list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexRef {
    pub feature: FeatureId,
    pub index: usize,
}

/// Editable vector overlay holding drawn geometries and the pin.
#[derive(Debug, Default)]
pub struct FeatureLayer {
    features: Vec<Feature>,
    next_id: u64,
}

impl FeatureLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_feature(&mut self, geometry: Geometry) -> FeatureId {
        let id = FeatureId(self.next_id);
        self.next_id += 1;
        self.features.push(Feature { id, geometry });
        id
    }

    pub fn remove_feature(&mut self, id: FeatureId) -> Result<Feature, MapError> {
        let idx = self
            .features
            .iter()
            .position(|f| f.id == id)
            .ok_or(MapError::UnknownFeature(id))?;
        Ok(self.features.remove(idx))
    }

    pub fn get(&self, id: FeatureId) -> Option<&Feature> {
        self.features.iter().find(|f| f.id == id)
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Nearest vertex within `tolerance` meters of `at`.
    pub fn nearest_vertex(&self, at: Coordinate, tolerance: f64) -> Option<(VertexRef, Coordinate)> {
        let mut best = None;
        let mut best_dist = tolerance;
        for feature in &self.features {
            for (index, &v) in feature.geometry.vertices().iter().enumerate() {
                let d = v.distance(at);
                if d <= best_dist {
                    best_dist = d;
                    best = Some((
                        VertexRef {
                            feature: feature.id,
                            index,
                        },
                        v,
                    ));
                }
            }
        }
        best
    }

    /// Nearest point on any edge within `tolerance` meters of `at`.
    pub fn nearest_on_edge(&self, at: Coordinate, tolerance: f64) -> Option<Coordinate> {
        let mut best = None;
        let mut best_dist = tolerance;
        for feature in &self.features {
            for (a, b) in feature.geometry.segments() {
                let p = closest_on_segment(at, a, b);
                let d = p.distance(at);
                if d <= best_dist {
                    best_dist = d;
                    best = Some(p);
                }
            }
        }
        best
    }

    pub fn move_vertex(&mut self, vertex: VertexRef, to: Coordinate) -> Result<(), MapError> {
        let feature = self
            .features
            .iter_mut()
            .find(|f| f.id == vertex.feature)
            .ok_or(MapError::UnknownFeature(vertex.feature))?;
        if let Some(v) = feature.geometry.vertices_mut().get_mut(vertex.index) {
            *v = to;
        }
        Ok(())
    }
}

/// Projection of `p` onto segment `a`-`b`, clamped to the segment.
pub fn closest_on_segment(p: Coordinate, a: Coordinate, b: Coordinate) -> Coordinate {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return a;
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    Coordinate::new(a.x + t * dx, a.y + t * dy)
}
