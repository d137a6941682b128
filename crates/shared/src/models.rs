use serde::{Deserialize, Serialize};

/// Projected Web Mercator position in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
}

impl Coordinate {
    pub fn new(x: f64, y: f64) -> Self {
        Coordinate { x, y }
    }

    /// Euclidean distance in projected meters.
    pub fn distance(self, other: Coordinate) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

impl From<[f64; 2]> for LonLat {
    fn from(value: [f64; 2]) -> Self {
        LonLat {
            lon: value[0],
            lat: value[1],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeometryType {
    Point,
    LineString,
    Polygon,
}

impl std::fmt::Display for GeometryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeometryType::Point => write!(f, "Point"),
            GeometryType::LineString => write!(f, "LineString"),
            GeometryType::Polygon => write!(f, "Polygon"),
        }
    }
}

/// Polygon rings are stored open: the closing edge back to the first
/// vertex is implicit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Point(Coordinate),
    LineString(Vec<Coordinate>),
    Polygon(Vec<Coordinate>),
}

impl Geometry {
    pub fn geometry_type(&self) -> GeometryType {
        match self {
            Geometry::Point(_) => GeometryType::Point,
            Geometry::LineString(_) => GeometryType::LineString,
            Geometry::Polygon(_) => GeometryType::Polygon,
        }
    }

    pub fn vertices(&self) -> &[Coordinate] {
        match self {
            Geometry::Point(c) => std::slice::from_ref(c),
            Geometry::LineString(v) | Geometry::Polygon(v) => v,
        }
    }

    pub fn vertices_mut(&mut self) -> &mut [Coordinate] {
        match self {
            Geometry::Point(c) => std::slice::from_mut(c),
            Geometry::LineString(v) | Geometry::Polygon(v) => v,
        }
    }

    /// Edges as vertex pairs, including the closing edge of a polygon.
    pub fn segments(&self) -> Vec<(Coordinate, Coordinate)> {
        match self {
            Geometry::Point(_) => Vec::new(),
            Geometry::LineString(v) => v.windows(2).map(|w| (w[0], w[1])).collect(),
            Geometry::Polygon(v) => {
                let mut segs: Vec<_> = v.windows(2).map(|w| (w[0], w[1])).collect();
                if let (Some(&first), Some(&last)) = (v.first(), v.last()) {
                    if v.len() > 2 {
                        segs.push((last, first));
                    }
                }
                segs
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FeatureId(pub u64);

impl std::fmt::Display for FeatureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "feature#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub id: FeatureId,
    pub geometry: Geometry,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_distance() {
        let a = Coordinate::new(0.0, 0.0);
        let b = Coordinate::new(3.0, 4.0);
        assert!((a.distance(b) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_polygon_segments_close_the_ring() {
        let ring = vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(10.0, 0.0),
            Coordinate::new(10.0, 10.0),
        ];
        let segs = Geometry::Polygon(ring.clone()).segments();
        assert_eq!(segs.len(), 3);
        assert_eq!(segs[2], (ring[2], ring[0]));
    }

    #[test]
    fn test_linestring_segments_are_open() {
        let line = Geometry::LineString(vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(10.0, 0.0),
            Coordinate::new(10.0, 10.0),
        ]);
        assert_eq!(line.segments().len(), 2);
    }

    #[test]
    fn test_point_has_single_vertex_and_no_segments() {
        let p = Geometry::Point(Coordinate::new(1.0, 2.0));
        assert_eq!(p.vertices().len(), 1);
        assert!(p.segments().is_empty());
        assert_eq!(p.geometry_type(), GeometryType::Point);
    }

    #[test]
    fn test_geometry_serializes_tagged() {
        let p = Geometry::Point(Coordinate::new(1.0, 2.0));
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["type"], "Point");
        assert_eq!(json["coordinates"]["x"], 1.0);
    }

    #[test]
    fn test_lonlat_from_array() {
        let ll = LonLat::from([77.0, 28.45]);
        assert_eq!(ll.lon, 77.0);
        assert_eq!(ll.lat, 28.45);
    }
}
