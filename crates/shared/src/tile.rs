use serde::{Deserialize, Serialize};

use crate::proj::{HALF_WORLD_M, TILE_SIZE_PX};
use crate::view::{Size, View};

pub const OSM_TILE_URL: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileId {
    pub z: u8,
    pub x: u32,
    pub y: u32,
}

/// A tile and where its top-left corner lands in the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TilePlacement {
    pub id: TileId,
    pub left: f64,
    pub top: f64,
}

/// XYZ raster tile source described by a `{z}/{x}/{y}` URL template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileSource {
    url_template: String,
}

impl TileSource {
    pub fn new(url_template: impl Into<String>) -> Self {
        TileSource {
            url_template: url_template.into(),
        }
    }

    pub fn osm() -> Self {
        Self::new(OSM_TILE_URL)
    }

    pub fn url_template(&self) -> &str {
        &self.url_template
    }

    pub fn url(&self, id: TileId) -> String {
        self.url_template
            .replace("{z}", &id.z.to_string())
            .replace("{x}", &id.x.to_string())
            .replace("{y}", &id.y.to_string())
    }
}

impl Default for TileSource {
    fn default() -> Self {
        Self::osm()
    }
}

/// Tiles covering the viewport at the view's zoom level.
///
/// Columns wrap around the antimeridian; rows beyond the poles are skipped.
pub fn visible_tiles(view: &View, size: Size) -> Vec<TilePlacement> {
    if size.0 <= 0.0 || size.1 <= 0.0 {
        return Vec::new();
    }
    let z = view.zoom();
    let res = view.resolution();
    let span = TILE_SIZE_PX * res;
    let n = 1i64 << z;
    let (min, max) = view.extent(size);

    let first_col = ((min.x + HALF_WORLD_M) / span).floor() as i64;
    let last_col = ((max.x + HALF_WORLD_M) / span).ceil() as i64 - 1;
    let first_row = ((HALF_WORLD_M - max.y) / span).floor() as i64;
    let last_row = ((HALF_WORLD_M - min.y) / span).ceil() as i64 - 1;

    let mut tiles = Vec::new();
    for row in first_row..=last_row {
        if row < 0 || row >= n {
            continue;
        }
        for col in first_col..=last_col {
            let tile_min_x = -HALF_WORLD_M + col as f64 * span;
            let tile_max_y = HALF_WORLD_M - row as f64 * span;
            tiles.push(TilePlacement {
                id: TileId {
                    z,
                    x: col.rem_euclid(n) as u32,
                    y: row as u32,
                },
                left: (tile_min_x - min.x) / res,
                top: (max.y - tile_max_y) / res,
            });
        }
    }
    tiles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Coordinate;

    #[test]
    fn test_osm_url() {
        let url = TileSource::osm().url(TileId { z: 10, x: 730, y: 425 });
        assert_eq!(url, "https://tile.openstreetmap.org/10/730/425.png");
    }

    #[test]
    fn test_zoom0_single_tile_fills_viewport() {
        let view = View::new(Coordinate::new(0.0, 0.0), 0);
        let tiles = visible_tiles(&view, (256.0, 256.0));
        assert_eq!(tiles.len(), 1);
        assert_eq!(tiles[0].id, TileId { z: 0, x: 0, y: 0 });
        assert!(tiles[0].left.abs() < 1e-9);
        assert!(tiles[0].top.abs() < 1e-9);
    }

    #[test]
    fn test_zoom1_quad() {
        let view = View::new(Coordinate::new(0.0, 0.0), 1);
        let tiles = visible_tiles(&view, (512.0, 512.0));
        assert_eq!(tiles.len(), 4);
        let bottom_right = tiles
            .iter()
            .find(|t| t.id.x == 1 && t.id.y == 1)
            .expect("tile 1/1/1 visible");
        assert!((bottom_right.left - 256.0).abs() < 1e-6);
        assert!((bottom_right.top - 256.0).abs() < 1e-6);
    }

    #[test]
    fn test_columns_wrap_around_antimeridian() {
        let view = View::new(Coordinate::new(0.0, 0.0), 0);
        let tiles = visible_tiles(&view, (512.0, 256.0));
        assert_eq!(tiles.len(), 3);
        assert!(tiles.iter().all(|t| t.id.x == 0));
    }

    #[test]
    fn test_rows_beyond_poles_skipped() {
        let view = View::new(Coordinate::new(0.0, 0.0), 0);
        let tiles = visible_tiles(&view, (256.0, 512.0));
        assert_eq!(tiles.len(), 1);
        assert!((tiles[0].top - 128.0).abs() < 1e-6);
    }

    #[test]
    fn test_empty_viewport_has_no_tiles() {
        let view = View::new(Coordinate::new(0.0, 0.0), 3);
        assert!(visible_tiles(&view, (0.0, 400.0)).is_empty());
    }
}
