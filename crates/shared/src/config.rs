use serde::{Deserialize, Serialize};

use crate::interaction::{DEFAULT_FINISH_TOLERANCE, DEFAULT_PIXEL_TOLERANCE};
use crate::models::LonLat;
use crate::tile::OSM_TILE_URL;

/// Initial view and interaction settings for a map panel.
///
/// Missing fields fall back to [`MapConfig::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MapConfig {
    /// `[lon, lat]` the view opens on.
    pub center: [f64; 2],
    pub zoom: u8,
    /// `[lon, lat]` where "Drop Pin" places the pin.
    pub pin: [f64; 2],
    pub tile_url: String,
    pub viewport_height_px: f64,
    /// Modify and snap tolerance.
    pub pixel_tolerance: f64,
    /// Distance to the first/last vertex that finishes a sketch.
    pub finish_tolerance: f64,
}

impl MapConfig {
    pub fn center_lon_lat(&self) -> LonLat {
        LonLat::from(self.center)
    }

    pub fn pin_lon_lat(&self) -> LonLat {
        LonLat::from(self.pin)
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        MapConfig {
            center: [77.0, 28.45],
            zoom: 10,
            pin: [77.0, 28.45],
            tile_url: OSM_TILE_URL.to_string(),
            viewport_height_px: 400.0,
            pixel_tolerance: DEFAULT_PIXEL_TOLERANCE,
            finish_tolerance: DEFAULT_FINISH_TOLERANCE,
        }
    }
}
