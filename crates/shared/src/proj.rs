//! Spherical Web Mercator (EPSG:3857) projection.
//!
//! Projected coordinates are meters, X east and Y north, with the origin
//! at (0°, 0°). The projected world is a square of side `2 * HALF_WORLD_M`.

use crate::models::{Coordinate, LonLat};

pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Half the side of the projected world square (≈ 20 037 508 m).
pub const HALF_WORLD_M: f64 = std::f64::consts::PI * EARTH_RADIUS_M;

/// Latitude at which the projected world becomes square.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Edge length of one raster tile in pixels.
pub const TILE_SIZE_PX: f64 = 256.0;

/// Project geographic degrees to Web Mercator meters.
pub fn from_lon_lat(ll: LonLat) -> Coordinate {
    let lat = ll.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);
    let x = EARTH_RADIUS_M * ll.lon.to_radians();
    let y = EARTH_RADIUS_M * (std::f64::consts::FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln();
    Coordinate { x, y }
}

/// Inverse of [`from_lon_lat`].
pub fn to_lon_lat(c: Coordinate) -> LonLat {
    let lon = (c.x / EARTH_RADIUS_M).to_degrees();
    let lat = (2.0 * (c.y / EARTH_RADIUS_M).exp().atan() - std::f64::consts::FRAC_PI_2).to_degrees();
    LonLat { lon, lat }
}

/// Meters per pixel at an integer zoom level.
pub fn resolution(zoom: u8) -> f64 {
    2.0 * HALF_WORLD_M / (TILE_SIZE_PX * 2f64.powi(zoom as i32))
}
