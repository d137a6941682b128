use crate::models::Coordinate;
use crate::proj;

pub const MIN_ZOOM: u8 = 0;
pub const MAX_ZOOM: u8 = 19;

/// Viewport size in CSS pixels (width, height).
pub type Size = (f64, f64);

/// Viewport-relative pixel position, origin top-left, Y down.
pub type Pixel = (f64, f64);

/// Center and zoom of the visible map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct View {
    pub center: Coordinate,
    zoom: u8,
}

impl View {
    pub fn new(center: Coordinate, zoom: u8) -> Self {
        View {
            center,
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
        }
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    pub fn set_zoom(&mut self, zoom: u8) {
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    pub fn resolution(&self) -> f64 {
        proj::resolution(self.zoom)
    }

    pub fn coordinate_to_pixel(&self, c: Coordinate, size: Size) -> Pixel {
        let res = self.resolution();
        (
            size.0 / 2.0 + (c.x - self.center.x) / res,
            size.1 / 2.0 - (c.y - self.center.y) / res,
        )
    }

    pub fn pixel_to_coordinate(&self, px: Pixel, size: Size) -> Coordinate {
        let res = self.resolution();
        Coordinate {
            x: self.center.x + (px.0 - size.0 / 2.0) * res,
            y: self.center.y - (px.1 - size.1 / 2.0) * res,
        }
    }

    /// Bottom-left and top-right corners of the visible area.
    pub fn extent(&self, size: Size) -> (Coordinate, Coordinate) {
        let res = self.resolution();
        let half_w = size.0 / 2.0 * res;
        let half_h = size.1 / 2.0 * res;
        (
            Coordinate::new(self.center.x - half_w, self.center.y - half_h),
            Coordinate::new(self.center.x + half_w, self.center.y + half_h),
        )
    }

    /// Move the view so that content follows a pointer drag of (dx, dy) pixels.
    pub fn pan_by_pixels(&mut self, dx: f64, dy: f64) {
        let res = self.resolution();
        self.center.x -= dx * res;
        self.center.y += dy * res;
    }

    /// Change zoom while keeping the coordinate under `px` fixed on screen.
    pub fn zoom_at(&mut self, px: Pixel, size: Size, zoom: u8) {
        let anchor = self.pixel_to_coordinate(px, size);
        self.set_zoom(zoom);
        let res = self.resolution();
        self.center = Coordinate {
            x: anchor.x - (px.0 - size.0 / 2.0) * res,
            y: anchor.y + (px.1 - size.1 / 2.0) * res,
        };
    }
}
