use dioxus::html::geometry::WheelDelta;
use dioxus::html::input_data::MouseButton;
use dioxus::html::TouchPoint;
use dioxus::logger::tracing::warn;
use dioxus::prelude::*;
use otter_shared::config::MapConfig;
use otter_shared::error::MapError;
use otter_shared::models::{Coordinate, Feature, Geometry, GeometryType, LonLat};
use otter_shared::panel::{DrawMode, MapPanel as PanelState};
use otter_shared::proj;
use otter_shared::view::Pixel;

use crate::components::draw_controls::DrawControls;
use crate::coords;

const MAP_CONTAINER_ID: &str = "otter-map-container";

/// Drag threshold in pixels. Movement below this is treated as a click.
const DRAG_THRESHOLD: f64 = 3.0;
/// Drag threshold for a single finger, in pixels.
const TOUCH_DRAG_THRESHOLD: f64 = 8.0;

// --- Overlay style ---

const FEATURE_FILL: &str = "rgba(255,255,255,0.2)";
const FEATURE_STROKE: &str = "black";
const FEATURE_STROKE_WIDTH: f64 = 2.0;
const POINT_RADIUS: f64 = 7.0;
const SKETCH_STROKE: &str = "#3399cc";
const SKETCH_VERTEX_RADIUS: f64 = 4.0;

/// Pointer press in progress, from a mouse button or a single finger.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Gesture {
    start: Pixel,
    last: Pixel,
    /// Movement past this many pixels turns the press into a drag.
    threshold: f64,
    dragged: bool,
    /// A modify interaction grabbed a vertex, so drags move it instead of panning.
    claimed: bool,
}

/// Two-finger pinch in progress.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Pinch {
    start_distance: f64,
    /// Pinch midpoint in viewport pixels, the zoom anchor.
    anchor: Pixel,
    /// Zoom levels already applied during this pinch.
    applied: i32,
}

/// Log a map error and drop it. The panel never recovers from these at runtime.
fn log_err<T>(result: Result<T, MapError>) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            warn!("map operation failed: {e}");
            None
        }
    }
}

/// Convert a wheel delta (pixels / lines / pages) to a uniform pixel-like value.
fn wheel_delta_y(delta: WheelDelta) -> f64 {
    match delta {
        WheelDelta::Pixels(d) => d.y,
        WheelDelta::Lines(d) => d.y * 40.0,
        WheelDelta::Pages(d) => d.y * 400.0,
    }
}

/// One zoom level in for upward scrolling, one out for downward.
/// Purely horizontal scrolling carries no vertical delta and does not zoom.
fn wheel_zoom_step(delta_y: f64) -> Option<i32> {
    if delta_y < 0.0 {
        Some(1)
    } else if delta_y > 0.0 {
        Some(-1)
    } else {
        None
    }
}

/// "lat, lon" with five decimals, longitude wrapped into [-180, 180).
fn format_lon_lat(ll: LonLat) -> String {
    let lon = (ll.lon + 180.0).rem_euclid(360.0) - 180.0;
    format!("{:.5}, {:.5}", ll.lat, lon)
}

/// Push the container's rendered size into the map.
fn sync_size(panel: &mut Signal<PanelState>) -> bool {
    let Some((w, h)) = coords::element_size(MAP_CONTAINER_ID) else {
        return false;
    };
    if (*panel.read()).map().size() == Some((w, h)) {
        return true;
    }
    log_err(panel.write().map_mut().set_size(w, h)).is_some()
}

/// Re-measure the viewport and enable the controls once it has a size.
fn refresh_size(panel: &mut Signal<PanelState>, mounted: &mut Signal<bool>) {
    if sync_size(panel) && !*mounted.peek() {
        mounted.set(true);
    }
}

fn begin_gesture(panel: &mut Signal<PanelState>, px: Pixel, threshold: f64) -> Gesture {
    let claimed = log_err(panel.write().map_mut().pointer_down(px)).unwrap_or(false);
    Gesture {
        start: px,
        last: px,
        threshold,
        dragged: false,
        claimed,
    }
}

/// Drag the grabbed vertex or pan the view once movement passes the threshold.
fn advance_gesture(panel: &mut Signal<PanelState>, g: &mut Gesture, px: Pixel) {
    if !g.dragged && coords::exceeds_drag_threshold(g.start, px, g.threshold) {
        g.dragged = true;
    }
    if g.dragged {
        let mut state = panel.write();
        if g.claimed {
            log_err(state.map_mut().pointer_drag(px));
        } else {
            log_err(state.map_mut().pan_by_pixels(px.0 - g.last.0, px.1 - g.last.1));
        }
        g.last = px;
    }
}

/// Release the press. One that never became a drag is a click at `at`.
fn end_gesture(panel: &mut Signal<PanelState>, g: Gesture, at: Pixel) {
    let mut state = panel.write();
    log_err(state.map_mut().pointer_up());
    if !g.dragged {
        log_err(state.map_mut().click(at));
    }
}

fn touch_px(touch: &TouchPoint) -> Option<Pixel> {
    let client = touch.client_coordinates();
    coords::client_to_viewport_px(client.x, client.y, MAP_CONTAINER_ID)
}

// ---------------------------------------------------------------------------
// SVG builder
// ---------------------------------------------------------------------------

fn points_attr(vertices: &[Coordinate], to_px: &impl Fn(Coordinate) -> Pixel) -> String {
    vertices
        .iter()
        .map(|&c| {
            let (x, y) = to_px(c);
            format!("{x},{y}")
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Build the overlay for features and the unfinished sketch.
/// `to_px` projects map coordinates to viewport pixels.
fn build_svg_content(
    features: &[Feature],
    sketch: Option<(GeometryType, &[Coordinate])>,
    to_px: impl Fn(Coordinate) -> Pixel,
) -> String {
    let mut svg = String::with_capacity(2048);
    for feature in features {
        build_feature(&mut svg, &feature.geometry, &to_px);
    }
    if let Some((kind, vertices)) = sketch {
        build_sketch(&mut svg, kind, vertices, &to_px);
    }
    svg
}

fn build_feature(svg: &mut String, geometry: &Geometry, to_px: &impl Fn(Coordinate) -> Pixel) {
    match geometry {
        Geometry::Point(c) => {
            let (cx, cy) = to_px(*c);
            svg.push_str(&format!(
                r#"<circle cx="{cx}" cy="{cy}" r="{POINT_RADIUS}" fill="{FEATURE_STROKE}"/>"#
            ));
        }
        Geometry::LineString(vertices) => {
            let points = points_attr(vertices, to_px);
            svg.push_str(&format!(
                r#"<polyline points="{points}" fill="none" stroke="{FEATURE_STROKE}" stroke-width="{FEATURE_STROKE_WIDTH}"/>"#
            ));
        }
        Geometry::Polygon(ring) => {
            let points = points_attr(ring, to_px);
            svg.push_str(&format!(
                r#"<polygon points="{points}" fill="{FEATURE_FILL}" stroke="{FEATURE_STROKE}" stroke-width="{FEATURE_STROKE_WIDTH}"/>"#
            ));
        }
    }
}

fn build_sketch(
    svg: &mut String,
    kind: GeometryType,
    vertices: &[Coordinate],
    to_px: &impl Fn(Coordinate) -> Pixel,
) {
    if vertices.len() >= 2 {
        let points = points_attr(vertices, to_px);
        let fill = if kind == GeometryType::Polygon { FEATURE_FILL } else { "none" };
        svg.push_str(&format!(
            r#"<polyline points="{points}" fill="{fill}" stroke="{SKETCH_STROKE}" stroke-width="{FEATURE_STROKE_WIDTH}" stroke-dasharray="6 4"/>"#
        ));
    }
    for &v in vertices {
        let (cx, cy) = to_px(v);
        svg.push_str(&format!(
            r#"<circle cx="{cx}" cy="{cy}" r="{SKETCH_VERTEX_RADIUS}" fill="{SKETCH_STROKE}" stroke="white" stroke-width="1"/>"#
        ));
    }
}

// ---------------------------------------------------------------------------
// Component
// ---------------------------------------------------------------------------

#[component]
pub fn MapPanel() -> Element {
    let config = MapConfig::default();
    let height_px = config.viewport_height_px;
    let mut panel = use_signal(move || PanelState::mount(&config));

    // Controls stay disabled until the viewport has a measured size
    let mut mounted = use_signal(|| false);
    let mut gesture = use_signal(|| None::<Gesture>);
    let mut pinch = use_signal(|| None::<Pinch>);
    let mut cursor = use_signal(|| None::<LonLat>);

    use_drop(move || {
        if let Ok(mut state) = panel.try_write() {
            state.teardown();
        }
    });

    // Snapshot everything rendering needs, then release the read guard
    let (tiles, svg_html, active_mode, pin_label) = {
        let state = panel.read();
        let map = (*state).map();
        let source = map.tile_source();
        let tiles: Vec<(String, String, f64, f64)> = map
            .tiles()
            .into_iter()
            .map(|t| {
                let key = format!("{}/{}/{}@{}", t.id.z, t.id.x, t.id.y, t.left);
                (key, source.url(t.id), t.left, t.top)
            })
            .collect();

        let svg_html = match (map.size(), state.layer()) {
            (Some(size), Ok(layer)) => {
                let view = *map.view();
                let content = build_svg_content(layer.features(), map.sketch(), |c| {
                    view.coordinate_to_pixel(c, size)
                });
                format!(
                    r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" style="position:absolute;top:0;left:0;pointer-events:none;z-index:5;">{content}</svg>"#,
                    w = size.0,
                    h = size.1,
                )
            }
            _ => String::new(),
        };
        (tiles, svg_html, state.draw_mode(), state.pin_label())
    };

    let is_mounted = *mounted.read();
    let readout = (*cursor.read()).map(format_lon_lat);
    let container_class = match *gesture.read() {
        Some(g) if g.dragged && !g.claimed => "map-container dragging",
        _ => "map-container",
    };

    rsx! {
        div { class: "map-panel",
            div {
                id: MAP_CONTAINER_ID,
                class: "{container_class}",
                style: "height: {height_px}px;",

                onmounted: move |_| refresh_size(&mut panel, &mut mounted),

                // The container is 90% of the page wide, so window resizes reach it
                onresize: move |_evt: Event<ResizeData>| refresh_size(&mut panel, &mut mounted),

                onwheel: move |evt: Event<WheelData>| {
                    evt.prevent_default();
                    let Some(delta) = wheel_zoom_step(wheel_delta_y(evt.data().delta())) else {
                        return;
                    };
                    let client = evt.data().client_coordinates();
                    let Some(px) = coords::client_to_viewport_px(client.x, client.y, MAP_CONTAINER_ID) else {
                        return;
                    };
                    log_err(panel.write().map_mut().zoom_by(px, delta));
                },

                onmousedown: move |evt: Event<MouseData>| {
                    if evt.trigger_button() != Some(MouseButton::Primary) {
                        return;
                    }
                    refresh_size(&mut panel, &mut mounted);
                    let client = evt.client_coordinates();
                    let Some(px) = coords::client_to_viewport_px(client.x, client.y, MAP_CONTAINER_ID) else {
                        return;
                    };
                    gesture.set(Some(begin_gesture(&mut panel, px, DRAG_THRESHOLD)));
                },

                onmousemove: move |evt: Event<MouseData>| {
                    let client = evt.client_coordinates();
                    let Some(px) = coords::client_to_viewport_px(client.x, client.y, MAP_CONTAINER_ID) else {
                        return;
                    };
                    let current = *gesture.peek();
                    if let Some(mut g) = current {
                        advance_gesture(&mut panel, &mut g, px);
                        gesture.set(Some(g));
                    }
                    let at = (*panel.peek()).map().pixel_to_coordinate(px).ok();
                    cursor.set(at.map(proj::to_lon_lat));
                },

                onmouseup: move |evt: Event<MouseData>| {
                    let Some(g) = gesture.write().take() else {
                        return;
                    };
                    let client = evt.client_coordinates();
                    let at = coords::client_to_viewport_px(client.x, client.y, MAP_CONTAINER_ID)
                        .unwrap_or(g.last);
                    end_gesture(&mut panel, g, at);
                },

                onmouseleave: move |_| {
                    cursor.set(None);
                    if gesture.write().take().is_some() {
                        log_err(panel.write().map_mut().pointer_up());
                    }
                },

                ondoubleclick: move |evt: Event<MouseData>| {
                    evt.prevent_default();
                    log_err(panel.write().map_mut().double_click());
                },

                // --- Touch: one finger presses like the primary button, two pinch-zoom ---

                ontouchstart: move |evt: Event<TouchData>| {
                    evt.prevent_default();
                    refresh_size(&mut panel, &mut mounted);
                    let touches = evt.data().touches();
                    if touches.len() == 1 {
                        if pinch.peek().is_some() {
                            return;
                        }
                        let Some(px) = touch_px(&touches[0]) else {
                            return;
                        };
                        gesture.set(Some(begin_gesture(&mut panel, px, TOUCH_DRAG_THRESHOLD)));
                    } else if touches.len() >= 2 {
                        // A second finger turns any press into a pinch
                        if gesture.write().take().is_some() {
                            log_err(panel.write().map_mut().pointer_up());
                        }
                        let (Some(p0), Some(p1)) = (touch_px(&touches[0]), touch_px(&touches[1])) else {
                            return;
                        };
                        pinch.set(Some(Pinch {
                            start_distance: coords::point_distance(p0, p1),
                            anchor: coords::midpoint(p0, p1),
                            applied: 0,
                        }));
                    }
                },

                ontouchmove: move |evt: Event<TouchData>| {
                    evt.prevent_default();
                    let touches = evt.data().touches();
                    let current = *pinch.peek();
                    if let Some(mut p) = current {
                        if touches.len() < 2 {
                            return;
                        }
                        let (Some(p0), Some(p1)) = (touch_px(&touches[0]), touch_px(&touches[1])) else {
                            return;
                        };
                        let steps = coords::pinch_zoom_steps(p.start_distance, coords::point_distance(p0, p1));
                        if steps != p.applied {
                            log_err(panel.write().map_mut().zoom_by(p.anchor, steps - p.applied));
                            p.applied = steps;
                            pinch.set(Some(p));
                        }
                    } else if touches.len() == 1 {
                        let Some(mut g) = *gesture.peek() else {
                            return;
                        };
                        let Some(px) = touch_px(&touches[0]) else {
                            return;
                        };
                        advance_gesture(&mut panel, &mut g, px);
                        gesture.set(Some(g));
                    }
                },

                ontouchend: move |evt: Event<TouchData>| {
                    evt.prevent_default();
                    if !evt.data().touches().is_empty() {
                        return;
                    }
                    // Wait for every finger to lift before ending a pinch
                    if pinch.write().take().is_some() {
                        return;
                    }
                    if let Some(g) = gesture.write().take() {
                        end_gesture(&mut panel, g, g.last);
                    }
                },

                ontouchcancel: move |_evt: Event<TouchData>| {
                    pinch.set(None);
                    if gesture.write().take().is_some() {
                        log_err(panel.write().map_mut().pointer_up());
                    }
                },

                for (key, url, left, top) in tiles {
                    img {
                        key: "{key}",
                        class: "tile",
                        src: "{url}",
                        draggable: "false",
                        style: "left: {left}px; top: {top}px;",
                    }
                }

                div {
                    class: "overlay",
                    dangerous_inner_html: "{svg_html}",
                }

                if let Some(text) = readout {
                    div { class: "coord-readout", "{text}" }
                }

                div { class: "attribution", "© OpenStreetMap contributors" }
            }

            DrawControls {
                active_mode: active_mode,
                pin_label: pin_label,
                enabled: is_mounted,
                on_draw: move |mode: DrawMode| {
                    log_err(panel.write().set_draw_mode(mode));
                },
                on_toggle_pin: move |_| {
                    log_err(panel.write().toggle_pin());
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use otter_shared::models::FeatureId;

    fn identity(c: Coordinate) -> Pixel {
        (c.x, c.y)
    }

    fn feature(id: u64, geometry: Geometry) -> Feature {
        Feature {
            id: FeatureId(id),
            geometry,
        }
    }

    #[test]
    fn test_point_renders_black_circle() {
        let features = vec![feature(0, Geometry::Point(Coordinate::new(10.0, 20.0)))];
        let svg = build_svg_content(&features, None, identity);
        assert!(svg.contains(r#"cx="10""#));
        assert!(svg.contains(r#"cy="20""#));
        assert!(svg.contains(r#"r="7""#));
        assert!(svg.contains(r#"fill="black""#));
    }

    #[test]
    fn test_line_renders_unfilled_polyline() {
        let features = vec![feature(
            0,
            Geometry::LineString(vec![Coordinate::new(0.0, 0.0), Coordinate::new(5.0, 5.0)]),
        )];
        let svg = build_svg_content(&features, None, identity);
        assert!(svg.contains(r#"<polyline points="0,0 5,5""#));
        assert!(svg.contains(r#"fill="none""#));
    }

    #[test]
    fn test_polygon_renders_translucent_fill() {
        let features = vec![feature(
            0,
            Geometry::Polygon(vec![
                Coordinate::new(0.0, 0.0),
                Coordinate::new(5.0, 0.0),
                Coordinate::new(5.0, 5.0),
            ]),
        )];
        let svg = build_svg_content(&features, None, identity);
        assert!(svg.starts_with("<polygon"));
        assert!(svg.contains(FEATURE_FILL));
    }

    #[test]
    fn test_sketch_with_one_vertex_draws_only_vertex() {
        let sketch = [Coordinate::new(3.0, 4.0)];
        let svg = build_svg_content(&[], Some((GeometryType::LineString, &sketch[..])), identity);
        assert!(!svg.contains("<polyline"));
        assert_eq!(svg.matches("<circle").count(), 1);
        assert!(svg.contains(SKETCH_STROKE));
    }

    #[test]
    fn test_sketch_line_is_dashed() {
        let sketch = [Coordinate::new(0.0, 0.0), Coordinate::new(1.0, 1.0)];
        let svg = build_svg_content(&[], Some((GeometryType::Polygon, &sketch[..])), identity);
        assert!(svg.contains("stroke-dasharray"));
        assert_eq!(svg.matches("<circle").count(), 2);
    }

    #[test]
    fn test_projection_is_applied() {
        let features = vec![feature(0, Geometry::Point(Coordinate::new(1.0, 1.0)))];
        let svg = build_svg_content(&features, None, |c| (c.x * 100.0, c.y * 50.0));
        assert!(svg.contains(r#"cx="100""#));
        assert!(svg.contains(r#"cy="50""#));
    }

    #[test]
    fn test_empty_layer_renders_nothing() {
        assert!(build_svg_content(&[], None, identity).is_empty());
    }

    #[test]
    fn test_wheel_without_vertical_delta_does_not_zoom() {
        assert_eq!(wheel_zoom_step(0.0), None);
        assert_eq!(wheel_zoom_step(-0.0), None);
    }

    #[test]
    fn test_wheel_direction() {
        assert_eq!(wheel_zoom_step(-120.0), Some(1));
        assert_eq!(wheel_zoom_step(3.0), Some(-1));
    }

    #[test]
    fn test_readout_wraps_longitude() {
        assert_eq!(format_lon_lat(LonLat { lon: 77.0, lat: 28.45 }), "28.45000, 77.00000");
        assert_eq!(format_lon_lat(LonLat { lon: 190.0, lat: -10.0 }), "-10.00000, -170.00000");
    }
}
