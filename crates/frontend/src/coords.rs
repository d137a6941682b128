/// Convert client (viewport) coordinates to container-relative pixel coordinates.
pub fn client_to_container(
    client_x: f64,
    client_y: f64,
    rect_left: f64,
    rect_top: f64,
) -> (f64, f64) {
    (client_x - rect_left, client_y - rect_top)
}

/// Bounding client rect of an element by id.
pub fn element_rect(id: &str) -> Option<web_sys::DomRect> {
    let document = web_sys::window()?.document()?;
    let element = document.get_element_by_id(id)?;
    Some(element.get_bounding_client_rect())
}

/// Rendered (width, height) of an element, if it has a non-empty box.
pub fn element_size(id: &str) -> Option<(f64, f64)> {
    let rect = element_rect(id)?;
    if rect.width() <= 0.0 || rect.height() <= 0.0 {
        return None;
    }
    Some((rect.width(), rect.height()))
}

/// Map a pointer event's client position into the container's pixel space.
pub fn client_to_viewport_px(client_x: f64, client_y: f64, container_id: &str) -> Option<(f64, f64)> {
    let rect = element_rect(container_id)?;
    Some(client_to_container(client_x, client_y, rect.left(), rect.top()))
}

/// Whether a pointer moved far enough from its press position to count as a drag.
pub fn exceeds_drag_threshold(start: (f64, f64), current: (f64, f64), threshold: f64) -> bool {
    (current.0 - start.0).abs() > threshold || (current.1 - start.1).abs() > threshold
}

pub fn point_distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    let dx = a.0 - b.0;
    let dy = a.1 - b.1;
    (dx * dx + dy * dy).sqrt()
}

pub fn midpoint(a: (f64, f64), b: (f64, f64)) -> (f64, f64) {
    ((a.0 + b.0) / 2.0, (a.1 + b.1) / 2.0)
}

/// Whole zoom levels a pinch has covered since it started.
///
/// Each doubling of the finger distance is one level in, each halving one
/// level out. Distances under a pixel are treated as no pinch at all.
pub fn pinch_zoom_steps(start_distance: f64, distance: f64) -> i32 {
    if start_distance < 1.0 || distance < 1.0 {
        return 0;
    }
    (distance / start_distance).log2().round() as i32
}
