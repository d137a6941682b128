//! Map panel state: the map handle, its feature layer, the draw mode, the
//! interactions attached for that mode, and the optional pin.
//!
//! Every setter ends in [`MapPanel::reconcile`], which is the only place
//! interactions are attached or detached.

use tracing::{debug, info};

use crate::config::MapConfig;
use crate::error::MapError;
use crate::interaction::{Draw, Interaction, Modify, Snap};
use crate::layer::{FeatureLayer, LayerId};
use crate::map::{InteractionId, Map};
use crate::models::{FeatureId, Geometry, GeometryType};
use crate::proj;
use crate::tile::TileSource;
use crate::view::View;

pub const DROP_PIN_LABEL: &str = "Drop Pin";
pub const REMOVE_PIN_LABEL: &str = "Remove Pin";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawMode {
    #[default]
    None,
    Point,
    Line,
    Polygon,
}

impl DrawMode {
    /// The three modes offered as controls, in display order.
    pub const CONTROLS: [DrawMode; 3] = [DrawMode::Point, DrawMode::Line, DrawMode::Polygon];

    pub fn geometry_type(self) -> Option<GeometryType> {
        match self {
            DrawMode::None => None,
            DrawMode::Point => Some(GeometryType::Point),
            DrawMode::Line => Some(GeometryType::LineString),
            DrawMode::Polygon => Some(GeometryType::Polygon),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DrawMode::None => "Idle",
            DrawMode::Point => "Draw Point",
            DrawMode::Line => "Draw Line",
            DrawMode::Polygon => "Draw Polygon",
        }
    }
}

/// Interactions attached for one draw mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ActiveDraw {
    kind: GeometryType,
    draw: InteractionId,
    modify: InteractionId,
    snap: InteractionId,
}

#[derive(Debug)]
pub struct MapPanel {
    map: Map,
    layer: LayerId,
    draw_mode: DrawMode,
    active: Option<ActiveDraw>,
    pin: Option<FeatureId>,
    config: MapConfig,
}

impl MapPanel {
    /// Build the map and its feature layer. The panel starts idle.
    pub fn mount(config: &MapConfig) -> Self {
        let view = View::new(proj::from_lon_lat(config.center_lon_lat()), config.zoom);
        let mut map = Map::new(view, TileSource::new(config.tile_url.clone()));
        // A fresh map is never disposed, so this cannot fail.
        let layer = map.add_layer(FeatureLayer::new()).unwrap_or(LayerId(0));
        debug!(zoom = config.zoom, center = ?config.center, "map panel mounted");
        MapPanel {
            map,
            layer,
            draw_mode: DrawMode::None,
            active: None,
            pin: None,
            config: config.clone(),
        }
    }

    pub fn map(&self) -> &Map {
        &self.map
    }

    pub fn map_mut(&mut self) -> &mut Map {
        &mut self.map
    }

    pub fn layer_id(&self) -> LayerId {
        self.layer
    }

    pub fn layer(&self) -> Result<&FeatureLayer, MapError> {
        self.map.layer(self.layer)
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn draw_mode(&self) -> DrawMode {
        self.draw_mode
    }

    /// Geometry type of the attached draw interaction, if any.
    pub fn active_geometry_type(&self) -> Option<GeometryType> {
        self.active.map(|a| a.kind)
    }

    pub fn has_pin(&self) -> bool {
        self.pin.is_some()
    }

    pub fn pin(&self) -> Option<FeatureId> {
        self.pin
    }

    pub fn pin_label(&self) -> &'static str {
        if self.has_pin() {
            REMOVE_PIN_LABEL
        } else {
            DROP_PIN_LABEL
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.map.is_disposed()
    }

    pub fn set_draw_mode(&mut self, mode: DrawMode) -> Result<(), MapError> {
        if self.map.is_disposed() {
            return Err(MapError::Disposed);
        }
        debug!(mode = mode.label(), "draw mode selected");
        self.draw_mode = mode;
        self.reconcile()
    }

    /// Bring the attached interactions in line with the draw mode.
    ///
    /// The old set is fully detached before the new one is attached, so at
    /// most one draw interaction exists at any time. Detaching is best-effort:
    /// a handler that is already gone does not stop its companions from
    /// being removed.
    pub fn reconcile(&mut self) -> Result<(), MapError> {
        let desired = self.draw_mode.geometry_type();
        if desired == self.active.map(|a| a.kind) {
            return Ok(());
        }

        if let Some(old) = self.active {
            debug!(kind = %old.kind, "detaching draw interactions");
            let mut failure = None;
            for id in [old.draw, old.modify, old.snap] {
                match self.map.remove_interaction(id) {
                    Ok(_) => {}
                    Err(MapError::UnknownInteraction(id)) => {
                        debug!(%id, "interaction already detached");
                    }
                    Err(e) => {
                        failure.get_or_insert(e);
                    }
                }
            }
            self.active = None;
            if let Some(e) = failure {
                return Err(e);
            }
        }

        let Some(kind) = desired else {
            return Ok(());
        };
        let source = self.layer;
        let draw = self.map.add_interaction(Interaction::Draw {
            source,
            draw: Draw::new(kind).with_finish_tolerance(self.config.finish_tolerance),
        })?;
        let modify = self.map.add_interaction(Interaction::Modify {
            source,
            modify: Modify::new().with_pixel_tolerance(self.config.pixel_tolerance),
        })?;
        let snap = self.map.add_interaction(Interaction::Snap {
            source,
            snap: Snap::new().with_pixel_tolerance(self.config.pixel_tolerance),
        })?;
        debug!(%kind, "draw interactions attached");
        self.active = Some(ActiveDraw {
            kind,
            draw,
            modify,
            snap,
        });
        Ok(())
    }

    /// Add the pin if absent, remove it if present. Returns whether a pin now exists.
    pub fn toggle_pin(&mut self) -> Result<bool, MapError> {
        let layer = self.map.layer_mut(self.layer)?;
        match self.pin.take() {
            Some(id) => {
                layer.remove_feature(id)?;
                info!(%id, "pin removed");
                Ok(false)
            }
            None => {
                let at = proj::from_lon_lat(self.config.pin_lon_lat());
                let id = layer.add_feature(Geometry::Point(at));
                self.pin = Some(id);
                info!(%id, "pin dropped");
                Ok(true)
            }
        }
    }

    /// Detach every interaction and dispose the map. Idempotent.
    pub fn teardown(&mut self) {
        if self.map.is_disposed() {
            return;
        }
        self.draw_mode = DrawMode::None;
        if let Err(e) = self.reconcile() {
            tracing::warn!("detaching interactions on teardown: {e}");
        }
        self.active = None;
        self.pin = None;
        self.map.dispose();
        debug!("map panel torn down");
    }
}

impl Drop for MapPanel {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mounted() -> MapPanel {
        let mut panel = MapPanel::mount(&MapConfig::default());
        panel.map_mut().set_size(800.0, 400.0).unwrap();
        panel
    }

    fn pin_count(panel: &MapPanel) -> usize {
        let pin_at = proj::from_lon_lat(panel.config().pin_lon_lat());
        panel
            .layer()
            .unwrap()
            .features()
            .iter()
            .filter(|f| f.geometry == Geometry::Point(pin_at))
            .count()
    }

    fn draw_kinds(panel: &MapPanel) -> Vec<GeometryType> {
        panel
            .map()
            .draw_interactions()
            .filter_map(|(_, i)| i.as_draw().map(|d| d.kind()))
            .collect()
    }

    #[test]
    fn test_fresh_mount_is_idle_at_default_view() {
        let panel = MapPanel::mount(&MapConfig::default());
        assert_eq!(panel.draw_mode(), DrawMode::None);
        assert_eq!(panel.map().interaction_count(), 0);
        assert!(!panel.has_pin());
        assert_eq!(panel.pin_label(), "Drop Pin");

        let view = panel.map().view();
        let expected = proj::from_lon_lat(crate::models::LonLat { lon: 77.0, lat: 28.45 });
        assert_eq!(view.zoom(), 10);
        assert!((view.center.x - expected.x).abs() < 1e-6);
        assert!((view.center.y - expected.y).abs() < 1e-6);
    }

    #[test]
    fn test_draw_mode_attaches_draw_modify_snap() {
        let mut panel = mounted();
        panel.set_draw_mode(DrawMode::Line).unwrap();
        let map = panel.map();
        assert_eq!(map.interaction_count(), 3);
        assert_eq!(map.interactions().filter(|(_, i)| i.is_draw()).count(), 1);
        assert_eq!(map.interactions().filter(|(_, i)| i.is_modify()).count(), 1);
        assert_eq!(map.interactions().filter(|(_, i)| i.is_snap()).count(), 1);
        assert!(map.interactions().all(|(_, i)| i.source() == panel.layer_id()));
        assert_eq!(panel.active_geometry_type(), Some(GeometryType::LineString));
    }

    #[test]
    fn test_point_then_polygon_leaves_single_polygon_handler() {
        let mut panel = mounted();
        panel.set_draw_mode(DrawMode::Point).unwrap();
        panel.set_draw_mode(DrawMode::Polygon).unwrap();
        assert_eq!(draw_kinds(&panel), vec![GeometryType::Polygon]);
        assert_eq!(panel.map().interaction_count(), 3);
    }

    #[test]
    fn test_many_mode_switches_never_leak_handlers() {
        let mut panel = mounted();
        let modes = [DrawMode::Point, DrawMode::Line, DrawMode::Polygon];
        for i in 0..50 {
            panel.set_draw_mode(modes[i % 3]).unwrap();
            assert_eq!(draw_kinds(&panel).len(), 1);
            assert_eq!(panel.map().interaction_count(), 3);
        }
        let last = modes[49 % 3].geometry_type().unwrap();
        assert_eq!(last, GeometryType::LineString);
        assert_eq!(draw_kinds(&panel), vec![last]);
    }

    #[test]
    fn test_switch_after_externally_removed_draw_still_detaches_companions() {
        let mut panel = mounted();
        panel.set_draw_mode(DrawMode::Point).unwrap();
        let draw_id = panel.map().draw_interactions().map(|(id, _)| id).next().unwrap();
        panel.map_mut().remove_interaction(draw_id).unwrap();
        assert_eq!(panel.map().interaction_count(), 2);

        panel.set_draw_mode(DrawMode::Line).unwrap();
        assert_eq!(panel.map().interaction_count(), 3);
        assert_eq!(draw_kinds(&panel), vec![GeometryType::LineString]);
        assert_eq!(panel.map().interactions().filter(|(_, i)| i.is_modify()).count(), 1);
        assert_eq!(panel.map().interactions().filter(|(_, i)| i.is_snap()).count(), 1);

        panel.set_draw_mode(DrawMode::Polygon).unwrap();
        assert_eq!(panel.map().interaction_count(), 3);
        assert_eq!(draw_kinds(&panel), vec![GeometryType::Polygon]);
    }

    #[test]
    fn test_same_mode_click_keeps_sketch() {
        let mut panel = mounted();
        panel.set_draw_mode(DrawMode::Line).unwrap();
        panel.map_mut().click((100.0, 100.0)).unwrap();
        let before: Vec<_> = panel.map().interactions().map(|(id, _)| id).collect();
        panel.set_draw_mode(DrawMode::Line).unwrap();
        let after: Vec<_> = panel.map().interactions().map(|(id, _)| id).collect();
        assert_eq!(before, after);
        assert!(panel.map().sketch().is_some());
    }

    #[test]
    fn test_switching_mode_discards_sketch() {
        let mut panel = mounted();
        panel.set_draw_mode(DrawMode::Polygon).unwrap();
        panel.map_mut().click((100.0, 100.0)).unwrap();
        panel.set_draw_mode(DrawMode::Line).unwrap();
        assert!(panel.map().sketch().is_none());
    }

    #[test]
    fn test_none_mode_detaches_everything() {
        let mut panel = mounted();
        panel.set_draw_mode(DrawMode::Polygon).unwrap();
        panel.set_draw_mode(DrawMode::None).unwrap();
        assert_eq!(panel.map().interaction_count(), 0);
        assert_eq!(panel.active_geometry_type(), None);
    }

    #[test]
    fn test_mode_labels() {
        let labels: Vec<_> = DrawMode::CONTROLS.iter().map(|m| m.label()).collect();
        assert_eq!(labels, ["Draw Point", "Draw Line", "Draw Polygon"]);
        assert_eq!(DrawMode::default().label(), "Idle");
    }

    #[test]
    fn test_drop_pin_adds_one_point_and_flips_label() {
        let mut panel = mounted();
        assert!(panel.toggle_pin().unwrap());
        assert_eq!(pin_count(&panel), 1);
        assert_eq!(panel.layer().unwrap().len(), 1);
        assert_eq!(panel.pin_label(), "Remove Pin");
    }

    #[test]
    fn test_second_toggle_removes_pin() {
        let mut panel = mounted();
        panel.toggle_pin().unwrap();
        assert!(!panel.toggle_pin().unwrap());
        assert_eq!(pin_count(&panel), 0);
        assert!(panel.layer().unwrap().is_empty());
        assert_eq!(panel.pin_label(), "Drop Pin");
    }

    #[test]
    fn test_repeated_toggles_keep_at_most_one_pin() {
        let mut panel = mounted();
        for _ in 0..25 {
            panel.toggle_pin().unwrap();
            assert_eq!(pin_count(&panel), 1);
            panel.toggle_pin().unwrap();
            assert_eq!(pin_count(&panel), 0);
        }
        panel.toggle_pin().unwrap();
        assert_eq!(pin_count(&panel), 1);
    }

    #[test]
    fn test_pin_toggle_leaves_drawn_features_alone() {
        let mut panel = mounted();
        panel.set_draw_mode(DrawMode::Point).unwrap();
        panel.map_mut().click((10.0, 10.0)).unwrap();
        panel.toggle_pin().unwrap();
        panel.toggle_pin().unwrap();
        assert_eq!(panel.layer().unwrap().len(), 1);
        assert_eq!(draw_kinds(&panel), vec![GeometryType::Point]);
    }

    #[test]
    fn test_moved_pin_is_still_removed() {
        let mut panel = mounted();
        panel.set_draw_mode(DrawMode::Point).unwrap();
        panel.toggle_pin().unwrap();
        // Pin sits at the view center, which is the viewport middle
        assert!(panel.map_mut().pointer_down((400.0, 200.0)).unwrap());
        panel.map_mut().pointer_drag((500.0, 250.0)).unwrap();
        panel.map_mut().pointer_up().unwrap();
        panel.toggle_pin().unwrap();
        assert!(panel.layer().unwrap().is_empty());
    }

    #[test]
    fn test_teardown_releases_everything() {
        let mut panel = mounted();
        panel.set_draw_mode(DrawMode::Polygon).unwrap();
        panel.toggle_pin().unwrap();
        panel.teardown();

        assert!(panel.is_disposed());
        assert_eq!(panel.map().interaction_count(), 0);
        assert_eq!(panel.map_mut().click((400.0, 200.0)), Err(MapError::Disposed));
        assert_eq!(panel.set_draw_mode(DrawMode::Point), Err(MapError::Disposed));
        assert_eq!(panel.toggle_pin(), Err(MapError::Disposed));
        panel.teardown();
    }
}
