use tracing::debug;

use crate::error::MapError;
use crate::interaction::Interaction;
use crate::layer::{FeatureLayer, LayerId};
use crate::models::{Coordinate, FeatureId, GeometryType};
use crate::tile::{visible_tiles, TilePlacement, TileSource};
use crate::view::{Pixel, Size, View};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InteractionId(pub u64);

impl std::fmt::Display for InteractionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "interaction#{}", self.0)
    }
}

/// Map surface: a view over a tiled base layer, vector overlays, and the
/// pointer interactions attached to them.
///
/// Interactions see pointer input newest-first. Every operation on a
/// disposed map fails with [`MapError::Disposed`].
#[derive(Debug)]
pub struct Map {
    view: View,
    size: Option<Size>,
    base: TileSource,
    layers: Vec<(LayerId, FeatureLayer)>,
    interactions: Vec<(InteractionId, Interaction)>,
    next_layer: u32,
    next_interaction: u64,
    disposed: bool,
}

impl Map {
    pub fn new(view: View, base: TileSource) -> Self {
        Map {
            view,
            size: None,
            base,
            layers: Vec::new(),
            interactions: Vec::new(),
            next_layer: 0,
            next_interaction: 0,
            disposed: false,
        }
    }

    fn ensure_live(&self) -> Result<(), MapError> {
        if self.disposed {
            Err(MapError::Disposed)
        } else {
            Ok(())
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Detach all interactions and drop all layers. Idempotent.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        debug!(
            interactions = self.interactions.len(),
            layers = self.layers.len(),
            "disposing map"
        );
        self.interactions.clear();
        self.layers.clear();
        self.disposed = true;
    }

    // --- viewport ---

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut View {
        &mut self.view
    }

    pub fn size(&self) -> Option<Size> {
        self.size
    }

    /// Record the rendered viewport size. Pixel input is rejected until this is called.
    pub fn set_size(&mut self, width: f64, height: f64) -> Result<(), MapError> {
        self.ensure_live()?;
        self.size = Some((width, height));
        Ok(())
    }

    fn live_size(&self) -> Result<Size, MapError> {
        self.ensure_live()?;
        self.size.ok_or(MapError::NoViewport)
    }

    pub fn tile_source(&self) -> &TileSource {
        &self.base
    }

    /// Base-layer tiles covering the viewport, empty until the size is known.
    pub fn tiles(&self) -> Vec<TilePlacement> {
        match self.size {
            Some(size) if !self.disposed => visible_tiles(&self.view, size),
            _ => Vec::new(),
        }
    }

    pub fn pixel_to_coordinate(&self, px: Pixel) -> Result<Coordinate, MapError> {
        let size = self.live_size()?;
        Ok(self.view.pixel_to_coordinate(px, size))
    }

    pub fn coordinate_to_pixel(&self, c: Coordinate) -> Result<Pixel, MapError> {
        let size = self.live_size()?;
        Ok(self.view.coordinate_to_pixel(c, size))
    }

    pub fn pan_by_pixels(&mut self, dx: f64, dy: f64) -> Result<(), MapError> {
        self.ensure_live()?;
        self.view.pan_by_pixels(dx, dy);
        Ok(())
    }

    /// Step the zoom level by `delta`, anchored at `px`.
    pub fn zoom_by(&mut self, px: Pixel, delta: i32) -> Result<(), MapError> {
        let size = self.live_size()?;
        let zoom = (self.view.zoom() as i32 + delta).clamp(0, u8::MAX as i32) as u8;
        self.view.zoom_at(px, size, zoom);
        Ok(())
    }

    // --- layers ---

    pub fn add_layer(&mut self, layer: FeatureLayer) -> Result<LayerId, MapError> {
        self.ensure_live()?;
        let id = LayerId(self.next_layer);
        self.next_layer += 1;
        self.layers.push((id, layer));
        Ok(id)
    }

    pub fn layer(&self, id: LayerId) -> Result<&FeatureLayer, MapError> {
        self.ensure_live()?;
        find_layer(&self.layers, id).ok_or(MapError::UnknownLayer(id))
    }

    pub fn layer_mut(&mut self, id: LayerId) -> Result<&mut FeatureLayer, MapError> {
        self.ensure_live()?;
        find_layer_mut(&mut self.layers, id).ok_or(MapError::UnknownLayer(id))
    }

    // --- interactions ---

    pub fn add_interaction(&mut self, interaction: Interaction) -> Result<InteractionId, MapError> {
        self.ensure_live()?;
        let source = interaction.source();
        if find_layer(&self.layers, source).is_none() {
            return Err(MapError::UnknownLayer(source));
        }
        let id = InteractionId(self.next_interaction);
        self.next_interaction += 1;
        debug!(%id, ?interaction, "attaching interaction");
        self.interactions.push((id, interaction));
        Ok(id)
    }

    pub fn remove_interaction(&mut self, id: InteractionId) -> Result<Interaction, MapError> {
        self.ensure_live()?;
        let idx = self
            .interactions
            .iter()
            .position(|(iid, _)| *iid == id)
            .ok_or(MapError::UnknownInteraction(id))?;
        debug!(%id, "detaching interaction");
        Ok(self.interactions.remove(idx).1)
    }

    pub fn interactions(&self) -> impl Iterator<Item = (InteractionId, &Interaction)> {
        self.interactions.iter().map(|(id, i)| (*id, i))
    }

    pub fn interaction_count(&self) -> usize {
        self.interactions.len()
    }

    pub fn draw_interactions(&self) -> impl Iterator<Item = (InteractionId, &Interaction)> {
        self.interactions().filter(|(_, i)| i.is_draw())
    }

    /// The newest unfinished sketch, for rendering.
    pub fn sketch(&self) -> Option<(GeometryType, &[Coordinate])> {
        self.interactions
            .iter()
            .rev()
            .filter_map(|(_, i)| i.as_draw())
            .find(|d| !d.sketch().is_empty())
            .map(|d| (d.kind(), d.sketch()))
    }

    // --- pointer dispatch ---

    fn snapped(&self, at: Coordinate) -> Coordinate {
        let res = self.view.resolution();
        for (_, interaction) in self.interactions.iter().rev() {
            if let Interaction::Snap { source, snap } = interaction {
                let Some(layer) = find_layer(&self.layers, *source) else {
                    continue;
                };
                if let Some(c) = snap.snap(layer, at, snap.pixel_tolerance() * res) {
                    return c;
                }
            }
        }
        at
    }

    /// Offer a pointer press to modify interactions. Returns whether one
    /// grabbed a vertex and so owns the following drag.
    pub fn pointer_down(&mut self, px: Pixel) -> Result<bool, MapError> {
        let at = self.pixel_to_coordinate(px)?;
        let res = self.view.resolution();
        let Map {
            interactions,
            layers,
            ..
        } = self;
        for (_, interaction) in interactions.iter_mut().rev() {
            if let Interaction::Modify { source, modify } = interaction {
                let Some(layer) = find_layer(layers, *source) else {
                    continue;
                };
                if modify.press(layer, at, modify.pixel_tolerance() * res) {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    /// Move any grabbed vertex. Returns whether a vertex moved.
    pub fn pointer_drag(&mut self, px: Pixel) -> Result<bool, MapError> {
        let at = self.pixel_to_coordinate(px)?;
        let Map {
            interactions,
            layers,
            ..
        } = self;
        for (_, interaction) in interactions.iter_mut().rev() {
            if let Interaction::Modify { source, modify } = interaction {
                let Some(layer) = find_layer_mut(layers, *source) else {
                    continue;
                };
                if modify.drag(layer, at)? {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    pub fn pointer_up(&mut self) -> Result<bool, MapError> {
        self.ensure_live()?;
        let mut released = false;
        for (_, interaction) in self.interactions.iter_mut() {
            if let Interaction::Modify { modify, .. } = interaction {
                released |= modify.release();
            }
        }
        Ok(released)
    }

    /// Feed a click to the newest draw interaction. Returns the id of the
    /// feature it completed, if any.
    pub fn click(&mut self, px: Pixel) -> Result<Option<FeatureId>, MapError> {
        let at = self.snapped(self.pixel_to_coordinate(px)?);
        let res = self.view.resolution();
        let Map {
            interactions,
            layers,
            ..
        } = self;
        let Some((source, draw)) = interactions.iter_mut().rev().find_map(|(_, i)| match i {
            Interaction::Draw { source, draw } => Some((*source, draw)),
            _ => None,
        }) else {
            return Ok(None);
        };
        let Some(geometry) = draw.click(at, draw.finish_tolerance_px() * res) else {
            return Ok(None);
        };
        let layer = find_layer_mut(layers, source).ok_or(MapError::UnknownLayer(source))?;
        let id = layer.add_feature(geometry);
        debug!(%id, %source, "drawn feature added");
        Ok(Some(id))
    }

    /// Finish the newest draw interaction's sketch.
    pub fn double_click(&mut self) -> Result<Option<FeatureId>, MapError> {
        self.ensure_live()?;
        let Map {
            interactions,
            layers,
            ..
        } = self;
        let Some((source, draw)) = interactions.iter_mut().rev().find_map(|(_, i)| match i {
            Interaction::Draw { source, draw } => Some((*source, draw)),
            _ => None,
        }) else {
            return Ok(None);
        };
        let Some(geometry) = draw.finish() else {
            return Ok(None);
        };
        let layer = find_layer_mut(layers, source).ok_or(MapError::UnknownLayer(source))?;
        let id = layer.add_feature(geometry);
        debug!(%id, %source, "drawn feature added");
        Ok(Some(id))
    }
}

fn find_layer(layers: &[(LayerId, FeatureLayer)], id: LayerId) -> Option<&FeatureLayer> {
    layers.iter().find(|(lid, _)| *lid == id).map(|(_, l)| l)
}

fn find_layer_mut(layers: &mut [(LayerId, FeatureLayer)], id: LayerId) -> Option<&mut FeatureLayer> {
    layers.iter_mut().find(|(lid, _)| *lid == id).map(|(_, l)| l)
}
