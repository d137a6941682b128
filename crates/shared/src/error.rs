use thiserror::Error;

use crate::layer::LayerId;
use crate::map::InteractionId;
use crate::models::FeatureId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapError {
    #[error("map has been disposed")]
    Disposed,

    #[error("viewport size is not known yet")]
    NoViewport,

    #[error("no layer {0}")]
    UnknownLayer(LayerId),

    #[error("no {0} in layer")]
    UnknownFeature(FeatureId),

    #[error("no interaction {0} attached")]
    UnknownInteraction(InteractionId),
}
