use serde::{Deserialize, Serialize};
use vexel_store::StoreConfig;
use vexel_types::Color;

/// Largest number of layers a drawing can hold; layer ids are one byte.
pub const MAX_LAYERS: usize = 255;

/// Configuration for a new [`Drawing`](crate::Drawing).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DrawingConfig {
    pub name: String,
    /// Canvas width in drawing units.
    pub width: f64,
    /// Canvas height in drawing units.
    pub height: f64,
    pub background: Color,
    /// Name of the layer every drawing starts with.
    pub default_layer_name: String,
    /// Layer cap, never above [`MAX_LAYERS`].
    pub max_layers: usize,
    pub store: StoreConfig,
}

impl Default for DrawingConfig {
    fn default() -> Self {
        Self {
            name: "Untitled Drawing".into(),
            width: 800.0,
            height: 600.0,
            background: Color::WHITE,
            default_layer_name: "Default".into(),
            max_layers: MAX_LAYERS,
            store: StoreConfig::default(),
        }
    }
}

impl DrawingConfig {
    /// Defaults with the given canvas size.
    pub fn canvas(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    /// The effective layer cap.
    pub fn layer_limit(&self) -> usize {
        self.max_layers.min(MAX_LAYERS)
    }
}
