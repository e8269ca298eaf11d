use serde::{Deserialize, Serialize};

/// Injection point of a pass in the frame timeline.
///
/// Values follow the host timeline so passes sort by their numeric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RenderPassEvent {
    BeforeRendering = 0,
    BeforeRenderingShadows = 50,
    AfterRenderingShadows = 100,
    BeforeRenderingPrePasses = 150,
    AfterRenderingPrePasses = 200,
    BeforeRenderingGbuffer = 210,
    AfterRenderingGbuffer = 220,
    BeforeRenderingDeferredLights = 230,
    AfterRenderingDeferredLights = 240,
    BeforeRenderingOpaques = 250,
    AfterRenderingOpaques = 300,
    BeforeRenderingSkybox = 350,
    AfterRenderingSkybox = 400,
    BeforeRenderingTransparents = 450,
    AfterRenderingTransparents = 500,
    BeforeRenderingPostProcessing = 550,
    AfterRenderingPostProcessing = 600,
    AfterRendering = 1000,
}

impl RenderPassEvent {
    /// Clamp events earlier than the pre-pass stage up to it.
    pub fn clamp_to_prepasses(self) -> Self {
        self.max(RenderPassEvent::BeforeRenderingPrePasses)
    }
}

impl Default for RenderPassEvent {
    fn default() -> Self {
        RenderPassEvent::AfterRenderingPostProcessing
    }
}

/// Kind of camera a frame is rendered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CameraType {
    #[default]
    Game,
    SceneView,
    Preview,
    Reflection,
}

/// A 32-bit layer mask; bit `n` selects layer `n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const NOTHING: LayerMask = LayerMask(0);
    pub const EVERYTHING: LayerMask = LayerMask(u32::MAX);

    /// Mask selecting a single layer. Layers above 31 select nothing.
    pub fn layer(layer: u8) -> Self {
        LayerMask(1u32.checked_shl(layer as u32).unwrap_or(0))
    }

    /// Whether the mask includes `layer`.
    pub fn contains(&self, layer: u8) -> bool {
        (self.0 & LayerMask::layer(layer).0) != 0
    }
}

impl std::ops::BitOr for LayerMask {
    type Output = LayerMask;

    fn bitor(self, rhs: Self) -> Self::Output {
        LayerMask(self.0 | rhs.0)
    }
}
