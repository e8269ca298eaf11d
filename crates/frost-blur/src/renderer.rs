//! Frame driver: collects passes from the features, records them into a
//! fresh frame graph, then compiles and executes it.

use frost_core::{FrostConfig, FrostResult, ImageBuffer, PlatformCaps};
use frost_graph::{CompiledGraph, ExecutionReport, FrameGraph, PoolStats, RenderGraph};

use crate::feature::{
    CameraData, FrameData, LayerFilterFeature, RenderPass, RendererFeature, SpriteBlurFeature, UiBlurFeature,
    WorldUiBlurFeature,
};
use crate::pass::{execute_pass, PassKind};
use crate::scene::Scene;

/// Owns the features and the render graph (and with it the texture pool).
pub struct Renderer {
    features: Vec<Box<dyn RendererFeature>>,
    graph: RenderGraph,
    caps: PlatformCaps,
}

/// Camera targets of one frame.
pub struct FrameTargets<'a> {
    pub color: &'a mut ImageBuffer,
    pub depth: Option<&'a mut ImageBuffer>,
}

impl<'a> FrameTargets<'a> {
    pub fn color_only(color: &'a mut ImageBuffer) -> Self {
        Self { color, depth: None }
    }
}

impl Renderer {
    pub fn new(caps: PlatformCaps) -> Self {
        Self {
            features: Vec::new(),
            graph: RenderGraph::new(),
            caps,
        }
    }

    /// Renderer with every blur feature the configuration enables.
    pub fn from_config(config: &FrostConfig) -> Self {
        let mut renderer = Self::new(config.platform);
        if config.ui_blur.enabled {
            renderer.add_feature(UiBlurFeature::new(&config.ui_blur));
        }
        if config.world_ui_blur.enabled {
            renderer.add_feature(WorldUiBlurFeature::new(&config.world_ui_blur));
        }
        if config.sprite_blur.enabled {
            renderer.add_feature(SpriteBlurFeature::new(&config.sprite_blur));
        }
        if config.layer_filter.enabled {
            renderer.add_feature(LayerFilterFeature::new(&config.layer_filter));
        }
        renderer
    }

    pub fn add_feature(&mut self, feature: impl RendererFeature + 'static) {
        tracing::debug!(feature = feature.name(), "feature added");
        self.features.push(Box::new(feature));
    }

    pub fn feature_names(&self) -> Vec<&str> {
        self.features.iter().map(|f| f.name()).collect()
    }

    pub fn pool_stats(&self) -> PoolStats {
        self.graph.pool_stats()
    }

    /// Render one frame into `targets`.
    pub fn render(
        &mut self,
        camera: &CameraData,
        scene: &Scene,
        targets: FrameTargets<'_>,
        is_playing: bool,
    ) -> FrostResult<ExecutionReport> {
        let frame = record_frame(&self.features, &mut self.graph, self.caps, camera, scene, targets, is_playing)?;
        frame.execute(execute_pass)
    }

    /// Record one frame and return its compiled form without executing it.
    pub fn compile_frame(
        &mut self,
        camera: &CameraData,
        scene: &Scene,
        targets: FrameTargets<'_>,
        is_playing: bool,
    ) -> FrostResult<CompiledGraph> {
        let frame = record_frame(&self.features, &mut self.graph, self.caps, camera, scene, targets, is_playing)?;
        Ok(frame.compile()?)
    }
}

fn record_frame<'a>(
    features: &[Box<dyn RendererFeature>],
    graph: &'a mut RenderGraph,
    caps: PlatformCaps,
    camera: &CameraData,
    scene: &Scene,
    targets: FrameTargets<'a>,
    is_playing: bool,
) -> FrostResult<FrameGraph<'a, PassKind>> {
    let mut passes: Vec<&dyn RenderPass> = Vec::new();
    for feature in features {
        if !feature.is_active() {
            tracing::debug!(feature = feature.name(), "inactive, skipped");
            continue;
        }
        feature.add_render_passes(camera, &mut passes);
    }
    passes.sort_by_key(|pass| pass.event());

    let mut frame = graph.begin_frame::<PassKind>();
    frame.set_playing(is_playing);
    let active_color = frame.import_texture("_CameraColorTexture", targets.color);
    let active_depth = targets
        .depth
        .map(|depth| frame.import_texture("_CameraDepthTexture", depth));

    let mut data = FrameData {
        camera: *camera,
        scene,
        caps,
        active_color,
        active_depth,
        blit_data: None,
    };
    for pass in passes {
        tracing::trace!(pass = pass.name(), event = ?pass.event(), "record");
        pass.record(&mut frame, &mut data)?;
    }
    Ok(frame)
}
