//! Renderer features and the passes they enqueue.
//!
//! A [`RendererFeature`] decides per camera which of its [`RenderPass`]es
//! run; each pass records graph passes into the frame when the renderer
//! asks it to. Passes share per-frame state through [`FrameData`].

use std::sync::Arc;

use frost_core::{
    format::select_mask_format, BlurSettings, CameraType, Color, FrostResult, LayerFilterConfig, LayerMask,
    MsaaSamples, PlatformCaps, RenderPassEvent, SpriteBlurConfig, UiBlurConfig, WorldUiBlurConfig,
};
use frost_graph::{AccessFlags, FrameGraph, TextureDesc, TextureHandle};

use crate::material::{material_by_name, DualFilterMaterial, Material};
use crate::pass::{DrawPassData, FilterPassData, PassKind};
use crate::policy::ChainVariant;
use crate::samples::BlitData;
use crate::scene::{DrawingSettings, FilteringSettings, Scene, SortingCriteria};
use crate::shader_ids::IDS;
use crate::stage::{record_blur, BlurRequest, GlobalPublish, ScheduleVariant};

/// The camera a frame renders for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CameraData {
    pub camera_type: CameraType,
    /// The camera renders into an offscreen depth-only target.
    pub offscreen_depth: bool,
}

impl CameraData {
    pub fn new(camera_type: CameraType) -> Self {
        Self {
            camera_type,
            offscreen_depth: false,
        }
    }
}

/// Per-frame state shared by the passes recording into one frame.
pub struct FrameData<'s> {
    pub camera: CameraData,
    pub scene: &'s Scene,
    pub caps: PlatformCaps,
    pub active_color: TextureHandle,
    pub active_depth: Option<TextureHandle>,
    /// Front/back pair of the blit chain, once its start pass recorded.
    pub blit_data: Option<BlitData>,
}

/// A unit that records graph passes at one point of the frame.
pub trait RenderPass {
    fn name(&self) -> &str;

    fn event(&self) -> RenderPassEvent;

    fn record(&self, frame: &mut FrameGraph<'_, PassKind>, data: &mut FrameData<'_>) -> FrostResult<()>;
}

/// A configurable effect made of one or more render passes.
pub trait RendererFeature {
    fn name(&self) -> &str;

    /// Inactive features enqueue nothing.
    fn is_active(&self) -> bool {
        true
    }

    /// Enqueue the passes this feature runs for `camera`.
    fn add_render_passes<'f>(&'f self, camera: &CameraData, passes: &mut Vec<&'f dyn RenderPass>);
}

fn default_blur_material() -> Arc<dyn Material> {
    Arc::new(DualFilterMaterial::new())
}

fn mask_desc(
    frame: &FrameGraph<'_, PassKind>,
    data: &FrameData<'_>,
    name: &str,
    clear_color: Color,
) -> FrostResult<TextureDesc> {
    let color = frame.texture_desc(data.active_color)?;
    let format = select_mask_format(&data.caps, data.caps.color_space);
    Ok(TextureDesc {
        name: name.to_string(),
        width: color.width,
        height: color.height,
        format,
        msaa: MsaaSamples::None,
        clear_buffer: true,
        clear_color,
    })
}

// ---------------------------------------------------------------------------
// UI blur
// ---------------------------------------------------------------------------

/// Blurs the whole camera color for screen-space UI.
pub struct UiBlurPass {
    event: RenderPassEvent,
    settings: BlurSettings,
    publish: GlobalPublish,
    schedule: ScheduleVariant,
    material: Arc<dyn Material>,
}

impl RenderPass for UiBlurPass {
    fn name(&self) -> &str {
        "Blur UI Mipmap"
    }

    fn event(&self) -> RenderPassEvent {
        self.event
    }

    fn record(&self, frame: &mut FrameGraph<'_, PassKind>, data: &mut FrameData<'_>) -> FrostResult<()> {
        record_blur(
            frame,
            &BlurRequest {
                pass_name: "Blur UI Mipmap",
                scratch_prefix: "Blur UI Mipmap",
                source: data.active_color,
                iterations: self.settings.blur_iteration,
                blur_offset: self.settings.blur_offset,
                variant: ChainVariant::UpsampleToSource,
                schedule: self.schedule,
                material: Arc::clone(&self.material),
                publish: self.publish,
                publish_origin: true,
                source_property: IDS.down_sample_tex,
            },
        )?;
        Ok(())
    }
}

pub struct UiBlurFeature {
    enabled: bool,
    pass: UiBlurPass,
}

impl UiBlurFeature {
    pub fn new(config: &UiBlurConfig) -> Self {
        let publish = if config.always_show {
            GlobalPublish::Always
        } else {
            GlobalPublish::PlayModeOnly
        };
        Self {
            enabled: config.enabled,
            pass: UiBlurPass {
                event: config.event.clamp_to_prepasses(),
                settings: config.blur.clamped(),
                publish,
                schedule: ScheduleVariant::Batched,
                material: default_blur_material(),
            },
        }
    }

    pub fn with_schedule(mut self, schedule: ScheduleVariant) -> Self {
        self.pass.schedule = schedule;
        self
    }
}

impl RendererFeature for UiBlurFeature {
    fn name(&self) -> &str {
        "UI Blur Feature"
    }

    fn is_active(&self) -> bool {
        self.enabled
    }

    fn add_render_passes<'f>(&'f self, camera: &CameraData, passes: &mut Vec<&'f dyn RenderPass>) {
        if camera.camera_type != CameraType::Game || camera.offscreen_depth {
            return;
        }
        passes.push(&self.pass);
    }
}

// ---------------------------------------------------------------------------
// Masked blur: world-space UI and sprites
// ---------------------------------------------------------------------------

struct MaskedBlurNames {
    prepass: &'static str,
    mipmap: &'static str,
    draw: &'static str,
    mask: &'static str,
}

/// Mask prepass, blur of the mask, then a draw over the camera color
/// sampling the blurred mask.
pub struct MaskedBlurPass {
    names: MaskedBlurNames,
    event: RenderPassEvent,
    layer_mask: LayerMask,
    filter_tags: Vec<String>,
    draw_tags: Vec<String>,
    settings: BlurSettings,
    material: Arc<dyn Material>,
}

impl RenderPass for MaskedBlurPass {
    fn name(&self) -> &str {
        self.names.mipmap
    }

    fn event(&self) -> RenderPassEvent {
        self.event
    }

    fn record(&self, frame: &mut FrameGraph<'_, PassKind>, data: &mut FrameData<'_>) -> FrostResult<()> {
        let filtering = FilteringSettings::transparent(self.layer_mask);
        let desc = mask_desc(frame, data, self.names.mask, Color::BLACK)?;
        let mask = frame.create_texture(desc)?;

        let filter_list = data.scene.create_renderer_list(
            &DrawingSettings::new(&self.filter_tags, SortingCriteria::CommonTransparent),
            &filtering,
        );
        let mut prepass = frame
            .add_raster_pass(
                self.names.prepass,
                PassKind::Filter(FilterPassData {
                    list: filter_list,
                    target: mask,
                    depth: data.active_depth,
                    clear: Some(Color::BLACK),
                }),
            )
            .set_render_attachment(mask, 0, AccessFlags::Write);
        if let Some(depth) = data.active_depth {
            prepass = prepass.set_render_attachment_depth(depth, AccessFlags::Read);
        }
        prepass.build()?;

        let blur = record_blur(
            frame,
            &BlurRequest {
                pass_name: self.names.mipmap,
                scratch_prefix: self.names.mipmap,
                source: mask,
                iterations: self.settings.blur_iteration,
                blur_offset: self.settings.blur_offset,
                variant: ChainVariant::UpsampleToSource,
                schedule: ScheduleVariant::Batched,
                material: Arc::clone(&self.material),
                publish: GlobalPublish::Always,
                publish_origin: false,
                source_property: IDS.down_sample_tex,
            },
        )?;

        let draw_list = data.scene.create_renderer_list(
            &DrawingSettings::new(&self.draw_tags, SortingCriteria::CommonTransparent),
            &filtering,
        );
        let mut draw = frame
            .add_raster_pass(
                self.names.draw,
                PassKind::Draw(DrawPassData {
                    list: draw_list,
                    target: data.active_color,
                    depth: data.active_depth,
                    write_depth: false,
                    blur: blur.result,
                }),
            )
            .use_texture(blur.result, AccessFlags::Read)
            .set_render_attachment(data.active_color, 0, AccessFlags::ReadWrite);
        if let Some(depth) = data.active_depth {
            draw = draw.set_render_attachment_depth(depth, AccessFlags::Read);
        }
        draw.build()?;
        Ok(())
    }
}

/// Shared shape of the world-UI and sprite blur configs.
struct MaskedBlurSettings<'c> {
    enabled: bool,
    event: RenderPassEvent,
    layer_mask: LayerMask,
    filter_tags: &'c [String],
    draw_tags: &'c [String],
    blur: BlurSettings,
}

fn masked_pass(names: MaskedBlurNames, settings: MaskedBlurSettings<'_>) -> MaskedBlurPass {
    MaskedBlurPass {
        names,
        event: settings.event.clamp_to_prepasses(),
        layer_mask: settings.layer_mask,
        filter_tags: settings.filter_tags.to_vec(),
        draw_tags: settings.draw_tags.to_vec(),
        settings: settings.blur.clamped(),
        material: default_blur_material(),
    }
}

/// Frosted-glass panels for UI placed in the world.
pub struct WorldUiBlurFeature {
    enabled: bool,
    pass: MaskedBlurPass,
}

impl WorldUiBlurFeature {
    pub fn new(config: &WorldUiBlurConfig) -> Self {
        let settings = MaskedBlurSettings {
            enabled: config.enabled,
            event: config.event,
            layer_mask: config.layer_mask,
            filter_tags: &config.filter_shader_tags,
            draw_tags: &config.draw_shader_tags,
            blur: config.blur,
        };
        Self {
            enabled: settings.enabled,
            pass: masked_pass(
                MaskedBlurNames {
                    prepass: "Blur World UI PrePass",
                    mipmap: "Blur World UI Mipmap",
                    draw: "Blur World UI Draw",
                    mask: "WorldUIBlurPrepass",
                },
                settings,
            ),
        }
    }
}

impl RendererFeature for WorldUiBlurFeature {
    fn name(&self) -> &str {
        "World UI Blur Feature"
    }

    fn is_active(&self) -> bool {
        self.enabled
    }

    fn add_render_passes<'f>(&'f self, camera: &CameraData, passes: &mut Vec<&'f dyn RenderPass>) {
        if camera.camera_type == CameraType::Reflection || camera.offscreen_depth {
            return;
        }
        passes.push(&self.pass);
    }
}

/// Blurred backdrops behind sprites.
pub struct SpriteBlurFeature {
    enabled: bool,
    pass: MaskedBlurPass,
}

impl SpriteBlurFeature {
    pub fn new(config: &SpriteBlurConfig) -> Self {
        let settings = MaskedBlurSettings {
            enabled: config.enabled,
            event: config.event,
            layer_mask: config.layer_mask,
            filter_tags: &config.filter_shader_tags,
            draw_tags: &config.draw_shader_tags,
            blur: config.blur,
        };
        Self {
            enabled: settings.enabled,
            pass: masked_pass(
                MaskedBlurNames {
                    prepass: "Blur Sprite PrePass",
                    mipmap: "Blur Sprite Mipmap",
                    draw: "Blur Sprite Draw",
                    mask: "SpriteBlurPrepass",
                },
                settings,
            ),
        }
    }
}

impl RendererFeature for SpriteBlurFeature {
    fn name(&self) -> &str {
        "Sprite Blur Feature"
    }

    fn is_active(&self) -> bool {
        self.enabled
    }

    fn add_render_passes<'f>(&'f self, camera: &CameraData, passes: &mut Vec<&'f dyn RenderPass>) {
        if camera.camera_type == CameraType::Reflection || camera.offscreen_depth {
            return;
        }
        passes.push(&self.pass);
    }
}

// ---------------------------------------------------------------------------
// Layer filter
// ---------------------------------------------------------------------------

/// Mask of selected layers, blurred at half resolution and drawn back with depth.
pub struct LayerFilterPass {
    event: RenderPassEvent,
    layer_mask: LayerMask,
    shader_tags: Vec<String>,
    draw_tags: Vec<String>,
    settings: BlurSettings,
    material: Arc<dyn Material>,
}

impl RenderPass for LayerFilterPass {
    fn name(&self) -> &str {
        "NK Blur Mipmap"
    }

    fn event(&self) -> RenderPassEvent {
        self.event
    }

    fn record(&self, frame: &mut FrameGraph<'_, PassKind>, data: &mut FrameData<'_>) -> FrostResult<()> {
        let filtering = FilteringSettings::transparent(self.layer_mask);
        // cleared when acquired; the mask pass itself draws without clearing
        let desc = mask_desc(frame, data, "LayerFilterPrepass", Color::TRANSPARENT)?;
        let mask = frame.create_texture(desc)?;

        let list = data.scene.create_renderer_list(
            &DrawingSettings::new(&self.shader_tags, SortingCriteria::CommonTransparent),
            &filtering,
        );
        let mut mask_pass = frame
            .add_raster_pass(
                "NK Mask",
                PassKind::Filter(FilterPassData {
                    list,
                    target: mask,
                    depth: data.active_depth,
                    clear: None,
                }),
            )
            .set_render_attachment(mask, 0, AccessFlags::Write);
        if let Some(depth) = data.active_depth {
            mask_pass = mask_pass.set_render_attachment_depth(depth, AccessFlags::Read);
        }
        mask_pass.build()?;

        let blur = record_blur(
            frame,
            &BlurRequest {
                pass_name: "NK Blur Mipmap",
                scratch_prefix: "NK Mipmap",
                source: mask,
                iterations: self.settings.blur_iteration,
                blur_offset: self.settings.blur_offset,
                variant: ChainVariant::DownsampleOnly,
                schedule: ScheduleVariant::Batched,
                material: Arc::clone(&self.material),
                publish: GlobalPublish::Always,
                publish_origin: false,
                source_property: IDS.main_tex,
            },
        )?;

        let draw_list = data.scene.create_renderer_list(
            &DrawingSettings::new(&self.draw_tags, SortingCriteria::CommonTransparent),
            &filtering,
        );
        let mut final_draw = frame
            .add_raster_pass(
                "Final Draw",
                PassKind::Draw(DrawPassData {
                    list: draw_list,
                    target: data.active_color,
                    depth: data.active_depth,
                    write_depth: data.active_depth.is_some(),
                    blur: blur.result,
                }),
            )
            .use_texture(blur.result, AccessFlags::Read)
            .set_render_attachment(data.active_color, 0, AccessFlags::ReadWrite);
        if let Some(depth) = data.active_depth {
            final_draw = final_draw.set_render_attachment_depth(depth, AccessFlags::ReadWrite);
        }
        final_draw.build()?;
        Ok(())
    }
}

pub struct LayerFilterFeature {
    enabled: bool,
    /// `None` when no usable material is configured.
    pass: Option<LayerFilterPass>,
}

impl LayerFilterFeature {
    pub fn new(config: &LayerFilterConfig) -> Self {
        let material = match config.material.as_deref() {
            Some(name) => {
                let material = material_by_name(name, IDS.main_tex);
                if material.is_none() {
                    tracing::warn!(material = name, "unknown layer filter material, feature disabled");
                }
                material
            }
            None => {
                if config.enabled {
                    tracing::warn!("layer filter has no material, feature disabled");
                }
                None
            }
        };
        Self::with_material(config, material)
    }

    /// Build the feature around an explicit material.
    pub fn with_material(config: &LayerFilterConfig, material: Option<Arc<dyn Material>>) -> Self {
        let pass = material.map(|material| LayerFilterPass {
            event: config.event.clamp_to_prepasses(),
            layer_mask: config.layer_mask,
            shader_tags: config.shader_tags.clone(),
            draw_tags: config.draw_shader_tags.clone(),
            settings: config.blur.clamped(),
            material,
        });
        Self {
            enabled: config.enabled,
            pass,
        }
    }
}

impl RendererFeature for LayerFilterFeature {
    fn name(&self) -> &str {
        "Layer Filter Feature"
    }

    fn is_active(&self) -> bool {
        self.enabled && self.pass.is_some()
    }

    fn add_render_passes<'f>(&'f self, camera: &CameraData, passes: &mut Vec<&'f dyn RenderPass>) {
        if camera.camera_type == CameraType::Preview || camera.offscreen_depth {
            return;
        }
        if let Some(pass) = &self.pass {
            passes.push(pass);
        }
    }
}
