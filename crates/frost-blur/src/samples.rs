//! Small features built on the same pass machinery: a material blit chain
//! sharing a front/back pair through [`FrameData`], and a color copy that
//! publishes `_CameraOpaqueTexture`.

use std::sync::Arc;

use frost_core::{FrostResult, MsaaSamples, RenderPassEvent, ScaleBias};
use frost_graph::{AccessFlags, FrameGraph, GraphResult, TextureDesc, TextureHandle};
use serde::{Deserialize, Serialize};

use crate::feature::{CameraData, FrameData, RenderPass, RendererFeature};
use crate::material::{BoxDownsampleMaterial, Material};
use crate::pass::{BlitPassData, PassKind};
use crate::shader_ids::IDS;

/// Front/back textures of the blit chain and which one holds the latest result.
#[derive(Debug, Clone, Copy)]
pub struct BlitData {
    front: TextureHandle,
    back: TextureHandle,
    is_front: bool,
    /// Latest result.
    pub texture: TextureHandle,
}

impl BlitData {
    fn new(front: TextureHandle, back: TextureHandle) -> Self {
        Self {
            front,
            back,
            is_front: true,
            texture: front,
        }
    }

    /// Record one full-screen material pass into the other texture of the pair.
    fn record_full_screen_pass(
        &mut self,
        frame: &mut FrameGraph<'_, PassKind>,
        pass_name: &str,
        material: &Arc<dyn Material>,
    ) -> GraphResult<()> {
        self.is_front = !self.is_front;
        let source = self.texture;
        let destination = if self.is_front { self.front } else { self.back };
        frame
            .add_raster_pass(
                pass_name,
                PassKind::Blit(BlitPassData {
                    source,
                    destination,
                    material: Some(Arc::clone(material)),
                    scale_bias: ScaleBias::IDENTITY,
                }),
            )
            .use_texture(source, AccessFlags::Read)
            .set_render_attachment(destination, 0, AccessFlags::Write)
            .build()?;
        self.texture = destination;
        Ok(())
    }
}

fn blit_pass(frame: &mut FrameGraph<'_, PassKind>, name: &str, source: TextureHandle, destination: TextureHandle) -> GraphResult<()> {
    frame
        .add_raster_pass(
            name,
            PassKind::Blit(BlitPassData {
                source,
                destination,
                material: None,
                scale_bias: ScaleBias::IDENTITY,
            }),
        )
        .use_texture(source, AccessFlags::Read)
        .set_render_attachment(destination, 0, AccessFlags::Write)
        .build()?;
    Ok(())
}

pub struct BlitStartPass {
    event: RenderPassEvent,
}

impl RenderPass for BlitStartPass {
    fn name(&self) -> &str {
        "BlitColorPass"
    }

    fn event(&self) -> RenderPassEvent {
        self.event
    }

    fn record(&self, frame: &mut FrameGraph<'_, PassKind>, data: &mut FrameData<'_>) -> FrostResult<()> {
        let color = frame.texture_desc(data.active_color)?.clone();
        let pair_desc = |name: &str| TextureDesc {
            name: name.to_string(),
            msaa: MsaaSamples::None,
            clear_buffer: false,
            ..color.clone()
        };
        let front = frame.create_texture(pair_desc("_BlitTextureDataFront"))?;
        let back = frame.create_texture(pair_desc("_BlitTextureDataBack"))?;

        blit_pass(frame, "BlitColorPass", data.active_color, front)?;
        data.blit_data = Some(BlitData::new(front, back));
        Ok(())
    }
}

pub struct BlitMaterialsPass {
    event: RenderPassEvent,
    materials: Vec<Option<Arc<dyn Material>>>,
}

impl RenderPass for BlitMaterialsPass {
    fn name(&self) -> &str {
        "BlitRenderPass"
    }

    fn event(&self) -> RenderPassEvent {
        self.event
    }

    fn record(&self, frame: &mut FrameGraph<'_, PassKind>, data: &mut FrameData<'_>) -> FrostResult<()> {
        let Some(blit) = data.blit_data.as_mut() else {
            tracing::warn!("invalid input texture handle, skipping fullscreen passes");
            return Ok(());
        };
        for material in self.materials.iter().flatten() {
            let pass_name = format!("Blit {} Pass", material.name());
            blit.record_full_screen_pass(frame, &pass_name, material)?;
        }
        Ok(())
    }
}

pub struct BlitEndPass {
    event: RenderPassEvent,
}

impl RenderPass for BlitEndPass {
    fn name(&self) -> &str {
        "BlitBackToColorPass"
    }

    fn event(&self) -> RenderPassEvent {
        self.event
    }

    fn record(&self, frame: &mut FrameGraph<'_, PassKind>, data: &mut FrameData<'_>) -> FrostResult<()> {
        let Some(blit) = data.blit_data else {
            return Ok(());
        };
        blit_pass(frame, "BlitBackToColorPass", blit.texture, data.active_color)?;
        Ok(())
    }
}

/// Runs a list of materials over the camera color, one pass each, in list order.
///
/// Empty material slots are skipped.
pub struct BlitChainFeature {
    start: BlitStartPass,
    blit: BlitMaterialsPass,
    end: BlitEndPass,
}

impl BlitChainFeature {
    pub fn new(event: RenderPassEvent, materials: Vec<Option<Arc<dyn Material>>>) -> Self {
        let event = event.clamp_to_prepasses();
        Self {
            start: BlitStartPass { event },
            blit: BlitMaterialsPass { event, materials },
            end: BlitEndPass { event },
        }
    }
}

impl RendererFeature for BlitChainFeature {
    fn name(&self) -> &str {
        "Blit Chain Feature"
    }

    fn add_render_passes<'f>(&'f self, _camera: &CameraData, passes: &mut Vec<&'f dyn RenderPass>) {
        passes.push(&self.start);
        passes.push(&self.blit);
        passes.push(&self.end);
    }
}

/// Resolution and filter of the opaque color copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Downsampling {
    #[default]
    None,
    X2Bilinear,
    X4Box,
    X4Bilinear,
}

impl Downsampling {
    pub fn divisor(&self) -> u32 {
        match self {
            Downsampling::None => 1,
            Downsampling::X2Bilinear => 2,
            Downsampling::X4Box | Downsampling::X4Bilinear => 4,
        }
    }
}

pub struct CopyColorPass {
    event: RenderPassEvent,
    downsampling: Downsampling,
}

impl RenderPass for CopyColorPass {
    fn name(&self) -> &str {
        "Copy Color"
    }

    fn event(&self) -> RenderPassEvent {
        self.event
    }

    fn record(&self, frame: &mut FrameGraph<'_, PassKind>, data: &mut FrameData<'_>) -> FrostResult<()> {
        let color = frame.texture_desc(data.active_color)?.clone();
        let divisor = self.downsampling.divisor();
        let destination = frame.create_texture(TextureDesc {
            name: "_CameraOpaqueTexture".to_string(),
            width: (color.width / divisor).max(1),
            height: (color.height / divisor).max(1),
            msaa: MsaaSamples::None,
            clear_buffer: false,
            ..color
        })?;

        let material: Option<Arc<dyn Material>> = match self.downsampling {
            Downsampling::X4Box => Some(Arc::new(BoxDownsampleMaterial)),
            _ => None,
        };
        frame
            .add_raster_pass(
                "Copy Color",
                PassKind::Blit(BlitPassData {
                    source: data.active_color,
                    destination,
                    material,
                    scale_bias: ScaleBias::IDENTITY,
                }),
            )
            .use_texture(data.active_color, AccessFlags::Read)
            .set_render_attachment(destination, 0, AccessFlags::Write)
            .set_global_texture_after_pass(destination, IDS.camera_opaque_texture)
            .allow_pass_culling(false)
            .build()?;
        Ok(())
    }
}

/// Copies the camera color after opaques for later passes to sample.
pub struct CopyColorFeature {
    pass: CopyColorPass,
}

impl CopyColorFeature {
    pub fn new(downsampling: Downsampling) -> Self {
        Self {
            pass: CopyColorPass {
                event: RenderPassEvent::AfterRenderingOpaques,
                downsampling,
            },
        }
    }
}

impl RendererFeature for CopyColorFeature {
    fn name(&self) -> &str {
        "Copy Color Feature"
    }

    fn add_render_passes<'f>(&'f self, camera: &CameraData, passes: &mut Vec<&'f dyn RenderPass>) {
        if camera.offscreen_depth {
            return;
        }
        passes.push(&self.pass);
    }
}
