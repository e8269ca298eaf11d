//! Pass payloads and the single dispatch table that executes them.

use std::sync::Arc;

use frost_core::{Color, FrostResult, ImageBuffer, ScaleBias};
use frost_graph::{PassContext, TextureHandle};

use crate::blitter::Blitter;
use crate::material::{CopyMaterial, Material};
use crate::scene::RendererList;
use crate::shader_ids::IDS;
use crate::stage::{execute_mipmap_chain, execute_mipmap_step, MipmapPassData, MipmapStepData};

/// Draws a renderer list into a mask.
#[derive(Debug, Clone)]
pub struct FilterPassData {
    pub list: RendererList,
    pub target: TextureHandle,
    /// Depth buffer tested against, never written.
    pub depth: Option<TextureHandle>,
    /// Clear the target before drawing.
    pub clear: Option<Color>,
}

/// Composites a renderer list over the color target, shaded with the blur result.
#[derive(Debug, Clone)]
pub struct DrawPassData {
    pub list: RendererList,
    pub target: TextureHandle,
    pub depth: Option<TextureHandle>,
    /// Write item depths after drawing.
    pub write_depth: bool,
    /// Blur result, used when `_BlurTex` is not bound.
    pub blur: TextureHandle,
}

#[derive(Debug, Clone)]
pub struct BlitPassData {
    pub source: TextureHandle,
    pub destination: TextureHandle,
    /// Plain copy when `None`.
    pub material: Option<Arc<dyn Material>>,
    pub scale_bias: ScaleBias,
}

/// Payload of every pass the features record.
#[derive(Debug, Clone)]
pub enum PassKind {
    Filter(FilterPassData),
    Mipmap(MipmapPassData),
    MipmapStep(MipmapStepData),
    Draw(DrawPassData),
    Blit(BlitPassData),
}

impl PassKind {
    pub fn label(&self) -> &'static str {
        match self {
            PassKind::Filter(_) => "filter",
            PassKind::Mipmap(_) => "mipmap",
            PassKind::MipmapStep(_) => "mipmap-step",
            PassKind::Draw(_) => "draw",
            PassKind::Blit(_) => "blit",
        }
    }
}

/// Executor handed to [`frost_graph::FrameGraph::execute`].
pub fn execute_pass(kind: &PassKind, ctx: &mut PassContext<'_, '_>) -> FrostResult<()> {
    tracing::trace!(pass = ctx.pass_name(), kind = kind.label(), "run");
    match kind {
        PassKind::Filter(data) => execute_filter(data, ctx),
        PassKind::Mipmap(data) => execute_mipmap_chain(data, ctx),
        PassKind::MipmapStep(data) => execute_mipmap_step(data, ctx),
        PassKind::Draw(data) => execute_draw(data, ctx),
        PassKind::Blit(data) => execute_blit(data, ctx),
    }
}

fn execute_filter(data: &FilterPassData, ctx: &mut PassContext<'_, '_>) -> FrostResult<()> {
    if let Some(color) = &data.clear {
        ctx.clear(data.target, color)?;
    }
    if data.list.is_empty() {
        return Ok(());
    }
    ctx.render_to(data.target, |target, view| -> FrostResult<()> {
        let depth = match data.depth {
            Some(handle) => Some(view.texture(handle)?),
            None => None,
        };
        data.list.draw(target, depth, |item, _, _| item.color.to_array());
        Ok(())
    })?
}

fn execute_draw(data: &DrawPassData, ctx: &mut PassContext<'_, '_>) -> FrostResult<()> {
    if data.list.is_empty() {
        return Ok(());
    }
    ctx.render_to(data.target, |target, view| -> FrostResult<()> {
        let blur: &ImageBuffer = match view.global_image(IDS.blur_tex)? {
            Some(image) => image,
            None => view.texture(data.blur)?,
        };
        let depth = match data.depth {
            Some(handle) => Some(view.texture(handle)?),
            None => None,
        };
        let (w, h) = (target.width() as f32, target.height() as f32);
        data.list.draw(target, depth, |item, x, y| {
            let px = blur.sample_bilinear((x as f32 + 0.5) / w, (y as f32 + 0.5) / h);
            let tint = item.color.to_array();
            [px[0] * tint[0], px[1] * tint[1], px[2] * tint[2], tint[3]]
        });
        Ok(())
    })??;

    if let (true, Some(depth)) = (data.write_depth, data.depth) {
        ctx.render_to(depth, |image, _| data.list.write_depth(image))?;
    }
    Ok(())
}

fn execute_blit(data: &BlitPassData, ctx: &mut PassContext<'_, '_>) -> FrostResult<()> {
    let material: &dyn Material = match &data.material {
        Some(material) => material.as_ref(),
        None => &CopyMaterial,
    };
    Blitter::blit_texture_scaled(ctx, data.source, data.destination, material, 0, data.scale_bias)
}
