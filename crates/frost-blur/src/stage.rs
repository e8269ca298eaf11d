//! The blur chain: recording and execution of the mipmap passes.
//!
//! A chain renders `N` steps. Before step `i` the previous result is bound
//! to the material's source property (the chain source for step 0), then
//! the material draws into scratch `i`. The last scratch holds the result
//! and is published as `_BlurTex`.

use std::sync::Arc;

use frost_core::FrostResult;
use frost_graph::{AccessFlags, FrameGraph, FrameInfo, GraphResult, PassContext, PropertyId, TextureHandle};
use serde::{Deserialize, Serialize};

use crate::blitter::Blitter;
use crate::material::Material;
use crate::pass::PassKind;
use crate::policy::ChainVariant;
use crate::scratch::ScratchChain;
use crate::shader_ids::IDS;

/// When the chain's output textures become visible as globals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GlobalPublish {
    Always,
    /// Only while the host is in play mode.
    PlayModeOnly,
}

impl GlobalPublish {
    pub fn allows(&self, info: FrameInfo) -> bool {
        match self {
            GlobalPublish::Always => true,
            GlobalPublish::PlayModeOnly => info.is_playing,
        }
    }
}

/// How the steps of a chain map onto graph passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScheduleVariant {
    /// One unsafe pass running every step.
    #[default]
    Batched,
    /// One raster pass per step.
    PerStep,
}

/// Payload of a batched chain pass.
#[derive(Debug, Clone)]
pub struct MipmapPassData {
    pub source: TextureHandle,
    pub scratches: Vec<TextureHandle>,
    pub material: Arc<dyn Material>,
    pub blur_offset: f32,
    pub publish: GlobalPublish,
    /// Publish the unblurred source as `_OriginTex`.
    pub publish_origin: bool,
    /// Global the material samples the previous step through.
    pub source_property: PropertyId,
}

/// Run every step of a chain inside one pass.
pub fn execute_mipmap_chain(data: &MipmapPassData, ctx: &mut PassContext<'_, '_>) -> FrostResult<()> {
    let publish = data.publish.allows(ctx.frame_info());
    if data.publish_origin && publish {
        ctx.set_global_texture(IDS.origin_tex, data.source)?;
    }
    ctx.set_global_float(IDS.blur_offset, data.blur_offset);

    let mut current = data.source;
    for &target in &data.scratches {
        ctx.set_global_texture(data.source_property, current)?;
        Blitter::blit_texture(ctx, data.source, target, data.material.as_ref(), 0)?;
        current = target;
    }

    if publish {
        ctx.set_global_texture(IDS.blur_tex, current)?;
    }
    ctx.set_global_float(IDS.blur_offset, data.blur_offset);
    Ok(())
}

/// Payload of one pass of a per-step chain.
#[derive(Debug, Clone)]
pub struct MipmapStepData {
    pub index: usize,
    /// Source of the whole chain.
    pub source: TextureHandle,
    /// Result of the previous step, or the source for step 0.
    pub previous: TextureHandle,
    pub target: TextureHandle,
    pub material: Arc<dyn Material>,
    pub blur_offset: f32,
    pub publish: GlobalPublish,
    pub publish_origin: bool,
    pub source_property: PropertyId,
}

pub fn execute_mipmap_step(data: &MipmapStepData, ctx: &mut PassContext<'_, '_>) -> FrostResult<()> {
    if data.index == 0 {
        if data.publish_origin && data.publish.allows(ctx.frame_info()) {
            ctx.set_global_texture(IDS.origin_tex, data.source)?;
        }
        ctx.set_global_float(IDS.blur_offset, data.blur_offset);
    }
    ctx.set_global_texture(data.source_property, data.previous)?;
    Blitter::blit_texture(ctx, data.source, data.target, data.material.as_ref(), 0)
}

/// Everything needed to record one blur chain.
#[derive(Debug, Clone)]
pub struct BlurRequest<'r> {
    pub pass_name: &'r str,
    pub scratch_prefix: &'r str,
    pub source: TextureHandle,
    pub iterations: u32,
    pub blur_offset: f32,
    pub variant: ChainVariant,
    pub schedule: ScheduleVariant,
    pub material: Arc<dyn Material>,
    pub publish: GlobalPublish,
    pub publish_origin: bool,
    pub source_property: PropertyId,
}

/// Handles produced by a recorded chain.
#[derive(Debug, Clone)]
pub struct BlurOutput {
    /// Texture holding the blurred result.
    pub result: TextureHandle,
    pub chain: ScratchChain,
}

/// Allocate the scratches of a chain and record its pass(es).
pub fn record_blur(frame: &mut FrameGraph<'_, PassKind>, request: &BlurRequest<'_>) -> GraphResult<BlurOutput> {
    let source_desc = frame.texture_desc(request.source)?.clone();
    let chain = ScratchChain::allocate(
        frame,
        &source_desc,
        request.iterations,
        request.variant,
        request.scratch_prefix,
    )?;
    let result = chain.handles[chain.handles.len() - 1];

    match request.schedule {
        ScheduleVariant::Batched => record_batched(frame, request, &chain)?,
        ScheduleVariant::PerStep => record_per_step(frame, request, &chain)?,
    }

    tracing::debug!(
        pass = request.pass_name,
        steps = chain.len(),
        schedule = ?request.schedule,
        "blur chain recorded"
    );
    Ok(BlurOutput { result, chain })
}

fn record_batched(frame: &mut FrameGraph<'_, PassKind>, request: &BlurRequest<'_>, chain: &ScratchChain) -> GraphResult<()> {
    let data = MipmapPassData {
        source: request.source,
        scratches: chain.handles.clone(),
        material: Arc::clone(&request.material),
        blur_offset: request.blur_offset,
        publish: request.publish,
        publish_origin: request.publish_origin,
        source_property: request.source_property,
    };
    let mut builder = frame
        .add_unsafe_pass(request.pass_name, PassKind::Mipmap(data))
        .use_texture(request.source, AccessFlags::Read)
        .allow_pass_culling(false);
    for &scratch in &chain.handles {
        builder = builder.use_texture(scratch, AccessFlags::ReadWrite);
    }
    builder.build()?;
    Ok(())
}

fn record_per_step(frame: &mut FrameGraph<'_, PassKind>, request: &BlurRequest<'_>, chain: &ScratchChain) -> GraphResult<()> {
    let publish_result = request.publish.allows(frame.frame_info());
    let last = chain.len() - 1;
    let mut previous = request.source;

    for (index, &target) in chain.handles.iter().enumerate() {
        let data = MipmapStepData {
            index,
            source: request.source,
            previous,
            target,
            material: Arc::clone(&request.material),
            blur_offset: request.blur_offset,
            publish: request.publish,
            publish_origin: request.publish_origin,
            source_property: request.source_property,
        };
        let mut builder = frame
            .add_raster_pass(format!("{}_{index}", request.pass_name), PassKind::MipmapStep(data))
            .use_texture(request.source, AccessFlags::Read)
            .use_texture(previous, AccessFlags::Read)
            .set_render_attachment(target, 0, AccessFlags::Write)
            .allow_merging(false);
        if index == last {
            builder = builder.allow_pass_culling(false);
            if publish_result {
                builder = builder.set_global_texture_after_pass(target, IDS.blur_tex);
            }
        }
        builder.build()?;
        previous = target;
    }
    Ok(())
}
