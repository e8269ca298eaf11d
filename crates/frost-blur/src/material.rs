//! Materials: the sampling kernels a blit runs for every target texel.
//!
//! A material shades the whole bound target. Inputs come from the blit
//! source and the global parameters visible through the [`TextureView`].
//! Rows are shaded in parallel; nothing else in a frame runs concurrently.

use std::fmt;
use std::sync::Arc;

use frost_core::{FrostResult, ImageBuffer, ScaleBias};
use frost_graph::{PropertyId, TextureView};
use rayon::prelude::*;

use crate::shader_ids::IDS;

/// A full-screen shading program.
pub trait Material: Send + Sync + fmt::Debug {
    /// Display name, used in pass names.
    fn name(&self) -> &str;

    /// Shade every texel of `target` for shader pass `pass`.
    ///
    /// `source` is the texture handed to the blit; materials may ignore it
    /// in favour of a global texture.
    fn draw(
        &self,
        pass: u32,
        target: &mut ImageBuffer,
        source: &ImageBuffer,
        view: &TextureView<'_>,
        scale_bias: ScaleBias,
    ) -> FrostResult<()>;
}

/// Fill `target` with `shade(u, v)` evaluated at every texel center.
///
/// Coordinates are normalized and already passed through `scale_bias`.
pub fn shade_parallel<F>(target: &mut ImageBuffer, scale_bias: ScaleBias, shade: F)
where
    F: Fn(f32, f32) -> [f32; 4] + Sync,
{
    let width = target.width() as usize;
    let (tw, th) = (target.width() as f32, target.height() as f32);
    let format = target.format();

    target
        .pixels_mut()
        .par_chunks_exact_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            let v = (y as f32 + 0.5) / th;
            for (x, px) in row.iter_mut().enumerate() {
                let u = (x as f32 + 0.5) / tw;
                let (su, sv) = scale_bias.apply(u, v);
                *px = format.store(shade(su, sv));
            }
        });
}

fn add(acc: &mut [f32; 4], px: [f32; 4], weight: f32) {
    for (a, c) in acc.iter_mut().zip(px) {
        *a += c * weight;
    }
}

fn scale(mut px: [f32; 4], factor: f32) -> [f32; 4] {
    for c in px.iter_mut() {
        *c *= factor;
    }
    px
}

/// Dual-filter downsample: center weighted 4, four diagonal taps at half a texel.
pub fn dual_downsample(src: &ImageBuffer, u: f32, v: f32, offset: f32) -> [f32; 4] {
    let hx = 0.5 / src.width() as f32 * offset;
    let hy = 0.5 / src.height() as f32 * offset;
    let mut acc = [0.0; 4];
    add(&mut acc, src.sample_bilinear(u, v), 4.0);
    add(&mut acc, src.sample_bilinear(u - hx, v - hy), 1.0);
    add(&mut acc, src.sample_bilinear(u + hx, v + hy), 1.0);
    add(&mut acc, src.sample_bilinear(u + hx, v - hy), 1.0);
    add(&mut acc, src.sample_bilinear(u - hx, v + hy), 1.0);
    scale(acc, 1.0 / 8.0)
}

/// Dual-filter upsample: four axis taps at one texel, four diagonal taps weighted 2.
pub fn dual_upsample(src: &ImageBuffer, u: f32, v: f32, offset: f32) -> [f32; 4] {
    let hx = 0.5 / src.width() as f32 * offset;
    let hy = 0.5 / src.height() as f32 * offset;
    let mut acc = [0.0; 4];
    add(&mut acc, src.sample_bilinear(u - 2.0 * hx, v), 1.0);
    add(&mut acc, src.sample_bilinear(u + 2.0 * hx, v), 1.0);
    add(&mut acc, src.sample_bilinear(u, v - 2.0 * hy), 1.0);
    add(&mut acc, src.sample_bilinear(u, v + 2.0 * hy), 1.0);
    add(&mut acc, src.sample_bilinear(u - hx, v + hy), 2.0);
    add(&mut acc, src.sample_bilinear(u + hx, v + hy), 2.0);
    add(&mut acc, src.sample_bilinear(u + hx, v - hy), 2.0);
    add(&mut acc, src.sample_bilinear(u - hx, v - hy), 2.0);
    scale(acc, 1.0 / 12.0)
}

/// The screen blur material.
///
/// Samples the global texture `source_property` (the previous chain step)
/// and picks the downsample or upsample kernel from the size ratio of
/// that texture and the bound target. The tap distance is scaled by the
/// global `_blurOffset`, 1.0 when unset.
#[derive(Debug, Clone)]
pub struct DualFilterMaterial {
    source_property: PropertyId,
}

impl DualFilterMaterial {
    pub fn new() -> Self {
        Self {
            source_property: IDS.down_sample_tex,
        }
    }

    /// Sample `property` instead of `_DownSampleTex`.
    pub fn with_source_property(property: PropertyId) -> Self {
        Self {
            source_property: property,
        }
    }
}

impl Default for DualFilterMaterial {
    fn default() -> Self {
        Self::new()
    }
}

impl Material for DualFilterMaterial {
    fn name(&self) -> &str {
        "DualFilter"
    }

    fn draw(
        &self,
        _pass: u32,
        target: &mut ImageBuffer,
        source: &ImageBuffer,
        view: &TextureView<'_>,
        scale_bias: ScaleBias,
    ) -> FrostResult<()> {
        let input = view.global_image(self.source_property)?.unwrap_or(source);
        let offset = view.global_float(IDS.blur_offset).unwrap_or(1.0);
        let downsampling = (target.width() as u64 * target.height() as u64)
            < (input.width() as u64 * input.height() as u64);

        if downsampling {
            shade_parallel(target, scale_bias, |u, v| dual_downsample(input, u, v, offset));
        } else {
            shade_parallel(target, scale_bias, |u, v| dual_upsample(input, u, v, offset));
        }
        Ok(())
    }
}

/// Bilinear copy of the blit source.
#[derive(Debug, Clone, Default)]
pub struct CopyMaterial;

impl Material for CopyMaterial {
    fn name(&self) -> &str {
        "Copy"
    }

    fn draw(
        &self,
        _pass: u32,
        target: &mut ImageBuffer,
        source: &ImageBuffer,
        _view: &TextureView<'_>,
        scale_bias: ScaleBias,
    ) -> FrostResult<()> {
        if target.width() == source.width()
            && target.height() == source.height()
            && scale_bias == ScaleBias::IDENTITY
        {
            let format = target.format();
            for (dst, src) in target.pixels_mut().iter_mut().zip(source.pixels()) {
                *dst = format.store(*src);
            }
            return Ok(());
        }
        shade_parallel(target, scale_bias, |u, v| source.sample_bilinear(u, v));
        Ok(())
    }
}

/// Four-tap box filter, used for quarter-resolution copies.
#[derive(Debug, Clone, Default)]
pub struct BoxDownsampleMaterial;

impl Material for BoxDownsampleMaterial {
    fn name(&self) -> &str {
        "BoxDownsample"
    }

    fn draw(
        &self,
        _pass: u32,
        target: &mut ImageBuffer,
        source: &ImageBuffer,
        _view: &TextureView<'_>,
        scale_bias: ScaleBias,
    ) -> FrostResult<()> {
        let dx = 1.0 / source.width() as f32;
        let dy = 1.0 / source.height() as f32;
        shade_parallel(target, scale_bias, |u, v| {
            let mut acc = [0.0; 4];
            add(&mut acc, source.sample_bilinear(u - dx, v - dy), 0.25);
            add(&mut acc, source.sample_bilinear(u + dx, v - dy), 0.25);
            add(&mut acc, source.sample_bilinear(u - dx, v + dy), 0.25);
            add(&mut acc, source.sample_bilinear(u + dx, v + dy), 0.25);
            acc
        });
        Ok(())
    }
}

/// Look up a built-in material by its configured name.
///
/// Blur materials sample the chain through `source_property`.
pub fn material_by_name(name: &str, source_property: PropertyId) -> Option<Arc<dyn Material>> {
    match name {
        "DualFilter" | "ScreenBlurRT" => Some(Arc::new(DualFilterMaterial::with_source_property(source_property))),
        "Copy" => Some(Arc::new(CopyMaterial)),
        "BoxDownsample" => Some(Arc::new(BoxDownsampleMaterial)),
        _ => None,
    }
}
