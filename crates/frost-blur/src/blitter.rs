//! Full-screen blits through a material.

use frost_core::{FrostResult, ScaleBias};
use frost_graph::{PassContext, TextureHandle};

use crate::material::Material;

/// Draws one texture into another with a material.
///
/// The target is bound for the duration of the draw; the source must be
/// declared readable by the running pass.
pub struct Blitter;

impl Blitter {
    /// Blit covering the whole target.
    pub fn blit_texture(
        ctx: &mut PassContext<'_, '_>,
        source: TextureHandle,
        target: TextureHandle,
        material: &dyn Material,
        pass: u32,
    ) -> FrostResult<()> {
        Self::blit_texture_scaled(ctx, source, target, material, pass, ScaleBias::IDENTITY)
    }

    pub fn blit_texture_scaled(
        ctx: &mut PassContext<'_, '_>,
        source: TextureHandle,
        target: TextureHandle,
        material: &dyn Material,
        pass: u32,
        scale_bias: ScaleBias,
    ) -> FrostResult<()> {
        ctx.render_to(target, |image, view| -> FrostResult<()> {
            let src = view.texture(source)?;
            material.draw(pass, image, src, view, scale_bias)
        })?
    }
}
