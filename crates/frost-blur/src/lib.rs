//! # frost-blur
//!
//! Iterative dual-filter blur on top of `frost-graph`.
//!
//! A blur chain downsamples a source through a mip pyramid and upsamples it
//! back, one scratch texture per step. The crate plans the chain sizes,
//! records the chain as graph passes (batched into one pass or one pass per
//! step), and runs the sampling kernels on the CPU. Renderer features
//! combine chains with mask and draw passes into complete effects.
//!
//! ## Usage
//!
//! ```ignore
//! let mut renderer = Renderer::new(PlatformCaps::default());
//! renderer.add_feature(UiBlurFeature::new(&UiBlurConfig::default()));
//! let report = renderer.render(&camera, &scene, FrameTargets::color_only(&mut color), true)?;
//! let blurred = report.published_texture(IDS.blur_tex);
//! ```

pub mod blitter;
pub mod feature;
pub mod material;
pub mod pass;
pub mod policy;
pub mod renderer;
pub mod samples;
pub mod scene;
pub mod scratch;
pub mod shader_ids;
pub mod stage;

pub use blitter::Blitter;
pub use feature::{
    CameraData, FrameData, LayerFilterFeature, RenderPass, RendererFeature, SpriteBlurFeature, UiBlurFeature,
    WorldUiBlurFeature,
};
pub use material::{material_by_name, CopyMaterial, DualFilterMaterial, Material};
pub use pass::{execute_pass, PassKind};
pub use policy::{clamp_iterations, level_size, pingpong, plan_chain, BlurStep, ChainVariant};
pub use renderer::{FrameTargets, Renderer};
pub use samples::{BlitChainFeature, CopyColorFeature, Downsampling};
pub use scene::{RendererItem, Scene};
pub use scratch::ScratchChain;
pub use shader_ids::IDS;
pub use stage::{record_blur, BlurOutput, BlurRequest, GlobalPublish, ScheduleVariant};
