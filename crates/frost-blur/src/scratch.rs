//! Frame-scoped scratch textures of one blur chain.

use frost_core::MsaaSamples;
use frost_graph::{FrameGraph, GraphResult, TextureDesc, TextureHandle};

use crate::policy::{plan_chain, BlurStep, ChainVariant};

/// One graph texture per planned step.
///
/// The handles are only valid in the frame that allocated them; backing
/// buffers come from the graph's pool when a pass first touches them.
#[derive(Debug, Clone)]
pub struct ScratchChain {
    pub steps: Vec<BlurStep>,
    pub handles: Vec<TextureHandle>,
}

impl ScratchChain {
    /// Declare the scratch textures for a chain over `source`.
    ///
    /// Scratches keep the source format, drop multisampling and are not
    /// cleared: every texel is overwritten by its step.
    pub fn allocate<D>(
        frame: &mut FrameGraph<'_, D>,
        source: &TextureDesc,
        iterations: u32,
        variant: ChainVariant,
        name_prefix: &str,
    ) -> GraphResult<Self> {
        let steps = plan_chain(source.width, source.height, iterations, variant);
        let mut handles = Vec::with_capacity(steps.len());
        for step in &steps {
            let desc = TextureDesc {
                name: format!("{name_prefix}_{}", step.index),
                width: step.width,
                height: step.height,
                format: source.format,
                msaa: MsaaSamples::None,
                clear_buffer: false,
                clear_color: source.clear_color,
            };
            handles.push(frame.create_texture(desc)?);
        }
        tracing::trace!(prefix = name_prefix, steps = steps.len(), "scratch chain allocated");
        Ok(Self { steps, handles })
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Handle holding the chain's result.
    pub fn last(&self) -> Option<TextureHandle> {
        self.handles.last().copied()
    }
}
