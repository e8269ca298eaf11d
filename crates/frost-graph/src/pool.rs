//! Reusable backing storage for frame-scoped textures.
//!
//! The pool outlives frames; handles do not. A buffer is handed out to at
//! most one live texture at a time and comes back when that texture's last
//! user has run or the frame ends.

use std::collections::HashMap;

use frost_core::{FrostResult, GraphicsFormat, ImageBuffer, MsaaSamples};

use crate::resource::TextureDesc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PoolKey {
    width: u32,
    height: u32,
    format: GraphicsFormat,
    msaa: MsaaSamples,
}

impl PoolKey {
    fn of_desc(desc: &TextureDesc) -> Self {
        Self {
            width: desc.width,
            height: desc.height,
            format: desc.format,
            msaa: desc.msaa,
        }
    }

    fn of_image(image: &ImageBuffer) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            format: image.format(),
            msaa: image.msaa(),
        }
    }
}

/// Allocation counters of a [`TexturePool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolStats {
    /// Buffers created from scratch.
    pub allocated: usize,
    /// Acquisitions served from a previously released buffer.
    pub reused: usize,
    /// Buffers currently handed out.
    pub live: usize,
    /// Buffers sitting in the free lists.
    pub free: usize,
}

#[derive(Default)]
pub struct TexturePool {
    free: HashMap<PoolKey, Vec<ImageBuffer>>,
    stats: PoolStats,
}

impl TexturePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out a buffer matching `desc`, cleared if the descriptor asks for it.
    pub fn acquire(&mut self, desc: &TextureDesc) -> FrostResult<ImageBuffer> {
        let key = PoolKey::of_desc(desc);
        let recycled = self.free.get_mut(&key).and_then(Vec::pop);
        let mut image = match recycled {
            Some(image) => {
                self.stats.reused += 1;
                self.stats.free -= 1;
                image
            }
            None => {
                self.stats.allocated += 1;
                ImageBuffer::new(desc.width, desc.height, desc.format)?.with_msaa(desc.msaa)
            }
        };
        if desc.clear_buffer {
            image.fill(&desc.clear_color);
        }
        self.stats.live += 1;
        tracing::trace!(texture = %desc.name, "acquired {}x{}", desc.width, desc.height);
        Ok(image)
    }

    /// Return a buffer for later reuse.
    pub fn release(&mut self, image: ImageBuffer) {
        self.stats.live = self.stats.live.saturating_sub(1);
        self.stats.free += 1;
        self.free.entry(PoolKey::of_image(&image)).or_default().push(image);
    }

    pub fn stats(&self) -> PoolStats {
        self.stats
    }

    /// Drop every free buffer.
    pub fn trim(&mut self) {
        self.free.clear();
        self.stats.free = 0;
    }
}
