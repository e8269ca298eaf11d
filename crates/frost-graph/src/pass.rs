//! Pass declarations and the builder that records them.

use serde::Serialize;

use crate::error::{GraphError, GraphResult};
use crate::frame::FrameGraph;
use crate::globals::PropertyId;
use crate::resource::{AccessFlags, TextureHandle};

/// Kind of a declared pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PassType {
    /// Renders into attachments; may be merged with neighbours.
    Raster,
    /// Free-form pass that binds its own targets; never has attachments.
    Unsafe,
}

/// A recorded pass: its payload plus every texture it touches.
pub(crate) struct PassDecl<D> {
    pub(crate) name: String,
    pub(crate) pass_type: PassType,
    pub(crate) data: D,
    /// One entry per handle, access modes unioned.
    pub(crate) accesses: Vec<(TextureHandle, AccessFlags)>,
    /// Handles bound through `use_texture` with a read mode.
    pub(crate) sampled: Vec<TextureHandle>,
    /// Color attachments sorted by slot.
    pub(crate) color_attachments: Vec<(u32, TextureHandle)>,
    pub(crate) depth_attachment: Option<TextureHandle>,
    pub(crate) allow_culling: bool,
    pub(crate) allow_merging: bool,
    pub(crate) globals_after: Vec<(PropertyId, TextureHandle)>,
}

impl<D> PassDecl<D> {
    fn new(name: String, pass_type: PassType, data: D) -> Self {
        Self {
            name,
            pass_type,
            data,
            accesses: Vec::new(),
            sampled: Vec::new(),
            color_attachments: Vec::new(),
            depth_attachment: None,
            allow_culling: true,
            allow_merging: true,
            globals_after: Vec::new(),
        }
    }

    fn declare(&mut self, handle: TextureHandle, access: AccessFlags) {
        match self.accesses.iter_mut().find(|(h, _)| *h == handle) {
            Some((_, existing)) => *existing = existing.union(access),
            None => self.accesses.push((handle, access)),
        }
    }

    /// Declared access mode for a handle, if any.
    pub(crate) fn access_of(&self, handle: TextureHandle) -> Option<AccessFlags> {
        self.accesses
            .iter()
            .find(|(h, _)| *h == handle)
            .map(|(_, access)| *access)
    }

    pub(crate) fn has_attachments(&self) -> bool {
        !self.color_attachments.is_empty() || self.depth_attachment.is_some()
    }

    /// Every attachment handle, colors first.
    pub(crate) fn attachments(&self) -> impl Iterator<Item = TextureHandle> + '_ {
        self.color_attachments
            .iter()
            .map(|(_, h)| *h)
            .chain(self.depth_attachment)
    }

    fn handles(&self) -> impl Iterator<Item = TextureHandle> + '_ {
        self.accesses
            .iter()
            .map(|(h, _)| *h)
            .chain(self.globals_after.iter().map(|(_, h)| *h))
    }
}

/// Records one pass. Nothing is registered until [`PassBuilder::build`].
#[must_use = "a pass is only registered by calling build()"]
pub struct PassBuilder<'g, 'a, D> {
    frame: &'g mut FrameGraph<'a, D>,
    decl: PassDecl<D>,
}

impl<'g, 'a, D> PassBuilder<'g, 'a, D> {
    pub(crate) fn new(
        frame: &'g mut FrameGraph<'a, D>,
        name: String,
        pass_type: PassType,
        data: D,
    ) -> Self {
        Self {
            frame,
            decl: PassDecl::new(name, pass_type, data),
        }
    }

    /// Declare that the pass reads and/or writes `handle`.
    pub fn use_texture(mut self, handle: TextureHandle, access: AccessFlags) -> Self {
        if access.reads() && !self.decl.sampled.contains(&handle) {
            self.decl.sampled.push(handle);
        }
        self.decl.declare(handle, access);
        self
    }

    /// Bind `handle` as color attachment `index`.
    pub fn set_render_attachment(mut self, handle: TextureHandle, index: u32, access: AccessFlags) -> Self {
        self.decl.color_attachments.push((index, handle));
        self.decl.declare(handle, access);
        self
    }

    /// Bind `handle` as the depth attachment.
    pub fn set_render_attachment_depth(mut self, handle: TextureHandle, access: AccessFlags) -> Self {
        self.decl.depth_attachment = Some(handle);
        self.decl.declare(handle, access);
        self
    }

    pub fn allow_pass_culling(mut self, allow: bool) -> Self {
        self.decl.allow_culling = allow;
        self
    }

    pub fn allow_merging(mut self, allow: bool) -> Self {
        self.decl.allow_merging = allow;
        self
    }

    /// Publish `handle` as global texture `id` once the pass has run.
    pub fn set_global_texture_after_pass(mut self, handle: TextureHandle, id: PropertyId) -> Self {
        self.decl.globals_after.push((id, handle));
        self
    }

    /// Validate the declaration and register the pass. Returns its index.
    pub fn build(self) -> GraphResult<usize> {
        let PassBuilder { frame, mut decl } = self;

        for handle in decl.handles() {
            frame.check_handle(handle)?;
        }

        if decl.pass_type == PassType::Unsafe && decl.has_attachments() {
            return Err(GraphError::InvalidDeclaration {
                pass: decl.name,
                reason: "unsafe passes cannot bind render attachments".into(),
            });
        }

        decl.color_attachments.sort_by_key(|(slot, _)| *slot);
        if let Some(pair) = decl.color_attachments.windows(2).find(|w| w[0].0 == w[1].0) {
            return Err(GraphError::InvalidDeclaration {
                pass: decl.name.clone(),
                reason: format!("color slot {} bound twice", pair[0].0),
            });
        }

        let mut size = None;
        for handle in decl.attachments() {
            let desc = frame.texture_desc(handle)?;
            match size {
                None => size = Some((desc.width, desc.height)),
                Some(expected) if expected != (desc.width, desc.height) => {
                    return Err(GraphError::InvalidDeclaration {
                        pass: decl.name.clone(),
                        reason: format!(
                            "attachment '{}' is {}x{}, expected {}x{}",
                            desc.name, desc.width, desc.height, expected.0, expected.1
                        ),
                    });
                }
                Some(_) => {}
            }
        }

        Ok(frame.push_pass(decl))
    }
}
