//! Per-frame graph state and pass execution.

use std::collections::HashMap;

use frost_core::{Color, ImageBuffer};

use crate::compile::{self, CompiledGraph};
use crate::error::{GraphError, GraphResult};
use crate::globals::{GlobalParams, GlobalValue, PropertyId};
use crate::pass::{PassBuilder, PassDecl, PassType};
use crate::pool::{PoolStats, TexturePool};
use crate::resource::{AccessFlags, Backing, ResourceKind, TextureDesc, TextureHandle, TextureResource};

/// Frame-level facts visible to every pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameInfo {
    /// Serial of the frame, starting at 1.
    pub serial: u64,
    /// Whether the host is in play mode.
    pub is_playing: bool,
}

/// Long-lived owner of the texture pool. Hands out one [`FrameGraph`] per frame.
#[derive(Default)]
pub struct RenderGraph {
    pool: TexturePool,
    frame_serial: u64,
}

impl RenderGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start recording a new frame. Handles of earlier frames become stale.
    pub fn begin_frame<D>(&mut self) -> FrameGraph<'_, D> {
        self.frame_serial += 1;
        tracing::debug!(frame = self.frame_serial, "begin frame");
        FrameGraph {
            pool: &mut self.pool,
            info: FrameInfo {
                serial: self.frame_serial,
                is_playing: true,
            },
            resources: Vec::new(),
            passes: Vec::new(),
        }
    }

    /// Serial of the most recently started frame.
    pub fn frame_serial(&self) -> u64 {
        self.frame_serial
    }

    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }

    /// Free every pooled buffer that is not in use.
    pub fn trim_pool(&mut self) {
        self.pool.trim();
    }
}

/// Resources and passes recorded for one frame.
///
/// `D` is the pass payload handed back to the executor. Pooled buffers go
/// back to the pool when the frame graph is dropped or executed.
pub struct FrameGraph<'a, D> {
    pool: &'a mut TexturePool,
    info: FrameInfo,
    resources: Vec<TextureResource<'a>>,
    passes: Vec<PassDecl<D>>,
}

impl<'a, D> FrameGraph<'a, D> {
    pub fn frame_info(&self) -> FrameInfo {
        self.info
    }

    pub fn set_playing(&mut self, is_playing: bool) {
        self.info.is_playing = is_playing;
    }

    /// Register an externally owned buffer. Writes to it are side effects
    /// that keep their passes alive.
    pub fn import_texture(&mut self, name: impl Into<String>, image: &'a mut ImageBuffer) -> TextureHandle {
        let desc = TextureDesc::of_image(name, image);
        self.push_resource(desc, ResourceKind::Imported, Backing::Imported(image))
    }

    /// Declare a frame-scoped texture. Storage is acquired when a pass first uses it.
    pub fn create_texture(&mut self, desc: TextureDesc) -> GraphResult<TextureHandle> {
        desc.validate()?;
        Ok(self.push_resource(desc, ResourceKind::Created, Backing::Unallocated))
    }

    pub fn texture_desc(&self, handle: TextureHandle) -> GraphResult<&TextureDesc> {
        self.check_handle(handle)?;
        Ok(&self.resources[handle.index as usize].desc)
    }

    pub fn texture_count(&self) -> usize {
        self.resources.len()
    }

    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    pub fn add_raster_pass(&mut self, name: impl Into<String>, data: D) -> PassBuilder<'_, 'a, D> {
        PassBuilder::new(self, name.into(), PassType::Raster, data)
    }

    pub fn add_unsafe_pass(&mut self, name: impl Into<String>, data: D) -> PassBuilder<'_, 'a, D> {
        PassBuilder::new(self, name.into(), PassType::Unsafe, data)
    }

    /// Validate, cull, order and group the recorded passes.
    pub fn compile(&self) -> GraphResult<CompiledGraph> {
        compile::compile(&self.passes, &self.resources)
    }

    /// Compile and run every surviving pass in order.
    ///
    /// Pooled textures are acquired right before their first user and go
    /// back to the pool after their last one. A texture a global parameter
    /// still refers to goes back after the first later pass that leaves it
    /// unreferenced, or at frame end.
    pub fn execute<E, F>(mut self, mut executor: F) -> Result<ExecutionReport, E>
    where
        E: From<GraphError>,
        F: FnMut(&D, &mut PassContext<'_, 'a>) -> Result<(), E>,
    {
        let compiled = self.compile()?;
        let serial = self.info.serial;
        let mut globals = GlobalParams::new();
        let mut executed = Vec::with_capacity(compiled.passes.len());
        let mut deferred: Vec<usize> = Vec::new();

        for (position, compiled_pass) in compiled.passes.iter().enumerate() {
            for t in compiled.first_used_at(position) {
                let resource = &mut self.resources[t];
                if matches!(resource.backing, Backing::Unallocated) {
                    let image = self.pool.acquire(&resource.desc).map_err(GraphError::from)?;
                    resource.backing = Backing::Pooled(image);
                }
            }

            let pass = &self.passes[compiled_pass.index];
            tracing::trace!(pass = %pass.name, position, "execute pass");
            let mut ctx = PassContext {
                pass_name: &pass.name,
                accesses: &pass.accesses,
                resources: &mut self.resources,
                globals: &mut globals,
                info: self.info,
            };
            executor(&pass.data, &mut ctx)?;

            for (id, handle) in &pass.globals_after {
                globals.set_texture(*id, *handle);
            }
            executed.push(pass.name.clone());

            // Textures past their last use wait here while a global still
            // points at them.
            deferred.extend(compiled.last_used_at(position));
            deferred.retain(|&t| {
                let handle = TextureHandle {
                    index: t as u32,
                    frame: serial,
                };
                if globals.references(handle) {
                    return true;
                }
                if let Backing::Pooled(image) =
                    std::mem::replace(&mut self.resources[t].backing, Backing::Released)
                {
                    self.pool.release(image);
                }
                false
            });
        }

        let mut published = HashMap::new();
        let mut floats = HashMap::new();
        for (id, value) in globals.iter() {
            match value {
                GlobalValue::Texture(handle) => {
                    if let Some(image) = self.resources[handle.index as usize].backing.image() {
                        published.insert(id, image.clone());
                    }
                }
                GlobalValue::Float(value) => {
                    floats.insert(id, value);
                }
            }
        }

        tracing::debug!(
            frame = serial,
            executed = executed.len(),
            culled = compiled.culled.len(),
            "frame executed"
        );

        Ok(ExecutionReport {
            frame: serial,
            executed,
            culled: compiled.culled,
            native_passes: compiled.native_passes.len(),
            published,
            floats,
        })
    }

    pub(crate) fn check_handle(&self, handle: TextureHandle) -> GraphResult<()> {
        check_handle(&self.resources, self.info.serial, handle).map(|_| ())
    }

    pub(crate) fn push_pass(&mut self, decl: PassDecl<D>) -> usize {
        self.passes.push(decl);
        self.passes.len() - 1
    }

    fn push_resource(&mut self, desc: TextureDesc, kind: ResourceKind, backing: Backing<'a>) -> TextureHandle {
        let handle = TextureHandle {
            index: self.resources.len() as u32,
            frame: self.info.serial,
        };
        self.resources.push(TextureResource { desc, kind, backing });
        handle
    }
}

impl<D> Drop for FrameGraph<'_, D> {
    fn drop(&mut self) {
        for resource in &mut self.resources {
            if let Backing::Pooled(image) = std::mem::replace(&mut resource.backing, Backing::Released) {
                self.pool.release(image);
            }
        }
    }
}

fn check_handle(resources: &[TextureResource<'_>], serial: u64, handle: TextureHandle) -> GraphResult<usize> {
    if handle.frame != serial {
        return Err(GraphError::StaleHandle {
            index: handle.index,
            handle_frame: handle.frame,
            current_frame: serial,
        });
    }
    let index = handle.index as usize;
    if index >= resources.len() {
        return Err(GraphError::UnknownHandle { index: handle.index });
    }
    Ok(index)
}

/// Shared lookup for [`PassContext`] and [`TextureView`].
struct Lookup<'v, 'a> {
    pass_name: &'v str,
    accesses: &'v [(TextureHandle, AccessFlags)],
    resources: &'v [TextureResource<'a>],
    serial: u64,
}

impl<'v, 'a> Lookup<'v, 'a> {
    fn declared(&self, handle: TextureHandle, requested: AccessFlags) -> GraphResult<usize> {
        let index = check_handle(self.resources, self.serial, handle)?;
        let granted = self
            .accesses
            .iter()
            .find(|(h, _)| *h == handle)
            .map(|(_, access)| *access);
        match granted {
            Some(access) if access.allows(requested) => Ok(index),
            _ => Err(GraphError::UndeclaredAccess {
                pass: self.pass_name.to_string(),
                texture: self.resources[index].desc.name.clone(),
                access: requested,
            }),
        }
    }

    fn image(&self, handle: TextureHandle) -> GraphResult<&'v ImageBuffer> {
        let index = self.declared(handle, AccessFlags::Read)?;
        let resource = &self.resources[index];
        resource
            .backing
            .image()
            .ok_or_else(|| GraphError::TextureUnavailable {
                texture: resource.desc.name.clone(),
                state: resource.backing.describe(),
            })
    }
}

/// Execution-time access for one pass. Only textures the pass declared are
/// reachable.
pub struct PassContext<'c, 'a> {
    pass_name: &'c str,
    accesses: &'c [(TextureHandle, AccessFlags)],
    resources: &'c mut [TextureResource<'a>],
    globals: &'c mut GlobalParams,
    info: FrameInfo,
}

impl<'c, 'a> PassContext<'c, 'a> {
    pub fn pass_name(&self) -> &str {
        self.pass_name
    }

    pub fn frame_info(&self) -> FrameInfo {
        self.info
    }

    fn lookup(&self) -> Lookup<'_, 'a> {
        Lookup {
            pass_name: self.pass_name,
            accesses: self.accesses,
            resources: self.resources,
            serial: self.info.serial,
        }
    }

    fn view(&self) -> TextureView<'_> {
        TextureView {
            lookup: Lookup {
                pass_name: self.pass_name,
                accesses: self.accesses,
                resources: self.resources,
                serial: self.info.serial,
            },
            globals: self.globals,
        }
    }

    /// Read access to a declared texture.
    pub fn texture(&self, handle: TextureHandle) -> GraphResult<&ImageBuffer> {
        let index = self.lookup().declared(handle, AccessFlags::Read)?;
        let resource = &self.resources[index];
        resource
            .backing
            .image()
            .ok_or_else(|| GraphError::TextureUnavailable {
                texture: resource.desc.name.clone(),
                state: resource.backing.describe(),
            })
    }

    pub fn texture_desc(&self, handle: TextureHandle) -> GraphResult<&TextureDesc> {
        let index = check_handle(self.resources, self.info.serial, handle)?;
        Ok(&self.resources[index].desc)
    }

    /// Bind `handle` as the render target and run `draw` against it.
    ///
    /// While bound, the target cannot be sampled through the view.
    pub fn render_to<R>(
        &mut self,
        handle: TextureHandle,
        draw: impl FnOnce(&mut ImageBuffer, &TextureView<'_>) -> R,
    ) -> GraphResult<R> {
        let index = self.lookup().declared(handle, AccessFlags::Write)?;
        match std::mem::replace(&mut self.resources[index].backing, Backing::InUse) {
            Backing::Pooled(mut image) => {
                let result = draw(&mut image, &self.view());
                self.resources[index].backing = Backing::Pooled(image);
                Ok(result)
            }
            Backing::Imported(image) => {
                let result = draw(&mut *image, &self.view());
                self.resources[index].backing = Backing::Imported(image);
                Ok(result)
            }
            other => {
                let state = other.describe();
                self.resources[index].backing = other;
                Err(GraphError::TextureUnavailable {
                    texture: self.resources[index].desc.name.clone(),
                    state,
                })
            }
        }
    }

    pub fn clear(&mut self, handle: TextureHandle, color: &Color) -> GraphResult<()> {
        self.render_to(handle, |target, _| target.fill(color))
    }

    pub fn set_global_float(&mut self, id: PropertyId, value: f32) {
        self.globals.set_float(id, value);
    }

    /// Publish a texture the pass declared as a global parameter.
    pub fn set_global_texture(&mut self, id: PropertyId, handle: TextureHandle) -> GraphResult<()> {
        let index = check_handle(self.resources, self.info.serial, handle)?;
        if !self.accesses.iter().any(|(h, _)| *h == handle) {
            return Err(GraphError::UndeclaredAccess {
                pass: self.pass_name.to_string(),
                texture: self.resources[index].desc.name.clone(),
                access: AccessFlags::Read,
            });
        }
        self.globals.set_texture(id, handle);
        Ok(())
    }

    pub fn global_float(&self, id: PropertyId) -> Option<f32> {
        self.globals.float(id)
    }

    pub fn global_texture(&self, id: PropertyId) -> Option<TextureHandle> {
        self.globals.texture(id)
    }
}

/// Read-only view handed to a draw callback while its target is bound.
pub struct TextureView<'v> {
    lookup: Lookup<'v, 'v>,
    globals: &'v GlobalParams,
}

impl<'v> TextureView<'v> {
    pub fn texture(&self, handle: TextureHandle) -> GraphResult<&'v ImageBuffer> {
        self.lookup.image(handle)
    }

    pub fn global_float(&self, id: PropertyId) -> Option<f32> {
        self.globals.float(id)
    }

    pub fn global_texture(&self, id: PropertyId) -> Option<TextureHandle> {
        self.globals.texture(id)
    }

    /// Resolve global texture `id` and sample access to it in one step.
    pub fn global_image(&self, id: PropertyId) -> GraphResult<Option<&'v ImageBuffer>> {
        match self.globals.texture(id) {
            Some(handle) => self.lookup.image(handle).map(Some),
            None => Ok(None),
        }
    }
}

/// What happened during one executed frame.
#[derive(Debug, Default)]
pub struct ExecutionReport {
    pub frame: u64,
    /// Names of the passes that ran, in order.
    pub executed: Vec<String>,
    pub culled: Vec<String>,
    pub native_passes: usize,
    published: HashMap<PropertyId, ImageBuffer>,
    floats: HashMap<PropertyId, f32>,
}

impl ExecutionReport {
    pub fn ran(&self, pass: &str) -> bool {
        self.executed.iter().any(|name| name == pass)
    }

    /// Snapshot, at frame end, of the texture bound to global `id`.
    pub fn published_texture(&self, id: PropertyId) -> Option<&ImageBuffer> {
        self.published.get(&id)
    }

    /// Value of global float `id` at frame end.
    pub fn global_float(&self, id: PropertyId) -> Option<f32> {
        self.floats.get(&id).copied()
    }

    /// Take ownership of a published texture snapshot.
    pub fn take_published(&mut self, id: PropertyId) -> Option<ImageBuffer> {
        self.published.remove(&id)
    }
}
