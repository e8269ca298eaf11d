//! Frame graph compilation.
//!
//! Compilation works on the declarations alone, nothing is allocated or
//! executed here:
//!
//! 1. read-before-write validation in declaration order,
//! 2. dependency edges (read-after-write, write-after-read, write-after-write),
//! 3. culling of passes whose outputs are never consumed,
//! 4. topological ordering of the survivors,
//! 5. grouping of compatible raster passes into native passes,
//! 6. first/last use of every texture in the final order.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use serde::Serialize;

use crate::error::{GraphError, GraphResult};
use crate::pass::{PassDecl, PassType};
use crate::resource::{ResourceKind, TextureHandle, TextureResource};

/// A pass that survived culling, in execution order.
#[derive(Debug, Clone, Serialize)]
pub struct CompiledPass {
    /// Declaration index.
    pub index: usize,
    pub name: String,
    pub pass_type: PassType,
    /// Index into [`CompiledGraph::native_passes`], raster passes only.
    pub native_pass: Option<usize>,
}

/// Consecutive raster passes sharing one set of attachments.
#[derive(Debug, Clone, Serialize)]
pub struct NativePass {
    pub passes: Vec<String>,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct TextureLifetime {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub imported: bool,
    /// Position in the execution order of the first pass touching the texture.
    pub first_use: Option<usize>,
    pub last_use: Option<usize>,
    /// Published as a global after some pass; kept alive until frame end.
    pub pinned: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompiledGraph {
    pub passes: Vec<CompiledPass>,
    pub culled: Vec<String>,
    pub native_passes: Vec<NativePass>,
    pub textures: Vec<TextureLifetime>,
}

impl CompiledGraph {
    /// Names of the passes that will run, in order.
    pub fn pass_names(&self) -> Vec<&str> {
        self.passes.iter().map(|p| p.name.as_str()).collect()
    }

    /// Textures to acquire before the pass at `position` runs.
    pub(crate) fn first_used_at(&self, position: usize) -> impl Iterator<Item = usize> + '_ {
        self.textures
            .iter()
            .enumerate()
            .filter(move |(_, t)| !t.imported && t.first_use == Some(position))
            .map(|(i, _)| i)
    }

    /// Textures whose last user is the pass at `position`.
    pub(crate) fn last_used_at(&self, position: usize) -> impl Iterator<Item = usize> + '_ {
        self.textures
            .iter()
            .enumerate()
            .filter(move |(_, t)| !t.imported && !t.pinned && t.last_use == Some(position))
            .map(|(i, _)| i)
    }
}

pub(crate) fn compile<D>(
    passes: &[PassDecl<D>],
    resources: &[TextureResource<'_>],
) -> GraphResult<CompiledGraph> {
    check_read_before_write(passes, resources)?;

    let edges = build_edges(passes, resources.len());
    let needed = cull(passes, resources, &edges);
    let order = topological_order(passes.len(), &edges, &needed)?;

    let culled: Vec<String> = passes
        .iter()
        .zip(&needed)
        .filter(|(_, keep)| !**keep)
        .map(|(p, _)| p.name.clone())
        .collect();
    for name in &culled {
        tracing::debug!(pass = %name, "culled: outputs never consumed");
    }

    let (compiled, native_passes) = group_native_passes(passes, resources, &order);
    let textures = lifetimes(passes, resources, &order);

    Ok(CompiledGraph {
        passes: compiled,
        culled,
        native_passes,
        textures,
    })
}

fn check_read_before_write<D>(
    passes: &[PassDecl<D>],
    resources: &[TextureResource<'_>],
) -> GraphResult<()> {
    let mut written: Vec<bool> = resources
        .iter()
        .map(|r| r.kind == ResourceKind::Imported)
        .collect();

    for pass in passes {
        for (handle, access) in &pass.accesses {
            let slot = handle.index as usize;
            if access.writes() {
                continue;
            }
            if !written[slot] {
                return Err(GraphError::ReadBeforeWrite {
                    pass: pass.name.clone(),
                    texture: resources[slot].desc.name.clone(),
                });
            }
        }
        for (handle, access) in &pass.accesses {
            if access.writes() {
                written[handle.index as usize] = true;
            }
        }
    }
    Ok(())
}

/// Per-pass dependency lists. `raw[p]` holds consumers of data produced by
/// `p`; `all[p]` holds every pass that must run after `p`.
struct Edges {
    raw: Vec<Vec<usize>>,
    all: Vec<Vec<usize>>,
}

fn build_edges<D>(passes: &[PassDecl<D>], texture_count: usize) -> Edges {
    let mut raw: Vec<Vec<usize>> = vec![Vec::new(); passes.len()];
    let mut all: Vec<Vec<usize>> = vec![Vec::new(); passes.len()];
    let mut last_writer: Vec<Option<usize>> = vec![None; texture_count];
    let mut readers: Vec<Vec<usize>> = vec![Vec::new(); texture_count];

    for (p, pass) in passes.iter().enumerate() {
        for (handle, access) in &pass.accesses {
            let t = handle.index as usize;
            if access.reads() {
                if let Some(writer) = last_writer[t] {
                    link(&mut raw, writer, p);
                    link(&mut all, writer, p);
                }
                readers[t].push(p);
            }
            if access.writes() {
                for &reader in &readers[t] {
                    link(&mut all, reader, p);
                }
                if let Some(writer) = last_writer[t] {
                    link(&mut all, writer, p);
                }
                last_writer[t] = Some(p);
                readers[t].clear();
            }
        }
    }

    Edges { raw, all }
}

fn link(list: &mut [Vec<usize>], from: usize, to: usize) {
    if from != to && !list[from].contains(&to) {
        list[from].push(to);
    }
}

/// Decide which passes survive.
///
/// A pass is needed when culling is disabled for it, when it writes an
/// imported texture, when it publishes a global texture, or when a needed
/// pass reads something it wrote. Edges only point forward in declaration
/// order, so one reverse sweep settles every pass.
fn cull<D>(passes: &[PassDecl<D>], resources: &[TextureResource<'_>], edges: &Edges) -> Vec<bool> {
    let mut needed = vec![false; passes.len()];
    for p in (0..passes.len()).rev() {
        let pass = &passes[p];
        let side_effect = pass.accesses.iter().any(|(h, access)| {
            access.writes() && resources[h.index as usize].kind == ResourceKind::Imported
        });
        needed[p] = !pass.allow_culling
            || side_effect
            || !pass.globals_after.is_empty()
            || edges.raw[p].iter().any(|&consumer| needed[consumer]);
    }
    needed
}

/// Kahn's algorithm over the surviving passes; ties go to the pass declared first.
fn topological_order(pass_count: usize, edges: &Edges, needed: &[bool]) -> GraphResult<Vec<usize>> {
    let mut in_degree = vec![0usize; pass_count];
    for p in (0..pass_count).filter(|&p| needed[p]) {
        for &next in &edges.all[p] {
            if needed[next] {
                in_degree[next] += 1;
            }
        }
    }

    let mut ready: BinaryHeap<Reverse<usize>> = (0..pass_count)
        .filter(|&p| needed[p] && in_degree[p] == 0)
        .map(Reverse)
        .collect();

    let mut order = Vec::with_capacity(pass_count);
    while let Some(Reverse(p)) = ready.pop() {
        order.push(p);
        for &next in &edges.all[p] {
            if !needed[next] {
                continue;
            }
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                ready.push(Reverse(next));
            }
        }
    }

    if order.len() != needed.iter().filter(|n| **n).count() {
        return Err(GraphError::Cycle);
    }
    Ok(order)
}

fn can_merge<D>(group: &[&PassDecl<D>], next: &PassDecl<D>) -> bool {
    let Some(first) = group.first() else {
        return false;
    };
    if next.pass_type != PassType::Raster || !next.allow_merging || !first.allow_merging {
        return false;
    }
    if first.color_attachments != next.color_attachments
        || first.depth_attachment != next.depth_attachment
    {
        return false;
    }
    // the later pass may not sample what the group renders to
    !first.attachments().any(|h| next.sampled.contains(&h))
}

fn group_native_passes<D>(
    passes: &[PassDecl<D>],
    resources: &[TextureResource<'_>],
    order: &[usize],
) -> (Vec<CompiledPass>, Vec<NativePass>) {
    let mut compiled = Vec::with_capacity(order.len());
    let mut native_passes: Vec<NativePass> = Vec::new();
    let mut group: Vec<&PassDecl<D>> = Vec::new();

    for &p in order {
        let pass = &passes[p];
        let native_pass = if pass.pass_type == PassType::Raster && pass.has_attachments() {
            if can_merge(&group, pass) {
                if let Some(native) = native_passes.last_mut() {
                    native.passes.push(pass.name.clone());
                }
                group.push(pass);
            } else {
                let (width, height) = pass
                    .attachments()
                    .next()
                    .map(|h| {
                        let desc = &resources[h.index as usize].desc;
                        (desc.width, desc.height)
                    })
                    .unwrap_or((0, 0));
                native_passes.push(NativePass {
                    passes: vec![pass.name.clone()],
                    width,
                    height,
                });
                group = vec![pass];
            }
            Some(native_passes.len() - 1)
        } else {
            group.clear();
            None
        };

        compiled.push(CompiledPass {
            index: p,
            name: pass.name.clone(),
            pass_type: pass.pass_type,
            native_pass,
        });
    }

    (compiled, native_passes)
}

fn lifetimes<D>(
    passes: &[PassDecl<D>],
    resources: &[TextureResource<'_>],
    order: &[usize],
) -> Vec<TextureLifetime> {
    let mut textures: Vec<TextureLifetime> = resources
        .iter()
        .map(|r| TextureLifetime {
            name: r.desc.name.clone(),
            width: r.desc.width,
            height: r.desc.height,
            imported: r.kind == ResourceKind::Imported,
            first_use: None,
            last_use: None,
            pinned: false,
        })
        .collect();

    let mut touch = |handle: TextureHandle, position: usize| {
        let t = &mut textures[handle.index as usize];
        t.first_use.get_or_insert(position);
        t.last_use = Some(position);
    };

    for (position, &p) in order.iter().enumerate() {
        for (handle, _) in &passes[p].accesses {
            touch(*handle, position);
        }
        for (_, handle) in &passes[p].globals_after {
            touch(*handle, position);
        }
    }

    for &p in order {
        for (_, handle) in &passes[p].globals_after {
            textures[handle.index as usize].pinned = true;
        }
    }

    textures
}
