//! # frost-graph
//!
//! A frame-scoped render graph. Passes declare the textures they create,
//! read and write before anything runs; the graph validates those
//! declarations, culls passes whose outputs nobody consumes, orders the rest
//! by their data dependencies, groups compatible raster passes into native
//! passes, and finally executes them with pooled, frame-scoped textures.
//!
//! ## Usage
//!
//! ```ignore
//! let mut graph = RenderGraph::new();
//! let mut frame = graph.begin_frame::<MyPassData>();
//! let color = frame.import_texture("color", &mut color_buffer);
//! let tmp = frame.create_texture(TextureDesc::new("tmp", 64, 64, format))?;
//! frame.add_raster_pass("downsample", data)
//!     .use_texture(color, AccessFlags::Read)
//!     .set_render_attachment(tmp, 0, AccessFlags::Write)
//!     .build()?;
//! let report = frame.execute(|data, ctx| run(data, ctx))?;
//! ```

pub mod compile;
pub mod error;
pub mod frame;
pub mod globals;
pub mod pass;
pub mod pool;
pub mod resource;

pub use compile::{CompiledGraph, CompiledPass, NativePass, TextureLifetime};
pub use error::{GraphError, GraphResult};
pub use frame::{ExecutionReport, FrameGraph, FrameInfo, PassContext, RenderGraph, TextureView};
pub use globals::{GlobalParams, GlobalValue, PropertyId};
pub use pass::{PassBuilder, PassType};
pub use pool::{PoolStats, TexturePool};
pub use resource::{AccessFlags, TextureDesc, TextureHandle};
