//! # frost-core
//!
//! Core types shared by every Frost crate: image buffers, graphics formats
//! and their fallback selection, colors, rectangles, content hashing, the
//! error type and the TOML configuration model.

pub mod color;
pub mod config;
pub mod error;
pub mod format;
pub mod frame;
pub mod hash;
pub mod math;
pub mod types;

pub use config::*;

pub use color::Color;
pub use error::{FrostError, FrostResult};
pub use format::{ColorSpace, FormatSupport, FormatUsage, GraphicsFormat, MsaaSamples, PlatformCaps};
pub use frame::ImageBuffer;
pub use math::{IntRect, ScaleBias};
pub use types::{CameraType, LayerMask, RenderPassEvent};
