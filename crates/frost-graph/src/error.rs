/// Render graph error types.
use frost_core::FrostError;

use crate::resource::AccessFlags;

/// A specialized Result type for render graph operations.
pub type GraphResult<T> = Result<T, GraphError>;

/// Errors surfaced while declaring, compiling or executing a frame graph.
///
/// Every variant is fatal for the frame it occurred in.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("texture handle #{index} belongs to frame {handle_frame}, current frame is {current_frame}")]
    StaleHandle {
        index: u32,
        handle_frame: u64,
        current_frame: u64,
    },

    #[error("unknown texture handle #{index}")]
    UnknownHandle { index: u32 },

    #[error("invalid texture descriptor '{name}': {reason}")]
    InvalidDescriptor { name: String, reason: String },

    #[error("invalid declaration in pass '{pass}': {reason}")]
    InvalidDeclaration { pass: String, reason: String },

    #[error("pass '{pass}' reads texture '{texture}' before any pass wrote it")]
    ReadBeforeWrite { pass: String, texture: String },

    #[error("pass '{pass}' accessed texture '{texture}' ({access:?}) without declaring it")]
    UndeclaredAccess {
        pass: String,
        texture: String,
        access: AccessFlags,
    },

    #[error("texture '{texture}' is not available: {state}")]
    TextureUnavailable { texture: String, state: &'static str },

    #[error("dependency cycle between passes")]
    Cycle,

    #[error(transparent)]
    Core(#[from] FrostError),
}

impl From<GraphError> for FrostError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::Core(inner) => inner,
            other => FrostError::Graph(other.to_string()),
        }
    }
}
