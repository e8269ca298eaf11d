//! Texture handles, descriptors and per-frame resource slots.

use frost_core::{Color, GraphicsFormat, ImageBuffer, MsaaSamples};
use serde::Serialize;

use crate::error::{GraphError, GraphResult};

/// Opaque handle to a texture of one frame.
///
/// Handles carry the serial of the frame that produced them and are rejected
/// by every other frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle {
    pub(crate) index: u32,
    pub(crate) frame: u64,
}

impl TextureHandle {
    /// Serial of the frame this handle belongs to.
    pub fn frame(&self) -> u64 {
        self.frame
    }
}

/// How a pass touches a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AccessFlags {
    Read,
    Write,
    ReadWrite,
}

impl AccessFlags {
    pub fn reads(&self) -> bool {
        matches!(self, AccessFlags::Read | AccessFlags::ReadWrite)
    }

    pub fn writes(&self) -> bool {
        matches!(self, AccessFlags::Write | AccessFlags::ReadWrite)
    }

    /// Whether `self` grants everything `requested` needs.
    pub fn allows(&self, requested: AccessFlags) -> bool {
        (!requested.reads() || self.reads()) && (!requested.writes() || self.writes())
    }

    pub(crate) fn union(self, other: AccessFlags) -> AccessFlags {
        if (self.reads() || other.reads()) && (self.writes() || other.writes()) {
            AccessFlags::ReadWrite
        } else if self.writes() || other.writes() {
            AccessFlags::Write
        } else {
            AccessFlags::Read
        }
    }
}

/// Descriptor of a frame-scoped texture.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureDesc {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub format: GraphicsFormat,
    pub msaa: MsaaSamples,
    /// Clear to `clear_color` when the backing buffer is acquired.
    pub clear_buffer: bool,
    pub clear_color: Color,
}

impl TextureDesc {
    pub fn new(name: impl Into<String>, width: u32, height: u32, format: GraphicsFormat) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            format,
            msaa: MsaaSamples::None,
            clear_buffer: true,
            clear_color: Color::TRANSPARENT,
        }
    }

    /// Describe an existing image.
    pub fn of_image(name: impl Into<String>, image: &ImageBuffer) -> Self {
        Self {
            msaa: image.msaa(),
            ..Self::new(name, image.width(), image.height(), image.format())
        }
    }

    pub(crate) fn validate(&self) -> GraphResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(GraphError::InvalidDescriptor {
                name: self.name.clone(),
                reason: format!("size {}x{} must be positive", self.width, self.height),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ResourceKind {
    Created,
    Imported,
}

/// Storage state of a resource slot during a frame.
pub(crate) enum Backing<'a> {
    Unallocated,
    Pooled(ImageBuffer),
    Imported(&'a mut ImageBuffer),
    InUse,
    Released,
}

impl Backing<'_> {
    pub(crate) fn describe(&self) -> &'static str {
        match self {
            Backing::Unallocated => "not allocated yet",
            Backing::Pooled(_) | Backing::Imported(_) => "available",
            Backing::InUse => "bound as the current render target",
            Backing::Released => "released after its last use",
        }
    }

    pub(crate) fn image(&self) -> Option<&ImageBuffer> {
        match self {
            Backing::Pooled(image) => Some(image),
            Backing::Imported(image) => Some(&**image),
            _ => None,
        }
    }
}

pub(crate) struct TextureResource<'a> {
    pub(crate) desc: TextureDesc,
    pub(crate) kind: ResourceKind,
    pub(crate) backing: Backing<'a>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_allows() {
        assert!(AccessFlags::ReadWrite.allows(AccessFlags::Read));
        assert!(AccessFlags::ReadWrite.allows(AccessFlags::Write));
        assert!(!AccessFlags::Read.allows(AccessFlags::Write));
        assert!(!AccessFlags::Write.allows(AccessFlags::Read));
    }

    #[test]
    fn test_access_union() {
        assert_eq!(AccessFlags::Read.union(AccessFlags::Write), AccessFlags::ReadWrite);
        assert_eq!(AccessFlags::Read.union(AccessFlags::Read), AccessFlags::Read);
        assert_eq!(AccessFlags::Write.union(AccessFlags::Write), AccessFlags::Write);
    }

    #[test]
    fn test_desc_validation() {
        let desc = TextureDesc::new("tiny", 0, 4, GraphicsFormat::R8G8B8A8Unorm);
        assert!(desc.validate().is_err());
        assert!(TextureDesc::new("ok", 1, 1, GraphicsFormat::R8G8B8A8Unorm)
            .validate()
            .is_ok());
    }
}
