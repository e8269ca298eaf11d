//! Graphics formats, multisampling and platform format-support queries.
//!
//! The storage of an [`ImageBuffer`](crate::ImageBuffer) is always RGBA f32;
//! the format decides how values are clamped and quantized on store.

use serde::{Deserialize, Serialize};

/// Texel format of a render texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GraphicsFormat {
    /// 8-bit RGBA, sRGB encoded.
    R8G8B8A8Srgb,
    /// 8-bit RGBA, linear unsigned normalized.
    R8G8B8A8Unorm,
    /// Packed unsigned float RGB (11/11/10 bits), no alpha channel.
    B10G11R11UFloatPack32,
    /// 16-bit float RGBA.
    R16G16B16A16Sfloat,
    /// 32-bit float RGBA.
    R32G32B32A32Sfloat,
    /// 32-bit float depth.
    D32Sfloat,
}

impl GraphicsFormat {
    /// Apply the format's storage rules to a texel.
    pub fn store(&self, px: [f32; 4]) -> [f32; 4] {
        match self {
            GraphicsFormat::R8G8B8A8Srgb | GraphicsFormat::R8G8B8A8Unorm => {
                px.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() / 255.0)
            }
            GraphicsFormat::B10G11R11UFloatPack32 => {
                [px[0].max(0.0), px[1].max(0.0), px[2].max(0.0), 1.0]
            }
            GraphicsFormat::D32Sfloat => [px[0], 0.0, 0.0, 1.0],
            GraphicsFormat::R16G16B16A16Sfloat | GraphicsFormat::R32G32B32A32Sfloat => px,
        }
    }
}

/// Multisample count of a render texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MsaaSamples {
    #[default]
    None,
    X2,
    X4,
    X8,
}

/// Active color space of the project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorSpace {
    #[default]
    Linear,
    Gamma,
}

/// Usage bits queried together with a format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatUsage {
    pub linear: bool,
    pub render: bool,
}

impl FormatUsage {
    pub const LINEAR_RENDER: FormatUsage = FormatUsage {
        linear: true,
        render: true,
    };
}

/// Platform query for format support.
pub trait FormatSupport {
    /// Returns true if the platform can use `format` for `usage`.
    fn is_format_supported(&self, format: GraphicsFormat, usage: FormatUsage) -> bool;
}

/// Static description of what the running platform supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformCaps {
    /// Whether packed float render targets can be sampled linearly and rendered to.
    pub packed_float_support: bool,
    pub color_space: ColorSpace,
}

impl Default for PlatformCaps {
    fn default() -> Self {
        Self {
            packed_float_support: true,
            color_space: ColorSpace::Linear,
        }
    }
}

impl FormatSupport for PlatformCaps {
    fn is_format_supported(&self, format: GraphicsFormat, usage: FormatUsage) -> bool {
        match format {
            GraphicsFormat::B10G11R11UFloatPack32 => self.packed_float_support,
            GraphicsFormat::D32Sfloat => !usage.linear,
            _ => true,
        }
    }
}

/// Pick the format of a mask render target.
///
/// Prefers the packed float format; otherwise falls back to an 8-bit format
/// matching the color space.
pub fn select_mask_format(caps: &dyn FormatSupport, color_space: ColorSpace) -> GraphicsFormat {
    if caps.is_format_supported(
        GraphicsFormat::B10G11R11UFloatPack32,
        FormatUsage::LINEAR_RENDER,
    ) {
        return GraphicsFormat::B10G11R11UFloatPack32;
    }

    let fallback = match color_space {
        ColorSpace::Linear => GraphicsFormat::R8G8B8A8Srgb,
        ColorSpace::Gamma => GraphicsFormat::R8G8B8A8Unorm,
    };
    tracing::debug!(?fallback, "packed float format unsupported, falling back");
    fallback
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoPackedFloat;

    impl FormatSupport for NoPackedFloat {
        fn is_format_supported(&self, format: GraphicsFormat, _usage: FormatUsage) -> bool {
            format != GraphicsFormat::B10G11R11UFloatPack32
        }
    }

    #[test]
    fn test_prefers_packed_float() {
        let caps = PlatformCaps::default();
        assert_eq!(
            select_mask_format(&caps, ColorSpace::Gamma),
            GraphicsFormat::B10G11R11UFloatPack32
        );
    }

    #[test]
    fn test_fallback_linear_is_srgb() {
        assert_eq!(
            select_mask_format(&NoPackedFloat, ColorSpace::Linear),
            GraphicsFormat::R8G8B8A8Srgb
        );
    }

    #[test]
    fn test_fallback_gamma_is_unorm() {
        assert_eq!(
            select_mask_format(&NoPackedFloat, ColorSpace::Gamma),
            GraphicsFormat::R8G8B8A8Unorm
        );
    }

    #[test]
    fn test_store_rules() {
        let px = [1.5, -0.2, 0.5, 0.25];
        assert_eq!(
            GraphicsFormat::B10G11R11UFloatPack32.store(px),
            [1.5, 0.0, 0.5, 1.0]
        );
        let unorm = GraphicsFormat::R8G8B8A8Unorm.store(px);
        assert_eq!(unorm[0], 1.0);
        assert_eq!(unorm[1], 0.0);
        assert!((unorm[2] - 128.0 / 255.0).abs() < 1e-6);
        assert_eq!(GraphicsFormat::R32G32B32A32Sfloat.store(px), px);
    }
}
