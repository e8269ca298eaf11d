//! Global shader property ids used by the blur passes.

use std::sync::LazyLock;

use frost_graph::PropertyId;

pub struct ShaderIds {
    /// Texture the kernel samples for the current step.
    pub down_sample_tex: PropertyId,
    /// Unblurred source of the UI blur.
    pub origin_tex: PropertyId,
    /// Final result of a blur chain.
    pub blur_tex: PropertyId,
    pub blur_offset: PropertyId,
    /// Source slot of the layer filter material.
    pub main_tex: PropertyId,
    pub camera_opaque_texture: PropertyId,
}

pub static IDS: LazyLock<ShaderIds> = LazyLock::new(|| ShaderIds {
    down_sample_tex: PropertyId::from_name("_DownSampleTex"),
    origin_tex: PropertyId::from_name("_OriginTex"),
    blur_tex: PropertyId::from_name("_BlurTex"),
    blur_offset: PropertyId::from_name("_blurOffset"),
    main_tex: PropertyId::from_name("_MainTex"),
    camera_opaque_texture: PropertyId::from_name("_CameraOpaqueTexture"),
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_distinct() {
        let ids = [
            IDS.down_sample_tex,
            IDS.origin_tex,
            IDS.blur_tex,
            IDS.blur_offset,
            IDS.main_tex,
            IDS.camera_opaque_texture,
        ];
        for (i, a) in ids.iter().enumerate() {
            for b in &ids[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert_eq!(IDS.blur_tex, PropertyId::from_name("_BlurTex"));
    }
}
