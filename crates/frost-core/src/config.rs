use serde::{Deserialize, Serialize};

use crate::error::{FrostError, FrostResult};
use crate::format::PlatformCaps;
use crate::types::{LayerMask, RenderPassEvent};

/// Allowed blur iteration range.
pub const BLUR_ITERATION_RANGE: std::ops::RangeInclusive<u32> = 1..=5;
/// Allowed blur offset range.
pub const BLUR_OFFSET_RANGE: std::ops::RangeInclusive<f32> = 0.1..=3.0;

/// Iteration count and sampling offset of a blur chain.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BlurSettings {
    pub blur_iteration: u32,
    pub blur_offset: f32,
}

impl Default for BlurSettings {
    fn default() -> Self {
        Self {
            blur_iteration: 3,
            blur_offset: 1.0,
        }
    }
}

impl BlurSettings {
    pub fn new(blur_iteration: u32, blur_offset: f32) -> Self {
        Self {
            blur_iteration,
            blur_offset,
        }
    }

    /// Clamp both values into their allowed ranges.
    pub fn clamped(self) -> Self {
        let blur_iteration = self
            .blur_iteration
            .clamp(*BLUR_ITERATION_RANGE.start(), *BLUR_ITERATION_RANGE.end());
        let blur_offset = if self.blur_offset.is_nan() {
            *BLUR_OFFSET_RANGE.start()
        } else {
            self.blur_offset
                .clamp(*BLUR_OFFSET_RANGE.start(), *BLUR_OFFSET_RANGE.end())
        };
        if blur_iteration != self.blur_iteration || blur_offset != self.blur_offset {
            tracing::warn!(
                iteration = self.blur_iteration,
                offset = self.blur_offset,
                "blur settings out of range, clamped to {}/{}",
                blur_iteration,
                blur_offset
            );
        }
        Self {
            blur_iteration,
            blur_offset,
        }
    }

    fn validate(&self, section: &str, errors: &mut Vec<FrostError>) {
        if !BLUR_ITERATION_RANGE.contains(&self.blur_iteration) {
            errors.push(FrostError::config(format!(
                "[{section}] blur_iteration {} outside 1..=5",
                self.blur_iteration
            )));
        }
        if !BLUR_OFFSET_RANGE.contains(&self.blur_offset) {
            errors.push(FrostError::config(format!(
                "[{section}] blur_offset {} outside 0.1..=3.0",
                self.blur_offset
            )));
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct UiBlurConfig {
    pub enabled: bool,
    pub event: RenderPassEvent,
    #[serde(flatten)]
    pub blur: BlurSettings,
    /// Publish the blur results even outside play mode.
    pub always_show: bool,
}

impl Default for UiBlurConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            event: RenderPassEvent::AfterRenderingPostProcessing,
            blur: BlurSettings::default(),
            always_show: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WorldUiBlurConfig {
    pub enabled: bool,
    pub event: RenderPassEvent,
    pub layer_mask: LayerMask,
    pub filter_shader_tags: Vec<String>,
    pub draw_shader_tags: Vec<String>,
    #[serde(flatten)]
    pub blur: BlurSettings,
}

impl Default for WorldUiBlurConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            event: RenderPassEvent::AfterRenderingPostProcessing,
            layer_mask: LayerMask::NOTHING,
            filter_shader_tags: vec!["WorldUIPrePass".to_string()],
            draw_shader_tags: vec!["WorldUIDrawPass".to_string()],
            blur: BlurSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SpriteBlurConfig {
    pub enabled: bool,
    pub event: RenderPassEvent,
    pub layer_mask: LayerMask,
    pub filter_shader_tags: Vec<String>,
    pub draw_shader_tags: Vec<String>,
    #[serde(flatten)]
    pub blur: BlurSettings,
}

impl Default for SpriteBlurConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            event: RenderPassEvent::AfterRenderingPostProcessing,
            layer_mask: LayerMask::NOTHING,
            filter_shader_tags: vec!["SpriteBlurPrePass".to_string()],
            draw_shader_tags: vec!["SpriteBlurDraw".to_string()],
            blur: BlurSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LayerFilterConfig {
    pub enabled: bool,
    pub event: RenderPassEvent,
    pub layer_mask: LayerMask,
    pub shader_tags: Vec<String>,
    pub draw_shader_tags: Vec<String>,
    /// Name of the blur material; the feature stays inactive without one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
    #[serde(flatten)]
    pub blur: BlurSettings,
}

impl Default for LayerFilterConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            event: RenderPassEvent::AfterRenderingTransparents,
            layer_mask: LayerMask::NOTHING,
            shader_tags: vec!["SpriteRenderPrepass".to_string()],
            draw_shader_tags: vec!["SpriteRenderDraw".to_string()],
            material: None,
            blur: BlurSettings::default(),
        }
    }
}

/// Top-level configuration, usually loaded from `frost.toml`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
pub struct FrostConfig {
    #[serde(default)]
    pub ui_blur: UiBlurConfig,
    #[serde(default)]
    pub world_ui_blur: WorldUiBlurConfig,
    #[serde(default)]
    pub sprite_blur: SpriteBlurConfig,
    #[serde(default)]
    pub layer_filter: LayerFilterConfig,
    #[serde(default)]
    pub platform: PlatformCaps,
}

impl FrostConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(contents: &str) -> FrostResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn load_from_file(path: &std::path::Path) -> FrostResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn save_to_file(&self, path: &std::path::Path) -> FrostResult<()> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Report every out-of-range value.
    pub fn validate(&self) -> Result<(), Vec<FrostError>> {
        let mut errors = Vec::new();
        self.ui_blur.blur.validate("ui_blur", &mut errors);
        self.world_ui_blur.blur.validate("world_ui_blur", &mut errors);
        self.sprite_blur.blur.validate("sprite_blur", &mut errors);
        self.layer_filter.blur.validate("layer_filter", &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Clamp every blur section into range.
    pub fn clamped(mut self) -> Self {
        self.ui_blur.blur = self.ui_blur.blur.clamped();
        self.world_ui_blur.blur = self.world_ui_blur.blur.clamped();
        self.sprite_blur.blur = self.sprite_blur.blur.clamped();
        self.layer_filter.blur = self.layer_filter.blur.clamped();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ColorSpace;

    #[test]
    fn test_defaults_from_empty_toml() {
        let config = FrostConfig::from_toml_str("").unwrap();
        assert_eq!(config, FrostConfig::default());
        assert_eq!(config.ui_blur.blur.blur_iteration, 3);
        assert_eq!(config.world_ui_blur.filter_shader_tags, vec!["WorldUIPrePass"]);
        assert!(config.layer_filter.material.is_none());
    }

    #[test]
    fn test_partial_sections() {
        let config = FrostConfig::from_toml_str(
            r#"
            [ui_blur]
            blur_iteration = 5
            always_show = true
            event = "AfterRenderingTransparents"

            [sprite_blur]
            enabled = true
            layer_mask = 8

            [platform]
            packed_float_support = false
            color_space = "gamma"
            "#,
        )
        .unwrap();
        assert_eq!(config.ui_blur.blur.blur_iteration, 5);
        assert_eq!(config.ui_blur.blur.blur_offset, 1.0);
        assert!(config.ui_blur.always_show);
        assert_eq!(config.ui_blur.event, RenderPassEvent::AfterRenderingTransparents);
        assert!(config.sprite_blur.layer_mask.contains(3));
        assert_eq!(config.sprite_blur.draw_shader_tags, vec!["SpriteBlurDraw"]);
        assert!(!config.platform.packed_float_support);
        assert_eq!(config.platform.color_space, ColorSpace::Gamma);
    }

    #[test]
    fn test_validate_and_clamp() {
        let mut config = FrostConfig::default();
        config.ui_blur.blur = BlurSettings::new(9, 0.0);
        config.layer_filter.blur = BlurSettings::new(0, 1.0);
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 3);

        let clamped = config.clamped();
        assert_eq!(clamped.ui_blur.blur, BlurSettings::new(5, 0.1));
        assert_eq!(clamped.layer_filter.blur.blur_iteration, 1);
        assert!(clamped.validate().is_ok());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let path = std::env::temp_dir().join(format!("frost-config-{}.toml", std::process::id()));
        let mut config = FrostConfig::default();
        config.layer_filter.material = Some("dual-filter".into());
        config.save_to_file(&path).unwrap();
        let loaded = FrostConfig::load_from_file(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded, config);
    }
}
