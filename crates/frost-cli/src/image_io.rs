//! Image file I/O for the CLI.

use std::path::Path;

use anyhow::{Context, Result};
use frost_core::{GraphicsFormat, ImageBuffer};

/// Working format of images loaded from disk.
pub const WORK_FORMAT: GraphicsFormat = GraphicsFormat::R32G32B32A32Sfloat;

/// Load an image file into a float buffer.
pub fn load_image(path: &Path) -> Result<ImageBuffer> {
    let img = image::open(path).with_context(|| format!("failed to load image '{}'", path.display()))?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    tracing::debug!(path = %path.display(), width, height, "image loaded");
    Ok(ImageBuffer::from_rgba8(width, height, WORK_FORMAT, rgba.as_raw())?)
}

/// Save a buffer as 8-bit RGBA; the encoder is picked from the extension.
pub fn save_image(buffer: &ImageBuffer, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory '{}'", parent.display()))?;
    }
    let img = image::RgbaImage::from_raw(buffer.width(), buffer.height(), buffer.to_rgba8())
        .context("pixel data does not match the image size")?;
    img.save(path)
        .with_context(|| format!("failed to write image '{}'", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use frost_core::Color;

    #[test]
    fn test_png_roundtrip_preserves_rgba8() {
        let dir = std::env::temp_dir().join(format!("frost_io_{}", std::process::id()));
        let path = dir.join("roundtrip.png");
        let mut source = ImageBuffer::solid(5, 3, WORK_FORMAT, &Color::BLACK).unwrap();
        source.set_pixel(2, 1, [1.0, 0.0, 0.0, 1.0]);

        save_image(&source, &path).unwrap();
        let loaded = load_image(&path).unwrap();
        std::fs::remove_dir_all(&dir).ok();

        assert_eq!((loaded.width(), loaded.height()), (5, 3));
        assert_eq!(loaded.to_rgba8(), source.to_rgba8());
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = load_image(Path::new("does/not/exist.png")).unwrap_err();
        assert!(format!("{err:#}").contains("does/not/exist.png"));
    }
}
