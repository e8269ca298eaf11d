use crate::color::Color;
use crate::error::{FrostError, FrostResult};
use crate::format::{GraphicsFormat, MsaaSamples};
use crate::math::IntRect;

/// A 2D RGBA pixel buffer.
///
/// Dimensions are always at least 1x1 and the format never changes after
/// construction. Texels are stored as f32 RGBA; every write goes through
/// [`GraphicsFormat::store`].
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBuffer {
    pixels: Vec<[f32; 4]>,
    width: u32,
    height: u32,
    format: GraphicsFormat,
    msaa: MsaaSamples,
}

impl ImageBuffer {
    /// Create a new buffer filled with transparent black.
    pub fn new(width: u32, height: u32, format: GraphicsFormat) -> FrostResult<Self> {
        if width == 0 || height == 0 {
            return Err(FrostError::InvalidDimensions { width, height });
        }
        let clear = format.store([0.0; 4]);
        Ok(Self {
            pixels: vec![clear; (width as usize) * (height as usize)],
            width,
            height,
            format,
            msaa: MsaaSamples::None,
        })
    }

    /// Create a buffer filled with a solid color.
    pub fn solid(width: u32, height: u32, format: GraphicsFormat, color: &Color) -> FrostResult<Self> {
        let mut buffer = Self::new(width, height, format)?;
        buffer.fill(color);
        Ok(buffer)
    }

    /// Build a buffer from tightly packed RGBA8 bytes.
    pub fn from_rgba8(
        width: u32,
        height: u32,
        format: GraphicsFormat,
        data: &[u8],
    ) -> FrostResult<Self> {
        let mut buffer = Self::new(width, height, format)?;
        let expected = buffer.pixel_count() * 4;
        if data.len() != expected {
            return Err(FrostError::PixelDataLength {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }
        for (dst, src) in buffer.pixels.iter_mut().zip(data.chunks_exact(4)) {
            *dst = format.store(Color::from_rgba8([src[0], src[1], src[2], src[3]]).to_array());
        }
        Ok(buffer)
    }

    /// Set the multisample count.
    pub fn with_msaa(mut self, msaa: MsaaSamples) -> Self {
        self.msaa = msaa;
        self
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> GraphicsFormat {
        self.format
    }

    pub fn msaa(&self) -> MsaaSamples {
        self.msaa
    }

    /// Total number of pixels.
    pub fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// Raw texels in row-major order.
    pub fn pixels(&self) -> &[[f32; 4]] {
        &self.pixels
    }

    /// Raw mutable texels in row-major order.
    ///
    /// Writes through this slice bypass the format's store rules; callers
    /// pass every value through [`GraphicsFormat::store`] themselves.
    pub fn pixels_mut(&mut self) -> &mut [[f32; 4]] {
        &mut self.pixels
    }

    /// Get the texel at a pixel coordinate. Returns None if out of bounds.
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<[f32; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[self.index(x, y)])
    }

    /// Set the texel at a pixel coordinate. No-op if out of bounds.
    pub fn set_pixel(&mut self, x: u32, y: u32, px: [f32; 4]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = self.index(x, y);
        self.pixels[idx] = self.format.store(px);
    }

    /// Fetch a texel with clamp-to-edge addressing.
    pub fn load_clamped(&self, x: i64, y: i64) -> [f32; 4] {
        let x = x.clamp(0, self.width as i64 - 1) as u32;
        let y = y.clamp(0, self.height as i64 - 1) as u32;
        self.pixels[self.index(x, y)]
    }

    /// Bilinear sample at normalized coordinates with clamp-to-edge addressing.
    ///
    /// Texel centers sit at `(i + 0.5) / size`.
    pub fn sample_bilinear(&self, u: f32, v: f32) -> [f32; 4] {
        let fx = u * self.width as f32 - 0.5;
        let fy = v * self.height as f32 - 0.5;
        let x0 = fx.floor();
        let y0 = fy.floor();
        let tx = fx - x0;
        let ty = fy - y0;
        let (x0, y0) = (x0 as i64, y0 as i64);

        let c00 = self.load_clamped(x0, y0);
        let c10 = self.load_clamped(x0 + 1, y0);
        let c01 = self.load_clamped(x0, y0 + 1);
        let c11 = self.load_clamped(x0 + 1, y0 + 1);

        let mut out = [0.0; 4];
        for i in 0..4 {
            let top = c00[i] + (c10[i] - c00[i]) * tx;
            let bottom = c01[i] + (c11[i] - c01[i]) * tx;
            out[i] = top + (bottom - top) * ty;
        }
        out
    }

    /// Fill every texel with a color.
    pub fn fill(&mut self, color: &Color) {
        let px = self.format.store(color.to_array());
        self.pixels.fill(px);
    }

    /// Alpha-composite `src` over the texel at (x, y). No-op if out of bounds.
    pub fn blend_over(&mut self, x: u32, y: u32, src: [f32; 4]) {
        let Some(dst) = self.get_pixel(x, y) else {
            return;
        };
        let sa = src[3].clamp(0.0, 1.0);
        let out_a = sa + dst[3] * (1.0 - sa);
        let mut out = [0.0, 0.0, 0.0, out_a];
        for i in 0..3 {
            out[i] = src[i] * sa + dst[i] * (1.0 - sa);
        }
        self.set_pixel(x, y, out);
    }

    /// Bounds of the buffer as a rectangle at the origin.
    pub fn bounds(&self) -> IntRect {
        IntRect::new(0, 0, self.width as i32, self.height as i32)
    }

    /// Convert to tightly packed RGBA8 bytes.
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(self.pixel_count() * 4);
        for px in &self.pixels {
            data.extend_from_slice(&Color::from(*px).to_rgba8());
        }
        data
    }

    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.width as usize) + (x as usize)
    }
}
