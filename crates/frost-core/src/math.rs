use serde::{Deserialize, Serialize};

/// An integer pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IntRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl IntRect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Returns true if the rectangle covers no pixels.
    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Intersection of two rectangles, or None if they do not overlap.
    pub fn intersect(&self, other: &IntRect) -> Option<IntRect> {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = (self.x + self.width).min(other.x + other.width);
        let y1 = (self.y + self.height).min(other.y + other.height);
        let rect = IntRect::new(x0, y0, x1 - x0, y1 - y0);
        (!rect.is_empty()).then_some(rect)
    }

    /// Whether the pixel (x, y) lies inside the rectangle.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && y >= self.y && x < self.x + self.width && y < self.y + self.height
    }
}

/// Scale and bias applied to the source UVs of a blit: `uv * scale + bias`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleBias {
    pub scale_x: f32,
    pub scale_y: f32,
    pub bias_x: f32,
    pub bias_y: f32,
}

impl ScaleBias {
    /// Full coverage, `(1, 1, 0, 0)`.
    pub const IDENTITY: ScaleBias = ScaleBias {
        scale_x: 1.0,
        scale_y: 1.0,
        bias_x: 0.0,
        bias_y: 0.0,
    };

    /// Map target UVs to source UVs.
    pub fn apply(&self, u: f32, v: f32) -> (f32, f32) {
        (u * self.scale_x + self.bias_x, v * self.scale_y + self.bias_y)
    }
}

impl Default for ScaleBias {
    fn default() -> Self {
        Self::IDENTITY
    }
}
