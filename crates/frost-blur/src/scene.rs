//! Renderers visible to a camera and the filtered, sorted lists passes draw.

use frost_core::{Color, ImageBuffer, IntRect, LayerMask};
use serde::{Deserialize, Serialize};

/// Render queue values at or below this are opaque.
pub const OPAQUE_QUEUE_MAX: u32 = 2500;
pub const TRANSPARENT_QUEUE: u32 = 3000;

/// A screen-space rectangle drawn by one shader pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RendererItem {
    pub name: String,
    pub layer: u8,
    /// Shader pass tags this renderer can be drawn with.
    pub shader_tags: Vec<String>,
    pub queue: u32,
    pub bounds: IntRect,
    pub color: Color,
    /// View depth, 0 at the near plane and 1 at the far plane.
    pub depth: f32,
}

impl RendererItem {
    pub fn new(name: impl Into<String>, layer: u8, bounds: IntRect, color: Color) -> Self {
        Self {
            name: name.into(),
            layer,
            shader_tags: Vec::new(),
            queue: TRANSPARENT_QUEUE,
            bounds,
            color,
            depth: 0.5,
        }
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.shader_tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn with_depth(mut self, depth: f32) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_queue(mut self, queue: u32) -> Self {
        self.queue = queue;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderQueueRange {
    Opaque,
    Transparent,
    All,
}

impl RenderQueueRange {
    pub fn contains(&self, queue: u32) -> bool {
        match self {
            RenderQueueRange::Opaque => queue <= OPAQUE_QUEUE_MAX,
            RenderQueueRange::Transparent => queue > OPAQUE_QUEUE_MAX,
            RenderQueueRange::All => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortingCriteria {
    /// Front to back.
    CommonOpaque,
    /// Back to front.
    CommonTransparent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilteringSettings {
    pub queue_range: RenderQueueRange,
    pub layer_mask: LayerMask,
}

impl FilteringSettings {
    pub fn transparent(layer_mask: LayerMask) -> Self {
        Self {
            queue_range: RenderQueueRange::Transparent,
            layer_mask,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawingSettings {
    pub shader_tags: Vec<String>,
    pub sorting: SortingCriteria,
}

impl DrawingSettings {
    pub fn new(shader_tags: &[String], sorting: SortingCriteria) -> Self {
        Self {
            shader_tags: shader_tags.to_vec(),
            sorting,
        }
    }
}

/// Everything the camera can see this frame.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scene {
    pub items: Vec<RendererItem>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, item: RendererItem) {
        self.items.push(item);
    }

    /// Filter and sort the renderers for one draw.
    pub fn create_renderer_list(&self, drawing: &DrawingSettings, filtering: &FilteringSettings) -> RendererList {
        let mut items: Vec<RendererItem> = self
            .items
            .iter()
            .filter(|item| filtering.layer_mask.contains(item.layer))
            .filter(|item| filtering.queue_range.contains(item.queue))
            .filter(|item| item.shader_tags.iter().any(|t| drawing.shader_tags.contains(t)))
            .cloned()
            .collect();

        match drawing.sorting {
            SortingCriteria::CommonTransparent => items.sort_by(|a, b| b.depth.total_cmp(&a.depth)),
            SortingCriteria::CommonOpaque => items.sort_by(|a, b| a.depth.total_cmp(&b.depth)),
        }
        RendererList { items }
    }
}

/// A filtered, sorted snapshot of renderers, owned by the pass that draws it.
#[derive(Debug, Clone, Default)]
pub struct RendererList {
    items: Vec<RendererItem>,
}

impl RendererList {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn items(&self) -> &[RendererItem] {
        &self.items
    }

    /// Alpha-blend every item into `target`, in list order.
    ///
    /// With a depth buffer, texels behind the stored depth are skipped.
    /// `shade` returns the color of an item at a texel.
    pub fn draw<F>(&self, target: &mut ImageBuffer, depth: Option<&ImageBuffer>, shade: F)
    where
        F: Fn(&RendererItem, u32, u32) -> [f32; 4],
    {
        let bounds = target.bounds();
        for item in &self.items {
            let Some(rect) = item.bounds.intersect(&bounds) else {
                continue;
            };
            for y in rect.y..rect.y + rect.height {
                for x in rect.x..rect.x + rect.width {
                    let (x, y) = (x as u32, y as u32);
                    if !depth_test(depth, x, y, item.depth) {
                        continue;
                    }
                    target.blend_over(x, y, shade(item, x, y));
                }
            }
        }
    }

    /// Write the depth of every visible item texel, keeping the nearest.
    pub fn write_depth(&self, depth: &mut ImageBuffer) {
        let bounds = depth.bounds();
        for item in &self.items {
            let Some(rect) = item.bounds.intersect(&bounds) else {
                continue;
            };
            for y in rect.y..rect.y + rect.height {
                for x in rect.x..rect.x + rect.width {
                    let (x, y) = (x as u32, y as u32);
                    if depth_test(Some(depth), x, y, item.depth) {
                        depth.set_pixel(x, y, [item.depth, 0.0, 0.0, 1.0]);
                    }
                }
            }
        }
    }
}

fn depth_test(depth: Option<&ImageBuffer>, x: u32, y: u32, item_depth: f32) -> bool {
    match depth.and_then(|d| d.get_pixel(x, y)) {
        Some(stored) => item_depth <= stored[0],
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frost_core::GraphicsFormat;

    fn scene() -> Scene {
        let mut scene = Scene::new();
        scene.add(
            RendererItem::new("near", 5, IntRect::new(0, 0, 2, 2), Color::RED)
                .with_tags(&["WorldUIPrePass"])
                .with_depth(0.2),
        );
        scene.add(
            RendererItem::new("far", 5, IntRect::new(0, 0, 2, 2), Color::BLUE)
                .with_tags(&["WorldUIPrePass"])
                .with_depth(0.8),
        );
        scene.add(
            RendererItem::new("other-layer", 3, IntRect::new(0, 0, 2, 2), Color::GREEN)
                .with_tags(&["WorldUIPrePass"]),
        );
        scene.add(
            RendererItem::new("opaque", 5, IntRect::new(0, 0, 2, 2), Color::GREEN)
                .with_tags(&["WorldUIPrePass"])
                .with_queue(2000),
        );
        scene
    }

    #[test]
    fn test_filter_and_sort_back_to_front() {
        let drawing = DrawingSettings::new(&["WorldUIPrePass".to_string()], SortingCriteria::CommonTransparent);
        let list = scene().create_renderer_list(&drawing, &FilteringSettings::transparent(LayerMask::layer(5)));
        let names: Vec<&str> = list.items().iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["far", "near"]);
    }

    #[test]
    fn test_tag_mismatch_yields_empty_list() {
        let drawing = DrawingSettings::new(&["SpriteBlurDraw".to_string()], SortingCriteria::CommonTransparent);
        let list = scene().create_renderer_list(&drawing, &FilteringSettings::transparent(LayerMask::EVERYTHING));
        assert!(list.is_empty());
    }

    #[test]
    fn test_draw_respects_depth() {
        let drawing = DrawingSettings::new(&["WorldUIPrePass".to_string()], SortingCriteria::CommonTransparent);
        let list = scene().create_renderer_list(&drawing, &FilteringSettings::transparent(LayerMask::layer(5)));

        let mut depth = ImageBuffer::solid(2, 2, GraphicsFormat::D32Sfloat, &Color::rgb(0.5, 0.0, 0.0)).unwrap();
        let mut target = ImageBuffer::new(2, 2, GraphicsFormat::R32G32B32A32Sfloat).unwrap();
        list.draw(&mut target, Some(&depth), |item, _, _| item.color.to_array());
        // the far item is occluded
        assert_eq!(target.get_pixel(0, 0), Some([1.0, 0.0, 0.0, 1.0]));

        list.write_depth(&mut depth);
        assert_eq!(depth.get_pixel(1, 1).map(|d| d[0]), Some(0.2));
    }
}
