use std::sync::Arc;

use frost_core::hash::hash_image;
use frost_blur::material::shade_parallel;
use frost_blur::{
    BlitChainFeature, CameraData, CopyColorFeature, Downsampling, FrameTargets, LayerFilterFeature, Material,
    Renderer, RendererItem, Scene, ScheduleVariant, SpriteBlurFeature, UiBlurFeature, IDS,
};
use frost_core::{
    CameraType, Color, FrostResult, GraphicsFormat, ImageBuffer, IntRect, LayerFilterConfig, LayerMask,
    PlatformCaps, RenderPassEvent, ScaleBias, SpriteBlurConfig, UiBlurConfig,
};
use frost_graph::TextureView;

const FMT: GraphicsFormat = GraphicsFormat::R32G32B32A32Sfloat;

fn game() -> CameraData {
    CameraData::new(CameraType::Game)
}

fn ui_blur(always_show: bool) -> UiBlurFeature {
    UiBlurFeature::new(&UiBlurConfig {
        always_show,
        ..UiBlurConfig::default()
    })
}

/// Multiplies the source by a constant color.
#[derive(Debug)]
struct TintMaterial {
    name: &'static str,
    tint: [f32; 4],
}

impl TintMaterial {
    fn new(name: &'static str, tint: Color) -> Self {
        Self {
            name,
            tint: tint.to_array(),
        }
    }
}

impl Material for TintMaterial {
    fn name(&self) -> &str {
        self.name
    }

    fn draw(
        &self,
        _pass: u32,
        target: &mut ImageBuffer,
        source: &ImageBuffer,
        _view: &TextureView<'_>,
        scale_bias: ScaleBias,
    ) -> FrostResult<()> {
        let tint = self.tint;
        shade_parallel(target, scale_bias, |u, v| {
            let px = source.sample_bilinear(u, v);
            [px[0] * tint[0], px[1] * tint[1], px[2] * tint[2], px[3] * tint[3]]
        });
        Ok(())
    }
}

fn checker(width: u32, height: u32) -> ImageBuffer {
    let mut image = ImageBuffer::new(width, height, FMT).unwrap();
    for y in 0..height {
        for x in 0..width {
            let v = if (x / 4 + y / 4) % 2 == 0 { 1.0 } else { 0.0 };
            image.set_pixel(x, y, [v, v, v, 1.0]);
        }
    }
    image
}

#[test]
fn test_ui_blur_publishes_without_touching_color() {
    let mut renderer = Renderer::new(PlatformCaps::default());
    renderer.add_feature(ui_blur(false));
    let mut color = checker(64, 64);
    let before = hash_image(&color);

    let report = renderer
        .render(&game(), &Scene::new(), FrameTargets::color_only(&mut color), true)
        .expect("frame should render");

    assert_eq!(report.executed, vec!["Blur UI Mipmap"]);
    assert!(report.culled.is_empty());
    let blurred = report.published_texture(IDS.blur_tex).expect("_BlurTex published");
    assert_eq!((blurred.width(), blurred.height()), (64, 64));
    assert_ne!(hash_image(blurred), before);
    assert!(report.published_texture(IDS.origin_tex).is_some());
    assert_eq!(report.global_float(IDS.blur_offset), Some(1.0));
    assert_eq!(hash_image(&color), before);
}

#[test]
fn test_ui_blur_outputs_gated_by_play_mode() {
    let mut hidden = Renderer::new(PlatformCaps::default());
    hidden.add_feature(ui_blur(false));
    let mut color = checker(32, 32);
    let report = hidden
        .render(&game(), &Scene::new(), FrameTargets::color_only(&mut color), false)
        .unwrap();
    assert!(report.ran("Blur UI Mipmap"));
    assert!(report.published_texture(IDS.blur_tex).is_none());
    assert!(report.published_texture(IDS.origin_tex).is_none());

    let mut shown = Renderer::new(PlatformCaps::default());
    shown.add_feature(ui_blur(true));
    let report = shown
        .render(&game(), &Scene::new(), FrameTargets::color_only(&mut color), false)
        .unwrap();
    assert!(report.published_texture(IDS.blur_tex).is_some());
}

#[test]
fn test_ui_blur_skips_non_game_cameras() {
    let mut renderer = Renderer::new(PlatformCaps::default());
    renderer.add_feature(ui_blur(true));
    let mut color = checker(16, 16);
    let report = renderer
        .render(
            &CameraData::new(CameraType::SceneView),
            &Scene::new(),
            FrameTargets::color_only(&mut color),
            true,
        )
        .unwrap();
    assert!(report.executed.is_empty());
}

#[test]
fn test_schedules_agree_through_renderer() {
    let mut hashes = Vec::new();
    for schedule in [ScheduleVariant::Batched, ScheduleVariant::PerStep] {
        let mut renderer = Renderer::new(PlatformCaps::default());
        renderer.add_feature(ui_blur(true).with_schedule(schedule));
        let mut color = checker(48, 40);
        let report = renderer
            .render(&game(), &Scene::new(), FrameTargets::color_only(&mut color), true)
            .unwrap();
        hashes.push(hash_image(report.published_texture(IDS.blur_tex).unwrap()));
    }
    assert_eq!(hashes[0], hashes[1]);
}

#[test]
fn test_sprite_blur_draws_over_color() {
    let mut scene = Scene::new();
    scene.add(
        RendererItem::new("panel", 8, IntRect::new(8, 8, 16, 16), Color::WHITE)
            .with_tags(&["SpriteBlurPrePass", "SpriteBlurDraw"]),
    );
    scene.add(
        RendererItem::new("ignored", 2, IntRect::new(0, 0, 4, 4), Color::WHITE)
            .with_tags(&["SpriteBlurPrePass", "SpriteBlurDraw"]),
    );

    let mut renderer = Renderer::new(PlatformCaps::default());
    renderer.add_feature(SpriteBlurFeature::new(&SpriteBlurConfig {
        enabled: true,
        layer_mask: LayerMask::layer(8),
        ..SpriteBlurConfig::default()
    }));

    let mut color = ImageBuffer::solid(32, 32, FMT, &Color::RED).unwrap();
    let report = renderer
        .render(&game(), &scene, FrameTargets::color_only(&mut color), true)
        .unwrap();

    assert_eq!(
        report.executed,
        vec!["Blur Sprite PrePass", "Blur Sprite Mipmap", "Blur Sprite Draw"]
    );
    let inside = color.get_pixel(16, 16).unwrap();
    assert!(inside[1] > 0.0, "panel not drawn: {inside:?}");
    assert_eq!(color.get_pixel(1, 1), Some([1.0, 0.0, 0.0, 1.0]));
    assert_eq!(color.get_pixel(30, 30), Some([1.0, 0.0, 0.0, 1.0]));
}

#[test]
fn test_layer_filter_writes_color_and_depth() {
    let mut scene = Scene::new();
    scene.add(
        RendererItem::new("glass", 4, IntRect::new(4, 4, 8, 8), Color::WHITE)
            .with_tags(&["SpriteRenderPrepass", "SpriteRenderDraw"])
            .with_depth(0.25),
    );

    let mut renderer = Renderer::new(PlatformCaps::default());
    renderer.add_feature(LayerFilterFeature::new(&LayerFilterConfig {
        enabled: true,
        layer_mask: LayerMask::layer(4),
        material: Some("DualFilter".into()),
        blur: frost_core::BlurSettings::new(2, 1.0),
        ..LayerFilterConfig::default()
    }));

    let mut color = ImageBuffer::solid(16, 16, FMT, &Color::BLACK).unwrap();
    let mut depth = ImageBuffer::solid(16, 16, GraphicsFormat::D32Sfloat, &Color::rgb(1.0, 0.0, 0.0)).unwrap();
    let report = renderer
        .render(
            &game(),
            &scene,
            FrameTargets {
                color: &mut color,
                depth: Some(&mut depth),
            },
            true,
        )
        .unwrap();

    assert_eq!(report.executed, vec!["NK Mask", "NK Blur Mipmap", "Final Draw"]);
    assert_eq!(depth.get_pixel(8, 8).map(|d| d[0]), Some(0.25));
    assert_eq!(depth.get_pixel(0, 0).map(|d| d[0]), Some(1.0));
    assert!(color.get_pixel(8, 8).unwrap()[0] > 0.0);
    // downsample-only chain: the result stays at half resolution
    let blurred = report.published_texture(IDS.blur_tex).unwrap();
    assert_eq!((blurred.width(), blurred.height()), (8, 8));
}

#[test]
fn test_layer_filter_without_material_records_nothing() {
    let mut renderer = Renderer::new(PlatformCaps::default());
    renderer.add_feature(LayerFilterFeature::new(&LayerFilterConfig {
        enabled: true,
        ..LayerFilterConfig::default()
    }));
    let mut color = checker(8, 8);
    let compiled = renderer
        .compile_frame(&game(), &Scene::new(), FrameTargets::color_only(&mut color), true)
        .unwrap();
    assert!(compiled.passes.is_empty());
    assert_eq!(compiled.textures.len(), 1);
}

#[test]
fn test_passes_ordered_by_event() {
    let mut renderer = Renderer::new(PlatformCaps::default());
    renderer.add_feature(ui_blur(true));
    renderer.add_feature(CopyColorFeature::new(Downsampling::X2Bilinear));

    let mut color = checker(64, 64);
    let report = renderer
        .render(&game(), &Scene::new(), FrameTargets::color_only(&mut color), true)
        .unwrap();

    assert_eq!(report.executed, vec!["Copy Color", "Blur UI Mipmap"]);
    let opaque = report.published_texture(IDS.camera_opaque_texture).unwrap();
    assert_eq!((opaque.width(), opaque.height()), (32, 32));
}

#[test]
fn test_blit_chain_applies_materials_in_order() {
    let red_only: Arc<dyn Material> = Arc::new(TintMaterial::new("RedOnly", Color::rgba(1.0, 0.0, 0.0, 1.0)));
    let half: Arc<dyn Material> = Arc::new(TintMaterial::new("Half", Color::rgba(0.5, 0.5, 0.5, 1.0)));
    let mut renderer = Renderer::new(PlatformCaps::default());
    renderer.add_feature(BlitChainFeature::new(
        RenderPassEvent::AfterRenderingTransparents,
        vec![Some(red_only), None, Some(half)],
    ));

    let mut color = ImageBuffer::solid(8, 8, FMT, &Color::WHITE).unwrap();
    let report = renderer
        .render(&game(), &Scene::new(), FrameTargets::color_only(&mut color), true)
        .unwrap();

    assert_eq!(
        report.executed,
        vec!["BlitColorPass", "Blit RedOnly Pass", "Blit Half Pass", "BlitBackToColorPass"]
    );
    assert_eq!(color.get_pixel(3, 3), Some([0.5, 0.0, 0.0, 1.0]));
}

#[test]
fn test_pool_reused_across_frames() {
    let mut renderer = Renderer::new(PlatformCaps::default());
    renderer.add_feature(ui_blur(true));
    let mut color = checker(32, 32);
    for _ in 0..3 {
        renderer
            .render(&game(), &Scene::new(), FrameTargets::color_only(&mut color), true)
            .unwrap();
    }
    let stats = renderer.pool_stats();
    assert!(stats.reused > 0);
    assert_eq!(stats.live, 0);
}

#[test]
fn test_per_step_chain_reuses_scratches_within_a_frame() {
    let mut renderer = Renderer::new(PlatformCaps::default());
    renderer.add_feature(ui_blur(true).with_schedule(ScheduleVariant::PerStep));
    let mut color = checker(32, 32);
    renderer
        .render(&game(), &Scene::new(), FrameTargets::color_only(&mut color), true)
        .unwrap();

    // 16, 8, 4, 8, 16, 32: the second 16x16 step takes the first one's texture
    // once `_DownSampleTex` has moved past it.
    let stats = renderer.pool_stats();
    assert_eq!(stats.allocated, 5);
    assert_eq!(stats.reused, 1);
    assert_eq!(stats.live, 0);
}
