use std::sync::Arc;

use frost_core::hash::hash_image;
use frost_core::{Color, GraphicsFormat, ImageBuffer};
use frost_blur::{
    execute_pass, record_blur, BlurRequest, ChainVariant, DualFilterMaterial, GlobalPublish, PassKind,
    ScheduleVariant, IDS,
};
use frost_graph::{ExecutionReport, RenderGraph};

const FMT: GraphicsFormat = GraphicsFormat::R32G32B32A32Sfloat;

struct BlurRun {
    output: ImageBuffer,
    report: ExecutionReport,
    step_sizes: Vec<(u32, u32)>,
    step_levels: Vec<Option<u32>>,
}

/// Helper to blur `source` in a fresh graph and return the published result.
fn run_blur(
    source: &ImageBuffer,
    iterations: u32,
    offset: f32,
    variant: ChainVariant,
    schedule: ScheduleVariant,
) -> BlurRun {
    let mut source = source.clone();
    let mut graph = RenderGraph::new();
    let mut frame = graph.begin_frame::<PassKind>();
    let handle = frame.import_texture("source", &mut source);
    let blur = record_blur(
        &mut frame,
        &BlurRequest {
            pass_name: "Blur",
            scratch_prefix: "Blur",
            source: handle,
            iterations,
            blur_offset: offset,
            variant,
            schedule,
            material: Arc::new(DualFilterMaterial::new()),
            publish: GlobalPublish::Always,
            publish_origin: false,
            source_property: IDS.down_sample_tex,
        },
    )
    .expect("blur should record");

    let mut report = frame.execute(execute_pass).expect("blur should execute");
    let output = report
        .take_published(IDS.blur_tex)
        .expect("blur result should be published");
    BlurRun {
        output,
        report,
        step_sizes: blur.chain.steps.iter().map(|s| (s.width, s.height)).collect(),
        step_levels: blur.chain.steps.iter().map(|s| s.level).collect(),
    }
}

/// A 64x64 black image with an 8x8 white block in the middle.
fn block_image() -> ImageBuffer {
    let mut image = ImageBuffer::solid(64, 64, FMT, &Color::BLACK).unwrap();
    for y in 28..36 {
        for x in 28..36 {
            image.set_pixel(x, y, [1.0, 1.0, 1.0, 1.0]);
        }
    }
    image
}

fn gradient_image(width: u32, height: u32) -> ImageBuffer {
    let mut image = ImageBuffer::new(width, height, FMT).unwrap();
    for y in 0..height {
        for x in 0..width {
            let r = x as f32 / width as f32;
            let g = y as f32 / height as f32;
            let b = ((x * 7 + y * 13) % 17) as f32 / 16.0;
            image.set_pixel(x, y, [r, g, b, 1.0]);
        }
    }
    image
}

#[test]
fn test_single_iteration_256() {
    let source = gradient_image(256, 256);
    let run = run_blur(&source, 1, 1.25, ChainVariant::UpsampleToSource, ScheduleVariant::Batched);

    assert_eq!(run.step_sizes, vec![(128, 128), (256, 256)]);
    assert_eq!(run.step_levels[0], Some(0));
    assert_eq!((run.output.width(), run.output.height()), (256, 256));
    assert_eq!(run.report.global_float(IDS.blur_offset), Some(1.25));
}

#[test]
fn test_single_iteration_downsample_only() {
    let source = gradient_image(256, 256);
    let run = run_blur(&source, 1, 1.0, ChainVariant::DownsampleOnly, ScheduleVariant::Batched);

    assert_eq!(run.step_sizes, vec![(128, 128)]);
    assert_eq!((run.output.width(), run.output.height()), (128, 128));
}

#[test]
fn test_batched_and_per_step_match() {
    let source = gradient_image(96, 64);
    for variant in [ChainVariant::UpsampleToSource, ChainVariant::DownsampleOnly] {
        let batched = run_blur(&source, 3, 1.5, variant, ScheduleVariant::Batched);
        let per_step = run_blur(&source, 3, 1.5, variant, ScheduleVariant::PerStep);
        assert_eq!(hash_image(&batched.output), hash_image(&per_step.output));
        assert_eq!(batched.report.executed.len(), 1);
        assert_eq!(per_step.report.executed.len(), batched.step_sizes.len());
    }
}

#[test]
fn test_blur_is_deterministic() {
    let source = gradient_image(80, 45);
    let a = run_blur(&source, 4, 2.0, ChainVariant::UpsampleToSource, ScheduleVariant::Batched);
    let b = run_blur(&source, 4, 2.0, ChainVariant::UpsampleToSource, ScheduleVariant::Batched);
    assert_eq!(hash_image(&a.output).to_hex(), hash_image(&b.output).to_hex());
}

#[test]
fn test_blur_spreads_a_bright_block() {
    let run = run_blur(&block_image(), 2, 1.0, ChainVariant::UpsampleToSource, ScheduleVariant::Batched);
    let center = run.output.get_pixel(32, 32).unwrap();
    let outside = run.output.get_pixel(37, 32).unwrap();
    let far = run.output.get_pixel(2, 2).unwrap();
    assert!(center[0] < 0.999, "expected the block center to be softened, got {center:?}");
    assert!(outside[0] > 0.0, "expected light to bleed past the block edge, got {outside:?}");
    assert!(center[0] > outside[0]);
    assert_eq!(far[0], 0.0);
}

#[test]
fn test_constant_image_is_unchanged() {
    let color = Color::rgba(0.25, 0.5, 0.75, 1.0);
    let source = ImageBuffer::solid(40, 30, FMT, &color).unwrap();
    let run = run_blur(&source, 3, 1.0, ChainVariant::UpsampleToSource, ScheduleVariant::Batched);
    for px in run.output.pixels() {
        for (c, expected) in px.iter().zip(color.to_array()) {
            assert!((c - expected).abs() < 1e-5);
        }
    }
}

#[test]
fn test_degenerate_source_clamps_steps() {
    let source = gradient_image(4, 2);
    let run = run_blur(&source, 3, 1.0, ChainVariant::UpsampleToSource, ScheduleVariant::PerStep);
    assert_eq!(run.step_sizes, vec![(2, 1), (1, 1), (1, 1), (1, 1), (2, 1), (4, 2)]);
    assert_eq!((run.output.width(), run.output.height()), (4, 2));
}

#[test]
fn test_per_step_passes_never_merge() {
    let mut source = gradient_image(64, 64);
    let mut graph = RenderGraph::new();
    let mut frame = graph.begin_frame::<PassKind>();
    let handle = frame.import_texture("source", &mut source);
    record_blur(
        &mut frame,
        &BlurRequest {
            pass_name: "Blur",
            scratch_prefix: "Blur",
            source: handle,
            iterations: 3,
            blur_offset: 1.0,
            variant: ChainVariant::UpsampleToSource,
            schedule: ScheduleVariant::PerStep,
            material: Arc::new(DualFilterMaterial::new()),
            publish: GlobalPublish::Always,
            publish_origin: false,
            source_property: IDS.down_sample_tex,
        },
    )
    .unwrap();

    let compiled = frame.compile().unwrap();
    assert_eq!(compiled.passes.len(), 6);
    assert_eq!(compiled.native_passes.len(), compiled.passes.len());
    assert!(compiled.native_passes.iter().all(|n| n.passes.len() == 1));
}
