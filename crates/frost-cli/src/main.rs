mod image_io;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use frost_blur::{
    plan_chain, CameraData, ChainVariant, FrameTargets, Renderer, Scene, ScheduleVariant, UiBlurFeature, IDS,
};
use frost_core::hash::hash_image;
use frost_core::{CameraType, FrostConfig, ImageBuffer, PlatformCaps, UiBlurConfig};

#[derive(Parser)]
#[command(
    name = "frost",
    version,
    about = "Frost: iterative dual-filter blur on a frame-scoped render graph"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Blur an image file the way the screen-space UI blur does
    Blur {
        /// Image to blur
        #[arg()]
        input: PathBuf,

        /// Where to write the blurred image (format from the extension)
        #[arg(short, long)]
        output: PathBuf,

        /// Downsample iterations, clamped to 1..=5
        #[arg(short, long)]
        iterations: Option<u32>,

        /// Sampling offset in texels, clamped to 0.1..=3.0
        #[arg(long)]
        offset: Option<f32>,

        /// Record the chain as one pass or one pass per step
        #[arg(long, value_enum, default_value_t = Schedule::Batched)]
        variant: Schedule,

        /// frost.toml to read the [ui_blur] and [platform] sections from
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Print the steps of a blur chain for a source size
    Plan {
        #[arg()]
        width: u32,
        #[arg()]
        height: u32,

        #[arg(short, long, default_value_t = 3)]
        iterations: u32,

        /// Stop at the last downsample instead of returning to the source size
        #[arg(long)]
        downsample_only: bool,

        #[arg(long)]
        json: bool,
    },

    /// Compile one UI blur frame and print the pass order and texture lifetimes
    Graph {
        #[arg()]
        width: u32,
        #[arg()]
        height: u32,

        #[arg(short, long)]
        iterations: Option<u32>,

        #[arg(long, value_enum, default_value_t = Schedule::Batched)]
        variant: Schedule,

        /// Dump the compiled graph as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write a frost.toml with every default spelled out
    Init {
        #[arg(default_value = "frost.toml")]
        path: PathBuf,
    },

    /// Display version, kernel info and the features a config enables
    Info {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Schedule {
    Batched,
    PerStep,
}

impl From<Schedule> for ScheduleVariant {
    fn from(schedule: Schedule) -> Self {
        match schedule {
            Schedule::Batched => ScheduleVariant::Batched,
            Schedule::PerStep => ScheduleVariant::PerStep,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // stdout carries command output (JSON included); logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Blur {
            input,
            output,
            iterations,
            offset,
            variant,
            config,
        } => cmd_blur(input, output, iterations, offset, variant, config),
        Commands::Plan {
            width,
            height,
            iterations,
            downsample_only,
            json,
        } => cmd_plan(width, height, iterations, downsample_only, json),
        Commands::Graph {
            width,
            height,
            iterations,
            variant,
            json,
        } => cmd_graph(width, height, iterations, variant, json),
        Commands::Init { path } => cmd_init(path),
        Commands::Info { config } => cmd_info(config),
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<FrostConfig> {
    let config = match path {
        Some(path) => FrostConfig::load_from_file(path)
            .with_context(|| format!("failed to load config '{}'", path.display()))?,
        None => FrostConfig::default(),
    };
    Ok(config)
}

/// UI blur renderer that publishes its result regardless of play mode.
fn ui_blur_renderer(caps: PlatformCaps, config: &UiBlurConfig, schedule: Schedule) -> Renderer {
    let config = UiBlurConfig {
        always_show: true,
        ..config.clone()
    };
    let mut renderer = Renderer::new(caps);
    renderer.add_feature(UiBlurFeature::new(&config).with_schedule(schedule.into()));
    renderer
}

fn cmd_blur(
    input: PathBuf,
    output: PathBuf,
    iterations: Option<u32>,
    offset: Option<f32>,
    schedule: Schedule,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let mut config = load_config(config_path.as_ref())?;
    if let Some(iterations) = iterations {
        config.ui_blur.blur.blur_iteration = iterations;
    }
    if let Some(offset) = offset {
        config.ui_blur.blur.blur_offset = offset;
    }
    if let Err(errors) = config.validate() {
        for err in &errors {
            tracing::warn!("{err}, clamping");
        }
    }
    let config = config.clamped();

    let mut color = image_io::load_image(&input)?;
    let mut renderer = ui_blur_renderer(config.platform, &config.ui_blur, schedule);

    let start = Instant::now();
    let mut report = renderer
        .render(
            &CameraData::new(CameraType::Game),
            &Scene::new(),
            FrameTargets::color_only(&mut color),
            true,
        )
        .context("blur frame failed")?;
    let elapsed = start.elapsed();

    let blurred = report
        .take_published(IDS.blur_tex)
        .context("blur chain published no result")?;
    image_io::save_image(&blurred, &output)?;

    tracing::info!(passes = report.executed.len(), "frame executed");
    println!("Blurred {} -> {}", input.display(), output.display());
    println!(
        "   Size:       {}x{}",
        blurred.width(),
        blurred.height()
    );
    println!(
        "   Iterations: {}  Offset: {:.2}  Schedule: {:?}",
        config.ui_blur.blur.blur_iteration, config.ui_blur.blur.blur_offset, schedule
    );
    println!("   Time:       {:.1}ms", elapsed.as_secs_f64() * 1000.0);
    println!("   Hash:       {}", hash_image(&blurred));
    Ok(())
}

fn cmd_plan(width: u32, height: u32, iterations: u32, downsample_only: bool, json: bool) -> Result<()> {
    let variant = if downsample_only {
        ChainVariant::DownsampleOnly
    } else {
        ChainVariant::UpsampleToSource
    };
    let steps = plan_chain(width, height, iterations, variant);

    if json {
        println!("{}", serde_json::to_string_pretty(&steps)?);
        return Ok(());
    }

    println!("Blur chain for {width}x{height} ({} steps, {variant:?})", steps.len());
    for step in &steps {
        let level = step
            .level
            .map(|l| l.to_string())
            .unwrap_or_else(|| "full".to_string());
        let note = if step.clamped { "  (clamped)" } else { "" };
        println!(
            "   {:>2}  level {:>4}  {:>5}x{:<5}{note}",
            step.index, level, step.width, step.height
        );
    }
    Ok(())
}

fn cmd_graph(width: u32, height: u32, iterations: Option<u32>, schedule: Schedule, json: bool) -> Result<()> {
    let mut config = UiBlurConfig::default();
    if let Some(iterations) = iterations {
        config.blur.blur_iteration = iterations;
    }
    config.blur = config.blur.clamped();

    let mut color = ImageBuffer::new(width, height, image_io::WORK_FORMAT)?;
    let mut renderer = ui_blur_renderer(PlatformCaps::default(), &config, schedule);
    let compiled = renderer.compile_frame(
        &CameraData::new(CameraType::Game),
        &Scene::new(),
        FrameTargets::color_only(&mut color),
        true,
    )?;

    if json {
        println!("{}", serde_json::to_string_pretty(&compiled)?);
        return Ok(());
    }

    println!("Passes:");
    for pass in &compiled.passes {
        let native = pass
            .native_pass
            .map(|n| format!("native #{n}"))
            .unwrap_or_default();
        println!("   {:<24} {:?}  {native}", pass.name, pass.pass_type);
    }
    if !compiled.culled.is_empty() {
        println!("Culled: {}", compiled.culled.join(", "));
    }
    println!("Native passes: {}", compiled.native_passes.len());
    println!("Textures:");
    for texture in &compiled.textures {
        let span = match (texture.first_use, texture.last_use) {
            (Some(first), Some(last)) => format!("{first}..={last}"),
            _ => "unused".to_string(),
        };
        let mut flags = Vec::new();
        if texture.imported {
            flags.push("imported");
        }
        if texture.pinned {
            flags.push("pinned");
        }
        println!(
            "   {:<24} {:>5}x{:<5} {:<8} {}",
            texture.name,
            texture.width,
            texture.height,
            span,
            flags.join(" ")
        );
    }
    Ok(())
}

fn cmd_init(path: PathBuf) -> Result<()> {
    if path.exists() {
        anyhow::bail!("'{}' already exists", path.display());
    }
    FrostConfig::default()
        .save_to_file(&path)
        .with_context(|| format!("failed to write '{}'", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn cmd_info(config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_path.as_ref())?;
    let renderer = Renderer::from_config(&config);

    println!("Frost");
    println!("   Version:   {}", env!("CARGO_PKG_VERSION"));
    println!("   Kernel:    dual filter (CPU, rayon rows)");
    println!("   Schedules: batched, per-step");
    println!("   Threads:   {}", std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1));
    println!("   Features:  {}", renderer.feature_names().join(", "));
    Ok(())
}
