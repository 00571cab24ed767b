//! Renders a patterned frame with one blurred panel and writes it to PNG.
//!
//! ```text
//! frostglass-demo --sigma 24 --mode both --out target/frostglass
//! ```

mod readback;
mod scene;

use std::{fs, path::PathBuf};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use frostglass::{BlurEffect, BlurMode, BlurSpec, PaintOutcome, Px, PxPosition, PxSize};
use frostglass_wgpu::{BlurRenderer, PipelineCachePolicy, RendererConfig, WgpuTarget};
use tracing::info;

use crate::scene::{PanelNode, Pixels};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    Actor,
    Background,
    Both,
}

impl ModeArg {
    fn modes(self) -> &'static [BlurMode] {
        match self {
            Self::Actor => &[BlurMode::Actor],
            Self::Background => &[BlurMode::Background],
            Self::Both => &[BlurMode::Actor, BlurMode::Background],
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "frostglass-demo", version, about = "Render the frostglass blur headlessly")]
struct Cli {
    /// Directory the PNG files are written to.
    #[arg(long, default_value = "frostglass-out")]
    out: PathBuf,
    /// Gaussian sigma in pixels, clamped to 256.
    #[arg(long, default_value_t = 16)]
    sigma: u32,
    /// Multiplier applied to the blurred colour.
    #[arg(long, default_value_t = 1.0)]
    brightness: f32,
    /// Paint opacity of the panel.
    #[arg(long, default_value_t = 255)]
    opacity: u8,
    #[arg(long, value_enum, default_value_t = ModeArg::Both)]
    mode: ModeArg,
    #[arg(long, default_value_t = 960)]
    width: u32,
    #[arg(long, default_value_t = 540)]
    height: u32,
    /// Frames painted per mode. Frames after the first reuse cached work
    /// where the mode allows it.
    #[arg(long, default_value_t = 2)]
    frames: u32,
    /// Skip the on-disk pipeline cache.
    #[arg(long)]
    no_pipeline_cache: bool,
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    anyhow::ensure!(cli.width > 0 && cli.height > 0, "frame size must be non-zero");
    anyhow::ensure!(cli.frames > 0, "at least one frame must be painted");

    fs::create_dir_all(&cli.out)
        .with_context(|| format!("failed to create {}", cli.out.display()))?;

    let config = RendererConfig {
        pipeline_cache: if cli.no_pipeline_cache {
            PipelineCachePolicy::Disabled
        } else {
            PipelineCachePolicy::default()
        },
        ..RendererConfig::default()
    };
    let renderer = pollster::block_on(BlurRenderer::headless(config))?;

    for &mode in cli.mode.modes() {
        render_mode(&renderer, &cli, mode)?;
    }

    renderer.shutdown();
    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new("error,frostglass=info"))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("error"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn render_mode(renderer: &BlurRenderer, cli: &Cli, mode: BlurMode) -> anyhow::Result<()> {
    let frame_size = PxSize::from_u32(cli.width, cli.height);
    let frame = renderer.create_frame_texture(frame_size);
    let backdrop = Pixels::backdrop(frame_size);

    let panel_size = PxSize::from_u32((cli.width / 2).max(1), (cli.height / 2).max(1));
    let position = PxPosition::new(
        Px::new((cli.width / 4) as i32),
        Px::new((cli.height / 4) as i32),
    );
    let node = PanelNode::new(renderer, position, panel_size, cli.opacity);

    let mut effect: BlurEffect<WgpuTarget, PanelNode> = BlurEffect::new(node);
    effect
        .set_spec(BlurSpec {
            brightness: cli.brightness,
            ..BlurSpec::new(mode, cli.sigma)
        })
        .context("invalid blur parameters")?;

    for index in 0..cli.frames {
        backdrop.upload(renderer, &frame);
        let mut encoder = renderer
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frostglass_demo_frame"),
            });
        let outcome = {
            let mut blur_frame = renderer.begin_frame(&mut encoder, &frame);
            blur_frame.set_node_origin(effect.host().position());
            effect.paint(&mut blur_frame, index == 0)
        };
        renderer.queue().submit(Some(encoder.finish()));

        if let PaintOutcome::Fallback(err) = &outcome {
            tracing::warn!(?mode, frame = index, %err, "blur fell back to unblurred paint");
        } else {
            info!(?mode, frame = index, ?outcome, state = ?effect.cache_state(), "painted");
        }
    }

    let pixels = readback::read_rgba8(renderer, &frame)?;
    let name = match mode {
        BlurMode::Actor => "actor.png",
        BlurMode::Background => "background.png",
    };
    let path = cli.out.join(name);
    readback::save_png(&path, &pixels, cli.width, cli.height)?;
    info!(
        path = %path.display(),
        live_targets = effect.targets().live_count(),
        redraws = effect.host().redraw_requests,
        "wrote frame"
    );
    Ok(())
}
