use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use glam::Vec2;
use unity_field_core::{
    AppConfig, Complexity, DisplayLink, DrawList, FieldScene, FrameHandler, FrameLoop,
    FriendshipSketch, InputEvent, MirrorSketch, Recorder, RecordingSettings, RenderGraph,
    Renderer, SceneFrame, StatusSource, Surface, Viewport, WaveSketch,
};
use tracing_subscriber::EnvFilter;

/// Screen-space placement of the headless surface, as if inset in a window.
const SURFACE_ORIGIN: Vec2 = Vec2::new(32.0, 48.0);

fn main() -> unity_field_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(options) => run_headless(&options),
        Commands::Record { options, output, every_nth } => run_record(&options, output, every_nth),
    }
}

fn run_headless(options: &RunOptions) -> unity_field_core::Result<()> {
    tracing::info!(sketch = ?options.sketch, frames = options.frames, "starting headless run");

    let mut graph = RenderGraph::new();
    run_sketch(options, &mut graph)?;

    let stats = graph.stats();
    tracing::info!(
        frames = stats.frames,
        peak_commands = stats.peak_command_count,
        "run finished"
    );
    Ok(())
}

fn run_record(
    options: &RunOptions,
    output: PathBuf,
    every_nth: u32,
) -> unity_field_core::Result<()> {
    tracing::info!(sketch = ?options.sketch, ?output, "recording frames");

    let mut recorder = Recorder::new(RecordingSettings {
        output_path: output,
        every_nth,
    });
    recorder.start()?;
    run_sketch(options, &mut recorder)?;
    recorder.stop()
}

fn run_sketch<R>(options: &RunOptions, renderer: &mut R) -> unity_field_core::Result<()>
where
    R: Renderer<DrawList> + Renderer<SceneFrame>,
{
    let config = options.resolve_config()?;
    let surface = Surface::new(
        options.sketch.label(),
        config.display.width as f32,
        config.display.height as f32,
    )?
    .with_origin(SURFACE_ORIGIN);
    let link = DisplayLink::new(config.display.refresh_hz);

    match options.sketch {
        SketchKind::Mirror => drive(
            FrameLoop::start(surface, MirrorSketch::new(), config.surface)?,
            renderer,
            link,
            options.frames,
            mirror_script,
        ),
        SketchKind::Friendship => drive(
            FrameLoop::start(
                surface,
                FriendshipSketch::new(config.friendship.coupling),
                config.surface,
            )?,
            renderer,
            link,
            options.frames,
            friendship_script,
        ),
        SketchKind::Wave => drive(
            FrameLoop::start(surface, WaveSketch::new(), config.surface)?,
            renderer,
            link,
            options.frames,
            wave_script,
        ),
        SketchKind::Field => drive(
            FrameLoop::start(surface, FieldScene::new(), config.surface)?,
            renderer,
            link,
            options.frames,
            field_script,
        ),
    }
}

/// Drives `frame_loop` on the display cadence, feeding scripted screen-space
/// input and presenting every produced frame.
fn drive<H, R>(
    mut frame_loop: FrameLoop<H>,
    renderer: &mut R,
    mut link: DisplayLink,
    frames: u64,
    script: fn(u64, Viewport) -> Option<InputEvent>,
) -> unity_field_core::Result<()>
where
    H: FrameHandler + StatusSource,
    R: Renderer<H::Frame>,
{
    let report_every = (1.0 / link.interval()).round().max(1.0) as u64;

    for index in 0..frames {
        if let Some(event) = script(index, frame_loop.surface().viewport()) {
            frame_loop.push_screen_input(event);
        }

        let now = link.next_refresh();
        let Some(frame) = frame_loop.tick(now) else {
            tracing::warn!(index, "frame loop stopped early");
            break;
        };
        renderer.present(&frame)?;

        if index % report_every == 0 {
            let status = serde_json::to_string(&frame_loop.handler().status())?;
            tracing::info!(frame = index, %status, "surface status");
        }
    }

    frame_loop.stop();
    Ok(())
}

fn mirror_script(frame: u64, viewport: Viewport) -> Option<InputEvent> {
    let bounds = viewport.bounds;
    (frame % 120 == 60).then(|| {
        let turn = (frame / 120) as f32;
        let offset = Vec2::from_angle(turn * 1.3) * bounds.height * 0.3;
        InputEvent::PointerDown(viewport.origin + bounds.center() + offset)
    })
}

fn friendship_script(frame: u64, viewport: Viewport) -> Option<InputEvent> {
    let target = viewport.origin + Vec2::new(viewport.bounds.width / 2.0, 40.0);
    (frame % 240 == 30).then(|| InputEvent::PointerDown(target))
}

fn wave_script(frame: u64, viewport: Viewport) -> Option<InputEvent> {
    let bounds = viewport.bounds;
    let observer = viewport.origin + Vec2::new(bounds.width * 0.2, bounds.height / 2.0);
    match frame % 300 {
        150 => Some(InputEvent::PointerDown(observer)),
        151..=209 => Some(InputEvent::PointerDrag {
            position: observer + Vec2::new(0.0, (frame % 300 - 150) as f32),
            delta: Vec2::Y,
        }),
        210 => Some(InputEvent::PointerUp(observer)),
        _ => None,
    }
}

fn field_script(frame: u64, viewport: Viewport) -> Option<InputEvent> {
    match frame % 360 {
        60 => Some(InputEvent::PointerEnter(((frame / 360) % 6) as usize)),
        180 => Some(InputEvent::PointerLeave(((frame / 360) % 6) as usize)),
        200..=259 => Some(InputEvent::PointerDrag {
            position: viewport.origin + viewport.bounds.center(),
            delta: Vec2::new(4.0, 0.0),
        }),
        300 => Some(InputEvent::Wheel { delta: -1.0 }),
        _ => None,
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Interactive physics thought experiments", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a surface headlessly with a scripted demo interaction.
    Run(RunOptions),
    /// Run a surface and stream its frames to a JSON-lines file.
    Record {
        #[command(flatten)]
        options: RunOptions,
        /// Destination for the recorded frames.
        #[arg(short, long, default_value = "frames.jsonl")]
        output: PathBuf,
        /// Keep only every n-th frame.
        #[arg(long, default_value_t = 1)]
        every_nth: u32,
    },
}

#[derive(Args, Debug)]
struct RunOptions {
    /// Which surface to drive.
    #[arg(short, long, value_enum, default_value_t = SketchKind::Mirror)]
    sketch: SketchKind,
    /// Number of frames to produce.
    #[arg(short, long, default_value_t = 600)]
    frames: u64,
    /// Optional JSON configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Override the configured complexity (low, medium, high).
    #[arg(long)]
    complexity: Option<Complexity>,
    /// Disable pointer manipulation and camera control.
    #[arg(long)]
    no_interaction: bool,
    /// Prefer reduced motion.
    #[arg(long)]
    reduced_motion: bool,
    /// Coupling strength for the friendship surface, in [0, 1].
    #[arg(long)]
    coupling: Option<f64>,
}

impl RunOptions {
    fn resolve_config(&self) -> unity_field_core::Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::load(path)?,
            None => AppConfig::default(),
        };

        if let Some(complexity) = self.complexity {
            config.surface.complexity = complexity;
        }
        if self.no_interaction {
            config.surface.interaction_enabled = false;
        }
        if self.reduced_motion {
            config.surface.reduced_motion = true;
        }
        if let Some(coupling) = self.coupling {
            config.friendship.coupling = coupling;
        }

        config.validate()?;
        Ok(config)
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum SketchKind {
    Mirror,
    Friendship,
    Wave,
    Field,
}

impl SketchKind {
    fn label(self) -> &'static str {
        match self {
            Self::Mirror => "mirror",
            Self::Friendship => "friendship",
            Self::Wave => "wave",
            Self::Field => "field",
        }
    }
}
