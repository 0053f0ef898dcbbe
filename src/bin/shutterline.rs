use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use shutterline::{
    MediaSink, RenderSession, RenderSessionConfig, SweepScene, TickOutcome, motion_blur_time_steps,
    open_sink_for_config, required_host_fps, total_samples,
};

/// Default render length when neither `--seconds` nor the config provides one.
const DEFAULT_SECONDS: f64 = 3.0;

/// Tone frequency of the generated audio track.
const TONE_HZ: f64 = 440.0;

#[derive(Parser, Debug)]
#[command(name = "shutterline", version)]
struct Cli {
    /// Emit logs as JSON.
    #[arg(long, global = true, default_value_t = false)]
    log_json: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the built-in sweep scene through a full session.
    Render(RenderArgs),
    /// Print the derived sampling plan for a config as JSON.
    Plan(PlanArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Session config JSON.
    #[arg(long)]
    config: PathBuf,

    /// Output video path, or output directory in raw export mode.
    #[arg(long)]
    out: PathBuf,

    /// Render length in seconds (overrides `source_duration_secs`).
    #[arg(long)]
    seconds: Option<f64>,

    /// Do not generate an audio track.
    #[arg(long, default_value_t = false)]
    no_audio: bool,
}

#[derive(Parser, Debug)]
struct PlanArgs {
    /// Session config JSON.
    #[arg(long)]
    config: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_json);
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Plan(args) => cmd_plan(args),
    }
}

fn init_logging(json: bool) {
    use tracing_subscriber::{EnvFilter, fmt};

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true);
    if json {
        tracing::subscriber::set_global_default(builder.json().finish()).ok();
    } else {
        tracing::subscriber::set_global_default(builder.finish()).ok();
    }
}

fn cmd_plan(args: PlanArgs) -> anyhow::Result<()> {
    let cfg = RenderSessionConfig::from_path(&args.config)?;
    cfg.validate()?;
    let host = required_host_fps(&cfg)?;
    let plan = serde_json::json!({
        "motion_blur_time_steps": motion_blur_time_steps(&cfg),
        "total_samples": total_samples(&cfg),
        "required_host_fps": { "num": host.num, "den": host.den },
        "estimated_total_frames": cfg.estimated_total_frames(),
    });
    println!("{}", serde_json::to_string_pretty(&plan)?);
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let mut cfg = RenderSessionConfig::from_path(&args.config)?;
    if let Some(secs) = args.seconds {
        cfg.source_duration_secs = Some(secs);
    }
    if cfg.source_duration_secs.is_none() {
        cfg.source_duration_secs = Some(DEFAULT_SECONDS);
    }

    let sink = open_sink_for_config(&cfg, &args.out);
    let mut session = RenderSession::new(cfg, sink)
        .with_context(|| format!("start render session for '{}'", args.out.display()))?;

    let frames_done = match drive_session(&mut session, !args.no_audio) {
        Ok(n) => n,
        Err(e) => {
            if let Err(end_err) = session.shutdown() {
                tracing::error!(error = %end_err, "failed to finalize truncated output");
            }
            return Err(e.into());
        }
    };

    session.shutdown()?;
    eprintln!("wrote {} ({} frames)", args.out.display(), frames_done);
    Ok(())
}

/// Tick `session` until the estimated frame count is emitted, feeding a tone at each sync.
fn drive_session<S: MediaSink>(
    session: &mut RenderSession<S>,
    with_audio: bool,
) -> shutterline::RenderResult<u64> {
    let total = session.progress().estimated_total_frames.unwrap_or(0);
    let cfg = session.config().clone();

    let mut scene = SweepScene::default();
    let mut tone = ToneGenerator::new(cfg.audio.sample_rate, cfg.audio.channels);
    let mut frames_done = 0u64;

    while frames_done < total {
        let outcome = session.on_tick(&mut scene)?;
        if with_audio && let Some(frame) = session.pending_audio_sync() {
            let count =
                samples_for_frame(frame.0, cfg.fps.num, cfg.fps.den, cfg.audio.sample_rate);
            let buf = tone.samples(count);
            session.on_audio_samples(&buf, count)?;
        }
        if let TickOutcome::Emitted(_) = outcome {
            frames_done += 1;
        }
    }
    Ok(frames_done)
}

/// Audio sample frames belonging to output frame `frame`, from the exact rational rate.
fn samples_for_frame(frame: u64, fps_num: u32, fps_den: u32, sample_rate: u32) -> usize {
    let edge = |f: u64| {
        u128::from(f) * u128::from(sample_rate) * u128::from(fps_den) / u128::from(fps_num)
    };
    (edge(frame + 1) - edge(frame)) as usize
}

struct ToneGenerator {
    sample_rate: u32,
    channels: u16,
    position: u64,
}

impl ToneGenerator {
    fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
            position: 0,
        }
    }

    fn samples(&mut self, count: usize) -> Vec<f32> {
        let mut out = Vec::with_capacity(count * usize::from(self.channels));
        for _ in 0..count {
            let t = self.position as f64 / f64::from(self.sample_rate);
            let v = (0.2 * (t * TONE_HZ * std::f64::consts::TAU).sin()) as f32;
            out.extend(std::iter::repeat_n(v, usize::from(self.channels)));
            self.position += 1;
        }
        out
    }
}
