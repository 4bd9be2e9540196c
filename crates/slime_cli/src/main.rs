use anyhow::{ensure, Context};
use clap::{Parser, Subcommand, ValueEnum};
use slime_core::SlimeConfig;
use slime_limbic::{HeartbeatConfig, SimulationDriver, Snapshot};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod script;

use script::Script;

#[derive(Parser, Debug)]
#[command(name = "slime", author, version, about = "Living slime simulation engine", long_about = None)]
struct Args {
    /// Path to the TOML config file (missing file falls back to defaults)
    #[arg(short, long, default_value = "slime.toml", env = "SLIME_CONFIG", global = true)]
    config: PathBuf,

    /// Override the random seed
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fixed-step headless replay; snapshots go to stdout as JSON lines
    Replay {
        /// Simulated seconds to run
        #[arg(short, long, default_value_t = 10.0)]
        duration: f64,

        /// Frames per simulated second
        #[arg(long, default_value_t = 60.0)]
        fps: f64,

        /// TOML script of timed interactions
        #[arg(short, long)]
        script: Option<PathBuf>,

        /// Emit every Nth snapshot
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
        every: u64,
    },
    /// Drive the simulation in real time from a heartbeat
    Run {
        #[arg(long, value_enum, default_value_t = Rate::Normal)]
        rate: Rate,

        /// Stop after this many seconds (default: until Ctrl-C)
        #[arg(short, long)]
        duration: Option<f64>,

        /// Emit every Nth snapshot
        #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
        every: u64,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Rate {
    /// 120 Hz
    Fast,
    /// 60 Hz
    Normal,
    /// 20 Hz
    Slow,
}

impl Rate {
    fn heartbeat(self) -> HeartbeatConfig {
        match self {
            Rate::Fast => HeartbeatConfig::fast(),
            Rate::Normal => HeartbeatConfig::default(),
            Rate::Slow => HeartbeatConfig::slow(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.log_json);

    info!("Loading config from {}...", args.config.display());
    let config = SlimeConfig::load_or_default(&args.config);
    let mut builder = SimulationDriver::builder().config(config);
    if let Some(seed) = args.seed {
        builder = builder.seed(seed);
    }
    let driver = builder.build().context("Invalid simulation config")?;

    match args.command {
        Command::Replay {
            duration,
            fps,
            script,
            every,
        } => {
            let script = match script {
                Some(path) => Script::load(&path)?,
                None => Script::default(),
            };
            replay(driver, duration, fps, script, every)
        }
        Command::Run { rate, duration, every } => run(driver, rate.heartbeat(), duration, every).await,
    }
}

/// Logs go to stderr so stdout stays a clean JSON-lines stream.
fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn emit(out: &mut impl Write, snapshot: &Snapshot) -> anyhow::Result<()> {
    serde_json::to_writer(&mut *out, snapshot)?;
    out.write_all(b"\n")?;
    Ok(())
}

fn replay(mut driver: SimulationDriver, duration: f64, fps: f64, mut script: Script, every: u64) -> anyhow::Result<()> {
    ensure!(fps.is_finite() && fps > 0.0, "fps must be positive, got {}", fps);
    ensure!(
        duration.is_finite() && duration >= 0.0,
        "duration must be non-negative, got {}",
        duration
    );

    let dt = 1.0 / fps;
    let frames = (duration * fps).round() as u64;
    info!(
        "Replaying {:.2}s at {} fps ({} frames, {} scripted events)",
        duration,
        fps,
        frames,
        script.len()
    );

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for frame in 1..=frames {
        script.fire_due(driver.clock(), &mut driver);
        let snapshot = driver.tick(dt, script.pointer());
        if frame % every == 0 {
            emit(&mut out, snapshot)?;
        }
    }
    out.flush()?;

    let last = driver.snapshot();
    info!(
        "Replay finished at t={:.2}s: {} after {} ticks",
        last.time, last.debug.current_emotion_name, last.tick
    );
    Ok(())
}

async fn run(
    mut driver: SimulationDriver,
    heartbeat: HeartbeatConfig,
    duration: Option<f64>,
    every: u64,
) -> anyhow::Result<()> {
    let mut ticker = tokio::time::interval(heartbeat.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!("Heartbeat started (interval: {:?})", heartbeat.interval);
    let mut out = BufWriter::new(io::stdout());
    let mut last = Instant::now();
    let mut frame: u64 = 0;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let now = Instant::now();
                let dt = heartbeat.clamp_delta(now - last);
                last = now;
                frame += 1;

                let snapshot = driver.tick(dt, None);
                if frame % every == 0 {
                    emit(&mut out, snapshot)?;
                    out.flush()?;
                }
                if duration.is_some_and(|d| driver.clock() >= d) {
                    break;
                }
            }
            _ = &mut shutdown => {
                info!("Interrupted, stopping heartbeat");
                break;
            }
        }
    }
    out.flush()?;
    info!("Heartbeat stopped after {:.2}s simulated", driver.clock());
    Ok(())
}
