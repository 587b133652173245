//! Replays recorded face landmarks through the glasses tracking pipeline.

use anyhow::{Context, Result};
use clap::Parser;
use glasses_tracker::{
    config::{Config, EXAMPLE_CONFIG},
    pipeline::TrackingSession,
    replay::{read_records, FrameRecord, RecordedLandmarks},
    smoothing::{SmoothingState, TransformSmoother},
    strategies::StrategyKind,
    transform::GlassesTransform,
    worker::FaceWorker,
};
use log::info;
use std::{
    fs::File,
    io::{self, BufRead, BufReader, BufWriter, Write},
    time::Duration,
};

// Upper bound on one detection in threaded mode
const WORKER_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Recorded landmark stream (JSON lines), or - for stdin
    #[arg(short, long, default_value = "-")]
    input: String,

    /// Output file for transforms (JSON lines); stdout when omitted
    #[arg(short, long)]
    output: Option<String>,

    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    config: Option<String>,

    /// Pose strategy (basic-euler, eased-quaternion, kalman-filtered)
    #[arg(short, long)]
    strategy: Option<StrategyKind>,

    /// Run detection on the background worker thread
    #[arg(long)]
    threaded: bool,

    /// Smooth transforms at this simulated render rate (Hz)
    #[arg(long)]
    smooth_hz: Option<f64>,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,

    /// Print an example configuration and exit
    #[arg(long)]
    print_config: bool,
}

/// Either an inline session or one behind the worker thread
enum Tracker {
    Inline(TrackingSession),
    Threaded(FaceWorker<FrameRecord>),
}

impl Tracker {
    fn process(&mut self, record: FrameRecord) -> Result<Option<GlassesTransform>> {
        match self {
            Self::Inline(session) => {
                let face = match record.face() {
                    Ok(face) => face,
                    Err(e) => {
                        log::warn!("Skipping malformed landmarks: {e}");
                        None
                    }
                };
                Ok(session.update(face.as_ref(), record.frame_size()).copied())
            }
            Self::Threaded(worker) => {
                worker.submit(record)?;
                if worker.wait(WORKER_TIMEOUT)?.is_none() {
                    log::warn!("Worker produced no result within {WORKER_TIMEOUT:?}");
                }
                Ok(worker.current_transform().copied())
            }
        }
    }

    fn finish(self) -> Result<()> {
        if let Self::Threaded(worker) = self {
            info!("Worker dropped {} stale frames", worker.dropped_frames());
            worker.shutdown()?;
        }
        Ok(())
    }
}

/// Renderer-side smoothing at a fixed frame interval
struct RenderSmoothing {
    smoother: TransformSmoother,
    state: Option<SmoothingState>,
    dt: f64,
}

impl RenderSmoothing {
    fn apply(&mut self, target: GlassesTransform) -> GlassesTransform {
        // The first target is taken as-is
        let state = self.state.get_or_insert(SmoothingState {
            position: target.position,
            quaternion: target.quaternion,
            scale: target.scale,
        });
        self.smoother.step(state, &target, self.dt);
        GlassesTransform {
            position: state.position,
            quaternion: state.quaternion,
            scale: state.scale,
            ..target
        }
    }
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logger
    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    if args.print_config {
        print!("{EXAMPLE_CONFIG}");
        return Ok(());
    }

    info!("Glasses Tracker - landmark replay");

    // Load configuration if provided
    let mut config = if let Some(config_path) = &args.config {
        info!("Loading configuration from: {}", config_path);
        Config::from_file(config_path).with_context(|| format!("Failed to load config file {config_path}"))?
    } else {
        Config::default()
    };
    if let Some(strategy) = args.strategy {
        config.tracking.strategy = strategy;
    }
    if args.threaded {
        config.tracking.threaded = true;
    }
    config.validate()?;

    let session = config.build_session()?;
    let mut tracker = if config.tracking.threaded {
        Tracker::Threaded(FaceWorker::spawn(RecordedLandmarks, session)?)
    } else {
        Tracker::Inline(session)
    };

    let mut smoothing = match args.smooth_hz {
        Some(hz) if hz > 0.0 && hz.is_finite() => Some(RenderSmoothing {
            smoother: config.smoother(),
            state: None,
            dt: 1.0 / hz,
        }),
        Some(hz) => anyhow::bail!("Smoothing rate must be greater than 0, got {hz}"),
        None => None,
    };

    let input: Box<dyn BufRead> = if args.input == "-" {
        Box::new(BufReader::new(io::stdin()))
    } else {
        Box::new(BufReader::new(
            File::open(&args.input).with_context(|| format!("Failed to open input {}", args.input))?,
        ))
    };
    let mut output: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create output {path}"))?,
        )),
        None => Box::new(BufWriter::new(io::stdout())),
    };

    let mut frames = 0u64;
    let mut tracked = 0u64;
    for record in read_records(input) {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                log::warn!("{e}");
                continue;
            }
        };
        frames += 1;

        let transform = tracker.process(record)?;
        let transform = match (transform, smoothing.as_mut()) {
            (Some(target), Some(smoothing)) => Some(smoothing.apply(target)),
            (transform, _) => transform,
        };
        if transform.is_some() {
            tracked += 1;
        }

        serde_json::to_writer(&mut output, &transform)?;
        writeln!(output)?;
    }
    output.flush()?;
    tracker.finish()?;

    info!("Processed {frames} frames, {tracked} with a transform");

    Ok(())
}
