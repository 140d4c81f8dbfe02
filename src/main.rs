// src/main.rs
//
// Replays a JSONL file of detector observations through one tracker
// session and reports prediction accuracy over the finished spins.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use roulette_tracker::analysis::OutcomeEvaluator;
use roulette_tracker::detection::Observation;
use roulette_tracker::interface::{
    ActualResultResolver, LoggingSink, MemorySink, NoResolver, RecordedResolver, ResolveRequest,
    SectorResolver,
};
use roulette_tracker::{Config, Pocket, Tracker, TrackerSession};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "roulette-tracker")]
#[command(version, about = "Replay recorded wheel observations and score the predictions")]
struct Args {
    /// Tracker configuration
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// JSONL file, one observation per line
    #[arg(short, long)]
    input: PathBuf,

    /// How the landed pocket is read when a spin finishes
    #[arg(short, long, value_enum, default_value = "recorded")]
    resolver: ResolverKind,

    /// Print the accuracy report as JSON on stdout
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ResolverKind {
    /// Pockets read by OCR, stored alongside each frame
    Recorded,
    /// Estimate from ball/marker geometry
    Sector,
    /// Leave every actual unknown
    None,
}

/// One line of the replay file.
#[derive(Debug, Deserialize)]
struct ReplayFrame {
    #[serde(flatten)]
    observation: Observation,
    /// Pocket read off the wheel on this frame, if any.
    #[serde(default)]
    ocr_pocket: Option<Pocket>,
}

enum ReplayResolver {
    Recorded(RecordedResolver),
    Sector(SectorResolver),
    None(NoResolver),
}

impl ActualResultResolver for ReplayResolver {
    fn resolve(&mut self, request: &ResolveRequest) -> Option<Pocket> {
        match self {
            ReplayResolver::Recorded(r) => r.resolve(request),
            ReplayResolver::Sector(r) => r.resolve(request),
            ReplayResolver::None(r) => r.resolve(request),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load(&args.config)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new(format!("roulette_tracker={}", config.logging.level))
            }),
        )
        .init();

    info!("🎡 Roulette Tracker Starting");
    info!("✓ Configuration loaded from {}", args.config.display());
    info!(
        "Prediction gate: window={:?}s, confidence>{:.0}%, history>={}",
        config.lifecycle.prediction_window_secs,
        config.lifecycle.min_confidence,
        config.lifecycle.min_history
    );

    let frames = load_frames(&args.input)?;
    info!("Loaded {} frame(s) from {}", frames.len(), args.input.display());

    let resolver = match args.resolver {
        ResolverKind::Recorded => {
            let recorded: RecordedResolver = frames
                .iter()
                .enumerate()
                .filter_map(|(i, f)| f.ocr_pocket.map(|p| (i as u64, p)))
                .collect();
            info!("✓ {} recorded pocket reading(s)", recorded.len());
            ReplayResolver::Recorded(recorded)
        }
        ResolverKind::Sector => {
            warn!("⚠️  Sector resolver selected: actual pockets are geometric estimates");
            ReplayResolver::Sector(SectorResolver)
        }
        ResolverKind::None => ReplayResolver::None(NoResolver),
    };

    let evaluator = OutcomeEvaluator::new(config.outcome.clone());
    let sink = (LoggingSink::new(evaluator.clone()), MemorySink::default());
    let session = TrackerSession::spawn(Tracker::new(&config), resolver, sink, &config.session);

    for frame in frames {
        session.observe(frame.observation).await?;
    }

    let metrics = session.metrics().summary();
    let (_, memory) = session.shutdown().await?;
    let report = evaluator.report(&memory.records);

    info!("\n========================================");
    info!(
        "  Spins: {} ({} evaluated, {} unknown)",
        report.total_spins, report.evaluated, report.indeterminate
    );
    info!("  🎯 Exact matches: {}", report.exact_matches);
    for (k, accuracy) in &report.within {
        info!("  Within {} pockets: {:.1}%", k, accuracy * 100.0);
    }
    match report.average_distance {
        Some(d) => info!("  Average distance: {:.2} pockets", d),
        None => info!("  Average distance: n/a"),
    }
    if report.meets_target {
        info!(
            "  ✅ Target met: >= {:.0}% within {}",
            report.target_accuracy * 100.0,
            report.target_within
        );
    } else {
        warn!(
            "  ❌ Target missed: >= {:.0}% within {}",
            report.target_accuracy * 100.0,
            report.target_within
        );
    }
    info!(
        "  Frames: {} (ball {}, wheel {}), history resets: {}",
        metrics.total_frames,
        metrics.frames_with_ball,
        metrics.frames_with_wheel,
        metrics.history_resets
    );
    info!("  Processing Speed: {:.1} FPS", metrics.fps);
    info!("========================================\n");

    if args.json {
        let output = serde_json::json!({
            "report": report,
            "metrics": metrics,
            "spins": memory.records,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    }

    Ok(())
}

/// Read the replay file. See `parse_frames`.
fn load_frames(path: &Path) -> Result<Vec<ReplayFrame>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read input file {}", path.display()))?;
    Ok(parse_frames(&contents))
}

/// Parse JSONL replay frames. Lines that do not parse, or that the tracker
/// would reject, are skipped so that line order and tracker frame indices
/// stay aligned.
fn parse_frames(contents: &str) -> Vec<ReplayFrame> {
    let mut frames = Vec::new();
    for (line_no, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let frame: ReplayFrame = match serde_json::from_str(line) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Skipping line {}: invalid observation: {}", line_no + 1, e);
                continue;
            }
        };
        if let Err(e) = frame.observation.validate() {
            warn!("Skipping line {}: {}", line_no + 1, e);
            continue;
        }
        frames.push(frame);
    }
    frames
}
