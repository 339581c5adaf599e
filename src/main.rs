use anyhow::{Context, Result};
use base64::Engine;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;

use readsync::config::{ClockMode, GenerationConfig, PlaybackConfig};
use readsync::timing::{build_timeline, CharacterAlignment, NarrationResponse};
use readsync::tracker::{AudioSource, PlaybackSession, SimulatedDevice};
use readsync::{ReadingTimeline, TimelineIndex};

#[derive(Parser, Debug)]
#[command(name = "readsync")]
#[command(about = "Narration timeline generator and word-level playback synchronizer")]
#[command(version)]
struct Args {
    /// Plain log lines instead of structured JSON
    #[arg(long, global = true)]
    no_json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a reading timeline from story text
    Generate {
        /// UTF-8 story text
        input: PathBuf,

        /// Character alignment JSON from the narration service
        #[arg(long, conflicts_with = "response")]
        alignment: Option<PathBuf>,

        /// Full narration response (audio + alignment); also writes the audio
        #[arg(long)]
        response: Option<PathBuf>,

        /// Voice id recorded in metadata
        #[arg(long)]
        voice_id: Option<String>,

        /// Output directory for <stem>.json
        #[arg(long, default_value = "assets/readings")]
        out_dir: PathBuf,
    },

    /// Print the word active at a given time
    Locate {
        timeline: PathBuf,
        time_ms: u64,
    },

    /// Check a timeline document's invariants
    Validate {
        timeline: PathBuf,
    },

    /// Play a timeline on a simulated device, printing each highlighted word
    Play {
        timeline: PathBuf,

        /// Polling interval for position updates
        #[arg(long, default_value_t = 50)]
        poll_interval_ms: u64,

        /// Playback speed multiplier
        #[arg(long, default_value_t = 1.0)]
        speed: f64,

        /// Simulate push callbacks instead of polling
        #[arg(long)]
        callbacks: bool,
    },

    /// Print the default configuration as JSON
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // WHY: structured JSON logging enables observability and debugging in production
    if args.no_json_logs {
        tracing_subscriber::fmt().with_target(false).init();
    } else {
        tracing_subscriber::fmt().with_target(false).json().init();
    }

    info!(?args, "Parsed CLI arguments");

    match args.command {
        Command::Generate { input, alignment, response, voice_id, out_dir } => {
            generate(&input, alignment.as_deref(), response.as_deref(), voice_id, &out_dir).await
        }
        Command::Locate { timeline, time_ms } => locate(&timeline, time_ms).await,
        Command::Validate { timeline } => validate(&timeline).await,
        Command::Play { timeline, poll_interval_ms, speed, callbacks } => {
            let config = PlaybackConfig {
                poll_interval_ms,
                clock_mode: if callbacks { ClockMode::Callbacks } else { ClockMode::Polling },
                ..PlaybackConfig::default()
            };
            play(&timeline, config, speed).await
        }
        Command::Config => {
            let defaults = serde_json::json!({
                "generation": GenerationConfig::default(),
                "playback": PlaybackConfig::default(),
            });
            println!("{}", serde_json::to_string_pretty(&defaults)?);
            Ok(())
        }
    }
}

async fn generate(
    input: &Path,
    alignment_path: Option<&Path>,
    response_path: Option<&Path>,
    voice_id: Option<String>,
    out_dir: &Path,
) -> Result<()> {
    // WHY: validate input early to fail fast with clear error
    if !input.is_file() {
        anyhow::bail!("Input file does not exist: {}", input.display());
    }
    let text = tokio::fs::read_to_string(input)
        .await
        .with_context(|| format!("Failed to read {}", input.display()))?;
    if text.trim().is_empty() {
        anyhow::bail!("Input file is empty: {}", input.display());
    }
    info!(chars = text.chars().count(), "Read story text from {}", input.display());

    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("reading");

    let response = match response_path {
        Some(path) => Some(read_json::<NarrationResponse>(path).await?),
        None => None,
    };

    let alignment = match (&response, alignment_path) {
        (Some(response), _) => Some(response.best_alignment().clone()),
        (None, Some(path)) => Some(read_json::<CharacterAlignment>(path).await?),
        (None, None) => None,
    };

    let config = GenerationConfig { voice_id, ..GenerationConfig::default() };
    let source = config.timing_source(alignment);
    let timeline = build_timeline(&text, &source, &config);

    let json_path = out_dir.join(format!("{stem}.json"));
    timeline.save(&json_path).await?;

    println!("readsync v{} - timeline generated", env!("CARGO_PKG_VERSION"));
    println!(
        "Processed: {} words, {} sentences",
        timeline.metadata.word_count, timeline.metadata.sentence_count
    );
    println!(
        "{} duration: {:.2} seconds",
        if source.is_exact() { "Total" } else { "Estimated" },
        timeline.total_duration as f64 / 1000.0
    );
    println!("  JSON:  {}", json_path.display());

    if let Some(response) = response {
        let audio = base64::engine::general_purpose::STANDARD
            .decode(response.audio_base64.as_bytes())
            .context("Narration response audio is not valid base64")?;
        let audio_path = out_dir.join(format!("{stem}.mp3"));
        tokio::fs::write(&audio_path, audio)
            .await
            .with_context(|| format!("Failed to write {}", audio_path.display()))?;
        println!("  Audio: {}", audio_path.display());
    }

    if !source.is_exact() {
        println!("Note: timings are estimated; regenerate with a narration alignment for exact timing.");
    }
    Ok(())
}

async fn locate(path: &Path, time_ms: u64) -> Result<()> {
    let timeline = ReadingTimeline::load(path).await?;
    let index = TimelineIndex::from_timeline(&timeline);

    match index.locate(time_ms) {
        Some(position) => {
            let word = timeline.word_at(position).map_or("", |w| w.text.as_str());
            println!(
                "{}\t{}\t{}\t{}",
                position.paragraph_index, position.sentence_index, position.word_index, word
            );
        }
        None => println!("none"),
    }
    Ok(())
}

async fn validate(path: &Path) -> Result<()> {
    let timeline = ReadingTimeline::load(path).await?;
    let violations = timeline.validate();
    if violations.is_empty() {
        println!("ok: {} words, {} ms", timeline.word_timeline.len(), timeline.total_duration);
        return Ok(());
    }
    for violation in &violations {
        println!("{violation}");
    }
    anyhow::bail!("{} invariant violations in {}", violations.len(), path.display())
}

async fn play(path: &Path, config: PlaybackConfig, speed: f64) -> Result<()> {
    let timeline = ReadingTimeline::load(path).await?;
    let mut device = SimulatedDevice::new(timeline.total_duration, speed);
    if config.clock_mode == ClockMode::Callbacks {
        device = device.with_callbacks(config.poll_interval());
    }

    let mut session = PlaybackSession::new(device, &timeline, config);
    session.load(&AudioSource::File(path.to_path_buf())).await?;
    session.play().await?;

    let state = session
        .run_until_stopped(|update| {
            if !update.changed {
                return;
            }
            if let Some(word) = update.position.and_then(|p| timeline.word_at(p)) {
                println!("{:>8}ms  {}", update.elapsed_ms, word.text);
            }
        })
        .await?;

    info!(?state, "Playback stopped");
    session.close().await
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))
}
