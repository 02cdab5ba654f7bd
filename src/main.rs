//! Maestro CLI - Album Production Pipeline
//!
//! Command-line interface for the Maestro production pipeline.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use env_logger::Env;
use log::info;

use maestro::blueprint::Blueprint;
use maestro::chat::ChatClient;
use maestro::config::{DecoratorSchema, StudioConfig};
use maestro::pipeline::{self, ProductionServices};
use maestro::postprocess::{find_albums, PostProcessor};
use maestro::synth::{gpu_status_summary, BridgeAudioModel};

#[derive(Parser)]
#[command(name = "maestro-cli", version, about = "Automated album production")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Produce a full album from a blueprint and a topic
    Produce {
        /// Path to the blueprint JSON file
        blueprint: PathBuf,
        /// Album concept (story, mood, or theme)
        topic: String,
        /// Duration per song in seconds
        #[arg(long, default_value_t = 120)]
        duration: u32,
        /// Track count, overriding the blueprint default
        #[arg(long)]
        tracks: Option<usize>,
        /// Lyric decoration schema (clean, flow, performer, glitch, choir)
        #[arg(long)]
        decorator: Option<String>,
        /// Skip the mastering pass after production
        #[arg(long)]
        no_master: bool,
        #[command(flatten)]
        studio: StudioArgs,
    },
    /// Produce one standalone track from a topic
    Track {
        /// Song concept
        topic: String,
        /// Duration in seconds
        #[arg(long, default_value_t = 120)]
        duration: u32,
        #[command(flatten)]
        studio: StudioArgs,
    },
    /// Master an album directory (or the newest album under the output dir)
    Master {
        /// Album directory; defaults to the newest ALBUM_* under --output
        album_dir: Option<PathBuf>,
        #[command(flatten)]
        studio: StudioArgs,
    },
    /// List the available blueprints in a directory
    Blueprints {
        /// Directory of blueprint JSON files
        dir: PathBuf,
    },
    /// Report GPU/VRAM suitability for the audio model
    Status,
}

#[derive(clap::Args)]
struct StudioArgs {
    /// Chat service base URL
    #[arg(long, default_value = "http://localhost:1234/v1")]
    chat_url: String,
    /// Audio bridge base URL
    #[arg(long, default_value = "http://localhost:8765")]
    bridge_url: String,
    /// Output directory for albums
    #[arg(long, default_value = "output")]
    output: PathBuf,
    /// Cooldown between GPU occupants, in seconds
    #[arg(long, default_value_t = 5)]
    cooldown: u64,
}

impl StudioArgs {
    fn into_config(self, duration: u32, decorator: Option<DecoratorSchema>) -> StudioConfig {
        let mut config = StudioConfig {
            chat_url: self.chat_url,
            bridge_url: self.bridge_url,
            output_dir: self.output,
            gpu_cooldown: Duration::from_secs(self.cooldown),
            decorator,
            ..StudioConfig::default()
        };
        config.render.duration_sec = duration;
        config.project_root = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        config
    }
}

fn parse_decorator(name: &str) -> anyhow::Result<DecoratorSchema> {
    match name {
        "clean" => Ok(DecoratorSchema::CleanStandard),
        "flow" => Ok(DecoratorSchema::SonicFlow),
        "performer" => Ok(DecoratorSchema::DynamicPerformer),
        "glitch" => Ok(DecoratorSchema::GlitchStutter),
        "choir" => Ok(DecoratorSchema::CallAndResponse),
        other => anyhow::bail!(
            "unknown decorator '{other}' (expected clean, flow, performer, glitch, or choir)"
        ),
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    info!("Maestro v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Produce {
            blueprint,
            topic,
            duration,
            tracks,
            decorator,
            no_master,
            studio,
        } => {
            let decorator = decorator.as_deref().map(parse_decorator).transpose()?;
            let config = studio.into_config(duration, decorator);
            let blueprint = Blueprint::load(&blueprint)
                .with_context(|| format!("loading blueprint {}", blueprint.display()))?;

            let chat = ChatClient::new(&config.chat_url);
            let audio = BridgeAudioModel::new(&config.bridge_url);
            let services = ProductionServices {
                chat: &chat,
                language_gpu: &chat,
                audio: &audio,
                audio_gpu: &audio,
            };

            let report = pipeline::execute_album(&services, &config, &blueprint, &topic, tracks)?;
            println!(
                "Produced {} tracks ({} skipped) in {}",
                report.produced,
                report.skipped,
                report.album_dir.display()
            );

            if !no_master && report.produced > 0 {
                let release = PostProcessor::new(&report.album_dir).process_album()?;
                println!(
                    "Mastered '{}': {} | {} unique words",
                    release.album_name,
                    release.analytics.total_runtime_formatted,
                    release.analytics.vocabulary_size
                );
            }
        }
        Commands::Track {
            topic,
            duration,
            studio,
        } => {
            let config = studio.into_config(duration, None);
            let chat = ChatClient::new(&config.chat_url);
            let audio = BridgeAudioModel::new(&config.bridge_url);
            let services = ProductionServices {
                chat: &chat,
                language_gpu: &chat,
                audio: &audio,
                audio_gpu: &audio,
            };

            let track = pipeline::produce_single_track(&services, &config, &topic)?;
            println!("Rendered '{}' to {}", track.title, track.wav_path.display());
        }
        Commands::Master { album_dir, studio } => {
            let output = studio.output.clone();
            let dir = match album_dir {
                Some(dir) => dir,
                None => find_albums(&output)
                    .into_iter()
                    .next_back()
                    .context("no ALBUM_* directories found under the output dir")?,
            };
            let processor = PostProcessor::new(&dir);
            let release = processor.process_album()?;
            println!(
                "Mastered '{}' ({} tracks) into {}",
                release.album_name,
                release.analytics.track_count,
                processor.dist_dir().display()
            );
        }
        Commands::Blueprints { dir } => {
            let found = Blueprint::load_dir(&dir)?;
            println!("Available producers:");
            for (i, (path, bp)) in found.iter().enumerate() {
                let desc = if bp.description.is_empty() {
                    "Standard Strategy"
                } else {
                    bp.description.as_str()
                };
                println!("[{}] {} - {} ({})", i + 1, bp.name, desc, path.display());
            }
        }
        Commands::Status => {
            println!("{}", gpu_status_summary());
        }
    }

    Ok(())
}
