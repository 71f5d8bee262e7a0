//! `otosaku`: synthesize, tokenize and install models from the command line.
//!
//! ```text
//! otosaku synth "Hello there." -m TTSModels -o hello.wav
//! otosaku tokenize "Hello there." -m TTSModels
//! otosaku install fastpitch_hifigan.zip -m TTSModels
//! ```

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use otosakutts::{assets, tokenize::Tokenizer, ModelConfig, OtosakuTts};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// FastPitch + HiFiGAN text-to-speech
#[derive(Debug, Parser)]
#[command(name = "otosaku")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Default log filter when RUST_LOG is unset
    #[arg(short, long, default_value = "otosakutts=info,otosaku=info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Synthesize text to a WAV file
    Synth {
        /// Text to speak
        text: String,

        /// Model directory
        #[arg(short, long)]
        model_dir: Option<PathBuf>,

        /// HuggingFace repository to fetch the model files from instead
        #[arg(long, conflicts_with = "model_dir")]
        hub: Option<String>,

        /// Output WAV path
        #[arg(short, long, default_value = "output.wav")]
        output: PathBuf,
    },

    /// Print the token ids for a text (no inference)
    Tokenize {
        text: String,

        /// Model directory holding tokens.txt and cmudict.json
        #[arg(short, long)]
        model_dir: PathBuf,
    },

    /// Unpack a zip model bundle into a model directory
    Install {
        bundle: PathBuf,

        #[arg(short, long)]
        model_dir: PathBuf,
    },
}

fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().compact().with_env_filter(filter).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match cli.command {
        Commands::Synth { text, model_dir, hub, output } => {
            let tts = match (model_dir, hub) {
                (Some(dir), _) => OtosakuTts::load(&dir),
                (None, Some(repo)) => {
                    OtosakuTts::from_source(&otosakutts::download::HubAssets::new(repo))
                }
                (None, None) => bail!("pass --model-dir or --hub"),
            }
            .context("Failed to load models")?;

            let started = Instant::now();
            let audio = tts.generate(&text).context("synthesis failed")?;
            info!(
                seconds = audio.duration_secs(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "synthesized"
            );
            audio.write_wav(&output).context("Failed to write WAV")?;
        }
        Commands::Tokenize { text, model_dir } => {
            let config = ModelConfig::load_or_default(&model_dir)?;
            let tokenizer =
                Tokenizer::load(&config.tokens_path(&model_dir), &config.dictionary_path(&model_dir))
                    .context("Failed to load tokenizer")?;
            let ids = tokenizer.encode(&text);

            println!("Input: {text}");
            println!("Tokens: {} total", ids.len());
            println!("IDs: {ids:?}");
            println!("Decoded: {:?}", tokenizer.decode(&ids));
        }
        Commands::Install { bundle, model_dir } => {
            let config = ModelConfig::default();
            if assets::is_installed(&model_dir, &config) {
                info!(dir = %model_dir.display(), "models already installed");
                return Ok(());
            }
            assets::install_bundle(&bundle, &model_dir, &config)?;
            if !assets::is_installed(&model_dir, &config) {
                bail!("{} does not contain a complete model set", bundle.display());
            }
        }
    }

    Ok(())
}
