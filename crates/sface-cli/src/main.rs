use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sface_core::{
    Backend, FacialRecognition, HttpFetcher, ModelName, SFaceConfig,
};
use sha2::{Digest, Sha256};

mod input;

#[derive(Parser)]
#[command(name = "sface", about = "SFace face embedding CLI")]
struct Cli {
    /// Recognition model to use
    #[arg(short, long, default_value = "SFace", global = true)]
    model: ModelName,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download the model weights into the cache if missing
    Fetch,
    /// Print the embedding of an aligned face crop as JSON
    Embed {
        /// Image file (112x112 aligned face; other sizes are resized)
        image: PathBuf,
    },
    /// Print the model's input/output shapes as JSON
    Shape,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = SFaceConfig::from_env();
    let fetcher = HttpFetcher::new(Duration::from_secs(config.download_timeout_secs));

    match cli.command {
        Commands::Fetch => {
            let path = cli
                .model
                .provision(&config, &fetcher)
                .with_context(|| format!("failed to provision {} weights", cli.model))?;
            println!("{}", path.display());
            println!("sha256 {}", sha256_file(&path)?);
        }
        Commands::Embed { image } => {
            let tensor = input::load_face(&image)?;
            let mut backend = Backend::build(cli.model, &config, &fetcher)
                .with_context(|| format!("failed to build {} backend", cli.model))?;
            let embedding = backend
                .find_embeddings(tensor.view())
                .context("embedding extraction failed")?;
            tracing::info!(model = backend.model_name(), dim = embedding.len(), "embedded");
            println!("{}", serde_json::to_string(&embedding)?);
        }
        Commands::Shape => {
            println!("{}", serde_json::to_string_pretty(&cli.model.shape())?);
        }
    }

    Ok(())
}

/// Hex SHA-256 of a file, for operators comparing against a published digest.
fn sha256_file(path: &Path) -> Result<String> {
    let mut file = std::fs::File::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}
