use clap::{Parser, Subcommand};
use octofhir_synthbundle::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "synthbundle")]
#[command(about = "Generate, validate and repair synthetic FHIR bundles")]
#[command(version)]
struct Cli {
    /// JSON configuration file (environment variables still apply on top)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a bundle file, repairing and storing it
    Validate {
        /// Path to the JSON payload
        #[arg(short, long)]
        input: PathBuf,
        /// Root directory of the object store
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
    /// Generate a bundle through the configured text generation service
    Generate {
        /// Path to the JSON generation request
        #[arg(short, long)]
        request: PathBuf,
        /// Root directory of the object store
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
    /// Show the required/optional field partition of a resource type
    Schema {
        #[arg(short, long)]
        resource_type: String,
    },
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => SynthBundleConfig::from_file(path)?,
        None => SynthBundleConfig::from_env(),
    };
    config.validate()?;

    match cli.command {
        Commands::Validate { input, output_dir } => {
            let config = with_output_dir(config, output_dir);
            validate_file(&input, config).await?;
        }
        Commands::Generate {
            request,
            output_dir,
        } => {
            let config = with_output_dir(config, output_dir);
            generate_bundle(&request, config).await?;
        }
        Commands::Schema { resource_type } => {
            show_partition(&resource_type)?;
        }
    }

    Ok(())
}

fn with_output_dir(config: SynthBundleConfig, output_dir: Option<PathBuf>) -> SynthBundleConfig {
    match output_dir {
        Some(dir) => config.with_storage_root(dir),
        None => config,
    }
}

fn file_store(config: &SynthBundleConfig) -> Result<Arc<FileObjectStore>> {
    let mut store = FileObjectStore::new(&config.storage.root);
    if let Some(base_url) = &config.storage.base_url {
        store = store.with_base_url(base_url)?;
    }
    Ok(Arc::new(store))
}

async fn validate_file(input: &Path, config: SynthBundleConfig) -> Result<()> {
    let bytes = tokio::fs::read(input).await?;
    let source = input.file_name().and_then(|n| n.to_str());
    let orchestrator = BundleOrchestrator::new(file_store(&config)?, config.clone());

    let outcome = orchestrator.validate_bytes(&bytes, source).await?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);

    if outcome.was_repaired() {
        tracing::info!("{}", outcome.message);
    }
    Ok(())
}

async fn generate_bundle(request_path: &Path, config: SynthBundleConfig) -> Result<()> {
    let content = tokio::fs::read_to_string(request_path).await?;
    let request: GenerationRequest = serde_json::from_str(&content)
        .map_err(|e| SynthBundleError::invalid_request(format!("Invalid generation request: {e}")))?;

    let client = OpenAiChatClient::from_config(&config.generation)?;
    let generator = BundleGenerator::new(Arc::new(client), file_store(&config)?, config);
    let generated = generator.generate(&request).await?;
    println!("{}", serde_json::to_string_pretty(&generated.summary)?);
    Ok(())
}

fn show_partition(resource_type: &str) -> Result<()> {
    let rt: ResourceType = resource_type
        .parse()
        .map_err(|e: types::UnsupportedResourceType| SynthBundleError::invalid_request(e.to_string()))?;
    let partition = field_partition(rt);
    println!("{}", serde_json::to_string_pretty(partition)?);
    Ok(())
}
