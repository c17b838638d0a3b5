use clap::{Parser, Subcommand};
use cloud_gal::config::{self, Credentials, GalleryConfig};
use cloud_gal::imaging::RustBackend;
use cloud_gal::store::CloudinaryStore;
use cloud_gal::{manifest, output, pipeline};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn version_string() -> &'static str {
    let hash = env!("GIT_HASH");
    if hash.is_empty() {
        env!("CARGO_PKG_VERSION")
    } else {
        // Leaked once at startup
        Box::leak(format!("{} ({hash})", env!("CARGO_PKG_VERSION")).into_boxed_str())
    }
}

#[derive(Parser)]
#[command(name = "cloud-gal")]
#[command(about = "Build the image manifest for a Cloudinary-backed photo gallery")]
#[command(long_about = "\
Build the image manifest for a Cloudinary-backed photo gallery

Lists every image in a Cloudinary folder, orders them by public id
(greatest first), numbers them from 0, and attaches an inline blur
placeholder to each. The result is a JSON file the gallery page renders
from.

Settings come from config.toml, overridden by the environment:

  CLOUDINARY_FOLDER        folder to list
  CLOUDINARY_CLOUD_NAME    cloud name for the search API
  CLOUDINARY_PUBLIC_NAME   cloud name for public image URLs
  CLOUDINARY_API_KEY       \\ search API credentials
  CLOUDINARY_API_SECRET    /  (environment only)

Logging is controlled with RUST_LOG (default: cloud_gal=info).

Run 'cloud-gal gen-config' to generate a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Config file
    #[arg(long, default_value = "config.toml", global = true)]
    config: PathBuf,

    /// Where to write the manifest JSON
    #[arg(long, default_value = "dist/images.json", global = true)]
    output: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the folder, generate placeholders and write the manifest
    Build,
    /// List the folder in manifest order without generating placeholders
    List,
    /// Validate config and show the effective settings
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

/// Log to stderr so stdout carries only the command's own output.
fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cloud_gal=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn connect(config: &GalleryConfig) -> Result<CloudinaryStore, config::ConfigError> {
    let credentials = Credentials::from_env()?;
    CloudinaryStore::new(&config.store, credentials, config.fetch.timeout())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging();

    match cli.command {
        Command::Build => {
            let config = config::load_config(&cli.config)?;
            let store = connect(&config)?;
            let backend = RustBackend::new();

            println!("==> Building manifest for folder:{}/*", config.store.namespace);
            let manifest = pipeline::build(&store, &backend, &config).await?;
            pipeline::write_manifest(&manifest, &cli.output)?;
            output::print_build_output(&manifest, &cli.output);
        }
        Command::List => {
            let config = config::load_config(&cli.config)?;
            let store = connect(&config)?;
            let descriptors = manifest::build_manifest(&store, &config.store).await?;
            output::print_list_output(&descriptors);
        }
        Command::Check => {
            println!("==> Checking {}", cli.config.display());
            let config = config::load_config(&cli.config)?;
            output::print_config_output(&config);
            println!("==> Config is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}
