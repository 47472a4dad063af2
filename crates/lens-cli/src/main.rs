use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::prelude::*;

use lens_core::scval::wire;
use lens_core::{normalize_root, normalize_sc_address, LensConfig, NormalizeOptions, NormalizedValue};

/// lens - Soroban State Lens CLI
///
/// Normalize contract values into renderable JSON, classify addresses, and
/// summarize what a value contains.
#[derive(Parser)]
#[command(name = "lens", version, about, long_about = None)]
struct Cli {
    /// Config file (defaults to ./lens.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize a source value and print the result as JSON
    Normalize {
        /// Path to a JSON file holding one source value
        file: PathBuf,
        #[command(flatten)]
        options: NormalizeArgs,
        /// Print compact JSON on a single line
        #[arg(long)]
        compact: bool,
    },

    /// Classify an ScvAddress value by its prefix
    Address {
        /// Path to a JSON file holding one ScvAddress value
        file: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Count normalized nodes by kind and print the content hash
    Summary {
        /// Path to a JSON file holding one source value
        file: PathBuf,
        #[command(flatten)]
        options: NormalizeArgs,
        /// Output as JSON
        #[arg(long)]
        json: bool,
        /// Exit 1 if any cycle, truncated or unsupported marker was produced
        #[arg(long)]
        strict: bool,
    },

    /// Show version information
    Version,
}

/// Flags that override the configured normalization options
#[derive(Args)]
struct NormalizeArgs {
    /// Depth ceiling; deeper nodes become truncated markers
    #[arg(long, conflicts_with = "unbounded")]
    max_depth: Option<usize>,
    /// Disable the depth ceiling
    #[arg(long)]
    unbounded: bool,
    /// Decode ScvAddress values instead of reporting them unsupported
    #[arg(long)]
    decode_addresses: bool,
}

impl NormalizeArgs {
    fn apply(&self, options: &mut NormalizeOptions) {
        if let Some(depth) = self.max_depth {
            options.max_depth = Some(depth);
        }
        if self.unbounded {
            options.max_depth = None;
        }
        if self.decode_addresses {
            options.decode_addresses = true;
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    let exit_code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            2
        }
    };

    process::exit(exit_code);
}

fn run(cli: Cli) -> lens_core::Result<i32> {
    match cli.command {
        Commands::Normalize { file, options: flags, compact } => {
            let mut options = load_options(cli.config.as_deref())?;
            flags.apply(&mut options);

            let result = normalize_file(&file, &options)?;
            let text = if compact {
                serde_json::to_string(&result)?
            } else {
                serde_json::to_string_pretty(&result)?
            };
            println!("{}", text);
            Ok(0)
        }

        Commands::Address { file, json } => {
            let decoded = wire::from_file(&file)?;
            match normalize_sc_address(&decoded.graph, decoded.root_id()) {
                Some(address) if json => {
                    println!("{}", serde_json::to_string_pretty(&address)?);
                    Ok(0)
                }
                Some(address) => {
                    println!("{} {}", address.address_type.as_str().green(), address.value);
                    Ok(0)
                }
                None => {
                    eprintln!(
                        "{} {} is not an ScvAddress with a string payload",
                        "error:".red().bold(),
                        file.display()
                    );
                    Ok(1)
                }
            }
        }

        Commands::Summary {
            file,
            options: flags,
            json,
            strict,
        } => {
            let mut options = load_options(cli.config.as_deref())?;
            flags.apply(&mut options);
            let result = normalize_file(&file, &options)?;
            let census = result.census();
            let hash = result.content_hash()?;

            if json {
                let report = serde_json::json!({
                    "kind": result.kind(),
                    "nodes": census.total(),
                    "fallbacks": census.fallbacks(),
                    "census": census,
                    "hash": hash,
                });
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{} {}", "kind:".bold(), result.kind());
                println!("{} {}", "nodes:".bold(), census.total());
                println!(
                    "  primitive {}, vec {}, map {}, address {}, error {}",
                    census.primitive, census.vec, census.map, census.address, census.error
                );
                let fallbacks = format!(
                    "unsupported {}, cycle {}, truncated {}",
                    census.unsupported, census.cycle, census.truncated
                );
                if census.fallbacks() > 0 {
                    println!("  {}", fallbacks.yellow());
                } else {
                    println!("  {}", fallbacks);
                }
                println!("{} {}", "hash:".bold(), hash);
            }

            if strict && census.fallbacks() > 0 {
                eprintln!(
                    "{} {} fallback marker(s) in {}",
                    "error:".red().bold(),
                    census.fallbacks(),
                    file.display()
                );
                return Ok(1);
            }
            Ok(0)
        }

        Commands::Version => {
            println!("lens {} (lens-core {})", env!("CARGO_PKG_VERSION"), env!("CARGO_PKG_VERSION"));
            Ok(0)
        }
    }
}

/// Options from `--config`, else `./lens.toml`, else tool defaults
fn load_options(config: Option<&Path>) -> lens_core::Result<NormalizeOptions> {
    let config = match config {
        Some(path) => LensConfig::load(path)?,
        None => LensConfig::discover(Path::new("."))?,
    };
    Ok(config.normalize_options())
}

fn normalize_file(file: &Path, options: &NormalizeOptions) -> lens_core::Result<NormalizedValue> {
    let decoded = wire::from_file(file)?;
    tracing::debug!(file = %file.display(), nodes = decoded.graph.len(), "decoded source value");
    Ok(normalize_root(&decoded.graph, Some(&decoded.root), options))
}
