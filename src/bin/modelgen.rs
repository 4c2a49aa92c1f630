//! modelgen CLI
//!
//! Validates model descriptors, shows resolved views and runs generation
//! backends per version.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use modelgen::codegen::output::{drift, write_atomic, DriftStatus};
use modelgen::config::OutputFormat;
use modelgen::model::{load_descriptor, load_from_directory};
use modelgen::{
    validate, CertifiedModel, GenerationEngine, GeneratorConfig, ModelError, Version,
};

#[derive(Parser)]
#[command(name = "modelgen")]
#[command(about = "Validate versioned object models and generate code from them")]
struct Cli {
    /// Configuration file layered over the default locations
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a descriptor, or every descriptor under a directory
    Validate {
        path: PathBuf,
    },

    /// Print the resolved view of one version as JSON
    Resolve {
        descriptor: PathBuf,
        /// Target version
        #[arg(short, long)]
        version: String,
        /// Include association annotations
        #[arg(long)]
        annotated: bool,
    },

    /// Generate artifacts for one or more versions
    Generate {
        descriptor: PathBuf,
        /// Target versions (repeatable, or "all" for every declared version)
        #[arg(short, long, required = true)]
        version: Vec<String>,
        /// Backends to run (defaults to the configured list)
        #[arg(short, long)]
        backend: Vec<String>,
        /// Output directory (defaults to the configured one)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compare generated artifacts with what is on disk
    Check {
        descriptor: PathBuf,
        #[arg(short, long, required = true)]
        version: Vec<String>,
        #[arg(short, long)]
        backend: Vec<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List every version bound declared in a descriptor
    Versions {
        descriptor: PathBuf,
    },

    /// List registered backends
    Backends,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = GeneratorConfig::load_from(cli.config.as_deref())
        .context("failed to load configuration")?;

    match cli.command {
        Commands::Validate { path } => {
            let descriptors = if path.is_dir() {
                load_from_directory(&path)
            } else {
                vec![(path.clone(), load_descriptor(&path))]
            };
            if descriptors.is_empty() {
                bail!("no descriptors found under {}", path.display());
            }

            let mut all_valid = true;
            for (file, loaded) in descriptors {
                let outcome = loaded.and_then(|l| validate(l.model, &config.validation_options()));
                match outcome {
                    Ok(certified) => {
                        let warnings = certified.warnings();
                        if config.validation.fail_on_warnings && !warnings.is_empty() {
                            all_valid = false;
                            println!("❌ {} - {} warning(s)", file.display(), warnings.len());
                        } else {
                            println!("✅ {} - valid", file.display());
                        }
                        print_diagnostics(warnings, config.output.format)?;
                    }
                    Err(ModelError::Validation(diagnostics)) => {
                        all_valid = false;
                        println!("❌ {} - {} error(s)", file.display(), diagnostics.error_count());
                        print_diagnostics(&diagnostics, config.output.format)?;
                    }
                    Err(e) => {
                        all_valid = false;
                        println!("❌ {} - {}", file.display(), e);
                    }
                }
            }

            if !all_valid {
                std::process::exit(1);
            }
            Ok(())
        }

        Commands::Resolve {
            descriptor,
            version,
            annotated,
        } => {
            let certified = certify(&descriptor, &config)?;
            let version = Version::parse(&version)?;
            let view = certified.resolve(&version)?;

            let json = if annotated {
                to_json(&view.annotate()?, config.output.format)?
            } else {
                to_json(&view, config.output.format)?
            };
            println!("{}", json);
            Ok(())
        }

        Commands::Generate {
            descriptor,
            version,
            backend,
            output,
        } => {
            let certified = certify(&descriptor, &config)?;
            let pairs = pairs(&certified, &version, &backend, &config)?;
            let root = output.unwrap_or_else(|| config.output_root());
            let generation = config.to_generation_config();

            let engine = GenerationEngine::default();
            let mut failed = 0;
            for outcome in engine.generate_all(&certified, &pairs, &generation) {
                let label = format!("{} @ {}", outcome.backend, outcome.version);
                match outcome.result.and_then(|set| write_atomic(&set, &root).map(|w| (set, w))) {
                    Ok((set, written)) => {
                        println!("✅ {} - {} file(s), checksum {}", label, written.len(), set.checksum);
                    }
                    Err(e) => {
                        failed += 1;
                        println!("❌ {} - {}", label, e);
                    }
                }
            }

            if failed > 0 {
                bail!("{} of {} generation pair(s) failed", failed, pairs.len());
            }
            Ok(())
        }

        Commands::Check {
            descriptor,
            version,
            backend,
            output,
        } => {
            let certified = certify(&descriptor, &config)?;
            let pairs = pairs(&certified, &version, &backend, &config)?;
            let root = output.unwrap_or_else(|| config.output_root());
            let generation = config.to_generation_config();

            let engine = GenerationEngine::default();
            let mut drifted = 0;
            let mut failed = 0;
            for outcome in engine.generate_all(&certified, &pairs, &generation) {
                let label = format!("{} @ {}", outcome.backend, outcome.version);
                let entries = match outcome.result.and_then(|set| drift(&set, &root)) {
                    Ok(entries) => entries,
                    Err(e) => {
                        failed += 1;
                        println!("❌ {} - {}", label, e);
                        continue;
                    }
                };
                for entry in entries {
                    match &entry.status {
                        DriftStatus::Unchanged => {}
                        DriftStatus::Missing => {
                            drifted += 1;
                            println!("❌ {} - missing", entry.path.display());
                        }
                        DriftStatus::Modified { diff } => {
                            drifted += 1;
                            println!("❌ {} - modified", entry.path.display());
                            println!("{}", diff);
                        }
                    }
                }
            }

            if drifted > 0 || failed > 0 {
                println!();
                if drifted > 0 {
                    println!("❌ {} artifact(s) out of date", drifted);
                }
                if failed > 0 {
                    println!("❌ {} of {} generation pair(s) failed", failed, pairs.len());
                }
                std::process::exit(1);
            }
            println!("✅ Generated artifacts are up to date");
            Ok(())
        }

        Commands::Versions { descriptor } => {
            let certified = certify(&descriptor, &config)?;
            for version in certified.declared_versions() {
                println!("{}", version);
            }
            Ok(())
        }

        Commands::Backends => {
            for id in GenerationEngine::default().registry().ids() {
                println!("{}", id);
            }
            Ok(())
        }
    }
}

fn certify(descriptor: &Path, config: &GeneratorConfig) -> anyhow::Result<CertifiedModel> {
    let loaded = load_descriptor(descriptor)?;
    match validate(loaded.model, &config.validation_options()) {
        Ok(certified) => Ok(certified),
        Err(ModelError::Validation(diagnostics)) => {
            eprint!("{}", diagnostics.format_all());
            bail!("{} is not a valid model", descriptor.display())
        }
        Err(e) => Err(e.into()),
    }
}

/// Expand the requested versions and backends into generation pairs
fn pairs(
    certified: &CertifiedModel,
    versions: &[String],
    backends: &[String],
    config: &GeneratorConfig,
) -> anyhow::Result<Vec<(Version, String)>> {
    let versions: Vec<Version> = if versions.iter().any(|v| v == "all") {
        certified.declared_versions()
    } else {
        versions
            .iter()
            .map(|v| Version::parse(v))
            .collect::<Result<_, _>>()?
    };
    let backends = if backends.is_empty() {
        &config.generation.backends
    } else {
        backends
    };

    Ok(versions
        .iter()
        .flat_map(|v| backends.iter().map(move |b| (v.clone(), b.clone())))
        .collect())
}

fn print_diagnostics(diagnostics: &modelgen::Diagnostics, format: OutputFormat) -> anyhow::Result<()> {
    if diagnostics.is_empty() {
        return Ok(());
    }
    match format {
        OutputFormat::Pretty => {
            for item in diagnostics.all() {
                println!("   └─ {}", item);
            }
        }
        OutputFormat::Compact => println!("{}", serde_json::to_string(diagnostics)?),
    }
    Ok(())
}

fn to_json<T: serde::Serialize>(value: &T, format: OutputFormat) -> serde_json::Result<String> {
    match format {
        OutputFormat::Pretty => serde_json::to_string_pretty(value),
        OutputFormat::Compact => serde_json::to_string(value),
    }
}
