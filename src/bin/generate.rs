//! Schema Generator CLI
//!
//! Generates sources for XSD schemas and everything they reference,
//! skipping units whose episode is already in the output directory.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use xsd_generator::{
    discover_schemas, Flag, Generator, GeneratorConfig, NodeState, PackageResolver,
    ReferenceGraph,
};

#[derive(Parser)]
#[command(name = "xsd-generate")]
#[command(about = "Generate sources from XSD schemas with dependency auto-resolution")]
struct Cli {
    /// Config file (defaults to xsdgen.toml lookup)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate schemas (files or folders containing *.xsd)
    Generate {
        #[arg(required = true)]
        schemas: Vec<PathBuf>,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Base folder for resolving references
        #[arg(long)]
        schema_folder: Option<PathBuf>,

        /// Folder holding binding files
        #[arg(long)]
        binding_folder: Option<PathBuf>,

        /// Append the file name version to derived packages
        #[arg(long)]
        filename_versions: bool,

        /// Package for all generated units
        #[arg(short, long)]
        package: Option<String>,

        /// XML catalog
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Compiler switches, e.g. --flag=-XtoString (replaces configured flags)
        #[arg(long = "flag", allow_hyphen_values = true)]
        flags: Vec<String>,

        /// Write a JSON build report
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Print the reference tree of a schema
    Tree {
        schema: PathBuf,

        /// Base folder for resolving references
        #[arg(long)]
        schema_folder: Option<PathBuf>,

        /// Graphviz output instead of an indented listing
        #[arg(long)]
        dot: bool,
    },

    /// Print the package a schema generates into
    Package {
        schema: PathBuf,

        #[arg(long)]
        filename_version: bool,

        /// Explicit package, printed verbatim
        #[arg(short, long)]
        package: Option<String>,
    },

    /// Show the effective configuration
    Config {
        /// Write a default config file to this path
        #[arg(long)]
        init: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    if let Err(e) = run(cli) {
        eprintln!("❌ {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = GeneratorConfig::load_from(cli.config.as_deref().and_then(Path::to_str))
        .context("Failed to load configuration")?;

    match cli.command {
        Commands::Generate {
            schemas,
            output,
            schema_folder,
            binding_folder,
            filename_versions,
            package,
            catalog,
            flags,
            report,
        } => {
            let mut options = config.generate_options();
            if binding_folder.is_some() {
                options.binding_folder = binding_folder;
            }
            if catalog.is_some() {
                options.catalog = catalog;
            }
            if package.is_some() {
                options.package_name = package;
            }
            options.use_filename_versions |= filename_versions;
            if !flags.is_empty() {
                options.flags = Some(flags.into_iter().map(parse_flag).collect());
            }

            let output_dir = output.unwrap_or_else(|| config.output.dir.clone());
            let mut generator = Generator::new(&output_dir, config.compiler())
                .with_encoding(config.output.encoding.clone());

            let schema_folder = schema_folder.or_else(|| config.schemas.folder.clone());
            let files = expand_schemas(&schemas, schema_folder.as_deref())?;

            let result = generator.generate_all(&files, schema_folder.as_deref(), &options);
            let reports = match result {
                Ok(reports) => reports,
                Err(e) => {
                    if let (Some(path), Some(failed)) = (&report, generator.last_report()) {
                        std::fs::write(path, serde_json::to_string_pretty(&[failed])?)?;
                        println!("📝 Report of the failed run written to {:?}", path);
                    }
                    return Err(e).context("Generation failed");
                }
            };

            for built in &reports {
                println!(
                    "✅ {} - {} built, {} cached",
                    built.root.display(),
                    built.count(NodeState::Built),
                    built.count(NodeState::SkippedCached)
                );
            }

            if let Some(path) = report {
                std::fs::write(&path, serde_json::to_string_pretty(&reports)?)?;
                println!("✅ Report written to {:?}", path);
            }
            Ok(())
        }

        Commands::Tree { schema, schema_folder, dot } => {
            let base_folder = schema_folder
                .or_else(|| config.schemas.folder.clone())
                .or_else(|| schema.parent().map(Path::to_path_buf))
                .unwrap_or_default();
            let graph = ReferenceGraph::build(&schema, &base_folder)?;
            if dot {
                print!("{}", graph.to_dot());
            } else {
                print!("{}", graph.render_tree());
            }
            Ok(())
        }

        Commands::Package { schema, filename_version, package } => {
            let resolver = PackageResolver::new(filename_version || config.schemas.use_filename_versions);
            let explicit = package.or_else(|| config.schemas.package_name.clone());
            println!("{}", resolver.resolve(&schema, explicit.as_deref())?);
            Ok(())
        }

        Commands::Config { init } => {
            if let Some(path) = init {
                if path.exists() {
                    bail!("{} already exists", path.display());
                }
                let path_str = path.to_str().context("Config path is not valid UTF-8")?;
                GeneratorConfig::default().save(path_str)?;
                println!("✅ Wrote default config to {:?}", path);
            } else {
                print!("{}", toml::to_string_pretty(&config)?);
            }
            Ok(())
        }
    }
}

/// Known tokens map to their flag, anything else is passed through
fn parse_flag(token: String) -> Flag {
    let known = [
        Flag::Extension,
        Flag::MarkGenerated,
        Flag::AutoNameResolution,
        Flag::GenerateEquals,
        Flag::GenerateHashCode,
        Flag::GenerateToString,
    ];
    known
        .into_iter()
        .find(|flag| flag.token() == token)
        .unwrap_or(Flag::Custom(token))
}

/// Folders expand to the schemas they contain; relative files are looked
/// up in the schema folder when they do not exist as given.
fn expand_schemas(inputs: &[PathBuf], schema_folder: Option<&Path>) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let found = discover_schemas(input);
            if found.is_empty() {
                bail!("No schemas found in {}", input.display());
            }
            files.extend(found);
        } else if input.is_file() {
            files.push(input.clone());
        } else if let Some(folder) = schema_folder.filter(|_| input.is_relative()) {
            files.push(folder.join(input));
        } else {
            bail!("Schema {} does not exist", input.display());
        }
    }
    Ok(files)
}
