//! catalog-dump CLI - Schema metadata dump for Greenplum and PostgreSQL catalogs.

use catalog_dump::{Config, DumpError, MetadataDump, Section, Toc};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, Level};
use tracing_subscriber::fmt::format::FmtSpan;

#[derive(Parser)]
#[command(name = "catalog-dump")]
#[command(about = "Dump schema metadata with a byte-accurate table of contents")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Dump metadata and write the TOC
    Dump {
        /// Only dump objects in this schema (repeatable)
        #[arg(long)]
        include_schema: Vec<String>,

        /// Skip objects in this schema (repeatable)
        #[arg(long)]
        exclude_schema: Vec<String>,

        /// Only dump this schema.table (repeatable)
        #[arg(long)]
        include_table: Vec<String>,

        /// Skip this schema.table (repeatable)
        #[arg(long)]
        exclude_table: Vec<String>,

        /// Treat leaf partitions as individually selectable
        #[arg(long)]
        leaf_partition_data: bool,

        /// Override metadata output path
        #[arg(long)]
        metadata_file: Option<String>,

        /// Override TOC output path
        #[arg(long)]
        toc_file: Option<String>,
    },

    /// Validate the configuration file without connecting
    Validate,

    /// List TOC entries or print a single object's DDL
    Toc {
        /// TOC file to read
        #[arg(long)]
        toc_file: PathBuf,

        /// Metadata file the TOC describes (defaults to the path in the TOC header)
        #[arg(long)]
        metadata_file: Option<PathBuf>,

        /// Print the DDL of the object with this schema.name
        #[arg(long)]
        object: Option<String>,

        /// Object type of --object (e.g. TABLE, INDEX)
        #[arg(long, default_value = "TABLE")]
        object_type: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), DumpError> {
    let cli = Cli::parse();

    // TOC inspection works offline and does not need a configuration
    if let Commands::Toc {
        toc_file,
        metadata_file,
        object,
        object_type,
    } = &cli.command
    {
        return inspect_toc(toc_file, metadata_file.as_deref(), object.as_deref(), object_type);
    }

    setup_logging(&cli.verbosity, &cli.log_format).map_err(DumpError::Config)?;

    let mut config = Config::load(&cli.config)?;
    info!("Loaded configuration from {:?}", cli.config);

    match cli.command {
        Commands::Toc { .. } => unreachable!(), // Handled above
        Commands::Validate => {
            println!("Configuration is valid (hash {})", config.hash());
        }
        Commands::Dump {
            include_schema,
            exclude_schema,
            include_table,
            exclude_table,
            leaf_partition_data,
            metadata_file,
            toc_file,
        } => {
            // Apply overrides
            config.filter.include_schemas.extend(include_schema);
            config.filter.exclude_schemas.extend(exclude_schema);
            config.filter.include_relations.extend(include_table);
            config.filter.exclude_relations.extend(exclude_table);
            if leaf_partition_data {
                config.filter.leaf_partition_data = true;
            }
            if let Some(path) = metadata_file {
                config.output.metadata_file = path;
            }
            if let Some(path) = toc_file {
                config.output.toc_file = path;
            }
            config.validate()?;

            let summary = MetadataDump::new(config)?.run().await?;

            if cli.output_json {
                println!("{}", summary.to_json()?);
            } else {
                println!(
                    "Dumped {} objects ({} bytes) to {}",
                    summary.toc_entries, summary.bytes_written, summary.metadata_file
                );
            }
        }
    }

    Ok(())
}

fn inspect_toc(
    toc_file: &Path,
    metadata_file: Option<&Path>,
    object: Option<&str>,
    object_type: &str,
) -> Result<(), DumpError> {
    let toc = Toc::load(toc_file)?;

    let Some(object) = object else {
        for section in [Section::Predata, Section::Postdata] {
            for entry in toc.entries(section) {
                let mut line = format!(
                    "{}\t{}\t{}.{}\t{}-{}",
                    section, entry.object_type, entry.schema, entry.name, entry.start_byte, entry.end_byte
                );
                if !entry.reference_object.is_empty() {
                    line.push_str(&format!("\t{}", entry.reference_object));
                }
                println!("{}", line);
            }
        }
        return Ok(());
    };

    let (schema, name) = object.split_once('.').unwrap_or(("", object));
    let (_, entry) = toc
        .find(schema, name, &object_type.to_uppercase())
        .ok_or_else(|| DumpError::Config(format!("{} '{}' not found in TOC", object_type, object)))?;

    let path = match (metadata_file, &toc.header) {
        (Some(path), _) => path.to_path_buf(),
        (None, Some(header)) => PathBuf::from(&header.metadata_file),
        (None, None) => {
            return Err(DumpError::Config(
                "TOC has no header; pass --metadata-file".into(),
            ))
        }
    };
    let metadata = std::fs::read(&path)?;
    let ddl = Toc::slice(&metadata, entry)?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(ddl)?;
    stdout.write_all(b"\n")?;
    Ok(())
}

fn setup_logging(verbosity: &str, format: &str) -> Result<(), String> {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false);

    if format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    Ok(())
}
