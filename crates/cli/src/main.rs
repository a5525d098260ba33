use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use docbot_indexer::{ArchiveWatcher, DocLookup};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::config::{Settings, ARCHIVE_DIR_ENV};
use crate::pack::{pack_directory, PackOptions};
use crate::render::Reply;

mod config;
mod pack;
mod render;

#[derive(Parser)]
#[command(name = "docbot")]
#[command(about = "Answer class documentation questions from a directory of archives", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the documentation archives (overrides DOCBOT_ARCHIVE_DIR)
    #[arg(long, global = true)]
    archive_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up one or more class names
    Lookup(LookupArgs),

    /// Keep the archive directory watched and answer queries read from stdin
    Watch,

    /// List loaded archives
    List(ListArgs),

    /// Build an archive from a directory of class documents
    Pack(PackArgs),
}

#[derive(Args)]
struct LookupArgs {
    /// Simple or fully-qualified class names
    #[arg(required = true)]
    queries: Vec<String>,

    /// Output JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct ListArgs {
    /// Output JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct PackArgs {
    /// Directory of `<full.name>.json` files, optionally with an info.json
    src: PathBuf,

    /// Archive to write
    out: PathBuf,

    /// Library name (defaults to the archive file stem)
    #[arg(long)]
    name: Option<String>,

    /// Library version
    #[arg(long = "version", value_name = "VERSION")]
    lib_version: Option<String>,

    /// Root URL of the hosted documentation
    #[arg(long)]
    base_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let settings = Settings::resolve(
        cli.config.as_deref(),
        std::env::var_os(ARCHIVE_DIR_ENV).map(PathBuf::from),
        cli.archive_dir.clone(),
    )?;

    match cli.command {
        Commands::Lookup(args) => run_lookup(args, &settings),
        Commands::Watch => run_watch(&settings).await,
        Commands::List(args) => run_list(args, &settings),
        Commands::Pack(args) => run_pack(args),
    }
}

fn open_lookup(settings: &Settings) -> Result<DocLookup> {
    DocLookup::open(settings.lookup.clone()).with_context(|| {
        format!(
            "Failed to open archive directory {}",
            settings.lookup.archive_dir.display()
        )
    })
}

fn run_lookup(args: LookupArgs, settings: &Settings) -> Result<()> {
    let lookup = open_lookup(settings)?;
    let replies: Vec<Reply> = args
        .queries
        .iter()
        .map(|query| Reply::from_lookup(query, lookup.class_info(query)))
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&replies)?);
    } else {
        let texts: Vec<String> = replies.iter().map(Reply::text).collect();
        println!("{}", texts.join("\n\n"));
    }
    Ok(())
}

async fn run_watch(settings: &Settings) -> Result<()> {
    let lookup = Arc::new(open_lookup(settings)?);
    let watcher = ArchiveWatcher::start(lookup.clone(), settings.watcher)
        .context("Failed to start archive watcher")?;
    log::info!(
        "Watching {}; type a class name per line",
        lookup.archive_dir().display()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                log::info!("Interrupted");
                break;
            }
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    break;
                };
                let query = line.trim();
                if query.is_empty() {
                    continue;
                }
                let reply = Reply::from_lookup(query, lookup.class_info(query));
                println!("{}", reply.text());
            }
        }
    }

    watcher.shutdown().await;
    Ok(())
}

fn run_list(args: ListArgs, settings: &Settings) -> Result<()> {
    let lookup = open_lookup(settings)?;
    let archives = lookup.archives();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&archives)?);
        return Ok(());
    }
    if archives.is_empty() {
        println!("No archives loaded");
    }
    for archive in &archives {
        let library = archive
            .library
            .as_ref()
            .map(|info| match &info.version {
                Some(version) => format!(" [{} {version}]", info.name),
                None => format!(" [{}]", info.name),
            })
            .unwrap_or_default();
        println!(
            "{}{library}: {} classes",
            archive.file_name, archive.classes
        );
    }
    Ok(())
}

fn run_pack(args: PackArgs) -> Result<()> {
    let options = PackOptions {
        name: args.name,
        version: args.lib_version,
        base_url: args.base_url,
    };
    let classes = pack_directory(&args.src, &args.out, options)?;
    log::info!("Packed {classes} classes into {}", args.out.display());
    println!("{}", args.out.display());
    Ok(())
}
