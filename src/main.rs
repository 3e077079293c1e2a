//! Prism - glTF geometry ingestion
//!
//! Loads glTF files into renderer-ready meshes and reports what was produced.
//!
//! Usage: `prism [--config <settings.toml>] [--write-config] [--json] <file>...`
//!
//! `--write-config` saves the effective settings to the `--config` path, or to the
//! default location, so they can be edited.

mod settings;
mod summary;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use prism_assets::GeometryHandler;
use tracing::{error, info, warn};
use tracing_subscriber::FmtSubscriber;

use settings::Settings;
use summary::MeshSummary;

/// Parsed command line
#[derive(Debug, Default, PartialEq)]
struct Args {
    config: Option<PathBuf>,
    write_config: bool,
    json: bool,
    files: Vec<PathBuf>,
}

impl Args {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut parsed = Args::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" => {
                    let path = args.next().context("--config requires a path")?;
                    parsed.config = Some(PathBuf::from(path));
                }
                "--write-config" => parsed.write_config = true,
                "--json" => parsed.json = true,
                flag if flag.starts_with("--") => bail!("unknown option '{}'", flag),
                file => parsed.files.push(PathBuf::from(file)),
            }
        }
        if parsed.files.is_empty() && !parsed.write_config {
            bail!("usage: prism [--config <settings.toml>] [--write-config] [--json] <file>...");
        }
        Ok(parsed)
    }
}

fn run(args: Args) -> Result<bool> {
    let (settings, settings_error) = match &args.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    };

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(settings.logging.max_level())
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    if let Some(e) = settings_error {
        warn!("{:#}; using default settings", e);
    }

    if args.write_config {
        match &args.config {
            Some(path) => settings.save_to(path),
            None => settings.save(),
        }
        .context("Failed to write settings")?;
    }

    let base = std::env::current_dir().context("Failed to read current directory")?;
    let mut handler = GeometryHandler::with_default_loaders(base, settings.loader.clone());

    let mut all_loaded = true;
    for file in &args.files {
        if let Err(e) = handler.load_geometry(file) {
            error!("{}", e);
            all_loaded = false;
        }
    }

    let summaries: Vec<MeshSummary> = handler.meshes().iter().map(MeshSummary::from).collect();
    for summary in &summaries {
        info!(
            "Mesh '{}': {} vertices, {} faces, streams [{}], bounds {:?}..{:?}",
            summary.name,
            summary.vertex_count,
            summary.face_count,
            summary.streams.join(", "),
            summary.bounds_min,
            summary.bounds_max
        );
    }
    if handler.has_geometry() {
        let bounds = handler.bounds();
        info!("Scene bounds: {:?}..{:?}", bounds.min, bounds.max);
    }

    if args.json {
        let json = serde_json::to_string_pretty(&summaries).context("Failed to serialize summaries")?;
        println!("{json}");
    }

    Ok(all_loaded)
}

fn main() -> ExitCode {
    let result = Args::parse(std::env::args().skip(1)).and_then(run);
    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("prism: {e:#}");
            ExitCode::FAILURE
        }
    }
}
