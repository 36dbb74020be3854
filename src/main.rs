use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

use buildings3d::api::{NominatimClient, SocrataClient};
use buildings3d::config::FileConfig;
use buildings3d::pipeline::{self, RunOptions, Stage};
use buildings3d::server;

/// Fetch, enrich and serve 3D building footprints
///
/// Examples:
///   # Refresh the cache for the default downtown Calgary box
///   buildings3d fetch
///
///   # A different box, four geocoding workers against a private Nominatim
///   buildings3d fetch --north 51.05 --south 51.04 --west -114.08 --east -114.06 \
///       --geocoder-url http://localhost:8080 --concurrency 4 --min-interval-ms 0
///
///   # Serve the cached file to the map viewer
///   buildings3d serve --port 5000
#[derive(Parser, Debug)]
#[command(name = "buildings3d")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to config file (optional, auto-searches buildings3d.toml if not provided)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory the cache path is resolved against
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Cache file path (defaults to data/buildings.geojson)
    #[arg(long, global = true)]
    cache: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Query the source, enrich every building and rewrite the cache file
    Fetch(FetchArgs),
    /// Serve the cache file at GET /api/buildings
    Serve(ServeArgs),
}

#[derive(ClapArgs, Debug)]
struct FetchArgs {
    /// Source GeoJSON endpoint
    #[arg(long)]
    source_url: Option<String>,

    /// Maximum number of buildings to request
    #[arg(long)]
    limit: Option<u32>,

    #[arg(long, allow_hyphen_values = true)]
    north: Option<f64>,

    #[arg(long, allow_hyphen_values = true)]
    south: Option<f64>,

    #[arg(long, allow_hyphen_values = true)]
    west: Option<f64>,

    #[arg(long, allow_hyphen_values = true)]
    east: Option<f64>,

    /// Reverse geocoding service base URL
    #[arg(long)]
    geocoder_url: Option<String>,

    /// User agent sent to the geocoding service
    #[arg(long)]
    user_agent: Option<String>,

    /// Number of concurrent reverse geocoding lookups
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..=64))]
    concurrency: Option<u16>,

    /// Minimum delay between two geocoding requests, in milliseconds
    #[arg(long)]
    min_interval_ms: Option<u64>,
}

#[derive(ClapArgs, Debug)]
struct ServeArgs {
    #[arg(long)]
    host: Option<String>,

    #[arg(short = 'p', long)]
    port: Option<u16>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let (mut config, skipped) = match args.config {
        Some(ref path) => (FileConfig::from_path(path)?, Vec::new()),
        None => {
            let discovered = FileConfig::load();
            (discovered.config.unwrap_or_default(), discovered.skipped)
        }
    };

    init_logging(args.verbose || config.verbose);
    for skipped in skipped {
        tracing::warn!(
            "Failed to parse config file {:?}: {}",
            skipped.path,
            skipped.reason
        );
    }

    if let Some(dir) = args.data_dir {
        config.cache.base_dir = Some(dir);
    }
    if let Some(path) = args.cache {
        config.cache.path = path;
    }

    match args.command {
        Command::Fetch(fetch) => {
            apply_fetch_args(&mut config, fetch);
            run_fetch(&config)
        }
        Command::Serve(serve) => {
            if let Some(host) = serve.host {
                config.server.host = host;
            }
            if let Some(port) = serve.port {
                config.server.port = port;
            }
            run_serve(&config)
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn apply_fetch_args(config: &mut FileConfig, args: FetchArgs) {
    let source = &mut config.source;
    if let Some(url) = args.source_url {
        source.url = url;
    }
    if let Some(limit) = args.limit {
        source.limit = limit;
    }
    source.bbox.north = args.north.unwrap_or(source.bbox.north);
    source.bbox.south = args.south.unwrap_or(source.bbox.south);
    source.bbox.west = args.west.unwrap_or(source.bbox.west);
    source.bbox.east = args.east.unwrap_or(source.bbox.east);

    let geocoder = &mut config.geocoder;
    if let Some(url) = args.geocoder_url {
        geocoder.url = url;
    }
    if let Some(user_agent) = args.user_agent {
        geocoder.user_agent = user_agent;
    }
    if let Some(concurrency) = args.concurrency {
        geocoder.concurrency = concurrency as usize;
    }
    if let Some(ms) = args.min_interval_ms {
        geocoder.min_interval_ms = ms;
    }
}

fn run_fetch(config: &FileConfig) -> Result<()> {
    let total_start = Instant::now();
    let options = RunOptions::from_config(config);

    println!("buildings3d - Building Footprint Fetcher");
    println!("========================================");
    println!();
    tracing::debug!(?options, source = %config.source.url, geocoder = %config.geocoder.url, "configuration");

    let source = SocrataClient::new(&config.source).context("Failed to set up source client")?;
    let geocoder =
        NominatimClient::new(&config.geocoder).context("Failed to set up geocoding client")?;

    let geocoding = create_progress_bar("Reverse geocoding");
    let mut spinner: Option<ProgressBar> = None;
    let mut start = Instant::now();

    let result = pipeline::run(&source, &geocoder, &options, &geocoding, |stage| match stage {
        Stage::Fetching => {
            start = Instant::now();
            spinner = Some(create_spinner("Fetching buildings from open-data API..."));
        }
        Stage::Fetched { features, bounds } => {
            if let Some(pb) = spinner.take() {
                pb.finish_with_message(format!(
                    "Fetched {} buildings [{:.1}s]",
                    features,
                    start.elapsed().as_secs_f32()
                ));
            }
            if let Some(bounds) = bounds {
                println!("  Dataset bounds (xmin, ymin, xmax, ymax): {}", bounds);
            }
            spinner = Some(create_spinner("Computing heights and centroids..."));
        }
        Stage::Enriched { null_heights } => {
            if let Some(pb) = spinner.take() {
                pb.finish_with_message(format!(
                    "Computed heights ({} without elevation data) and centroids",
                    null_heights
                ));
            }
        }
        Stage::Geocoding { .. } => {
            start = Instant::now();
            geocoding.set_draw_target(ProgressDrawTarget::stderr());
            geocoding.enable_steady_tick(Duration::from_millis(80));
        }
        Stage::Geocoded(stats) => {
            geocoding.finish_with_message(format!(
                "Geocoded: {} resolved, {} unknown, {} errors [{:.1}s]",
                stats.resolved,
                stats.unknown,
                stats.errors,
                start.elapsed().as_secs_f32()
            ));
        }
        Stage::Writing => {
            spinner = Some(create_spinner("Writing cache file..."));
        }
        Stage::Written { features } => {
            if let Some(pb) = spinner.take() {
                pb.finish_with_message(format!(
                    "Saved {} filtered buildings to {}",
                    features,
                    options.output.display()
                ));
            }
        }
    });

    if let Some(pb) = spinner {
        pb.abandon();
    }
    let summary = result.context("Fetch run failed")?;
    tracing::debug!(?summary, "run complete");

    println!();
    println!(
        "Done! Total time: {:.1}s",
        total_start.elapsed().as_secs_f32()
    );

    Ok(())
}

fn run_serve(config: &FileConfig) -> Result<()> {
    let path = config.cache.resolved_path();
    let state = server::load_state(&path)
        .with_context(|| format!("Failed to load cache file {}", path.display()))?;

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    runtime
        .block_on(server::serve(&config.server, Arc::new(state)))
        .context("Server failed")?;

    Ok(())
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Hidden until geocoding starts; the length is set by the pipeline.
fn create_progress_bar(message: &str) -> ProgressBar {
    let pb = ProgressBar::with_draw_target(None, ProgressDrawTarget::hidden());
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg} [{bar:30.cyan/blue}] {pos}/{len} ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );
    pb.set_message(message.to_string());
    pb
}
