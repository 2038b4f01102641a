use std::path::PathBuf;
use std::process;

use clap::Parser;
use databrowser::{BoundQuery, Config, Schema};
use eyre::Result;

#[derive(Parser, Debug)]
#[clap(name = "databrowser", about, version)]
struct Args {
    /// Increase output logging verbosity.
    #[clap(short, long)]
    verbose: bool,

    /// The schema snapshot (JSON or YAML) against which to bind queries.
    #[clap(short, long)]
    schema: PathBuf,

    /// Optional configuration file (JSON or YAML).
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Also list every field reachable from each query's model.
    #[clap(long)]
    all_fields: bool,

    /// The query URLs to check.
    #[clap(required = true)]
    urls: Vec<String>,
}

fn main() {
    let args = Args::parse();
    if let Err(e) = simple_logger::init_with_level(if args.verbose {
        log::Level::Debug
    } else {
        log::Level::Info
    }) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    match check_urls(&args) {
        Ok(0) => log::info!("All queries are valid"),
        Ok(invalid) => {
            log::error!("{} of {} queries are invalid", invalid, args.urls.len());
            process::exit(1);
        }
        Err(e) => {
            log::error!("Failed: {:?}", e);
            process::exit(1);
        }
    }
}

/// Returns the number of invalid queries.
fn check_urls(args: &Args) -> Result<usize> {
    let config = match &args.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::default(),
    };
    let schema = Schema::load_from_file(&args.schema)?;
    Ok(args
        .urls
        .iter()
        .filter(|url| !check_url(&config, &schema, url, args.all_fields))
        .count())
}

fn check_url(config: &Config, schema: &Schema, url: &str, all_fields: bool) -> bool {
    let query = match config.parse_url(url) {
        Ok(query) => query,
        Err(e) => {
            log::error!("{}", e);
            return false;
        }
    };
    let bound = BoundQuery::bind(&query, schema);

    println!("{}", config.url_for(&query));
    println!("  model: {} ({})", bound.root(), query.format());
    for (field, direction) in bound.sort_fields() {
        println!("  field: {} {}", field, direction.prefix());
    }
    for path in bound.calculated_fields() {
        println!("  calculated: {}", path);
    }
    for filter in bound.filters() {
        let outcome = filter
            .err_message()
            .unwrap_or_else(|| "ok".to_string());
        println!(
            "  filter #{}: {} {} {:?}: {}",
            filter.index(),
            filter.field(),
            filter.lookup(),
            filter.value(),
            outcome
        );
    }
    if all_fields {
        for (path, field) in bound.all_fields() {
            println!("  available: {} {}", path, field.field_type());
        }
    }

    match bound.check() {
        Ok(()) => {
            let valid = bound.all_valid();
            println!("  valid: {}", valid);
            valid
        }
        Err(e) => {
            println!("  valid: false ({})", e);
            false
        }
    }
}
