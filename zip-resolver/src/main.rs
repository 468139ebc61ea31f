use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use zip_resolver::fetch::FetcherConfig;
use zip_resolver::{OutputFormat, Resolver, ResolverConfig};

/// Resolve Swiss zip codes against the official swisstopo locality directory.
#[derive(Debug, Parser)]
#[command(name = "zip-resolver", version)]
struct Args {
    /// Output format: object, array, json, serialize or xml
    #[arg(long, short, value_parser, default_value = "object")]
    format: OutputFormat,

    /// Refresh the cached dataset even if it is still fresh
    #[arg(long)]
    reload: bool,

    /// Fail on errors instead of reporting them in the result
    #[arg(long)]
    throw: bool,

    /// Zip codes to look up
    #[arg(required = true)]
    zip_codes: Vec<u32>,
}

fn env_u64(name: &str) -> Option<u64> {
    let value = std::env::var(name).ok()?;
    match value.parse() {
        Ok(n) => Some(n),
        Err(_) => {
            eprintln!("Warning: ignoring {name}={value:?}, expected a number of seconds");
            None
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    // Configuration from environment
    let cache_dir = std::env::var_os("ZIP_RESOLVER_CACHE_DIR").map(PathBuf::from);
    let mut config = ResolverConfig::new(args.format, cache_dir)
        .with_throw_exceptions(args.throw)
        .with_force_reload(args.reload);
    if let Some(secs) = env_u64("ZIP_RESOLVER_CACHE_TTL_SECS") {
        config = config.with_cache_ttl(Duration::from_secs(secs));
    }

    let mut fetcher_config = match std::env::var("ZIP_RESOLVER_DATA_URL") {
        Ok(url) => FetcherConfig::new(url),
        Err(_) => FetcherConfig::default(),
    };
    if let Some(secs) = env_u64("ZIP_RESOLVER_TIMEOUT_SECS") {
        fetcher_config = fetcher_config.with_timeout(secs);
    }

    let mut resolver = match Resolver::with_fetcher_config(config, fetcher_config) {
        Ok(resolver) => resolver,
        Err(e) => {
            eprintln!("Failed to create resolver: {e}");
            return ExitCode::from(2);
        }
    };

    let mut all_valid = true;
    for zip in args.zip_codes {
        let result = match resolver.lookup(zip).await {
            Ok(result) => result,
            Err(e) => {
                eprintln!("Lookup of {zip} failed ({}): {e}", e.kind());
                return ExitCode::from(2);
            }
        };
        all_valid &= result.valid_zip_code;
        match result.encode(resolver.output_format()) {
            Ok(output) => println!("{output}"),
            Err(e) => {
                eprintln!("Failed to encode result for {zip}: {e}");
                return ExitCode::from(2);
            }
        }
    }

    if all_valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
