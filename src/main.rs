// fetchcache command-line entry point.
// Fetches each URL twice through the cache and reports hits and misses.

use std::process::ExitCode;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use fetchcache::{CacheInterceptor, Config, HttpClient, HttpRequest, Result, send};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fetchcache=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let urls: Vec<String> = std::env::args().skip(1).collect();
    if urls.is_empty() {
        eprintln!("usage: fetchcache <url>...");
        return ExitCode::from(2);
    }

    match run(&urls).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(urls: &[String]) -> Result<()> {
    let config = Config::load()?;
    let client = HttpClient::new(&config)?;
    let cache = CacheInterceptor::from_config(client, &config);

    for url in urls {
        for _ in 0..2 {
            let response = send(&cache, HttpRequest::get(url.as_str())).await?;
            info!(url = %url, status = %response.status, "fetched");
            println!("{}", serde_json::to_string_pretty(&response.body)?);
        }
    }

    let metrics = cache.metrics();
    info!(
        hits = metrics.hits,
        misses = metrics.misses,
        entries = cache.store().len(),
        "cache summary"
    );
    println!("{}", serde_json::to_string(&metrics)?);

    Ok(())
}
