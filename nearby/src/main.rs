use nearby::client::PlacesClient;
use nearby::config::Config;
use nearby::render::render;
use nearby::NearbyPlaces;

use std::io::Write;

use anyhow::{Context, Result};
use dotenv::dotenv;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    // logs go to stderr; stdout carries the rendered result only
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cfg = Config::from_env().context("configuration error")?;
    info!(
        base_url = %cfg.base_url,
        api_key = cfg.api_key.as_deref().map(|_| "<set>").unwrap_or("<missing>"),
        position = ?cfg.position,
        "[config] loaded"
    );
    let client = PlacesClient::from_config(&cfg).with_context(|| {
        "cannot build places client\n\nHint:\n- enable the Places API for your project\n- create an API key and export PLACES_API_KEY (or put it in .env)"
    })?;

    let terms = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    let options = cfg.search_options(terms);
    let request = options.clone().resolve();

    let widget = NearbyPlaces::start(cfg.position_source(), client);
    if widget.wait_for_location(cfg.fix_timeout()).await.is_none() {
        warn!(
            "[location] no fix within {:?}; searching anyway",
            cfg.fix_timeout()
        );
    }

    widget.search(options).await;
    let state = widget.state();
    print!("{}", render(&state, &request));
    std::io::stdout().flush()?;
    drop(widget);

    // exit directly: a stdin position feed may still be parked in a blocking read
    std::process::exit(if state.error.is_some() { 1 } else { 0 });
}
