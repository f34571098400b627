use anyhow::Context;
use clap::Parser;
use iconharvest::cdp::CdpOracle;
use iconharvest::{pipeline, GraphicStore, HarvestConfig, ViewBox};
use log::info;
use std::path::PathBuf;

/// Crawl the icon catalogue and render every icon to a centered transparent PNG.
///
/// Without flags the compiled-in defaults are used.
#[derive(Parser, Debug)]
#[command(name = "iconharvest", version, about)]
struct Cli {
    /// Listing page to collect item links from
    #[arg(long)]
    start_url: Option<String>,

    /// Directory for extracted `{slug}.svg` files
    #[arg(long)]
    raw_dir: Option<PathBuf>,

    /// Directory for rendered `{slug}.png` files and manifest.json
    #[arg(long)]
    png_dir: Option<PathBuf>,

    /// Output canvas side in pixels
    #[arg(long)]
    canvas_size: Option<u32>,

    /// Fraction of the canvas covered by the icon's longer side
    #[arg(long)]
    occupancy: Option<f64>,

    /// Ignore rendered svgs narrower than this many pixels
    #[arg(long)]
    min_width: Option<f64>,

    /// Frame injected into svgs without a viewBox, as WIDTHxHEIGHT
    #[arg(long)]
    view_box: Option<ViewBox>,

    /// Bound on waiting for an svg on an item page
    #[arg(long)]
    element_timeout_ms: Option<u64>,

    /// Bound on a single page navigation
    #[arg(long)]
    navigation_timeout_ms: Option<u64>,
}

impl Cli {
    fn into_config(self) -> HarvestConfig {
        let defaults = HarvestConfig::default();
        HarvestConfig {
            start_url: self.start_url.unwrap_or(defaults.start_url),
            raw_dir: self.raw_dir.unwrap_or(defaults.raw_dir),
            png_dir: self.png_dir.unwrap_or(defaults.png_dir),
            canvas_size: self.canvas_size.unwrap_or(defaults.canvas_size),
            occupancy: self.occupancy.unwrap_or(defaults.occupancy),
            min_width: self.min_width.unwrap_or(defaults.min_width),
            default_view_box: self.view_box.unwrap_or(defaults.default_view_box),
            element_timeout_ms: self.element_timeout_ms.unwrap_or(defaults.element_timeout_ms),
            navigation_timeout_ms: self.navigation_timeout_ms.unwrap_or(defaults.navigation_timeout_ms),
            ..defaults
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Cli::parse().into_config();
    config.validate()?;
    let store = GraphicStore::new(&config.raw_dir, &config.png_dir);

    let oracle = CdpOracle::launch(&config).context("starting headless Chrome")?;
    let report = pipeline::run_session(oracle, &config, &store).context("harvest aborted")?;

    let manifest = store.write_manifest(&report)?;
    info!("Manifest written to {}", manifest.display());

    println!(
        "Collected {} slugs, rendered {} images ({} skipped)",
        report.collected,
        report.rendered.len(),
        report.skipped.len()
    );
    Ok(())
}
