//! The three end-to-end pipeline runs the CLI exposes: the drawdown study,
//! the fixed-anchor comparison, and the snapshot scatter.

use analytics::{
    aggregate_sum, covering_range, subtract, CrossEventAverager, EventDetector,
    PerformanceWindower, SeriesAligner,
};
use anyhow::{bail, Context};
use api_client::{CoinGeckoClient, EquitiesProvider, MarketDataApi, RawSnapshot};
use charting::{anchor_chart, drawdown_chart, snapshot_scatter, ScatterEntry};
use chrono::Utc;
use configuration::{Config, UniverseSettings};
use core_types::{
    AggregatedCurve, AssetClass, CurvePoint, DailySeries, DateRange, PerformanceWindow,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

fn chart_path(config: &Config, file_name: &str) -> PathBuf {
    Path::new(&config.output.charts_dir).join(file_name)
}

fn progress_bar(len: u64) -> anyhow::Result<ProgressBar> {
    let bar = ProgressBar::new(len);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")?
            .progress_chars("#>-"),
    );
    Ok(bar)
}

/// The TOTAL3 composite: the aggregate market cap with the two majors carved
/// out. When either major is missing from the snapshot, the composite falls
/// back to the full aggregate.
fn total3_series(
    total: &DailySeries,
    btc_caps: Option<&DailySeries>,
    eth_caps: Option<&DailySeries>,
) -> DailySeries {
    match (btc_caps, eth_caps) {
        (Some(btc), Some(eth)) => subtract(&subtract(total, btc), eth),
        _ => {
            tracing::warn!("BTC or ETH missing from the snapshot, using the full aggregate as TOTAL3");
            total.clone()
        }
    }
}

/// Collapses a single per-event window into an output curve. Used by the
/// anchor pipeline, where there is exactly one event per series.
fn single_window_curve(window: &PerformanceWindow) -> AggregatedCurve {
    AggregatedCurve {
        points: window
            .points
            .iter()
            .map(|p| CurvePoint {
                offset_days: p.offset_days,
                mean_percent_change: p.percent_change,
            })
            .collect(),
    }
}

/// Fetches the full market-chart payload for every asset in the top-N
/// universe, sequentially through the rate limiter.
///
/// Transient per-asset failures are logged and skipped; the asset simply
/// does not appear in the snapshot. Fatal errors abort the run.
async fn fetch_universe_snapshot<A: MarketDataApi>(
    api: &A,
    universe: &UniverseSettings,
) -> anyhow::Result<RawSnapshot> {
    let assets = api.fetch_top_assets(universe.top_n).await?;
    if assets.is_empty() {
        bail!("asset listing returned nothing");
    }

    let progress = progress_bar(assets.len() as u64)?;
    let mut snapshot = RawSnapshot::new();
    for asset in &assets {
        progress.set_message(format!("Fetching {}...", asset.identity.id));
        match api
            .fetch_market_chart(&asset.identity.id, universe.history_days)
            .await
        {
            Ok(chart) => snapshot.insert(asset.identity.id.clone(), chart),
            Err(e) if e.is_transient() => {
                tracing::warn!(asset = %asset.identity.id, error = %e, "Skipping asset after transient fetch error");
            }
            Err(e) => return Err(e.into()),
        }
        progress.inc(1);
    }
    progress.finish_with_message("Universe fetch complete");
    Ok(snapshot)
}

/// The drawdown study: detect sharp aggregate market-cap drops, window the
/// tracked series after each one, and average the windows per class.
pub async fn run_drawdown(config: &Config, offline_snapshot: Option<&Path>) -> anyhow::Result<()> {
    // 1. Obtain the raw data: a fresh fetch, or a persisted snapshot for an
    //    offline rerun.
    let snapshot = match offline_snapshot {
        Some(path) => {
            tracing::info!(path = %path.display(), "Rerunning from a persisted snapshot");
            RawSnapshot::load_from(path).context("loading persisted snapshot")?
        }
        None => {
            let client = CoinGeckoClient::new(&config.api, &config.universe);
            let snapshot = fetch_universe_snapshot(&client, &config.universe).await?;
            snapshot.write_to(Path::new(&config.output.snapshot_path))?;
            snapshot
        }
    };
    if snapshot.is_empty() {
        bail!("snapshot holds no assets");
    }

    // 2. One shared daily axis covering every sample in the run.
    let range = covering_range(
        snapshot
            .iter()
            .flat_map(|(_, chart)| chart.market_caps.iter().chain(chart.prices.iter())),
    )?;
    let aligner = SeriesAligner::new();

    // 3. Aggregate market cap across the universe.
    let cap_series: Vec<DailySeries> = snapshot
        .iter()
        .map(|(_, chart)| aligner.align(&chart.market_caps, range))
        .collect();
    let total_caps = aggregate_sum(&cap_series);

    // 4. Carve the two majors out of the total to get the TOTAL3 composite.
    let btc = snapshot.get("bitcoin");
    let eth = snapshot.get("ethereum");
    let btc_caps = btc.map(|chart| aligner.align(&chart.market_caps, range));
    let eth_caps = eth.map(|chart| aligner.align(&chart.market_caps, range));
    let total3 = total3_series(&total_caps, btc_caps.as_ref(), eth_caps.as_ref());

    // 5. Detect drawdown events on the aggregate.
    let detector = EventDetector::Drawdown {
        lookback_days: config.detection.lookback_days,
        threshold_fraction: config.detection.threshold_fraction,
    };
    let events = detector.detect(&total_caps);
    tracing::info!(events = events.len(), "Drawdown events detected");
    if events.is_empty() {
        bail!("no drawdown events detected in the covered range");
    }

    // 6. Window every tracked series after every event, then average per class.
    let mut tracked: Vec<(AssetClass, DailySeries)> = Vec::new();
    if let Some(chart) = btc {
        tracked.push((AssetClass::new("BTC"), aligner.align(&chart.prices, range)));
    }
    if let Some(chart) = eth {
        tracked.push((AssetClass::new("ETH"), aligner.align(&chart.prices, range)));
    }
    tracked.push((AssetClass::new("TOTAL3"), total3));

    let windower = PerformanceWindower::new(config.windowing.length_days).require_full_length();
    let mut windows: Vec<(AssetClass, PerformanceWindow)> = Vec::new();
    for (class, series) in &tracked {
        for &event in &events {
            if let Some(window) = windower.window(series, event) {
                windows.push((class.clone(), window));
            }
        }
    }
    let curves = CrossEventAverager::new().average(windows.iter().map(|(c, w)| (c.clone(), w)));
    if curves.is_empty() {
        bail!("no complete windows to average; every detected event may be too recent");
    }

    let title = format!(
        "Average Crypto Performance {} Days After >{:.0}% Drops",
        config.windowing.length_days,
        config.detection.threshold_fraction * 100.0
    );
    drawdown_chart(&title, &curves).write_json(&chart_path(config, "crypto_performance.json"))?;
    Ok(())
}

/// The fixed-anchor comparison: traditional assets and selected crypto
/// majors rebased to a shared externally designated event date.
pub async fn run_anchor(config: &Config) -> anyhow::Result<()> {
    let anchor = &config.anchor;
    let today = Utc::now().date_naive();
    if anchor.date > today {
        bail!("anchor date {} is in the future", anchor.date);
    }
    let delta_days = (today - anchor.date).num_days() as u32;
    let range = DateRange::new(anchor.date, today)?;
    // Extra days before the anchor so a non-trading start date can still be
    // forward-filled from the prior close.
    let fetch_days = delta_days + anchor.buffer_days;

    let aligner = SeriesAligner::new();
    let windower = PerformanceWindower::new(delta_days + 1);

    // Traditional assets from the equities provider. A provider that cannot
    // even be constructed is treated like any other transient equities
    // failure: the crypto side still runs.
    let mut traditional: Vec<(String, AggregatedCurve)> = Vec::new();
    match EquitiesProvider::new() {
        Ok(equities) => {
            for (ticker, display_name) in &anchor.equities {
                let samples = match equities.daily_closes(ticker, fetch_days).await {
                    Ok(samples) => samples,
                    Err(e) if e.is_transient() => {
                        tracing::warn!(ticker, error = %e, "Skipping equity after transient fetch error");
                        continue;
                    }
                    Err(e) => return Err(e.into()),
                };
                let series = aligner.align(&samples, range);
                match windower.window(&series, anchor.date) {
                    Some(window) => {
                        traditional.push((display_name.clone(), single_window_curve(&window)))
                    }
                    None => tracing::warn!(ticker, "No usable baseline at the anchor date"),
                }
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "Equities provider unavailable, continuing with crypto only");
        }
    }

    // Crypto majors from the market-data API, filtered to the allowed symbols.
    let client = CoinGeckoClient::new(&config.api, &config.universe);
    let listed = client.fetch_top_assets(anchor.crypto_limit).await?;
    let allowed: HashSet<String> = anchor
        .allowed_symbols
        .iter()
        .map(|s| s.to_lowercase())
        .collect();
    let mut crypto: Vec<(String, AggregatedCurve)> = Vec::new();
    for asset in listed
        .iter()
        .filter(|a| allowed.contains(&a.identity.symbol.to_lowercase()))
    {
        match client
            .fetch_market_chart(&asset.identity.id, fetch_days)
            .await
        {
            Ok(chart) => {
                let series = aligner.align(&chart.prices, range);
                match windower.window(&series, anchor.date) {
                    Some(window) => crypto
                        .push((asset.identity.symbol.to_uppercase(), single_window_curve(&window))),
                    None => {
                        tracing::warn!(asset = %asset.identity.id, "No usable baseline at the anchor date")
                    }
                }
            }
            Err(e) if e.is_transient() => {
                tracing::warn!(asset = %asset.identity.id, error = %e, "Skipping asset after transient fetch error");
            }
            Err(e) => return Err(e.into()),
        }
    }

    if traditional.is_empty() && crypto.is_empty() {
        bail!("no series could be anchored to {}", anchor.date);
    }

    let title = format!("Performance Since {}", anchor.date.format("%B %e, %Y"));
    anchor_chart(&title, anchor.date, &traditional, &crypto)
        .write_json(&chart_path(config, "anchor_performance.json"))?;
    Ok(())
}

/// The snapshot scatter: percent change of each top asset since a historical
/// comparison date, against its current market cap.
pub async fn run_scatter(config: &Config) -> anyhow::Result<()> {
    let client = CoinGeckoClient::new(&config.api, &config.universe);
    let assets = client.fetch_top_assets(config.scatter.limit).await?;
    if assets.is_empty() {
        bail!("asset listing returned nothing");
    }

    let progress = progress_bar(assets.len() as u64)?;
    let mut entries: Vec<ScatterEntry> = Vec::new();
    for asset in &assets {
        progress.set_message(format!("Pricing {}...", asset.identity.id));
        // The listing row must carry a current price and market cap, or there
        // is nothing to plot.
        let (Some(current_price), Some(market_cap)) = (asset.current_price, asset.market_cap)
        else {
            progress.inc(1);
            continue;
        };
        match client
            .fetch_price_on(&asset.identity.id, config.scatter.date)
            .await
        {
            Ok(Some(historical)) if historical > 0.0 => entries.push(ScatterEntry {
                name: asset.identity.name.clone(),
                symbol: asset.identity.symbol.clone(),
                percent_change: (current_price / historical - 1.0) * 100.0,
                market_cap,
                current_price,
            }),
            Ok(_) => {
                tracing::warn!(asset = %asset.identity.id, "No historical price on the comparison date");
            }
            Err(e) if e.is_transient() => {
                tracing::warn!(asset = %asset.identity.id, error = %e, "Skipping asset after transient fetch error");
            }
            Err(e) => return Err(e.into()),
        }
        progress.inc(1);
    }
    progress.finish_with_message("Pricing complete");

    if entries.is_empty() {
        bail!("no assets could be priced on {}", config.scatter.date);
    }

    let title = format!(
        "Performance Since {} vs Market Cap",
        config.scatter.date.format("%B %e, %Y")
    );
    snapshot_scatter(&title, &entries).write_json(&chart_path(config, "snapshot_scatter.json"))?;
    Ok(())
}
