use anyhow::{Context, Result};
use flightops::analytics_cache::AnalyticsCache;

/// Prints the ranking, one line per aircraft, or a JSON array with `json`
pub fn handle_top_operators(analytics: &AnalyticsCache, n: Option<usize>, json: bool) -> Result<()> {
    let ranked = analytics
        .get_top_operators(n)
        .context("Failed to compute ranking")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&ranked)?);
        return Ok(());
    }

    if ranked.is_empty() {
        println!("No aircraft with flights");
        return Ok(());
    }
    let threshold_hours = analytics.config().long_flight_threshold_secs as f64 / 3600.0;
    println!("Share of flights longer than {:.1}h", threshold_hours);
    for (rank, entry) in ranked.iter().enumerate() {
        println!(
            "{:>3}. {:<40} {} {:>6.2}%",
            rank + 1,
            entry.operator,
            entry.icao24,
            entry.value
        );
    }
    Ok(())
}
