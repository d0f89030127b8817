//! Output helpers shared across commands.

use std::time::Duration;

use console::style;
use histatlas::config::format_size;
use histatlas::geo::GeographicDataset;
use histatlas::period::Period;
use histatlas::telemetry::MetricsSnapshot;

/// Print one line describing a loaded dataset.
pub fn print_dataset(period: &Period, dataset: &GeographicDataset, elapsed: Duration) {
    println!(
        "{:>4}  {:<28} {:>6} features {:>9} points {:>10}  {}",
        period.ordinal,
        period.display_label,
        dataset.feature_count(),
        dataset.position_count(),
        format_size(dataset.estimate_size()),
        style(format_elapsed(elapsed)).dim()
    );
}

/// Print the loader counters.
pub fn print_metrics(metrics: &MetricsSnapshot) {
    println!();
    println!("{}", style("Loader statistics").bold());
    println!("  Requests:    {}", metrics.requests);
    println!(
        "  Cache hits:  {} ({:.0}%)",
        metrics.cache_hits,
        metrics.hit_rate() * 100.0
    );
    println!("  Fetches:     {}", metrics.fetches);
    if metrics.fetch_failures > 0 {
        println!(
            "  Failures:    {}",
            style(metrics.fetch_failures).red()
        );
    }
    println!("  Superseded:  {}", metrics.superseded);
    println!(
        "  Preloads:    {} ok, {} failed",
        metrics.preloads_completed, metrics.preloads_failed
    );
    if metrics.fallbacks > 0 {
        println!(
            "  Fallbacks:   {}",
            style(metrics.fallbacks).yellow()
        );
    }
}

pub fn format_elapsed(elapsed: Duration) -> String {
    if elapsed.as_secs() >= 1 {
        format!("{:.2}s", elapsed.as_secs_f64())
    } else {
        format!("{}ms", elapsed.as_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::from_millis(42)), "42ms");
        assert_eq!(format_elapsed(Duration::from_millis(1500)), "1.50s");
    }
}
