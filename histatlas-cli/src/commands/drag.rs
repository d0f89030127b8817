//! Drag command - simulate dragging the time slider.
//!
//! Every intermediate period is requested as if the slider passed over it.
//! Only the last one should produce a result, and far fewer fetches than
//! slider events should happen.

use std::time::{Duration, Instant};

use console::style;
use futures::future::join_all;

use super::common::{format_elapsed, print_dataset, print_metrics};
use crate::error::CliError;
use crate::runner::CliRunner;
use crate::GlobalArgs;

/// Run the drag command.
pub fn run(args: &GlobalArgs, from: usize, to: usize, interval_ms: u64) -> Result<(), CliError> {
    let runner = CliRunner::new(args)?;
    runner.log_startup("drag");
    let loader = runner.loader()?;

    let count = loader.periods().len();
    if from >= count || to >= count {
        return Err(CliError::InvalidArgument(format!(
            "ordinals must be below {} (got {} and {})",
            count, from, to
        )));
    }

    let path = slider_path(from, to);
    let interval = Duration::from_millis(interval_ms);
    println!(
        "Dragging over {} period(s), {} between events",
        path.len(),
        format_elapsed(interval)
    );

    let started = Instant::now();
    let results = runner.block_on(join_all(path.iter().enumerate().map(|(step, &ordinal)| {
        let loader = &loader;
        async move {
            if !interval.is_zero() {
                tokio::time::sleep(interval * step as u32).await;
            }
            (ordinal, loader.load_period(ordinal).await)
        }
    })));
    let elapsed = started.elapsed();

    let metrics = loader.metrics();
    loader.destroy();

    let mut resolved = Vec::new();
    for (ordinal, result) in results {
        if let Some(dataset) = result? {
            resolved.push((ordinal, dataset));
        }
    }

    for (ordinal, dataset) in &resolved {
        if let Some(period) = loader.periods().get(*ordinal) {
            print_dataset(period, dataset, elapsed);
        }
    }

    let landed_on_target = resolved.len() == 1 && resolved[0].0 == to;
    let verdict = if landed_on_target {
        style("resolved to the final period").green()
    } else {
        style("did not resolve to the final period").red()
    };
    println!(
        "{} slider events, {} fetches: {}",
        path.len(),
        metrics.fetches,
        verdict
    );

    print_metrics(&metrics);
    Ok(())
}

/// Ordinals passed over when moving from `from` to `to`, inclusive.
fn slider_path(from: usize, to: usize) -> Vec<usize> {
    if from <= to {
        (from..=to).collect()
    } else {
        (to..=from).rev().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slider_path_forward() {
        assert_eq!(slider_path(2, 5), vec![2, 3, 4, 5]);
    }

    #[test]
    fn test_slider_path_backward() {
        assert_eq!(slider_path(5, 2), vec![5, 4, 3, 2]);
    }

    #[test]
    fn test_slider_path_single() {
        assert_eq!(slider_path(3, 3), vec![3]);
    }
}
