//! Warm command - load every period once.

use std::time::Instant;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use super::common::{format_elapsed, print_metrics};
use crate::error::CliError;
use crate::runner::CliRunner;
use crate::GlobalArgs;

const PROGRESS_TEMPLATE: &str = "{spinner} [{bar:40}] {pos}/{len} {msg}";

/// Run the warm command.
pub fn run(args: &GlobalArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(args)?;
    runner.log_startup("warm");
    let loader = runner.loader()?;
    let count = loader.periods().len();

    let progress = ProgressBar::new(count as u64);
    let progress_style = ProgressStyle::with_template(PROGRESS_TEMPLATE)
        .map_err(|e| CliError::InvalidArgument(e.to_string()))?
        .progress_chars("=> ");
    progress.set_style(progress_style);

    let started = Instant::now();
    let mut failed = Vec::new();
    runner.block_on(async {
        for period in loader.periods().iter() {
            progress.set_message(period.display_label.clone());
            if let Err(e) = loader.load_period(period.ordinal).await {
                failed.push((period.ordinal, e));
            }
            progress.inc(1);
        }
    });
    progress.finish_and_clear();

    let cached = loader.cache_len();
    let capacity = runner.config().cache.capacity().get();
    let metrics = loader.metrics();
    loader.destroy();

    println!(
        "Loaded {} of {} periods in {}",
        count - failed.len(),
        count,
        format_elapsed(started.elapsed())
    );
    if cached < count {
        println!(
            "{}",
            style(format!(
                "Cache holds the {} most recently loaded (capacity {}).",
                cached, capacity
            ))
            .yellow()
        );
    }
    for (ordinal, error) in &failed {
        println!("  {} {}: {}", style("failed").red(), ordinal, error);
    }

    print_metrics(&metrics);
    Ok(())
}
