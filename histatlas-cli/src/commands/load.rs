//! Load command - load periods in sequence.

use std::time::Instant;

use console::style;

use super::common::{print_dataset, print_metrics};
use crate::error::CliError;
use crate::runner::CliRunner;
use crate::GlobalArgs;

/// Run the load command.
pub fn run(args: &GlobalArgs, ordinals: &[usize]) -> Result<(), CliError> {
    let runner = CliRunner::new(args)?;
    runner.log_startup("load");
    let loader = runner.loader()?;

    println!(
        "Loading {} period(s) via {} fetching",
        ordinals.len(),
        style(loader.channel_mode()).cyan()
    );

    let result = runner.block_on(async {
        for &ordinal in ordinals {
            let started = Instant::now();
            let dataset = loader.load_period(ordinal).await?;
            if let (Some(dataset), Some(period)) = (dataset, loader.periods().get(ordinal)) {
                print_dataset(period, &dataset, started.elapsed());
            }
        }
        Ok::<(), CliError>(())
    });

    let metrics = loader.metrics();
    loader.destroy();
    result?;

    print_metrics(&metrics);
    Ok(())
}
