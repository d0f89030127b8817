//! Periods command - list the period table.

use console::style;

use crate::error::CliError;
use crate::runner::CliRunner;
use crate::GlobalArgs;

/// Run the periods command.
pub fn run(args: &GlobalArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(args)?;
    runner.log_startup("periods");
    let periods = runner.periods()?;

    println!("{}", style(format!("{} periods", periods.len())).bold());
    for period in periods.iter() {
        println!(
            "{:>4}  {:<28} {}",
            period.ordinal,
            period.display_label,
            style(&period.identifier).dim()
        );
    }
    Ok(())
}
