use clap::{Parser, Subcommand};

use self::{estimate::EstimateArg, simulate::SimulateArg};

mod estimate;
mod simulate;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Estimate the survivor function from right-censored observations
    Estimate(#[clap(flatten)] EstimateArg),
    /// Generate synthetic right-censored observations
    Simulate(#[clap(flatten)] SimulateArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode {
        Mode::Estimate(arg) => estimate::run(&arg)?,
        Mode::Simulate(arg) => simulate::run(&arg)?,
    }
    Ok(())
}
