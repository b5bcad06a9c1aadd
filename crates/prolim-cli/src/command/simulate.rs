//! Synthetic right-censored data generation
//!
//! Each subject draws an exponential event time and an independent uniform
//! censoring time. The observed time is the earlier of the two.

use std::{fmt::Write as _, path::PathBuf};

use anyhow::Context;
use clap::Args;
use log::info;
use prolim_stats::observation::Status;
use rand::{Rng, SeedableRng as _};
use rand_distr::{Distribution, Exp, Uniform};
use rand_pcg::Pcg64;

use crate::util::Output;

#[derive(Debug, Clone, Args)]
pub(crate) struct SimulateArg {
    /// Number of subjects to generate
    #[arg(long, default_value_t = 100)]
    pub subjects: usize,

    /// Rate of the exponential event-time distribution
    #[arg(long, default_value_t = 0.1)]
    pub event_rate: f64,

    /// Upper bound of the uniform censoring-time distribution
    #[arg(long, default_value_t = 20.0)]
    pub censor_max: f64,

    /// Random seed (drawn from the OS if omitted)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Output file path (stdout if omitted)
    #[arg(long)]
    pub output: Option<PathBuf>,
}

pub(crate) fn run(arg: &SimulateArg) -> anyhow::Result<()> {
    anyhow::ensure!(arg.subjects > 0, "--subjects must be positive");
    anyhow::ensure!(
        arg.censor_max.is_finite() && arg.censor_max > 0.0,
        "--censor-max must be a positive finite number"
    );
    let event_dist = Exp::new(arg.event_rate).context("Invalid --event-rate")?;
    let censor_dist = Uniform::new(0.0, arg.censor_max).context("Invalid --censor-max")?;

    let seed = arg.seed.unwrap_or_else(|| rand::rng().random());
    info!("Simulating {} subjects (seed {seed})...", arg.subjects);
    let mut rng = Pcg64::seed_from_u64(seed);
    let observations = simulate(&mut rng, arg.subjects, &event_dist, &censor_dist);

    let censored = observations
        .iter()
        .filter(|(_, s)| s.is_censored())
        .count();
    info!("Generated {} observations, {censored} censored", observations.len());

    let csv = format_csv(&observations).context("Failed to format CSV")?;
    let mut output = Output::create(arg.output.as_deref())?;
    output.write_text(&csv)?;
    info!("Observations written to {}", output.label());

    Ok(())
}

fn simulate<R, E, C>(
    rng: &mut R,
    subjects: usize,
    event_dist: &E,
    censor_dist: &C,
) -> Vec<(f64, Status)>
where
    R: Rng + ?Sized,
    E: Distribution<f64>,
    C: Distribution<f64>,
{
    (0..subjects)
        .map(|_| {
            let event_time = event_dist.sample(rng);
            let censor_time = censor_dist.sample(rng);
            if event_time <= censor_time {
                (event_time, Status::Event)
            } else {
                (censor_time, Status::Censored)
            }
        })
        .collect()
}

fn format_csv(observations: &[(f64, Status)]) -> Result<String, std::fmt::Error> {
    let mut csv = String::from("time,status\n");
    for (time, status) in observations {
        writeln!(&mut csv, "{time},{}", status.code())?;
    }
    Ok(csv)
}
