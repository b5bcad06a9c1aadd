//! Kaplan-Meier estimation command
//!
//! Reads right-censored observations, computes the product-limit estimate with
//! pointwise confidence intervals and writes it as a table, CSV or JSON.

mod table;

use std::{fmt::Write as _, path::PathBuf};

use anyhow::Context;
use clap::Args;
use log::info;
use prolim_stats::{
    confidence::{ConfidenceBounds, DEFAULT_ALPHA},
    estimate::KaplanMeierEstimate,
    summary::SurvivalSummary,
};

use crate::util::{self, Output};

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, derive_more::FromStr, derive_more::Display)]
pub(crate) enum OutputFormat {
    #[default]
    Table,
    Csv,
    Json,
}

#[derive(Debug, Clone, Args)]
pub(crate) struct EstimateArg {
    /// Path to the observations file (`.json`, or CSV with `time,status` columns)
    pub input: PathBuf,

    /// Treat the first CSV row as data instead of a header
    #[arg(long)]
    pub no_header: bool,

    /// Significance level of the pointwise confidence intervals
    #[arg(long, default_value_t = DEFAULT_ALPHA)]
    pub alpha: f64,

    /// Output format (table, csv, json)
    #[arg(long, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Output file path (stdout if omitted)
    #[arg(long)]
    pub output: Option<PathBuf>,
}

/// Everything the command reports about one sample.
#[derive(Debug, Clone, serde::Serialize)]
pub(crate) struct EstimateReport {
    pub alpha: f64,
    pub summary: SurvivalSummary,
    pub estimate: KaplanMeierEstimate,
    /// Greenwood standard error of the survival probability
    pub survival_stderr: Vec<f64>,
    pub confidence: Vec<ConfidenceBounds>,
}

impl EstimateReport {
    pub(crate) fn new(estimate: KaplanMeierEstimate, alpha: f64) -> anyhow::Result<Self> {
        let confidence = estimate
            .conf_int(alpha)
            .context("Failed to compute confidence intervals")?;
        Ok(Self {
            alpha,
            summary: estimate.summary(),
            survival_stderr: estimate.survival_stderr(),
            estimate,
            confidence,
        })
    }
}

pub(crate) fn run(arg: &EstimateArg) -> anyhow::Result<()> {
    info!("Reading observations from {}...", arg.input.display());
    let raw = util::read_observations_file(&arg.input, !arg.no_header)?;
    info!("Loaded {} observations", raw.times.len());

    let estimate = KaplanMeierEstimate::from_labels(&raw.times, &raw.status)
        .with_context(|| format!("Invalid observations in {}", arg.input.display()))?;
    info!("Estimated survival at {} distinct times", estimate.len());

    let report = EstimateReport::new(estimate, arg.alpha)?;

    let mut output = Output::create(arg.output.as_deref())?;
    match arg.format {
        OutputFormat::Table => {
            let text = table::format_report(&report).context("Failed to format report")?;
            output.write_text(&text)?;
        }
        OutputFormat::Csv => {
            let text = format_csv(&report).context("Failed to format CSV")?;
            output.write_text(&text)?;
        }
        OutputFormat::Json => output.write_json(&report)?,
    }
    info!("Report written to {}", output.label());

    Ok(())
}

fn format_csv(report: &EstimateReport) -> Result<String, std::fmt::Error> {
    let mut csv = String::from(
        "time,n_at_risk,n_events,n_censored,survival,stderr_log,stderr,lower,upper\n",
    );
    let estimate = &report.estimate;
    for (i, record) in estimate.records().enumerate() {
        let bounds = report.confidence[i];
        writeln!(
            &mut csv,
            "{},{},{},{},{},{},{},{},{}",
            record.time,
            record.n_at_risk,
            record.n_events,
            record.n_censored,
            estimate.survival()[i],
            estimate.stderr()[i],
            report.survival_stderr[i],
            bounds.lower,
            bounds.upper,
        )?;
    }
    Ok(csv)
}
