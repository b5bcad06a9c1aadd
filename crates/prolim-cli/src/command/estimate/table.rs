//! Survival table display
//!
//! Formats an [`EstimateReport`] as a human-readable report: a legend, the
//! naive versus Kaplan-Meier summary and the per-time survival table.

use std::fmt::{self, Write as _};

use super::EstimateReport;

// time(10) + at_risk(8) + events(7) + censored(9) + survival(10) + std_err(10) + lower(10) + upper(10) + spaces(7)
const TABLE_WIDTH: usize = 81;

fn write_legend(out: &mut String) -> fmt::Result {
    writeln!(out, "Legend:")?;
    writeln!(out, "  Mean(Event) : Mean time of subjects with an observed event (censored excluded)")?;
    writeln!(out, "  Mean(All)   : Naive mean of all times (censoring treated as event, biased)")?;
    writeln!(out, "  Median(KM)  : Kaplan-Meier median survival (accounts for censoring)")?;
    writeln!(out, "  KM vs All   : Difference between KM median and naive mean (% change)")?;
    writeln!(out, "  Std.Err     : Greenwood standard error of the survival probability")?;
    Ok(())
}

fn write_summary(out: &mut String, report: &EstimateReport) -> fmt::Result {
    let summary = &report.summary;
    let mean_event = summary
        .mean_event_time
        .map_or("N/A".to_string(), |m| format!("{m:.2}"));
    let median = summary
        .median_km
        .map_or("N/A".to_string(), |m| format!("{m:.2}"));

    writeln!(out, "Summary:")?;
    writeln!(
        out,
        "  Subjects: {}, events: {}, censored: {} ({:.1}%)",
        summary.n_subjects,
        summary.n_events,
        summary.n_censored,
        summary.censoring_rate()
    )?;
    writeln!(
        out,
        "  Mean(Event): {mean_event}, Mean(All): {:.2}, Median(KM): {median}, KM vs All: {}",
        summary.mean_all_time,
        summary.km_vs_all_str()
    )?;
    Ok(())
}

fn write_table(out: &mut String, report: &EstimateReport) -> fmt::Result {
    let level = 100.0 * (1.0 - report.alpha);
    writeln!(out, "Survival table ({level:.1}% log-log confidence intervals):")?;
    writeln!(
        out,
        "  {:>10} {:>8} {:>7} {:>9} {:>10} {:>10} {:>10} {:>10}",
        "Time", "At Risk", "Events", "Censored", "Survival", "Std.Err", "Lower", "Upper",
    )?;
    writeln!(out, "  {}", "-".repeat(TABLE_WIDTH))?;

    let estimate = &report.estimate;
    for (i, record) in estimate.records().enumerate() {
        let bounds = report.confidence[i];
        writeln!(
            out,
            "  {:>10} {:>8} {:>7} {:>9} {:>10.4} {:>10.4} {:>10.4} {:>10.4}",
            record.time,
            record.n_at_risk,
            record.n_events,
            record.n_censored,
            estimate.survival()[i],
            report.survival_stderr[i],
            bounds.lower,
            bounds.upper,
        )?;
    }
    Ok(())
}

/// Format the full report
pub(super) fn format_report(report: &EstimateReport) -> Result<String, fmt::Error> {
    let mut out = String::new();
    write_legend(&mut out)?;
    writeln!(out)?;
    write_summary(&mut out, report)?;
    writeln!(out)?;
    write_table(&mut out, report)?;
    Ok(out)
}
