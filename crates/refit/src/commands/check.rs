//! Check command

use anyhow::Result;
use camino::Utf8Path;
use refit_update::UpdateRecord;
use serde::Serialize;

use crate::cli::CheckArgs;
use crate::output;

#[derive(Serialize)]
struct CheckOutput<'a> {
    records: &'a [UpdateRecord],
    failures: Vec<FailureOutput>,
}

#[derive(Serialize)]
struct FailureOutput {
    plugin: String,
    error: String,
}

pub async fn run(args: CheckArgs, config_path: Option<&Utf8Path>) -> Result<()> {
    let updater = super::open_updater(config_path)?;

    let spinner = (!args.json).then(|| output::spinner("Checking plugins for updates..."));
    let report = updater.check().await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    let report = report?;

    if args.json {
        let out = CheckOutput {
            records: &report.records,
            failures: report
                .failures
                .iter()
                .map(|f| FailureOutput {
                    plugin: f.plugin.clone(),
                    error: f.error.to_string(),
                })
                .collect(),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    if !report.records.is_empty() {
        println!("{}", super::status::records_table(&report.records));
    }

    for failure in &report.failures {
        output::warning(&format!("{}: {}", failure.plugin, failure.error));
    }

    let behind: Vec<&str> = report.behind().collect();
    if behind.is_empty() {
        output::success("All plugins are up to date");
    } else {
        output::info(&format!(
            "{} plugin(s) can be updated: {}",
            behind.len(),
            behind.join(", ")
        ));
        output::info("Run 'refit update-all' to update them");
    }

    Ok(())
}
