//! Status command

use anyhow::Result;
use camino::Utf8Path;
use chrono::{DateTime, Utc};
use refit_update::{UpdateRecord, UpdateState};
use serde::Serialize;
use tabled::{settings::Style as TableStyle, Table, Tabled};

use crate::cli::StatusArgs;
use crate::output;

/// One entry per configured plugin
#[derive(Serialize)]
struct PluginStatus {
    plugin: String,
    enabled: bool,
    git: bool,
    state: UpdateState,
    commits_behind: Option<u64>,
    checked_at: Option<DateTime<Utc>>,
}

#[derive(Tabled)]
struct PluginRow {
    plugin: String,
    enabled: bool,
    git: bool,
    state: UpdateState,
    behind: String,
    checked: String,
}

#[derive(Serialize)]
struct StatusOutput {
    plugins: Vec<PluginStatus>,
    backup_available: bool,
}

pub fn run(args: StatusArgs, config_path: Option<&Utf8Path>) -> Result<()> {
    let updater = super::open_updater(config_path)?;
    let records = updater.records()?;

    let plugins: Vec<PluginStatus> = updater
        .config()
        .plugins()
        .map(|(id, plugin)| {
            let record = records.iter().find(|r| r.name == id);
            PluginStatus {
                plugin: id.to_string(),
                enabled: plugin.enabled,
                git: plugin.git,
                state: record.map(|r| r.state).unwrap_or_default(),
                commits_behind: record.and_then(|r| r.commits_behind),
                checked_at: record.and_then(|r| r.checked_at),
            }
        })
        .collect();

    let status = StatusOutput {
        plugins,
        backup_available: updater.backup_available(),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    output::header("Plugins");
    if status.plugins.is_empty() {
        output::info("No plugins configured");
    } else {
        let rows: Vec<PluginRow> = status
            .plugins
            .iter()
            .map(|p| PluginRow {
                plugin: p.plugin.clone(),
                enabled: p.enabled,
                git: p.git,
                state: p.state,
                behind: display_behind(p.commits_behind),
                checked: display_checked(p.checked_at),
            })
            .collect();
        let table = Table::new(&rows).with(TableStyle::rounded()).to_string();
        println!("{}", table);
    }

    output::header("Backup");
    output::kv("Location", updater.config().rollback_directory().as_str());
    output::kv(
        "Available",
        if status.backup_available { "yes" } else { "no" },
    );

    Ok(())
}

/// Render stored records as a table
pub(crate) fn records_table(records: &[UpdateRecord]) -> String {
    #[derive(Tabled)]
    struct RecordRow {
        plugin: String,
        state: UpdateState,
        #[tabled(rename = "type")]
        source: String,
        behind: String,
    }

    let rows: Vec<RecordRow> = records
        .iter()
        .map(|r| RecordRow {
            plugin: r.name.clone(),
            state: r.state,
            source: r
                .source
                .map(|s| s.to_string())
                .unwrap_or_else(|| "-".to_string()),
            behind: display_behind(r.commits_behind),
        })
        .collect();

    Table::new(&rows).with(TableStyle::rounded()).to_string()
}

fn display_behind(count: Option<u64>) -> String {
    count
        .map(|c| c.to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn display_checked(at: Option<DateTime<Utc>>) -> String {
    at.map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "never".to_string())
}
