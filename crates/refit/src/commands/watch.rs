//! Watch command: scheduled checks until Ctrl-C

use anyhow::Result;
use camino::Utf8Path;

use crate::output;

pub async fn run(config_path: Option<&Utf8Path>) -> Result<()> {
    let updater = super::open_updater(config_path)?;
    let schedule = updater.schedule();

    output::info(&format!(
        "Checking every {}h (job '{}'), press Ctrl-C to stop",
        schedule.interval().as_secs() / 3600,
        schedule.job_id()
    ));

    let updater = &updater;
    let runs = schedule
        .run_until(
            move || async move {
                let result = updater.check().await;
                if let Ok(report) = &result {
                    let behind = report.behind().count();
                    if behind > 0 {
                        output::info(&format!("{} plugin(s) can be updated", behind));
                    }
                }
                result
            },
            async {
                let _ = tokio::signal::ctrl_c().await;
            },
        )
        .await;

    output::info(&format!("Stopped after {} check(s)", runs));
    Ok(())
}
