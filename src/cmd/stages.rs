//! `stages` command: one-shot stage projection and the retry trigger.

use anyhow::{Context, Result};
use console::style;
use periscope::client::{ApiClient, SnapshotSource};
use periscope::config::Config;
use periscope::stage::project_stages;
use periscope::ui;

pub async fn cmd_stages(
    config: &Config,
    project_id: &str,
    issue_id: &str,
    retry: bool,
) -> Result<()> {
    let client = ApiClient::new(&config.api_url, config.api_token.clone());

    if retry {
        client
            .retry_stage(project_id, issue_id)
            .await
            .context("Failed to request a stage retry")?;
        println!("{}", style("Retry requested for the current stage").yellow());
    }

    let doc = client
        .stage_status(project_id, issue_id)
        .await
        .context("Failed to fetch stage status")?;

    println!("{}", ui::render_stage_nav(&project_stages(&doc)));

    if let Some(error) = &doc.error_message {
        println!("\n{}", style(error).red().bold());
    }
    if let Some(retries) = doc.retry_count.filter(|&n| n > 0) {
        println!("{}", style(format!("Retries so far: {}", retries)).dim());
    }
    Ok(())
}
