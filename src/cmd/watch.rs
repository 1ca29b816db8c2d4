//! `deploy` and `issue` watch commands: wire the polling loops to the
//! terminal renderer.

use anyhow::{Context, Result};
use console::style;
use periscope::client::{ApiClient, SnapshotSource};
use periscope::config::Config;
use periscope::hook::PhaseFilter;
use periscope::poll::{self, DeploymentView, IssueView};
use periscope::stage::project_stages;
use periscope::steps::{GroupOptions, build_steps};
use periscope::ui::{self, ViewState, WatchScreen};

pub async fn cmd_deploy(
    config: &Config,
    task_id: &str,
    phase: PhaseFilter,
    isolate: bool,
    once: bool,
    limit: u32,
    verbose: bool,
) -> Result<()> {
    let client = ApiClient::new(&config.api_url, config.api_token.clone());
    let opts = GroupOptions {
        isolate_status_and_query: isolate,
        phase_filter: phase,
    };
    let state = ViewState {
        verbose,
        ..ViewState::default()
    };

    if once {
        let task = client.task(task_id).await.context("Failed to fetch task")?;
        let snapshot = client
            .deployment_hooks(task_id, limit)
            .await
            .context("Failed to fetch deployment hooks")?
            .into_normalized();
        let steps = build_steps(&snapshot.hooks, &opts);
        println!("{}", render_deployment(&DeploymentView { task, steps }, &state));
        return Ok(());
    }

    let spinner = ui::connect_spinner(&format!("Watching deployment of task {}…", task_id));
    let mut screen = WatchScreen::new();
    let mut connected = false;

    let watch = poll::watch_deployment(
        client,
        task_id.to_string(),
        opts,
        config.policy,
        limit,
        move |view| {
            if !connected {
                spinner.finish_and_clear();
                connected = true;
            }
            screen.draw(&render_deployment(&view, &state));
        },
    );

    tokio::select! {
        _ = watch => {}
        _ = tokio::signal::ctrl_c() => {}
    }
    Ok(())
}

pub async fn cmd_issue(
    config: &Config,
    project_id: &str,
    issue_id: &str,
    once: bool,
    limit: u32,
    verbose: bool,
) -> Result<()> {
    let client = ApiClient::new(&config.api_url, config.api_token.clone());
    // Chat hooks are semantically one-shot (assistant turns, status pings);
    // this view always isolates them.
    let opts = GroupOptions {
        isolate_status_and_query: true,
        phase_filter: PhaseFilter::All,
    };
    let state = ViewState {
        verbose,
        ..ViewState::default()
    };

    if once {
        let doc = client
            .stage_status(project_id, issue_id)
            .await
            .context("Failed to fetch stage status")?;
        let view = IssueView {
            stages: project_stages(&doc),
            doc,
            steps: Vec::new(),
            feed: None,
        };
        println!("{}", render_issue(&view, &state));
        return Ok(());
    }

    let spinner = ui::connect_spinner(&format!(
        "Watching issue {} in project {}…",
        issue_id, project_id
    ));
    let mut screen = WatchScreen::new();
    let mut connected = false;

    let watch = poll::watch_issue(
        client,
        project_id.to_string(),
        issue_id.to_string(),
        opts,
        config.policy,
        limit,
        move |view| {
            if !connected {
                spinner.finish_and_clear();
                connected = true;
            }
            screen.draw(&render_issue(&view, &state));
        },
    );

    tokio::select! {
        _ = watch => {}
        _ = tokio::signal::ctrl_c() => {}
    }
    Ok(())
}

fn render_deployment(view: &DeploymentView, state: &ViewState) -> String {
    let mut out = String::new();
    let name = view.task.name.as_deref().unwrap_or(&view.task.id);
    out.push_str(&format!(
        "{} {}\n\n",
        style(name).bold(),
        style(format!("({})", view.task.deployment_status())).dim()
    ));
    out.push_str(&ui::render_steps(&view.steps, state));
    out
}

fn render_issue(view: &IssueView, state: &ViewState) -> String {
    let mut out = String::new();
    out.push_str(&ui::render_stage_nav(&view.stages));
    out.push_str("\n\n");
    out.push_str(&ui::render_steps(&view.steps, state));
    if let Some(error) = &view.doc.error_message {
        out.push_str(&format!("\n\n{}", style(error).red().bold()));
    }
    out
}
