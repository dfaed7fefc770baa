//! Template robot: greets new pull requests and logs other activity.
//!
//! Replace the handlers in `register` with real logic.

use std::sync::Arc;

use anyhow::Context;
use github_robot::config::ServiceConfig;
use github_robot::dispatch::{Dispatcher, HandlerTable};
use github_robot::github::GitHubClient;
use github_robot::server::{self, AppState};
use github_robot::webhooks::{IssuePrInfo, WebhookValidator};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "github_robot=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServiceConfig::from_env()?;
    info!(?config, "Starting robot");

    let token = config.github_token.clone();
    let client = GitHubClient::new(&move || token.clone(), config.api_url.as_deref())
        .context("building GitHub client")?;

    let mut dispatcher = Dispatcher::new(Arc::new(register(client)));
    if let Some(max) = config.max_concurrency {
        dispatcher = dispatcher.with_max_concurrency(max);
    }

    let secret = config.webhook_secret.clone();
    let mut validator = WebhookValidator::new(move || secret.clone().into_bytes());
    if let Some(client_id) = &config.client_id {
        validator = validator.with_client_id(client_id);
    }

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("binding port {}", config.port))?;

    let state = AppState::new(validator, Arc::new(dispatcher));
    server::serve(listener, state, &config.hook_path).await
}

fn register(client: GitHubClient) -> HandlerTable {
    let client = Arc::new(client);

    HandlerTable::builder()
        .on_issue_pr_info(move |info| greet(Arc::clone(&client), info))
        .on_issue(|event| async move {
            info!(number = event.issue.number, action = %event.action, "Issue event");
            Ok(())
        })
        .on_push(|event| async move {
            info!(git_ref = %event.git_ref, commits = event.commits.len(), "Push event");
            Ok(())
        })
        .build()
}

async fn greet(client: Arc<GitHubClient>, info: IssuePrInfo) -> anyhow::Result<()> {
    let IssuePrInfo::PullRequest(event) = &info else {
        return Ok(());
    };
    if !event.is_opened() {
        return Ok(());
    }

    let address = info.address()?;
    let body = format!("Thanks for the pull request, @{}!", info.author());
    client
        .create_issue_comment(&address, &body)
        .await
        .with_context(|| format!("commenting on {address}"))?;
    info!(%address, "Greeted new pull request");
    Ok(())
}
