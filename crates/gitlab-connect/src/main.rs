use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use gitlab_connect::config;
use gitlab_connect::observability::init_logging;
use gitlab_connect::{
    ConnectionHandle, ConnectionResolver, Credentials, HttpConnector, RepositoryDescriptor,
};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(name = "gitlab-connect")]
#[command(about = "Resolve and validate GitLab repository connections", long_about = None)]
#[command(version)]
#[allow(clippy::struct_excessive_bools)]
struct Args {
    /// Configuration file path
    #[arg(short, long, env = "GITLAB_CONNECT_CONFIG")]
    config: Option<PathBuf>,

    /// Repository URL (resolves only this repository)
    #[arg(short, long)]
    url: Option<String>,

    /// GitLab username
    #[arg(long, requires = "url")]
    username: Option<String>,

    /// GitLab password, or the token with --private-token
    #[arg(long, requires = "url")]
    password: Option<String>,

    /// Base URL of the GitLab instance when it is not at the host root
    #[arg(long, requires = "url")]
    base_url: Option<String>,

    /// Treat the password as a pre-issued private token
    #[arg(long, requires = "url")]
    private_token: bool,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Enable JSON logging output
    #[arg(long)]
    json_logs: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Printed result for one repository
#[derive(Debug, Serialize)]
struct Resolved {
    url: String,
    host: String,
    project: String,
    project_id: u64,
    members: usize,
    milestones: usize,
    labels: usize,
}

impl Resolved {
    fn new(url: &str, handle: &ConnectionHandle) -> Self {
        let metadata = handle.mapper().snapshot();
        Self {
            url: url.to_string(),
            host: handle.host().to_string(),
            project: handle.project().path_with_namespace.clone(),
            project_id: handle.project().id,
            members: metadata.members.len(),
            milestones: metadata.milestones.len(),
            labels: metadata.labels.len(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration with precedence: env > file > defaults
    let mut builder = if let Some(ref path) = args.config {
        config::load_config_from_path(path)?
    } else {
        config::load_config()?
    };

    if args.json_logs {
        builder = builder.json_logs(true);
    }
    if args.verbose {
        builder = builder.log_level("debug".to_string());
    }

    let config = builder.build()?;
    init_logging(config.logging())?;

    let repositories = match args.url {
        Some(ref url) => vec![
            RepositoryDescriptor::new(
                url.clone(),
                Credentials::new(
                    args.username.clone().unwrap_or_default(),
                    args.password.clone().unwrap_or_default(),
                ),
            )
            .with_base_url(args.base_url.clone())
            .with_private_token(args.private_token),
        ],
        None => config.repositories().to_vec(),
    };

    if repositories.is_empty() {
        anyhow::bail!(
            "No repository configured: pass --url, set GITLAB_URL or add a [[repository]] section"
        );
    }

    let connector = HttpConnector::new(config.http())?;
    let resolver = ConnectionResolver::new(Arc::new(connector));

    let mut resolved = Vec::with_capacity(repositories.len());
    for repo in &repositories {
        let handle = resolver
            .get(repo)
            .await
            .with_context(|| format!("Failed to resolve {}", repo.url()))?;
        let entry = Resolved::new(repo.url(), &handle);
        if !args.json {
            println!(
                "{}: {} (id {}) on {} [{} members, {} milestones, {} labels]",
                entry.url,
                entry.project,
                entry.project_id,
                entry.host,
                entry.members,
                entry.milestones,
                entry.labels
            );
        }
        resolved.push(entry);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&resolved)?);
    }

    tracing::debug!(stats = ?resolver.stats(), "Resolution finished");

    Ok(())
}
