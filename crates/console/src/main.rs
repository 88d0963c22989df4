//! Maintenance CLI over the console's authorization data.

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;

use rbacadmin_infra::{AdminStores, StoreConfig};

const CONSOLE_BACKEND: &str = "sqlite";

#[derive(Parser, Debug)]
#[command(name = "rbacadmin")]
#[command(about = "Inspect and maintain users, roles and the permission matrix")]
struct Args {
    /// Human-readable logs instead of JSON
    #[arg(long, env = "RBACADMIN_PRETTY_LOGS", default_value = "false")]
    pretty_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Summary counts (users, active users, roles, matrix rows)
    Stats,
    /// List users, optionally filtered by name/email
    Users {
        #[arg(long)]
        search: Option<String>,
    },
    /// List roles, optionally filtered by name/description
    Roles {
        #[arg(long)]
        search: Option<String>,
    },
    /// Print the permission matrix
    Matrix,
    /// Report dangling role references
    Sweep {
        /// Also delete matrix rows for roles that no longer exist
        #[arg(long)]
        prune: bool,
    },
    /// Most recent activity log entries
    Logs {
        #[arg(long, default_value = "20")]
        limit: usize,
    },
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("failed to render output")?;
    println!("{rendered}");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    if args.pretty_logs {
        rbacadmin_observability::tracing::init(rbacadmin_observability::LogFormat::Pretty);
    } else {
        rbacadmin_observability::init();
    }

    let config = StoreConfig::from_env_or(CONSOLE_BACKEND).context("invalid store configuration")?;
    let stores = AdminStores::open(&config)
        .await
        .context("failed to open backing store")?;

    match args.command {
        Command::Stats => print_json(&stores.dashboard().await?)?,
        Command::Users { search } => {
            let users = match search {
                Some(term) => stores.identities.search(&term).await?,
                None => stores.identities.list().await?,
            };
            print_json(&users)?;
        }
        Command::Roles { search } => {
            let roles = match search {
                Some(term) => stores.roles.search(&term).await?,
                None => stores.roles.list().await?,
            };
            print_json(&roles)?;
        }
        Command::Matrix => print_json(&stores.permissions.get().await?)?,
        Command::Sweep { prune } => {
            let sweep = stores.integrity();
            let report = sweep.scan().await?;
            print_json(&report)?;
            if prune && !report.stale_matrix_roles.is_empty() {
                let removed = sweep.prune_stale_matrix().await?;
                tracing::info!(removed = removed.len(), "stale matrix rows pruned");
            }
        }
        Command::Logs { limit } => print_json(&stores.activity.recent(limit).await?)?,
    }

    Ok(())
}
