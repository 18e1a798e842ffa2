use super::Host;
use super::common::CommonArgs;
use crate::Result;
use crate::snapshots::{CacheStore, ProjectCatalog, ReleaseTable, TeamRoster};
use clap::{Parser, ValueEnum};
use ohno::IntoAppError;
use serde::Serialize;
use std::io::Write;
use std::sync::Arc;

/// Which snapshot to print
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Resource {
    /// Repository list and its sections
    Projects,

    /// Latest version of each tracked repository
    Releases,

    /// Creator and contributors
    Team,

    /// Everything
    All,
}

#[derive(Parser, Debug)]
pub struct SnapshotArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Resource to load and print
    #[arg(long, short = 'r', value_name = "RESOURCE", default_value = "all")]
    pub resource: Resource,
}

#[derive(Debug, Default, Serialize)]
struct SnapshotReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    projects: Option<Arc<ProjectCatalog>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    releases: Option<ReleaseTable>,

    #[serde(skip_serializing_if = "Option::is_none")]
    team: Option<Arc<TeamRoster>>,
}

async fn collect(store: &CacheStore, resource: Resource) -> SnapshotReport {
    match resource {
        Resource::Projects => SnapshotReport {
            projects: Some(store.projects(false).await),
            ..SnapshotReport::default()
        },
        Resource::Releases => SnapshotReport {
            releases: Some(store.releases(false).await),
            ..SnapshotReport::default()
        },
        Resource::Team => SnapshotReport {
            team: Some(store.team(false).await),
            ..SnapshotReport::default()
        },
        Resource::All => {
            let (projects, releases, team) = tokio::join!(store.projects(false), store.releases(false), store.team(false));
            SnapshotReport {
                projects: Some(projects),
                releases: Some(releases),
                team: Some(team),
            }
        }
    }
}

/// Load the requested snapshots once and print them as JSON
pub async fn print_snapshot<H: Host>(host: &mut H, args: &SnapshotArgs) -> Result<()> {
    let (_, store) = args.common.open_store()?;
    let report = collect(&store, args.resource).await;

    let json = serde_json::to_string_pretty(&report).into_app_err("serializing snapshot")?;
    writeln!(host.output(), "{json}").into_app_err("writing snapshot")?;

    Ok(())
}
