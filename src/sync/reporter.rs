//! Progress reporting for a sync run
//!
//! The orchestrator never logs directly; it hands [`SyncEvent`]s to a
//! [`SyncReporter`]. [`TracingReporter`] turns them into structured
//! `tracing` events.

use super::SyncSummary;
use std::path::PathBuf;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    MappingLoaded { path: PathBuf, groups: usize },
    Connected { provider: &'static str },
    GroupsFetched { count: usize },
    UsersFetched { count: usize },
    MembersUnavailable { group: String, error: String },
    UserDisabled { username: String },
    UserExcluded { username: String },
    GroupSkipped { group: String },
    DocumentWritten { path: PathBuf, entries: usize },
    Finished(SyncSummary),
}

#[cfg_attr(test, mockall::automock)]
pub trait SyncReporter: Send + Sync {
    fn report(&self, event: &SyncEvent);
}

/// Reporter backed by the global `tracing` subscriber
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl SyncReporter for TracingReporter {
    fn report(&self, event: &SyncEvent) {
        match event {
            SyncEvent::MappingLoaded { path, groups } => {
                info!(path = %path.display(), groups, "Loaded group mapping")
            }
            SyncEvent::Connected { provider } => info!(provider, "Connected to identity provider"),
            SyncEvent::GroupsFetched { count } => info!(count, "Fetched groups"),
            SyncEvent::UsersFetched { count } => info!(count, "Fetched users"),
            SyncEvent::MembersUnavailable { group, error } => warn!(
                group = %group,
                error = %error,
                "Failed to list group members, treating group as empty"
            ),
            SyncEvent::UserDisabled { username } => {
                debug!(username = %username, "Skipping disabled user")
            }
            SyncEvent::UserExcluded { username } => {
                debug!(username = %username, "Skipping excluded user")
            }
            SyncEvent::GroupSkipped { group } => debug!(group = %group, "Skipping unmapped group"),
            SyncEvent::DocumentWritten { path, entries } => {
                info!(path = %path.display(), entries, "Wrote manifest")
            }
            SyncEvent::Finished(summary) => info!(
                groups = summary.groups_rendered,
                groups_skipped = summary.groups_skipped,
                users = summary.users_rendered,
                users_disabled = summary.users_disabled,
                users_excluded = summary.users_excluded,
                dry_run = summary.dry_run,
                "Sync finished"
            ),
        }
    }
}
