//! Sync orchestration
//!
//! Sequences a single run: fetch groups and users from the provider, filter
//! users, resolve and render both manifests, then print or persist them.
//! Every step must succeed before the next one starts.

pub mod filter;
pub mod reporter;

use crate::config::SyncConfig;
use crate::error::{AppError, Result};
use crate::manifest::{self, RenderedManifests};
use crate::mapping::MappingConfig;
use crate::provider::{users_with_groups, IdentityProvider};
use glob::Pattern;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use self::filter::filter_users;
use self::reporter::{SyncEvent, SyncReporter};

/// Counts describing a finished run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub groups_rendered: usize,
    pub groups_skipped: usize,
    pub users_rendered: usize,
    pub users_disabled: usize,
    pub users_excluded: usize,
    pub dry_run: bool,
}

pub struct SyncService {
    mapping: MappingConfig,
    exclude_patterns: Vec<Pattern>,
    groups_output: PathBuf,
    users_output: PathBuf,
    dry_run: bool,
    reporter: Arc<dyn SyncReporter>,
}

impl SyncService {
    pub fn new(
        mapping: MappingConfig,
        exclude_patterns: Vec<Pattern>,
        config: &SyncConfig,
        reporter: Arc<dyn SyncReporter>,
    ) -> Self {
        Self {
            mapping,
            exclude_patterns,
            groups_output: config.groups_output.clone(),
            users_output: config.users_output.clone(),
            dry_run: config.dry_run,
            reporter,
        }
    }

    /// Load the mapping document and exclude patterns named by the configuration
    pub fn from_config(config: &SyncConfig, reporter: Arc<dyn SyncReporter>) -> Result<Self> {
        let path = config
            .mapping_file
            .as_deref()
            .ok_or_else(|| AppError::Config("MAPPING_FILE is required".to_string()))?;

        let mapping = MappingConfig::load(path)?;
        reporter.report(&SyncEvent::MappingLoaded {
            path: path.to_path_buf(),
            groups: mapping.groups.len(),
        });

        let exclude_patterns = filter::parse_exclude_patterns(&config.exclude_users)?;

        Ok(Self::new(mapping, exclude_patterns, config, reporter))
    }

    /// Fetch, filter and render without touching the output destinations
    pub async fn render(
        &self,
        provider: &dyn IdentityProvider,
    ) -> Result<(RenderedManifests, SyncSummary)> {
        provider.connect().await?;
        self.reporter.report(&SyncEvent::Connected {
            provider: provider.name(),
        });

        let raw_groups = provider.list_groups().await?;
        self.reporter.report(&SyncEvent::GroupsFetched {
            count: raw_groups.len(),
        });

        let users = users_with_groups(provider, &raw_groups, self.reporter.as_ref()).await?;
        self.reporter.report(&SyncEvent::UsersFetched { count: users.len() });

        let filtered = filter_users(users, &self.exclude_patterns);
        for username in &filtered.disabled {
            self.reporter.report(&SyncEvent::UserDisabled {
                username: username.clone(),
            });
        }
        for username in &filtered.excluded {
            self.reporter.report(&SyncEvent::UserExcluded {
                username: username.clone(),
            });
        }

        let (groups_document, resolved) = manifest::render_groups(&raw_groups, &self.mapping);
        let mut skipped = HashSet::new();
        for raw in &raw_groups {
            if !resolved.contains_key(&raw.name) && skipped.insert(raw.name.as_str()) {
                self.reporter.report(&SyncEvent::GroupSkipped {
                    group: raw.name.clone(),
                });
            }
        }

        let users_document = manifest::render_users(&filtered.kept, &resolved);

        let manifests = RenderedManifests {
            groups_yaml: groups_document.to_yaml()?,
            users_yaml: users_document.to_yaml()?,
            group_count: groups_document.groups.len(),
            user_count: users_document.users.len(),
        };

        let summary = SyncSummary {
            groups_rendered: manifests.group_count,
            groups_skipped: skipped.len(),
            users_rendered: manifests.user_count,
            users_disabled: filtered.disabled.len(),
            users_excluded: filtered.excluded.len(),
            dry_run: self.dry_run,
        };

        Ok((manifests, summary))
    }

    /// Run the full sync and print (dry-run) or persist the manifests
    pub async fn run(&self, provider: &dyn IdentityProvider) -> Result<SyncSummary> {
        let (manifests, summary) = self.render(provider).await?;

        if self.dry_run {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            manifest::print_manifests(
                &manifests,
                &self.groups_output,
                &self.users_output,
                &mut handle,
            )?;
        } else {
            manifest::write_manifests(&manifests, &self.groups_output, &self.users_output)?;
            self.reporter.report(&SyncEvent::DocumentWritten {
                path: self.groups_output.clone(),
                entries: manifests.group_count,
            });
            self.reporter.report(&SyncEvent::DocumentWritten {
                path: self.users_output.clone(),
                entries: manifests.user_count,
            });
        }

        self.reporter.report(&SyncEvent::Finished(summary.clone()));
        Ok(summary)
    }
}
