//! Group mapping: translates IdP group names into Octelium groups
//!
//! The mapping document is operator supplied and looks like:
//!
//! ```yaml
//! groups:
//!   admins:
//!     octeliumGroup: administrators
//!     displayName: Administrators
//!     policies: [admin-policy]
//!   contractors:
//!     sync: false
//! defaults:
//!   unmappedGroups: skip
//!   defaultPolicies: [baseline]
//! ```

use crate::error::{AppError, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use tracing::warn;

/// One configured group
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingEntry {
    pub octelium_group: Option<String>,
    pub display_name: Option<String>,
    pub policies: Option<Vec<String>>,
    pub sync: Option<bool>,
}

/// What to do with IdP groups that have no mapping entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnmappedGroupPolicy {
    #[default]
    Skip,
    Include,
    IncludeNoPolicies,
}

impl FromStr for UnmappedGroupPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "skip" => Ok(Self::Skip),
            "include" => Ok(Self::Include),
            "include-no-policies" => Ok(Self::IncludeNoPolicies),
            other => Err(format!("unknown unmapped group policy '{}'", other)),
        }
    }
}

/// Fallback behavior for groups absent from the mapping
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingDefaults {
    /// Raw policy name; unrecognized values behave like "skip"
    #[serde(default)]
    pub unmapped_groups: Option<String>,
    #[serde(default)]
    pub default_policies: Vec<String>,
}

impl MappingDefaults {
    pub fn unmapped_policy(&self) -> UnmappedGroupPolicy {
        self.unmapped_groups
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }
}

/// A group that will be rendered, with its final name and policies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedGroup {
    pub name: String,
    pub display_name: String,
    pub policies: Vec<String>,
    pub sync: bool,
}

#[derive(Deserialize)]
struct RawMappingDocument {
    groups: Option<HashMap<String, Option<MappingEntry>>>,
    #[serde(default)]
    defaults: Option<MappingDefaults>,
}

/// The operator's mapping table, immutable for the run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingConfig {
    pub groups: HashMap<String, MappingEntry>,
    pub defaults: MappingDefaults,
}

impl MappingConfig {
    pub fn new(groups: HashMap<String, MappingEntry>, defaults: MappingDefaults) -> Self {
        Self { groups, defaults }
    }

    /// Load the mapping document from a YAML (or JSON) file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!(
                "Failed to read mapping file {}: {}",
                path.display(),
                e
            ))
        })?;

        Self::parse(&content).map_err(|e| match e {
            AppError::Config(msg) => AppError::Config(format!("{} ({})", msg, path.display())),
            other => other,
        })
    }

    /// Parse a mapping document
    pub fn parse(content: &str) -> Result<Self> {
        let doc: RawMappingDocument = serde_yaml::from_str(content)
            .map_err(|e| AppError::Config(format!("Invalid mapping document: {}", e)))?;

        let groups = doc.groups.ok_or_else(|| {
            AppError::Config("Mapping document must contain a 'groups' table".to_string())
        })?;

        let defaults = doc.defaults.unwrap_or_default();
        if let Some(raw) = defaults.unmapped_groups.as_deref() {
            if let Err(e) = raw.parse::<UnmappedGroupPolicy>() {
                warn!(value = raw, "{}, treating unmapped groups as 'skip'", e);
            }
        }

        // A bare `admins:` key maps the group with every field left to defaults
        let groups = groups
            .into_iter()
            .map(|(name, entry)| (name, entry.unwrap_or_default()))
            .collect();

        Ok(Self { groups, defaults })
    }

    /// Decide whether a raw IdP group is synced and under which name
    pub fn resolve(&self, raw_group_name: &str) -> Option<ResolvedGroup> {
        if let Some(entry) = self.groups.get(raw_group_name) {
            if entry.sync == Some(false) {
                return None;
            }

            return Some(ResolvedGroup {
                name: non_empty(entry.octelium_group.as_deref())
                    .unwrap_or(raw_group_name)
                    .to_string(),
                display_name: non_empty(entry.display_name.as_deref())
                    .unwrap_or(raw_group_name)
                    .to_string(),
                policies: entry
                    .policies
                    .clone()
                    .unwrap_or_else(|| self.defaults.default_policies.clone()),
                sync: true,
            });
        }

        let policies = match self.defaults.unmapped_policy() {
            UnmappedGroupPolicy::Skip => return None,
            UnmappedGroupPolicy::Include => self.defaults.default_policies.clone(),
            UnmappedGroupPolicy::IncludeNoPolicies => Vec::new(),
        };

        Some(ResolvedGroup {
            name: raw_group_name.to_string(),
            display_name: raw_group_name.to_string(),
            policies,
            sync: true,
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
