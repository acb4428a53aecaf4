//! Octelium manifest rendering
//!
//! Rendering is pure: the same inputs always give byte-identical YAML, so
//! generated manifests can be reviewed as diffs in version control.

pub mod output;

use crate::error::Result;
use crate::mapping::{MappingConfig, ResolvedGroup};
use crate::provider::{RawGroup, UserWithGroups};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

pub use output::{print_manifests, write_manifests, RenderedManifests};

/// Resolved groups keyed by their raw IdP name
pub type ResolvedGroups = HashMap<String, ResolvedGroup>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupManifest {
    pub kind: &'static str,
    pub metadata: Metadata,
    pub spec: GroupSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GroupSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization: Option<Authorization>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Authorization {
    pub policies: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserManifest {
    pub kind: &'static str,
    pub metadata: Metadata,
    pub spec: UserSpec,
}

/// Synced identities are always people
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserType {
    Human,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSpec {
    #[serde(rename = "type")]
    pub user_type: UserType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub groups: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupsDocument {
    pub groups: Vec<GroupManifest>,
}

impl GroupsDocument {
    pub fn to_yaml(&self) -> Result<String> {
        to_yaml_stream(&self.groups)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsersDocument {
    pub users: Vec<UserManifest>,
}

impl UsersDocument {
    pub fn to_yaml(&self) -> Result<String> {
        to_yaml_stream(&self.users)
    }
}

/// Serialize items as a `---` separated YAML stream
fn to_yaml_stream<T: Serialize>(items: &[T]) -> Result<String> {
    let mut out = String::new();
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str("---\n");
        }
        out.push_str(&serde_yaml::to_string(item)?);
    }
    Ok(out)
}

/// Resolve every raw group and render the ones that are synced.
///
/// Returns the document together with the raw-name lookup used by
/// [`render_users`]. A raw name is resolved once; when several raw groups
/// share a target name only the first is rendered.
pub fn render_groups(
    raw_groups: &[RawGroup],
    mapping: &MappingConfig,
) -> (GroupsDocument, ResolvedGroups) {
    let mut resolved = ResolvedGroups::new();
    let mut rendered_names = HashSet::new();
    let mut document = GroupsDocument::default();

    for raw in raw_groups {
        if resolved.contains_key(&raw.name) {
            continue;
        }
        let Some(group) = mapping.resolve(&raw.name) else {
            continue;
        };

        if rendered_names.insert(group.name.clone()) {
            document.groups.push(GroupManifest {
                kind: "Group",
                metadata: Metadata {
                    name: group.name.clone(),
                    display_name: Some(group.display_name.clone()),
                },
                spec: GroupSpec {
                    authorization: (!group.policies.is_empty()).then(|| Authorization {
                        policies: group.policies.clone(),
                    }),
                },
            });
        }
        resolved.insert(raw.name.clone(), group);
    }

    (document, resolved)
}

/// Render filtered users, translating raw memberships into target names.
///
/// Memberships of groups missing from `resolved` are dropped.
pub fn render_users(users: &[UserWithGroups], resolved: &ResolvedGroups) -> UsersDocument {
    let users = users
        .iter()
        .map(|entry| {
            let mut groups: Vec<String> = Vec::new();
            for raw in &entry.groups {
                if let Some(group) = resolved.get(raw) {
                    if !groups.contains(&group.name) {
                        groups.push(group.name.clone());
                    }
                }
            }

            UserManifest {
                kind: "User",
                metadata: Metadata {
                    name: entry.user.username.clone(),
                    display_name: display_name(
                        entry.user.first_name.as_deref(),
                        entry.user.last_name.as_deref(),
                    ),
                },
                spec: UserSpec {
                    user_type: UserType::Human,
                    email: entry.user.email.clone(),
                    groups,
                },
            }
        })
        .collect();

    UsersDocument { users }
}

fn display_name(first: Option<&str>, last: Option<&str>) -> Option<String> {
    let joined = [first, last]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    (!joined.is_empty()).then_some(joined)
}
