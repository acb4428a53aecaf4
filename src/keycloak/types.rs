//! Keycloak type definitions
//!
//! Representations returned by the Keycloak Admin API that the sync reads.

use crate::provider::{RawGroup, RawUser};
use serde::Deserialize;

/// Keycloak user representation
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeycloakUser {
    pub id: String,
    pub username: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(default)]
    pub enabled: bool,
}

impl From<KeycloakUser> for RawUser {
    fn from(user: KeycloakUser) -> Self {
        RawUser {
            id: user.id,
            username: user.username,
            email: user.email,
            enabled: user.enabled,
            first_name: user.first_name,
            last_name: user.last_name,
        }
    }
}

/// Keycloak group representation, possibly carrying its sub groups
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeycloakGroup {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub sub_groups: Vec<KeycloakGroup>,
    /// Set by Keycloak 23+, which no longer inlines `subGroups` in listings
    #[serde(default)]
    pub sub_group_count: Option<u64>,
}

impl KeycloakGroup {
    /// Children have to be fetched from `groups/{id}/children`
    pub fn has_unlisted_children(&self) -> bool {
        self.sub_groups.is_empty() && self.sub_group_count.unwrap_or(0) > 0
    }

    /// Split into the flat group and its inline children
    pub fn into_raw(self, parent_path: &str) -> (RawGroup, Vec<KeycloakGroup>) {
        let path = self
            .path
            .unwrap_or_else(|| format!("{}/{}", parent_path, self.name));

        let raw = RawGroup {
            id: self.id,
            name: self.name,
            path,
        };
        (raw, self.sub_groups)
    }
}

/// Token endpoint response
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    pub expires_in: i64,
}
