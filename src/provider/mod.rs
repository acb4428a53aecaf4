//! Identity provider abstraction
//!
//! A provider lists groups, users and group members. Only Keycloak is
//! implemented; the trait keeps the orchestrator independent of it so it can
//! be driven by a mock in tests.

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::keycloak::KeycloakClient;
use crate::sync::reporter::{SyncEvent, SyncReporter};
use async_trait::async_trait;
use std::collections::HashMap;
use std::str::FromStr;

/// A group as listed by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawGroup {
    pub id: String,
    pub name: String,
    /// Hierarchy path, e.g. "/engineering/backend"
    pub path: String,
}

/// A user as listed by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawUser {
    pub id: String,
    pub username: String,
    pub email: Option<String>,
    pub enabled: bool,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// A user together with the raw names of the groups it belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserWithGroups {
    pub user: RawUser,
    pub groups: Vec<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Short provider name used in logs
    fn name(&self) -> &'static str;

    /// Establish the provider session; failure aborts the run
    async fn connect(&self) -> Result<()>;

    async fn list_groups(&self) -> Result<Vec<RawGroup>>;

    async fn list_users(&self) -> Result<Vec<RawUser>>;

    async fn list_group_members(&self, group_id: &str) -> Result<Vec<RawUser>>;
}

/// Supported provider types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Keycloak,
}

impl FromStr for ProviderKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "keycloak" => Ok(Self::Keycloak),
            other => Err(AppError::UnsupportedProvider(other.to_string())),
        }
    }
}

/// Build the provider named in the configuration. No network access happens here.
pub fn create_provider(config: &Config) -> Result<Box<dyn IdentityProvider>> {
    match config.provider.parse::<ProviderKind>()? {
        ProviderKind::Keycloak => {
            let keycloak = config.keycloak.clone().ok_or_else(|| {
                AppError::Config("Keycloak configuration is missing".to_string())
            })?;
            Ok(Box::new(KeycloakClient::new(keycloak)?))
        }
    }
}

/// List every user paired with the names of the groups it belongs to.
///
/// Users keep the provider's listing order; each user's groups follow the
/// order of `groups`. A group whose members cannot be listed is reported and
/// treated as empty.
pub async fn users_with_groups(
    provider: &dyn IdentityProvider,
    groups: &[RawGroup],
    reporter: &dyn SyncReporter,
) -> Result<Vec<UserWithGroups>> {
    let users = provider.list_users().await?;

    let mut memberships: HashMap<String, Vec<String>> = HashMap::new();
    for group in groups {
        match provider.list_group_members(&group.id).await {
            Ok(members) => {
                for member in members {
                    memberships
                        .entry(member.id)
                        .or_default()
                        .push(group.name.clone());
                }
            }
            Err(e) => reporter.report(&SyncEvent::MembersUnavailable {
                group: group.name.clone(),
                error: e.to_string(),
            }),
        }
    }

    Ok(users
        .into_iter()
        .map(|user| {
            let groups = memberships.remove(&user.id).unwrap_or_default();
            UserWithGroups { user, groups }
        })
        .collect())
}
