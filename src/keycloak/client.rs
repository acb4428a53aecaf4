//! Keycloak Admin API client
//!
//! Read-only client for the parts of the Keycloak Admin REST API the sync
//! needs: admin token acquisition with caching, and paginated listings of
//! groups, users and group members.

use crate::config::KeycloakConfig;
use crate::error::{AppError, Result};
use crate::provider::{IdentityProvider, RawGroup, RawUser};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use super::types::*;

/// Keycloak Admin API client
#[derive(Clone)]
pub struct KeycloakClient {
    config: KeycloakConfig,
    http_client: Client,
    token: Arc<RwLock<Option<AdminToken>>>,
}

#[derive(Debug, Clone)]
struct AdminToken {
    access_token: String,
    expires_at: chrono::DateTime<chrono::Utc>,
}

impl KeycloakClient {
    /// Create a new Keycloak client. No request is sent until [`connect`](IdentityProvider::connect).
    pub fn new(config: KeycloakConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::Keycloak(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
            token: Arc::new(RwLock::new(None)),
        })
    }

    /// Get admin access token (with caching)
    async fn get_admin_token(&self) -> Result<String> {
        {
            let token = self.token.read().await;
            if let Some(ref t) = *token {
                if t.expires_at > chrono::Utc::now() + chrono::Duration::seconds(30) {
                    return Ok(t.access_token.clone());
                }
            }
        }

        let token_url = format!(
            "{}/realms/{}/protocol/openid-connect/token",
            self.config.url, self.config.auth_realm
        );

        let mut params = vec![("client_id", self.config.client_id.as_str())];
        match (&self.config.admin_username, &self.config.admin_password) {
            (Some(username), Some(password)) => {
                params.push(("grant_type", "password"));
                params.push(("username", username.as_str()));
                params.push(("password", password.as_str()));
            }
            _ => params.push(("grant_type", "client_credentials")),
        }
        if !self.config.client_secret.is_empty() {
            params.push(("client_secret", self.config.client_secret.as_str()));
        }

        let response = self
            .http_client
            .post(&token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| AppError::Keycloak(format!("Failed to get admin token: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Keycloak(format!(
                "Failed to get admin token: {} - {}",
                status, body
            )));
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::Keycloak(format!("Failed to parse token response: {}", e)))?;

        let admin_token = AdminToken {
            access_token: token_response.access_token.clone(),
            expires_at: chrono::Utc::now() + chrono::Duration::seconds(token_response.expires_in),
        };

        {
            let mut token = self.token.write().await;
            *token = Some(admin_token);
        }

        Ok(token_response.access_token)
    }

    /// Fetch every page of an admin listing under the configured realm
    async fn get_paged<T: DeserializeOwned>(
        &self,
        resource: &str,
        what: &str,
        extra_query: &[(&str, &str)],
    ) -> Result<Vec<T>> {
        let url = format!(
            "{}/admin/realms/{}/{}",
            self.config.url, self.config.realm, resource
        );
        let page_size = self.config.page_size;

        let mut items = Vec::new();
        let mut first: u32 = 0;
        loop {
            let token = self.get_admin_token().await?;
            let response = self
                .http_client
                .get(&url)
                .bearer_auth(&token)
                .query(extra_query)
                .query(&[("first", first), ("max", page_size)])
                .send()
                .await
                .map_err(|e| AppError::Keycloak(format!("Failed to list {}: {}", what, e)))?;

            if response.status() == StatusCode::NOT_FOUND {
                return Err(AppError::Keycloak(format!(
                    "Failed to list {}: realm or resource not found",
                    what
                )));
            }

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(AppError::Keycloak(format!(
                    "Failed to list {}: {} - {}",
                    what, status, body
                )));
            }

            let page: Vec<T> = response
                .json()
                .await
                .map_err(|e| AppError::Keycloak(format!("Failed to parse {}: {}", what, e)))?;

            let fetched = page.len();
            items.extend(page);
            debug!(what, first, fetched, "Fetched Keycloak page");

            if fetched < page_size as usize {
                break;
            }
            first += page_size;
        }

        Ok(items)
    }
}

#[async_trait]
impl IdentityProvider for KeycloakClient {
    fn name(&self) -> &'static str {
        "keycloak"
    }

    async fn connect(&self) -> Result<()> {
        self.get_admin_token().await.map(|_| ())
    }

    async fn list_groups(&self) -> Result<Vec<RawGroup>> {
        let top: Vec<KeycloakGroup> = self
            .get_paged("groups", "groups", &[("briefRepresentation", "false")])
            .await?;

        // Depth-first, parents before children
        let mut pending: Vec<(KeycloakGroup, String)> =
            top.into_iter().rev().map(|g| (g, String::new())).collect();
        let mut groups = Vec::new();

        while let Some((group, parent_path)) = pending.pop() {
            let children: Vec<KeycloakGroup> = if group.has_unlisted_children() {
                self.get_paged(
                    &format!("groups/{}/children", group.id),
                    "sub groups",
                    &[("briefRepresentation", "false")],
                )
                .await?
            } else {
                Vec::new()
            };

            let (raw, inline) = group.into_raw(&parent_path);
            pending.extend(
                inline
                    .into_iter()
                    .chain(children)
                    .rev()
                    .map(|child| (child, raw.path.clone())),
            );
            groups.push(raw);
        }

        Ok(groups)
    }

    async fn list_users(&self) -> Result<Vec<RawUser>> {
        let users: Vec<KeycloakUser> = self.get_paged("users", "users", &[]).await?;
        Ok(users.into_iter().map(RawUser::from).collect())
    }

    async fn list_group_members(&self, group_id: &str) -> Result<Vec<RawUser>> {
        let members: Vec<KeycloakUser> = self
            .get_paged(&format!("groups/{}/members", group_id), "group members", &[])
            .await?;
        Ok(members.into_iter().map(RawUser::from).collect())
    }
}
