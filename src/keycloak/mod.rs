//! Keycloak identity provider

mod client;
mod types;

pub use client::KeycloakClient;
