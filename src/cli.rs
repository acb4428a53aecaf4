//! Command-line interface
//!
//! Every flag overrides the environment variable of the same setting.

use clap::Parser;
use std::collections::HashMap;
use std::path::PathBuf;

/// Sync Identity Provider users and groups into Octelium manifests
#[derive(Parser, Debug, Default)]
#[command(name = "octelium-idp-sync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Identity provider type [env: IDP_PROVIDER]
    #[arg(long)]
    pub provider: Option<String>,

    /// Group mapping document (YAML or JSON) [env: MAPPING_FILE]
    #[arg(short, long)]
    pub mapping: Option<PathBuf>,

    /// Where to write the groups manifest [env: GROUPS_OUTPUT]
    #[arg(long)]
    pub groups_output: Option<PathBuf>,

    /// Where to write the users manifest [env: USERS_OUTPUT]
    #[arg(long)]
    pub users_output: Option<PathBuf>,

    /// Comma-separated glob patterns of usernames to skip [env: EXCLUDE_USERS]
    #[arg(long)]
    pub exclude_users: Option<String>,

    /// Print the manifests instead of writing them [env: DRY_RUN]
    #[arg(long)]
    pub dry_run: bool,

    /// Log format [env: LOG_FORMAT]
    #[arg(long, value_parser = ["text", "json"])]
    pub log_format: Option<String>,
}

impl Cli {
    /// Flags given on the command line, keyed by their environment variable
    pub fn overrides(&self) -> HashMap<String, String> {
        let mut vars = HashMap::new();
        let mut set = |key: &str, value: Option<String>| {
            if let Some(value) = value {
                vars.insert(key.to_string(), value);
            }
        };

        set("IDP_PROVIDER", self.provider.clone());
        set(
            "MAPPING_FILE",
            self.mapping.as_ref().map(|p| p.display().to_string()),
        );
        set(
            "GROUPS_OUTPUT",
            self.groups_output.as_ref().map(|p| p.display().to_string()),
        );
        set(
            "USERS_OUTPUT",
            self.users_output.as_ref().map(|p| p.display().to_string()),
        );
        set("EXCLUDE_USERS", self.exclude_users.clone());
        set("DRY_RUN", self.dry_run.then(|| "true".to_string()));
        set("LOG_FORMAT", self.log_format.clone());

        vars
    }
}
