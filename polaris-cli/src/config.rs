//! Instance connection options
//!
//! Both commands talk to two Polaris instances, each reachable with either
//! a pre-issued bearer token or OAuth2 client credentials exchanged once
//! at startup. The flag sets for source and target are deliberately
//! symmetrical.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Args;

use crate::api::{ManagementApi, PolarisClient, auth};

#[derive(Debug, Clone, Args)]
pub struct SourceOptions {
    /// Base URL of the source Polaris instance
    #[arg(id = "source_base_url", long = "source-base-url")]
    pub base_url: String,
    /// Pre-issued bearer token for the source instance
    #[arg(id = "source_access_token", long = "source-access-token")]
    pub access_token: Option<String>,
    /// OAuth2 token endpoint for the source instance
    #[arg(id = "source_oauth2_server_uri", long = "source-oauth2-server-uri")]
    pub oauth2_server_uri: Option<String>,
    #[arg(id = "source_client_id", long = "source-client-id")]
    pub client_id: Option<String>,
    #[arg(id = "source_client_secret", long = "source-client-secret")]
    pub client_secret: Option<String>,
    #[arg(id = "source_scope", long = "source-scope")]
    pub scope: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct TargetOptions {
    /// Base URL of the target Polaris instance
    #[arg(id = "target_base_url", long = "target-base-url")]
    pub base_url: String,
    /// Pre-issued bearer token for the target instance
    #[arg(id = "target_access_token", long = "target-access-token")]
    pub access_token: Option<String>,
    /// OAuth2 token endpoint for the target instance
    #[arg(id = "target_oauth2_server_uri", long = "target-oauth2-server-uri")]
    pub oauth2_server_uri: Option<String>,
    #[arg(id = "target_client_id", long = "target-client-id")]
    pub client_id: Option<String>,
    #[arg(id = "target_client_secret", long = "target-client-secret")]
    pub client_secret: Option<String>,
    #[arg(id = "target_scope", long = "target-scope")]
    pub scope: Option<String>,
}

/// One instance's resolved connection settings, independent of which flag
/// prefix they came from.
#[derive(Debug, Clone)]
pub struct InstanceOptions {
    pub service_name: &'static str,
    pub base_url: String,
    pub access_token: Option<String>,
    pub oauth2_server_uri: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub scope: Option<String>,
}

enum AuthMode<'a> {
    Token(&'a str),
    ClientCredentials {
        oauth2_server_uri: &'a str,
        client_id: &'a str,
        client_secret: &'a str,
        scope: &'a str,
    },
}

impl InstanceOptions {
    fn auth_mode(&self) -> Result<AuthMode<'_>> {
        if let Some(token) = &self.access_token {
            return Ok(AuthMode::Token(token));
        }

        match (
            &self.oauth2_server_uri,
            &self.client_id,
            &self.client_secret,
            &self.scope,
        ) {
            (Some(oauth2_server_uri), Some(client_id), Some(client_secret), Some(scope)) => {
                Ok(AuthMode::ClientCredentials {
                    oauth2_server_uri,
                    client_id,
                    client_secret,
                    scope,
                })
            }
            _ => bail!(
                "Either the --{0}-access-token option must be provided, or all of \
                 --{0}-oauth2-server-uri, --{0}-client-id, --{0}-client-secret, --{0}-scope",
                self.service_name
            ),
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.auth_mode().map(|_| ())
    }

    /// Resolve a token if needed and build the client for this instance.
    pub async fn connect(&self, timeout: Duration) -> Result<PolarisClient> {
        let token = match self.auth_mode()? {
            AuthMode::Token(token) => token.to_string(),
            AuthMode::ClientCredentials {
                oauth2_server_uri,
                client_id,
                client_secret,
                scope,
            } => {
                let http = reqwest::Client::builder()
                    .timeout(timeout)
                    .build()
                    .context("Failed to build HTTP client")?;
                auth::fetch_token(&http, oauth2_server_uri, client_id, client_secret, scope)
                    .await
                    .with_context(|| {
                        format!("Failed to authenticate against the {} instance", self.service_name)
                    })?
            }
        };

        PolarisClient::new(&self.base_url, token, timeout)
            .with_context(|| format!("Failed to build {} client", self.service_name))
    }
}

impl SourceOptions {
    pub fn instance(&self) -> InstanceOptions {
        InstanceOptions {
            service_name: "source",
            base_url: self.base_url.clone(),
            access_token: self.access_token.clone(),
            oauth2_server_uri: self.oauth2_server_uri.clone(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            scope: self.scope.clone(),
        }
    }
}

impl TargetOptions {
    pub fn instance(&self) -> InstanceOptions {
        InstanceOptions {
            service_name: "target",
            base_url: self.base_url.clone(),
            access_token: self.access_token.clone(),
            oauth2_server_uri: self.oauth2_server_uri.clone(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            scope: self.scope.clone(),
        }
    }
}

#[derive(Debug, Args)]
pub struct ConnectionArgs {
    #[command(flatten)]
    pub source: SourceOptions,
    #[command(flatten)]
    pub target: TargetOptions,
    /// Per-request timeout in seconds for both instances
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,
}

impl ConnectionArgs {
    pub async fn connect(&self) -> Result<(Arc<dyn ManagementApi>, Arc<dyn ManagementApi>)> {
        let timeout = Duration::from_secs(self.timeout_secs);
        let source = self.source.instance().connect(timeout).await?;
        let target = self.target.instance().connect(timeout).await?;
        Ok((Arc::new(source), Arc::new(target)))
    }
}
