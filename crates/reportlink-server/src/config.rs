//! Proxy configuration.
//!
//! Read once from environment variables at startup, then shared read-only
//! with every handler through [`crate::AppState`].

use std::str::FromStr;
use std::time::Duration;

use reportlink_models::{
    AccessLevel, DatasetId, EmbedTokenPolicy, ReportId, UserSettings, WorkspaceId, parse_id_list,
};
use secrecy::SecretString;
use url::Url;

use crate::error::ConfigError;
use crate::upstream::UpstreamPolicy;

/// Scope requested from the identity authority when none is configured.
pub const DEFAULT_SCOPE: &str = "https://analysis.windows.net/powerbi/api/.default offline_access";

/// Base of composed embed URLs when no override is configured.
pub const DEFAULT_EMBED_URL_BASE: &str = "https://app.powerbi.com/reportEmbed";

/// Upper bound accepted for `UPSTREAM_TIMEOUT_RETRIES`.
pub const MAX_TIMEOUT_RETRIES: u32 = 3;

/// Client-credentials grant parameters.
#[derive(Debug)]
pub struct Credentials {
    /// OAuth client identifier.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: SecretString,
    /// Token endpoint of the identity authority.
    pub authority_url: Url,
    /// Scope string identifying the reporting-service audience.
    pub scope: String,
}

/// A report with the datasets (and workspace) it should be embedded with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportTarget {
    /// Report to embed.
    pub report_id: ReportId,
    /// Datasets backing the report; never empty.
    pub dataset_ids: Vec<DatasetId>,
    /// Workspace containing the report.
    pub workspace_id: Option<WorkspaceId>,
}

/// Reporting-service endpoints and the statically configured report.
#[derive(Debug)]
pub struct EmbedConfig {
    /// `GenerateToken` endpoint.
    pub generate_embed_url: Url,
    /// Full embed URL, used verbatim when set.
    pub embed_url: Option<String>,
    /// Base that `reportId`/`groupId` are appended to otherwise.
    pub embed_url_base: Url,
    /// Target of `GET /api/report-details`.
    pub report: Option<ReportTarget>,
}

/// Global configuration shared across all handlers.
#[derive(Debug)]
pub struct AppConfig {
    /// Authority credentials.
    pub credentials: Credentials,
    /// Reporting-service settings.
    pub embed: EmbedConfig,
    /// Viewer-identity policy for generated tokens.
    pub policy: EmbedTokenPolicy,
    /// Outbound timeout/retry settings.
    pub upstream: UpstreamPolicy,
    /// Origins allowed by CORS (`*` for any).
    pub cors_allowed_origins: Vec<String>,
    /// Payload of `GET /api/user/settings`.
    pub user_settings: UserSettings,
    /// Port to listen on (default `5000`).
    pub listen_port: u16,
}

impl AppConfig {
    /// Build the configuration from environment variables.
    ///
    /// | Variable                     | Default                               |
    /// |------------------------------|---------------------------------------|
    /// | `CLIENT_ID`                  | required                              |
    /// | `CLIENT_SECRET`              | required                              |
    /// | `AUTHORITY_URL`              | required                              |
    /// | `AUTHORITY_SCOPE`            | [`DEFAULT_SCOPE`]                     |
    /// | `GENERATE_EMBED_URL`         | required                              |
    /// | `REPORT_ID`                  | unset                                 |
    /// | `DATASET_ID`                 | unset (comma-separated list)          |
    /// | `WORKSPACE_ID`               | unset                                 |
    /// | `EMBED_URL`                  | unset                                 |
    /// | `EMBED_URL_BASE`             | [`DEFAULT_EMBED_URL_BASE`]            |
    /// | `IDENTITY_USERNAME`          | `13026` (empty disables the identity) |
    /// | `IDENTITY_ROLES`             | `Admin` (comma-separated)             |
    /// | `ACCESS_LEVEL`               | `View`                                |
    /// | `UPSTREAM_TIMEOUT_SECS`      | `10`                                  |
    /// | `UPSTREAM_TIMEOUT_RETRIES`   | `1` (at most [`MAX_TIMEOUT_RETRIES`]) |
    /// | `CORS_ALLOWED_ORIGINS`       | `*`                                   |
    /// | `RECRUITMENT_REPORT_ENABLED` | `true`                                |
    /// | `LISTEN_PORT`                | `5000`                                |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(lookup);

        let credentials = Credentials {
            client_id: vars.required("CLIENT_ID")?,
            client_secret: SecretString::new(vars.required("CLIENT_SECRET")?.into()),
            authority_url: vars.url("AUTHORITY_URL")?,
            scope: vars
                .optional("AUTHORITY_SCOPE")
                .unwrap_or_else(|| DEFAULT_SCOPE.to_string()),
        };

        let embed_url_base = vars
            .optional("EMBED_URL_BASE")
            .unwrap_or_else(|| DEFAULT_EMBED_URL_BASE.to_string());
        let embed = EmbedConfig {
            generate_embed_url: vars.url("GENERATE_EMBED_URL")?,
            embed_url: vars.optional("EMBED_URL"),
            embed_url_base: Url::parse(&embed_url_base)
                .map_err(|e| Vars::<F>::invalid("EMBED_URL_BASE", e))?,
            report: vars.report_target()?,
        };

        let default_policy = EmbedTokenPolicy::default();
        let policy = EmbedTokenPolicy {
            access_level: match vars.optional("ACCESS_LEVEL") {
                Some(raw) => AccessLevel::parse(&raw).map_err(|e| ConfigError::Invalid {
                    name: "ACCESS_LEVEL",
                    reason: e.to_string(),
                })?,
                None => default_policy.access_level,
            },
            // Read raw: an explicitly empty username disables the identity block.
            identity_username: vars
                .raw("IDENTITY_USERNAME")
                .map_or(default_policy.identity_username, |v| v.trim().to_string()),
            identity_roles: vars
                .optional("IDENTITY_ROLES")
                .map_or(default_policy.identity_roles, |raw| split_list(&raw)),
        };

        let upstream = UpstreamPolicy {
            timeout: Duration::from_secs(vars.parsed("UPSTREAM_TIMEOUT_SECS", 10)?),
            timeout_retries: vars.parsed("UPSTREAM_TIMEOUT_RETRIES", 1)?,
        };
        if upstream.timeout.is_zero() {
            return Err(ConfigError::Invalid {
                name: "UPSTREAM_TIMEOUT_SECS",
                reason: "must be greater than zero".into(),
            });
        }
        if upstream.timeout_retries > MAX_TIMEOUT_RETRIES {
            return Err(ConfigError::Invalid {
                name: "UPSTREAM_TIMEOUT_RETRIES",
                reason: format!("must be at most {MAX_TIMEOUT_RETRIES}"),
            });
        }

        Ok(Self {
            credentials,
            embed,
            policy,
            upstream,
            cors_allowed_origins: vars
                .optional("CORS_ALLOWED_ORIGINS")
                .map_or_else(|| vec!["*".to_string()], |raw| split_list(&raw)),
            user_settings: UserSettings {
                is_recruitment_report_enabled: vars.parsed("RECRUITMENT_REPORT_ENABLED", true)?,
            },
            listen_port: vars.parsed("LISTEN_PORT", 5000)?,
        })
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

struct Vars<F>(F);

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn raw(&self, name: &str) -> Option<String> {
        (self.0)(name)
    }

    fn optional(&self, name: &str) -> Option<String> {
        self.raw(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required(&self, name: &'static str) -> Result<String, ConfigError> {
        self.optional(name).ok_or(ConfigError::Missing(name))
    }

    /// A required absolute URL.
    fn url(&self, name: &'static str) -> Result<Url, ConfigError> {
        Url::parse(&self.required(name)?).map_err(|e| Self::invalid(name, e))
    }

    fn parsed<T>(&self, name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.optional(name) {
            Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
                name,
                reason: e.to_string(),
            }),
            None => Ok(default),
        }
    }

    fn invalid(name: &'static str, err: impl std::fmt::Display) -> ConfigError {
        ConfigError::Invalid {
            name,
            reason: err.to_string(),
        }
    }

    /// `REPORT_ID` and `DATASET_ID` must be set together or not at all.
    fn report_target(&self) -> Result<Option<ReportTarget>, ConfigError> {
        let report = self.optional("REPORT_ID");
        let datasets = self.optional("DATASET_ID");
        let workspace_id = self
            .optional("WORKSPACE_ID")
            .map(|raw| WorkspaceId::new(&raw))
            .transpose()
            .map_err(|e| Self::invalid("WORKSPACE_ID", e))?;

        match (report, datasets) {
            (None, None) => Ok(None),
            (Some(_), None) => Err(ConfigError::Missing("DATASET_ID")),
            (None, Some(_)) => Err(ConfigError::Missing("REPORT_ID")),
            (Some(report), Some(datasets)) => Ok(Some(ReportTarget {
                report_id: ReportId::new(&report).map_err(|e| Self::invalid("REPORT_ID", e))?,
                dataset_ids: parse_id_list(&datasets, "DATASET_ID")
                    .map_err(|e| Self::invalid("DATASET_ID", e))?,
                workspace_id,
            })),
        }
    }
}
