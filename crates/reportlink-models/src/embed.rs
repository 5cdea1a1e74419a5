//! Embed-token request and response types.
//!
//! [`EmbedTokenPolicy`] describes *who* the generated token impersonates
//! (access level, effective identity, roles).  [`EmbedTokenRequest`] binds
//! that policy to concrete reports and datasets, and renders the
//! `GenerateToken` body expected by the reporting service through
//! [`EmbedTokenRequest::to_body`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::ids::{DatasetId, ReportId, WorkspaceId};

// ---------------------------------------------------------------------------
// Access level / permissions
// ---------------------------------------------------------------------------

/// Level of access granted by an embed token.
#[derive(
    Serialize,
    Deserialize,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    strum::Display,
    strum::EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum AccessLevel {
    /// Read-only rendering of the report.
    #[default]
    View,
    /// View and edit the report.
    Edit,
    /// Create new reports on the dataset.
    Create,
}

impl AccessLevel {
    /// Parse an access level, case-insensitively.
    pub fn parse(value: &str) -> Result<Self, ModelError> {
        value
            .trim()
            .parse()
            .map_err(|_| ModelError::InvalidAccessLevel {
                value: value.to_string(),
            })
    }
}

/// XMLA endpoint permission attached to each dataset in the request.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum XmlaPermissions {
    /// No XMLA access.
    Off,
    /// Read-only XMLA access.
    #[default]
    ReadOnly,
}

// ---------------------------------------------------------------------------
// EmbedTokenPolicy
// ---------------------------------------------------------------------------

/// Viewer-identity policy applied to every generated embed token.
///
/// Loaded once from configuration.  An empty `identity_username` disables
/// the effective-identity block entirely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedTokenPolicy {
    /// Access level requested for the token.
    pub access_level: AccessLevel,
    /// Username of the effective identity (row-level security principal).
    pub identity_username: String,
    /// Roles granted to the effective identity.
    pub identity_roles: Vec<String>,
}

impl Default for EmbedTokenPolicy {
    fn default() -> Self {
        Self {
            access_level: AccessLevel::View,
            identity_username: "13026".to_string(),
            identity_roles: vec!["Admin".to_string()],
        }
    }
}

// ---------------------------------------------------------------------------
// EmbedTokenRequest
// ---------------------------------------------------------------------------

/// A validated request for one embed token: the policy bound to concrete
/// `accessLevel`, `datasetIds`, `reportIds`, `identityUsername` and
/// `identityRoles`.
///
/// Always targets at least one report and at least one dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedTokenRequest {
    access_level: AccessLevel,
    dataset_ids: Vec<DatasetId>,
    report_ids: Vec<ReportId>,
    identity_username: String,
    identity_roles: Vec<String>,
    workspace_id: Option<WorkspaceId>,
}

impl EmbedTokenRequest {
    /// Bind `policy` to a report, its datasets and an optional workspace.
    ///
    /// # Errors
    ///
    /// [`ModelError::MissingField`] if `dataset_ids` is empty.
    pub fn new(
        policy: &EmbedTokenPolicy,
        report_id: ReportId,
        dataset_ids: Vec<DatasetId>,
        workspace_id: Option<WorkspaceId>,
    ) -> Result<Self, ModelError> {
        if dataset_ids.is_empty() {
            return Err(ModelError::MissingField {
                field: "datasetId".into(),
            });
        }

        Ok(Self {
            access_level: policy.access_level,
            dataset_ids,
            report_ids: vec![report_id],
            identity_username: policy.identity_username.clone(),
            identity_roles: policy.identity_roles.clone(),
            workspace_id,
        })
    }

    /// The primary report targeted by this request.
    pub fn report_id(&self) -> &ReportId {
        // `new` always stores exactly one report.
        &self.report_ids[0]
    }

    /// Datasets the token is scoped to.
    pub fn dataset_ids(&self) -> &[DatasetId] {
        &self.dataset_ids
    }

    /// Render the `GenerateToken` body sent to the reporting service.
    pub fn to_body(&self) -> GenerateTokenBody {
        let identities = if self.identity_username.is_empty() {
            Vec::new()
        } else {
            vec![EffectiveIdentity {
                username: self.identity_username.clone(),
                roles: self.identity_roles.clone(),
                datasets: self.dataset_ids.clone(),
            }]
        };

        GenerateTokenBody {
            access_level: self.access_level,
            datasets: self
                .dataset_ids
                .iter()
                .map(|id| DatasetEntry {
                    id: id.clone(),
                    xmla_permissions: XmlaPermissions::ReadOnly,
                })
                .collect(),
            reports: self
                .report_ids
                .iter()
                .map(|id| ReportEntry { id: id.clone() })
                .collect(),
            target_workspaces: self
                .workspace_id
                .iter()
                .map(|id| WorkspaceEntry { id: id.clone() })
                .collect(),
            identities,
        }
    }
}

// ---------------------------------------------------------------------------
// GenerateToken wire body
// ---------------------------------------------------------------------------

/// JSON body of the reporting service's `GenerateToken` call.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateTokenBody {
    /// Requested access level.
    #[serde(default)]
    pub access_level: AccessLevel,
    /// Datasets the token may query.
    #[serde(default)]
    pub datasets: Vec<DatasetEntry>,
    /// Reports the token may render.
    #[serde(default)]
    pub reports: Vec<ReportEntry>,
    /// Workspaces the token is scoped to.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub target_workspaces: Vec<WorkspaceEntry>,
    /// Effective identities for row-level security.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identities: Vec<EffectiveIdentity>,
}

/// A dataset reference inside [`GenerateTokenBody`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DatasetEntry {
    /// Dataset identifier.
    pub id: DatasetId,
    /// XMLA permission for this dataset.
    #[serde(default)]
    pub xmla_permissions: XmlaPermissions,
}

/// A report reference inside [`GenerateTokenBody`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    /// Report identifier.
    pub id: ReportId,
}

/// A workspace reference inside [`GenerateTokenBody`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceEntry {
    /// Workspace identifier.
    pub id: WorkspaceId,
}

/// Effective identity impersonated by the embed token.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct EffectiveIdentity {
    /// Principal name evaluated by row-level security rules.
    pub username: String,
    /// Roles the principal is a member of.
    pub roles: Vec<String>,
    /// Datasets the identity applies to.
    pub datasets: Vec<DatasetId>,
}

// ---------------------------------------------------------------------------
// EmbedToken
// ---------------------------------------------------------------------------

/// Embed token returned by the reporting service.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EmbedToken {
    /// Opaque token handed to the front-end viewer.
    pub token: String,
    /// Upstream identifier of the token, for audit purposes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_id: Option<String>,
    /// Expiry instant reported by the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(workspace: Option<&str>) -> EmbedTokenRequest {
        EmbedTokenRequest::new(
            &EmbedTokenPolicy::default(),
            ReportId::new("R").unwrap(),
            vec![DatasetId::new("D").unwrap()],
            workspace.map(|w| WorkspaceId::new(w).unwrap()),
        )
        .unwrap()
    }

    #[test]
    fn body_declares_readonly_datasets_and_admin_identity() {
        let body = serde_json::to_value(request(None).to_body()).unwrap();
        assert_eq!(
            body,
            json!({
                "accessLevel": "View",
                "datasets": [{ "id": "D", "xmlaPermissions": "ReadOnly" }],
                "reports": [{ "id": "R" }],
                "identities": [{
                    "username": "13026",
                    "roles": ["Admin"],
                    "datasets": ["D"]
                }]
            })
        );
    }

    #[test]
    fn body_targets_workspace_when_present() {
        let body = serde_json::to_value(request(Some("W")).to_body()).unwrap();
        assert_eq!(body["targetWorkspaces"], json!([{ "id": "W" }]));
    }

    #[test]
    fn empty_username_drops_identity_block() {
        let policy = EmbedTokenPolicy {
            identity_username: String::new(),
            ..EmbedTokenPolicy::default()
        };
        let req = EmbedTokenRequest::new(
            &policy,
            ReportId::new("R").unwrap(),
            vec![DatasetId::new("D").unwrap()],
            None,
        )
        .unwrap();
        let body = serde_json::to_value(req.to_body()).unwrap();
        assert!(body.get("identities").is_none());
    }

    #[test]
    fn request_requires_a_dataset() {
        let err = EmbedTokenRequest::new(
            &EmbedTokenPolicy::default(),
            ReportId::new("R").unwrap(),
            Vec::new(),
            None,
        )
        .unwrap_err();
        assert_eq!(
            err,
            ModelError::MissingField {
                field: "datasetId".into()
            }
        );
    }

    #[test]
    fn request_binds_policy_to_report_and_datasets() {
        let policy = EmbedTokenPolicy {
            access_level: AccessLevel::Edit,
            identity_username: "viewer".into(),
            identity_roles: vec!["Reader".into(), "Auditor".into()],
        };
        let req = EmbedTokenRequest::new(
            &policy,
            ReportId::new("R").unwrap(),
            vec![DatasetId::new("D1").unwrap(), DatasetId::new("D2").unwrap()],
            None,
        )
        .unwrap();
        assert_eq!(req.report_id().as_str(), "R");
        assert_eq!(req.dataset_ids().len(), 2);

        let body = serde_json::to_value(req.to_body()).unwrap();
        assert_eq!(body["accessLevel"], "Edit");
        assert_eq!(
            body["identities"],
            json!([{
                "username": "viewer",
                "roles": ["Reader", "Auditor"],
                "datasets": ["D1", "D2"]
            }])
        );
    }

    #[test]
    fn access_level_parses_case_insensitively() {
        assert_eq!(AccessLevel::parse("view").unwrap(), AccessLevel::View);
        assert_eq!(AccessLevel::parse(" EDIT ").unwrap(), AccessLevel::Edit);
        assert!(AccessLevel::parse("owner").is_err());
    }

    #[test]
    fn embed_token_tolerates_missing_optional_fields() {
        let token: EmbedToken = serde_json::from_value(json!({ "token": "E" })).unwrap();
        assert_eq!(token.token, "E");
        assert!(token.token_id.is_none());
        assert!(token.expiration.is_none());
    }

    #[test]
    fn embed_token_reads_expiration() {
        let token: EmbedToken = serde_json::from_value(json!({
            "token": "E",
            "tokenId": "id-1",
            "expiration": "2026-10-16T12:00:00Z"
        }))
        .unwrap();
        assert_eq!(token.token_id.as_deref(), Some("id-1"));
        assert_eq!(
            token.expiration.unwrap().to_rfc3339(),
            "2026-10-16T12:00:00+00:00"
        );
    }
}
