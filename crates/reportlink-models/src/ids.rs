//! Reporting-service identifiers.
//!
//! Reports, datasets and workspaces are all addressed by opaque strings
//! (GUIDs in practice).  Each gets its own newtype so a dataset id can never
//! be passed where a report id is expected.  Construction trims surrounding
//! whitespace and rejects empty values.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Create a new identifier, rejecting empty or blank input.
            pub fn new(id: &str) -> Result<Self, ModelError> {
                let trimmed = id.trim();
                if trimmed.is_empty() {
                    return Err(ModelError::EmptyIdentifier {
                        kind: $kind.to_string(),
                    });
                }
                Ok(Self(trimmed.to_string()))
            }

            /// Return the inner string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = ModelError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                Self::new(&s)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

string_id!(
    /// Identifier of a report.
    ///
    /// # Examples
    ///
    /// ```
    /// use reportlink_models::ReportId;
    ///
    /// let id = ReportId::new(" c2a5cf8c ").unwrap();
    /// assert_eq!(id.as_str(), "c2a5cf8c");
    /// assert!(ReportId::new("  ").is_err());
    /// ```
    ReportId,
    "reportId"
);

string_id!(
    /// Identifier of a dataset (semantic model) backing one or more reports.
    DatasetId,
    "datasetId"
);

string_id!(
    /// Identifier of a workspace, called a "group" by the reporting service.
    WorkspaceId,
    "workspaceId"
);

/// Parse a comma-separated list of identifiers.
///
/// Blank entries between commas are skipped; a list with no usable entry
/// is rejected with [`ModelError::MissingField`] naming `field`.
///
/// ```
/// use reportlink_models::{parse_id_list, DatasetId};
///
/// let ids: Vec<DatasetId> = parse_id_list("a, b,,", "datasetId").unwrap();
/// assert_eq!(ids.len(), 2);
/// ```
pub fn parse_id_list<T>(raw: &str, field: &str) -> Result<Vec<T>, ModelError>
where
    T: FromStr<Err = ModelError>,
{
    let ids = raw
        .split(',')
        .filter(|part| !part.trim().is_empty())
        .map(str::parse)
        .collect::<Result<Vec<T>, _>>()?;

    if ids.is_empty() {
        return Err(ModelError::MissingField {
            field: field.to_string(),
        });
    }
    Ok(ids)
}
