//! Wire types for the Zephyr and JIRA REST responses.
//!
//! JIRA reports entity ids as strings while ZAPI uses numbers; everything is
//! parsed down to `i64` at the boundary so the rest of the crate works with
//! one id type. Version id -1 is a real value (the "unscheduled" bucket).

use serde::{Deserialize, Serialize};

use super::error::{ApiError, Result};

/// A project record from `GET /rest/api/2/project`.
///
/// ZAPI's own project listing omits the key, which is the only name users
/// know projects by, so discovery goes through the JIRA endpoint instead.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectRecord {
    /// The project id (a stringified integer).
    pub id: String,
    /// The project key, e.g. "QA".
    pub key: String,
}

/// A fix version entry inside `GET /rest/api/2/project/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionRecord {
    pub id: String,
    pub name: String,
}

/// The subset of the JIRA project detail response we read.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectDetail {
    #[serde(default)]
    pub versions: Vec<VersionRecord>,
}

/// A folder record from `GET cycle/{id}/folders`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderRecord {
    pub folder_id: i64,
    pub folder_name: String,
}

/// A single execution entry. Everything beyond the id is passed through
/// untyped; callers that need the full record fetch it per execution.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionRecord {
    pub id: i64,
}

/// Response shape shared by the execution listing and the ZQL search.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionsResponse {
    #[serde(default)]
    pub executions: Vec<ExecutionRecord>,
}

/// Request body for moving executions into a folder.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveExecutionsPayload {
    pub project_id: i64,
    pub version_id: i64,
    pub schedules_list: Vec<i64>,
}

/// Parse a JIRA string id into an integer id.
pub(crate) fn parse_id(raw: &str, what: &str) -> Result<i64> {
    raw.parse().map_err(|_| {
        ApiError::InvalidResponse(format!("{} id is not an integer: {:?}", what, raw))
    })
}
