//! Test-management resources and the navigation between them.
//!
//! The hierarchy runs Project, Version, Cycle, Folder, then Execution. Each
//! resource holds a clone of the shared [`Session`] so further calls stay
//! scoped to the instance it came from. Navigation methods are plain
//! fetches; nothing below the project listing is memoized.

use serde_json::Value;
use tracing::debug;

use super::error::{ApiError, Result};
use super::session::Session;
use super::types::{parse_id, FolderRecord, ProjectDetail};

/// Find the single item whose key matches `name` exactly.
///
/// Matching is case-sensitive. Zero matches and multiple matches are both
/// reported as descriptive errors rather than being folded into one.
pub(crate) fn find_unique<'a, T>(
    items: &'a [T],
    what: &str,
    name: &str,
    key: impl Fn(&T) -> &str,
) -> Result<&'a T> {
    let mut matches = items.iter().filter(|item| key(item) == name);
    match (matches.next(), matches.next()) {
        (Some(item), None) => Ok(item),
        (None, _) => Err(ApiError::NotFound(format!("{} \"{}\"", what, name))),
        (Some(_), Some(_)) => Err(ApiError::Ambiguous(format!(
            "{} \"{}\" matches more than one entry",
            what, name
        ))),
    }
}

/// A JIRA project, the top of the resource hierarchy.
///
/// Identified by its key (the name users know it by), distinct from the
/// integer id the APIs use internally.
#[derive(Debug, Clone)]
pub struct Project {
    id: i64,
    key: String,
    session: Session,
}

impl Project {
    pub(crate) fn new(id: i64, key: String, session: Session) -> Self {
        Self { id, key, session }
    }

    /// The integer project id.
    pub fn id(&self) -> i64 {
        self.id
    }

    /// The project key, e.g. "QA".
    pub fn key(&self) -> &str {
        &self.key
    }

    /// List the fix versions of this project.
    pub async fn versions(&self) -> Result<Vec<Version>> {
        let url = self.session.jira_url(&format!("project/{}", self.id));
        let detail: ProjectDetail = self.session.get_json(&url).await?;

        let mut versions = Vec::with_capacity(detail.versions.len());
        for record in detail.versions {
            versions.push(Version {
                id: parse_id(&record.id, "version")?,
                name: record.name,
                project_id: self.id,
                session: self.session.clone(),
            });
        }
        debug!(project = %self.key, count = versions.len(), "loaded versions");
        Ok(versions)
    }

    /// Find a fix version by name.
    pub async fn version(&self, name: &str) -> Result<Version> {
        let versions = self.versions().await?;
        find_unique(&versions, "version", name, |v| v.name()).map(Version::clone)
    }
}

/// A fix version within a project.
#[derive(Debug, Clone)]
pub struct Version {
    id: i64,
    name: String,
    project_id: i64,
    session: Session,
}

impl Version {
    /// The version id. -1 denotes the unscheduled bucket.
    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn project_id(&self) -> i64 {
        self.project_id
    }

    /// List the test cycles under this version.
    ///
    /// The listing comes back as an object keyed by cycle id with one extra
    /// `recordsCount` entry that has to be skipped.
    pub async fn cycles(&self) -> Result<Vec<Cycle>> {
        let url = self.session.zapi_url(&format!(
            "cycle?projectId={}&versionId={}",
            self.project_id, self.id
        ));
        let listing: Value = self.session.get_json(&url).await?;
        let entries = listing.as_object().ok_or_else(|| {
            ApiError::InvalidResponse("cycle listing is not a JSON object".to_string())
        })?;

        let mut cycles = Vec::new();
        for (raw_id, entry) in entries {
            if raw_id == "recordsCount" {
                continue;
            }
            let name = entry
                .get("name")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    ApiError::InvalidResponse(format!("cycle {} has no name", raw_id))
                })?;
            cycles.push(Cycle {
                id: parse_id(raw_id, "cycle")?,
                name: name.to_string(),
                project_id: self.project_id,
                version_id: self.id,
                session: self.session.clone(),
            });
        }
        debug!(version = %self.name, count = cycles.len(), "loaded cycles");
        Ok(cycles)
    }

    /// Find a cycle by name.
    pub async fn cycle(&self, name: &str) -> Result<Cycle> {
        let cycles = self.cycles().await?;
        find_unique(&cycles, "cycle", name, |c| c.name()).map(Cycle::clone)
    }
}

/// A test cycle within a version.
#[derive(Debug, Clone)]
pub struct Cycle {
    id: i64,
    name: String,
    project_id: i64,
    version_id: i64,
    session: Session,
}

impl Cycle {
    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn project_id(&self) -> i64 {
        self.project_id
    }

    pub fn version_id(&self) -> i64 {
        self.version_id
    }

    /// List the folders grouped under this cycle.
    pub async fn folders(&self) -> Result<Vec<Folder>> {
        let url = self.session.zapi_url(&format!(
            "cycle/{}/folders?projectId={}&versionId={}",
            self.id, self.project_id, self.version_id
        ));
        let records: Vec<FolderRecord> = self.session.get_json(&url).await?;

        let folders = records
            .into_iter()
            .map(|record| Folder {
                project_id: self.project_id,
                version_id: self.version_id,
                cycle_id: self.id,
                id: record.folder_id,
                name: Some(record.folder_name),
            })
            .collect::<Vec<_>>();
        debug!(cycle = %self.name, count = folders.len(), "loaded folders");
        Ok(folders)
    }

    /// Find a folder by name.
    pub async fn folder(&self, name: &str) -> Result<Folder> {
        let folders = self.folders().await?;
        find_unique(&folders, "folder", name, |f| f.name().unwrap_or_default()).map(Folder::clone)
    }
}

/// A folder grouping executions within a cycle.
///
/// Unlike the other resources this is a plain value: callers that already
/// know the four identifiers can construct one directly, and it is not
/// validated against the server before use. Execution queries below the
/// cycle level all go through a folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Folder {
    project_id: i64,
    version_id: i64,
    cycle_id: i64,
    id: i64,
    name: Option<String>,
}

impl Folder {
    /// Build a folder reference from known identifiers.
    pub fn new(project_id: i64, version_id: i64, cycle_id: i64, folder_id: i64) -> Self {
        Self {
            project_id,
            version_id,
            cycle_id,
            id: folder_id,
            name: None,
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    /// The folder display name, when the folder came from a listing.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn project_id(&self) -> i64 {
        self.project_id
    }

    pub fn version_id(&self) -> i64 {
        self.version_id
    }

    pub fn cycle_id(&self) -> i64 {
        self.cycle_id
    }
}

/// A single test-execution record.
#[derive(Debug, Clone)]
pub struct Execution {
    id: i64,
    session: Session,
}

impl Execution {
    pub(crate) fn new(id: i64, session: Session) -> Self {
        Self { id, session }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    /// Fetch the full execution record.
    ///
    /// The shape varies across Zephyr deployments, so the record is returned
    /// as opaque JSON.
    pub async fn raw(&self) -> Result<Value> {
        let url = self.session.zapi_url(&format!("execution/{}", self.id));
        self.session.get_json(&url).await
    }

    /// Fetch the step results recorded for this execution.
    pub async fn steps(&self) -> Result<Vec<Value>> {
        let url = self
            .session
            .zapi_url(&format!("stepResult?executionId={}", self.id));
        self.session.get_json(&url).await
    }
}
