//! Zephyr API client implementation.
//!
//! This module provides the main client for interacting with the Zephyr for
//! JIRA REST API (ZAPI). It handles authentication, the construction-time
//! connection check, lazy project discovery, execution search, and moving
//! executions between folders.

use std::time::Duration;

use reqwest::StatusCode;
use tokio::sync::OnceCell;
use tracing::{debug, error, info, instrument, warn};

use super::auth::Auth;
use super::error::{ApiError, Result};
use super::resources::{find_unique, Execution, Folder, Project};
use super::session::Session;
use super::types::{parse_id, ExecutionsResponse, MoveExecutionsPayload, ProjectRecord};
use super::validate;
use crate::config::Config;

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// The lightweight request used for the connection check. An authorized
/// server answers this intentionally empty expansion with HTTP 400.
const EMPTY_CYCLES_REQUEST: &str = "cycle?expand=";

/// The Zephyr API client.
///
/// Construction performs a connectivity and authentication check, so a
/// successfully built client is known to be able to reach the server. The
/// project collection is discovered lazily on first access and memoized for
/// the client's lifetime.
#[derive(Debug)]
pub struct Zephyr {
    /// The shared transport session.
    session: Session,
    /// Lazily loaded project collection. The once-cell guards the
    /// check-then-load transition, so concurrent first reads trigger a
    /// single discovery call.
    projects: OnceCell<Vec<Project>>,
}

impl Zephyr {
    /// Create a client from a configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The HTTP client cannot be built
    /// - The server is unreachable
    /// - The credentials are rejected
    #[instrument(skip(config), fields(server = %config.server))]
    pub async fn connect(config: &Config) -> Result<Self> {
        info!("Creating Zephyr client");

        let auth = Auth::new(&config.username, &config.password);
        let session = Session::new(&config.server, auth, config.verify_tls, config.timeout())?;

        Self::from_session(session).await
    }

    /// Create a client with explicit credentials and default settings.
    ///
    /// TLS verification is on and the default timeout applies; use
    /// [`Zephyr::connect`] with a [`Config`] to control either.
    pub async fn with_credentials(server: &str, username: &str, password: &str) -> Result<Self> {
        let auth = Auth::new(username, password);
        let session = Session::new(
            server,
            auth,
            true,
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        )?;

        Self::from_session(session).await
    }

    async fn from_session(session: Session) -> Result<Self> {
        let client = Self {
            session,
            projects: OnceCell::new(),
        };

        client.check_connection().await?;
        info!("Zephyr client created and connection validated");
        Ok(client)
    }

    /// Verify that the server is reachable and the credentials are accepted.
    ///
    /// Issues a minimal cycle listing request. This verifies that:
    /// - The server is reachable and answers ZAPI requests
    /// - The credentials are valid, including the disguised
    ///   200-with-error-body rejection
    #[instrument(skip(self))]
    async fn check_connection(&self) -> Result<()> {
        debug!("Checking Zephyr connection");

        let url = self.session.zapi_url(EMPTY_CYCLES_REQUEST);
        let (status, body) = self.session.get_raw(&url).await.map_err(|e| {
            error!("Connection check failed: {}", e);
            ApiError::ConnectionFailed(format!(
                "cannot connect to {}: {}",
                self.session.server(),
                e
            ))
        })?;

        if status == StatusCode::BAD_REQUEST {
            return Ok(());
        }
        validate::check_response(status, &body)
    }

    /// The lazily loaded project collection.
    ///
    /// The first call performs the discovery request; later calls return the
    /// memoized collection. There is no refresh: a new client sees new
    /// projects, an existing one does not.
    pub async fn projects(&self) -> Result<&[Project]> {
        let projects = self
            .projects
            .get_or_try_init(|| self.load_projects())
            .await?;
        Ok(projects.as_slice())
    }

    /// Load the project list through the plain JIRA REST surface.
    ///
    /// ZAPI's own project listing does not carry project keys, so discovery
    /// has to go through `/rest/api/2/project` instead.
    async fn load_projects(&self) -> Result<Vec<Project>> {
        debug!("Loading project list");

        let url = self.session.jira_url("project");
        let records: Vec<ProjectRecord> = self.session.get_json(&url).await?;

        let mut projects = Vec::with_capacity(records.len());
        for record in records {
            projects.push(Project::new(
                parse_id(&record.id, "project")?,
                record.key,
                self.session.clone(),
            ));
        }
        info!(count = projects.len(), "Project list loaded");
        Ok(projects)
    }

    /// Find a project by key (also known as its name), not by integer id.
    ///
    /// Matching is exact and case-sensitive.
    #[instrument(skip(self))]
    pub async fn project(&self, name: &str) -> Result<&Project> {
        let projects = self.projects().await?;
        find_unique(projects, "project", name, |p| p.key())
    }

    /// Get a handle to an execution by id.
    ///
    /// The id is not validated against the server.
    pub fn execution(&self, id: i64) -> Execution {
        Execution::new(id, self.session.clone())
    }

    /// Search for executions using ZQL.
    ///
    /// The query is URL-encoded before being embedded in the request.
    #[instrument(skip(self), fields(query = %query))]
    pub async fn executions_zql(&self, query: &str) -> Result<Vec<Execution>> {
        debug!("Searching executions");

        let url = self.session.zapi_url(&format!(
            "zql/executeSearch?zqlQuery={}",
            urlencoding::encode(query)
        ));
        let result: ExecutionsResponse = self.session.get_json(&url).await?;

        debug!(count = result.executions.len(), "ZQL search complete");
        Ok(result
            .executions
            .into_iter()
            .map(|record| Execution::new(record.id, self.session.clone()))
            .collect())
    }

    /// List the executions grouped under a folder.
    #[instrument(skip(self, folder), fields(folder_id = folder.id()))]
    pub async fn folder_executions(&self, folder: &Folder) -> Result<Vec<Execution>> {
        let url = self.session.zapi_url(&executions_path(folder));
        let result: ExecutionsResponse = self.session.get_json(&url).await?;

        Ok(result
            .executions
            .into_iter()
            .map(|record| Execution::new(record.id, self.session.clone()))
            .collect())
    }

    /// Move executions into a destination folder.
    ///
    /// The payload carries the destination's project and version ids and the
    /// execution ids in input order. A 200 response completes silently; any
    /// other status raises with the raw response attached.
    #[instrument(skip(self, executions, destination), fields(count = executions.len(), folder_id = destination.id()))]
    pub async fn move_executions(
        &self,
        executions: &[Execution],
        destination: &Folder,
    ) -> Result<()> {
        let url = self.session.zapi_url(&format!(
            "cycle/{}/move/executions/folder/{}",
            destination.cycle_id(),
            destination.id()
        ));
        let payload = MoveExecutionsPayload {
            project_id: destination.project_id(),
            version_id: destination.version_id(),
            schedules_list: executions.iter().map(Execution::id).collect(),
        };

        let response = self.session.put(&url, &payload).await?;
        if response.status() != StatusCode::OK {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(%status, "Move executions rejected");
            return Err(ApiError::MoveFailed { status, body });
        }

        info!(count = payload.schedules_list.len(), "Executions moved");
        Ok(())
    }

    /// Diagnostic helper: hammer the execution listing of a folder.
    ///
    /// Issues the listing `calls` times and collects the bodies of non-200
    /// responses for manual inspection instead of raising. Transport
    /// failures still propagate.
    pub async fn stress_check(&self, folder: &Folder, calls: usize) -> Result<Vec<String>> {
        let url = self.session.zapi_url(&executions_path(folder));

        let mut failed = Vec::new();
        for _ in 0..calls {
            let (status, body) = self.session.get_raw(&url).await?;
            if status != StatusCode::OK {
                failed.push(body);
            }
        }
        if !failed.is_empty() {
            warn!(failed = failed.len(), calls, "Stress check saw failing responses");
        }
        Ok(failed)
    }

    /// Get the normalized server URL.
    pub fn server(&self) -> &str {
        self.session.server()
    }
}

/// The execution listing path for a folder.
fn executions_path(folder: &Folder) -> String {
    format!(
        "execution/?projectId={}&versionId={}&cycleId={}&folderId={}",
        folder.project_id(),
        folder.version_id(),
        folder.cycle_id(),
        folder.id()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PERMISSION_BODY: &str =
        r#"{"errorDesc": "You do not have the permission to make this request. Login Required.", "errorId": "ERROR"}"#;

    /// Mount the connection-check endpoint answering the way an authorized
    /// server does.
    async fn mount_connection_check(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/rest/zapi/latest/cycle"))
            .and(query_param("expand", ""))
            .respond_with(ResponseTemplate::new(400))
            .mount(server)
            .await;
    }

    async fn connect(server: &MockServer) -> Zephyr {
        Zephyr::with_credentials(&server.uri(), "jdoe", "hunter2")
            .await
            .expect("client")
    }

    #[tokio::test]
    async fn test_connect_succeeds_against_authorized_server() {
        let server = MockServer::start().await;
        mount_connection_check(&server).await;

        let client = connect(&server).await;
        assert_eq!(client.server(), server.uri());
    }

    #[tokio::test]
    async fn test_connect_fails_on_401_and_stops() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let result = Zephyr::with_credentials(&server.uri(), "jdoe", "wrong").await;
        assert!(matches!(result, Err(ApiError::Unauthorized)));

        // Construction fails on the check itself; nothing else is attempted.
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
    }

    #[tokio::test]
    async fn test_connect_fails_on_disguised_permission_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PERMISSION_BODY))
            .mount(&server)
            .await;

        let result = Zephyr::with_credentials(&server.uri(), "jdoe", "hunter2").await;
        assert!(matches!(result, Err(ApiError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_connect_fails_when_server_unreachable() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener); // release the port so the request fails to connect
        let url = format!("http://{}", addr);

        let result = Zephyr::with_credentials(&url, "jdoe", "hunter2").await;
        assert!(matches!(result, Err(ApiError::ConnectionFailed(_))));
    }

    #[tokio::test]
    async fn test_projects_discovered_exactly_once() {
        let server = MockServer::start().await;
        mount_connection_check(&server).await;
        Mock::given(method("GET"))
            .and(path("/rest/api/2/project"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "10204", "key": "QA", "name": "Quality Assurance"},
                {"id": "10205", "key": "OPS", "name": "Operations"},
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let client = connect(&server).await;

        let first = client.projects().await.expect("projects");
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].key(), "QA");
        assert_eq!(first[0].id(), 10204);

        // Second read and a lookup both serve from the memoized collection;
        // the expect(1) above verifies the discovery call count on drop.
        let second = client.projects().await.expect("projects");
        assert_eq!(second.len(), 2);
        let project = client.project("OPS").await.expect("project");
        assert_eq!(project.id(), 10205);
    }

    #[tokio::test]
    async fn test_project_lookup_is_exact_and_case_sensitive() {
        let server = MockServer::start().await;
        mount_connection_check(&server).await;
        Mock::given(method("GET"))
            .and(path("/rest/api/2/project"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "10204", "key": "QA"},
            ])))
            .mount(&server)
            .await;

        let client = connect(&server).await;
        assert!(client.project("QA").await.is_ok());
        assert!(matches!(
            client.project("qa").await,
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(
            client.project("UNKNOWN").await,
            Err(ApiError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_project_lookup_reports_ambiguity() {
        let server = MockServer::start().await;
        mount_connection_check(&server).await;
        Mock::given(method("GET"))
            .and(path("/rest/api/2/project"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "10204", "key": "QA"},
                {"id": "10205", "key": "QA"},
            ])))
            .mount(&server)
            .await;

        let client = connect(&server).await;
        assert!(matches!(
            client.project("QA").await,
            Err(ApiError::Ambiguous(_))
        ));
    }

    #[tokio::test]
    async fn test_executions_zql_encodes_query() {
        let server = MockServer::start().await;
        mount_connection_check(&server).await;
        Mock::given(method("GET"))
            .and(path("/rest/zapi/latest/zql/executeSearch"))
            .and(query_param("zqlQuery", "project = QA AND cycleName = \"Smoke\""))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "executions": [{"id": 63201}, {"id": 63202}],
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = connect(&server).await;
        let executions = client
            .executions_zql("project = QA AND cycleName = \"Smoke\"")
            .await
            .expect("executions");

        let ids: Vec<i64> = executions.iter().map(Execution::id).collect();
        assert_eq!(ids, vec![63201, 63202]);
    }

    #[tokio::test]
    async fn test_executions_zql_rejects_permission_payload() {
        let server = MockServer::start().await;
        mount_connection_check(&server).await;
        Mock::given(method("GET"))
            .and(path("/rest/zapi/latest/zql/executeSearch"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PERMISSION_BODY))
            .mount(&server)
            .await;

        let client = connect(&server).await;
        let result = client.executions_zql("project = QA").await;
        assert!(matches!(result, Err(ApiError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_move_executions_payload_and_url() {
        let server = MockServer::start().await;
        mount_connection_check(&server).await;
        Mock::given(method("PUT"))
            .and(path("/rest/zapi/latest/cycle/3447/move/executions/folder/330"))
            .and(body_json(json!({
                "projectId": 10204,
                "versionId": 20418,
                "schedulesList": [63202, 63201],
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = connect(&server).await;
        let folder = Folder::new(10204, 20418, 3447, 330);
        let executions = vec![client.execution(63202), client.execution(63201)];

        client
            .move_executions(&executions, &folder)
            .await
            .expect("move");
    }

    #[tokio::test]
    async fn test_move_executions_failure_carries_response() {
        let server = MockServer::start().await;
        mount_connection_check(&server).await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(500).set_body_string("folder is gone"))
            .mount(&server)
            .await;

        let client = connect(&server).await;
        let folder = Folder::new(10204, 20418, 3447, 330);
        let executions = vec![client.execution(63201)];

        match client.move_executions(&executions, &folder).await {
            Err(ApiError::MoveFailed { status, body }) => {
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(body, "folder is gone");
            }
            other => panic!("expected MoveFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_folder_executions_query_parameters() {
        let server = MockServer::start().await;
        mount_connection_check(&server).await;
        Mock::given(method("GET"))
            .and(path("/rest/zapi/latest/execution/"))
            .and(query_param("projectId", "10204"))
            .and(query_param("versionId", "20418"))
            .and(query_param("cycleId", "3447"))
            .and(query_param("folderId", "330"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "executions": [{"id": 63201}],
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = connect(&server).await;
        let folder = Folder::new(10204, 20418, 3447, 330);
        let executions = client.folder_executions(&folder).await.expect("executions");
        assert_eq!(executions.len(), 1);
        assert_eq!(executions[0].id(), 63201);
    }

    #[tokio::test]
    async fn test_stress_check_collects_failures_without_raising() {
        let server = MockServer::start().await;
        mount_connection_check(&server).await;
        Mock::given(method("GET"))
            .and(path("/rest/zapi/latest/execution/"))
            .respond_with(ResponseTemplate::new(500).set_body_string("overloaded"))
            .expect(3)
            .mount(&server)
            .await;

        let client = connect(&server).await;
        let folder = Folder::new(10204, 20418, 3447, 330);
        let failed = client.stress_check(&folder, 3).await.expect("probe");
        assert_eq!(failed, vec!["overloaded"; 3]);
    }
}
