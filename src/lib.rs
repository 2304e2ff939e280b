//! Client library for the Zephyr for JIRA test management API (ZAPI).
//!
//! A [`Zephyr`] client authenticates a session against a JIRA instance
//! running the Zephyr plugin, discovers projects, versions, cycles, and
//! folders, searches test executions with ZQL, and moves executions between
//! folders. Construction performs a connection check, so a built client is
//! known to be reachable and authorized.
//!
//! The remote service sometimes reports permission failures inside a 200
//! response body instead of a proper 4xx status; the client normalizes those
//! into [`ApiError::Unauthorized`] so callers never mistake them for
//! successful empty results.
//!
//! # Example
//!
//! ```no_run
//! use zephyr::{Folder, Zephyr};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let client = Zephyr::with_credentials("https://jira.example.com", "jdoe", "hunter2").await?;
//!
//! let project = client.project("QA").await?;
//! println!("moving executions in project {}", project.key());
//!
//! let executions = client
//!     .executions_zql("project = QA AND cycleName = \"Smoke\"")
//!     .await?;
//! let destination = Folder::new(10204, 20418, 3447, 330);
//! client.move_executions(&executions, &destination).await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod logging;

pub use api::{ApiError, Auth, Cycle, Execution, Folder, Project, Session, Version, Zephyr};
pub use config::{Config, ConfigError};
