//! Zephyr API client and types.
//!
//! This module provides the interface for communicating with the Zephyr for
//! JIRA REST API.

mod auth;
mod client;
mod error;
mod resources;
mod session;
mod types;
pub mod validate;

pub use auth::Auth;
pub use client::Zephyr;
pub use error::{ApiError, Result};
pub use resources::{Cycle, Execution, Folder, Project, Version};
pub use session::Session;
