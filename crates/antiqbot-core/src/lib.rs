//! Core library for the AntiqBot antiques appraisal client.
//!
//! - [`api`]: HTTP client for the backend, one typed method per endpoint
//! - [`auth`]: persisted session and the session manager
//! - [`config`]: base URL and storage settings
//! - [`models`]: request and response types

pub mod api;
pub mod auth;
pub mod config;
pub mod models;

pub use api::{ApiClient, ApiRequest, ImageUpload, RequestError};
pub use auth::{SessionError, SessionManager, SessionStore};
pub use config::Config;
