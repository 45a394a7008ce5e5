//! REST API client module for the AntiqBot backend.
//!
//! This module provides the `ApiClient` for uploading images for appraisal
//! and reading account, credit and analysis data.
//!
//! The API uses bearer token authentication; the token is issued by
//! `/auth/login` or `/auth/register`.

pub mod client;
pub mod error;
pub mod request;
pub mod upload;

pub use client::{ApiClient, DEFAULT_API_URL};
pub use error::RequestError;
pub use request::ApiRequest;
pub use upload::ImageUpload;
