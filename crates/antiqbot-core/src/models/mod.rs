//! Data models for AntiqBot entities.
//!
//! The backend owns all of these records. The client only keeps cached
//! copies, so every model preserves fields it does not know about and
//! round-trips them unchanged.
//!
//! - `UserProfile`, `ProfileUpdate`: account data
//! - `Credits`: credit balance
//! - `AnalysisResult`: appraisal returned for an uploaded image
//! - Auth payloads: `LoginRequest`, `RegisterRequest`, `AuthResponse`
//! - `value`: lenient readers for fields of uncertain JSON type

pub mod analysis;
pub mod auth;
pub mod credits;
pub mod user;
pub mod value;

pub use analysis::AnalysisResult;
pub use auth::{AuthResponse, LoginRequest, RegisterRequest};
pub use credits::Credits;
pub use user::{ProfileUpdate, UserId, UserProfile};
