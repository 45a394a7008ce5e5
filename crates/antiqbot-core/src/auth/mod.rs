//! Authentication module for managing the user session.
//!
//! This module provides:
//! - `SessionStore`: persisted credential + profile under fixed keys
//! - `Storage` backends: files in the cache directory, the OS keychain, or memory
//! - `SessionManager`: login/register/logout on top of an `ApiClient`
//!
//! A session lives until logout or until the backend rejects its credential.

pub mod manager;
pub mod session;
pub mod storage;

pub use manager::{AccountSnapshot, SessionError, SessionManager};
pub use session::{Session, SessionStore, TOKEN_KEY, USER_KEY};
pub use storage::{FileStorage, KeyringStorage, MemoryStorage, Storage};
