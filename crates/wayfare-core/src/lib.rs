//! Core library for wayfare.
//!
//! Wayfare's web client keeps its login state on the client: a session record
//! in durable storage plus an `auth-token` companion cookie that the route
//! guard reads before each navigation. This crate provides:
//! - `SessionStore`: expiry-aware reads and writes of the session record
//! - `storage`: pluggable key-value backends (memory, files, OS keychain)
//! - `CookieJar` / `AuthCookie`: the companion flag with max-age semantics
//! - `RouteGuard`: redirect decisions for protected and auth-only paths
//! - `Authenticator`: the login/signup form stub that opens sessions
//! - `Config`: on-disk configuration and environment overrides

pub mod auth;
pub mod clock;
pub mod config;
pub mod cookie;
pub mod error;
pub mod guard;
pub mod storage;
pub mod utils;

pub use auth::{Authenticator, LoginForm, SessionRecord, SessionStore, SignupForm};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Config, SessionConfig, StorageBackend};
pub use cookie::{AuthCookie, CookieJar, SameSite};
pub use error::{AuthError, SessionError, StorageError};
pub use guard::{GuardDecision, RouteGuard};
pub use storage::{FileStorage, KeyValueStorage, KeyringStorage, MemoryStorage};
