//! Authentication module for managing the client session.
//!
//! This module provides:
//! - `SessionStore`: the session record and its companion cookie, with lazy expiry
//! - `Authenticator`: the login/signup form stub that opens and closes sessions
//!
//! Sessions last 24 hours by default, 30 days with "remember me".

pub mod login;
pub mod session;

pub use login::{Authenticator, LoginForm, SignupForm};
pub use session::{SessionRecord, SessionStore};
