//! The `auth-token` companion cookie.
//!
//! Route guards read this flag instead of parsing the full session record.
//! Its max-age mirrors the session TTL so both expire together. The jar keeps
//! cookies in the same storage scope as the record and evicts them once their
//! max-age has elapsed, the way a browser does.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::error::StorageError;
use crate::storage::KeyValueStorage;

/// Default companion cookie name
pub const AUTH_COOKIE_NAME: &str = "auth-token";

/// Length of the random opaque cookie value
const TOKEN_LENGTH: usize = 32;

/// Prefix for cookie slots in the backing storage
const COOKIE_KEY_PREFIX: &str = "cookie:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SameSite {
    #[default]
    Lax,
    Strict,
    None,
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SameSite::Lax => "Lax",
            SameSite::Strict => "Strict",
            SameSite::None => "None",
        };
        f.write_str(s)
    }
}

impl FromStr for SameSite {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lax" => Ok(SameSite::Lax),
            "strict" => Ok(SameSite::Strict),
            "none" => Ok(SameSite::None),
            other => Err(format!("unknown SameSite value: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthCookie {
    pub name: String,
    pub value: String,
    pub path: String,
    pub max_age_secs: i64,
    pub same_site: SameSite,
}

impl AuthCookie {
    pub fn new(name: &str, value: impl Into<String>, max_age_secs: i64, same_site: SameSite) -> Self {
        Self {
            name: name.to_string(),
            value: value.into(),
            path: "/".to_string(),
            max_age_secs,
            same_site,
        }
    }

    /// A cookie carrying a fresh random token
    pub fn generate(name: &str, max_age_secs: i64, same_site: SameSite) -> Self {
        let token: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(TOKEN_LENGTH)
            .map(char::from)
            .collect();
        Self::new(name, token, max_age_secs, same_site)
    }

    /// The cookie that unsets `name` when handed to a browser
    pub fn clearing(name: &str, same_site: SameSite) -> Self {
        Self::new(name, "", 0, same_site)
    }

    /// Render as a `Set-Cookie` header value
    pub fn to_header(&self) -> String {
        format!(
            "{}={}; path={}; max-age={}; SameSite={}",
            self.name, self.value, self.path, self.max_age_secs, self.same_site
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredCookie {
    value: String,
    path: String,
    same_site: SameSite,
    expires_at: DateTime<Utc>,
}

/// Cookie storage with max-age eviction on read.
///
/// Only `SessionStore` writes the auth cookie; everything else reads it.
#[derive(Clone)]
pub struct CookieJar {
    storage: Arc<dyn KeyValueStorage>,
    clock: Arc<dyn Clock>,
}

impl CookieJar {
    pub fn new(storage: Arc<dyn KeyValueStorage>, clock: Arc<dyn Clock>) -> Self {
        Self { storage, clock }
    }

    fn slot(name: &str) -> String {
        format!("{}{}", COOKIE_KEY_PREFIX, name)
    }

    pub(crate) fn set(&self, cookie: &AuthCookie) -> Result<(), StorageError> {
        let expires_at = self.clock.now() + Duration::seconds(cookie.max_age_secs.max(0));
        self.set_expiring_at(cookie, expires_at)
    }

    /// Store `cookie` with an explicit absolute expiry, so it can share the
    /// exact expiry instant of the session record it mirrors
    pub(crate) fn set_expiring_at(
        &self,
        cookie: &AuthCookie,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        if cookie.max_age_secs <= 0 {
            return self.remove(&cookie.name);
        }
        let stored = StoredCookie {
            value: cookie.value.clone(),
            path: cookie.path.clone(),
            same_site: cookie.same_site,
            expires_at,
        };
        let json = serde_json::to_string(&stored)
            .map_err(|e| StorageError::unavailable(self.storage.backend_name(), e))?;
        self.storage.set_item(&Self::slot(&cookie.name), &json)?;
        debug!(cookie = %cookie.name, max_age = cookie.max_age_secs, "Set cookie");
        Ok(())
    }

    pub(crate) fn remove(&self, name: &str) -> Result<(), StorageError> {
        self.storage.remove_item(&Self::slot(name))
    }

    /// Read a live cookie. Expired or unreadable cookies read as absent.
    pub fn get(&self, name: &str) -> Option<AuthCookie> {
        let raw = match self.storage.get_item(&Self::slot(name)) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                debug!(cookie = name, error = %e, "Failed to read cookie");
                return None;
            }
        };

        let stored: StoredCookie = match serde_json::from_str(&raw) {
            Ok(stored) => stored,
            Err(e) => {
                warn!(cookie = name, error = %e, "Discarding unreadable cookie");
                if let Err(e) = self.remove(name) {
                    debug!(cookie = name, error = %e, "Failed to remove unreadable cookie");
                }
                return None;
            }
        };

        // Live through the expiry instant itself, matching the session record
        let remaining = stored.expires_at - self.clock.now();
        if remaining < Duration::zero() {
            debug!(cookie = name, "Cookie max-age elapsed");
            if let Err(e) = self.remove(name) {
                debug!(cookie = name, error = %e, "Failed to evict expired cookie");
            }
            return None;
        }

        Some(AuthCookie {
            name: name.to_string(),
            value: stored.value,
            path: stored.path,
            max_age_secs: remaining.num_seconds(),
            same_site: stored.same_site,
        })
    }

    pub fn is_present(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::storage::MemoryStorage;

    fn jar() -> (CookieJar, ManualClock, Arc<MemoryStorage>) {
        let clock = ManualClock::starting_now();
        let storage = Arc::new(MemoryStorage::new());
        let jar = CookieJar::new(storage.clone(), Arc::new(clock.clone()));
        (jar, clock, storage)
    }

    #[test]
    fn test_header_format() {
        let cookie = AuthCookie::new(AUTH_COOKIE_NAME, "abc", 86400, SameSite::Lax);
        assert_eq!(cookie.to_header(), "auth-token=abc; path=/; max-age=86400; SameSite=Lax");

        let clearing = AuthCookie::clearing(AUTH_COOKIE_NAME, SameSite::Strict);
        assert_eq!(clearing.to_header(), "auth-token=; path=/; max-age=0; SameSite=Strict");
    }

    #[test]
    fn test_generated_tokens_are_random() {
        let a = AuthCookie::generate(AUTH_COOKIE_NAME, 60, SameSite::Lax);
        let b = AuthCookie::generate(AUTH_COOKIE_NAME, 60, SameSite::Lax);
        assert_eq!(a.value.len(), TOKEN_LENGTH);
        assert!(a.value.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a.value, b.value);
    }

    #[test]
    fn test_same_site_parse() {
        assert_eq!("strict".parse::<SameSite>().unwrap(), SameSite::Strict);
        assert_eq!("LAX".parse::<SameSite>().unwrap(), SameSite::Lax);
        assert!("sometimes".parse::<SameSite>().is_err());
    }

    #[test]
    fn test_cookie_expires_with_max_age() {
        let (jar, clock, storage) = jar();
        jar.set(&AuthCookie::new(AUTH_COOKIE_NAME, "tok", 3600, SameSite::Lax)).unwrap();

        clock.advance(Duration::minutes(30));
        let live = jar.get(AUTH_COOKIE_NAME).unwrap();
        assert_eq!(live.value, "tok");
        assert_eq!(live.max_age_secs, 1800);

        clock.advance(Duration::minutes(31));
        assert!(!jar.is_present(AUTH_COOKIE_NAME));
        assert!(storage.is_empty());
    }

    #[test]
    fn test_cookie_live_at_exact_max_age() {
        let (jar, clock, _storage) = jar();
        jar.set(&AuthCookie::new(AUTH_COOKIE_NAME, "tok", 60, SameSite::Lax)).unwrap();

        clock.advance(Duration::seconds(60));
        assert_eq!(jar.get(AUTH_COOKIE_NAME).unwrap().max_age_secs, 0);

        clock.advance(Duration::milliseconds(1));
        assert!(jar.get(AUTH_COOKIE_NAME).is_none());
    }

    #[test]
    fn test_zero_max_age_removes_cookie() {
        let (jar, _clock, _storage) = jar();
        jar.set(&AuthCookie::new(AUTH_COOKIE_NAME, "tok", 3600, SameSite::Lax)).unwrap();
        jar.set(&AuthCookie::clearing(AUTH_COOKIE_NAME, SameSite::Lax)).unwrap();
        assert!(jar.get(AUTH_COOKIE_NAME).is_none());
    }

    #[test]
    fn test_garbage_cookie_reads_as_absent() {
        let (jar, _clock, storage) = jar();
        storage.set_item("cookie:auth-token", "not json").unwrap();
        assert!(jar.get(AUTH_COOKIE_NAME).is_none());
        assert!(!storage.contains_key("cookie:auth-token"));
    }
}
