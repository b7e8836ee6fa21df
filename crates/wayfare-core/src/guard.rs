//! Route guard for the web client.
//!
//! Runs before each navigation: unauthenticated visitors to protected pages
//! are sent to the login page (with a `redirect` back-link), and signed-in
//! users are bounced off the login/signup pages.

use tracing::debug;

use crate::auth::SessionStore;
use crate::cookie::{CookieJar, AUTH_COOKIE_NAME};

const DEFAULT_PROTECTED: &[&str] = &["/account", "/host", "/messages", "/trips", "/wishlists"];
const DEFAULT_AUTH_PAGES: &[&str] = &["/login", "/signup"];
const DEFAULT_LOGIN_PATH: &str = "/login";
const DEFAULT_HOME_PATH: &str = "/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    RedirectToLogin { location: String },
    RedirectHome { location: String },
}

impl GuardDecision {
    pub fn location(&self) -> Option<&str> {
        match self {
            GuardDecision::Allow => None,
            GuardDecision::RedirectToLogin { location } | GuardDecision::RedirectHome { location } => {
                Some(location)
            }
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, GuardDecision::Allow)
    }
}

#[derive(Debug, Clone)]
pub struct RouteGuard {
    protected: Vec<String>,
    auth_pages: Vec<String>,
    login_path: String,
    home_path: String,
    cookie_name: String,
}

impl Default for RouteGuard {
    fn default() -> Self {
        Self {
            protected: DEFAULT_PROTECTED.iter().map(|p| p.to_string()).collect(),
            auth_pages: DEFAULT_AUTH_PAGES.iter().map(|p| p.to_string()).collect(),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            home_path: DEFAULT_HOME_PATH.to_string(),
            cookie_name: AUTH_COOKIE_NAME.to_string(),
        }
    }
}

impl RouteGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_protected(mut self, prefixes: &[&str]) -> Self {
        self.protected = prefixes.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn with_cookie_name(mut self, name: &str) -> Self {
        self.cookie_name = name.to_string();
        self
    }

    pub fn decide(&self, path: &str, authenticated: bool) -> GuardDecision {
        let target = strip_fragment(path);
        let route = strip_query(target);

        let decision = if !authenticated && self.protected.iter().any(|p| is_under(route, p)) {
            GuardDecision::RedirectToLogin {
                location: format!(
                    "{}?redirect={}",
                    self.login_path,
                    urlencoding::encode(target)
                ),
            }
        } else if authenticated && self.auth_pages.iter().any(|p| is_under(route, p)) {
            GuardDecision::RedirectHome {
                location: self.home_path.clone(),
            }
        } else {
            GuardDecision::Allow
        };

        debug!(path = route, authenticated, ?decision, "Route guard decision");
        decision
    }

    /// Full check: reads the session record, evicting it if expired
    pub fn check_session(&self, store: &SessionStore, path: &str) -> GuardDecision {
        self.decide(path, store.is_valid())
    }

    /// Flag-only check: looks at the companion cookie without parsing the record
    pub fn check_cookie(&self, cookies: &CookieJar, path: &str) -> GuardDecision {
        self.decide(path, cookies.is_present(&self.cookie_name))
    }
}

fn strip_fragment(path: &str) -> &str {
    path.split('#').next().unwrap_or(path)
}

fn strip_query(path: &str) -> &str {
    path.split('?').next().unwrap_or(path)
}

/// Segment-aware prefix match: `/host/listings` is under `/host`, `/hosting` is not
fn is_under(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/') || prefix.ends_with('/'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::Duration;

    use crate::clock::ManualClock;
    use crate::config::SessionConfig;
    use crate::storage::MemoryStorage;

    #[test]
    fn test_is_under() {
        assert!(is_under("/host", "/host"));
        assert!(is_under("/host/listings/12", "/host"));
        assert!(!is_under("/hosting", "/host"));
        assert!(!is_under("/", "/host"));
        assert!(is_under("/anything", "/"));
    }

    #[test]
    fn test_unauthenticated_protected_redirects_to_login() {
        let guard = RouteGuard::new();
        let decision = guard.decide("/trips/upcoming?tab=2#top", false);
        assert_eq!(
            decision,
            GuardDecision::RedirectToLogin {
                location: "/login?redirect=%2Ftrips%2Fupcoming%3Ftab%3D2".to_string()
            }
        );
        assert!(!decision.is_allowed());
    }

    #[test]
    fn test_public_pages_always_allowed() {
        let guard = RouteGuard::new();
        for path in ["/", "/rooms/42", "/experiences", "/hosting"] {
            assert!(guard.decide(path, false).is_allowed());
            assert!(guard.decide(path, true).is_allowed());
        }
    }

    #[test]
    fn test_authenticated_bounced_from_auth_pages() {
        let guard = RouteGuard::new();
        assert_eq!(guard.decide("/login", true).location(), Some("/"));
        assert_eq!(guard.decide("/signup?ref=nav", true).location(), Some("/"));
        assert!(guard.decide("/login", false).is_allowed());
        assert!(guard.decide("/account", true).is_allowed());
    }

    #[test]
    fn test_custom_protected_prefixes() {
        let guard = RouteGuard::new().with_protected(&["/checkout"]);
        assert!(!guard.decide("/checkout/pay", false).is_allowed());
        assert!(guard.decide("/account", false).is_allowed());
    }

    #[test]
    fn test_check_session_and_cookie_follow_expiry() {
        let clock = ManualClock::starting_now();
        let store = SessionStore::create(
            Arc::new(MemoryStorage::new()),
            Arc::new(clock.clone()),
            SessionConfig::default(),
        );
        let guard = RouteGuard::new();

        assert!(!guard.check_session(&store, "/messages").is_allowed());
        assert!(!guard.check_cookie(store.cookies(), "/messages").is_allowed());

        store.set("a@b.com", 1).unwrap();
        assert!(guard.check_session(&store, "/messages").is_allowed());
        assert!(guard.check_cookie(store.cookies(), "/messages").is_allowed());

        clock.advance(Duration::hours(2));
        assert!(!guard.check_cookie(store.cookies(), "/messages").is_allowed());
        assert!(!guard.check_session(&store, "/messages").is_allowed());
    }
}
