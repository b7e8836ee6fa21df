use std::sync::Arc;

use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::config::SessionConfig;
use crate::cookie::{AuthCookie, CookieJar};
use crate::error::SessionError;
use crate::storage::KeyValueStorage;
use crate::utils::{is_valid_email, mask_email};

/// Seconds per hour, for cookie max-age
const SECS_PER_HOUR: i64 = 3600;

/// Timestamps are stored as epoch milliseconds, the web client's format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub email: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    #[cfg_attr(feature = "ts", ts(type = "number"))]
    pub issued_at: DateTime<Utc>,
    /// Absent only on records written by older clients; those never expire.
    #[serde(
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    #[cfg_attr(feature = "ts", ts(type = "number | null"))]
    pub expires_at: Option<DateTime<Utc>>,
}

impl SessionRecord {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|expiry| now > expiry).unwrap_or(false)
    }

    pub fn time_until_expiry(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.expires_at.map(|expiry| expiry - now)
    }

    /// Whole minutes until expiry, clamped at zero
    pub fn minutes_until_expiry(&self, now: DateTime<Utc>) -> Option<i64> {
        self.time_until_expiry(now)
            .map(|remaining| remaining.num_minutes().max(0))
    }
}

/// The client's session: one record slot plus the `auth-token` cookie.
///
/// The store owns both writes so the record and the cookie never drift.
/// Expiry is lazy: an expired record is only evicted when something reads it.
pub struct SessionStore {
    records: Arc<dyn KeyValueStorage>,
    cookies: CookieJar,
    clock: Arc<dyn Clock>,
    config: SessionConfig,
}

impl SessionStore {
    /// Create a store whose record and cookie share one storage scope
    pub fn create(
        storage: Arc<dyn KeyValueStorage>,
        clock: Arc<dyn Clock>,
        config: SessionConfig,
    ) -> Self {
        let cookies = CookieJar::new(storage.clone(), clock.clone());
        debug!(backend = storage.backend_name(), key = %config.record_key, "Session store created");
        Self {
            records: storage,
            cookies,
            clock,
            config,
        }
    }

    /// Keep cookies in a separate storage scope from the record
    pub fn with_cookie_storage(mut self, storage: Arc<dyn KeyValueStorage>) -> Self {
        self.cookies = CookieJar::new(storage, self.clock.clone());
        self
    }

    /// Release the store. Persisted state is left untouched.
    pub fn dispose(self) {
        debug!(backend = self.records.backend_name(), "Session store disposed");
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Read-only access to the companion cookie
    pub fn cookies(&self) -> &CookieJar {
        &self.cookies
    }

    pub fn auth_cookie(&self) -> Option<AuthCookie> {
        self.cookies.get(&self.config.cookie_name)
    }

    /// Open a session for `email` lasting `ttl_hours`
    pub fn set(&self, email: &str, ttl_hours: i64) -> Result<(), SessionError> {
        let email = email.trim();
        if !is_valid_email(email) {
            return Err(SessionError::InvalidEmail(email.to_string()));
        }
        let record = self.issue(email, ttl_hours)?;
        self.write(&record, ttl_hours)?;
        info!(email = %mask_email(email), ttl_hours, "Session opened");
        Ok(())
    }

    /// Open a session with the configured default lifetime
    pub fn set_default(&self, email: &str) -> Result<(), SessionError> {
        self.set(email, self.config.default_ttl_hours)
    }

    /// Load the live session, evicting it if it has expired or is unreadable
    pub fn get(&self) -> Option<SessionRecord> {
        let raw = match self.records.get_item(&self.config.record_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "Failed to read session; treating as signed out");
                return None;
            }
        };

        let record = match Self::parse_record(&raw) {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, "Discarding unreadable session");
                self.clear();
                return None;
            }
        };

        if record.is_expired_at(self.clock.now()) {
            info!(email = %mask_email(&record.email), "Session expired");
            self.clear();
            return None;
        }

        Some(record)
    }

    /// Check if a live session exists
    pub fn is_valid(&self) -> bool {
        self.get().is_some()
    }

    /// Whole minutes left in the live session. `None` when signed out, and
    /// for legacy records that carry no expiry.
    pub fn minutes_remaining(&self) -> Option<i64> {
        self.get()
            .and_then(|record| record.minutes_until_expiry(self.clock.now()))
    }

    pub fn expiring_soon(&self, threshold_minutes: i64) -> bool {
        self.minutes_remaining()
            .map(|minutes| minutes <= threshold_minutes)
            .unwrap_or(false)
    }

    /// `expiring_soon` with the configured threshold
    pub fn expiring_soon_default(&self) -> bool {
        self.expiring_soon(self.config.expiring_soon_minutes)
    }

    /// Re-issue the live session for another `extend_by_hours`, keeping its
    /// email. Returns `false` without writing anything if no session is live.
    pub fn refresh(&self, extend_by_hours: i64) -> Result<bool, SessionError> {
        if extend_by_hours <= 0 {
            return Err(SessionError::InvalidTtl(extend_by_hours));
        }
        let Some(current) = self.get() else {
            debug!("No live session to refresh");
            return Ok(false);
        };

        let record = self.issue(&current.email, extend_by_hours)?;
        self.write(&record, extend_by_hours)?;
        info!(email = %mask_email(&record.email), extend_by_hours, "Session refreshed");
        Ok(true)
    }

    /// `refresh` with the configured extension
    pub fn refresh_default(&self) -> Result<bool, SessionError> {
        self.refresh(self.config.default_refresh_hours)
    }

    /// Remove the record and the cookie. Never fails; logout always succeeds
    /// locally even if storage refuses the removal.
    pub fn clear(&self) {
        if let Err(e) = self.records.remove_item(&self.config.record_key) {
            warn!(error = %e, "Failed to remove session record");
        }
        if let Err(e) = self.cookies.remove(&self.config.cookie_name) {
            warn!(error = %e, "Failed to remove auth cookie");
        }
        debug!("Session cleared");
    }

    fn issue(&self, email: &str, ttl_hours: i64) -> Result<SessionRecord, SessionError> {
        if ttl_hours <= 0 {
            return Err(SessionError::InvalidTtl(ttl_hours));
        }
        let now = self.clock.now().trunc_subsecs(3);
        let expires_at = Duration::try_hours(ttl_hours)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or(SessionError::InvalidTtl(ttl_hours))?;

        Ok(SessionRecord {
            email: email.to_string(),
            issued_at: now,
            expires_at: Some(expires_at),
        })
    }

    /// Persist the record, then the cookie. If the cookie cannot be written
    /// the previous record is put back, so the record and the untouched
    /// cookie still describe the same session.
    fn write(&self, record: &SessionRecord, ttl_hours: i64) -> Result<(), SessionError> {
        let json = serde_json::to_string(record)
            .map_err(|e| SessionError::MalformedRecord(e.to_string()))?;
        let previous = self.records.get_item(&self.config.record_key)?;
        self.records.set_item(&self.config.record_key, &json)?;

        let cookie = AuthCookie::generate(
            &self.config.cookie_name,
            ttl_hours.saturating_mul(SECS_PER_HOUR),
            self.config.same_site,
        );
        let stored = match record.expires_at {
            Some(expires_at) => self.cookies.set_expiring_at(&cookie, expires_at),
            None => self.cookies.set(&cookie),
        };
        if let Err(e) = stored {
            warn!(error = %e, "Failed to set auth cookie; rolling back session record");
            self.roll_back(previous);
            return Err(e.into());
        }
        Ok(())
    }

    fn roll_back(&self, previous: Option<String>) {
        let key = &self.config.record_key;
        match previous {
            Some(raw) => {
                if let Err(e) = self.records.set_item(key, &raw) {
                    warn!(error = %e, "Failed to restore previous session record");
                }
            }
            None => {
                if let Err(e) = self.records.remove_item(key) {
                    warn!(error = %e, "Failed to roll back session record");
                }
                if let Err(e) = self.cookies.remove(&self.config.cookie_name) {
                    debug!(error = %e, "Failed to remove stale auth cookie");
                }
            }
        }
    }

    fn parse_record(raw: &str) -> Result<SessionRecord, SessionError> {
        let record: SessionRecord = serde_json::from_str(raw)
            .map_err(|e| SessionError::MalformedRecord(e.to_string()))?;
        if let Some(expiry) = record.expires_at {
            if expiry <= record.issued_at {
                return Err(SessionError::MalformedRecord(
                    "expiry is not after issue time".to_string(),
                ));
            }
        }
        Ok(record)
    }
}
