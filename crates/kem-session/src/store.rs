//! Expiring session store
//!
//! A single lock guards both the session map and the timeout map, so an
//! eviction pass can never interleave with a create or update of the same id.
//! Expiry is lazy: every `create`, `get` and `update` first scans all timeout
//! records and drops the expired ones. There is no background sweep, which
//! keeps the store simple but makes each access O(n) in live sessions.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use kex_protocol::ExchangeState;
use parking_lot::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::{
    Clock, DEFAULT_SESSION_TTL, MAX_SESSION_TTL, SecretBytes, StoreError, StoreResult, SystemClock,
};

/// Opaque session identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Fresh random identifier (UUID v4)
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Secrets bound to one exchange
#[derive(Clone, Default)]
pub struct SessionData {
    private_key: Option<SecretBytes>,
    shared_secret: Option<SecretBytes>,
}

impl SessionData {
    /// Data for a freshly initiated exchange
    pub fn with_private_key(private_key: SecretBytes) -> Self {
        Self {
            private_key: Some(private_key),
            shared_secret: None,
        }
    }

    pub fn has_private_key(&self) -> bool {
        self.private_key.is_some()
    }

    /// Private key never leaves this crate
    pub(crate) fn private_key(&self) -> Option<&SecretBytes> {
        self.private_key.as_ref()
    }

    pub fn shared_secret(&self) -> Option<&SecretBytes> {
        self.shared_secret.as_ref()
    }

    /// Record the derived secret, replacing any earlier one
    pub fn set_shared_secret(&mut self, shared_secret: SecretBytes) {
        self.shared_secret = Some(shared_secret);
    }

    pub fn state(&self) -> ExchangeState {
        if self.shared_secret.is_some() {
            ExchangeState::Exchanged
        } else {
            ExchangeState::Created
        }
    }
}

impl std::fmt::Debug for SessionData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionData")
            .field("has_private_key", &self.private_key.is_some())
            .field("has_shared_secret", &self.shared_secret.is_some())
            .finish()
    }
}

/// Stored session
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    created_at: Instant,
    expires_at: Instant,
    data: SessionData,
}

impl Session {
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    pub fn data(&self) -> &SessionData {
        &self.data
    }

    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Secret-free view of a session
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub id: SessionId,
    pub state: ExchangeState,
    pub has_private_key: bool,
    pub has_shared_secret: bool,
    /// Remaining lifetime at the time of the snapshot
    pub expires_in: Duration,
}

/// Store configuration
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// TTL applied when `create` is not given one
    pub default_ttl: Duration,
}

impl StoreConfig {
    /// Reject TTLs that could never produce a valid session
    pub fn validate(&self) -> StoreResult<()> {
        check_ttl(self.default_ttl)?;
        Instant::now()
            .checked_add(self.default_ttl)
            .ok_or(StoreError::TtlOverflow)?;
        Ok(())
    }
}

fn check_ttl(ttl: Duration) -> StoreResult<()> {
    if ttl.is_zero() {
        return Err(StoreError::InvalidTtl);
    }
    if ttl > MAX_SESSION_TTL {
        return Err(StoreError::TtlTooLong {
            requested_secs: ttl.as_secs(),
            max_secs: MAX_SESSION_TTL.as_secs(),
        });
    }
    Ok(())
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            default_ttl: DEFAULT_SESSION_TTL,
        }
    }
}

#[derive(Default)]
struct StoreInner {
    sessions: HashMap<SessionId, Session>,
    timeouts: HashMap<SessionId, Instant>,
}

impl StoreInner {
    fn evict_expired(&mut self, now: Instant) -> usize {
        let expired: Vec<SessionId> = self
            .timeouts
            .iter()
            .filter(|(_, expires_at)| now >= **expires_at)
            .map(|(id, _)| id.clone())
            .collect();

        for id in &expired {
            self.sessions.remove(id);
            self.timeouts.remove(id);
        }

        if !expired.is_empty() {
            debug!("Evicted {} expired sessions", expired.len());
        }
        expired.len()
    }
}

/// Thread-safe session store with lazy expiry
pub struct SessionStore {
    inner: Mutex<StoreInner>,
    clock: Arc<dyn Clock>,
    config: StoreConfig,
}

impl SessionStore {
    pub fn new(config: StoreConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: StoreConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Mutex::new(StoreInner::default()),
            clock,
            config,
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Store `data` under `id`, replacing any existing entry
    pub fn create(
        &self,
        id: SessionId,
        data: SessionData,
        ttl: Option<Duration>,
    ) -> StoreResult<()> {
        let ttl = ttl.unwrap_or(self.config.default_ttl);
        check_ttl(ttl)?;

        let now = self.clock.now();
        let expires_at = now.checked_add(ttl).ok_or(StoreError::TtlOverflow)?;

        let mut inner = self.inner.lock();
        inner.evict_expired(now);
        inner.timeouts.insert(id.clone(), expires_at);
        inner.sessions.insert(
            id.clone(),
            Session {
                id: id.clone(),
                created_at: now,
                expires_at,
                data,
            },
        );
        debug!("Session created: {} (ttl {}s)", id, ttl.as_secs());

        Ok(())
    }

    /// Live session for `id`, if any
    pub fn get(&self, id: &SessionId) -> Option<Session> {
        let now = self.clock.now();
        let mut inner = self.inner.lock();
        inner.evict_expired(now);
        inner
            .sessions
            .get(id)
            .filter(|session| !session.is_expired(now))
            .cloned()
    }

    /// Mutate session data in place, keeping its timestamps
    pub fn update<F, R>(&self, id: &SessionId, f: F) -> Option<R>
    where
        F: FnOnce(&mut SessionData) -> R,
    {
        let now = self.clock.now();
        let mut inner = self.inner.lock();
        inner.evict_expired(now);
        inner
            .sessions
            .get_mut(id)
            .filter(|session| !session.is_expired(now))
            .map(|session| f(&mut session.data))
    }

    /// Remove a session. Returns whether anything was removed.
    pub fn delete(&self, id: &SessionId) -> bool {
        let mut inner = self.inner.lock();
        let removed = inner.sessions.remove(id).is_some();
        inner.timeouts.remove(id);
        if removed {
            debug!("Session deleted: {}", id);
        }
        removed
    }

    /// Drop every session
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.sessions.clear();
        inner.timeouts.clear();
    }

    /// Number of live sessions
    pub fn len(&self) -> usize {
        let now = self.clock.now();
        let mut inner = self.inner.lock();
        inner.evict_expired(now);
        inner.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn snapshot(&self, id: &SessionId) -> Option<SessionSnapshot> {
        let now = self.clock.now();
        self.get(id).map(|session| SessionSnapshot {
            id: session.id.clone(),
            state: session.data.state(),
            has_private_key: session.data.has_private_key(),
            has_shared_secret: session.data.shared_secret.is_some(),
            expires_in: session.expires_at.saturating_duration_since(now),
        })
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}
