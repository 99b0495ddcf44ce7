//! Key exchange orchestration
//!
//! A session moves from `Created` (private key held) to `Exchanged` (shared
//! secret held) and never back. All side effects land in the session store.

use std::sync::Arc;

use tracing::{debug, info};

use crate::{
    EncapsulationResult, ExchangeError, ExchangeResult, KemProvider, KemStatus, SecretBytes,
    SessionData, SessionId, SessionSnapshot, SessionStore,
};

/// Service behaviour switches
#[derive(Debug, Clone, Default)]
pub struct ExchangeConfig {
    /// Hand the private key back from `initiate_exchange`.
    ///
    /// Debugging aid only: it defeats the point of keeping the key server-side.
    pub expose_private_key: bool,
}

/// Result of starting an exchange
#[derive(Debug)]
pub struct InitiatedExchange {
    pub session_id: SessionId,
    pub public_key: Vec<u8>,
    /// Only set when `expose_private_key` is enabled
    pub exposed_private_key: Option<SecretBytes>,
}

/// Orchestrates a KEM provider and a session store
pub struct KeyExchangeService {
    kem: Arc<dyn KemProvider>,
    store: Arc<SessionStore>,
    config: ExchangeConfig,
}

impl KeyExchangeService {
    pub fn new(
        kem: Arc<dyn KemProvider>,
        store: Arc<SessionStore>,
        config: ExchangeConfig,
    ) -> Self {
        Self { kem, store, config }
    }

    /// Generate a keypair and bind its private key to a new session
    pub fn initiate_exchange(&self) -> ExchangeResult<InitiatedExchange> {
        let (public_key, private_key) = self.kem.generate_keypair()?.into_parts();
        let session_id = SessionId::generate();

        let exposed_private_key = self
            .config
            .expose_private_key
            .then(|| private_key.clone());

        self.store
            .create(session_id.clone(), SessionData::with_private_key(private_key), None)?;
        info!("Exchange initiated: session {}", session_id);

        Ok(InitiatedExchange {
            session_id,
            public_key,
            exposed_private_key,
        })
    }

    /// Encapsulate against the peer's public key and record the secret
    pub fn respond_to_exchange(
        &self,
        session_id: &SessionId,
        peer_public_key: &[u8],
    ) -> ExchangeResult<EncapsulationResult> {
        if self.store.get(session_id).is_none() {
            return Err(ExchangeError::SessionNotFound(session_id.to_string()));
        }

        let result = self.kem.encapsulate(peer_public_key)?;

        // The KEM runs outside the store lock, so the session may be gone by now
        self.store
            .update(session_id, |data| data.set_shared_secret(result.shared_secret.clone()))
            .ok_or_else(|| ExchangeError::SessionNotFound(session_id.to_string()))?;
        info!("Exchange responded: session {}", session_id);

        Ok(result)
    }

    /// Decapsulate with the session's private key and record the secret
    pub fn complete_exchange(
        &self,
        session_id: &SessionId,
        ciphertext: &[u8],
    ) -> ExchangeResult<SecretBytes> {
        let session = self
            .store
            .get(session_id)
            .ok_or_else(|| ExchangeError::SessionNotFound(session_id.to_string()))?;

        let private_key = session
            .data()
            .private_key()
            .cloned()
            .ok_or_else(|| ExchangeError::MissingPrivateKey(session_id.to_string()))?;

        let shared_secret = self.kem.decapsulate(private_key.as_bytes(), ciphertext)?;

        self.store
            .update(session_id, |data| data.set_shared_secret(shared_secret.clone()))
            .ok_or_else(|| ExchangeError::SessionNotFound(session_id.to_string()))?;
        info!("Exchange completed: session {}", session_id);

        Ok(shared_secret)
    }

    /// Destroy a session explicitly
    pub fn end_exchange(&self, session_id: &SessionId) -> bool {
        let removed = self.store.delete(session_id);
        debug!("End exchange {}: removed={}", session_id, removed);
        removed
    }

    pub fn session_info(&self, session_id: &SessionId) -> ExchangeResult<SessionSnapshot> {
        self.store
            .snapshot(session_id)
            .ok_or_else(|| ExchangeError::SessionNotFound(session_id.to_string()))
    }

    pub fn kem_status(&self) -> KemStatus {
        self.kem.status()
    }

    pub fn active_sessions(&self) -> usize {
        self.store.len()
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }
}
