//! Simulated KEM fallback
//!
//! Produces random bytes with the exact lengths of the configured algorithm so
//! the service stays operable when the real backend cannot be loaded. There is
//! no relationship between encapsulation and decapsulation outputs.

use kex_protocol::KemBackendKind;
use rand::RngCore;
use rand::rngs::OsRng;
use tracing::debug;

use crate::{
    EncapsulationResult, KemAlgorithm, KemError, KemParams, KemProvider, KemResult, KemStatus,
    KeyMaterial, KeyPair, SecretBytes,
};

/// Shape-only KEM. NOT SECURE FOR PRODUCTION.
#[derive(Debug, Clone)]
pub struct SimulatedKem {
    params: KemParams,
    fallback_reason: Option<String>,
}

impl SimulatedKem {
    pub fn new(algorithm: KemAlgorithm) -> Self {
        Self {
            params: algorithm.params(),
            fallback_reason: None,
        }
    }

    /// Simulated backend standing in for a real one that failed to load
    pub fn fallback(algorithm: KemAlgorithm, reason: impl Into<String>) -> Self {
        Self {
            params: algorithm.params(),
            fallback_reason: Some(reason.into()),
        }
    }

    fn random_bytes(operation: &'static str, len: usize) -> KemResult<Vec<u8>> {
        let mut buf = vec![0u8; len];
        OsRng
            .try_fill_bytes(&mut buf)
            .map_err(|e| KemError::operation_failed(operation, e))?;
        Ok(buf)
    }
}

impl Default for SimulatedKem {
    fn default() -> Self {
        Self::new(KemAlgorithm::default())
    }
}

impl KemProvider for SimulatedKem {
    fn params(&self) -> KemParams {
        self.params
    }

    fn status(&self) -> KemStatus {
        KemStatus {
            algorithm: self.params.algorithm,
            backend: KemBackendKind::Simulated,
            fallback_reason: self.fallback_reason.clone(),
        }
    }

    fn generate_keypair(&self) -> KemResult<KeyPair> {
        let public_key = Self::random_bytes("keygen", self.params.public_key_len)?;
        let private_key = Self::random_bytes("keygen", self.params.private_key_len)?;
        debug!(
            "Simulated keypair: public {} bytes, private {} bytes",
            public_key.len(),
            private_key.len()
        );
        Ok(KeyPair::new(public_key, SecretBytes::new(private_key)))
    }

    fn encapsulate(&self, peer_public_key: &[u8]) -> KemResult<EncapsulationResult> {
        self.params.validate(KeyMaterial::PublicKey, peer_public_key)?;

        let ciphertext = Self::random_bytes("encapsulate", self.params.ciphertext_len)?;
        let shared_secret = Self::random_bytes("encapsulate", self.params.shared_secret_len)?;
        debug!("Simulated encapsulation: ciphertext {} bytes", ciphertext.len());

        Ok(EncapsulationResult {
            ciphertext,
            shared_secret: SecretBytes::new(shared_secret),
        })
    }

    fn decapsulate(&self, private_key: &[u8], ciphertext: &[u8]) -> KemResult<SecretBytes> {
        self.params.validate(KeyMaterial::PrivateKey, private_key)?;
        self.params.validate(KeyMaterial::Ciphertext, ciphertext)?;

        let shared_secret = Self::random_bytes("decapsulate", self.params.shared_secret_len)?;
        Ok(SecretBytes::new(shared_secret))
    }
}
