//! KEM provider trait abstraction

use kex_protocol::KemBackendKind;
use zeroize::Zeroizing;

use crate::{KemError, KemResult, KeyMaterial};

/// Supported KEM parameter sets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KemAlgorithm {
    /// Kyber-512, the smallest and fastest variant (NIST category 1)
    Kyber512,
}

impl KemAlgorithm {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Kyber512 => "Kyber512",
        }
    }

    /// Fixed byte lengths of this parameter set
    pub fn params(&self) -> KemParams {
        match self {
            Self::Kyber512 => KemParams {
                algorithm: *self,
                public_key_len: 800,
                private_key_len: 1632,
                ciphertext_len: 768,
                shared_secret_len: 32,
            },
        }
    }
}

impl Default for KemAlgorithm {
    fn default() -> Self {
        Self::Kyber512
    }
}

impl std::fmt::Display for KemAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Byte-length contract every provider for an algorithm must satisfy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KemParams {
    pub algorithm: KemAlgorithm,
    pub public_key_len: usize,
    pub private_key_len: usize,
    pub ciphertext_len: usize,
    pub shared_secret_len: usize,
}

impl KemParams {
    /// Expected length for a kind of input
    pub fn expected_len(&self, kind: KeyMaterial) -> usize {
        match kind {
            KeyMaterial::PublicKey => self.public_key_len,
            KeyMaterial::PrivateKey => self.private_key_len,
            KeyMaterial::Ciphertext => self.ciphertext_len,
        }
    }

    /// Length check. This is the only inspection key material ever gets.
    pub fn validate(&self, kind: KeyMaterial, bytes: &[u8]) -> KemResult<()> {
        let expected = self.expected_len(kind);
        if bytes.len() != expected {
            return Err(KemError::InvalidKeyMaterial {
                kind,
                expected,
                actual: bytes.len(),
            });
        }
        Ok(())
    }
}

/// Secret bytes, wiped on drop
#[derive(Clone)]
pub struct SecretBytes(Zeroizing<Vec<u8>>);

impl SecretBytes {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(Zeroizing::new(bytes))
    }

    pub fn from_slice(bytes: &[u8]) -> Self {
        Self::new(bytes.to_vec())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for SecretBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecretBytes([REDACTED; {}])", self.0.len())
    }
}

/// Freshly generated key pair
pub struct KeyPair {
    public_key: Vec<u8>,
    private_key: SecretBytes,
}

impl KeyPair {
    pub fn new(public_key: Vec<u8>, private_key: SecretBytes) -> Self {
        Self {
            public_key,
            private_key,
        }
    }

    /// Get the public key bytes
    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    pub fn private_key(&self) -> &SecretBytes {
        &self.private_key
    }

    pub fn into_parts(self) -> (Vec<u8>, SecretBytes) {
        (self.public_key, self.private_key)
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key_len", &self.public_key.len())
            .field("private_key", &self.private_key)
            .finish()
    }
}

/// Output of an encapsulation
#[derive(Debug, Clone)]
pub struct EncapsulationResult {
    /// Sent to the owner of the private key
    pub ciphertext: Vec<u8>,
    /// Kept by the encapsulating side
    pub shared_secret: SecretBytes,
}

/// Which backend is active and why
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KemStatus {
    pub algorithm: KemAlgorithm,
    pub backend: KemBackendKind,
    /// Set when the simulated backend replaced the real one
    pub fallback_reason: Option<String>,
}

impl KemStatus {
    /// Only the real backend provides any security
    pub fn is_secure(&self) -> bool {
        self.backend == KemBackendKind::Real
    }
}

/// Key encapsulation mechanism
///
/// Implementations are stateless per call and shared across request tasks.
pub trait KemProvider: Send + Sync {
    /// Length contract of the configured algorithm
    fn params(&self) -> KemParams;

    /// Backend identification for health reporting
    fn status(&self) -> KemStatus;

    /// Generate a new key pair from a secure random source
    fn generate_keypair(&self) -> KemResult<KeyPair>;

    /// Derive a fresh shared secret and its ciphertext for `peer_public_key`
    fn encapsulate(&self, peer_public_key: &[u8]) -> KemResult<EncapsulationResult>;

    /// Recover the shared secret from `ciphertext`
    fn decapsulate(&self, private_key: &[u8], ciphertext: &[u8]) -> KemResult<SecretBytes>;
}
