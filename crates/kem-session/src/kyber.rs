//! Kyber512 backend via `pqcrypto-kyber`
//!
//! Compiled only with the `kyber` feature. Without it, [`load_real_backend`]
//! reports the backend as unavailable and selection falls back.

use std::sync::Arc;

use crate::{KemProvider, KemResult};

#[cfg(feature = "kyber")]
pub use real::KyberKem;

/// Construct the real backend, running its startup self-test
pub fn load_real_backend() -> KemResult<Arc<dyn KemProvider>> {
    #[cfg(feature = "kyber")]
    {
        Ok(Arc::new(KyberKem::new()?))
    }

    #[cfg(not(feature = "kyber"))]
    {
        Err(crate::KemError::ProviderUnavailable(
            "compiled without the `kyber` feature".to_string(),
        ))
    }
}

#[cfg(feature = "kyber")]
mod real {
    use kex_protocol::KemBackendKind;
    use pqcrypto_kyber::kyber512;
    use pqcrypto_traits::kem::{
        Ciphertext as _, PublicKey as _, SecretKey as _, SharedSecret as _,
    };
    use tracing::{debug, info};

    use crate::{
        EncapsulationResult, KemAlgorithm, KemError, KemParams, KemProvider, KemResult,
        KemStatus, KeyMaterial, KeyPair, SecretBytes,
    };

    /// Kyber512 key encapsulation
    #[derive(Debug, Clone)]
    pub struct KyberKem {
        params: KemParams,
    }

    impl KyberKem {
        /// Load the backend and verify it end to end.
        ///
        /// Any failure here is a [`KemError::ProviderUnavailable`].
        pub fn new() -> KemResult<Self> {
            let kem = Self {
                params: KemAlgorithm::Kyber512.params(),
            };
            kem.check_declared_lengths()?;
            kem.self_test()?;
            info!("Kyber512 backend initialized successfully");
            Ok(kem)
        }

        fn check_declared_lengths(&self) -> KemResult<()> {
            let declared = [
                (
                    "public key",
                    kyber512::public_key_bytes(),
                    self.params.public_key_len,
                ),
                (
                    "private key",
                    kyber512::secret_key_bytes(),
                    self.params.private_key_len,
                ),
                (
                    "ciphertext",
                    kyber512::ciphertext_bytes(),
                    self.params.ciphertext_len,
                ),
                (
                    "shared secret",
                    kyber512::shared_secret_bytes(),
                    self.params.shared_secret_len,
                ),
            ];

            for (name, actual, expected) in declared {
                if actual != expected {
                    return Err(KemError::ProviderUnavailable(format!(
                        "backend {name} length {actual} does not match Kyber512 ({expected})"
                    )));
                }
            }
            Ok(())
        }

        fn self_test(&self) -> KemResult<()> {
            let unavailable =
                |e: KemError| KemError::ProviderUnavailable(format!("self-test: {e}"));

            let keypair = self.generate_keypair().map_err(unavailable)?;
            let encapsulated = self.encapsulate(keypair.public_key()).map_err(unavailable)?;
            let recovered = self
                .decapsulate(keypair.private_key().as_bytes(), &encapsulated.ciphertext)
                .map_err(unavailable)?;

            if recovered.as_bytes() != encapsulated.shared_secret.as_bytes() {
                return Err(KemError::ProviderUnavailable(
                    "self-test: decapsulated secret does not match".to_string(),
                ));
            }
            Ok(())
        }

        /// Backend outputs must honor the length contract too
        fn check_output(
            &self,
            operation: &'static str,
            name: &str,
            actual: usize,
            expected: usize,
        ) -> KemResult<()> {
            if actual != expected {
                return Err(KemError::operation_failed(
                    operation,
                    format!("{name} has {actual} bytes, expected {expected}"),
                ));
            }
            Ok(())
        }
    }

    impl KemProvider for KyberKem {
        fn params(&self) -> KemParams {
            self.params
        }

        fn status(&self) -> KemStatus {
            KemStatus {
                algorithm: self.params.algorithm,
                backend: KemBackendKind::Real,
                fallback_reason: None,
            }
        }

        fn generate_keypair(&self) -> KemResult<KeyPair> {
            let (pk, sk) = kyber512::keypair();
            let public_key = pk.as_bytes().to_vec();
            let private_key = SecretBytes::from_slice(sk.as_bytes());

            self.check_output(
                "keygen",
                "public key",
                public_key.len(),
                self.params.public_key_len,
            )?;
            self.check_output(
                "keygen",
                "private key",
                private_key.len(),
                self.params.private_key_len,
            )?;
            debug!(
                "Generated keypair: public {} bytes, private {} bytes",
                public_key.len(),
                private_key.len()
            );

            Ok(KeyPair::new(public_key, private_key))
        }

        fn encapsulate(&self, peer_public_key: &[u8]) -> KemResult<EncapsulationResult> {
            self.params.validate(KeyMaterial::PublicKey, peer_public_key)?;

            let pk = kyber512::PublicKey::from_bytes(peer_public_key)
                .map_err(|e| KemError::operation_failed("encapsulate", format!("{e:?}")))?;
            let (ss, ct) = kyber512::encapsulate(&pk);

            let ciphertext = ct.as_bytes().to_vec();
            let shared_secret = SecretBytes::from_slice(ss.as_bytes());
            self.check_output(
                "encapsulate",
                "ciphertext",
                ciphertext.len(),
                self.params.ciphertext_len,
            )?;
            self.check_output(
                "encapsulate",
                "shared secret",
                shared_secret.len(),
                self.params.shared_secret_len,
            )?;
            debug!(
                "Encapsulated: ciphertext {} bytes, shared secret {} bytes",
                ciphertext.len(),
                shared_secret.len()
            );

            Ok(EncapsulationResult {
                ciphertext,
                shared_secret,
            })
        }

        fn decapsulate(&self, private_key: &[u8], ciphertext: &[u8]) -> KemResult<SecretBytes> {
            self.params.validate(KeyMaterial::PrivateKey, private_key)?;
            self.params.validate(KeyMaterial::Ciphertext, ciphertext)?;

            let sk = kyber512::SecretKey::from_bytes(private_key)
                .map_err(|e| KemError::operation_failed("decapsulate", format!("{e:?}")))?;
            let ct = kyber512::Ciphertext::from_bytes(ciphertext)
                .map_err(|e| KemError::operation_failed("decapsulate", format!("{e:?}")))?;
            let ss = kyber512::decapsulate(&ct, &sk);

            let shared_secret = SecretBytes::from_slice(ss.as_bytes());
            self.check_output(
                "decapsulate",
                "shared secret",
                shared_secret.len(),
                self.params.shared_secret_len,
            )?;
            debug!("Decapsulated shared secret: {} bytes", shared_secret.len());

            Ok(shared_secret)
        }
    }

}
