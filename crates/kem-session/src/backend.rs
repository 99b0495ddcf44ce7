//! One-time KEM backend selection at startup

use std::sync::Arc;

use tracing::{info, warn};

use crate::{KemAlgorithm, KemError, KemProvider, KemResult, SimulatedKem, load_real_backend};

/// Operator choice of backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendPreference {
    /// Real backend, falling back to simulated if it cannot load
    #[default]
    Auto,
    /// Real backend or startup failure
    Real,
    /// Always simulated
    Simulated,
}

/// Select the KEM provider for the lifetime of the process
pub fn select_backend(preference: BackendPreference) -> KemResult<Arc<dyn KemProvider>> {
    select_backend_with(preference, load_real_backend)
}

/// Backend selection with an explicit loader for the real implementation
pub fn select_backend_with<F>(
    preference: BackendPreference,
    load_real: F,
) -> KemResult<Arc<dyn KemProvider>>
where
    F: FnOnce() -> KemResult<Arc<dyn KemProvider>>,
{
    let algorithm = KemAlgorithm::default();

    match preference {
        BackendPreference::Simulated => {
            warn!("Simulated KEM backend forced by configuration");
            warn!("Using simulated cryptography (NOT SECURE FOR PRODUCTION)");
            Ok(Arc::new(SimulatedKem::fallback(
                algorithm,
                "simulated backend forced by configuration",
            )))
        }
        BackendPreference::Real => {
            let provider = load_real()?;
            info!("Using real {} KEM backend", provider.params().algorithm);
            Ok(provider)
        }
        BackendPreference::Auto => match load_real() {
            Ok(provider) => {
                info!("Using real {} KEM backend", provider.params().algorithm);
                Ok(provider)
            }
            Err(KemError::ProviderUnavailable(reason)) => {
                warn!("Error initializing {} backend: {}", algorithm, reason);
                warn!("Using simulated cryptography (NOT SECURE FOR PRODUCTION)");
                warn!(
                    "Rebuild with the `kyber` feature and a C toolchain \
                     to enable real post-quantum cryptography"
                );
                Ok(Arc::new(SimulatedKem::fallback(algorithm, reason)))
            }
            Err(e) => Err(e),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kex_protocol::KemBackendKind;

    fn unavailable() -> KemResult<Arc<dyn KemProvider>> {
        Err(KemError::ProviderUnavailable("native library missing".to_string()))
    }

    fn fake_real() -> KemResult<Arc<dyn KemProvider>> {
        Ok(Arc::new(SimulatedKem::default()))
    }

    #[test]
    fn test_auto_falls_back_when_unavailable() {
        let provider = select_backend_with(BackendPreference::Auto, unavailable).unwrap();
        let status = provider.status();

        assert_eq!(status.backend, KemBackendKind::Simulated);
        assert_eq!(status.fallback_reason.as_deref(), Some("native library missing"));
    }

    #[test]
    fn test_real_preference_fails_instead_of_falling_back() {
        let result = select_backend_with(BackendPreference::Real, unavailable);
        assert!(matches!(result, Err(KemError::ProviderUnavailable(_))));
    }

    #[test]
    fn test_simulated_preference_never_loads_real() {
        let provider = select_backend_with(BackendPreference::Simulated, || {
            panic!("real backend must not be loaded")
        })
        .unwrap();
        assert!(!provider.status().is_secure());
    }

    #[test]
    fn test_auto_uses_loaded_backend() {
        let provider = select_backend_with(BackendPreference::Auto, fake_real).unwrap();
        assert_eq!(provider.status().fallback_reason, None);
    }

    #[cfg(feature = "kyber")]
    #[test]
    fn test_default_selection_is_real_with_kyber() {
        let provider = select_backend(BackendPreference::Auto).unwrap();
        assert!(provider.status().is_secure());
    }

    #[cfg(not(feature = "kyber"))]
    #[test]
    fn test_default_selection_is_simulated_without_kyber() {
        let provider = select_backend(BackendPreference::Auto).unwrap();
        assert!(!provider.status().is_secure());
    }
}
