//! Request and response bodies for the key exchange endpoints
//!
//! Byte fields are carried as base64 strings; see [`crate::encode_bytes`]
//! and [`crate::decode_field`].

use serde::{Deserialize, Serialize};

use crate::ErrorCode;

/// Which KEM implementation is serving requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KemBackendKind {
    /// Real post-quantum algorithm
    Real,
    /// Random bytes of the right shape. Not secure.
    Simulated,
}

impl KemBackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Real => "real",
            Self::Simulated => "simulated",
        }
    }
}

impl std::fmt::Display for KemBackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Session lifecycle as seen by clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExchangeState {
    /// Private key held, no shared secret yet
    Created,
    /// A shared secret has been derived
    Exchanged,
}

/// `POST /generate-keypair` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyPairResponse {
    pub session_id: String,
    pub public_key: String,
    /// Only present when the server runs with private key exposure enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
}

/// `POST /exchange` request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeRequest {
    pub session_id: String,
    pub peer_public_key: String,
}

/// `POST /exchange` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeResponse {
    pub ciphertext: String,
    pub shared_secret: String,
}

/// `POST /decapsulate` request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecapsulateRequest {
    pub session_id: String,
    pub ciphertext: String,
}

/// `POST /decapsulate` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecapsulateResponse {
    pub shared_secret: String,
}

/// `GET /sessions/{session_id}` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfoResponse {
    pub session_id: String,
    pub state: ExchangeState,
    pub has_shared_secret: bool,
    pub expires_in_secs: u64,
}

/// Overall service health
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    /// Serving, but with the simulated backend
    Degraded,
}

/// KEM backend details reported by `/health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KemHealth {
    pub algorithm: String,
    pub backend: KemBackendKind,
    pub secure: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
}

/// `GET /health` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub kem: KemHealth,
}

/// `GET /stats` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    pub active_sessions: usize,
    pub kem_backend: KemBackendKind,
}

/// `GET /` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootResponse {
    pub message: String,
}

/// Body of every non-2xx response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorCode,
    pub detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keypair_response_omits_private_key_by_default() {
        let response = KeyPairResponse {
            session_id: "abc".to_string(),
            public_key: "AAAA".to_string(),
            private_key: None,
        };

        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("private_key").is_none());
        assert_eq!(json["session_id"], "abc");
    }

    #[test]
    fn test_health_shape() {
        let health = HealthResponse {
            status: HealthStatus::Degraded,
            kem: KemHealth {
                algorithm: "Kyber512".to_string(),
                backend: KemBackendKind::Simulated,
                secure: false,
                fallback_reason: Some("backend not compiled in".to_string()),
            },
        };

        let json = serde_json::to_value(&health).unwrap();
        assert_eq!(json["status"], "degraded");
        assert_eq!(json["kem"]["backend"], "simulated");
        assert_eq!(json["kem"]["secure"], false);
    }

    #[test]
    fn test_error_body_round_trip() {
        let json = r#"{"error":"session_not_found","detail":"Session not found"}"#;
        let body: ErrorBody = serde_json::from_str(json).unwrap();
        assert_eq!(body.error, ErrorCode::SessionNotFound);
    }
}
