//! Command line and environment configuration

use std::net::SocketAddr;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use kem_session::{BackendPreference, ExchangeConfig, MAX_SESSION_TTL_SECS, StoreConfig};

/// Kyber key exchange server
#[derive(Parser, Debug, Clone)]
#[command(name = "kex-server")]
#[command(about = "Post-quantum KEM key exchange service")]
#[command(version)]
pub struct Args {
    /// Address to bind to
    #[arg(short, long, env = "KEX_BIND", default_value = "0.0.0.0:8000")]
    pub bind: SocketAddr,

    /// Session lifetime in seconds (at most 30 days)
    #[arg(long, env = "KEX_SESSION_TTL_SECS", default_value_t = 3600,
          value_parser = clap::value_parser!(u64).range(1..=MAX_SESSION_TTL_SECS))]
    pub session_ttl_secs: u64,

    /// KEM backend selection
    #[arg(long, env = "KEX_KEM_BACKEND", value_enum, default_value_t = KemBackendArg::Auto)]
    pub kem_backend: KemBackendArg,

    /// Return the private key from /generate-keypair (debugging only, insecure)
    #[arg(long, env = "KEX_EXPOSE_PRIVATE_KEY")]
    pub expose_private_key: bool,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

/// Backend choice on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KemBackendArg {
    /// Real Kyber512, simulated if it cannot be loaded
    Auto,
    /// Real Kyber512 or refuse to start
    Real,
    /// Simulated backend (NOT SECURE)
    Simulated,
}

impl From<KemBackendArg> for BackendPreference {
    fn from(value: KemBackendArg) -> Self {
        match value {
            KemBackendArg::Auto => Self::Auto,
            KemBackendArg::Real => Self::Real,
            KemBackendArg::Simulated => Self::Simulated,
        }
    }
}

impl Args {
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            default_ttl: Duration::from_secs(self.session_ttl_secs),
        }
    }

    pub fn exchange_config(&self) -> ExchangeConfig {
        ExchangeConfig {
            expose_private_key: self.expose_private_key,
        }
    }
}
