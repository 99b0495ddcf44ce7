//! KEM Session - Post-quantum key exchange core
//!
//! Pairs a pluggable key encapsulation mechanism (Kyber512 or a simulated
//! fallback) with an expiring session store, and orchestrates the three
//! exchange steps on top of them.

mod backend;
mod clock;
mod error;
mod exchange;
mod kyber;
mod simulated;
mod store;
mod traits;

pub use backend::*;
pub use clock::*;
pub use error::*;
pub use exchange::*;
pub use kyber::*;
pub use simulated::*;
pub use store::*;
pub use traits::*;

use std::time::Duration;

/// Default session lifetime (1 hour)
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(3600);

/// Longest session lifetime accepted, in seconds (30 days)
pub const MAX_SESSION_TTL_SECS: u64 = 30 * 24 * 3600;

/// Longest session lifetime accepted
pub const MAX_SESSION_TTL: Duration = Duration::from_secs(MAX_SESSION_TTL_SECS);
