//! Shared Protocol Definitions for the Kyber Key Exchange API
//!
//! This crate contains the request/response shapes, stable error codes and
//! the base64 codec for key material crossing the HTTP boundary.

mod codec;
mod error;
mod messages;

pub use codec::*;
pub use error::*;
pub use messages::*;

/// API version reported by the service
pub const API_VERSION: &str = "1.0.0";

/// Human-readable service title
pub const SERVICE_TITLE: &str = "Kyber Key Exchange API";
