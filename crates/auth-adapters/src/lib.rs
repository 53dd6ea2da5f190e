//! # Auth Adapters
//!
//! Implementations of the `IdentityProvider` port.

#[cfg(feature = "auth-jwt")]
pub mod jwt;

#[cfg(feature = "auth-jwt")]
pub use jwt::{Claims, JwtIdentityProvider};
