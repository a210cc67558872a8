//! Bearer token handling.
//!
//! Tokens are issued by the school's identity service; this API only
//! validates them. [`jwt::generate_access_token`] exists for tooling and
//! tests that need a token signed with the shared secret.

pub mod jwt;
