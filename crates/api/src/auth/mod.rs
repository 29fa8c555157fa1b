//! Token-based identity.
//!
//! The platform trusts an external identity provider to establish who a
//! caller is; this module only validates the HS256 access tokens that
//! provider mints (and mints them itself in tests and tooling).

pub mod jwt;
