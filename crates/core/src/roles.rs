//! Well-known role name constants.
//!
//! These must match the seed data in `20260305000001_create_users_table.sql`
//! and the `role` claim carried in access tokens.

/// A customer who files repair requests and earns impact points.
pub const ROLE_USER: &str = "user";

/// A technician who accepts and fulfils repair requests.
pub const ROLE_TECHNICIAN: &str = "technician";
