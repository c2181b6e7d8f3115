/// Router Module Index
///
/// Groups routes by the access they need. Unlike a per-group auth layer, the access
/// gate in `lib.rs` wraps the whole router and decides per path, so this split is
/// about ownership and documentation; the gate is what enforces it.

/// Health, login/logout and the logged-out pages.
pub mod public;

/// Dashboard pages and JSON endpoints that need a session.
pub mod authenticated;

/// Pages and endpoints restricted to the 'admin' role.
pub mod admin;
