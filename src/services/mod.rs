//! Domain services used by the HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own sign-in and session logic so route handlers can stay
//! focused on request translation and cookie plumbing.

pub mod auth;
pub mod session;
