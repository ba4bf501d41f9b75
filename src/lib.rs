//! Guest-session auth and in-memory chat data access for the chat web app.
//!
//! ARCHITECTURE
//! ============
//! `routes` is the HTTP edge. Handlers pull the session from the cookie,
//! check ownership, and call `db::queries::Queries`, which wraps any
//! `db::store::Store` (here the in-memory `cache::LocalCache`) and turns
//! store failures into logged `errors::ChatError`s.

pub mod cache;
pub mod config;
pub mod db;
pub mod errors;
pub mod routes;
pub mod services;
pub mod state;
