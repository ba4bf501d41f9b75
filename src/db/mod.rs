//! Data access: record types, the storage seam, and the query layer.
//!
//! SYSTEM CONTEXT
//! ==============
//! Handlers only ever see `Queries`. The backing `Store` at startup is the
//! in-memory `LocalCache`; nothing here survives a restart.

pub mod queries;
pub mod schema;
pub mod store;
