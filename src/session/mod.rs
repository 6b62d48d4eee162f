//! Conversation sessions
//!
//! Each session history is append-only and guarded by its own lock, so at
//! most one append, compression or chat turn runs per session at a time
//! while different sessions proceed independently.

pub mod store;

pub use store::{Session, SessionStore};
