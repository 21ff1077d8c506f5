//! Client-side synchronization with the Note Store.
//!
//! # Responsibility
//! - Hold in-memory note state and apply UI mutations.
//! - Migrate legacy local notes once per session.
//! - Push the full collection to the store after every change.
//!
//! # Invariants
//! - Persistence is full replace only; there is no incremental sync.

pub mod api;
pub mod client;
pub mod legacy;
pub mod session;
