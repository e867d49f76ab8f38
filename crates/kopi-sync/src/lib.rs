//! # kopi-sync: Remote Mirroring for Kopi POS
//!
//! The background half of the offline-first design.
//!
//! ## Data Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                           kopi-sync                                 │
//! │                                                                     │
//! │   sync_outbox table ──► OutboxProcessor ──► RemoteStore             │
//! │   (queued by engines)    (periodic drain,    (document collections, │
//! │                           at-least-once)      UUID-addressed)       │
//! │                                                                     │
//! │   RemoteStore ──► Hydrator ──► local products + recipes             │
//! │                   (startup pull-down, last-writer-wins)             │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Register flows never wait on this crate: local writes succeed whether
//! or not the remote store is reachable, and the outbox catches up when
//! connectivity returns.

pub mod config;
pub mod error;
pub mod hydrate;
pub mod outbox;
pub mod remote;

pub use config::SyncConfig;
pub use error::{SyncError, SyncResult};
pub use hydrate::{HydrationReport, Hydrator};
pub use outbox::{DrainReport, OutboxProcessor};
pub use remote::{Document, InMemoryRemoteStore, RemoteStore};
