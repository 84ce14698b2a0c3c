//! # SoundKV
//!
//! A soundboard database on an embedded key-value store with:
//! - Sounds and categories with permanent, never reused ids
//! - A many-to-many membership index kept consistent in both directions
//! - Case-insensitive unique sound names with substring search
//! - Per-user join sounds
//! - A typed pub/sub relay for cross-process notifications
//! - Write-Ahead Logging (WAL) and snapshots for durability
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       SoundBoard                             │
//! │     (mutations, queries, name index, join sounds)            │
//! └──────────────┬─────────────────────────────┬────────────────┘
//!                │                             │
//! ┌──────────────▼──────────────┐   ┌──────────▼──────────────┐
//! │         Connection           │   │      PubSubRelay        │
//! │   (explicit client handle)   │   │ (subscriber + handlers) │
//! └──────────────┬──────────────┘   └──────────┬──────────────┘
//!                │                             │
//! ┌──────────────▼─────────────────────────────▼───────────────┐
//! │                         Engine                              │
//! │          (Single Writer / Multi Reader, Broker)             │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │     WAL     │          │  Keyspace   │
//!   │  (Append)   │          │  (RwLock)   │
//!   └─────────────┘          └──────┬──────┘
//!                                   │
//!                                   ▼
//!                           ┌─────────────┐
//!                           │   Storage   │
//!                           │ (Snapshot)  │
//!                           └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod keyspace;
pub mod wal;
pub mod storage;
pub mod pubsub;
pub mod engine;
pub mod connection;

pub mod board;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{Result, SoundKvError};
pub use config::{Config, WalSyncStrategy};
pub use engine::Engine;
pub use connection::Connection;
pub use pubsub::{PubSubRelay, Topic};
pub use board::{Category, IdKind, Sound, SoundBoard, Unlinked};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of SoundKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
