//! # centralconfig
//!
//! A centralized configuration store with:
//! - Values scoped by application and, optionally, by machine
//! - Most-specific-wins resolution: machine → application → global (`*`)
//! - A durable single-file store with torn-write recovery
//! - A JSON-over-HTTP API
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      HTTP Server (axum)                      │
//! │                     (Multiple Clients)                       │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │  Arc<dyn ConfigDatastore>
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                    Config Store Engine                       │
//! │            (Single Writer / Multi Reader)                    │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │   Journal   │          │   Bucket    │
//!   │  (Append)   │          │  (RwLock)   │
//!   └─────────────┘          └─────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use centralconfig::{ConfigDatastore, ConfigItem, MemoryStore};
//!
//! let store = MemoryStore::new();
//! store.set(ConfigItem::new("*", "timeout", "30")).unwrap();
//! store.set(ConfigItem::new("billing", "timeout", "60")).unwrap();
//!
//! let found = store.get(&ConfigItem::query("billing", "timeout")).unwrap();
//! assert_eq!(found.value, "60");
//!
//! let fallback = store.get(&ConfigItem::query("reports", "timeout")).unwrap();
//! assert_eq!(fallback.value, "30");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod settings;

pub mod bucket;
pub mod datastore;
pub mod http;
pub mod journal;
pub mod model;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use config::{StoreConfig, SyncStrategy};
pub use datastore::{open_datastore, ConfigDatastore, FileStore, MemoryStore};
pub use error::{Result, StoreError};
pub use model::{ConfigItem, ItemKey, GLOBAL_APPLICATION};
pub use settings::Settings;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of centralconfig
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
