//! Bucket Module
//!
//! The in-memory collection of config items shared by every datastore
//! backend.
//!
//! ## Responsibilities
//! - Hold items keyed by id (the logical "bucket")
//! - Maintain the (application, machine, name) → id index
//! - Allocate ids, never handing out one that is still live
//! - Replay journal operations
//!
//! ## Data Structure Choice
//! `BTreeMap<u64, ConfigItem>` keeps listing order stable (ascending id);
//! a `HashMap<ItemKey, u64>` gives point lookups for each resolution tier.
//! Locking is left to the owning datastore.

mod table;

pub use table::Bucket;
