//! HTTP Module
//!
//! JSON-over-HTTP boundary in front of a [`ConfigDatastore`](crate::datastore::ConfigDatastore).
//!
//! ## Endpoints
//! - `GET  /`                     - endpoint summary
//! - `GET  /health`               - liveness check
//! - `POST /config/get`           - resolve one item (machine → app → global)
//! - `POST /config/set`           - create or overwrite an item
//! - `POST /config/remove`        - delete an item
//! - `POST /config/getall`        - all items of one application
//! - `GET  /config/getall`        - every item
//! - `GET  /applications/getall`  - distinct application names
//! - `POST /store/init`           - create the backing store if missing
//!
//! Every data endpoint answers with a [`ConfigResponse`] envelope.
//! Handlers hold no state of their own; the store travels in [`AppState`].

pub mod handlers;
mod response;
mod server;
mod state;

pub use response::{ApiError, ConfigResponse};
pub use server::{router, Server};
pub use state::AppState;
