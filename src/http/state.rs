//! Shared handler state

use std::sync::Arc;

use crate::datastore::ConfigDatastore;

/// State handed to every handler
///
/// Cloned per request; the store itself is shared.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ConfigDatastore>,

    /// CORS allow-list; `*` allows any origin
    pub allowed_origins: Arc<Vec<String>>,
}

impl AppState {
    pub fn new(store: Arc<dyn ConfigDatastore>, allowed_origins: Vec<String>) -> Self {
        Self {
            store,
            allowed_origins: Arc::new(allowed_origins),
        }
    }

    /// Value for `Access-Control-Allow-Origin`, if the request may have one
    pub fn allow_origin(&self, origin: Option<&str>) -> Option<String> {
        if self.allowed_origins.iter().any(|allowed| allowed == "*") {
            return Some("*".to_string());
        }

        let origin = origin?;
        self.allowed_origins
            .iter()
            .find(|allowed| allowed.eq_ignore_ascii_case(origin))
            .map(|_| origin.to_string())
    }
}
