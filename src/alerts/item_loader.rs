//! Loading of alert items from disk.
//!
//! This module provides the [`ItemLoader`] used by the binary to read the
//! items to present from a JSON file.

use log::{error, info, warn};
use tokio::fs;

use crate::alerts::AlertItem;

/// Reads alert items from a JSON file.
///
/// The file holds an array of items. Loading never fails: a missing or
/// corrupted file yields no items, so the binary can always start.
///
/// # Examples
///
/// ```no_run
/// use vigil::alerts::ItemLoader;
///
/// # async fn example() {
/// let loader = ItemLoader::new("items.json".to_string());
/// let items = loader.load().await;
/// println!("loaded {} items", items.len());
/// # }
/// ```
#[derive(Clone)]
pub struct ItemLoader {
    /// Path to the JSON file holding the items.
    path: String,
}

impl ItemLoader {
    /// Creates a loader reading `path`.
    pub fn new(path: String) -> Self {
        ItemLoader { path }
    }

    /// Loads the items, in file order.
    ///
    /// # Error Handling
    ///
    /// - If the file doesn't exist: logs a warning and returns no items
    /// - If deserialization fails: logs an error and returns no items
    pub async fn load(&self) -> Vec<AlertItem> {
        let Ok(serialized_items) = fs::read_to_string(&self.path).await else {
            warn!("no items file found at {}, starting without items", self.path);
            return Vec::new();
        };

        let items: Vec<AlertItem> = match serde_json::from_str(&serialized_items) {
            Ok(items) => items,
            Err(e) => {
                error!("failed to deserialize items from {}: {}", self.path, e);
                return Vec::new();
            }
        };

        info!("loaded {} items from {}", items.len(), self.path);

        items
    }
}
