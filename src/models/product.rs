use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A monitored product as stored in the registry. The monitor treats these
/// as read-only; the management surface owns creation and edits.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct Product {
    pub id: i64,
    pub url: String,
    pub name: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Product {
    pub fn new(id: i64, url: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id,
            url: url.into(),
            name: name.into(),
            active: true,
        }
    }
}
