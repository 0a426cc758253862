use serde::{Deserialize, Serialize};

/// What one fetch of one product page yielded. Created and consumed within a
/// single check; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StockObservation {
    pub in_stock: bool,
    pub display_name: String,
    pub image_url: Option<String>,
}
