use std::collections::HashMap;

/// Last-known in-stock flag per product id. This is the only mutable state
/// in the monitoring core; it lives for the lifetime of the process and is
/// lost on restart, so a product that is already in stock when the monitor
/// starts announces itself on its first check.
#[derive(Debug, Default)]
pub struct StockStateStore {
    last_in_stock: HashMap<i64, bool>,
}

impl StockStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A product never observed before is treated as not in stock.
    pub fn get(&self, product_id: i64) -> bool {
        self.last_in_stock.get(&product_id).copied().unwrap_or(false)
    }

    pub fn set(&mut self, product_id: i64, in_stock: bool) {
        self.last_in_stock.insert(product_id, in_stock);
    }

    pub fn len(&self) -> usize {
        self.last_in_stock.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_in_stock.is_empty()
    }
}
