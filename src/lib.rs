pub mod alert;
pub mod classifier;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod models;
pub mod monitor;
pub mod notifier;
pub mod registry;
pub mod state;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::AppError;
pub use models::{Product, StockObservation};

pub type Result<T> = std::result::Result<T, AppError>;
