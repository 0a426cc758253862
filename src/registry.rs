use async_trait::async_trait;
use reqwest::Client;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::info;

use crate::models::Product;
use crate::{AppError, Result};

/// Read-only view of the externally-owned product list, snapshotted once per
/// poll cycle. Additions, removals, and toggles made by the management
/// surface show up on the next cycle without a restart.
#[async_trait]
pub trait ProductRegistry: Send + Sync {
    async fn list_active_products(&self) -> Result<Vec<Product>>;
}

/// Products table in SQLite, shared with the management surface.
pub struct SqliteRegistry {
    pool: SqlitePool,
}

impl SqliteRegistry {
    /// Connects with exponential backoff; the management surface may still be
    /// creating the database when the monitor starts.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        let strategy = ExponentialBackoff::from_millis(500).map(jitter).take(4);
        let pool = Retry::spawn(strategy, || {
            // One connection is plenty for a single poll loop reader.
            SqlitePoolOptions::new()
                .max_connections(1)
                .connect_with(options.clone())
        })
        .await?;

        Ok(Self { pool })
    }

    pub async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS products (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                url TEXT NOT NULL,
                name TEXT NOT NULL,
                active BOOLEAN NOT NULL DEFAULT TRUE,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        info!("registry schema ready");
        Ok(())
    }

    pub async fn add_product(&self, url: &str, name: &str) -> Result<i64> {
        if url::Url::parse(url).is_err() {
            return Err(AppError::Validation(format!("invalid product URL: {url}")));
        }

        let result = sqlx::query("INSERT INTO products (url, name, active) VALUES (?, ?, TRUE)")
            .bind(url)
            .bind(name)
            .execute(&self.pool)
            .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn remove_product(&self, product_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM products WHERE id = ?")
            .bind(product_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn set_active(&self, product_id: i64, active: bool) -> Result<()> {
        let result = sqlx::query(
            "UPDATE products SET active = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
        )
        .bind(active)
        .bind(product_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::Registry(format!("product {product_id} not found")));
        }
        Ok(())
    }
}

#[async_trait]
impl ProductRegistry for SqliteRegistry {
    async fn list_active_products(&self) -> Result<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            "SELECT id, url, name, active FROM products WHERE active = TRUE ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }
}

/// Reads the management surface's product endpoint, which returns the active
/// products as a JSON array.
pub struct HttpRegistry {
    client: Client,
    endpoint: String,
}

impl HttpRegistry {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::Registry(format!("client build failed: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl ProductRegistry for HttpRegistry {
    async fn list_active_products(&self) -> Result<Vec<Product>> {
        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .await
            .map_err(|e| AppError::Registry(format!("registry request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::Registry(format!(
                "registry endpoint returned {}",
                response.status()
            )));
        }

        let products: Vec<Product> = response
            .json()
            .await
            .map_err(|e| AppError::Registry(format!("registry returned bad JSON: {e}")))?;

        // The endpoint already filters, but a toggle can race the snapshot.
        Ok(products.into_iter().filter(|p| p.active).collect())
    }
}

/// Fixed product list, used when no registry backend is configured.
pub struct StaticRegistry {
    products: Vec<Product>,
}

impl StaticRegistry {
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    pub fn single(url: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(vec![Product::new(1, url, name)])
    }
}

#[async_trait]
impl ProductRegistry for StaticRegistry {
    async fn list_active_products(&self) -> Result<Vec<Product>> {
        Ok(self
            .products
            .iter()
            .filter(|p| p.active)
            .cloned()
            .collect())
    }
}
