use rand::seq::SliceRandom;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::Result;
use crate::alert::{self, CampaignConfig};
use crate::classifier::StockClassifier;
use crate::config::MonitorConfig;
use crate::fetcher::PageFetcher;
use crate::models::Product;
use crate::notifier::NotificationSink;
use crate::registry::ProductRegistry;
use crate::state::StockStateStore;

/// What one check of one product produced, mostly for logs and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    pub product_id: i64,
    pub in_stock: bool,
    /// True exactly when this check saw the out-of-stock to in-stock edge.
    pub transitioned: bool,
    pub alerts_sent: u32,
    pub alerts_failed: u32,
}

/// Drives the poll loop: snapshot the registry, walk the active products
/// sequentially, classify each page, and fire one alert campaign per
/// detected restock.
pub struct StockMonitor {
    registry: Arc<dyn ProductRegistry>,
    fetcher: PageFetcher,
    classifier: StockClassifier,
    sink: Arc<dyn NotificationSink>,
    state: StockStateStore,
    config: MonitorConfig,
    last_snapshot: Vec<Product>,
    cycles_completed: u64,
}

impl StockMonitor {
    pub fn new(
        registry: Arc<dyn ProductRegistry>,
        fetcher: PageFetcher,
        classifier: StockClassifier,
        sink: Arc<dyn NotificationSink>,
        config: MonitorConfig,
    ) -> Self {
        Self {
            registry,
            fetcher,
            classifier,
            sink,
            state: StockStateStore::new(),
            config,
            last_snapshot: Vec::new(),
            cycles_completed: 0,
        }
    }

    /// Runs until the shutdown flag flips. An in-flight alert campaign always
    /// finishes; shutdown is honored between products and during waits.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(
            alert_count = self.config.alert_count,
            alert_interval = self.config.alert_interval,
            check_interval_min = self.config.check_interval_min,
            check_interval_max = self.config.check_interval_max,
            "stock monitor started (state is in-memory and resets on restart)"
        );

        loop {
            self.run_cycle(&shutdown).await;

            if *shutdown.borrow() {
                break;
            }

            let wait = self.next_wait();
            debug!(secs = wait.as_secs(), "cycle complete, waiting");
            tokio::select! {
                _ = sleep(wait) => {}
                _ = shutdown.changed() => break,
            }
        }

        info!("stock monitor stopped");
    }

    /// One full pass over the active products. A failed registry read falls
    /// back to the last successful snapshot rather than skipping the cycle.
    pub async fn run_cycle(&mut self, shutdown: &watch::Receiver<bool>) -> Vec<CheckOutcome> {
        self.cycles_completed += 1;
        let cycle = self.cycles_completed;

        let products = match self.registry.list_active_products().await {
            Ok(products) => {
                self.last_snapshot = products.clone();
                products
            }
            Err(e) => {
                warn!(cycle, error = %e, "registry read failed, reusing last product snapshot");
                self.last_snapshot.clone()
            }
        };

        debug!(cycle, products = products.len(), "starting check cycle");

        let mut outcomes = Vec::with_capacity(products.len());
        for (index, product) in products.iter().enumerate() {
            match self.check_product(product).await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    // One bad product never halts the rest of the cycle.
                    warn!(
                        cycle,
                        product_id = product.id,
                        url = %product.url,
                        error = %e,
                        "check failed, skipping until next cycle"
                    );
                }
            }

            if *shutdown.borrow() {
                break;
            }

            if index + 1 < products.len() {
                sleep(Duration::from_secs(self.config.product_pause)).await;
            }
        }

        outcomes
    }

    /// Fetch, classify, compare against the stored state, and campaign on a
    /// fresh out-of-stock to in-stock edge.
    pub async fn check_product(&mut self, product: &Product) -> Result<CheckOutcome> {
        let html = self.fetcher.fetch(&product.url).await?;
        let observation = self.classifier.classify(&html);

        let was_in_stock = self.state.get(product.id);
        // Commit before the campaign so a re-check cannot re-trigger the
        // same edge mid-burst.
        self.state.set(product.id, observation.in_stock);

        let mut outcome = CheckOutcome {
            product_id: product.id,
            in_stock: observation.in_stock,
            transitioned: false,
            alerts_sent: 0,
            alerts_failed: 0,
        };

        match (was_in_stock, observation.in_stock) {
            (false, true) => {
                info!(
                    product_id = product.id,
                    name = %observation.display_name,
                    "restock detected"
                );
                outcome.transitioned = true;

                let campaign = CampaignConfig {
                    alert_count: self.config.alert_count,
                    alert_interval: Duration::from_secs(self.config.alert_interval),
                };
                let report =
                    alert::run_campaign(self.sink.as_ref(), &observation, &product.url, &campaign)
                        .await;
                outcome.alerts_sent = report.sent;
                outcome.alerts_failed = report.failed;
            }
            (true, true) => {
                debug!(product_id = product.id, "still in stock, no repeat alert");
            }
            (true, false) => {
                info!(
                    product_id = product.id,
                    "went out of stock, waiting for the next restock"
                );
            }
            (false, false) => {
                debug!(product_id = product.id, "still out of stock");
            }
        }

        Ok(outcome)
    }

    /// Draws the inter-cycle wait from the two configured values. A discrete
    /// choice, never a value in between; this desynchronizes the polling
    /// cadence against the scraped site.
    pub fn next_wait(&self) -> Duration {
        let bounds = [
            self.config.check_interval_min,
            self.config.check_interval_max,
        ];
        let secs = bounds
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(self.config.check_interval_min);
        Duration::from_secs(secs)
    }

    pub fn state(&self) -> &StockStateStore {
        &self.state
    }

    pub fn cycles_completed(&self) -> u64 {
        self.cycles_completed
    }
}
