use std::time::Duration;
use tracing::{debug, info, warn};

use crate::models::StockObservation;
use crate::notifier::{Alert, NotificationSink};

/// How one campaign delivers its burst: `alert_count` notifications with
/// `alert_interval` between consecutive sends, no delay after the last.
#[derive(Debug, Clone)]
pub struct CampaignConfig {
    pub alert_count: u32,
    pub alert_interval: Duration,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CampaignReport {
    pub sent: u32,
    pub failed: u32,
}

/// Sends the fixed notification burst for one restock of one product.
///
/// A failed send is logged and the campaign moves on to the next index; the
/// underlying state change is real whether or not every delivery lands, so
/// one unreachable-sink error never suppresses the rest of the burst.
pub async fn run_campaign(
    sink: &dyn NotificationSink,
    observation: &StockObservation,
    product_url: &str,
    config: &CampaignConfig,
) -> CampaignReport {
    let mut report = CampaignReport::default();

    info!(
        name = %observation.display_name,
        count = config.alert_count,
        "starting alert campaign"
    );

    for index in 1..=config.alert_count {
        let alert = build_alert(observation, product_url, index, config.alert_count);

        match sink.send_alert(&alert).await {
            Ok(()) => {
                report.sent += 1;
                debug!(index, total = config.alert_count, "alert sent");
            }
            Err(e) => {
                report.failed += 1;
                warn!(index, total = config.alert_count, error = %e, "alert send failed, continuing");
            }
        }

        if index < config.alert_count {
            tokio::time::sleep(config.alert_interval).await;
        }
    }

    info!(
        sent = report.sent,
        failed = report.failed,
        "alert campaign finished"
    );

    report
}

fn build_alert(
    observation: &StockObservation,
    product_url: &str,
    index: u32,
    total: u32,
) -> Alert {
    Alert {
        title: "🚨 Back in stock!".to_string(),
        description: format!(
            "**{}**\n[👉 Open product page]({product_url})",
            observation.display_name
        ),
        image_url: observation.image_url.clone(),
        footer: format!("Restock alert {index}/{total}"),
    }
}
