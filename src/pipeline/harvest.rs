// src/pipeline/harvest.rs

//! Company link harvesting pipeline.

use chrono::Utc;

use crate::error::{AppError, Result};
use crate::models::{Config, HarvestStats};
use crate::render::Renderer;
use crate::services::LinkHarvester;
use crate::storage::RecordStorage;

/// Run the link harvester over `labels`, in order.
///
/// The renderer is closed exactly once before returning, whether the run
/// finished or stopped on an unrecoverable error.
pub async fn run_harvester<R: Renderer>(
    config: &Config,
    storage: &dyn RecordStorage,
    mut renderer: R,
    labels: &[String],
) -> Result<HarvestStats> {
    let result = harvest_labels(config, storage, &mut renderer, labels).await;

    if let Err(e) = renderer.close().await {
        log::warn!("Failed to close renderer: {}", e);
    }

    result
}

async fn harvest_labels<R: Renderer>(
    config: &Config,
    storage: &dyn RecordStorage,
    renderer: &mut R,
    labels: &[String],
) -> Result<HarvestStats> {
    let harvester = LinkHarvester::new(&config.harvest)?;
    storage.init_links().await?;

    let mut stats = HarvestStats::new(labels.len());
    log::info!("Harvesting company links for {} batches", labels.len());

    for (i, label) in labels.iter().enumerate() {
        log::info!("[{}/{}] Batch {}", i + 1, labels.len(), label);

        match harvest_label(&harvester, storage, renderer, label).await {
            Ok(0) => {
                log::warn!(
                    "No companies found for batch {}. Check URL or selectors.",
                    label
                );
                stats.empty_labels.push(label.clone());
            }
            Ok(count) => {
                stats.link_count += count;
                log::info!("Scraped {} company links from batch {}", count, label);
            }
            Err(e) => {
                log::error!("Error processing batch {}: {}", label, e);
                stats.failed_labels.push(label.clone());
            }
        }
    }

    stats.end_time = Utc::now();
    log::info!(
        "Harvest finished: {} links across {} batches ({} empty, {} failed) in {}s",
        stats.link_count,
        stats.label_count,
        stats.empty_labels.len(),
        stats.failed_labels.len(),
        stats.elapsed_secs()
    );

    Ok(stats)
}

/// Harvest one label and persist its links as a single batch.
async fn harvest_label<R: Renderer>(
    harvester: &LinkHarvester,
    storage: &dyn RecordStorage,
    renderer: &mut R,
    label: &str,
) -> Result<usize> {
    let links = harvester
        .harvest(renderer, label)
        .await
        .map_err(|e| AppError::harvest(label, e))?;

    if !links.is_empty() {
        storage
            .append_links(&links)
            .await
            .map_err(|e| AppError::harvest(label, e))?;
    }

    Ok(links.len())
}
