//! Chapter enrichment over a table of entries.
//!
//! Files of one entry are probed concurrently, bounded by a semaphore that
//! is shared by every pass running on the same [`Enricher`]. Entries are
//! handled one at a time and written back whole, so a crash between entries
//! leaves earlier ones enriched and later ones untouched.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::domain::{ContentEntry, FileRef};
use crate::store::{StoreError, Table};

use super::probe::ChapterProbe;

/// Probe counts for a single entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntryStats {
    pub probed: usize,
    pub failures: usize,
}

/// Outcome of enriching a whole table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichReport {
    /// Entries rewritten with new chapter data
    pub entries_updated: usize,

    /// Entries that needed no probing
    pub entries_skipped: usize,

    pub files_probed: usize,

    /// Probes that failed and degraded to an empty chapter list
    pub failures: usize,

    pub elapsed_ms: u64,
}

/// Enrichment engine with a bounded probe pool
pub struct Enricher {
    probe: Arc<dyn ChapterProbe>,
    permits: Arc<Semaphore>,
    concurrency: usize,
}

impl Enricher {
    /// Create an enricher running at most `concurrency` probes at once
    pub fn new(probe: Arc<dyn ChapterProbe>, concurrency: usize) -> Self {
        let concurrency = concurrency.max(1);
        Self {
            probe,
            permits: Arc::new(Semaphore::new(concurrency)),
            concurrency,
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Attach chapters to every file that lacks them.
    ///
    /// With `force`, existing chapter data is dropped first. File order is
    /// preserved whatever order the probes finish in.
    pub async fn enrich_entry(
        &self,
        mut entry: ContentEntry,
        force: bool,
    ) -> (ContentEntry, EntryStats) {
        if force {
            entry.strip_chapters();
        }

        let handles: Vec<_> = entry
            .files
            .iter()
            .enumerate()
            .filter(|(_, file)| !file.is_enriched())
            .map(|(index, file)| {
                let target = probe_target(&entry, file);
                let probe = Arc::clone(&self.probe);
                let permits = Arc::clone(&self.permits);

                let handle = tokio::spawn(async move {
                    // The semaphore is never closed
                    let _permit = permits.acquire_owned().await.ok();
                    probe.probe(&target).await.map_err(|e| (target, e))
                });
                (index, handle)
            })
            .collect();

        let mut stats = EntryStats::default();

        for (index, handle) in handles {
            stats.probed += 1;
            let chapters = match handle.await {
                Ok(Ok(chapters)) => chapters,
                Ok(Err((target, e))) => {
                    warn!(id = %entry.id, target = %target, error = %e, "Chapter probe failed");
                    stats.failures += 1;
                    Vec::new()
                }
                Err(e) => {
                    warn!(
                        id = %entry.id,
                        file = %entry.files[index].name,
                        error = %e,
                        "Chapter probe task aborted"
                    );
                    stats.failures += 1;
                    Vec::new()
                }
            };
            entry.files[index].chapters = Some(chapters);
        }

        (entry, stats)
    }

    /// Enrich every entry in `table`, writing each back as it completes
    pub async fn enrich_table(
        &self,
        table: &Table<ContentEntry>,
        force: bool,
    ) -> Result<EnrichReport, StoreError> {
        let started = Instant::now();
        let mut report = EnrichReport::default();

        let ids: Vec<String> = table
            .list()?
            .into_iter()
            .map(|entry| entry.id.to_string())
            .collect();

        for id in ids {
            // Re-read so the write is based on the latest stored version
            let Some(entry) = table.get(&id)? else {
                debug!(id = %id, "Entry removed during enrichment");
                continue;
            };

            let (entry, stats) = self.enrich_entry(entry, force).await;
            if stats.probed == 0 {
                report.entries_skipped += 1;
                continue;
            }

            table.put(&entry)?;
            debug!(id = %id, probed = stats.probed, failures = stats.failures, "Entry enriched");

            report.entries_updated += 1;
            report.files_probed += stats.probed;
            report.failures += stats.failures;
        }

        report.elapsed_ms = started.elapsed().as_millis() as u64;
        info!(
            table = table.name(),
            probe = self.probe.name(),
            updated = report.entries_updated,
            probed = report.files_probed,
            failures = report.failures,
            elapsed_ms = report.elapsed_ms,
            "Metadata enrichment completed"
        );

        Ok(report)
    }
}

/// Scanned entries are probed on disk, list entries through their URL
fn probe_target(entry: &ContentEntry, file: &FileRef) -> String {
    if entry.path.is_empty() {
        file.url.clone()
    } else {
        Path::new(&entry.path)
            .join(&file.name)
            .to_string_lossy()
            .into_owned()
    }
}
