use std::io::Write;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::{
    CHUNK_SIZE, FetchOutcome, MAX_ATTEMPTS, OrganismQuery, PAGE_SIZE, TaxonomyId,
    split_into_chunks,
};
use crate::error::HarvestError;
use crate::ncbi::EutilsClient;
use crate::output::OutputSink;
use crate::pacing::Pacing;
use crate::progress::{ProgressEvent, ProgressSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HarvestSettings {
    pub page_size: usize,
    pub chunk_size: usize,
    pub max_attempts: usize,
    pub pacing: Pacing,
}

impl Default for HarvestSettings {
    fn default() -> Self {
        Self {
            page_size: PAGE_SIZE,
            chunk_size: CHUNK_SIZE,
            max_attempts: MAX_ATTEMPTS,
            pacing: Pacing::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub taxonomy_id: String,
    pub total: usize,
    pub pages: usize,
    pub chunks_ok: usize,
    pub chunks_failed: usize,
    pub records_written: usize,
}

/// Pagination state. `processed` is the next `retstart` and always moves by a
/// whole page, whatever the previous page actually held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    pub processed: usize,
    pub total: usize,
}

impl PageCursor {
    pub fn new(total: usize) -> Self {
        Self {
            processed: 0,
            total,
        }
    }

    pub fn is_done(&self) -> bool {
        self.processed >= self.total
    }

    pub fn advance(self, page_size: usize) -> Self {
        Self {
            processed: self.processed + page_size,
            total: self.total,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageStats {
    pub chunks_ok: usize,
    pub chunks_failed: usize,
    pub records_written: usize,
}

pub struct Harvester<C: EutilsClient> {
    client: C,
    settings: HarvestSettings,
}

impl<C: EutilsClient> Harvester<C> {
    pub fn new(client: C, settings: HarvestSettings) -> Self {
        Self { client, settings }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn resolve_taxonomy(&self, organism: &str) -> Result<TaxonomyId, HarvestError> {
        self.client
            .search_taxonomy(organism)?
            .ok_or_else(|| HarvestError::UnknownOrganism(organism.to_string()))
    }

    pub fn probe_count(&self, term: &str, query: &OrganismQuery) -> Result<usize, HarvestError> {
        match self.client.count_genes(term, &query.contact)? {
            Some(count) if count > 0 => Ok(count),
            _ => Err(HarvestError::NoGenesFound(query.name.clone())),
        }
    }

    /// One esummary lookup with a bounded number of attempts and a constant
    /// backoff between them. Never fails the run.
    pub fn fetch_chunk(&self, ids: &[String], contact: &str) -> FetchOutcome {
        let max_attempts = self.settings.max_attempts.max(1);
        let mut reason = String::new();
        for attempt in 1..=max_attempts {
            match self.client.fetch_summaries(ids, contact) {
                Ok(records) => {
                    debug!(attempt, size = ids.len(), "chunk fetched");
                    return FetchOutcome::Success(records);
                }
                Err(err) => {
                    warn!(attempt, max_attempts, error = %err, "esummary attempt failed");
                    reason = err.to_string();
                    if attempt < max_attempts {
                        self.settings.pacing.before_retry();
                    }
                }
            }
        }
        FetchOutcome::Failure {
            attempts: max_attempts,
            reason,
        }
    }

    /// Fetches one page chunk by chunk, streaming names to `sink`. A chunk that
    /// exhausts its attempts is reported and skipped.
    pub fn harvest_page<W: Write>(
        &self,
        page: &[String],
        contact: &str,
        sink: &mut OutputSink<W>,
        progress: &dyn ProgressSink,
    ) -> Result<PageStats, HarvestError> {
        let mut stats = PageStats::default();
        for chunk in split_into_chunks(page, self.settings.chunk_size) {
            match self.fetch_chunk(chunk, contact) {
                FetchOutcome::Success(records) => {
                    stats.records_written += sink.emit(&records)?;
                    stats.chunks_ok += 1;
                }
                FetchOutcome::Failure { attempts, reason } => {
                    let first_id = chunk.first().cloned().unwrap_or_default();
                    warn!(%first_id, size = chunk.len(), attempts, "giving up on chunk");
                    progress.event(ProgressEvent::ChunkFailed {
                        first_id,
                        size: chunk.len(),
                        attempts,
                        reason,
                    });
                    stats.chunks_failed += 1;
                }
            }
            self.settings.pacing.after_chunk();
        }
        Ok(stats)
    }

    pub fn run<W: Write>(
        &self,
        query: &OrganismQuery,
        sink: &mut OutputSink<W>,
        progress: &dyn ProgressSink,
    ) -> Result<RunSummary, HarvestError> {
        progress.event(ProgressEvent::Phase(format!(
            "Searching for organism {} in NCBI taxonomy...",
            query.name
        )));
        let taxonomy_id = self.resolve_taxonomy(&query.name)?;
        info!(organism = %query.name, %taxonomy_id, "taxonomy resolved");
        progress.event(ProgressEvent::Phase(format!(
            "Found taxonomy id {taxonomy_id}"
        )));

        let term = taxonomy_id.gene_search_term();
        let total = self.probe_count(&term, query)?;
        info!(%term, total, "gene count probed");
        progress.event(ProgressEvent::Phase(format!(
            "NCBI stores {total} genes for {}. Fetching their names...",
            query.name
        )));

        let mut summary = RunSummary {
            taxonomy_id: taxonomy_id.to_string(),
            total,
            ..RunSummary::default()
        };
        let mut cursor = PageCursor::new(total);
        while !cursor.is_done() {
            let page = self.client.search_gene_ids(
                &term,
                &query.contact,
                cursor.processed,
                self.settings.page_size,
            )?;
            if page.is_empty() {
                info!(offset = cursor.processed, total, "empty page, stopping pagination");
                break;
            }
            debug!(offset = cursor.processed, size = page.len(), "page fetched");

            let stats = self.harvest_page(&page, &query.contact, sink, progress)?;
            summary.pages += 1;
            summary.chunks_ok += stats.chunks_ok;
            summary.chunks_failed += stats.chunks_failed;
            summary.records_written += stats.records_written;

            cursor = cursor.advance(self.settings.page_size);
            progress.event(ProgressEvent::Page {
                processed: cursor.processed,
                total,
            });
        }

        progress.event(ProgressEvent::Finished(summary.clone()));
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_advances_by_whole_pages() {
        let cursor = PageCursor::new(6000);
        assert!(!cursor.is_done());
        let cursor = cursor.advance(PAGE_SIZE);
        assert_eq!(cursor.processed, 5000);
        assert!(!cursor.is_done());
        let cursor = cursor.advance(PAGE_SIZE);
        assert_eq!(cursor.processed, 10000);
        assert!(cursor.is_done());
    }

    #[test]
    fn default_settings_use_fixed_constants() {
        let settings = HarvestSettings::default();
        assert_eq!(settings.page_size, 5000);
        assert_eq!(settings.chunk_size, 100);
        assert_eq!(settings.max_attempts, 3);
    }
}
