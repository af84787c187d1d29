//! Chunked, concurrent bulk waveform retrieval.

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use wphase_core::config::AcquisitionConfig;
use wphase_core::error::{Result, WphaseError};
use wphase_core::models::{ChannelId, TimeWindows, Trace, WaveformBuffer};
use wphase_core::ports::{BulkRequestLine, WaveformArchive};

/// Counters describing one fetch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchReport {
    /// Request lines sent to the archive
    pub requested: usize,
    /// Channels skipped because their window had not yet closed
    pub incomplete: usize,
    pub chunks: usize,
    pub failed_chunks: usize,
    /// Traces received across all successful chunks
    pub traces: usize,
}

#[derive(Debug, Clone, Default)]
pub struct FetchOutcome {
    pub buffer: WaveformBuffer,
    pub report: FetchReport,
}

/// Splits a channel list into bulk requests and runs them concurrently
#[derive(Debug, Clone)]
pub struct BulkFetcher {
    chunk_len: usize,
    max_concurrent: usize,
    timeout: Option<Duration>,
}

impl BulkFetcher {
    pub fn new(chunk_len: usize) -> Self {
        Self { chunk_len: chunk_len.max(1), max_concurrent: 4, timeout: None }
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn from_config(config: &AcquisitionConfig) -> Self {
        Self::new(config.bulk_chunk_len.value)
            .with_max_concurrent(config.max_concurrent_requests.value)
            .with_timeout(config.request_timeout())
    }

    pub fn chunk_len(&self) -> usize {
        self.chunk_len
    }

    /// Fetch every channel that has a window.
    ///
    /// When `now` is given, channels whose window ends at or after `now` are
    /// skipped. Failed chunks are logged and counted; they never fail the call.
    pub async fn fetch(
        &self,
        archive: &dyn WaveformArchive,
        channels: &[ChannelId],
        windows: &TimeWindows,
        now: Option<DateTime<Utc>>,
    ) -> FetchOutcome {
        let mut report = FetchReport::default();

        let mut lines = Vec::with_capacity(channels.len());
        for id in channels {
            let Some(window) = windows.get(id) else {
                tracing::debug!(channel = %id, "No request window, skipping");
                continue;
            };
            if let Some(now) = now {
                if window.end >= now {
                    report.incomplete += 1;
                    continue;
                }
            }
            lines.push(BulkRequestLine::new(id, window));
        }

        report.requested = lines.len();
        let chunks: Vec<&[BulkRequestLine]> = lines.chunks(self.chunk_len).collect();
        report.chunks = chunks.len();

        tracing::info!(
            endpoint = archive.endpoint(),
            channels = report.requested,
            chunks = report.chunks,
            "Requesting waveforms"
        );

        let mut results: Vec<(usize, Result<Vec<Trace>>)> = stream::iter(chunks.into_iter().enumerate())
            .map(|(index, chunk)| async move { (index, self.fetch_chunk(archive, chunk).await) })
            .buffer_unordered(self.max_concurrent)
            .collect()
            .await;

        // Concatenate in chunk order so repeated runs produce the same buffer
        results.sort_by_key(|(index, _)| *index);

        let mut buffer = WaveformBuffer::new();
        for (index, result) in results {
            match result {
                Ok(traces) => buffer.extend(traces),
                Err(e) => {
                    tracing::warn!(
                        endpoint = archive.endpoint(),
                        chunk = index,
                        error = %e,
                        "Bulk waveform request failed"
                    );
                    report.failed_chunks += 1;
                }
            }
        }
        report.traces = buffer.len();

        if report.chunks > 0 && report.failed_chunks == report.chunks {
            tracing::warn!(endpoint = archive.endpoint(), "Every bulk request failed");
        }

        FetchOutcome { buffer, report }
    }

    async fn fetch_chunk(&self, archive: &dyn WaveformArchive, chunk: &[BulkRequestLine]) -> Result<Vec<Trace>> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, archive.fetch_bulk(chunk))
                .await
                .map_err(|_| WphaseError::FetchTimeout {
                    endpoint: archive.endpoint().to_string(),
                    seconds: limit.as_secs_f64(),
                })?,
            None => archive.fetch_bulk(chunk).await,
        }
    }
}
