use wphase_core::models::{ChannelId, WaveformBuffer};

/// Drop every trace of any channel that appears more than once.
///
/// Multiple segments for one channel mean gaps or overlaps, so none of them is
/// kept. Returns the remaining buffer and the sorted ids that were dropped.
pub fn remove_ambiguous(mut buffer: WaveformBuffer) -> (WaveformBuffer, Vec<ChannelId>) {
    let repeated: Vec<ChannelId> = buffer
        .count_by_id()
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(id, _)| id.clone())
        .collect();

    if !repeated.is_empty() {
        buffer.retain(|trace| repeated.binary_search(&trace.id).is_err());
        tracing::info!(dropped = repeated.len(), "Dropped channels with ambiguous segments");
    }

    (buffer, repeated)
}
