use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::channel::ChannelId;
use super::event::duration_from_secs;

/// A contiguous time series segment for one channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    pub id: ChannelId,
    pub sampling_rate: f64,
    pub start_time: DateTime<Utc>,
    pub samples: Vec<f64>,
}

impl Trace {
    pub fn new(id: ChannelId, sampling_rate: f64, start_time: DateTime<Utc>, samples: Vec<f64>) -> Self {
        Self { id, sampling_rate, start_time, samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sample interval in seconds
    pub fn delta(&self) -> f64 {
        1.0 / self.sampling_rate
    }

    /// Time of the last sample
    pub fn end_time(&self) -> DateTime<Utc> {
        let n = self.samples.len().saturating_sub(1) as f64;
        self.start_time + duration_from_secs(n * self.delta())
    }
}

/// Unordered collection of traces returned by the archive
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WaveformBuffer {
    traces: Vec<Trace>,
}

impl WaveformBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_traces(traces: Vec<Trace>) -> Self {
        Self { traces }
    }

    pub fn push(&mut self, trace: Trace) {
        self.traces.push(trace);
    }

    pub fn extend(&mut self, traces: impl IntoIterator<Item = Trace>) {
        self.traces.extend(traces);
    }

    pub fn len(&self) -> usize {
        self.traces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.traces.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Trace> {
        self.traces.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Trace> {
        self.traces.iter_mut()
    }

    pub fn retain(&mut self, f: impl FnMut(&Trace) -> bool) {
        self.traces.retain(f);
    }

    /// Channel ids in buffer order, repeats included
    pub fn ids(&self) -> Vec<&ChannelId> {
        self.traces.iter().map(|t| &t.id).collect()
    }

    /// Number of traces per channel id
    pub fn count_by_id(&self) -> BTreeMap<&ChannelId, usize> {
        let mut counts = BTreeMap::new();
        for trace in &self.traces {
            *counts.entry(&trace.id).or_insert(0) += 1;
        }
        counts
    }

    pub fn get(&self, id: &str) -> Option<&Trace> {
        self.traces.iter().find(|t| t.id.as_str() == id)
    }

    pub fn into_traces(self) -> Vec<Trace> {
        self.traces
    }
}

impl IntoIterator for WaveformBuffer {
    type Item = Trace;
    type IntoIter = std::vec::IntoIter<Trace>;

    fn into_iter(self) -> Self::IntoIter {
        self.traces.into_iter()
    }
}

impl FromIterator<Trace> for WaveformBuffer {
    fn from_iter<I: IntoIterator<Item = Trace>>(iter: I) -> Self {
        Self { traces: iter.into_iter().collect() }
    }
}
