//! Decimation of broadband traces to 1 Hz.
//!
//! Each supported rate has a cascade of windowed-sinc lowpass stages, every
//! stage filtering and keeping one sample in `factor`. Taps are centred on the
//! kept sample with zero padding at the edges, so a stage introduces no delay:
//! the start time is unchanged and `n` samples become `ceil(n / factor)`.

use rayon::prelude::*;
use std::f64::consts::PI;
use wphase_core::models::{ChannelId, Trace, WaveformBuffer};
use wphase_core::ports::Decimate;

const RATE_TOLERANCE: f64 = 1e-6;

/// Taps per unit of decimation factor
const TAPS_PER_FACTOR: usize = 20;

/// Fraction of the output Nyquist frequency kept by each stage
const PASSBAND_FRACTION: f64 = 0.8;

/// One lowpass-and-downsample stage
#[derive(Debug, Clone)]
pub struct FirStage {
    taps: Vec<f64>,
    factor: usize,
}

impl FirStage {
    pub fn lowpass(factor: usize) -> Self {
        let factor = factor.max(1);
        let taps = if factor == 1 {
            vec![1.0]
        } else {
            design_lowpass(TAPS_PER_FACTOR * factor + 1, PASSBAND_FRACTION / factor as f64)
        };
        Self { taps, factor }
    }

    pub fn factor(&self) -> usize {
        self.factor
    }

    pub fn taps(&self) -> &[f64] {
        &self.taps
    }

    /// Filter and keep every `factor`-th sample, starting with the first
    pub fn apply(&self, input: &[f64]) -> Vec<f64> {
        let n = input.len() as isize;
        let half = (self.taps.len() / 2) as isize;

        (0..input.len())
            .step_by(self.factor)
            .map(|centre| {
                let centre = centre as isize;
                self.taps
                    .iter()
                    .enumerate()
                    .filter_map(|(i, tap)| {
                        let j = centre + i as isize - half;
                        (0..n).contains(&j).then(|| tap * input[j as usize])
                    })
                    .sum()
            })
            .collect()
    }
}

/// Chain of decimation stages applied in order
#[derive(Debug, Clone)]
pub struct FirCascade {
    stages: Vec<FirStage>,
}

impl FirCascade {
    pub fn new(factors: &[usize]) -> Self {
        Self { stages: factors.iter().map(|f| FirStage::lowpass(*f)).collect() }
    }

    /// Overall decimation factor
    pub fn factor(&self) -> usize {
        self.stages.iter().map(FirStage::factor).product()
    }

    pub fn stages(&self) -> &[FirStage] {
        &self.stages
    }

    pub fn apply(&self, input: &[f64]) -> Vec<f64> {
        self.stages
            .iter()
            .fold(input.to_vec(), |samples, stage| stage.apply(&samples))
    }
}

impl Decimate for FirCascade {
    fn decimate(&self, trace: &Trace) -> Trace {
        Trace::new(
            trace.id.clone(),
            trace.sampling_rate / self.factor() as f64,
            trace.start_time,
            self.apply(&trace.samples),
        )
    }
}

/// Registry of decimation routines keyed by input sampling rate
pub struct Decimator {
    routines: Vec<(f64, Box<dyn Decimate>)>,
    band_codes: Vec<char>,
}

impl Decimator {
    /// Routines for 20, 40 and 50 Hz broadband (`B`) channels
    pub fn standard() -> Self {
        Self { routines: Vec::new(), band_codes: vec!['B'] }
            .with_routine(20.0, FirCascade::new(&[5, 4]))
            .with_routine(40.0, FirCascade::new(&[5, 4, 2]))
            .with_routine(50.0, FirCascade::new(&[5, 5, 2]))
    }

    /// Register or replace the routine for `rate`
    pub fn with_routine(mut self, rate: f64, routine: impl Decimate + 'static) -> Self {
        self.routines.retain(|(r, _)| (r - rate).abs() >= RATE_TOLERANCE);
        self.routines.push((rate, Box::new(routine)));
        self
    }

    /// Band codes treated as broadband
    pub fn with_band_codes(mut self, codes: &[char]) -> Self {
        self.band_codes = codes.to_vec();
        self
    }

    pub fn supported_rates(&self) -> Vec<f64> {
        let mut rates: Vec<f64> = self.routines.iter().map(|(r, _)| *r).collect();
        rates.sort_by(f64::total_cmp);
        rates
    }

    fn routine_for(&self, rate: f64) -> Option<&dyn Decimate> {
        self.routines
            .iter()
            .find(|(r, _)| (r - rate).abs() < RATE_TOLERANCE)
            .map(|(_, routine)| routine.as_ref())
    }

    /// Decimate every broadband trace in the buffer.
    ///
    /// Broadband traces at a rate without a routine are dropped and their ids
    /// returned. Other traces pass through unchanged.
    pub fn apply(&self, buffer: WaveformBuffer) -> (WaveformBuffer, Vec<ChannelId>) {
        let processed: Vec<Result<Trace, ChannelId>> = buffer
            .into_traces()
            .into_par_iter()
            .map(|trace| {
                if !self.band_codes.contains(&trace.id.band_code()) {
                    return Ok(trace);
                }
                match self.routine_for(trace.sampling_rate) {
                    Some(routine) => Ok(routine.decimate(&trace)),
                    None => Err(trace.id),
                }
            })
            .collect();

        let mut kept = WaveformBuffer::new();
        let mut dropped = Vec::new();
        for result in processed {
            match result {
                Ok(trace) => kept.push(trace),
                Err(id) => dropped.push(id),
            }
        }

        for trace in kept.iter_mut() {
            trace.samples.shrink_to_fit();
        }

        if !dropped.is_empty() {
            tracing::info!(dropped = dropped.len(), "Dropped broadband traces with unsupported sampling rate");
        }
        tracing::debug!(traces = kept.len(), "Decimation complete");

        (kept, dropped)
    }
}

impl Default for Decimator {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for Decimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Decimator")
            .field("rates", &self.supported_rates())
            .field("band_codes", &self.band_codes)
            .finish()
    }
}

/// Hamming-windowed sinc lowpass with unit DC gain.
///
/// `cutoff` is relative to the input Nyquist frequency.
fn design_lowpass(num_taps: usize, cutoff: f64) -> Vec<f64> {
    let m = (num_taps - 1) as f64 / 2.0;
    let taps: Vec<f64> = (0..num_taps)
        .map(|i| {
            let x = i as f64 - m;
            let sinc = if x.abs() < 1e-10 { cutoff } else { (PI * cutoff * x).sin() / (PI * x) };
            let window = 0.54 - 0.46 * (2.0 * PI * i as f64 / (num_taps - 1) as f64).cos();
            sinc * window
        })
        .collect();

    let sum: f64 = taps.iter().sum();
    taps.into_iter().map(|t| t / sum).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{id, origin, trace};

    fn sine(rate: f64, freq: f64, seconds: f64) -> Vec<f64> {
        let n = (rate * seconds) as usize;
        (0..n).map(|i| (2.0 * PI * freq * i as f64 / rate).sin()).collect()
    }

    #[test]
    fn test_taps_symmetric_unit_gain() {
        let stage = FirStage::lowpass(5);
        let taps = stage.taps();
        assert_eq!(taps.len(), 101);
        assert!((taps.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        for i in 0..taps.len() / 2 {
            assert!((taps[i] - taps[taps.len() - 1 - i]).abs() < 1e-15);
        }
    }

    #[test]
    fn test_stage_output_length() {
        let stage = FirStage::lowpass(4);
        assert_eq!(stage.apply(&[1.0; 8]).len(), 2);
        assert_eq!(stage.apply(&[1.0; 9]).len(), 3);
        assert!(stage.apply(&[]).is_empty());
    }

    #[test]
    fn test_cascade_factors() {
        assert_eq!(FirCascade::new(&[5, 4]).factor(), 20);
        assert_eq!(FirCascade::new(&[5, 4, 2]).factor(), 40);
        assert_eq!(FirCascade::new(&[5, 5, 2]).factor(), 50);
    }

    #[test]
    fn test_constant_preserved_away_from_edges() {
        let out = FirCascade::new(&[5, 4]).apply(&[3.0; 20 * 120]);
        assert_eq!(out.len(), 120);
        for v in &out[20..100] {
            assert!((v - 3.0).abs() < 1e-9, "got {}", v);
        }
    }

    #[test]
    fn test_low_frequency_passes_without_delay() {
        let out = FirCascade::new(&[5, 5, 2]).apply(&sine(50.0, 0.02, 600.0));
        let expected = sine(1.0, 0.02, 600.0);
        assert_eq!(out.len(), expected.len());
        for k in 30..570 {
            assert!((out[k] - expected[k]).abs() < 0.02, "sample {}: {} vs {}", k, out[k], expected[k]);
        }
    }

    #[test]
    fn test_high_frequency_is_removed() {
        let out = FirCascade::new(&[5, 4]).apply(&sine(20.0, 3.0, 600.0));
        let peak = out[30..570].iter().fold(0.0_f64, |m, v| m.max(v.abs()));
        assert!(peak < 0.01, "alias leaked with amplitude {}", peak);
    }

    #[test]
    fn test_standard_decimator_sample_counts() {
        let buffer = WaveformBuffer::from_traces(vec![
            trace("AU.A..BHZ", 20.0, 20 * 3600),
            trace("AU.B..BHZ", 40.0, 40 * 3600 + 7),
            trace("AU.C..BHZ", 50.0, 50 * 3600),
        ]);

        let (out, dropped) = Decimator::standard().apply(buffer);

        assert!(dropped.is_empty());
        for t in out.iter() {
            assert_eq!(t.sampling_rate, 1.0);
            assert_eq!(t.start_time, origin());
            assert!((t.len() as i64 - 3600).abs() <= 1, "{} has {} samples", t.id, t.len());
            assert_eq!(t.samples.capacity(), t.samples.len());
        }
    }

    #[test]
    fn test_unsupported_broadband_rate_dropped() {
        let buffer = WaveformBuffer::from_traces(vec![
            trace("AU.A..BHZ", 10.0, 100),
            trace("AU.B..LHZ", 1.0, 100),
            trace("AU.C..BHZ", 20.0, 100),
        ]);

        let (out, dropped) = Decimator::standard().apply(buffer);

        assert_eq!(dropped, vec![id("AU.A..BHZ")]);
        assert_eq!(out.len(), 2);
        let lh = out.get("AU.B..LHZ").unwrap();
        assert_eq!(lh.sampling_rate, 1.0);
        assert_eq!(lh.len(), 100);
        assert_eq!(out.get("AU.C..BHZ").unwrap().len(), 5);
    }

    #[test]
    fn test_custom_routine_and_band_codes() {
        let take_first = |t: &Trace| Trace::new(t.id.clone(), 1.0, t.start_time, t.samples[..1].to_vec());
        let decimator = Decimator::standard()
            .with_routine(10.0, take_first)
            .with_band_codes(&['B', 'H']);
        let buffer = WaveformBuffer::from_traces(vec![
            trace("AU.A..BHZ", 10.0, 100),
            trace("AU.B..HHZ", 100.0, 100),
        ]);

        let (out, dropped) = decimator.apply(buffer);

        assert_eq!(out.get("AU.A..BHZ").unwrap().len(), 1);
        assert_eq!(dropped, vec![id("AU.B..HHZ")]);
        assert_eq!(decimator.supported_rates(), vec![10.0, 20.0, 40.0, 50.0]);
    }
}
