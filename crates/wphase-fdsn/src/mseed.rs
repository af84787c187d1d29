//! miniSEED 2 record decoding.
//!
//! Records must carry blockette 1000. Header byte order is detected from the
//! start year; sample words follow the word order given in blockette 1000.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::collections::HashMap;
use wphase_core::error::{Result, WphaseError};
use wphase_core::models::{ChannelId, Trace};

const FIXED_HEADER_LEN: usize = 48;
const STEIM_FRAME_LEN: usize = 64;

/// Smallest record length allowed by the SEED format
const MIN_RECORD_LEN: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Encoding {
    Int16,
    Int32,
    Float32,
    Float64,
    Steim1,
    Steim2,
}

impl Encoding {
    fn from_code(code: u8) -> Result<Self> {
        match code {
            1 => Ok(Encoding::Int16),
            3 => Ok(Encoding::Int32),
            4 => Ok(Encoding::Float32),
            5 => Ok(Encoding::Float64),
            10 => Ok(Encoding::Steim1),
            11 => Ok(Encoding::Steim2),
            other => Err(decode_error(format!("unsupported data encoding {}", other))),
        }
    }
}

fn decode_error(reason: impl Into<String>) -> WphaseError {
    WphaseError::Decode { reason: reason.into() }
}

/// Byte reader fixed to one byte order
#[derive(Clone, Copy)]
struct Bytes<'a> {
    data: &'a [u8],
    big_endian: bool,
}

impl<'a> Bytes<'a> {
    fn array<const N: usize>(&self, offset: usize) -> Result<[u8; N]> {
        self.data
            .get(offset..offset + N)
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| decode_error(format!("record truncated at byte {}", offset)))
    }

    fn u8(&self, offset: usize) -> Result<u8> {
        Ok(self.array::<1>(offset)?[0])
    }

    fn u16(&self, offset: usize) -> Result<u16> {
        let b = self.array::<2>(offset)?;
        Ok(if self.big_endian { u16::from_be_bytes(b) } else { u16::from_le_bytes(b) })
    }

    fn i16(&self, offset: usize) -> Result<i16> {
        Ok(self.u16(offset)? as i16)
    }

    fn u32(&self, offset: usize) -> Result<u32> {
        let b = self.array::<4>(offset)?;
        Ok(if self.big_endian { u32::from_be_bytes(b) } else { u32::from_le_bytes(b) })
    }

    fn i32(&self, offset: usize) -> Result<i32> {
        Ok(self.u32(offset)? as i32)
    }

    fn f32(&self, offset: usize) -> Result<f32> {
        Ok(f32::from_bits(self.u32(offset)?))
    }

    fn f64(&self, offset: usize) -> Result<f64> {
        let b = self.array::<8>(offset)?;
        Ok(if self.big_endian { f64::from_be_bytes(b) } else { f64::from_le_bytes(b) })
    }

    fn text(&self, offset: usize, len: usize) -> Result<String> {
        let raw = self
            .data
            .get(offset..offset + len)
            .ok_or_else(|| decode_error("record truncated in identifier"))?;
        Ok(String::from_utf8_lossy(raw).trim().to_string())
    }
}

/// One decoded record before merging
struct Record {
    id: ChannelId,
    sampling_rate: f64,
    start_time: DateTime<Utc>,
    samples: Vec<f64>,
}

/// What a framed record turned out to hold
enum Decoded {
    Samples(Record),
    /// Log, empty or zero-rate record
    Empty,
    /// The record's length is known but its contents could not be decoded
    Skipped { source: String, error: WphaseError },
}

/// Decode a stream of concatenated miniSEED records.
///
/// Contiguous records of one channel are merged into a single trace. A gap or
/// overlap larger than half a sample starts a new trace for that channel.
/// Records whose contents cannot be decoded are skipped. Decoding stops at the
/// first record whose length cannot be established, keeping what came before.
pub fn decode_records(data: &[u8]) -> Vec<Trace> {
    let mut traces: Vec<Trace> = Vec::new();
    let mut latest: HashMap<ChannelId, usize> = HashMap::new();
    let mut offset = 0;

    while offset < data.len() {
        let remaining = &data[offset..];
        if remaining.len() < FIXED_HEADER_LEN {
            tracing::warn!(offset, bytes = remaining.len(), "Ignoring trailing bytes shorter than a record header");
            break;
        }

        let (decoded, record_len) = match decode_record(remaining) {
            Ok(framed) => framed,
            Err(e) => {
                tracing::warn!(offset, error = %e, traces = traces.len(), "Stopping at unreadable record");
                break;
            }
        };
        offset += record_len;

        let record = match decoded {
            Decoded::Samples(record) => record,
            Decoded::Empty => continue,
            Decoded::Skipped { source, error } => {
                tracing::warn!(record = %source, error = %error, "Skipping undecodable record");
                continue;
            }
        };

        if let Some(&index) = latest.get(&record.id) {
            let last = &mut traces[index];
            if continues(last, &record) {
                last.samples.extend(record.samples);
                continue;
            }
        }

        latest.insert(record.id.clone(), traces.len());
        traces.push(Trace::new(record.id, record.sampling_rate, record.start_time, record.samples));
    }

    traces
}

/// Whether `record` starts where `trace` ends, within half a sample
fn continues(trace: &Trace, record: &Record) -> bool {
    if (trace.sampling_rate - record.sampling_rate).abs() > 1e-6 * trace.sampling_rate {
        return false;
    }
    let expected = trace.start_time
        + Duration::microseconds((trace.len() as f64 * trace.delta() * 1e6).round() as i64);
    let offset_us = (record.start_time - expected).num_microseconds().unwrap_or(i64::MAX).abs();
    (offset_us as f64) <= 0.5 * trace.delta() * 1e6
}

/// Frame and decode one record, returning it with its length.
///
/// An error means the record length could not be established.
fn decode_record(data: &[u8]) -> Result<(Decoded, usize)> {
    let header = Bytes { data, big_endian: detect_big_endian(data)? };

    let station = header.text(8, 5)?;
    let location = header.text(13, 2)?;
    let channel = header.text(15, 3)?;
    let network = header.text(18, 2)?;
    let source = format!("{}.{}.{}.{}", network, station, location, channel);

    let mut b1000: Option<(u8, bool, usize)> = None;
    let mut blockette_offset = header.u16(46)? as usize;
    let mut micros = 0i64;
    for _ in 0..header.u8(39)? {
        if blockette_offset == 0 {
            break;
        }
        let kind = header.u16(blockette_offset)?;
        let next = header.u16(blockette_offset + 2)? as usize;
        match kind {
            1000 => {
                let encoding = header.u8(blockette_offset + 4)?;
                let word_order = header.u8(blockette_offset + 5)?;
                let length_exp = header.u8(blockette_offset + 6)?;
                if !(7..=20).contains(&length_exp) {
                    return Err(decode_error(format!(
                        "{}: invalid record length exponent {}",
                        source, length_exp
                    )));
                }
                b1000 = Some((encoding, word_order == 1, 1usize << length_exp));
            }
            1001 => micros += header.u8(blockette_offset + 5)? as i8 as i64,
            _ => {}
        }
        blockette_offset = next;
    }

    let (encoding, data_big_endian, record_len) =
        b1000.ok_or_else(|| decode_error(format!("record for {} has no blockette 1000", source)))?;

    if record_len < MIN_RECORD_LEN || record_len > data.len() {
        return Err(decode_error(format!(
            "{}: record length {} exceeds available {} bytes",
            source,
            record_len,
            data.len()
        )));
    }

    let decoded = match decode_body(&header, encoding, data_big_endian, record_len, micros) {
        Ok(Some(record)) => Decoded::Samples(record),
        Ok(None) => Decoded::Empty,
        Err(error) => Decoded::Skipped { source, error },
    };

    Ok((decoded, record_len))
}

/// Decode the timing and samples of a framed record
fn decode_body(
    header: &Bytes<'_>,
    encoding: u8,
    data_big_endian: bool,
    record_len: usize,
    micros: i64,
) -> Result<Option<Record>> {
    let sample_count = header.u16(30)? as usize;
    let sampling_rate = sample_rate(header.i16(32)?, header.i16(34)?);
    if sample_count == 0 || sampling_rate <= 0.0 {
        return Ok(None);
    }

    let mut start_time = btime(header, 20)? + Duration::microseconds(micros);
    let activity_flags = header.u8(36)?;
    let time_correction = header.i32(40)?;

    // Correction is applied here unless the header says it already was
    if activity_flags & 0x02 == 0 && time_correction != 0 {
        start_time += Duration::microseconds(time_correction as i64 * 100);
    }

    let id = ChannelId::new(
        &header.text(18, 2)?,
        &header.text(8, 5)?,
        &header.text(13, 2)?,
        &header.text(15, 3)?,
    )?;
    let encoding = Encoding::from_code(encoding)?;

    let data_offset = header.u16(44)? as usize;
    if data_offset < FIXED_HEADER_LEN || data_offset >= record_len {
        return Err(decode_error(format!("invalid data offset {}", data_offset)));
    }

    let payload = Bytes { data: &header.data[data_offset..record_len], big_endian: data_big_endian };
    let samples = decode_samples(payload, encoding, sample_count)?;

    Ok(Some(Record { id, sampling_rate, start_time, samples }))
}

/// A valid BTIME year reads between 1900 and 2100 only in the right byte order
fn detect_big_endian(data: &[u8]) -> Result<bool> {
    let be = Bytes { data, big_endian: true }.u16(20)?;
    if (1900..=2100).contains(&be) {
        return Ok(true);
    }
    let le = Bytes { data, big_endian: false }.u16(20)?;
    if (1900..=2100).contains(&le) {
        return Ok(false);
    }
    Err(decode_error("cannot determine header byte order"))
}

fn btime(header: &Bytes<'_>, offset: usize) -> Result<DateTime<Utc>> {
    let year = header.u16(offset)? as i32;
    let day = header.u16(offset + 2)? as u32;
    let hour = header.u8(offset + 4)? as u32;
    let minute = header.u8(offset + 5)? as u32;
    let second = header.u8(offset + 6)? as u32;
    let fraction = header.u16(offset + 8)? as i64;

    let date = NaiveDate::from_yo_opt(year, day)
        .ok_or_else(|| decode_error(format!("invalid record date {}-{:03}", year, day)))?;
    // Leap seconds are folded into the following minute
    let time = date
        .and_hms_opt(hour, minute, 0)
        .ok_or_else(|| decode_error(format!("invalid record time {:02}:{:02}", hour, minute)))?;

    Ok(time.and_utc() + Duration::seconds(second as i64) + Duration::microseconds(fraction * 100))
}

fn sample_rate(factor: i16, multiplier: i16) -> f64 {
    let (f, m) = (factor as f64, multiplier as f64);
    match (factor, multiplier) {
        (0, _) | (_, 0) => 0.0,
        (fa, mu) if fa > 0 && mu > 0 => f * m,
        (fa, _) if fa > 0 => -f / m,
        (_, mu) if mu > 0 => -m / f,
        _ => 1.0 / (f * m),
    }
}

fn decode_samples(payload: Bytes<'_>, encoding: Encoding, count: usize) -> Result<Vec<f64>> {
    let fixed = |width: usize| -> Result<()> {
        if count * width > payload.data.len() {
            Err(decode_error(format!("{} samples do not fit in {} bytes", count, payload.data.len())))
        } else {
            Ok(())
        }
    };

    match encoding {
        Encoding::Int16 => {
            fixed(2)?;
            (0..count).map(|i| payload.i16(i * 2).map(f64::from)).collect()
        }
        Encoding::Int32 => {
            fixed(4)?;
            (0..count).map(|i| payload.i32(i * 4).map(f64::from)).collect()
        }
        Encoding::Float32 => {
            fixed(4)?;
            (0..count).map(|i| payload.f32(i * 4).map(f64::from)).collect()
        }
        Encoding::Float64 => {
            fixed(8)?;
            (0..count).map(|i| payload.f64(i * 8)).collect()
        }
        Encoding::Steim1 => decode_steim(payload, count, steim1_word),
        Encoding::Steim2 => decode_steim(payload, count, steim2_word),
    }
}

fn sign_extend(value: u32, bits: u32) -> i32 {
    let shift = 32 - bits;
    ((value << shift) as i32) >> shift
}

/// Push `n` fields of `bits` width from the low end of `word`, most significant first
fn unpack(word: u32, n: u32, bits: u32, out: &mut Vec<i32>) {
    let mask = if bits == 32 { u32::MAX } else { (1u32 << bits) - 1 };
    for k in (0..n).rev() {
        out.push(sign_extend((word >> (k * bits)) & mask, bits));
    }
}

fn steim1_word(code: u32, word: u32, out: &mut Vec<i32>) -> Result<()> {
    match code {
        1 => unpack(word, 4, 8, out),
        2 => unpack(word, 2, 16, out),
        3 => out.push(word as i32),
        _ => {}
    }
    Ok(())
}

fn steim2_word(code: u32, word: u32, out: &mut Vec<i32>) -> Result<()> {
    let dnib = word >> 30;
    match (code, dnib) {
        (1, _) => unpack(word, 4, 8, out),
        (2, 1) => unpack(word, 1, 30, out),
        (2, 2) => unpack(word, 2, 15, out),
        (2, 3) => unpack(word, 3, 10, out),
        (3, 0) => unpack(word, 5, 6, out),
        (3, 1) => unpack(word, 6, 5, out),
        (3, 2) => unpack(word, 7, 4, out),
        (0, _) => {}
        (c, d) => return Err(decode_error(format!("invalid Steim2 nibbles {}/{}", c, d))),
    }
    Ok(())
}

/// Integrate Steim differences into samples
fn decode_steim(
    payload: Bytes<'_>,
    count: usize,
    word_fn: fn(u32, u32, &mut Vec<i32>) -> Result<()>,
) -> Result<Vec<f64>> {
    let frames = payload.data.len() / STEIM_FRAME_LEN;
    if frames == 0 {
        return Err(decode_error("no Steim frames in record"));
    }

    let mut diffs: Vec<i32> = Vec::with_capacity(count);
    let mut first = 0i32;
    let mut last = 0i32;

    for frame in 0..frames {
        let base = frame * STEIM_FRAME_LEN;
        let nibbles = payload.u32(base)?;
        for w in 1..16u32 {
            let word = payload.u32(base + w as usize * 4)?;
            if frame == 0 && w == 1 {
                first = word as i32;
                continue;
            }
            if frame == 0 && w == 2 {
                last = word as i32;
                continue;
            }
            let code = (nibbles >> (30 - 2 * w)) & 0x3;
            word_fn(code, word, &mut diffs)?;
        }
        if diffs.len() >= count {
            break;
        }
    }

    if diffs.len() < count {
        return Err(decode_error(format!("expected {} samples, frames hold {}", count, diffs.len())));
    }

    // The first difference refers to the previous record and is not used
    let mut samples = Vec::with_capacity(count);
    let mut current = first;
    samples.push(current as f64);
    for d in &diffs[1..count] {
        current = current.wrapping_add(*d);
        samples.push(current as f64);
    }

    if current != last {
        tracing::debug!(expected = last, decoded = current, "Steim reverse integration constant mismatch");
    }

    Ok(samples)
}
