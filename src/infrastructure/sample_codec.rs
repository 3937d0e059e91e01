// Sample record codec - fixed-stride binary feed to sorted sample records
//
// Each record is 24 bytes, big-endian:
//   f64 delta_ms | u16 pm10 pm25 pm40 pm100 | i16 rh t voc nox
use crate::domain::sample::{SampleField, SampleRecord};
use bytes::{Buf, BufMut, Bytes, BytesMut};

pub const RECORD_SIZE: usize = 24;

/// `delta_ms` value marking a record without a timestamp.
const TS_SENTINEL: f64 = -1.0;

/// Decodes every complete record in `buffer`, sorted ascending by timestamp.
///
/// `reference_ts` is the wall-clock time (epoch ms) the buffer was fetched;
/// each record stores how long before that moment it was taken. A trailing
/// partial record is ignored. Records whose delta is the sentinel, not
/// finite, or too large to place on the timeline are dropped, so nothing
/// ever lands on `reference_ts` by accident.
pub fn decode(buffer: &[u8], reference_ts: i64) -> Vec<SampleRecord> {
    let mut samples: Vec<SampleRecord> = buffer
        .chunks_exact(RECORD_SIZE)
        .filter_map(|chunk| decode_record(chunk, reference_ts))
        .collect();

    // Feed is newest-first; stable sort keeps duplicate timestamps in feed order.
    samples.sort_by_key(|s| s.ts);
    samples
}

fn decode_record(mut chunk: &[u8], reference_ts: i64) -> Option<SampleRecord> {
    let delta = chunk.get_f64();
    let raw: [u16; 8] = std::array::from_fn(|_| chunk.get_u16());

    if delta == TS_SENTINEL || !delta.is_finite() {
        return None;
    }
    // The cast saturates for out-of-range deltas; those records are dropped.
    let ts = reference_ts.checked_sub(delta.round() as i64)?;

    let mut sample = SampleRecord::new(ts);
    for (field, raw) in SampleField::ALL.into_iter().zip(raw) {
        sample.set(field, scale(field, raw));
    }
    Some(sample)
}

fn scale(field: SampleField, raw: u16) -> Option<f64> {
    if raw == field.sentinel() {
        return None;
    }
    let value = if field.is_particulate() {
        f64::from(raw)
    } else {
        f64::from(raw as i16)
    };
    Some(value / field.divisor())
}

/// One record as it appears on the wire, before scaling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawSample {
    pub delta_ms: f64,
    pub pm: [u16; 4],
    pub aux: [i16; 4],
}

impl RawSample {
    /// A record with every value field set to its sentinel.
    pub fn empty(delta_ms: f64) -> Self {
        Self {
            delta_ms,
            pm: [0xffff; 4],
            aux: [0x7fff; 4],
        }
    }

    pub fn put(&self, buf: &mut BytesMut) {
        buf.put_f64(self.delta_ms);
        self.pm.iter().for_each(|v| buf.put_u16(*v));
        self.aux.iter().for_each(|v| buf.put_i16(*v));
    }
}

/// Concatenates records into a feed buffer.
pub fn encode(records: &[RawSample]) -> Bytes {
    let mut buf = BytesMut::with_capacity(records.len() * RECORD_SIZE);
    for record in records {
        record.put(&mut buf);
    }
    buf.freeze()
}
