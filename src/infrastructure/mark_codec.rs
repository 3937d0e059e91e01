// Mark codec - binary storage format and editable text view for mark maps
//
// Binary entry: u8 label_len | u8 slot | u32 ts_seconds (BE) | label bytes.
// A label_len of 0 ends the stream.
use crate::domain::mark::{storable_label, Mark, MarkMap, Palette};
use crate::domain::time::format_iso_in;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone};
use thiserror::Error;

const ENTRY_HEADER: usize = 6;
const TEXT_SEPARATOR: &str = "::";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MarkCodecError {
    /// Encoded marks do not fit in the storage budget.
    #[error("Too much data (limit={limit}B)")]
    BudgetExceeded { limit: usize, required: usize },
}

/// Decodes a mark buffer. Slots are reduced into the palette range, later
/// entries replace earlier ones on the same slot, and a truncated trailing
/// entry is ignored.
pub fn decode_marks(mut buf: &[u8], palette: &Palette) -> MarkMap {
    let mut marks = MarkMap::new();
    while buf.remaining() >= ENTRY_HEADER {
        let len = usize::from(buf.get_u8());
        if len == 0 {
            break;
        }
        let slot = palette.wrap(buf.get_u8());
        let ts = i64::from(buf.get_u32()) * 1000;
        if buf.remaining() < len {
            tracing::warn!("Truncated mark entry for slot {}, dropping tail", slot);
            break;
        }
        let label = String::from_utf8_lossy(&buf[..len]).into_owned();
        buf.advance(len);
        marks.insert(Mark::new(slot, ts, label));
    }
    marks
}

/// Encodes every mark in ascending slot order into at most `budget` bytes,
/// the closing zero byte included.
pub fn encode_marks(marks: &MarkMap, palette: &Palette, budget: usize) -> Result<Bytes, MarkCodecError> {
    let mut buf = BytesMut::with_capacity(budget);
    for mark in marks.ordered() {
        let label = wire_label(mark);
        let required = buf.len() + ENTRY_HEADER + label.len() + 1;
        if required > budget {
            return Err(MarkCodecError::BudgetExceeded {
                limit: budget,
                required: required + remaining_size(marks, mark.slot),
            });
        }
        buf.put_u8(label.len() as u8);
        buf.put_u8(palette.wrap(mark.slot));
        buf.put_u32(wire_seconds(mark.ts));
        buf.put_slice(label.as_bytes());
    }
    if buf.len() + 1 > budget {
        return Err(MarkCodecError::BudgetExceeded {
            limit: budget,
            required: buf.len() + 1,
        });
    }
    buf.put_u8(0);
    Ok(buf.freeze())
}

/// Encoded size of the marks after `slot`, for the overflow report.
fn remaining_size(marks: &MarkMap, slot: u8) -> usize {
    marks
        .ordered()
        .filter(|m| m.slot > slot)
        .map(|m| ENTRY_HEADER + wire_label(m).len())
        .sum()
}

/// Label as written; a no-op for marks built through `Mark::new`.
fn wire_label(mark: &Mark) -> String {
    storable_label(mark.slot, &mark.label)
}

fn wire_seconds(ts_ms: i64) -> u32 {
    ts_ms.div_euclid(1000).clamp(0, i64::from(u32::MAX)) as u32
}

/// One `#<slot> :: <local time> :: <label>` line per mark; an empty map
/// gives a single newline.
pub fn to_text(marks: &MarkMap) -> String {
    to_text_in(marks, &Local)
}

pub fn to_text_in<Tz: TimeZone>(marks: &MarkMap, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let lines: Vec<String> = marks
        .ordered()
        .map(|m| format!("#{} :: {} :: {}", m.slot, format_iso_in(m.ts, tz), wire_label(m)))
        .collect();
    lines.join("\n") + "\n"
}

/// Parses the text view. Lines without a `#<digits>` slot or a readable
/// timestamp are skipped; the last line for a slot wins.
pub fn parse_text(text: &str) -> MarkMap {
    parse_text_in(text, &Local)
}

pub fn parse_text_in<Tz: TimeZone>(text: &str, tz: &Tz) -> MarkMap {
    let mut marks = MarkMap::new();
    for line in text.split('\n') {
        if let Some(mark) = parse_line(line, tz) {
            marks.insert(mark);
        }
    }
    marks
}

fn parse_line<Tz: TimeZone>(line: &str, tz: &Tz) -> Option<Mark> {
    let mut parts = line.split(TEXT_SEPARATOR);
    let slot = parse_slot(parts.next()?)?;
    let ts = parse_timestamp(parts.next()?.trim(), tz)?;
    let label = parts.next().unwrap_or("").trim();
    Some(Mark::new(slot, ts, label))
}

fn parse_slot(part: &str) -> Option<u8> {
    let digits = part.trim().strip_prefix('#')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Accepts RFC 3339, or naive date/time forms read in `tz`.
fn parse_timestamp<Tz: TimeZone>(s: &str, tz: &Tz) -> Option<i64> {
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }
    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.timestamp_millis())
}
