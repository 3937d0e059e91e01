// CSV export - fixed-width text rows streamed as a chunked response body
use crate::domain::sample::{SampleField, SampleRecord};
use axum::body::Body;
use axum::http::{header, Response, StatusCode};
use bytes::{BufMut, Bytes, BytesMut};
use futures::stream::Stream;
use std::convert::Infallible;

pub const CSV_HEADER: &str = "time_offset, pm10, pm25, pm40, pm100, rh, t, voc, nox\n";

/// Cell widths for the offset column followed by one per `SampleField::ALL`.
const CELL_WIDTHS: [usize; 9] = [9, 6, 6, 6, 6, 6, 7, 7, 7];
const ROWS_PER_CHUNK: usize = 20;

/// Renders one cell: shortest float text (always with a fraction part)
/// cut to `width`, a dangling `.` dropped, right-aligned. Values whose
/// integer part does not fit are written as an empty cell.
fn format_cell(value: Option<f64>, width: usize, column: &str) -> String {
    let Some(v) = value else {
        return " ".repeat(width);
    };
    let mut full = v.to_string();
    if !full.contains('.') {
        full.push_str(".0");
    }
    let cut: String = full.chars().take(width).collect();
    if !cut.contains('.') {
        tracing::warn!("Value too long for CSV column {} ({} chars): {}", column, width, v);
        return " ".repeat(width);
    }
    format!("{:>width$}", cut.trim_end_matches('.'), width = width)
}

/// One CSV line; the first column is seconds between the sample and `fetched_at_ms`.
pub fn format_row(sample: &SampleRecord, fetched_at_ms: i64) -> String {
    let offset = fetched_at_ms.abs_diff(sample.ts) as f64 / 1000.0;
    let mut cells = Vec::with_capacity(CELL_WIDTHS.len());
    cells.push(format_cell(Some(offset), CELL_WIDTHS[0], "time_offset"));
    for (field, width) in SampleField::ALL.iter().zip(&CELL_WIDTHS[1..]) {
        cells.push(format_cell(sample.get(*field), *width, field.key()));
    }
    let mut line = cells.join(",");
    line.push('\n');
    line
}

/// Header chunk first, then rows newest-first grouped into fixed-size
/// chunks. `samples` is in ascending time order, as decoded.
pub fn csv_stream(
    samples: Vec<SampleRecord>,
    fetched_at_ms: i64,
) -> impl Stream<Item = Result<Bytes, Infallible>> {
    async_stream::stream! {
        yield Ok(Bytes::from_static(CSV_HEADER.as_bytes()));
        for rows in samples.rchunks(ROWS_PER_CHUNK) {
            let mut chunk = BytesMut::new();
            for sample in rows.iter().rev() {
                chunk.put_slice(format_row(sample, fetched_at_ms).as_bytes());
            }
            yield Ok(chunk.freeze());
        }
    }
}

pub fn csv_response(samples: Vec<SampleRecord>, fetched_at_ms: i64) -> Result<Response<Body>, StatusCode> {
    tracing::debug!("Streaming {} samples as CSV", samples.len());
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/csv")
        .body(Body::from_stream(csv_stream(samples, fetched_at_ms)))
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}
