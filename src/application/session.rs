// Chart session - per-load state driving hover, click-to-mark and mark edits
use crate::application::highlight::{classify, idle, Highlight};
use crate::application::mark_store::{AddOutcome, EditOutcome, MarkStore};
use crate::application::nearest::{NearestResolver, ScreenPoint};
use crate::domain::chart::{ChartData, TooltipLine};
use crate::domain::sample::{SampleField, SampleRecord};

/// Cursor position in chart-local pixels plus the time under it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pointer {
    pub x: f64,
    pub y: f64,
    pub ts: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HoverView {
    pub sample: SampleRecord,
    pub series: Option<SampleField>,
    pub highlight: Highlight,
    pub tooltip: Vec<TooltipLine>,
}

pub struct ChartSession {
    chart: ChartData,
    marks: MarkStore,
    resolver: NearestResolver,
}

impl ChartSession {
    pub fn new(chart: ChartData, marks: MarkStore) -> Self {
        Self {
            chart,
            marks,
            resolver: NearestResolver::new(Vec::new()),
        }
    }

    pub fn chart(&self) -> &ChartData {
        &self.chart
    }

    pub fn marks(&self) -> &MarkStore {
        &self.marks
    }

    /// Reseeds the nearest-series partition after the renderer has laid out
    /// the points.
    pub fn set_layout(&mut self, points: impl IntoIterator<Item = ScreenPoint>) {
        self.resolver = NearestResolver::new(points);
    }

    pub fn hover(&mut self, pointer: Pointer) -> Option<HoverView> {
        let found = self
            .resolver
            .resolve(&self.chart.samples, pointer.ts, pointer.x, pointer.y)?;
        let sample = self.chart.samples[found.sample].clone();
        Some(HoverView {
            highlight: classify(found.series, &self.chart.series, &self.chart.axes),
            tooltip: self.chart.tooltip_lines(&sample, found.series),
            series: found.series,
            sample,
        })
    }

    pub fn leave(&self) -> Highlight {
        idle(&self.chart.series, &self.chart.axes)
    }

    /// Drops a mark on the sample nearest the click; `None` without samples.
    pub fn click(&mut self, pointer: Pointer) -> Option<AddOutcome> {
        let found = self
            .resolver
            .resolve(&self.chart.samples, pointer.ts, pointer.x, pointer.y)?;
        let ts = self.chart.samples[found.sample].ts;
        Some(self.marks.add_mark(ts))
    }

    pub fn edit_marks(&mut self, text: &str) -> EditOutcome {
        self.marks.apply_text(text)
    }
}
