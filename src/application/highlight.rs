// Highlight classification for the hovered series
use crate::domain::sample::SampleField;
use crate::domain::series::{AxisGroup, SeriesDescriptor};

#[derive(Debug, Clone, PartialEq)]
pub struct Highlight {
    /// One flag per series, in descriptor order.
    pub series: Vec<(SampleField, bool)>,
    /// One flag per axis, in axis order; true when drawn in the foreground.
    pub axes: Vec<bool>,
}

impl Highlight {
    pub fn is_highlighted(&self, field: SampleField) -> bool {
        self.series.iter().any(|(f, hl)| *f == field && *hl)
    }
}

/// Flags the hovered series and every axis that carries it. With nothing
/// hovered, no series and no axis is flagged.
pub fn classify(hovered: Option<SampleField>, series: &[SeriesDescriptor], axes: &[AxisGroup]) -> Highlight {
    let is_hl = |field: SampleField| hovered == Some(field);
    Highlight {
        series: series.iter().map(|s| (s.field, is_hl(s.field))).collect(),
        axes: axes.iter().map(|a| a.fields().iter().any(|f| is_hl(*f))).collect(),
    }
}

/// State once the pointer leaves the chart: nothing highlighted, every axis
/// back in the foreground.
pub fn idle(series: &[SeriesDescriptor], axes: &[AxisGroup]) -> Highlight {
    Highlight {
        series: series.iter().map(|s| (s.field, false)).collect(),
        axes: vec![true; axes.len()],
    }
}
