// Chart domain model - decoded samples plus the series/axes derived from them
use super::sample::{SampleField, SampleRecord};
use super::series::{active_series, axis_groups, AxisGroup, SeriesDescriptor};
use super::time::format_iso_local;

#[derive(Debug, Clone)]
pub struct ChartData {
    pub samples: Vec<SampleRecord>,
    pub series: Vec<SeriesDescriptor>,
    pub axes: Vec<AxisGroup>,
}

/// One line of the hover tooltip.
#[derive(Debug, Clone, PartialEq)]
pub struct TooltipLine {
    /// `None` for the timestamp line.
    pub field: Option<SampleField>,
    pub text: String,
    pub color: Option<&'static str>,
    pub font_weight: Option<u16>,
    pub highlighted: bool,
}

impl ChartData {
    /// Builds the chart model for one load; `samples` must already be sorted.
    pub fn new(samples: Vec<SampleRecord>) -> Self {
        let series = active_series(&samples);
        let axes = axis_groups(&series);
        Self {
            samples,
            series,
            axes,
        }
    }

    pub fn descriptor(&self, field: SampleField) -> Option<&SeriesDescriptor> {
        self.series.iter().find(|s| s.field == field)
    }

    /// First and last sample timestamps.
    pub fn time_extent(&self) -> Option<(i64, i64)> {
        Some((self.samples.first()?.ts, self.samples.last()?.ts))
    }

    /// Value range for an axis: `[0, max]` on the PM axis, `[min, max]` otherwise.
    pub fn axis_domain(&self, axis: &AxisGroup) -> Option<(f64, f64)> {
        let values = move || {
            self.samples
                .iter()
                .flat_map(move |s| axis.fields().iter().filter_map(move |f| s.get(*f)))
        };
        let max = values().fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))))?;
        match axis {
            AxisGroup::Particulate(_) => Some((0.0, max)),
            AxisGroup::Auxiliary(_) => {
                let min = values().fold(max, f64::min);
                Some((min, max))
            }
        }
    }

    /// Tooltip for one sample: timestamp first, then every active series
    /// that has a value, in legend order.
    pub fn tooltip_lines(&self, sample: &SampleRecord, hovered: Option<SampleField>) -> Vec<TooltipLine> {
        let mut lines = vec![TooltipLine {
            field: None,
            text: format_iso_local(sample.ts),
            color: None,
            font_weight: None,
            highlighted: false,
        }];
        lines.extend(self.series.iter().filter_map(|s| {
            let value = sample.get(s.field)?;
            Some(TooltipLine {
                field: Some(s.field),
                text: format!("{}: {}", s.label, s.format.format(value)),
                color: Some(s.text_color()),
                font_weight: s.font_weight,
                highlighted: hovered == Some(s.field),
            })
        }));
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chart() -> ChartData {
        ChartData::new(vec![
            SampleRecord::new(1_000)
                .with(SampleField::Pm25, 4.0)
                .with(SampleField::T, 21.4),
            SampleRecord::new(2_000)
                .with(SampleField::Pm25, 9.5)
                .with(SampleField::Pm10, 2.0)
                .with(SampleField::T, 19.0),
        ])
    }

    #[test]
    fn test_time_extent() {
        assert_eq!(chart().time_extent(), Some((1_000, 2_000)));
        assert_eq!(ChartData::new(Vec::new()).time_extent(), None);
    }

    #[test]
    fn test_axis_domains() {
        let chart = chart();
        assert_eq!(chart.axis_domain(&chart.axes[0]), Some((0.0, 9.5)));
        assert_eq!(chart.axis_domain(&chart.axes[1]), Some((19.0, 21.4)));
    }

    #[test]
    fn test_tooltip_lines_skip_nulls_and_flag_highlight() {
        let chart = chart();
        let lines = chart.tooltip_lines(&chart.samples[0], Some(SampleField::T));
        let texts: Vec<&str> = lines.iter().skip(1).map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["PM2.5: 4.0", "T°C: 21.4"]);
        assert!(lines[0].field.is_none());
        assert!(!lines[1].highlighted);
        assert!(lines[2].highlighted);
        assert_eq!(lines[2].color, Some("#d175c1"));
        assert_eq!(lines[1].font_weight, Some(400));
    }
}
