// Series descriptors - static styling and grouping for plotted sample fields
use super::sample::{field_supported, SampleField, SampleRecord};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum ValueFormat {
    Decimal { fraction_digits: usize },
}

impl ValueFormat {
    pub fn format(&self, value: f64) -> String {
        match self {
            ValueFormat::Decimal { fraction_digits } => format!("{:.*}", fraction_digits, value),
        }
    }
}

impl Default for ValueFormat {
    fn default() -> Self {
        ValueFormat::Decimal { fraction_digits: 1 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesDescriptor {
    pub field: SampleField,
    pub label: &'static str,
    pub color: &'static str,
    pub line_width: Option<f64>,
    pub line_dash: Option<&'static str>,
    pub font_weight: Option<u16>,
    pub format: ValueFormat,
}

impl SeriesDescriptor {
    fn particulate(field: SampleField, label: &'static str, color: &'static str, n: usize, font_weight: u16) -> Self {
        Self {
            field,
            label,
            color,
            line_width: Some(0.5 + 2.5 * (n as f64 / PM_FIELDS.len() as f64)),
            line_dash: None,
            font_weight: Some(font_weight),
            format: ValueFormat::default(),
        }
    }

    fn auxiliary(field: SampleField, label: &'static str, color: &'static str, line_dash: Option<&'static str>) -> Self {
        Self {
            field,
            label,
            color,
            line_width: None,
            line_dash,
            font_weight: None,
            format: ValueFormat::default(),
        }
    }

    /// Color without any alpha suffix, for text.
    pub fn text_color(&self) -> &'static str {
        self.color.get(..7).unwrap_or(self.color)
    }
}

pub const PM_FIELDS: [SampleField; 4] = [
    SampleField::Pm10,
    SampleField::Pm25,
    SampleField::Pm40,
    SampleField::Pm100,
];

/// Auxiliary fields in axis order.
pub const AUX_FIELDS: [SampleField; 4] = [
    SampleField::Voc,
    SampleField::Nox,
    SampleField::T,
    SampleField::Rh,
];

/// Every series the chart knows how to draw, in legend order.
pub fn candidate_series() -> Vec<SeriesDescriptor> {
    let pm = [
        ("PM1", "#fdc28c", 300),
        ("PM2.5", "#fc9346", 400),
        ("PM4", "#eb6311", 500),
        ("PM10", "#bb3d02", 700),
    ];
    let aux = [
        ("VOC", "#54e01150", None),
        ("NOx", "#41a6a280", None),
        ("T°C", "#d175c180", Some("5,5")),
        ("RH%", "#b31b7ce0", Some("5,5")),
    ];

    let mut series: Vec<SeriesDescriptor> = PM_FIELDS
        .iter()
        .zip(pm)
        .enumerate()
        .map(|(n, (field, (label, color, weight)))| {
            SeriesDescriptor::particulate(*field, label, color, n, weight)
        })
        .collect();
    series.extend(
        AUX_FIELDS
            .iter()
            .zip(aux)
            .map(|(field, (label, color, dash))| SeriesDescriptor::auxiliary(*field, label, color, dash)),
    );
    series
}

/// Candidates with at least one non-null value in `samples`; unsupported
/// sensors are dropped entirely.
pub fn active_series(samples: &[SampleRecord]) -> Vec<SeriesDescriptor> {
    candidate_series()
        .into_iter()
        .filter(|s| field_supported(samples, s.field))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "fields")]
pub enum AxisGroup {
    /// Shared left axis for all PM series.
    Particulate(Vec<SampleField>),
    /// One right-hand axis per auxiliary series.
    Auxiliary(SampleField),
}

impl AxisGroup {
    pub fn contains(&self, field: SampleField) -> bool {
        match self {
            AxisGroup::Particulate(fields) => fields.contains(&field),
            AxisGroup::Auxiliary(f) => *f == field,
        }
    }

    pub fn fields(&self) -> &[SampleField] {
        match self {
            AxisGroup::Particulate(fields) => fields,
            AxisGroup::Auxiliary(f) => std::slice::from_ref(f),
        }
    }
}

/// Axis layout for the active series: PM axis first (if any), then one
/// auxiliary axis per active aux field.
pub fn axis_groups(series: &[SeriesDescriptor]) -> Vec<AxisGroup> {
    let active = |f: &SampleField| series.iter().any(|s| s.field == *f);
    let pm: Vec<SampleField> = PM_FIELDS.iter().copied().filter(active).collect();

    let mut groups = Vec::new();
    if !pm.is_empty() {
        groups.push(AxisGroup::Particulate(pm));
    }
    groups.extend(AUX_FIELDS.iter().copied().filter(active).map(AxisGroup::Auxiliary));
    groups
}
