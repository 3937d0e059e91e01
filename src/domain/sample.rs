// Sample domain model - one sensor reading per instant

use serde::Serialize;

/// One of the eight quantities reported by the SEN5x sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleField {
    Pm10,
    Pm25,
    Pm40,
    Pm100,
    Rh,
    T,
    Voc,
    Nox,
}

impl SampleField {
    /// Wire order of the value fields in a sample record.
    pub const ALL: [SampleField; 8] = [
        SampleField::Pm10,
        SampleField::Pm25,
        SampleField::Pm40,
        SampleField::Pm100,
        SampleField::Rh,
        SampleField::T,
        SampleField::Voc,
        SampleField::Nox,
    ];

    pub fn key(self) -> &'static str {
        match self {
            SampleField::Pm10 => "pm10",
            SampleField::Pm25 => "pm25",
            SampleField::Pm40 => "pm40",
            SampleField::Pm100 => "pm100",
            SampleField::Rh => "rh",
            SampleField::T => "t",
            SampleField::Voc => "voc",
            SampleField::Nox => "nox",
        }
    }

    /// Raw integer is divided by this after the sentinel check.
    pub fn divisor(self) -> f64 {
        match self {
            SampleField::Rh => 100.0,
            SampleField::T => 200.0,
            _ => 10.0,
        }
    }

    /// Raw value meaning "no reading", compared as the unsigned 16-bit pattern.
    pub fn sentinel(self) -> u16 {
        if self.is_particulate() { 0xffff } else { 0x7fff }
    }

    /// PM fields are unsigned on the wire and share one chart axis.
    pub fn is_particulate(self) -> bool {
        matches!(
            self,
            SampleField::Pm10 | SampleField::Pm25 | SampleField::Pm40 | SampleField::Pm100
        )
    }

    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SampleRecord {
    /// Epoch milliseconds.
    pub ts: i64,
    values: [Option<f64>; 8],
}

impl SampleRecord {
    pub fn new(ts: i64) -> Self {
        Self { ts, values: [None; 8] }
    }

    pub fn with(mut self, field: SampleField, value: f64) -> Self {
        self.set(field, Some(value));
        self
    }

    pub fn get(&self, field: SampleField) -> Option<f64> {
        self.values[field.index()]
    }

    pub fn set(&mut self, field: SampleField, value: Option<f64>) {
        self.values[field.index()] = value;
    }
}

/// True when at least one record carries a value for `field`.
pub fn field_supported(samples: &[SampleRecord], field: SampleField) -> bool {
    samples.iter().any(|s| s.get(field).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_order_matches_wire_layout() {
        let keys: Vec<_> = SampleField::ALL.iter().map(|f| f.key()).collect();
        assert_eq!(keys, ["pm10", "pm25", "pm40", "pm100", "rh", "t", "voc", "nox"]);
    }

    #[test]
    fn test_field_supported() {
        let samples = vec![
            SampleRecord::new(0),
            SampleRecord::new(1).with(SampleField::Voc, 100.0),
        ];
        assert!(field_supported(&samples, SampleField::Voc));
        assert!(!field_supported(&samples, SampleField::Nox));
        assert!(!field_supported(&[], SampleField::Pm10));
    }
}
