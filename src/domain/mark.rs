// Mark domain model - user annotations pinned to a timestamp and color slot
use std::collections::BTreeMap;

/// Default mark colors, one per slot.
pub const PALETTE_COLORS: [&str; 30] = [
    "4bb7aa", "a3ea43", "afa4dc", "8393e4", "a97439", "aea672", "aadddb", "c790e7", "62e74f",
    "bc6255", "74454b", "e68960", "b4699d", "afc2e4", "a5c886", "59edc1", "63b7db", "e3bfcb",
    "83b899", "67e583", "b8e782", "e5a5d9", "e45bc7", "d44840", "dbdcbe", "e03d21", "daa68b",
    "5eb966", "78994e", "b3e8be",
];

/// Longest label the binary format can hold.
pub const MAX_LABEL_BYTES: usize = u8::MAX as usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mark {
    pub slot: u8,
    /// Epoch milliseconds.
    pub ts: i64,
    pub label: String,
}

impl Mark {
    /// Builds the mark in its stored form, so a map encodes and decodes to
    /// itself: `ts` is floored to whole seconds within the `u32` range and
    /// the label goes through [`storable_label`].
    pub fn new(slot: u8, ts: i64, label: impl Into<String>) -> Self {
        Self {
            slot,
            ts: storable_ts(ts),
            label: storable_label(slot, &label.into()),
        }
    }

    pub fn default_label(slot: u8) -> String {
        format!("mark-{}", u16::from(slot) + 1)
    }
}

pub fn storable_ts(ts_ms: i64) -> i64 {
    ts_ms.div_euclid(1000).clamp(0, i64::from(u32::MAX)) * 1000
}

/// Control characters blanked, surrounding whitespace trimmed, cut to
/// [`MAX_LABEL_BYTES`] on a char boundary; empty labels become the slot's
/// default label.
pub fn storable_label(slot: u8, raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    let trimmed = cleaned.trim();
    let mut end = trimmed.len().min(MAX_LABEL_BYTES);
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    match trimmed[..end].trim_end() {
        "" => Mark::default_label(slot),
        label => label.to_string(),
    }
}

/// Fixed set of color slots available to marks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<String>,
}

impl Palette {
    pub fn new(colors: Vec<String>) -> Self {
        Self { colors }
    }

    /// First `size` colors of the default palette, cycling if more are asked for.
    pub fn with_size(size: usize) -> Self {
        let colors = PALETTE_COLORS
            .iter()
            .cycle()
            .take(size.min(usize::from(u8::MAX) + 1))
            .map(|c| c.to_string())
            .collect();
        Self { colors }
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn color(&self, slot: u8) -> Option<&str> {
        self.colors.get(usize::from(slot)).map(String::as_str)
    }

    /// Reduces a raw slot number into the palette range.
    pub fn wrap(&self, raw_slot: u8) -> u8 {
        match self.colors.len() {
            0 => raw_slot,
            n => (usize::from(raw_slot) % n) as u8,
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::with_size(PALETTE_COLORS.len())
    }
}

/// Marks keyed by slot; the single source of truth for annotations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkMap {
    marks: BTreeMap<u8, Mark>,
}

impl MarkMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the mark at its slot.
    pub fn insert(&mut self, mark: Mark) {
        self.marks.insert(mark.slot, mark);
    }

    pub fn remove(&mut self, slot: u8) -> Option<Mark> {
        self.marks.remove(&slot)
    }

    pub fn get(&self, slot: u8) -> Option<&Mark> {
        self.marks.get(&slot)
    }

    pub fn contains(&self, slot: u8) -> bool {
        self.marks.contains_key(&slot)
    }

    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    /// Marks in ascending slot order. Both the binary and text encoders emit
    /// entries in exactly this order.
    pub fn ordered(&self) -> impl Iterator<Item = &Mark> {
        self.marks.values()
    }

    /// Lowest slot in `0..palette_size` with no mark on it.
    pub fn first_free_slot(&self, palette_size: usize) -> Option<u8> {
        (0..palette_size.min(usize::from(u8::MAX) + 1))
            .map(|n| n as u8)
            .find(|slot| !self.contains(*slot))
    }
}

impl FromIterator<Mark> for MarkMap {
    fn from_iter<I: IntoIterator<Item = Mark>>(iter: I) -> Self {
        let mut map = MarkMap::new();
        for mark in iter {
            map.insert(mark);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordered_is_ascending_by_slot() {
        let map: MarkMap = [
            Mark::new(7, 3_000, "c"),
            Mark::new(0, 1_000, "a"),
            Mark::new(3, 2_000, "b"),
        ]
        .into_iter()
        .collect();

        let slots: Vec<u8> = map.ordered().map(|m| m.slot).collect();
        assert_eq!(slots, vec![0, 3, 7]);
    }

    #[test]
    fn test_insert_replaces_same_slot() {
        let mut map = MarkMap::new();
        map.insert(Mark::new(2, 1_000, "first"));
        map.insert(Mark::new(2, 5_000, "second"));
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(2).map(|m| m.label.as_str()), Some("second"));
    }

    #[test]
    fn test_first_free_slot() {
        let map: MarkMap = [0, 1, 3].into_iter().map(|s| Mark::new(s, 0, "x")).collect();
        assert_eq!(map.first_free_slot(4), Some(2));
        assert_eq!(map.first_free_slot(2), None);
    }

    #[test]
    fn test_new_normalizes_label() {
        assert_eq!(Mark::new(2, 0, "").label, "mark-3");
        assert_eq!(Mark::new(2, 0, " \t ").label, "mark-3");
        assert_eq!(Mark::new(0, 0, "fan\non\r").label, "fan on");

        let long = Mark::new(0, 0, "é".repeat(150));
        assert_eq!(long.label.len(), 254);
        assert_eq!(long.label.chars().count(), 127);
    }

    #[test]
    fn test_new_floors_timestamp_to_stored_seconds() {
        assert_eq!(Mark::new(0, 1_999, "a").ts, 1_000);
        assert_eq!(Mark::new(0, -5, "a").ts, 0);
        assert_eq!(Mark::new(0, i64::MAX, "a").ts, i64::from(u32::MAX) * 1000);
    }

    #[test]
    fn test_palette_wrap_and_colors() {
        let palette = Palette::default();
        assert_eq!(palette.len(), 30);
        assert_eq!(palette.wrap(31), 1);
        assert_eq!(palette.color(0), Some("4bb7aa"));
        assert_eq!(Mark::default_label(0), "mark-1");
        assert_eq!(Mark::default_label(255), "mark-256");
    }
}
