// Mark store - edit/commit protocol over the in-memory mark map
use crate::domain::mark::{Mark, MarkMap, Palette};
use crate::infrastructure::mark_codec::{decode_marks, encode_marks, parse_text, to_text, MarkCodecError};
use bytes::Bytes;

/// Result of encoding the current map after a change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitStatus {
    /// Map encoded within budget; saving is enabled.
    Ready,
    /// Map is larger than the storage budget; saving is blocked.
    OverBudget { limit: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    /// Edit parses to the same marks as before (whitespace, junk lines).
    Unchanged,
    Committed(CommitStatus),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    Added { slot: u8, status: CommitStatus },
    /// Every palette slot is taken; nothing was changed.
    TooManyMarks,
}

#[derive(Debug, Clone)]
pub struct MarkStore {
    marks: MarkMap,
    palette: Palette,
    budget: usize,
    last_good: Option<Bytes>,
    persist_enabled: bool,
    warning: Option<String>,
}

impl MarkStore {
    /// Builds the store from the fetched mark buffer, `None` if it could
    /// not be fetched.
    pub fn load(stored: Option<Bytes>, palette: Palette, budget: usize) -> Self {
        let marks = stored
            .as_deref()
            .map(|b| decode_marks(b, &palette))
            .unwrap_or_default();
        tracing::debug!("Loaded {} marks", marks.len());
        Self {
            marks,
            palette,
            budget,
            last_good: stored.filter(|b| !b.is_empty()),
            persist_enabled: true,
            warning: None,
        }
    }

    pub fn marks(&self) -> &MarkMap {
        &self.marks
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    /// Text view of the current map.
    pub fn text(&self) -> String {
        to_text(&self.marks)
    }

    /// Size-limit message while the current map does not fit the budget.
    pub fn warning(&self) -> Option<&str> {
        self.warning.as_deref()
    }

    /// Bytes to write back, or `None` while saving is blocked or nothing
    /// was ever encoded. Over budget this stays `None` even though the last
    /// good encoding is kept.
    pub fn persist_payload(&self) -> Option<Bytes> {
        if self.persist_enabled { self.last_good.clone() } else { None }
    }

    /// Replaces the map with the parsed edit, unless it renders to the same
    /// text as the current map.
    pub fn apply_text(&mut self, raw: &str) -> EditOutcome {
        let parsed = parse_text(raw);
        if to_text(&parsed) == self.text() {
            return EditOutcome::Unchanged;
        }
        self.marks = parsed;
        EditOutcome::Committed(self.commit())
    }

    /// Adds a mark at `ts` on the lowest free slot.
    pub fn add_mark(&mut self, ts: i64) -> AddOutcome {
        let Some(slot) = self.marks.first_free_slot(self.palette.len()) else {
            tracing::info!("All {} mark slots in use", self.palette.len());
            return AddOutcome::TooManyMarks;
        };
        self.marks.insert(Mark::new(slot, ts, Mark::default_label(slot)));
        AddOutcome::Added {
            slot,
            status: self.commit(),
        }
    }

    fn commit(&mut self) -> CommitStatus {
        match encode_marks(&self.marks, &self.palette, self.budget) {
            Ok(bytes) => {
                self.last_good = Some(bytes);
                self.persist_enabled = true;
                self.warning = None;
                CommitStatus::Ready
            }
            Err(err @ MarkCodecError::BudgetExceeded { limit, required }) => {
                tracing::warn!("Marks need {}B, over the {}B budget", required, limit);
                self.persist_enabled = false;
                self.warning = Some(err.to_string());
                CommitStatus::OverBudget { limit }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TS: i64 = 1_718_000_000_000;

    fn store_with(marks: &[Mark], palette_size: usize, budget: usize) -> MarkStore {
        let palette = Palette::with_size(palette_size);
        let map: MarkMap = marks.iter().cloned().collect();
        let bytes = encode_marks(&map, &palette, 4096).unwrap();
        MarkStore::load(Some(bytes), palette, budget)
    }

    #[test]
    fn test_load_without_buffer() {
        let store = MarkStore::load(None, Palette::default(), 512);
        assert!(store.marks().is_empty());
        assert_eq!(store.persist_payload(), None);
        assert_eq!(store.text(), "\n");
    }

    #[test]
    fn test_click_to_add_fills_free_slot_then_refuses() {
        let existing: Vec<Mark> = (0..3).map(|s| Mark::new(s, TS, "m")).collect();
        let mut store = store_with(&existing, 4, 512);

        assert_eq!(
            store.add_mark(TS + 1_000),
            AddOutcome::Added {
                slot: 3,
                status: CommitStatus::Ready
            }
        );
        assert_eq!(store.marks().get(3).map(|m| m.label.as_str()), Some("mark-4"));

        let before = store.marks().clone();
        assert_eq!(store.add_mark(TS + 2_000), AddOutcome::TooManyMarks);
        assert_eq!(store.marks(), &before);
    }

    #[test]
    fn test_whitespace_edit_is_unchanged() {
        let mut store = store_with(&[Mark::new(1, TS, "fan on")], 30, 512);
        let edit = format!("  {}\n\njunk line\n", store.text().replace(" :: fan on", " ::   fan on  "));
        assert_eq!(store.apply_text(&edit), EditOutcome::Unchanged);
    }

    #[test]
    fn test_edit_replaces_map_and_payload() {
        let mut store = store_with(&[Mark::new(1, TS, "fan on")], 30, 512);
        let before = store.persist_payload().unwrap();

        let edit = store.text().replace("fan on", "fan off");
        assert_eq!(store.apply_text(&edit), EditOutcome::Committed(CommitStatus::Ready));
        assert_eq!(store.marks().get(1).map(|m| m.label.as_str()), Some("fan off"));

        let after = store.persist_payload().unwrap();
        assert_ne!(before, after);
        assert_eq!(decode_marks(&after, store.palette()), *store.marks());

        assert_eq!(store.apply_text(""), EditOutcome::Committed(CommitStatus::Ready));
        assert!(store.marks().is_empty());
        assert_eq!(store.persist_payload().as_deref(), Some(&[0u8][..]));
    }

    #[test]
    fn test_over_budget_edit_keeps_last_good_bytes() {
        let mut store = store_with(&[Mark::new(0, TS, "ok")], 30, 16);
        let good = store.persist_payload().unwrap();

        let edit = format!("{}#1 :: 2024-06-10 08:00:00 :: much too long a label\n", store.text());
        assert_eq!(
            store.apply_text(&edit),
            EditOutcome::Committed(CommitStatus::OverBudget { limit: 16 })
        );
        assert_eq!(store.marks().len(), 2);
        assert_eq!(store.persist_payload(), None);
        assert_eq!(store.warning(), Some("Too much data (limit=16B)"));
        assert_eq!(store.last_good.as_ref(), Some(&good));

        let shrink = store.text().lines().next().unwrap().to_string();
        assert_eq!(store.apply_text(&shrink), EditOutcome::Committed(CommitStatus::Ready));
        assert_eq!(store.warning(), None);
        assert_eq!(store.persist_payload(), Some(good));
    }
}
