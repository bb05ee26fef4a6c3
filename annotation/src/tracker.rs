//! Value-use bookkeeping.
//!
//! Every dataset cell a mapping turns into a measurement is recorded as an
//! `(attribute, row)` pair. A pair may be recorded once. After all mappings
//! ran, each attribute that took part in a mapping must have had exactly as
//! many rows consumed as the dataset has; anything else means the mapping
//! conditions overlap or leave gaps.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{Error, Result};

/// Consumed row indices per attribute.
#[derive(Debug, Default)]
pub struct ValueTracker {
    used: BTreeMap<String, BTreeSet<usize>>,
}

impl ValueTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `attribute` as mapped even if no row ends up consumed.
    pub fn touch(&mut self, attribute: &str) {
        self.used.entry(attribute.to_owned()).or_default();
    }

    /// Records that row `row` of `attribute` has been used.
    ///
    /// # Errors
    ///
    /// [`Error::DuplicateUse`] if the pair was already recorded.
    pub fn record(&mut self, attribute: &str, row: usize) -> Result<()> {
        if !self.used.entry(attribute.to_owned()).or_default().insert(row) {
            return Err(Error::DuplicateUse {
                attribute: attribute.to_owned(),
                row,
            });
        }
        Ok(())
    }

    /// Number of rows consumed for `attribute`.
    #[must_use]
    pub fn consumed(&self, attribute: &str) -> usize {
        self.used.get(attribute).map_or(0, BTreeSet::len)
    }

    /// Attributes that took part in at least one mapping.
    pub fn attributes(&self) -> impl Iterator<Item = &str> {
        self.used.keys().map(String::as_str)
    }

    /// Checks every tracked attribute consumed exactly `expected` rows.
    ///
    /// # Errors
    ///
    /// [`Error::CountMismatch`] for the first attribute (in name order) whose
    /// count differs.
    pub fn validate(&self, expected: usize) -> Result<()> {
        for (attribute, rows) in &self.used {
            if rows.len() != expected {
                return Err(Error::CountMismatch {
                    attribute: attribute.clone(),
                    expected,
                    actual: rows.len(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_use_of_a_cell_is_fatal() {
        let mut tracker = ValueTracker::new();
        assert!(tracker.record("len", 0).is_ok());
        assert!(matches!(
            tracker.record("len", 0),
            Err(Error::DuplicateUse { ref attribute, row: 0 }) if attribute == "len"
        ));
        assert!(tracker.record("other", 0).is_ok());
    }

    #[test]
    fn missing_row_is_an_undercount() {
        let mut tracker = ValueTracker::new();
        for row in [0, 2] {
            assert!(tracker.record("len", row).is_ok());
        }
        assert!(matches!(
            tracker.validate(3),
            Err(Error::CountMismatch { expected: 3, actual: 2, .. })
        ));
    }

    #[test]
    fn complete_coverage_validates() {
        let mut tracker = ValueTracker::new();
        for row in 0..3 {
            assert!(tracker.record("len", row).is_ok());
        }
        assert_eq!(tracker.consumed("len"), 3);
        assert!(tracker.validate(3).is_ok());
    }

    #[test]
    fn touched_attribute_without_rows_fails() {
        let mut tracker = ValueTracker::new();
        tracker.touch("spp");
        assert_eq!(tracker.attributes().collect::<Vec<_>>(), vec!["spp"]);
        assert!(tracker.validate(1).is_err());
        assert!(ValueTracker::new().validate(5).is_ok());
    }
}
