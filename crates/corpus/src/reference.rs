//! Baseline word frequencies for collocation scoring.
use std::collections::HashMap;

/// Read-only word → frequency baseline, loaded once per named reference.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceTable {
    name: String,
    frequencies: HashMap<String, f64>,
    total: f64,
}

impl ReferenceTable {
    /// Later duplicates of a word replace earlier ones, matching a plain
    /// keyed load of the two-column file.
    pub fn new<I>(name: impl Into<String>, entries: I) -> Self
    where
        I: IntoIterator<Item = (String, f64)>,
    {
        let frequencies: HashMap<String, f64> = entries.into_iter().collect();
        let total = frequencies.values().sum();
        Self {
            name: name.into(),
            frequencies,
            total,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    pub fn frequency(&self, word: &str) -> Option<f64> {
        self.frequencies.get(word).copied()
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    /// Relative over-representation of `word` in a sample.
    ///
    /// `(count / sample_total) / (reference_freq / reference_total)`; `NaN`
    /// when the word is missing from the baseline or has zero frequency there,
    /// or when the sample is empty.
    pub fn relevance(&self, word: &str, count: f64, sample_total: f64) -> f64 {
        match self.frequency(word) {
            Some(freq) if freq > 0.0 && self.total > 0.0 && sample_total > 0.0 => {
                (count / sample_total) / (freq / self.total)
            }
            _ => f64::NAN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> ReferenceTable {
        ReferenceTable::new(
            "generell",
            [("og".to_string(), 80.0), ("hav".to_string(), 20.0), ("null".to_string(), 0.0)],
        )
    }

    #[test]
    fn totals_and_lookup() {
        let t = table();
        assert_eq!(t.total(), 100.0);
        assert_eq!(t.frequency("hav"), Some(20.0));
        assert_eq!(t.frequency("fjell"), None);
        assert_eq!(t.len(), 3);
    }

    #[test]
    fn relevance_against_baseline() {
        let t = table();
        // 10 of 20 sample tokens vs 20% baseline share.
        assert!((t.relevance("hav", 10.0, 20.0) - 2.5).abs() < 1e-12);
        assert!(t.relevance("fjell", 10.0, 20.0).is_nan());
        assert!(t.relevance("null", 1.0, 20.0).is_nan());
        assert!(t.relevance("og", 1.0, 0.0).is_nan());
    }
}
