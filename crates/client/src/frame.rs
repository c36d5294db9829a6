//! Decoding of serialized data frames.
//!
//! DH-LAB endpoints return tables in whichever orientation the service side
//! happened to serialize them with. Three shapes are accepted:
//!
//! ```text
//! columns:  { "urn": { "0": "URN:..", "1": "URN:.." }, "year": { "0": 1995, ... } }
//! lists:    { "urn": ["URN:..", "URN:.."], "year": [1995, ...] }
//! records:  [ { "urn": "URN:..", "year": 1995 }, ... ]
//! ```
//!
//! Column orientation keeps row order by sorting on the index key, numerically
//! when every key is an integer.
use std::collections::{BTreeSet, HashMap};

use corpus::{CapabilityError, CollocateScore, Corpus, DocumentRecord, ReferenceTable};
use serde_json::{Map, Value};

type Row = Map<String, Value>;

/// Decode any supported frame orientation into row maps.
pub(crate) fn decode_rows(value: Value) -> Result<Vec<Row>, CapabilityError> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(row) => Ok(row),
                other => Err(CapabilityError::Decode(format!(
                    "expected record object, got {}",
                    kind(&other)
                ))),
            })
            .collect(),
        Value::Object(columns) => decode_columns(columns),
        other => Err(CapabilityError::Decode(format!(
            "expected table, got {}",
            kind(&other)
        ))),
    }
}

fn decode_columns(columns: Map<String, Value>) -> Result<Vec<Row>, CapabilityError> {
    // Collect every index key once so ragged columns still line up.
    let mut keys: BTreeSet<IndexKey> = BTreeSet::new();
    for (name, cells) in &columns {
        match cells {
            Value::Object(map) => keys.extend(map.keys().map(|k| IndexKey::parse(k))),
            Value::Array(items) => keys.extend((0..items.len()).map(IndexKey::Position)),
            other => {
                return Err(CapabilityError::Decode(format!(
                    "column `{name}` is {}, expected object or array",
                    kind(other)
                )))
            }
        }
    }

    let positions: HashMap<IndexKey, usize> =
        keys.iter().cloned().enumerate().map(|(i, k)| (k, i)).collect();
    let mut rows: Vec<Row> = vec![Map::new(); keys.len()];

    for (name, cells) in columns {
        match cells {
            Value::Object(map) => {
                for (key, cell) in map {
                    if let Some(&pos) = positions.get(&IndexKey::parse(&key)) {
                        rows[pos].insert(name.clone(), cell);
                    }
                }
            }
            Value::Array(items) => {
                for (idx, cell) in items.into_iter().enumerate() {
                    if let Some(&pos) = positions.get(&IndexKey::Position(idx)) {
                        rows[pos].insert(name.clone(), cell);
                    }
                }
            }
            _ => {}
        }
    }
    Ok(rows)
}

/// Decode a corpus frame; rows without an identifier are dropped.
pub(crate) fn decode_corpus(value: Value) -> Result<Corpus, CapabilityError> {
    let rows = decode_rows(value)?;
    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        let has_urn = row.get("urn").is_some_and(|v| !v.is_null());
        if !has_urn {
            continue;
        }
        let record: DocumentRecord = serde_json::from_value(Value::Object(row))
            .map_err(|e| CapabilityError::Decode(format!("invalid document row: {e}")))?;
        records.push(record);
    }
    Ok(Corpus::new(records))
}

/// Word → count pairs from a collocation response.
///
/// Accepts `{ "counts": { word: n } }`, a bare `{ word: n }` or
/// `{ word: [n, ...] }` map, and `[ { "word": w, "counts": n } ]` records.
pub(crate) fn decode_counts(value: Value) -> Result<Vec<(String, f64)>, CapabilityError> {
    let map = match value {
        Value::Null => return Ok(Vec::new()),
        Value::Object(mut map) => match map.remove("counts") {
            Some(Value::Object(counts)) => counts,
            Some(other) => {
                return Err(CapabilityError::Decode(format!(
                    "`counts` is {}, expected object",
                    kind(&other)
                )))
            }
            None => map,
        },
        Value::Array(items) => {
            let mut pairs = Vec::with_capacity(items.len());
            for item in items {
                let word = item
                    .get("word")
                    .and_then(Value::as_str)
                    .ok_or_else(|| CapabilityError::Decode("collocate record without word".into()))?
                    .to_string();
                let count = item
                    .get("counts")
                    .and_then(number)
                    .ok_or_else(|| CapabilityError::Decode(format!("no count for `{word}`")))?;
                pairs.push((word, count));
            }
            return Ok(pairs);
        }
        other => {
            return Err(CapabilityError::Decode(format!(
                "expected collocation table, got {}",
                kind(&other)
            )))
        }
    };

    map.into_iter()
        .map(|(word, cell)| {
            let count = match &cell {
                Value::Array(items) => items.first().and_then(number),
                other => number(other),
            };
            count
                .map(|c| (word.clone(), c))
                .ok_or_else(|| CapabilityError::Decode(format!("no count for `{word}`")))
        })
        .collect()
}

/// Score counted collocates against a baseline.
///
/// Repeated words get a ` <n>` suffix so every row label is unique.
pub(crate) fn score_collocates(
    counts: Vec<(String, f64)>,
    reference: &ReferenceTable,
) -> Vec<CollocateScore> {
    let total: f64 = counts.iter().map(|(_, c)| *c).sum();
    let mut seen: HashMap<String, usize> = HashMap::new();
    counts
        .into_iter()
        .map(|(word, count)| {
            let relevance = reference.relevance(&word, count, total);
            let n = seen.entry(word.clone()).or_insert(0);
            *n += 1;
            let label = if *n == 1 { word } else { format!("{word} {n}") };
            CollocateScore {
                word: label,
                counts: count,
                relevance,
            }
        })
        .collect()
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum IndexKey {
    Position(usize),
    Label(String),
}

impl IndexKey {
    fn parse(key: &str) -> Self {
        key.parse::<usize>()
            .map(IndexKey::Position)
            .unwrap_or_else(|_| IndexKey::Label(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corpus::DocumentType;
    use serde_json::json;

    #[test]
    fn column_orientation_keeps_numeric_index_order() {
        let corpus = decode_corpus(json!({
            "urn": { "10": "u10", "2": "u2", "1": "u1" },
            "year": { "1": 1990, "2": 1991.0, "10": "1992" },
            "doctype": { "1": "digavis", "2": "digavis", "10": "digavis" }
        }))
        .unwrap();

        assert_eq!(corpus.identifiers(), vec!["u1", "u2", "u10"]);
        assert_eq!(corpus.rows()[2].year, Some(1992));
        assert_eq!(corpus.document_type().unwrap(), Some(DocumentType::Digavis));
    }

    #[test]
    fn list_and_record_orientations() {
        let lists = decode_corpus(json!({ "urn": ["a", "b"], "title": ["A", null] })).unwrap();
        let records = decode_corpus(json!([
            { "urn": "a", "title": "A" },
            { "urn": "b", "title": null }
        ]))
        .unwrap();
        assert_eq!(lists, records);
        assert_eq!(lists.rows()[1].title, None);
    }

    #[test]
    fn empty_responses_are_empty_corpora() {
        assert!(decode_corpus(json!({})).unwrap().is_empty());
        assert!(decode_corpus(json!([])).unwrap().is_empty());
        assert!(decode_corpus(Value::Null).unwrap().is_empty());
    }

    #[test]
    fn rows_without_identifier_are_dropped() {
        let corpus = decode_corpus(json!({ "urn": ["a", null], "year": [1990, 1991] })).unwrap();
        assert_eq!(corpus.len(), 1);
    }

    #[test]
    fn scalar_response_is_a_decode_error() {
        assert!(matches!(decode_rows(json!(42)), Err(CapabilityError::Decode(_))));
        assert!(matches!(
            decode_rows(json!({ "urn": "not-a-column" })),
            Err(CapabilityError::Decode(_))
        ));
    }

    #[test]
    fn counts_in_all_shapes() {
        let wrapped = decode_counts(json!({ "counts": { "hav": 3, "fjell": 1 } })).unwrap();
        assert_eq!(wrapped.len(), 2);
        let bare = decode_counts(json!({ "hav": [3, 0.5] })).unwrap();
        assert_eq!(bare, vec![("hav".to_string(), 3.0)]);
        let records = decode_counts(json!([{ "word": "hav", "counts": "4" }])).unwrap();
        assert_eq!(records, vec![("hav".to_string(), 4.0)]);
        assert!(decode_counts(json!({ "hav": "many" })).is_err());
    }

    #[test]
    fn repeated_collocates_get_suffixes() {
        let reference = ReferenceTable::new("ref", [("hav".to_string(), 10.0)]);
        let scores = score_collocates(
            vec![("hav".into(), 2.0), ("hav".into(), 1.0), ("ukjent".into(), 1.0)],
            &reference,
        );
        let labels: Vec<&str> = scores.iter().map(|s| s.word.as_str()).collect();
        assert_eq!(labels, vec!["hav", "hav 2", "ukjent"]);
        assert!(scores[0].relevance.is_finite());
        assert!(scores[2].relevance.is_nan());
    }
}
