use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::CorpusError;

/// Every column a resolved corpus carries, in export order.
pub const CORPUS_COLUMNS: [&str; 12] = [
    "dhlabid",
    "urn",
    "title",
    "authors",
    "city",
    "timestamp",
    "year",
    "publisher",
    "ddc",
    "subjects",
    "langs",
    "doctype",
];

/// Collection a document belongs to.
///
/// Parsing accepts both the collection code used by the search service and a
/// readable English alias, so `"newspaper"` and `"digavis"` are the same type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DocumentType {
    Digibok,
    Digavis,
    Digitidsskrift,
    Digistorting,
    Digimanus,
    Kudos,
    Nettavis,
}

/// Granularity used when displaying a document timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeGranularity {
    Day,
    Year,
}

impl DocumentType {
    pub const ALL: [DocumentType; 7] = [
        DocumentType::Digibok,
        DocumentType::Digavis,
        DocumentType::Digitidsskrift,
        DocumentType::Digistorting,
        DocumentType::Digimanus,
        DocumentType::Kudos,
        DocumentType::Nettavis,
    ];

    /// Collection code understood by the search service.
    pub fn code(self) -> &'static str {
        match self {
            DocumentType::Digibok => "digibok",
            DocumentType::Digavis => "digavis",
            DocumentType::Digitidsskrift => "digitidsskrift",
            DocumentType::Digistorting => "digistorting",
            DocumentType::Digimanus => "digimanus",
            DocumentType::Kudos => "kudos",
            DocumentType::Nettavis => "nettavis",
        }
    }

    pub fn alias(self) -> &'static str {
        match self {
            DocumentType::Digibok => "book",
            DocumentType::Digavis => "newspaper",
            DocumentType::Digitidsskrift => "periodical",
            DocumentType::Digistorting => "parliament",
            DocumentType::Digimanus => "manuscript",
            DocumentType::Kudos => "kudos",
            DocumentType::Nettavis => "web_news",
        }
    }

    /// Periodicals and newspapers are dated to the day, everything else to the year.
    pub fn time_granularity(self) -> TimeGranularity {
        match self {
            DocumentType::Digavis | DocumentType::Digitidsskrift | DocumentType::Nettavis => {
                TimeGranularity::Day
            }
            _ => TimeGranularity::Year,
        }
    }

    /// Author, Dewey and subject filters only exist for books.
    pub fn supports_bibliographic_filters(self) -> bool {
        self == DocumentType::Digibok
    }

    /// The newspaper collection has no language metadata.
    pub fn supports_language_filter(self) -> bool {
        self != DocumentType::Digavis
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for DocumentType {
    type Err = CorpusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        DocumentType::ALL
            .into_iter()
            .find(|doctype| doctype.code() == wanted || doctype.alias() == wanted)
            .ok_or_else(|| CorpusError::validation(format!("unsupported document type `{}`", s.trim())))
    }
}

impl TryFrom<String> for DocumentType {
    type Error = CorpusError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DocumentType> for String {
    fn from(value: DocumentType) -> Self {
        value.code().to_string()
    }
}

/// Ordering strategy requested from the search service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchOrder {
    #[default]
    Random,
    First,
    Rank,
}

impl SearchOrder {
    pub fn code(self) -> &'static str {
        match self {
            SearchOrder::Random => "random",
            SearchOrder::First => "first",
            SearchOrder::Rank => "rank",
        }
    }
}

impl FromStr for SearchOrder {
    type Err = CorpusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "random" => Ok(SearchOrder::Random),
            "first" => Ok(SearchOrder::First),
            "rank" => Ok(SearchOrder::Rank),
            other => Err(CorpusError::validation(format!(
                "unsupported search ordering `{other}`"
            ))),
        }
    }
}

/// One document row of a resolved corpus.
///
/// Rows come from a service that serializes data frames, so numeric columns
/// may arrive as floats or strings and absent cells as `null`. The lenient
/// deserializers below absorb those differences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    #[serde(default, deserialize_with = "loose::opt_i64")]
    pub dhlabid: Option<i64>,
    #[serde(deserialize_with = "loose::string")]
    pub urn: String,
    #[serde(default, deserialize_with = "loose::opt_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "loose::opt_string")]
    pub authors: Option<String>,
    #[serde(default, deserialize_with = "loose::opt_string")]
    pub city: Option<String>,
    /// Raw `YYYYMMDD` timestamp exactly as delivered.
    #[serde(default, deserialize_with = "loose::opt_string")]
    pub timestamp: Option<String>,
    #[serde(default, deserialize_with = "loose::opt_i32")]
    pub year: Option<i32>,
    #[serde(default, deserialize_with = "loose::opt_string")]
    pub publisher: Option<String>,
    #[serde(default, deserialize_with = "loose::opt_string")]
    pub ddc: Option<String>,
    #[serde(default, deserialize_with = "loose::opt_string")]
    pub subjects: Option<String>,
    #[serde(default, deserialize_with = "loose::opt_string")]
    pub langs: Option<String>,
    #[serde(default)]
    pub doctype: Option<DocumentType>,
}

impl DocumentRecord {
    /// A record carrying only its identifier.
    pub fn with_urn(urn: impl Into<String>) -> Self {
        Self {
            dhlabid: None,
            urn: urn.into(),
            title: None,
            authors: None,
            city: None,
            timestamp: None,
            year: None,
            publisher: None,
            ddc: None,
            subjects: None,
            langs: None,
            doctype: None,
        }
    }

    /// Cell value for one of [`CORPUS_COLUMNS`]; unknown columns are `null`.
    pub fn field(&self, column: &str) -> JsonValue {
        fn text(value: &Option<String>) -> JsonValue {
            value.clone().map(JsonValue::String).unwrap_or(JsonValue::Null)
        }

        match column {
            "dhlabid" => self.dhlabid.map(JsonValue::from).unwrap_or(JsonValue::Null),
            "urn" => JsonValue::String(self.urn.clone()),
            "title" => text(&self.title),
            "authors" => text(&self.authors),
            "city" => text(&self.city),
            "timestamp" => text(&self.timestamp),
            "year" => self.year.map(JsonValue::from).unwrap_or(JsonValue::Null),
            "publisher" => text(&self.publisher),
            "ddc" => text(&self.ddc),
            "subjects" => text(&self.subjects),
            "langs" => text(&self.langs),
            "doctype" => self
                .doctype
                .map(|d| JsonValue::String(d.code().to_string()))
                .unwrap_or(JsonValue::Null),
            _ => JsonValue::Null,
        }
    }

    /// Display label: title and identifier, or the identifier alone.
    pub fn label(&self) -> String {
        match self.title.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            Some(title) => format!("{title} ({})", self.urn),
            None => self.urn.clone(),
        }
    }

    /// Resolvable link to the source document.
    pub fn link(&self) -> String {
        document_link(&self.urn)
    }
}

/// Public resolver URL for an identifier.
pub fn document_link(urn: &str) -> String {
    format!("https://urn.nb.no/{urn}")
}

/// A resolved corpus: one row per document, in service order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Corpus {
    rows: Vec<DocumentRecord>,
}

impl Corpus {
    pub fn new(rows: Vec<DocumentRecord>) -> Self {
        Self { rows }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[DocumentRecord] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<DocumentRecord> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Identifier column in row order.
    pub fn identifiers(&self) -> Vec<String> {
        self.rows.iter().map(|row| row.urn.clone()).collect()
    }

    /// Internal ids of every row that has one.
    pub fn dhlabids(&self) -> Vec<i64> {
        self.rows.iter().filter_map(|row| row.dhlabid).collect()
    }

    /// Distinct document types present in the corpus. Rows without a type
    /// contribute `None`.
    pub fn document_types(&self) -> BTreeSet<Option<DocumentType>> {
        self.rows.iter().map(|row| row.doctype).collect()
    }

    /// The single document type of the corpus.
    ///
    /// Returns `Ok(None)` for an empty corpus or one where no row carries a
    /// type, and [`CorpusError::MixedDocumentTypes`] when more than one type
    /// is present. Untyped rows count as a type of their own, so they cannot
    /// be mixed with typed ones.
    pub fn document_type(&self) -> Result<Option<DocumentType>, CorpusError> {
        let types = self.document_types();
        match types.len() {
            0 => Ok(None),
            1 => Ok(types.into_iter().next().flatten()),
            _ => Err(CorpusError::MixedDocumentTypes(types.into_iter().collect())),
        }
    }

    /// First row for every identifier, used for left joins.
    pub fn index_by_urn(&self) -> HashMap<&str, &DocumentRecord> {
        let mut index = HashMap::with_capacity(self.rows.len());
        for row in &self.rows {
            index.entry(row.urn.as_str()).or_insert(row);
        }
        index
    }
}

impl FromIterator<DocumentRecord> for Corpus {
    fn from_iter<I: IntoIterator<Item = DocumentRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Deserializers tolerant of data-frame JSON: numbers where strings are
/// expected, floats for integer columns, `NaN` serialized as `null`.
pub(crate) mod loose {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn value_to_string(value: Value) -> Option<String> {
        match value {
            Value::Null => None,
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
            Value::Number(n) => match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => Some(i.to_string()),
                (None, Some(f)) if f.fract() == 0.0 && f.abs() < 1e15 => Some(format!("{}", f as i64)),
                _ => Some(n.to_string()),
            },
            Value::Bool(b) => Some(b.to_string()),
            other => Some(other.to_string()),
        }
    }

    fn value_to_i64(value: Value) -> Option<i64> {
        match value {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)),
            Value::String(s) => {
                let trimmed = s.trim();
                trimmed
                    .parse::<i64>()
                    .ok()
                    .or_else(|| trimmed.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f as i64))
            }
            _ => None,
        }
    }

    pub(crate) fn opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(value_to_string(Value::deserialize(d)?))
    }

    pub(crate) fn string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        value_to_string(Value::deserialize(d)?).ok_or_else(|| D::Error::custom("missing identifier"))
    }

    pub(crate) fn opt_i64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
        Ok(value_to_i64(Value::deserialize(d)?))
    }

    pub(crate) fn opt_i32<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i32>, D::Error> {
        Ok(value_to_i64(Value::deserialize(d)?).and_then(|v| i32::try_from(v).ok()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(urn: &str, doctype: Option<DocumentType>) -> DocumentRecord {
        DocumentRecord {
            doctype,
            ..DocumentRecord::with_urn(urn)
        }
    }

    #[test]
    fn document_type_accepts_code_and_alias() {
        assert_eq!("digavis".parse::<DocumentType>().unwrap(), DocumentType::Digavis);
        assert_eq!("Newspaper".parse::<DocumentType>().unwrap(), DocumentType::Digavis);
        assert_eq!(" book ".parse::<DocumentType>().unwrap(), DocumentType::Digibok);
        assert!("digifoto".parse::<DocumentType>().is_err());
    }

    #[test]
    fn document_type_serializes_as_code() {
        let value = serde_json::to_value(DocumentType::Digitidsskrift).unwrap();
        assert_eq!(value, json!("digitidsskrift"));
        let parsed: DocumentType = serde_json::from_value(json!("periodical")).unwrap();
        assert_eq!(parsed, DocumentType::Digitidsskrift);
    }

    #[test]
    fn granularity_per_type() {
        assert_eq!(DocumentType::Digavis.time_granularity(), TimeGranularity::Day);
        assert_eq!(DocumentType::Digitidsskrift.time_granularity(), TimeGranularity::Day);
        assert_eq!(DocumentType::Digibok.time_granularity(), TimeGranularity::Year);
        assert_eq!(DocumentType::Digimanus.time_granularity(), TimeGranularity::Year);
    }

    #[test]
    fn record_decodes_frame_shaped_json() {
        let row: DocumentRecord = serde_json::from_value(json!({
            "dhlabid": 100012.0,
            "urn": "URN:NBN:no-nb_digavis_aftenposten_null_null_19950312_136_60_1",
            "title": "aftenposten",
            "authors": null,
            "timestamp": 19950312,
            "year": 1995.0,
            "langs": "",
            "doctype": "digavis"
        }))
        .unwrap();

        assert_eq!(row.dhlabid, Some(100012));
        assert_eq!(row.timestamp.as_deref(), Some("19950312"));
        assert_eq!(row.year, Some(1995));
        assert_eq!(row.langs, None);
        assert_eq!(row.authors, None);
        assert_eq!(row.doctype, Some(DocumentType::Digavis));
    }

    #[test]
    fn record_without_identifier_is_rejected() {
        let result = serde_json::from_value::<DocumentRecord>(json!({ "urn": null }));
        assert!(result.is_err());
    }

    #[test]
    fn label_falls_back_to_identifier() {
        let mut row = DocumentRecord::with_urn("URN:NBN:no-nb_digibok_2008");
        assert_eq!(row.label(), "URN:NBN:no-nb_digibok_2008");
        row.title = Some("Sult".into());
        assert_eq!(row.label(), "Sult (URN:NBN:no-nb_digibok_2008)");
        row.title = Some("   ".into());
        assert_eq!(row.label(), "URN:NBN:no-nb_digibok_2008");
    }

    #[test]
    fn uniform_document_type() {
        let corpus = Corpus::new(vec![
            record("a", Some(DocumentType::Digibok)),
            record("b", Some(DocumentType::Digibok)),
        ]);
        assert_eq!(corpus.document_type().unwrap(), Some(DocumentType::Digibok));
        assert_eq!(Corpus::empty().document_type().unwrap(), None);
    }

    #[test]
    fn mixed_document_types_are_an_error() {
        let corpus = Corpus::new(vec![
            record("a", Some(DocumentType::Digavis)),
            record("b", Some(DocumentType::Digibok)),
        ]);
        match corpus.document_type() {
            Err(CorpusError::MixedDocumentTypes(types)) => {
                assert_eq!(
                    types,
                    vec![Some(DocumentType::Digibok), Some(DocumentType::Digavis)]
                );
            }
            other => panic!("expected mixed types, got {other:?}"),
        }
    }

    #[test]
    fn untyped_rows_do_not_mix_with_typed_ones() {
        let corpus = Corpus::new(vec![
            record("a", None),
            record("b", Some(DocumentType::Digibok)),
        ]);
        assert_eq!(
            corpus.document_type(),
            Err(CorpusError::MixedDocumentTypes(vec![
                None,
                Some(DocumentType::Digibok)
            ]))
        );

        let untyped = Corpus::new(vec![record("a", None), record("b", None)]);
        assert_eq!(untyped.document_type().unwrap(), None);
    }

    #[test]
    fn index_keeps_first_row_per_identifier() {
        let mut first = record("dup", None);
        first.title = Some("first".into());
        let mut second = record("dup", None);
        second.title = Some("second".into());
        let corpus = Corpus::new(vec![first, second]);
        let index = corpus.index_by_urn();
        assert_eq!(index.len(), 1);
        assert_eq!(index["dup"].title.as_deref(), Some("first"));
    }

    #[test]
    fn field_lookup_matches_columns() {
        let mut row = record("u1", Some(DocumentType::Digibok));
        row.year = Some(1890);
        assert_eq!(row.field("urn"), json!("u1"));
        assert_eq!(row.field("year"), json!(1890));
        assert_eq!(row.field("doctype"), json!("digibok"));
        assert_eq!(row.field("city"), JsonValue::Null);
        assert_eq!(row.field("no_such_column"), JsonValue::Null);
    }
}
