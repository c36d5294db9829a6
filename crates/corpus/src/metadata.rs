//! Canonical corpus definitions.
//!
//! A [`CorpusMetadata`] value is the cache key of a query-defined corpus, so
//! construction funnels every input through one canonicalization step:
//!
//! - absent, empty and whitespace-only values all become `None`
//! - text values are trimmed
//! - language lists joined with `" OR "` are lowercased, de-duplicated and sorted
//! - years and sizes are parsed and range-checked
//! - fields the chosen document type does not support are rejected
//!
//! Two requests that mean the same corpus therefore produce equal (and
//! equally hashed) metadata values.
use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CorpusError;
use crate::types::{loose, DocumentType, SearchOrder};

/// Result size used when the request does not name one.
pub const DEFAULT_NUM_DOCS: u32 = 2000;

/// Largest corpus the search service is asked for.
pub const MAX_NUM_DOCS: u32 = 100_000;

const LANGUAGE_SEPARATOR: &str = " OR ";

/// Raw, form-shaped corpus parameters exactly as a caller supplied them.
///
/// Field names follow the corpus-builder form; JSON callers may also use the
/// short aliases (`document_type`, `subject`, `limit`, ...). Numbers are
/// accepted as strings or JSON numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusParams {
    #[serde(alias = "doc_type_selection", deserialize_with = "loose::opt_string")]
    pub document_type: Option<String>,
    #[serde(alias = "lang", deserialize_with = "loose::opt_string")]
    pub language: Option<String>,
    #[serde(deserialize_with = "loose::opt_string")]
    pub author: Option<String>,
    #[serde(deserialize_with = "loose::opt_string")]
    pub title: Option<String>,
    #[serde(alias = "fulltext", deserialize_with = "loose::opt_string")]
    pub words_or_phrases: Option<String>,
    #[serde(alias = "subject", deserialize_with = "loose::opt_string")]
    pub key_words: Option<String>,
    #[serde(alias = "ddk", deserialize_with = "loose::opt_string")]
    pub dewey: Option<String>,
    #[serde(deserialize_with = "loose::opt_string")]
    pub from_year: Option<String>,
    #[serde(deserialize_with = "loose::opt_string")]
    pub to_year: Option<String>,
    #[serde(alias = "order_by", deserialize_with = "loose::opt_string")]
    pub search_type: Option<String>,
    #[serde(alias = "limit", deserialize_with = "loose::opt_string")]
    pub num_docs: Option<String>,
    #[serde(deserialize_with = "loose::opt_string")]
    pub corpus_name: Option<String>,
}

impl CorpusParams {
    /// Build from a form-encoded key/value mapping. Unknown keys are ignored.
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut params = CorpusParams::default();
        for (key, value) in pairs {
            let value = Some(value.as_ref().to_string());
            match key.as_ref() {
                "doc_type_selection" | "document_type" => params.document_type = value,
                "language" | "lang" => params.language = value,
                "author" => params.author = value,
                "title" => params.title = value,
                "words_or_phrases" | "fulltext" => params.words_or_phrases = value,
                "key_words" | "subject" => params.key_words = value,
                "dewey" | "ddk" => params.dewey = value,
                "from_year" => params.from_year = value,
                "to_year" => params.to_year = value,
                "search_type" | "order_by" => params.search_type = value,
                "num_docs" | "limit" => params.num_docs = value,
                "corpus_name" => params.corpus_name = value,
                _ => {}
            }
        }
        params
    }
}

/// Immutable, hashable description of a query-defined corpus.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "CorpusParams", into = "CorpusParams")]
pub struct CorpusMetadata {
    document_type: DocumentType,
    language: Option<String>,
    author: Option<String>,
    title: Option<String>,
    words_or_phrases: Option<String>,
    key_words: Option<String>,
    dewey: Option<String>,
    from_year: Option<i32>,
    to_year: Option<i32>,
    search_type: SearchOrder,
    num_docs: u32,
    corpus_name: Option<String>,
}

impl CorpusMetadata {
    /// Canonicalize a form-shaped parameter mapping.
    ///
    /// ```
    /// use corpus::CorpusMetadata;
    ///
    /// let a = CorpusMetadata::from_params([("doc_type_selection", "digavis"), ("title", " ")]).unwrap();
    /// let b = CorpusMetadata::from_params([("doc_type_selection", "newspaper")]).unwrap();
    /// assert_eq!(a, b);
    /// ```
    pub fn from_params<K, V, I>(pairs: I) -> Result<Self, CorpusError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
        I: IntoIterator<Item = (K, V)>,
    {
        CorpusParams::from_pairs(pairs).try_into()
    }

    /// Metadata for a plain type/year-range query.
    pub fn for_type(document_type: DocumentType) -> Self {
        Self {
            document_type,
            language: None,
            author: None,
            title: None,
            words_or_phrases: None,
            key_words: None,
            dewey: None,
            from_year: None,
            to_year: None,
            search_type: SearchOrder::default(),
            num_docs: DEFAULT_NUM_DOCS,
            corpus_name: None,
        }
    }

    pub fn document_type(&self) -> DocumentType {
        self.document_type
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn words_or_phrases(&self) -> Option<&str> {
        self.words_or_phrases.as_deref()
    }

    pub fn key_words(&self) -> Option<&str> {
        self.key_words.as_deref()
    }

    pub fn dewey(&self) -> Option<&str> {
        self.dewey.as_deref()
    }

    pub fn from_year(&self) -> Option<i32> {
        self.from_year
    }

    pub fn to_year(&self) -> Option<i32> {
        self.to_year
    }

    pub fn search_type(&self) -> SearchOrder {
        self.search_type
    }

    pub fn num_docs(&self) -> u32 {
        self.num_docs
    }

    pub fn corpus_name(&self) -> Option<&str> {
        self.corpus_name.as_deref()
    }

    /// Field/value listing used by the corpus readme, values rendered the
    /// way an interactive shell would echo them (`'text'`, `1990`, `None`).
    pub fn definition(&self) -> Vec<(&'static str, String)> {
        vec![
            ("document_type", repr_text(Some(self.document_type.code()))),
            ("language", repr_text(self.language())),
            ("author", repr_text(self.author())),
            ("title", repr_text(self.title())),
            ("words_or_phrases", repr_text(self.words_or_phrases())),
            ("key_words", repr_text(self.key_words())),
            ("dewey", repr_text(self.dewey())),
            ("from_year", repr_number(self.from_year)),
            ("to_year", repr_number(self.to_year)),
            ("search_type", repr_text(Some(self.search_type.code()))),
            ("num_docs", self.num_docs.to_string()),
            ("corpus_name", repr_text(self.corpus_name())),
        ]
    }
}

impl fmt::Display for CorpusMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.corpus_name() {
            Some(name) => write!(f, "{name} ({}, {} docs)", self.document_type, self.num_docs),
            None => write!(f, "{} ({} docs)", self.document_type, self.num_docs),
        }
    }
}

impl TryFrom<CorpusParams> for CorpusMetadata {
    type Error = CorpusError;

    fn try_from(params: CorpusParams) -> Result<Self, Self::Error> {
        let document_type: DocumentType = clean(params.document_type)
            .ok_or_else(|| CorpusError::validation("doc_type_selection is required"))?
            .parse()?;

        let language = clean(params.language).and_then(canonical_languages);
        let author = clean(params.author);
        let dewey = clean(params.dewey);
        let key_words = clean(params.key_words);

        if !document_type.supports_bibliographic_filters() {
            for (field, value) in [("author", &author), ("dewey", &dewey), ("key_words", &key_words)] {
                if value.is_some() {
                    return Err(CorpusError::validation(format!(
                        "{field} is only supported for digibok, not {document_type}"
                    )));
                }
            }
        }
        if language.is_some() && !document_type.supports_language_filter() {
            return Err(CorpusError::validation(format!(
                "language is not supported for {document_type}"
            )));
        }

        let from_year = parse_year("from_year", params.from_year)?;
        let to_year = parse_year("to_year", params.to_year)?;
        if let (Some(from), Some(to)) = (from_year, to_year) {
            if from > to {
                return Err(CorpusError::validation(format!(
                    "from_year ({from}) must not exceed to_year ({to})"
                )));
            }
        }

        let search_type = match clean(params.search_type) {
            Some(value) => value.parse()?,
            None => SearchOrder::default(),
        };

        let num_docs = match clean(params.num_docs) {
            Some(value) => value.parse::<u32>().map_err(|_| {
                CorpusError::validation(format!("num_docs must be a positive integer, got `{value}`"))
            })?,
            None => DEFAULT_NUM_DOCS,
        };
        if !(1..=MAX_NUM_DOCS).contains(&num_docs) {
            return Err(CorpusError::validation(format!(
                "num_docs must be between 1 and {MAX_NUM_DOCS}, got {num_docs}"
            )));
        }

        Ok(Self {
            document_type,
            language,
            author,
            title: clean(params.title),
            words_or_phrases: clean(params.words_or_phrases),
            key_words,
            dewey,
            from_year,
            to_year,
            search_type,
            num_docs,
            corpus_name: clean(params.corpus_name),
        })
    }
}

impl From<CorpusMetadata> for CorpusParams {
    fn from(meta: CorpusMetadata) -> Self {
        CorpusParams {
            document_type: Some(meta.document_type.code().to_string()),
            language: meta.language,
            author: meta.author,
            title: meta.title,
            words_or_phrases: meta.words_or_phrases,
            key_words: meta.key_words,
            dewey: meta.dewey,
            from_year: meta.from_year.map(|y| y.to_string()),
            to_year: meta.to_year.map(|y| y.to_string()),
            search_type: Some(meta.search_type.code().to_string()),
            num_docs: Some(meta.num_docs.to_string()),
            corpus_name: meta.corpus_name,
        }
    }
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn canonical_languages(raw: String) -> Option<String> {
    let languages: BTreeSet<String> = raw
        .split(LANGUAGE_SEPARATOR)
        .map(|lang| lang.trim().to_lowercase())
        .filter(|lang| !lang.is_empty())
        .collect();
    if languages.is_empty() {
        return None;
    }
    Some(languages.into_iter().collect::<Vec<_>>().join(LANGUAGE_SEPARATOR))
}

fn parse_year(field: &str, value: Option<String>) -> Result<Option<i32>, CorpusError> {
    clean(value)
        .map(|v| {
            v.parse::<i32>()
                .map_err(|_| CorpusError::validation(format!("{field} must be a year, got `{v}`")))
        })
        .transpose()
}

fn repr_text(value: Option<&str>) -> String {
    match value {
        Some(text) => format!("'{}'", text.replace('\\', "\\\\").replace('\'', "\\'")),
        None => "None".to_string(),
    }
}

fn repr_number(value: Option<i32>) -> String {
    value.map_or_else(|| "None".to_string(), |v| v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    fn hash_of(meta: &CorpusMetadata) -> u64 {
        let mut hasher = DefaultHasher::new();
        meta.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn absent_and_blank_values_are_the_same_key() {
        let a = CorpusMetadata::from_params([
            ("doc_type_selection", "digibok"),
            ("author", ""),
            ("title", "   "),
            ("corpus_name", "\t"),
        ])
        .unwrap();
        let b = CorpusMetadata::from_params([("doc_type_selection", "digibok")]).unwrap();

        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
        assert_eq!(a.author(), None);
        assert_eq!(a.num_docs(), DEFAULT_NUM_DOCS);
        assert_eq!(a.search_type(), SearchOrder::Random);
    }

    #[test]
    fn text_values_are_trimmed() {
        let meta = CorpusMetadata::from_params([
            ("doc_type_selection", "digibok"),
            ("author", "  Hamsun, Knut "),
        ])
        .unwrap();
        assert_eq!(meta.author(), Some("Hamsun, Knut"));
    }

    #[test]
    fn language_lists_are_order_independent() {
        let a = CorpusMetadata::from_params([
            ("doc_type_selection", "digibok"),
            ("language", "nob OR NNO OR nob"),
        ])
        .unwrap();
        let b = CorpusMetadata::from_params([
            ("doc_type_selection", "digibok"),
            ("language", "nno OR nob"),
        ])
        .unwrap();
        assert_eq!(a, b);
        assert_eq!(a.language(), Some("nno OR nob"));
    }

    #[test]
    fn document_type_is_required() {
        let err = CorpusMetadata::from_params([("title", "Sult")]).unwrap_err();
        assert!(err.to_string().contains("doc_type_selection"));
    }

    #[test]
    fn book_only_fields_are_rejected_elsewhere() {
        let err = CorpusMetadata::from_params([
            ("doc_type_selection", "digavis"),
            ("dewey", "839"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("dewey"));

        let err = CorpusMetadata::from_params([
            ("doc_type_selection", "digavis"),
            ("language", "nob"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("language"));
    }

    #[test]
    fn year_range_is_checked() {
        let err = CorpusMetadata::from_params([
            ("doc_type_selection", "digibok"),
            ("from_year", "2020"),
            ("to_year", "1990"),
        ])
        .unwrap_err();
        assert!(matches!(err, CorpusError::Validation(_)));

        let err = CorpusMetadata::from_params([
            ("doc_type_selection", "digibok"),
            ("from_year", "nineteen ninety"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("from_year"));
    }

    #[test]
    fn num_docs_bounds() {
        assert!(CorpusMetadata::from_params([("doc_type_selection", "digibok"), ("num_docs", "0")]).is_err());
        assert!(CorpusMetadata::from_params([("doc_type_selection", "digibok"), ("num_docs", "100001")]).is_err());
        let meta =
            CorpusMetadata::from_params([("doc_type_selection", "digibok"), ("num_docs", "100000")]).unwrap();
        assert_eq!(meta.num_docs(), MAX_NUM_DOCS);
    }

    #[test]
    fn json_numbers_are_accepted() {
        let meta: CorpusMetadata = serde_json::from_value(serde_json::json!({
            "document_type": "newspaper",
            "from_year": 1990,
            "to_year": 2020,
            "limit": 1000
        }))
        .unwrap();
        assert_eq!(meta.document_type(), DocumentType::Digavis);
        assert_eq!(meta.from_year(), Some(1990));
        assert_eq!(meta.to_year(), Some(2020));
        assert_eq!(meta.num_docs(), 1000);
    }

    #[test]
    fn json_round_trip_keeps_identity() {
        let meta = CorpusMetadata::from_params([
            ("doc_type_selection", "digibok"),
            ("title", "Sult"),
            ("from_year", "1890"),
        ])
        .unwrap();
        let json = serde_json::to_value(&meta).unwrap();
        let back: CorpusMetadata = serde_json::from_value(json).unwrap();
        assert_eq!(meta, back);
    }

    #[test]
    fn definition_uses_repr_style_values() {
        let meta = CorpusMetadata::from_params([
            ("doc_type_selection", "digibok"),
            ("title", "Hunger's end"),
            ("from_year", "1890"),
        ])
        .unwrap();
        let definition = meta.definition();
        assert!(definition.contains(&("document_type", "'digibok'".to_string())));
        assert!(definition.contains(&("title", "'Hunger\\'s end'".to_string())));
        assert!(definition.contains(&("from_year", "1890".to_string())));
        assert!(definition.contains(&("author", "None".to_string())));
        assert!(definition.contains(&("num_docs", "2000".to_string())));
    }
}
