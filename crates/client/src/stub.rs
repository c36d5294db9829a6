use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use corpus::{
    AnalysisBackend, CapabilityError, CollocateScore, CollocationQuery, ConcordanceHit,
    ConcordanceQuery, Corpus, CorpusMetadata, DocumentRecord, DocumentType, ReferenceTable,
    SearchBackend, SearchOrder,
};
use fxhash::hash64;

use crate::frame;

const VOCABULARY: [&str; 24] = [
    "og", "i", "det", "som", "en", "på", "havet", "fjellet", "byen", "kongen", "folket", "skipet",
    "vinter", "sommer", "krig", "fred", "arbeid", "skole", "kirke", "bonde", "fisk", "tog", "brev",
    "avis",
];

const WORDS_PER_DOCUMENT: usize = 80;

/// A document known to the stub: metadata row plus searchable text.
#[derive(Debug, Clone, PartialEq)]
pub struct StubDocument {
    pub record: DocumentRecord,
    pub text: String,
}

/// Deterministic in-memory stand-in for the DH-LAB service.
///
/// Filters its document list the way the search service would, extracts
/// concordances and counts collocates from each document's text, and counts
/// every call so cache behaviour can be asserted. Optional latency and a
/// forced failure make timeout and error paths reproducible.
#[derive(Debug, Default)]
pub struct StubBackend {
    documents: Vec<StubDocument>,
    latency: Option<Duration>,
    failure: Option<CapabilityError>,
    build_calls: AtomicUsize,
    resolve_calls: AtomicUsize,
    concordance_calls: AtomicUsize,
    collocation_calls: AtomicUsize,
}

impl StubBackend {
    pub fn new(documents: Vec<StubDocument>) -> Self {
        Self {
            documents,
            ..Default::default()
        }
    }

    /// Synthetic library with `per_type` documents of every document type,
    /// dated 1950–2020. Same input, same library.
    pub fn generated(per_type: usize) -> Self {
        let mut documents = Vec::with_capacity(per_type * DocumentType::ALL.len());
        let mut dhlabid = 100_000i64;
        for doctype in DocumentType::ALL {
            for n in 0..per_type {
                dhlabid += 1;
                documents.push(synthetic_document(doctype, n, dhlabid));
            }
        }
        Self::new(documents)
    }

    /// Sleep this long before answering any call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Fail every call with `err`.
    pub fn failing(mut self, err: CapabilityError) -> Self {
        self.failure = Some(err);
        self
    }

    pub fn documents(&self) -> &[StubDocument] {
        &self.documents
    }

    pub fn build_calls(&self) -> usize {
        self.build_calls.load(Ordering::SeqCst)
    }

    pub fn resolve_calls(&self) -> usize {
        self.resolve_calls.load(Ordering::SeqCst)
    }

    pub fn concordance_calls(&self) -> usize {
        self.concordance_calls.load(Ordering::SeqCst)
    }

    pub fn collocation_calls(&self) -> usize {
        self.collocation_calls.load(Ordering::SeqCst)
    }

    async fn answer(&self, counter: &AtomicUsize) -> Result<(), CapabilityError> {
        counter.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn matches(doc: &StubDocument, meta: &CorpusMetadata) -> bool {
        let record = &doc.record;
        if record.doctype != Some(meta.document_type()) {
            return false;
        }
        if let Some(from) = meta.from_year() {
            if record.year.is_none_or(|y| y < from) {
                return false;
            }
        }
        if let Some(to) = meta.to_year() {
            if record.year.is_none_or(|y| y > to) {
                return false;
            }
        }
        let contains = |field: &Option<String>, needle: Option<&str>| match needle {
            Some(needle) => field
                .as_deref()
                .is_some_and(|v| v.to_lowercase().contains(&needle.to_lowercase())),
            None => true,
        };
        if !contains(&record.title, meta.title())
            || !contains(&record.authors, meta.author())
            || !contains(&record.subjects, meta.key_words())
            || !contains(&record.ddc, meta.dewey())
        {
            return false;
        }
        if let Some(languages) = meta.language() {
            let wanted: Vec<&str> = languages.split(" OR ").collect();
            let langs = record.langs.as_deref().unwrap_or_default();
            if !wanted.iter().any(|lang| langs.contains(lang)) {
                return false;
            }
        }
        if let Some(phrase) = meta.words_or_phrases() {
            if !doc.text.to_lowercase().contains(&phrase.to_lowercase()) {
                return false;
            }
        }
        true
    }
}

#[async_trait]
impl SearchBackend for StubBackend {
    async fn build_corpus(&self, metadata: &CorpusMetadata) -> Result<Corpus, CapabilityError> {
        self.answer(&self.build_calls).await?;
        let mut hits: Vec<&StubDocument> = self
            .documents
            .iter()
            .filter(|doc| Self::matches(doc, metadata))
            .collect();
        if metadata.search_type() == SearchOrder::Random {
            hits.sort_by_key(|doc| hash64(doc.record.urn.as_bytes()));
        }
        Ok(hits
            .into_iter()
            .take(metadata.num_docs() as usize)
            .map(|doc| doc.record.clone())
            .collect())
    }

    async fn resolve_identifiers(&self, urns: &[String]) -> Result<Corpus, CapabilityError> {
        self.answer(&self.resolve_calls).await?;
        Ok(urns
            .iter()
            .filter_map(|urn| self.documents.iter().find(|doc| &doc.record.urn == urn))
            .map(|doc| doc.record.clone())
            .collect())
    }
}

#[async_trait]
impl AnalysisBackend for StubBackend {
    async fn concordances(
        &self,
        query: &ConcordanceQuery,
    ) -> Result<Vec<ConcordanceHit>, CapabilityError> {
        self.answer(&self.concordance_calls).await?;
        let wanted_ids: HashSet<i64> = query.dhlabids.iter().copied().collect();
        let wanted_urns: HashSet<&str> = query.urns.iter().map(String::as_str).collect();
        let needle: Vec<String> = query.query.split_whitespace().map(str::to_lowercase).collect();
        if needle.is_empty() {
            return Ok(Vec::new());
        }
        let window = query.window as usize;

        let mut hits = Vec::new();
        for doc in &self.documents {
            let in_corpus = doc.record.dhlabid.is_some_and(|id| wanted_ids.contains(&id))
                || wanted_urns.contains(doc.record.urn.as_str());
            if !in_corpus {
                continue;
            }
            let tokens: Vec<&str> = doc.text.split_whitespace().collect();
            for start in 0..tokens.len() {
                if hits.len() >= query.limit as usize {
                    return Ok(hits);
                }
                let end = start + needle.len();
                if end > tokens.len() {
                    break;
                }
                let found = tokens[start..end]
                    .iter()
                    .zip(&needle)
                    .all(|(token, want)| token.to_lowercase() == *want);
                if found {
                    let left = start.saturating_sub(window);
                    let right = (end + window).min(tokens.len());
                    hits.push(ConcordanceHit {
                        urn: doc.record.urn.clone(),
                        concordance: tokens[left..right].join(" "),
                    });
                }
            }
        }
        Ok(hits)
    }

    async fn collocations(
        &self,
        query: &CollocationQuery,
        reference: &ReferenceTable,
    ) -> Result<Vec<CollocateScore>, CapabilityError> {
        self.answer(&self.collocation_calls).await?;
        let targets: HashSet<String> = query.words.split_whitespace().map(str::to_lowercase).collect();
        let sample: HashSet<&str> = query
            .urns
            .iter()
            .take(query.sample_size as usize)
            .map(String::as_str)
            .collect();

        let mut counts: BTreeMap<String, f64> = BTreeMap::new();
        for doc in self.documents.iter().filter(|d| sample.contains(d.record.urn.as_str())) {
            let tokens: Vec<String> = doc.text.split_whitespace().map(str::to_lowercase).collect();
            for (idx, token) in tokens.iter().enumerate() {
                if !targets.contains(token) {
                    continue;
                }
                let left = idx.saturating_sub(query.before as usize);
                let right = (idx + 1 + query.after as usize).min(tokens.len());
                for (pos, neighbour) in tokens[left..right].iter().enumerate() {
                    if left + pos != idx {
                        *counts.entry(neighbour.clone()).or_insert(0.0) += 1.0;
                    }
                }
            }
        }
        Ok(frame::score_collocates(counts.into_iter().collect(), reference))
    }
}

fn synthetic_document(doctype: DocumentType, n: usize, dhlabid: i64) -> StubDocument {
    let urn = format!("URN:NBN:no-nb_{}_{n:06}", doctype.code());
    let seed = hash64(urn.as_bytes());
    let year = 1950 + (seed % 71) as i32;
    let month = 1 + (seed >> 8) % 12;
    let day = 1 + (seed >> 16) % 28;
    let text = (0..WORDS_PER_DOCUMENT)
        .map(|i| {
            let h = hash64(format!("{urn}:{i}").as_bytes());
            VOCABULARY[(h % VOCABULARY.len() as u64) as usize]
        })
        .collect::<Vec<_>>()
        .join(" ");

    let book_like = doctype.supports_bibliographic_filters();
    let record = DocumentRecord {
        dhlabid: Some(dhlabid),
        title: Some(format!("{} {n}", doctype.alias())),
        authors: (doctype != DocumentType::Digistorting).then(|| format!("Forfatter {}", n % 7)),
        city: Some(["Oslo", "Bergen", "Trondheim", "Tromsø"][(seed % 4) as usize].to_string()),
        timestamp: Some(format!("{year}{month:02}{day:02}")),
        year: Some(year),
        publisher: book_like.then(|| "Gyldendal".to_string()),
        ddc: book_like.then(|| format!("{}", 800 + seed % 100)),
        subjects: book_like.then(|| "roman".to_string()),
        langs: doctype
            .supports_language_filter()
            .then(|| (if seed % 5 == 0 { "nno" } else { "nob" }).to_string()),
        doctype: Some(doctype),
        ..DocumentRecord::with_urn(urn)
    };
    StubDocument { record, text }
}
