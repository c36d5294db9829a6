//! Export Bundler.
//!
//! Archive layout:
//!
//! | Entry | Written for |
//! |-------|-------------|
//! | `korpus.xlsx` | every bundle |
//! | `LESMEG_KORPUS.md` | every bundle |
//! | `konkordanser.xlsx` | concordance exports |
//! | `kollokasjoner.xlsx` | collocation exports |
//! | `ordsky.png` | collocation exports |
//! | `LESMEG_KOLLOKASJONER.md` | collocation exports |
//!
//! `korpus.xlsx` holds only the corpus and is readable by the upload parser,
//! so an archive can be uploaded again to recreate its corpus.
use std::io::{Cursor, Write};
use std::time::Instant;

use corpus::Corpus;
use explore::{CollocationResult, ConcordanceTable};
use tracing::{info, info_span, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::ExportError;
use crate::sheet::{collocation_workbook, concordance_workbook, corpus_workbook};

pub const CORPUS_ENTRY: &str = "korpus.xlsx";
pub const CORPUS_README_ENTRY: &str = "LESMEG_KORPUS.md";
pub const CONCORDANCE_ENTRY: &str = "konkordanser.xlsx";
pub const COLLOCATION_ENTRY: &str = "kollokasjoner.xlsx";
pub const CLOUD_ENTRY: &str = "ordsky.png";
pub const COLLOCATION_README_ENTRY: &str = "LESMEG_KOLLOKASJONER.md";

/// Result-specific content added after the corpus entries.
#[derive(Debug, Clone, Copy)]
pub enum Attachment<'a> {
    Concordances(&'a ConcordanceTable),
    Collocations {
        result: &'a CollocationResult,
        readme: &'a str,
    },
}

impl Attachment<'_> {
    fn kind(&self) -> &'static str {
        match self {
            Attachment::Concordances(_) => "concordances",
            Attachment::Collocations { .. } => "collocations",
        }
    }
}

/// Build an in-memory zip of `corpus`, its readme and `attachments`.
pub fn bundle(
    corpus: &Corpus,
    readme: &str,
    attachments: &[Attachment<'_>],
) -> Result<Vec<u8>, ExportError> {
    let span = info_span!(
        "export.bundle",
        documents = corpus.len(),
        attachments = attachments.len()
    );
    let _guard = span.enter();
    let start = Instant::now();

    let result = write_archive(corpus, readme, attachments);
    match &result {
        Ok(bytes) => info!(
            bytes = bytes.len(),
            kinds = ?attachments.iter().map(Attachment::kind).collect::<Vec<_>>(),
            elapsed_micros = start.elapsed().as_micros() as u64,
            "export_bundle_success"
        ),
        Err(err) => warn!(
            error = %err,
            elapsed_micros = start.elapsed().as_micros() as u64,
            "export_bundle_failure"
        ),
    }
    result
}

fn write_archive(
    corpus: &Corpus,
    readme: &str,
    attachments: &[Attachment<'_>],
) -> Result<Vec<u8>, ExportError> {
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

    let put = |zip: &mut ZipWriter<Cursor<Vec<u8>>>, name: &str, bytes: &[u8]| {
        zip.start_file(name, options)?;
        zip.write_all(bytes)?;
        Ok::<_, ExportError>(())
    };

    put(&mut zip, CORPUS_ENTRY, &corpus_workbook(corpus)?)?;
    put(&mut zip, CORPUS_README_ENTRY, readme.as_bytes())?;

    for attachment in attachments {
        match attachment {
            Attachment::Concordances(table) => {
                put(&mut zip, CONCORDANCE_ENTRY, &concordance_workbook(table)?)?;
            }
            Attachment::Collocations { result, readme } => {
                put(&mut zip, COLLOCATION_ENTRY, &collocation_workbook(&result.table)?)?;
                put(&mut zip, CLOUD_ENTRY, &png(result)?)?;
                put(&mut zip, COLLOCATION_README_ENTRY, readme.as_bytes())?;
            }
        }
    }

    Ok(zip.finish()?.into_inner())
}

fn png(result: &CollocationResult) -> Result<Vec<u8>, ExportError> {
    result
        .image
        .to_png()
        .map_err(|err| ExportError::Archive(err.to_string()))
}
