//! Export bundles for corpora and exploration results.
//!
//! [`bundle`] writes an in-memory zip archive holding the corpus workbook and
//! readme. Each [`Attachment`] adds its own result workbook, and collocations
//! also bring their word cloud and readme. Readme texts come from [`Readmes`].

mod bundle;
mod error;
mod readme;
mod sheet;

pub use crate::bundle::{
    bundle, Attachment, CLOUD_ENTRY, COLLOCATION_ENTRY, COLLOCATION_README_ENTRY,
    CONCORDANCE_ENTRY, CORPUS_ENTRY, CORPUS_README_ENTRY,
};
pub use crate::error::ExportError;
pub use crate::readme::Readmes;
pub use crate::sheet::{
    collocation_workbook, concordance_workbook, corpus_workbook, COLLOCATION_SHEET,
    CONCORDANCE_SHEET, CORPUS_SHEET,
};
