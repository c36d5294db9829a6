//! Readme texts placed next to the exported tables.
use chrono::NaiveDateTime;
use corpus::CorpusHandle;
use explore::{CollocationRequest, ExploreConfig};
use minijinja::{context, Environment};

use crate::error::ExportError;

const CORPUS_README: &str = "corpus_readme.md";
const COLLOCATION_README: &str = "collocation_readme.md";

/// Compiled readme templates.
pub struct Readmes {
    env: Environment<'static>,
}

impl Readmes {
    pub fn new() -> Result<Self, ExportError> {
        let mut env = Environment::new();
        env.add_template(CORPUS_README, include_str!("../templates/corpus_readme.md"))?;
        env.add_template(
            COLLOCATION_README,
            include_str!("../templates/collocation_readme.md"),
        )?;
        Ok(Self { env })
    }

    /// Definition of the corpus plus its creation time. Uploaded corpora
    /// have an empty definition.
    pub fn corpus(&self, handle: &CorpusHandle, created: NaiveDateTime) -> Result<String, ExportError> {
        let definition = handle.definition();
        let timestamp = created.format("%Y-%m-%dT%H:%M:%S%.6f").to_string();
        Ok(self
            .env
            .get_template(CORPUS_README)?
            .render(context! { definition, timestamp })?)
    }

    pub fn collocations(
        &self,
        request: &CollocationRequest,
        cfg: &ExploreConfig,
    ) -> Result<String, ExportError> {
        Ok(self.env.get_template(COLLOCATION_README)?.render(context! {
            words => request.words.trim(),
            before => request.before,
            after => request.after,
            sample_size => request.effective_sample_size(cfg),
            reference => &request.reference,
            sort_by => &request.sort_by,
            max_results => request.max_results,
        })?)
    }
}
