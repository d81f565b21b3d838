//! The build pipeline.
//!
//! A build is one pass through [`Stage`]s, in order:
//!
//! 1. **Staging**: the skeleton directory is copied into the output root.
//! 2. **TemplatesLoaded**: every template is loaded.
//! 3. **ContentIngested**: every content file is parsed into a [`Document`]
//!    and added to the [`Site`].
//! 4. **Cooked**: per-document transforms run.
//! 5. **BodyRendered**: each document's body becomes its content.
//! 6. **PagesRendered**: each document is rendered into its template and
//!    written out.
//!
//! The first error ends the build. Nothing already written is rolled back.

use std::fmt;
use std::sync::Arc;

use crate::config::Config;
use crate::copy::copy_dir;
use crate::error::{Result, Chainable};
use crate::fstree::FsTree;
use crate::taxonomy::{ContentKind, Document, Site};
use crate::templating::{Engine, MiniJinjaEngine};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Staging,
    TemplatesLoaded,
    ContentIngested,
    Cooked,
    BodyRendered,
    PagesRendered,
    Done,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Staging => "staging",
            Stage::TemplatesLoaded => "loading templates",
            Stage::ContentIngested => "ingesting content",
            Stage::Cooked => "cooking",
            Stage::BodyRendered => "rendering bodies",
            Stage::PagesRendered => "rendering pages",
            Stage::Done => "done",
            Stage::Failed => "failed",
        };

        f.write_str(name)
    }
}

/// Builds the site described by `config` with the MiniJinja engine.
pub fn build(config: &Config) -> Result<Arc<Site>> {
    build_with::<MiniJinjaEngine>(config)
}

/// Builds the site described by `config` with the engine `E`.
pub fn build_with<E: Engine>(config: &Config) -> Result<Arc<Site>> {
    let mut builder = Builder::new(config);
    let result = builder.run::<E>();
    builder.finish(result)
}

struct Builder {
    stage: Stage,
    config: Arc<Config>,
}

impl Builder {
    fn new(config: &Config) -> Builder {
        Builder { stage: Stage::Staging, config: Arc::new(config.clone()) }
    }

    fn enter(&mut self, stage: Stage) {
        tracing::debug!(from = %self.stage, to = %stage, "build stage");
        self.stage = stage;
    }

    /// Moves to `Done` or `Failed`. A failure names the stage it happened in.
    fn finish(&mut self, result: Result<Arc<Site>>) -> Result<Arc<Site>> {
        match result {
            Ok(site) => {
                self.enter(Stage::Done);
                tracing::info!(documents = site.len(), output = %self.config.output.display(), "generated site");
                Ok(site)
            }
            Err(e) => {
                let stage = self.stage;
                self.enter(Stage::Failed);
                Err(e.chain(error! {
                    "build failed",
                    "stage" => stage,
                }))
            }
        }
    }

    fn run<E: Engine>(&mut self) -> Result<Arc<Site>> {
        let config = self.config.clone();

        self.enter(Stage::Staging);
        config.check()?;
        copy_dir(&config.skeleton, &config.output)?;

        self.enter(Stage::TemplatesLoaded);
        let engine = E::load(&config.templates)?;

        self.enter(Stage::ContentIngested);
        let mut site = Site::new(config.clone());
        ingest(&mut site, &config)?;

        self.enter(Stage::Cooked);
        for doc in site.documents() {
            cook(doc)?;
        }

        let site = Arc::new(site);
        self.enter(Stage::BodyRendered);
        for doc in site.documents() {
            let content = engine.render_body(&site, doc)?;
            doc.set_content(content);
        }

        self.enter(Stage::PagesRendered);
        for doc in site.documents() {
            engine.render_page(&site, doc, &config.output)?;
        }

        Ok(site)
    }
}

/// Reads every content file, in walk order, into `site`.
fn ingest(site: &mut Site, config: &Config) -> Result<()> {
    let tree = FsTree::build(&config.content)?;
    for entry in tree.files() {
        if !ContentKind::from_path(&entry.path).is_ingested() {
            tracing::trace!(path = %entry.path.display(), "skipping non-content file");
            continue;
        }

        let doc = Document::read(&tree.root().path, &entry.path).chain_with(|| error! {
            "failed to ingest content file",
            "path" => entry.path.display(),
        })?;

        tracing::trace!(key = doc.key(), source = %entry.path.display(), "ingested");
        site.insert(doc)?;
    }

    Ok(())
}

/// Per-document transforms after ingestion. Attributes are derived while
/// parsing, so there is nothing to do yet.
fn cook(_doc: &Document) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_names() {
        assert_eq!(Stage::PagesRendered.to_string(), "rendering pages");
        assert_eq!(Stage::Staging.to_string(), "staging");
    }

    #[test]
    fn builds_end_in_done_or_failed() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::with_settings(dir.path(), Default::default());

        let mut builder = Builder::new(&config);
        let result = builder.run::<MiniJinjaEngine>();
        let error = builder.finish(result).unwrap_err();
        assert_eq!(builder.stage, Stage::Failed);
        assert_eq!(error.message(), "build failed");
        assert_eq!(error.context_value("stage").as_deref(), Some("staging"));

        for sub in ["content", "skel", "templates"] {
            std::fs::create_dir(dir.path().join(sub)).unwrap();
        }

        let mut builder = Builder::new(&config);
        let result = builder.run::<MiniJinjaEngine>();
        let site = builder.finish(result).unwrap();
        assert_eq!(builder.stage, Stage::Done);
        assert!(site.is_empty());
    }
}
