pub mod minijinja;
pub mod helpers;
pub mod objects;

use std::fs;
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{Result, Chainable};
use crate::markdown::Markdown;
use crate::taxonomy::{Content, ContentKind, Document, Site};
use crate::util::is_template;

pub use self::minijinja::MiniJinjaEngine;

pub trait Engine: Send + Sync + Debug {
    /// Loads every template under `dir`.
    fn load(dir: &Path) -> Result<Self> where Self: Sized;

    /// The loaded template `name` refers to: `name` itself, else `name.html`.
    fn resolve(&self, name: &str) -> Option<&str>;

    /// Renders the loaded template `name` with `{Page, Site}`.
    fn render(&self, name: &str, site: &Arc<Site>, doc: &Arc<Document>) -> Result<String>;

    /// Renders `template_str`, reported as `name`, with `{Page, Site}`.
    fn render_str(
        &self,
        name: &str,
        template_str: &str,
        site: &Arc<Site>,
        doc: &Arc<Document>,
    ) -> Result<String>;

    /// Turns a document's raw body into its content.
    fn render_body(&self, site: &Arc<Site>, doc: &Arc<Document>) -> Result<Content> {
        let raw = doc.raw();
        match doc.kind {
            ContentKind::Markdown => Ok(Content::Html(Markdown::from(raw).to_html().into())),
            ContentKind::Html if !is_template(raw) => Ok(Content::Html(raw.clone())),
            ContentKind::Html => {
                let name = format!("{}.html", doc.key());
                let html = self.render_str(&name, raw, site, doc).chain_with(|| error! {
                    "failed to render document body",
                    "source" => doc.source.display(),
                })?;

                Ok(Content::Html(html.into()))
            }
            ContentKind::Text => Ok(Content::Text(raw.clone())),
        }
    }

    /// Renders `doc` into its template and writes the result under
    /// `output_root`, returning the path written. Nothing is written if
    /// rendering fails.
    fn render_page(&self, site: &Arc<Site>, doc: &Arc<Document>, output_root: &Path) -> Result<PathBuf> {
        let template = doc.template();
        let Some(name) = self.resolve(template) else {
            return err! {
                "missing template",
                "template" => template,
                "source" => doc.source.display(),
            };
        };

        let html = self.render(name, site, doc).chain_with(|| error! {
            "failed to render page",
            "template" => name,
            "source" => doc.source.display(),
        })?;

        let path = output_root.join(doc.path()).join(format!("{}.html", doc.slug()));
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).chain_with(|| error! {
                "failed to create output directory",
                "directory" => parent.display(),
            })?;
        }

        fs::write(&path, html).chain_with(|| error! {
            "failed to write page",
            "path" => path.display(),
            "source" => doc.source.display(),
        })?;

        tracing::trace!(source = %doc.source.display(), output = %path.display(), "rendered page");
        Ok(path)
    }
}
