use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::collections::BTreeSet;

use minijinja::Environment;

use crate::error::{Result, Chainable};
use crate::fstree::FsTree;
use crate::taxonomy::{Document, Site};
use crate::templating::{helpers, Engine};
use crate::templating::objects::RenderContext;

/// Template file extensions, compared case-insensitively.
pub const TEMPLATE_EXTENSIONS: &[&str] = &["html", "htm"];

#[derive(Debug)]
pub struct MiniJinjaEngine {
    env: Environment<'static>,
    names: BTreeSet<String>,
}

impl MiniJinjaEngine {
    /// An engine with the helpers registered and no templates.
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_keep_trailing_newline(true);
        helpers::register(&mut env);
        MiniJinjaEngine { env, names: BTreeSet::new() }
    }

    /// Adds or replaces the template `name`.
    pub fn add_template(&mut self, name: &str, source: String) -> Result<()> {
        self.env.add_template_owned(name.to_string(), source).chain_with(|| error! {
            "invalid template",
            "template" => name,
        })?;

        self.names.insert(name.to_string());
        Ok(())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(|s| s.as_str())
    }
}

impl Default for MiniJinjaEngine {
    fn default() -> Self {
        MiniJinjaEngine::new()
    }
}

fn is_template_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| TEMPLATE_EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e)))
}

impl Engine for MiniJinjaEngine {
    fn load(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return err! {
                "no templates - dir doesn't exist",
                "templates directory" => dir.display(),
            };
        }

        let mut engine = MiniJinjaEngine::new();
        let tree = FsTree::build(dir)?;
        for entry in tree.files().filter(|e| is_template_file(&e.path)) {
            let source = fs::read_to_string(&entry.path).chain_with(|| error! {
                "failed to read template",
                "path" => entry.path.display(),
            })?;

            if engine.names.contains(&entry.file_name) {
                tracing::warn!(
                    template = %entry.file_name,
                    path = %entry.path.display(),
                    "duplicate template name; replacing earlier template"
                );
            }

            engine.add_template(&entry.file_name, source).chain_with(|| error! {
                "failed to load template",
                "path" => entry.path.display(),
            })?;
        }

        if engine.names.is_empty() {
            return err! {
                "no templates found",
                "templates directory" => dir.display(),
            };
        }

        tracing::debug!(count = engine.names.len(), "loaded templates");
        Ok(engine)
    }

    fn resolve(&self, name: &str) -> Option<&str> {
        self.names.get(name)
            .or_else(|| self.names.get(&format!("{name}.html")))
            .map(String::as_str)
    }

    fn render(&self, name: &str, site: &Arc<Site>, doc: &Arc<Document>) -> Result<String> {
        let template = self.env.get_template(name)?;
        Ok(template.render(RenderContext::value(site, doc))?)
    }

    fn render_str(
        &self,
        name: &str,
        template_str: &str,
        site: &Arc<Site>,
        doc: &Arc<Document>,
    ) -> Result<String> {
        let context = RenderContext::value(site, doc);
        Ok(self.env.render_named_str(name, template_str, context)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    use crate::config::Config;
    use crate::taxonomy::{Content, ContentKind};
    use crate::value::Dict;

    fn engine(templates: &[(&str, &str)]) -> MiniJinjaEngine {
        let mut engine = MiniJinjaEngine::new();
        for (name, source) in templates {
            engine.add_template(name, source.to_string()).unwrap();
        }

        engine
    }

    fn site_with(relative: &str, input: &str) -> (Arc<Site>, Arc<Document>) {
        let config = Config::with_settings("/site", Dict::from([("name".into(), "S".into())]));
        let mut site = Site::new(Arc::new(config));
        let source = Path::new("/site/content").join(relative);
        let doc = site.insert(Document::parse(Path::new(relative), &source, input).unwrap()).unwrap();
        (Arc::new(site), doc)
    }

    #[test]
    fn load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            MiniJinjaEngine::load(&dir.path().join("missing")).unwrap_err().message(),
            "no templates - dir doesn't exist"
        );

        assert_eq!(MiniJinjaEngine::load(dir.path()).unwrap_err().message(), "no templates found");

        fs::create_dir(dir.path().join("a")).unwrap();
        fs::create_dir(dir.path().join("b")).unwrap();
        fs::write(dir.path().join("a/base.html"), "first").unwrap();
        fs::write(dir.path().join("b/base.html"), "second").unwrap();
        fs::write(dir.path().join("default.HTM"), "{{ Page.title }}").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let engine = MiniJinjaEngine::load(dir.path()).unwrap();
        assert_eq!(engine.names().collect::<Vec<_>>(), ["base.html", "default.HTM"]);

        let (site, doc) = site_with("x.md", "");
        assert_eq!(engine.render("base.html", &site, &doc).unwrap(), "second");
    }

    #[test]
    fn resolution() {
        let engine = engine(&[("default.html", ""), ("post", ""), ("post.html", "")]);
        assert_eq!(engine.resolve("default"), Some("default.html"));
        assert_eq!(engine.resolve("default.html"), Some("default.html"));
        assert_eq!(engine.resolve("post"), Some("post"));
        assert_eq!(engine.resolve("nope"), None);
    }

    #[test]
    fn body_phase_by_kind() {
        let engine = engine(&[]);

        let (site, doc) = site_with("a.md", "# Hi");
        assert_eq!(engine.render_body(&site, &doc).unwrap(), Content::Html("<h1>Hi</h1>\n".into()));

        let (site, doc) = site_with("b.html", "<p>{{ Page.title }} of {{ Site.name }}</p>\n");
        assert_eq!(doc.kind, ContentKind::Html);
        assert_eq!(engine.render_body(&site, &doc).unwrap(), Content::Html("<p>B of S</p>\n".into()));

        let (site, doc) = site_with("c.htm", "<style>p { margin: 0 }</style>");
        let body = engine.render_body(&site, &doc).unwrap();
        assert_eq!(body.as_str(), "<style>p { margin: 0 }</style>");

        let (site, doc) = site_with("d.html", "{{ dateFormat('%Y', Page.date) }}");
        let error = engine.render_body(&site, &doc).unwrap_err();
        assert_eq!(error.message(), "failed to render document body");
        assert_eq!(error.context_value("source").as_deref(), Some("/site/content/d.html"));
    }

    #[test]
    fn page_phase_writes_output() {
        let out = tempfile::tempdir().unwrap();
        let engine = engine(&[("default.html", "<h1>{{ Page.title }}</h1>{{ Page.content }}")]);
        let (site, doc) = site_with("posts/hello.md", "+++\ntitle = \"Hello\"\n+++\n*hi*");
        doc.set_content(engine.render_body(&site, &doc).unwrap());

        let path = engine.render_page(&site, &doc, out.path()).unwrap();
        assert_eq!(path, out.path().join("posts/hello.html"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "<h1>Hello</h1><p><em>hi</em></p>\n");
    }

    #[test]
    fn missing_template_writes_nothing() {
        let out = tempfile::tempdir().unwrap();
        let engine = engine(&[("default.html", "")]);
        let (site, doc) = site_with("a.md", "+++\ntemplate = \"post\"\n+++\n");

        let error = engine.render_page(&site, &doc, out.path()).unwrap_err();
        assert_eq!(error.message(), "missing template");
        assert_eq!(error.context_value("template").as_deref(), Some("post"));
        assert!(!out.path().join("a.html").exists());
    }
}
