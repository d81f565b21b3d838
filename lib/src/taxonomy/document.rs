use std::fs;
use std::sync::{Arc, OnceLock};
use std::path::{Component, Path};

use derive_more::Debug;

use crate::error::{Result, Chainable};
use crate::frontmatter;
use crate::taxonomy::{Metadata, MetaKey};
use crate::value::Value;

crate::define_meta_key! {
    /// Title of the page; derived from the slug when missing or empty.
    pub Title : "title" => Arc<str>,
    /// Untyped date string, parsed on demand. Always present, maybe empty.
    pub Date : "date" => Arc<str>,
    /// Name of the template used to render the full page.
    pub TemplateName : "template" => Arc<str>,
    /// Directory relative to the content root, `/`-separated.
    pub DirPath : "path" => Arc<str>,
    pub Slug : "slug" => Arc<str>,
    pub Url : "url" => Arc<str>,
}

/// Template name used when a document doesn't name one.
pub const DEFAULT_TEMPLATE: &str = "default";

/// Keys owned by [`Document`] itself. Front matter can't set them.
pub const RESERVED_KEYS: &[&str] = &["content", "_rawcontent", "_srcfile"];

/// How a document's body is turned into its rendered content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// Converted to HTML.
    Markdown,
    /// Executed as a template.
    Html,
    /// Passed through untouched.
    Text,
}

impl ContentKind {
    pub fn from_path(path: &Path) -> ContentKind {
        let ext = path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("md" | "markdown" | "mdown") => ContentKind::Markdown,
            Some("html" | "htm") => ContentKind::Html,
            _ => ContentKind::Text,
        }
    }

    /// Whether files of this kind are picked up from the content directory.
    pub fn is_ingested(self) -> bool {
        !matches!(self, ContentKind::Text)
    }
}

/// A document's rendered body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    /// Markup that must not be escaped again.
    Html(Arc<str>),
    /// Plain text, escaped wherever it's inserted into markup.
    Text(Arc<str>),
}

impl Content {
    pub fn as_str(&self) -> &str {
        match self {
            Content::Html(s) | Content::Text(s) => s,
        }
    }
}

/// One content item.
#[derive(Debug, Clone)]
pub struct Document {
    /// Absolute path of the source file.
    pub source: Arc<Path>,
    pub kind: ContentKind,
    pub metadata: Metadata,
    #[debug(ignore)]
    raw: Arc<str>,
    content: OnceLock<Content>,
}

impl Document {
    /// Reads the file at `source`, which must be inside `content_root`.
    pub fn read(content_root: &Path, source: &Path) -> Result<Document> {
        let relative = source.strip_prefix(content_root).chain_with(|| error! {
            "content file is outside of the content directory",
            "source" => source.display(),
            "content directory" => content_root.display(),
        })?;

        let bytes = fs::read(source).chain_with(|| error! {
            "failed to read content file",
            "source" => source.display(),
        })?;

        let input = String::from_utf8(bytes).chain_with(|| error! {
            "content file is not valid UTF-8",
            "source" => source.display(),
        })?;

        Document::parse(relative, source, &input)
    }

    /// Parses `input`, the contents of `source`, found at `relative` inside
    /// the content directory.
    pub fn parse(relative: &Path, source: &Path, input: &str) -> Result<Document> {
        let (front_matter, body) = frontmatter::parse(source, input)?;
        let mut metadata = Metadata::from(front_matter);
        for key in RESERVED_KEYS {
            if metadata.remove_raw(*key).is_some() {
                tracing::debug!(key = *key, source = %source.display(), "ignoring reserved front matter key");
            }
        }

        let (dir, slug) = identity(relative);
        let url = url_for(&dir, &slug);
        metadata.insert(DirPath, dir);
        metadata.insert(Url, url);

        match metadata.get(Date) {
            None => { metadata.insert(Date, ""); }
            Some(Ok(_)) => {}
            Some(Err(value @ (Value::Num(_) | Value::Bool(_)))) => {
                metadata.insert(Date, value.to_string());
            }
            Some(Err(value)) => return err! {
                "date must be a string",
                "found" => value.kind(),
                "source" => source.display(),
            },
        }

        let has_title = matches!(metadata.get(Title), Some(Ok(title)) if !title.is_empty());
        if !has_title {
            metadata.insert(Title, title_from_slug(&slug));
        }

        metadata.insert(Slug, slug);
        Ok(Document {
            source: source.into(),
            kind: ContentKind::from_path(relative),
            metadata,
            raw: body.into(),
            content: OnceLock::new(),
        })
    }

    fn attr<K: MetaKey<Value = Arc<str>>>(&self, _: K) -> &str {
        self.metadata.get_raw(K::KEY)
            .and_then(Value::as_str)
            .unwrap_or("")
    }

    pub fn path(&self) -> &str {
        self.attr(DirPath)
    }

    pub fn slug(&self) -> &str {
        self.attr(Slug)
    }

    pub fn url(&self) -> &str {
        self.attr(Url)
    }

    pub fn title(&self) -> &str {
        self.attr(Title)
    }

    pub fn date(&self) -> &str {
        self.attr(Date)
    }

    /// The template to render the full page with.
    pub fn template(&self) -> &str {
        match self.attr(TemplateName) {
            "" => DEFAULT_TEMPLATE,
            name => name,
        }
    }

    /// The collection key: `path/slug`, or just `slug` at the content root.
    pub fn key(&self) -> String {
        match self.path() {
            "" => self.slug().to_string(),
            path => format!("{path}/{}", self.slug()),
        }
    }

    /// The unparsed body: everything after the front matter.
    pub fn raw(&self) -> &Arc<str> {
        &self.raw
    }

    /// The rendered body, once the body phase has run.
    pub fn content(&self) -> Option<&Content> {
        self.content.get()
    }

    /// Stores the rendered body. Returns `false` if it was already set.
    pub fn set_content(&self, content: Content) -> bool {
        self.content.set(content).is_ok()
    }
}

/// `posts/2024/hello.md` => (`posts/2024`, `hello`).
fn identity(relative: &Path) -> (String, String) {
    let dir = relative.parent()
        .map(|parent| parent.components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s.to_string_lossy()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/"))
        .unwrap_or_default();

    let slug = relative.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    (dir, slug)
}

fn url_for(dir: &str, slug: &str) -> String {
    match (dir, slug) {
        ("", "index") => "/".into(),
        (dir, "index") => format!("/{dir}/"),
        ("", slug) => format!("/{slug}"),
        (dir, slug) => format!("/{dir}/{slug}"),
    }
}

/// `getting-started` => `Getting Started`.
pub fn title_from_slug(slug: &str) -> String {
    let mut title = String::with_capacity(slug.len());
    let mut word_start = true;
    for ch in slug.replace('-', " ").chars() {
        if word_start {
            title.extend(ch.to_uppercase());
        } else {
            title.push(ch);
        }

        word_start = !(ch.is_alphanumeric() || ch == '_' || ch == '\'');
    }

    title
}
