use std::sync::Arc;

use derive_more::Debug;
use rustc_hash::FxHashMap;

use crate::config::Config;
use crate::error::Result;
use crate::taxonomy::Document;
use crate::value::Dict;

/// Everything one build knows: its configuration and every document, in
/// ingestion order, indexed by key.
#[derive(Debug, Clone)]
pub struct Site {
    pub config: Arc<Config>,
    documents: Vec<Arc<Document>>,
    #[debug(ignore)]
    index: FxHashMap<Arc<str>, usize>,
}

impl Site {
    pub fn new(config: Arc<Config>) -> Site {
        Site { config, documents: vec![], index: FxHashMap::default() }
    }

    /// Adds `document` under its key. A key that's already taken is an error
    /// naming both source files; the existing document is kept.
    pub fn insert(&mut self, document: Document) -> Result<Arc<Document>> {
        let key: Arc<str> = document.key().into();
        if let Some(&i) = self.index.get(&key) {
            return err! {
                "duplicate document key",
                "key" => key,
                "first source" => self.documents[i].source.display(),
                "second source" => document.source.display(),
            };
        }

        let document = Arc::new(document);
        self.index.insert(key, self.documents.len());
        self.documents.push(document.clone());
        Ok(document)
    }

    pub fn get(&self, key: &str) -> Option<&Arc<Document>> {
        self.index.get(key).map(|&i| &self.documents[i])
    }

    /// Every document in ingestion order.
    pub fn documents(&self) -> &[Arc<Document>] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// The site's free-form configuration.
    pub fn settings(&self) -> &Dict {
        &self.config.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    static_assertions::assert_impl_all!(Site: Send, Sync);
    static_assertions::assert_impl_all!(Document: Send, Sync);

    fn doc(relative: &str) -> Document {
        let source = Path::new("/site/content").join(relative);
        Document::parse(Path::new(relative), &source, "").unwrap()
    }

    #[test]
    fn keeps_ingestion_order() {
        let mut site = Site::new(Arc::new(Config::with_settings("/site", Dict::new())));
        site.insert(doc("b.md")).unwrap();
        site.insert(doc("a/z.md")).unwrap();
        site.insert(doc("a.md")).unwrap();

        let keys: Vec<_> = site.documents().iter().map(|d| d.key()).collect();
        assert_eq!(keys, ["b", "a/z", "a"]);
        assert_eq!(site.get("a/z").map(|d| d.slug()), Some("z"));
        assert!(site.get("z").is_none());
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let mut site = Site::new(Arc::new(Config::with_settings("/site", Dict::new())));
        site.insert(doc("posts/hello.md")).unwrap();
        let error = site.insert(doc("posts/hello.html")).unwrap_err();

        assert_eq!(error.message(), "duplicate document key");
        assert_eq!(error.context_value("key").as_deref(), Some("posts/hello"));
        assert_eq!(error.context_value("first source").as_deref(), Some("/site/content/posts/hello.md"));
        assert_eq!(error.context_value("second source").as_deref(), Some("/site/content/posts/hello.html"));
        assert_eq!(site.len(), 1);
    }
}
