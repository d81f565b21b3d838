//! The content model as seen from templates.

use std::sync::Arc;

use minijinja::value::{Enumerator, Object, ObjectRepr, Value};

use crate::taxonomy::{Content, Document, Site};
use crate::value::{self, Dict};

/// The root of every render: `Page` and `Site`.
#[derive(Debug)]
pub struct RenderContext {
    pub site: Arc<Site>,
    pub page: Arc<Document>,
}

impl RenderContext {
    pub fn value(site: &Arc<Site>, page: &Arc<Document>) -> Value {
        Value::from_object(RenderContext { site: site.clone(), page: page.clone() })
    }
}

impl Object for RenderContext {
    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        match key.as_str()? {
            "Page" => Some(Value::from_object(Page(self.page.clone()))),
            "Site" => Some(Value::from_object(SiteObject(self.site.clone()))),
            _ => None,
        }
    }

    fn enumerate(self: &Arc<Self>) -> Enumerator {
        Enumerator::Str(&["Page", "Site"])
    }
}

/// A document's metadata plus `content`, `_srcfile`, and `_rawcontent`.
#[derive(Debug)]
pub struct Page(pub Arc<Document>);

impl Object for Page {
    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        let doc = &self.0;
        match key.as_str()? {
            "content" => doc.content().map(|content| match content {
                Content::Html(html) => Value::from_safe_string(html.to_string()),
                Content::Text(text) => Value::from(text.clone()),
            }),
            "_srcfile" => Some(Value::from(doc.source.display().to_string())),
            "_rawcontent" => Some(Value::from(doc.raw().clone())),
            key => doc.metadata.get_raw(key).map(to_value),
        }
    }

    fn enumerate(self: &Arc<Self>) -> Enumerator {
        let doc = &self.0;
        let mut keys: Vec<Value> = doc.metadata.keys().cloned().map(Value::from).collect();
        keys.push(Value::from("_srcfile"));
        keys.push(Value::from("_rawcontent"));
        if doc.content().is_some() {
            keys.push(Value::from("content"));
        }

        Enumerator::Values(keys)
    }
}

/// The site settings plus `pages`.
#[derive(Debug)]
struct SiteObject(Arc<Site>);

impl Object for SiteObject {
    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        match key.as_str()? {
            "pages" => Some(Value::from_object(Pages(self.0.clone()))),
            key => self.0.settings().get(key).map(to_value),
        }
    }

    fn enumerate(self: &Arc<Self>) -> Enumerator {
        let mut keys: Vec<Value> = self.0.settings().keys().cloned().map(Value::from).collect();
        keys.push(Value::from("pages"));
        Enumerator::Values(keys)
    }
}

/// Every page by key, in ingestion order.
#[derive(Debug)]
struct Pages(Arc<Site>);

impl Object for Pages {
    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        let doc = self.0.get(key.as_str()?)?;
        Some(Value::from_object(Page(doc.clone())))
    }

    fn enumerate(self: &Arc<Self>) -> Enumerator {
        let keys = self.0.documents().iter()
            .map(|doc| Value::from(doc.key()))
            .collect();

        Enumerator::Values(keys)
    }

    fn enumerator_len(self: &Arc<Self>) -> Option<usize> {
        Some(self.0.len())
    }
}

#[derive(Debug)]
struct DictObject(Arc<Dict>);

impl Object for DictObject {
    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        self.0.get(key.as_str()?).map(to_value)
    }

    fn enumerate(self: &Arc<Self>) -> Enumerator {
        Enumerator::Values(self.0.keys().cloned().map(Value::from).collect())
    }

    fn enumerator_len(self: &Arc<Self>) -> Option<usize> {
        Some(self.0.len())
    }
}

#[derive(Debug)]
struct ArrayObject(Arc<Vec<value::Value>>);

impl Object for ArrayObject {
    fn repr(self: &Arc<Self>) -> ObjectRepr {
        ObjectRepr::Seq
    }

    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        self.0.get(key.as_usize()?).map(to_value)
    }

    fn enumerate(self: &Arc<Self>) -> Enumerator {
        Enumerator::Seq(self.0.len())
    }
}

/// Converts a metadata value into a template value without copying
/// containers.
pub fn to_value(value: &value::Value) -> Value {
    match value {
        value::Value::Null => Value::UNDEFINED,
        value::Value::Bool(b) => Value::from(*b),
        value::Value::Num(n) => {
            if let Some(f) = n.as_float() {
                Value::from(f)
            } else if let Some(i) = n.as_signed() {
                i64::try_from(i).map_or_else(|_| Value::from(i), Value::from)
            } else if let Some(u) = n.as_unsigned() {
                u64::try_from(u).map_or_else(|_| Value::from(u), Value::from)
            } else {
                Value::UNDEFINED
            }
        }
        value::Value::String(s) => Value::from(s.clone()),
        value::Value::Array(items) => Value::from_object(ArrayObject(items.clone())),
        value::Value::Dict(dict) => Value::from_object(DictObject(dict.clone())),
    }
}
