use std::fmt;
use std::sync::Arc;
use std::borrow::Borrow;

use crate::value::{Dict, Value};

/// A typed name for a metadata entry.
pub trait MetaKey: 'static {
    const KEY: &'static str;

    type Value: TryFrom<Value> + Into<Value> + fmt::Debug;
}

#[macro_export]
macro_rules! define_meta_key {
    ($($(#[$attr:meta])* $v:vis $T:ident : $key:literal => $V:ty),+ $(,)?) => {
        $(
            $(#[$attr])*
            #[derive(Debug, Clone, Copy)]
            $v struct $T;

            impl $crate::taxonomy::MetaKey for $T {
                const KEY: &'static str = $key;
                type Value = $V;
            }
        )+
    }
}

/// A document's key/value metadata: its front matter plus derived attributes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    map: Dict,
}

impl Metadata {
    #[inline(always)]
    pub fn new() -> Self {
        Metadata::default()
    }

    #[inline(always)]
    pub fn get_raw(&self, key: &str) -> Option<&Value> {
        self.map.get(key)
    }

    #[inline(always)]
    pub fn contains_key(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    #[inline(always)]
    pub fn keys(&self) -> impl Iterator<Item = &Arc<str>> + '_ {
        self.map.keys()
    }

    pub fn as_dict(&self) -> &Dict {
        &self.map
    }

    pub fn insert_raw<K, V>(&mut self, key: K, value: V) -> Option<Value>
        where K: Into<Arc<str>>, V: Into<Value>
    {
        self.map.insert(key.into(), value.into())
    }

    pub fn remove_raw<K: Borrow<str>>(&mut self, key: K) -> Option<Value> {
        self.map.remove(key.borrow())
    }
}

impl Metadata {
    /// Reads `K`. `Some(Err(v))` means the entry exists but holds the wrong
    /// kind of value `v`.
    #[inline]
    pub fn get<K: MetaKey>(&self, _: K) -> Option<Result<K::Value, Value>> {
        let value = self.get_raw(K::KEY)?;
        Some(value.clone().try_into().map_err(|_| value.clone()))
    }

    #[inline(always)]
    pub fn contains<K: MetaKey>(&self, _: K) -> bool {
        self.contains_key(K::KEY)
    }

    pub fn insert<K, V>(&mut self, _: K, value: V) -> Option<Value>
        where K: MetaKey, V: Into<K::Value>
    {
        self.insert_raw(K::KEY, value.into().into())
    }
}

impl From<Dict> for Metadata {
    fn from(map: Dict) -> Self {
        Metadata { map }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    define_meta_key! {
        Weight : "weight" => i64,
        Name : "name" => Arc<str>,
    }

    #[test]
    fn typed_access() {
        let mut meta = Metadata::new();
        assert!(meta.get(Weight).is_none());

        meta.insert(Weight, 3);
        assert_eq!(meta.get(Weight), Some(Ok(3)));

        meta.insert_raw("weight", "heavy");
        assert_eq!(meta.get(Weight), Some(Err(Value::from("heavy"))));
    }

    #[test]
    fn raw_and_typed_share_entries() {
        let mut meta = Metadata::new();
        meta.insert(Name, "first");
        assert_eq!(meta.get_raw("name"), Some(&Value::from("first")));
        assert!(meta.contains(Name));

        assert_eq!(meta.remove_raw("name"), Some(Value::from("first")));
        assert!(meta.get(Name).is_none());
        assert!(meta.is_empty());
    }
}
