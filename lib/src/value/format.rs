use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::error::{ErrorDetail, Result, Chainable};

/// A structured text format that can be decoded into any deserializable type,
/// typically a [`Dict`](crate::value::Dict).
pub trait Format: Sized {
    /// The data format's error type.
    type Error: serde::de::Error + ErrorDetail + 'static;

    /// Human-readable name, used in error messages.
    const NAME: &'static str;

    /// Parses `string` as the data format `Self` as a `T`.
    fn from_str<T: DeserializeOwned>(string: &str) -> Result<T, Self::Error>;

    /// Reads and parses the file at `path`, naming the file on failure.
    fn read<T: DeserializeOwned>(path: &Path) -> Result<T> {
        let string = fs::read_to_string(path).chain_with(|| error! {
            "failed to read file",
            "file path" => path.display(),
        })?;

        Self::from_str(&string).chain_with(|| error! {
            format!("invalid {} document", Self::NAME),
            "file path" => path.display(),
        })
    }
}

macro_rules! impl_format {
    ($name:ident : $func:expr, $E:ty, $display:literal) => (
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $name;

        impl Format for $name {
            type Error = $E;

            const NAME: &'static str = $display;

            fn from_str<T: DeserializeOwned>(s: &str) -> Result<T, $E> {
                $func(s)
            }
        }
    );
}

impl_format!(Toml: toml::from_str, toml::de::Error, "TOML");
impl_format!(Json: serde_json::from_str, serde_json::error::Error, "JSON");

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Dict;

    #[test]
    fn read_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "title = ").unwrap();

        let error = Toml::read::<Dict>(&path).unwrap_err();
        assert_eq!(error.message(), "invalid TOML document");
        assert_eq!(error.context_value("file path"), Some(path.display().to_string()));
    }

    #[test]
    fn json_and_toml_agree() {
        let a: Dict = Toml::from_str("title = \"x\"\ncount = 3").unwrap();
        let b: Dict = Json::from_str(r#"{"title": "x", "count": 3}"#).unwrap();
        assert_eq!(a, b);
    }
}
