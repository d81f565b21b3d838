//! Splitting a content file into its `+++`-delimited TOML front matter and body.
//!
//! ```text
//! +++
//! title = "Hello"
//! tags = ["intro"]
//! +++
//! The body starts here.
//! ```

use std::path::Path;

use crate::error::{Result, Chainable};
use crate::value::{Dict, Format, Toml};

/// The marker line that opens and closes a front matter block.
pub const MARKER: &str = "+++";

/// A content file split at its front matter markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrontMatter<'a> {
    /// The text between the markers, if there was a block.
    pub meta: Option<&'a str>,
    /// Everything after the closing marker, or the whole input.
    pub body: &'a str,
}

/// Returns the line starting at `input[start..]` without its terminator and
/// the offset just past the terminator.
fn line_at(input: &str, start: usize) -> Option<(&str, usize)> {
    if start >= input.len() {
        return None;
    }

    let rest = &input[start..];
    match memchr::memchr(b'\n', rest.as_bytes()) {
        Some(i) => Some((&rest[..i], start + i + 1)),
        None => Some((rest, input.len())),
    }
}

fn is_marker(line: &str) -> bool {
    line.trim_end() == MARKER
}

/// Splits `input` into front matter and body without decoding anything.
///
/// A block exists only when the very first line is a marker and a later line
/// closes it; otherwise the whole input is body. Blank lines between the
/// closing marker and the body are dropped.
pub fn split(input: &str) -> FrontMatter<'_> {
    let no_block = FrontMatter { meta: None, body: input };
    let Some((first, meta_start)) = line_at(input, 0) else {
        return no_block;
    };

    if !is_marker(first) {
        return no_block;
    }

    let mut cursor = meta_start;
    while let Some((line, next)) = line_at(input, cursor) {
        if is_marker(line) {
            let meta = &input[meta_start..cursor];
            let mut body_start = next;
            while let Some((line, next)) = line_at(input, body_start) {
                if !line.trim().is_empty() {
                    break;
                }

                body_start = next;
            }

            return FrontMatter { meta: Some(meta), body: &input[body_start..] };
        }

        cursor = next;
    }

    no_block
}

/// Splits `input` and decodes its front matter, if any, as TOML.
///
/// `source` is only used to name the file when decoding fails.
pub fn parse<'a>(source: &Path, input: &'a str) -> Result<(Dict, &'a str)> {
    let FrontMatter { meta, body } = split(input);
    let dict = match meta {
        Some(meta) => Toml::from_str::<Dict>(meta).chain_with(|| error! {
            "failed to parse front matter",
            "source" => source.display(),
        })?,
        None => Dict::new(),
    };

    Ok((dict, body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn parse(input: &str) -> (Dict, &str) {
        super::parse(Path::new("content/test.md"), input).unwrap()
    }

    #[test]
    fn no_block_keeps_whole_input() {
        for input in ["", "just text", "++\nnot a marker\n++\n", "text\n+++\nx = 1\n+++\n"] {
            let (meta, body) = parse(input);
            assert!(meta.is_empty());
            assert_eq!(body, input);
        }
    }

    #[test]
    fn unterminated_block_is_body() {
        let input = "+++\ntitle = \"x\"\nno closing marker\n";
        let (meta, body) = parse(input);
        assert!(meta.is_empty());
        assert_eq!(body, input);
    }

    #[test]
    fn block_is_decoded() {
        let input = "+++\ntitle = \"Hello\"\ncount = 3\ndraft = true\ntags = [\"a\", \"b\"]\n[extra]\nkey = \"v\"\n+++\n\nBody **here**.\n";
        let (meta, body) = parse(input);
        assert_eq!(meta["title"].as_str(), Some("Hello"));
        assert_eq!(meta["count"], Value::from(3i64));
        assert_eq!(meta["draft"], Value::from(true));
        assert_eq!(meta["tags"], Value::from(vec!["a", "b"]));
        assert_eq!(meta["extra"].get("key").and_then(Value::as_str), Some("v"));
        assert_eq!(body, "Body **here**.\n");
    }

    #[test]
    fn markers_tolerate_trailing_whitespace_and_crlf() {
        let input = "+++  \r\ntitle = \"Hi\"\r\n+++\t\r\nbody\r\n";
        let (meta, body) = parse(input);
        assert_eq!(meta["title"].as_str(), Some("Hi"));
        assert_eq!(body, "body\r\n");
    }

    #[test]
    fn indented_body_is_preserved() {
        let (_, body) = parse("+++\n+++\n\n    code block\n");
        assert_eq!(body, "    code block\n");
    }

    #[test]
    fn metadata_round_trips() {
        let input = "+++\ntitle = \"Round\"\nweight = 10\nratio = 0.5\nlist = [1, 2]\n+++\nThe body.\n";
        let (meta, body) = parse(input);

        let reserialized = toml::to_string(&meta).unwrap();
        let again = format!("+++\n{reserialized}+++\n{body}");
        let (meta2, body2) = parse(&again);
        assert_eq!(meta, meta2);
        assert_eq!(body, body2);
    }

    #[test]
    fn bad_toml_names_the_file() {
        let error = super::parse(Path::new("content/bad.md"), "+++\ntitle = \n+++\nbody")
            .unwrap_err();

        assert_eq!(error.message(), "failed to parse front matter");
        assert_eq!(error.context_value("source").as_deref(), Some("content/bad.md"));
    }
}
