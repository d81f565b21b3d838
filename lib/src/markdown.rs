//! Markdown to HTML conversion.

use pulldown_cmark::{html, Options, Parser};

/// A markdown document awaiting conversion.
#[derive(Debug, Clone)]
pub struct Markdown<'a> {
    input: &'a str,
    options: Options,
}

impl<'a> Markdown<'a> {
    /// Tables, footnotes, strikethrough, task lists, and heading attributes
    /// are enabled. Punctuation is left alone.
    pub fn from(input: &'a str) -> Self {
        let options = Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_HEADING_ATTRIBUTES;

        Markdown { input, options }
    }

    /// Converts to HTML. Raw HTML in the input passes through untouched.
    pub fn to_html(&self) -> String {
        let parser = Parser::new_ext(self.input, self.options);
        let mut output = String::with_capacity(self.input.len() * 3 / 2);
        html::push_html(&mut output, parser);
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_markup() {
        let html = Markdown::from("# Hi\n\nSome *text*.").to_html();
        assert_eq!(html, "<h1>Hi</h1>\n<p>Some <em>text</em>.</p>\n");
    }

    #[test]
    fn extensions() {
        let html = Markdown::from("| a |\n|---|\n| b |\n").to_html();
        assert!(html.contains("<table>"));

        let html = Markdown::from("~~gone~~").to_html();
        assert!(html.contains("<del>gone</del>"));

        let html = Markdown::from("- [x] done\n").to_html();
        assert!(html.contains("checkbox"));

        let html = Markdown::from("# Title {#custom}\n").to_html();
        assert!(html.contains(r#"<h1 id="custom">Title</h1>"#));
    }

    #[test]
    fn punctuation_untouched() {
        let html = Markdown::from("\"quoted\" -- dash").to_html();
        assert_eq!(html, "<p>\"quoted\" -- dash</p>\n");
    }
}
