//! A small static site generator.
//!
//! # Overview
//!
//! A site is a directory laid out as follows:
//!
//! ```text
//! site/
//! ├── config.toml      settings, exposed to templates as `Site`
//! ├── content/         markdown, html, and text documents
//! ├── skel/            copied verbatim into the output
//! ├── templates/       page templates
//! └── www/             the output
//! ```
//!
//! A [build](build::build) reads every content file into a [`Document`]:
//! optional TOML front matter between `+++` lines becomes its metadata, the
//! rest its raw body. Each document gets a `path`, `slug`, `url`, and `title`
//! derived from where it lives. Once every document is known, each body is
//! rendered (markdown to HTML, HTML bodies as templates) and then each
//! document is rendered into its page template, `default.html` unless its
//! metadata says otherwise, and written to `www/<path>/<slug>.html`.
//!
//! Templates see two values: `Page`, the document being rendered, and
//! `Site`, the configuration settings plus `pages`, every document by its
//! `path/slug` key.
//!
//! [`watch`] and [`serve`] support a rebuild loop: wait for a change to any
//! input, rebuild, and serve whatever the last good build produced.

#[macro_use]
pub mod error;
pub mod util;
pub mod fstree;
pub mod value;
pub mod frontmatter;
pub mod taxonomy;
pub mod sort;
pub mod markdown;
pub mod templating;
pub mod config;
pub mod copy;
pub mod build;
pub mod watch;
pub mod serve;

pub use taxonomy::*;
pub use config::Config;
pub use build::build;
pub use error::{Error, Result};
