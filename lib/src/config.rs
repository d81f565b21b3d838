use std::sync::Arc;
use std::path::{Path, PathBuf};

use crate::error::{Result, Chainable};
use crate::value::{Dict, Format, Json, Toml};

pub const CONFIG_FILE: &str = "config.toml";
pub const CONFIG_FILE_JSON: &str = "config.json";
pub const OUTPUT_DIR: &str = "www";
pub const CONTENT_DIR: &str = "content";
pub const SKELETON_DIR: &str = "skel";
pub const TEMPLATE_DIR: &str = "templates";

/// Where a site lives on disk and the free-form settings it was configured
/// with. Built once per build; nothing here is global.
#[derive(Debug, Clone)]
pub struct Config {
    pub root: PathBuf,
    /// The file `settings` were read from, if any.
    pub file: Option<PathBuf>,
    pub output: PathBuf,
    pub content: PathBuf,
    pub skeleton: PathBuf,
    pub templates: PathBuf,
    /// Arbitrary keys, exposed to templates through `Site`.
    pub settings: Arc<Dict>,
}

impl Config {
    /// Reads `config.toml` (or, failing that, `config.json`) from `root`.
    pub fn load<P: AsRef<Path>>(root: P) -> Result<Config> {
        let root = std::path::absolute(root.as_ref()).chain_with(|| error! {
            "invalid site root",
            "path" => root.as_ref().display(),
        })?;

        let root = root.as_path();
        let toml = root.join(CONFIG_FILE);
        let json = root.join(CONFIG_FILE_JSON);
        let (file, settings) = if toml.is_file() {
            let settings = Toml::read::<Dict>(&toml)?;
            (toml, settings)
        } else if json.is_file() {
            let settings = Json::read::<Dict>(&json)?;
            (json, settings)
        } else {
            return err! {
                "missing site configuration file",
                "expected file" => toml.display(),
                "site root" => root.display(),
            };
        };

        tracing::debug!(file = %file.display(), keys = settings.len(), "loaded configuration");
        let mut config = Config::with_settings(root, settings);
        config.file = Some(file);
        Ok(config)
    }

    /// A configuration for the site at `root` with the default layout.
    pub fn with_settings<P: AsRef<Path>>(root: P, settings: Dict) -> Config {
        let root = root.as_ref().to_path_buf();
        Config {
            file: None,
            output: root.join(OUTPUT_DIR),
            content: root.join(CONTENT_DIR),
            skeleton: root.join(SKELETON_DIR),
            templates: root.join(TEMPLATE_DIR),
            settings: Arc::new(settings),
            root,
        }
    }

    /// Ensures every input directory exists before anything is written.
    pub fn check(&self) -> Result<()> {
        dircheck(&self.content, "content")?;
        dircheck(&self.skeleton, "skeleton")?;
        match dircheck(&self.templates, "templates") {
            Ok(()) => Ok(()),
            Err(e) if !self.templates.exists() => Err(e.chain(error! {
                "no templates - dir doesn't exist",
                "templates directory" => self.templates.display(),
            })),
            Err(e) => Err(e),
        }
    }

    /// The paths whose modification triggers a rebuild.
    pub fn watch_targets(&self) -> Vec<&Path> {
        let mut targets = vec![];
        targets.extend(self.file.as_deref());
        targets.push(self.templates.as_path());
        targets.push(self.skeleton.as_path());
        targets.push(self.content.as_path());
        targets
    }
}

#[track_caller]
fn dircheck(path: &Path, what: &str) -> Result<()> {
    match path.metadata() {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => err! {
            format!("{what} path must point to a directory"),
            "path is not a directory" => path.display(),
        },
        Err(_) => err! {
            format!("{what} must point to an existing directory"),
            "path does not exist" => path.display(),
        },
    }
}
