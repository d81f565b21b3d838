use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use glod::{Config, Site};
use glod::serve::{self, Server};
use glod::watch::wait_for_changes;

mod flags {
    use std::path::PathBuf;

    xflags::xflags! {
        /// Generate a static website from templates.
        cmd glod {
            /// The site directory. Defaults to the current directory.
            optional site_dir: PathBuf
            /// Serve the output and rebuild whenever an input changes.
            optional -s, --server
            /// The port to serve on. Defaults to 8080.
            optional -p, --port port: u16
            /// Log more. May be repeated.
            repeated -v, --verbose
        }
    }
}

fn init_logging(verbosity: u32) {
    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn fail(error: glod::Error) -> ! {
    eprintln!("error: {error}");
    process::exit(1);
}

fn generate(root: &Path) -> glod::Result<Arc<Site>> {
    glod::build(&Config::load(root)?)
}

/// Rebuilds the site at `root`. On failure, `last` is kept.
fn rebuild(root: &Path, last: Arc<Site>) -> Arc<Site> {
    match generate(root) {
        Ok(site) => site,
        Err(e) => {
            tracing::warn!("rebuild failed; serving previous output\n{e}");
            last
        }
    }
}

/// Waits for a change to the inputs of the last good build, then rebuilds.
fn rebuild_forever(root: &Path, mut site: Arc<Site>) -> ! {
    loop {
        match wait_for_changes(&site.config.watch_targets()) {
            Ok(event) => tracing::debug!(paths = ?event.paths, "change detected"),
            Err(e) => fail(e),
        }

        site = rebuild(root, site);
    }
}

fn run(flags: flags::Glod) -> glod::Result<()> {
    let root = flags.site_dir.unwrap_or_else(|| PathBuf::from("."));
    let site = generate(&root)?;
    if !flags.server {
        return Ok(());
    }

    let addr = match flags.port {
        Some(port) => format!("127.0.0.1:{port}"),
        None => serve::DEFAULT_ADDR.to_string(),
    };

    let server = Server::bind(&site.config.output, &addr)?;
    std::thread::spawn(move || {
        rebuild_forever(&root, site);
    });
    server.run()
}

pub fn main() {
    let flags = flags::Glod::from_env_or_exit();
    init_logging(flags.verbose);
    if let Err(e) = run(flags) {
        fail(e);
    }
}
