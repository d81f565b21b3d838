//! A static file server for the output root.

use std::fs;
use std::io::Cursor;
use std::path::{Component, Path, PathBuf};

use tiny_http::{Header, Request, Response, StatusCode};

use crate::error::{Result, Chainable};

pub const DEFAULT_ADDR: &str = "127.0.0.1:8080";

/// Serves files from `root`. Requests are handled one at a time on the thread
/// calling [`Server::run()`].
pub struct Server {
    root: PathBuf,
    http: tiny_http::Server,
}

impl Server {
    pub fn bind<P: AsRef<Path>>(root: P, addr: &str) -> Result<Server> {
        let http = tiny_http::Server::http(addr).chain_with(|| error! {
            "failed to bind server",
            "address" => addr,
        })?;

        Ok(Server { root: root.as_ref().to_path_buf(), http })
    }

    /// The address actually bound, which differs from the requested one
    /// when port `0` was asked for.
    pub fn addr(&self) -> String {
        self.http.server_addr()
            .to_ip()
            .map(|addr| addr.to_string())
            .unwrap_or_default()
    }

    /// Serves requests until the listener is closed.
    pub fn run(&self) -> Result<()> {
        tracing::info!(address = %self.addr(), root = %self.root.display(), "serving site");
        for request in self.http.incoming_requests() {
            if let Err(e) = self.respond(request) {
                tracing::warn!("request failed: {e}");
            }
        }

        Ok(())
    }

    fn respond(&self, request: Request) -> Result<()> {
        let Some(path) = resolve(&self.root, request.url()) else {
            tracing::debug!(url = request.url(), "not found");
            let response = Response::new(
                StatusCode(404),
                vec![header("text/plain; charset=utf-8")?],
                Cursor::new("404 Not Found"),
                Some(13),
                None,
            );

            return request.respond(response).chain(error!("failed to send response"));
        };

        let data = fs::read(&path).chain_with(|| error! {
            "failed to read file",
            "path" => path.display(),
        })?;

        tracing::trace!(url = request.url(), path = %path.display(), "serving file");
        let response = Response::from_data(data).with_header(header(content_type(&path))?);
        request.respond(response).chain(error!("failed to send response"))
    }
}

fn header(content_type: &str) -> Result<Header> {
    Header::from_bytes("Content-Type", content_type).map_err(|_| error! {
        "invalid response header",
        "content type" => content_type,
    })
}

/// The file under `root` that `url` refers to, if any: the exact path, then
/// the path with `.html` appended, then `index.html` inside a directory. The
/// URL is percent-decoded and its query dropped; `..` is never followed.
pub fn resolve(root: &Path, url: &str) -> Option<PathBuf> {
    let url = url.split(['?', '#']).next().unwrap_or(url);
    let url = urlencoding::decode(url).ok()?;
    if url.contains('\0') || url.contains('\\') {
        return None;
    }

    let relative = Path::new(url.trim_start_matches('/'));
    if relative.components().any(|c| !matches!(c, Component::Normal(_) | Component::CurDir)) {
        return None;
    }

    let path = root.join(relative);
    if path.is_file() {
        return Some(path);
    }

    if let Some(name) = path.file_name().filter(|_| !url.ends_with('/')) {
        let mut name = name.to_os_string();
        name.push(".html");
        let html = path.with_file_name(name);
        if html.is_file() {
            return Some(html);
        }
    }

    let index = path.join("index.html");
    index.is_file().then_some(index)
}

/// The MIME type for `path`, from its extension.
pub fn content_type(path: &Path) -> &'static str {
    let ext = path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js" | "mjs") => "application/javascript; charset=utf-8",
        Some("json") => "application/json; charset=utf-8",
        Some("xml") => "application/xml; charset=utf-8",
        Some("txt") => "text/plain; charset=utf-8",
        Some("md") => "text/markdown; charset=utf-8",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}
