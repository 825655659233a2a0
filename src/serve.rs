// ABOUTME: Deck serving and watching for the slidewise application
// ABOUTME: Serves the deck directory over HTTP with per-request language resolution

use log::{debug, error, info};
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use notify::{RecursiveMode, Watcher};
use notify_debouncer_full::new_debouncer;
use tiny_http::{Header, Response, Server, StatusCode};
use url::Url;

use crate::config::DeckConfig;
use crate::errors::{Result, SlideError};
use crate::html;
use crate::lang;
use crate::utils;

/// Configuration for serving a deck directory
pub struct ServeConfig {
    /// Directory holding the deck's content sources (src/<lang>/<chapter>.md)
    pub deck_dir: PathBuf,

    /// Port for the local web server; 0 picks a free one
    pub port: u16,

    /// Debounce time in milliseconds for the change watcher
    pub debounce_ms: u64,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            deck_dir: PathBuf::new(),
            port: 8080,
            debounce_ms: 500,
        }
    }
}

fn content_type_for(path: &Path) -> &'static str {
    match path.extension() {
        Some(ext) if ext.to_string_lossy() == "html" => "text/html; charset=utf-8",
        Some(ext) if ext.to_string_lossy() == "md" => "text/markdown; charset=utf-8",
        Some(ext) if ext.to_string_lossy() == "css" => "text/css",
        Some(ext) if ext.to_string_lossy() == "js" => "application/javascript",
        Some(ext) if ext.to_string_lossy() == "json" => "application/json",
        Some(ext) if ext.to_string_lossy() == "png" => "image/png",
        Some(ext) if ext.to_string_lossy() == "svg" => "image/svg+xml",
        Some(ext) if ext.to_string_lossy() == "gif" => "image/gif",
        Some(ext) if ext.to_string_lossy() == "jpg" || ext.to_string_lossy() == "jpeg" => {
            "image/jpeg"
        }
        _ => "application/octet-stream",
    }
}

/// Map a request path onto the deck directory, refusing anything that would
/// escape it.
fn resolve_request_path(deck_dir: &Path, url_path: &str) -> Option<PathBuf> {
    let clean = url_path.trim_start_matches('/');
    let relative = Path::new(clean);
    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return None;
    }
    Some(deck_dir.join(relative))
}

/// Render the deck page for one request URL: resolve the language from the
/// query, build the toggle for it, generate the skeleton.
fn render_index(deck: &DeckConfig, request_url: &Url) -> Result<String> {
    let active = lang::resolve_language(deck, request_url);
    let toggle = lang::build_toggle(deck, &active, request_url);
    html::generate_deck_html(deck, &active, toggle.as_ref())
}

/// Start the deck HTTP server on a background thread. Returns the bound port
/// (useful when asked for port 0).
pub fn start_server(deck: DeckConfig, config: &ServeConfig) -> Result<u16> {
    deck.validate()?;
    utils::validate_directory_exists(&config.deck_dir)?;

    let server = Server::http(format!("0.0.0.0:{}", config.port))
        .map_err(|e| SlideError::ServeError(format!("Failed to start HTTP server: {}", e)))?;
    let port = server
        .server_addr()
        .to_ip()
        .map(|a| a.port())
        .unwrap_or(config.port);

    let deck_dir = config.deck_dir.clone();
    let server = Arc::new(server);

    thread::spawn(move || {
        info!("HTTP server listening on http://localhost:{}", port);
        println!("Serving deck on http://localhost:{}", port);

        let base = Url::parse(&format!("http://localhost:{}/", port)).expect("server base url");

        for request in server.incoming_requests() {
            let request_url = match base.join(request.url()) {
                Ok(u) => u,
                Err(e) => {
                    error!("Unparseable request URL {:?}: {}", request.url(), e);
                    let _ = request.respond(
                        Response::from_string("400 Bad Request").with_status_code(StatusCode(400)),
                    );
                    continue;
                }
            };

            debug!("Request for {}", request_url.path());

            if request_url.path() == "/" || request_url.path() == "/index.html" {
                match render_index(&deck, &request_url) {
                    Ok(page) => {
                        let header = Header::from_bytes("Content-Type", "text/html; charset=utf-8")
                            .expect("Failed to create content-type header");
                        let response = Response::from_string(page).with_header(header);
                        if let Err(e) = request.respond(response) {
                            error!("Failed to send response: {}", e);
                        }
                    }
                    Err(e) => {
                        error!("Failed to render deck page: {}", e);
                        let response = Response::from_string(format!("500: {}", e))
                            .with_status_code(StatusCode(500));
                        let _ = request.respond(response);
                    }
                }
                continue;
            }

            let file_path = match resolve_request_path(&deck_dir, request_url.path()) {
                Some(p) => p,
                None => {
                    let response =
                        Response::from_string("403 Forbidden").with_status_code(StatusCode(403));
                    let _ = request.respond(response);
                    continue;
                }
            };

            if file_path.exists() && file_path.is_file() {
                match fs::read(&file_path) {
                    Ok(content) => {
                        let header =
                            Header::from_bytes("Content-Type", content_type_for(&file_path))
                                .expect("Failed to create content-type header");
                        let response = Response::from_data(content).with_header(header);
                        if let Err(e) = request.respond(response) {
                            error!("Failed to send response: {}", e);
                        }
                    }
                    Err(e) => {
                        error!("Failed to read file {:?}: {}", file_path, e);
                        let response = Response::from_string(format!("Failed to read file: {}", e))
                            .with_status_code(StatusCode(500));
                        let _ = request.respond(response);
                    }
                }
            } else {
                let response =
                    Response::from_string("404 Not Found").with_status_code(StatusCode(404));
                let _ = request.respond(response);
            }
        }
    });

    Ok(port)
}

/// Watch the deck directory for content changes and report them. The page
/// fetches markdown at navigation time, so a browser refresh picks changes
/// up; there is nothing to regenerate server-side.
pub fn watch_deck(config: &ServeConfig) -> Result<()> {
    utils::validate_directory_exists(&config.deck_dir)?;

    let (tx, rx) = mpsc::channel();

    let mut debouncer = new_debouncer(Duration::from_millis(config.debounce_ms), None, tx)
        .map_err(|e| SlideError::WatchError(format!("Failed to create file watcher: {}", e)))?;

    let watch_path = utils::get_absolute_path(&config.deck_dir)?;
    debouncer
        .watcher()
        .watch(&watch_path, RecursiveMode::Recursive)
        .map_err(|e| {
            SlideError::WatchError(format!(
                "Failed to start watching {:?}: {}",
                watch_path, e
            ))
        })?;

    info!("Watching for changes in {:?}", watch_path);
    println!(
        "Watching for changes in {:?} (Press Ctrl+C to stop)",
        watch_path
    );

    for result in rx {
        match result {
            Ok(events) => {
                let changed: Vec<&PathBuf> = events
                    .iter()
                    .flat_map(|event| event.paths.iter())
                    .filter(|path| is_content_path(path))
                    .collect();
                for path in changed {
                    info!("Content changed: {:?} (refresh the browser)", path);
                    println!("Changed: {:?}, refresh the browser to pick it up", path);
                }
            }
            Err(e) => error!("Watch error: {:?}", e),
        }
    }

    Ok(())
}

/// Chapter sources and local styling are worth reporting; editor droppings
/// and the like are not.
fn is_content_path(path: &Path) -> bool {
    match path.extension() {
        Some(ext) => {
            let ext_str = ext.to_string_lossy().to_lowercase();
            ext_str == "md" || ext_str == "css" || ext_str == "js"
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_request_path_rejects_traversal() {
        let base = Path::new("/deck");
        assert!(resolve_request_path(base, "/../etc/passwd").is_none());
        assert!(resolve_request_path(base, "/src/../../etc/passwd").is_none());
        assert_eq!(
            resolve_request_path(base, "/src/en/intro.md"),
            Some(PathBuf::from("/deck/src/en/intro.md"))
        );
    }

    #[test]
    fn test_content_types() {
        assert_eq!(
            content_type_for(Path::new("src/en/intro.md")),
            "text/markdown; charset=utf-8"
        );
        assert_eq!(content_type_for(Path::new("custom.css")), "text/css");
        assert_eq!(
            content_type_for(Path::new("unknown.bin")),
            "application/octet-stream"
        );
    }

    #[test]
    fn test_content_path_filter() {
        assert!(is_content_path(Path::new("src/en/intro.md")));
        assert!(is_content_path(Path::new("theme.css")));
        assert!(!is_content_path(Path::new("notes.txt~swp")));
        assert!(!is_content_path(Path::new("Makefile")));
    }
}
