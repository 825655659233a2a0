// ABOUTME: Resource loading for the slidewise application
// ABOUTME: Fetches scripts and stylesheets with explicit ordering guarantees

use crate::errors::{Result, SlideError};
use log::{info, warn};
use reqwest::blocking::Client;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Represents a resource file that can be either local or remote.
#[derive(Debug, Clone)]
pub struct ResourceFile {
    pub path: String,
    pub is_remote: bool,
}

impl ResourceFile {
    /// Create a new ResourceFile from a path string.
    /// The path can be either a local file path or a URL.
    pub fn new(path: &str) -> Self {
        let is_remote = path.starts_with("http://") || path.starts_with("https://");
        Self {
            path: path.to_string(),
            is_remote,
        }
    }

    /// Get the content of the resource file.
    /// Remote resources are fetched over HTTP, local ones read from disk.
    pub fn content(&self) -> Result<String> {
        if self.is_remote {
            self.fetch_remote_content()
        } else {
            self.read_local_content()
        }
    }

    /// Fetch content from a remote URL with retry capability
    fn fetch_remote_content(&self) -> Result<String> {
        info!("Fetching remote resource: {}", self.path);

        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(SlideError::FetchError)?;

        // Try up to 3 times with increasing backoff
        let mut retry_delay = 1000; // Start with 1 second
        let mut last_error = None;

        for attempt in 1..=3 {
            match client.get(&self.path).send() {
                Ok(response) => {
                    if response.status().is_success() {
                        return response.text().map_err(SlideError::FetchError);
                    } else {
                        let status = response.status();
                        last_error =
                            Some(SlideError::ValidationError(format!("HTTP error: {}", status)));
                    }
                }
                Err(e) => {
                    last_error = Some(SlideError::FetchError(e));
                }
            }

            info!(
                "Fetch attempt {} failed, retrying in {} ms",
                attempt, retry_delay
            );
            std::thread::sleep(Duration::from_millis(retry_delay));
            retry_delay *= 2;
        }

        Err(last_error.unwrap_or_else(|| {
            SlideError::ValidationError("Unknown error fetching resource".to_string())
        }))
    }

    /// Read content from a local file
    fn read_local_content(&self) -> Result<String> {
        info!("Reading local resource: {}", self.path);
        if !Path::new(&self.path).exists() {
            return Err(SlideError::PathNotFoundError(
                Path::new(&self.path).to_path_buf(),
            ));
        }

        fs::read_to_string(&self.path).map_err(SlideError::FileReadError)
    }
}

/// Where fetched resources land. The browser renderer implements this by
/// evaluating in the page; tests implement it with a recorder.
pub trait ScriptHost {
    /// Execute an already-fetched script in the document. Returning Ok means
    /// the script has run; plugins registered against globals are usable.
    fn execute_script(&mut self, url: &str, source: &str) -> Result<()>;

    /// Attach a stylesheet link to the document head.
    fn insert_stylesheet(&mut self, url: &str) -> Result<()>;
}

/// Loads scripts and stylesheets into a ScriptHost with the ordering
/// guarantees the renderer bootstrap depends on.
pub struct ResourceLoader;

impl ResourceLoader {
    pub fn new() -> Self {
        Self
    }

    /// Schedule a stylesheet. Fire-and-forget: a missing stylesheet degrades
    /// visuals, not functionality, so failures are logged and swallowed.
    pub fn load_style(&self, host: &mut dyn ScriptHost, url: &str) {
        if let Err(e) = host.insert_stylesheet(url) {
            warn!("Failed to attach stylesheet {}: {}", url, e);
        }
    }

    /// Fetch one script and execute it in the host. Any failure is reported
    /// as a ResourceLoadError carrying the offending URL.
    pub fn load_script(&self, host: &mut dyn ScriptHost, url: &str) -> Result<()> {
        let source = ResourceFile::new(url)
            .content()
            .map_err(|e| SlideError::ResourceLoadError {
                url: url.to_string(),
                source: Some(Box::new(e)),
            })?;
        host.execute_script(url, &source)
            .map_err(|e| SlideError::ResourceLoadError {
                url: url.to_string(),
                source: Some(Box::new(e)),
            })?;
        info!("Loaded script: {}", url);
        Ok(())
    }

    /// Load scripts strictly one after another; each begins only after its
    /// predecessor has executed. Aborts on the first failure.
    pub fn load_sequence(&self, host: &mut dyn ScriptHost, urls: &[String]) -> Result<()> {
        for url in urls {
            self.load_script(host, url)?;
        }
        Ok(())
    }

    /// Start all fetches concurrently, then execute the scripts in listed
    /// order once every fetch has landed. Fails with the first error in
    /// listed order; in-flight fetches are joined, never cancelled.
    pub fn load_parallel(&self, host: &mut dyn ScriptHost, urls: &[String]) -> Result<()> {
        let fetched: Vec<Result<String>> = std::thread::scope(|scope| {
            let handles: Vec<_> = urls
                .iter()
                .map(|url| {
                    scope.spawn(move || {
                        ResourceFile::new(url)
                            .content()
                            .map_err(|e| SlideError::ResourceLoadError {
                                url: url.clone(),
                                source: Some(Box::new(e)),
                            })
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| {
                    h.join().unwrap_or_else(|_| {
                        Err(SlideError::UnknownError(
                            "Resource fetch thread panicked".to_string(),
                        ))
                    })
                })
                .collect()
        });

        let mut sources = Vec::with_capacity(urls.len());
        for result in fetched {
            sources.push(result?);
        }

        // Execution stays on the driving thread so document mutation is
        // single-threaded regardless of fetch interleaving.
        for (url, source) in urls.iter().zip(sources.iter()) {
            host.execute_script(url, source)
                .map_err(|e| SlideError::ResourceLoadError {
                    url: url.clone(),
                    source: Some(Box::new(e)),
                })?;
            info!("Loaded script: {}", url);
        }
        Ok(())
    }
}

impl Default for ResourceLoader {
    fn default() -> Self {
        Self::new()
    }
}
