// ABOUTME: Configuration module for the slidewise application
// ABOUTME: Deck configuration, typed Reveal options and environment variable handling

use crate::errors::{Result, SlideError};
use std::env;
use std::fmt::Write as _;

/// Default CDN base for the Reveal.js distribution.
pub const DEFAULT_CDN_BASE: &str = "https://cdn.jsdelivr.net/npm/reveal.js@5.1.0";

/// The line-numbers addon registers itself on window.hljs, outside the Reveal tree.
pub const HLJS_LINE_NUMBERS_URL: &str =
    "https://cdn.jsdelivr.net/npm/highlightjs-line-numbers.js@2.8.0/dist/highlightjs-line-numbers.min.js";

pub const MATHJAX_URL: &str = "https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-mml-chtml.js";

/// Plugins the renderer is always initialized with. User overrides never
/// remove these: the markdown plugin produces the slide structure the layout
/// classifier depends on, so disabling it would break rendering silently.
pub const REQUIRED_PLUGINS: &[&str] = &[
    "RevealMarkdown",
    "RevealHighlight",
    "RevealNotes",
    "RevealSearch",
];

/// CDN-relative script paths for the required plugins, loaded after the core.
pub const PLUGIN_SCRIPTS: &[&str] = &[
    "plugin/markdown/markdown.js",
    "plugin/highlight/highlight.js",
    "plugin/notes/notes.js",
    "plugin/search/search.js",
];

pub const CORE_SCRIPT: &str = "dist/reveal.js";

/// CDN-relative stylesheets, applied fire-and-forget.
pub const STYLESHEETS: &[&str] = &[
    "dist/reset.css",
    "dist/reveal.css",
    "dist/theme/night.css",
    "plugin/highlight/monokai.css",
];

/// One configured deck language: code ("en") and display label ("English").
/// Deck languages are kept as an ordered list because the toggle cycles
/// through them in configuration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Language {
    pub code: String,
    pub label: String,
}

impl Language {
    pub fn new(code: &str, label: &str) -> Self {
        Self {
            code: code.to_string(),
            label: label.to_string(),
        }
    }
}

/// Immutable deck configuration, supplied once at startup.
#[derive(Debug, Clone, Default)]
pub struct DeckConfig {
    /// Deck display title; also the fallback window title.
    pub title: Option<String>,
    /// Configured languages in cycle order. Empty means monolingual.
    pub langs: Vec<Language>,
    /// Ordered chapter identifiers; each maps to src/<lang>/<chapter>.md.
    pub chapters: Vec<String>,
    /// Caller overrides for the renderer options.
    pub reveal: RevealOverrides,
}

impl DeckConfig {
    pub fn validate(&self) -> Result<()> {
        if self.chapters.is_empty() {
            return Err(SlideError::ConfigError(
                "Deck has no chapters; at least one chapter is required".to_string(),
            ));
        }
        for chapter in &self.chapters {
            if chapter.is_empty() || chapter.contains('/') || chapter.contains("..") {
                return Err(SlideError::ConfigError(format!(
                    "Invalid chapter identifier: {:?}",
                    chapter
                )));
            }
        }
        Ok(())
    }

    /// Deck title with the renderer-facing fallback applied.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("Presentation")
    }
}

/// Renderer options actually passed to Reveal.initialize. Defaults are tuned
/// for a 16:9 large-viewport layout.
#[derive(Debug, Clone, PartialEq)]
pub struct RevealOptions {
    pub width: u32,
    pub height: u32,
    pub center: bool,
    pub margin: f64,
    pub hash: bool,
    pub slide_number: bool,
    pub scroll_activation_width: u32,
}

impl Default for RevealOptions {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            center: false,
            margin: 0.05,
            hash: true,
            slide_number: true,
            scroll_activation_width: 0,
        }
    }
}

impl RevealOptions {
    /// Render the options as the object literal for Reveal.initialize.
    /// The plugin list is appended here and is not representable in the
    /// struct at all, which is what makes it non-overridable.
    pub fn to_init_object(&self) -> String {
        let mut obj = String::from("{");
        let _ = write!(
            obj,
            " width: {}, height: {}, center: {}, margin: {}, hash: {}, slideNumber: {}, scrollActivationWidth: {},",
            self.width,
            self.height,
            self.center,
            self.margin,
            self.hash,
            self.slide_number,
            self.scroll_activation_width
        );
        let _ = write!(obj, " plugins: [{}] }}", REQUIRED_PLUGINS.join(", "));
        obj
    }
}

/// Caller-supplied overrides. Every field is optional; a set field replaces
/// the default, an unset field keeps it. There is deliberately no plugins
/// field (see RevealOptions::to_init_object).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RevealOverrides {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub center: Option<bool>,
    pub margin: Option<f64>,
    pub hash: Option<bool>,
    pub slide_number: Option<bool>,
    pub scroll_activation_width: Option<u32>,
}

impl RevealOverrides {
    /// Merge onto the defaults: override wins per field.
    pub fn merge(&self) -> RevealOptions {
        let d = RevealOptions::default();
        RevealOptions {
            width: self.width.unwrap_or(d.width),
            height: self.height.unwrap_or(d.height),
            center: self.center.unwrap_or(d.center),
            margin: self.margin.unwrap_or(d.margin),
            hash: self.hash.unwrap_or(d.hash),
            slide_number: self.slide_number.unwrap_or(d.slide_number),
            scroll_activation_width: self
                .scroll_activation_width
                .unwrap_or(d.scroll_activation_width),
        }
    }
}

/// Application-level settings, separate from per-deck configuration.
pub struct AppConfig {
    pub browser_path: Option<String>,
    pub cdn_base: String,
    /// Source for the line-numbers addon; lives outside the Reveal CDN tree.
    pub line_numbers_js: String,
    /// Source for the math typesetting engine.
    pub mathjax_js: String,
    pub default_timeout_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            browser_path: env::var("BROWSER_PATH").ok(),
            cdn_base: DEFAULT_CDN_BASE.to_string(),
            line_numbers_js: HLJS_LINE_NUMBERS_URL.to_string(),
            mathjax_js: MATHJAX_URL.to_string(),
            default_timeout_ms: 30000, // 30 seconds
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let browser_path = env::var("BROWSER_PATH").ok();
        let cdn_base = env::var("REVEAL_CDN_BASE")
            .unwrap_or_else(|_| DEFAULT_CDN_BASE.to_string())
            .trim_end_matches('/')
            .to_string();
        let line_numbers_js =
            env::var("LINE_NUMBERS_JS").unwrap_or_else(|_| HLJS_LINE_NUMBERS_URL.to_string());
        let mathjax_js = env::var("MATHJAX_JS").unwrap_or_else(|_| MATHJAX_URL.to_string());
        let default_timeout_ms = env::var("DEFAULT_TIMEOUT_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(30000);

        Self {
            browser_path,
            cdn_base,
            line_numbers_js,
            mathjax_js,
            default_timeout_ms,
        }
    }

    pub fn cdn_url(&self, relative: &str) -> String {
        format!("{}/{}", self.cdn_base.trim_end_matches('/'), relative)
    }
}
