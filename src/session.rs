// ABOUTME: Presentation session orchestration for the slidewise application
// ABOUTME: Drives resource loading, renderer initialization and per-slide layout passes

use crate::config::{AppConfig, DeckConfig, CORE_SCRIPT, PLUGIN_SCRIPTS, STYLESHEETS};
use crate::dom::{DomEdit, SlideNode};
use crate::errors::Result;
use crate::layout;
use crate::overflow::{self, Bounds, SlideMetrics};
use crate::resources::{ResourceLoader, ScriptHost};
use crate::title;
use log::{info, warn};

/// A renderer-originated lifecycle event, polled by the session loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Nothing happened since the last poll.
    Idle,
    /// First full layout is done; slide composition is final.
    Ready,
    /// Navigation to a new active slide (flattened slide index).
    SlideChanged(usize),
    /// The browser/page is gone; the session ends.
    Closed,
}

/// Geometry of the active slide as reported by the renderer. Degenerate
/// geometry (inactive or unmeasurable slides) surfaces as None.
#[derive(Debug, Clone, Copy, Default)]
pub struct SlideMeasurements {
    pub slide: Option<Bounds>,
    pub last_block: Option<Bounds>,
}

impl SlideMetrics for SlideMeasurements {
    fn slide_bounds(&self) -> Option<Bounds> {
        self.slide
    }
    fn last_block_bounds(&self) -> Option<Bounds> {
        self.last_block
    }
}

/// The black-box presentation engine contract. The real implementation drives
/// Reveal.js in a browser; tests drive a fake.
pub trait Renderer: ScriptHost {
    /// Initialize the engine with merged options. Must only be called after
    /// the core and all plugins have executed.
    fn initialize(&mut self, init_object: &str) -> Result<()>;

    /// Poll for the next lifecycle event.
    fn poll_event(&mut self) -> Result<SessionEvent>;

    /// Read the shape of every slide. Valid once Ready has fired.
    fn snapshot_slides(&mut self) -> Result<Vec<SlideNode>>;

    /// Replay mirror edits onto the real DOM node of one slide.
    fn apply_edits(&mut self, slide: usize, edits: &[DomEdit]) -> Result<()>;

    /// Flattened index of the currently active slide.
    fn current_slide(&mut self) -> Result<usize>;

    /// Measure the active slide. Only ever called for the active slide.
    fn measure_active_slide(&mut self) -> Result<SlideMeasurements>;

    /// Set the browser tab title.
    fn set_title(&mut self, title: &str) -> Result<()>;
}

// The line-numbers addon expects a pre-existing hljs global to hang itself on.
const HLJS_SHIM: &str = "window.hljs = window.hljs || {};";

const LINE_NUMBERS_SNIPPET: &str = r#"
if (window.hljs && window.hljs.lineNumbersBlock) {
  document.querySelectorAll('.reveal pre code.hljs:not(.text)').forEach(function(block) {
    window.hljs.lineNumbersBlock(block, { singleLine: true });
  });
}
"#;

// MathJax reads its configuration global before its script executes, and is
// told not to typeset on startup so one explicit pass covers all slides.
const MATHJAX_CONFIG_SNIPPET: &str = r#"
window.MathJax = {
  tex: { inlineMath: [['$', '$'], ['\\(', '\\)']] },
  options: { skipHtmlTags: ['script', 'noscript', 'style', 'textarea', 'pre', 'code'] },
  startup: { typeset: false }
};
"#;

const MATHJAX_TYPESET_SNIPPET: &str =
    "MathJax.startup.promise.then(function() { MathJax.typeset(); });";

/// Owns one browsing session: the renderer, the deck configuration and the
/// local mirror of every slide's layout state.
pub struct PresentationSession<R: Renderer> {
    renderer: R,
    deck: DeckConfig,
    app: AppConfig,
    loader: ResourceLoader,
    slides: Vec<SlideNode>,
}

impl<R: Renderer> PresentationSession<R> {
    pub fn new(renderer: R, deck: DeckConfig, app: AppConfig) -> Self {
        Self {
            renderer,
            deck,
            app,
            loader: ResourceLoader::new(),
            slides: Vec::new(),
        }
    }

    /// Load all resources and initialize the renderer. Ordering is a hard
    /// invariant: core strictly before plugins (they register against the
    /// core's global), all plugins before initialize. Any script failure
    /// aborts the whole chain; stylesheet failures only degrade visuals.
    pub fn bootstrap(&mut self) -> Result<()> {
        for css in STYLESHEETS {
            let url = self.app.cdn_url(css);
            self.loader.load_style(&mut self.renderer, &url);
        }

        self.renderer.execute_script("inline:hljs-shim", HLJS_SHIM)?;

        let core = vec![self.app.cdn_url(CORE_SCRIPT)];
        self.loader.load_sequence(&mut self.renderer, &core)?;

        let mut plugins: Vec<String> =
            PLUGIN_SCRIPTS.iter().map(|p| self.app.cdn_url(p)).collect();
        plugins.push(self.app.line_numbers_js.clone());
        self.loader.load_parallel(&mut self.renderer, &plugins)?;

        let options = self.deck.reveal.merge();
        self.renderer.initialize(&options.to_init_object())?;
        info!("Renderer initialized");
        Ok(())
    }

    /// Run the event loop until the renderer closes. Handlers are matched
    /// here, once; there is no per-transition re-registration to duplicate.
    pub fn run(&mut self) -> Result<()> {
        self.bootstrap()?;
        loop {
            match self.renderer.poll_event()? {
                SessionEvent::Idle => continue,
                SessionEvent::Ready => self.on_ready()?,
                SessionEvent::SlideChanged(index) => self.on_slide_changed(index)?,
                SessionEvent::Closed => {
                    info!("Renderer closed, ending session");
                    return Ok(());
                }
            }
        }
    }

    /// One-time pass after first layout: line numbers, math typesetting
    /// kickoff, global slide classification, initial overflow check.
    fn on_ready(&mut self) -> Result<()> {
        if let Err(e) = self
            .renderer
            .execute_script("inline:line-numbers", LINE_NUMBERS_SNIPPET)
        {
            warn!("Failed to apply code line numbers: {}", e);
        }

        self.start_typesetting();

        self.slides = self.renderer.snapshot_slides()?;
        info!("Classifying {} slides", self.slides.len());
        for index in 0..self.slides.len() {
            let edits = layout::apply_layout(&mut self.slides[index]);
            if !edits.is_empty() {
                self.renderer.apply_edits(index, &edits)?;
            }
        }

        let current = self.renderer.current_slide()?;
        self.correct_overflow(current)?;
        Ok(())
    }

    /// Per-transition pass: overflow check, then title sync.
    fn on_slide_changed(&mut self, index: usize) -> Result<()> {
        self.correct_overflow(index)?;

        let heading = self
            .slides
            .get(index)
            .and_then(|s| s.first_heading())
            .map(|h| h.to_string());
        let new_title = title::window_title(heading.as_deref(), self.deck.display_title());
        self.renderer.set_title(&new_title)?;
        Ok(())
    }

    fn correct_overflow(&mut self, index: usize) -> Result<()> {
        let Some(slide) = self.slides.get(index) else {
            return Ok(());
        };
        // Skip measurement entirely when nothing is spaced; inactive-slide
        // geometry rules also make measuring pointless here.
        let has_spacing = (0..slide.blocks.len())
            .any(|i| slide.block_has_class(i, layout::SPACED_BLOCK_CLASS));
        if !has_spacing {
            return Ok(());
        }

        let measurements = self.renderer.measure_active_slide()?;
        let edits = overflow::correct(&mut self.slides[index], &measurements);
        if !edits.is_empty() {
            self.renderer.apply_edits(index, &edits)?;
        }
        Ok(())
    }

    /// Math typesetting is a fire-and-forget collaborator: configure, load,
    /// typeset once. Failures never abort the session.
    fn start_typesetting(&mut self) {
        if let Err(e) = self
            .renderer
            .execute_script("inline:mathjax-config", MATHJAX_CONFIG_SNIPPET)
        {
            warn!("Failed to configure math typesetting: {}", e);
            return;
        }
        let mathjax = self.app.mathjax_js.clone();
        if let Err(e) = self.loader.load_script(&mut self.renderer, &mathjax) {
            warn!("Failed to load math typesetting engine: {}", e);
            return;
        }
        if let Err(e) = self
            .renderer
            .execute_script("inline:mathjax-typeset", MATHJAX_TYPESET_SNIPPET)
        {
            warn!("Failed to start math typesetting: {}", e);
        }
    }

    /// Mirror of the slide layout state, as last synchronized.
    pub fn slides(&self) -> &[SlideNode] {
        &self.slides
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }
}
