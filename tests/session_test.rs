use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

use slidewise::config::{AppConfig, DeckConfig, Language, RevealOverrides};
use slidewise::dom::{BlockTag, ContentBlock, DomEdit, SlideNode};
use slidewise::errors::{Result, SlideError};
use slidewise::layout::{AUTO_COLUMNS_CLASS, CENTER_CLASS, SPACED_BLOCK_CLASS};
use slidewise::overflow::Bounds;
use slidewise::resources::ScriptHost;
use slidewise::session::{PresentationSession, Renderer, SessionEvent, SlideMeasurements};

const INITIALIZE_MARKER: &str = "<initialize>";

/// Renderer double: records everything the session does, replays a scripted
/// event sequence, and hands out a preset slide snapshot.
struct FakeRenderer {
    executed: Vec<String>,
    styles: Vec<String>,
    initialized_with: Option<String>,
    events: VecDeque<SessionEvent>,
    snapshot: Vec<SlideNode>,
    edits: Vec<(usize, DomEdit)>,
    titles: Vec<String>,
    measurements: SlideMeasurements,
    allow_measure: bool,
    current: usize,
}

impl FakeRenderer {
    fn new(snapshot: Vec<SlideNode>, events: Vec<SessionEvent>) -> Self {
        Self {
            executed: Vec::new(),
            styles: Vec::new(),
            initialized_with: None,
            events: events.into(),
            snapshot,
            edits: Vec::new(),
            titles: Vec::new(),
            measurements: SlideMeasurements::default(),
            allow_measure: true,
            current: 0,
        }
    }

    fn overflowing(mut self) -> Self {
        self.measurements = SlideMeasurements {
            slide: Some(Bounds {
                top: 0.0,
                bottom: 1080.0,
            }),
            last_block: Some(Bounds {
                top: 900.0,
                bottom: 1100.0,
            }),
        };
        self
    }

    fn forbid_measurement(mut self) -> Self {
        self.allow_measure = false;
        self
    }

    fn position_of(&self, url_fragment: &str) -> usize {
        self.executed
            .iter()
            .position(|u| u.contains(url_fragment))
            .unwrap_or_else(|| panic!("{} was never executed", url_fragment))
    }
}

impl ScriptHost for FakeRenderer {
    fn execute_script(&mut self, url: &str, _source: &str) -> Result<()> {
        self.executed.push(url.to_string());
        Ok(())
    }

    fn insert_stylesheet(&mut self, url: &str) -> Result<()> {
        self.styles.push(url.to_string());
        Ok(())
    }
}

impl Renderer for FakeRenderer {
    fn initialize(&mut self, init_object: &str) -> Result<()> {
        self.executed.push(INITIALIZE_MARKER.to_string());
        self.initialized_with = Some(init_object.to_string());
        Ok(())
    }

    fn poll_event(&mut self) -> Result<SessionEvent> {
        Ok(self.events.pop_front().unwrap_or(SessionEvent::Closed))
    }

    fn snapshot_slides(&mut self) -> Result<Vec<SlideNode>> {
        Ok(self.snapshot.clone())
    }

    fn apply_edits(&mut self, slide: usize, edits: &[DomEdit]) -> Result<()> {
        for edit in edits {
            self.edits.push((slide, edit.clone()));
        }
        Ok(())
    }

    fn current_slide(&mut self) -> Result<usize> {
        Ok(self.current)
    }

    fn measure_active_slide(&mut self) -> Result<SlideMeasurements> {
        if !self.allow_measure {
            panic!("measured a slide that has no spacing to revert");
        }
        Ok(self.measurements)
    }

    fn set_title(&mut self, title: &str) -> Result<()> {
        self.titles.push(title.to_string());
        Ok(())
    }
}

/// Lay out a fake CDN tree on disk so every resource resolves locally.
fn fake_cdn(complete: bool) -> (TempDir, AppConfig) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let base = dir.path();

    write_script(base, "dist/reveal.js", "var Reveal = {};");
    write_script(base, "plugin/markdown/markdown.js", "var RevealMarkdown = {};");
    if complete {
        write_script(base, "plugin/highlight/highlight.js", "var RevealHighlight = {};");
    }
    write_script(base, "plugin/notes/notes.js", "var RevealNotes = {};");
    write_script(base, "plugin/search/search.js", "var RevealSearch = {};");
    write_script(base, "line-numbers.js", "/* line numbers */");
    write_script(base, "mathjax.js", "var MathJax = {};");

    let app = AppConfig {
        browser_path: None,
        cdn_base: base.to_string_lossy().to_string(),
        line_numbers_js: base.join("line-numbers.js").to_string_lossy().to_string(),
        mathjax_js: base.join("mathjax.js").to_string_lossy().to_string(),
        default_timeout_ms: 1000,
    };
    (dir, app)
}

fn write_script(base: &Path, relative: &str, content: &str) {
    let path = base.join(relative);
    fs::create_dir_all(path.parent().unwrap()).expect("Failed to create script dir");
    fs::write(path, content).expect("Failed to write script");
}

fn talk_deck() -> DeckConfig {
    DeckConfig {
        title: Some("Talk".to_string()),
        langs: vec![
            Language::new("en", "English"),
            Language::new("fr", "Français"),
        ],
        chapters: vec!["intro".to_string()],
        reveal: RevealOverrides::default(),
    }
}

fn demo_slides() -> Vec<SlideNode> {
    vec![
        // Short textual slide -> centered
        SlideNode::new(vec![
            ContentBlock::heading(2, "Intro"),
            ContentBlock::new(BlockTag::Paragraph),
        ]),
        // Long list -> auto-columns
        SlideNode::new(vec![
            ContentBlock::heading(2, "Lists"),
            ContentBlock::new(BlockTag::List {
                ordered: false,
                items: 17,
            }),
        ]),
        // Stacked blocks -> spacing
        SlideNode::new(vec![
            ContentBlock::heading(2, "Stack"),
            ContentBlock::new(BlockTag::Paragraph),
            ContentBlock::new(BlockTag::Paragraph),
            ContentBlock::new(BlockTag::Image),
        ]),
    ]
}

#[test]
fn test_bootstrap_orders_core_before_plugins_before_initialize() {
    let (_cdn, app) = fake_cdn(true);
    let renderer = FakeRenderer::new(demo_slides(), vec![SessionEvent::Closed]);
    let mut session = PresentationSession::new(renderer, talk_deck(), app);
    session.run().unwrap();

    let r = session.renderer();
    let core = r.position_of("dist/reveal.js");
    let init = r.position_of(INITIALIZE_MARKER);
    for plugin in [
        "plugin/markdown/markdown.js",
        "plugin/highlight/highlight.js",
        "plugin/notes/notes.js",
        "plugin/search/search.js",
        "line-numbers.js",
    ] {
        let p = r.position_of(plugin);
        assert!(core < p, "plugin {} executed before the core", plugin);
        assert!(p < init, "initialize ran before plugin {}", plugin);
    }

    // All four stylesheets were scheduled, fire-and-forget.
    assert_eq!(r.styles.len(), 4);
    assert!(r.initialized_with.as_ref().unwrap().contains("RevealMarkdown"));
}

#[test]
fn test_plugin_failure_aborts_before_initialize() {
    let (_cdn, app) = fake_cdn(false); // highlight.js missing
    let renderer = FakeRenderer::new(demo_slides(), vec![SessionEvent::Ready]);
    let mut session = PresentationSession::new(renderer, talk_deck(), app);

    let result = session.run();
    assert!(matches!(
        result,
        Err(SlideError::ResourceLoadError { .. })
    ));
    assert!(session.renderer().initialized_with.is_none());
    // The joint failure means no plugin executed in the document either.
    assert!(!session
        .renderer()
        .executed
        .iter()
        .any(|u| u.contains("plugin/")));
}

#[test]
fn test_ready_classifies_all_slides() {
    let (_cdn, app) = fake_cdn(true);
    let renderer = FakeRenderer::new(
        demo_slides(),
        vec![SessionEvent::Ready, SessionEvent::Closed],
    );
    let mut session = PresentationSession::new(renderer, talk_deck(), app);
    session.run().unwrap();

    let slides = session.slides();
    assert!(slides[0].has_class(CENTER_CLASS));
    assert!(slides[1].block_has_class(1, AUTO_COLUMNS_CLASS));
    assert_eq!(
        slides[1].block_style_vars[1],
        vec![("--auto-columns".to_string(), "3".to_string())]
    );
    assert!(slides[2].block_has_class(2, SPACED_BLOCK_CLASS));
    assert!(slides[2].block_has_class(3, SPACED_BLOCK_CLASS));
    assert!(!slides[2].block_has_class(1, SPACED_BLOCK_CLASS));

    // Edits were replayed onto the real DOM for every decided slide.
    let r = session.renderer();
    assert!(r.edits.iter().any(|(i, _)| *i == 0));
    assert!(r.edits.iter().any(|(i, _)| *i == 1));
    assert!(r.edits.iter().any(|(i, _)| *i == 2));
}

#[test]
fn test_transition_corrects_overflow_and_syncs_title() {
    let (_cdn, app) = fake_cdn(true);
    let renderer = FakeRenderer::new(
        demo_slides(),
        vec![
            SessionEvent::Ready,
            SessionEvent::SlideChanged(2),
            SessionEvent::SlideChanged(0),
            SessionEvent::Closed,
        ],
    )
    .overflowing();
    let mut session = PresentationSession::new(renderer, talk_deck(), app);
    session.run().unwrap();

    // The overflowing slide lost all spacing, one-way.
    let slides = session.slides();
    assert!(!slides[2].block_has_class(2, SPACED_BLOCK_CLASS));
    assert!(!slides[2].block_has_class(3, SPACED_BLOCK_CLASS));

    let r = session.renderer();
    let removals: Vec<_> = r
        .edits
        .iter()
        .filter(|(i, e)| {
            *i == 2 && matches!(e, DomEdit::RemoveBlockClass { class, .. } if class == SPACED_BLOCK_CLASS)
        })
        .collect();
    assert_eq!(removals.len(), 2);

    assert_eq!(r.titles, vec!["Stack - Talk", "Intro - Talk"]);
}

#[test]
fn test_unspaced_slide_transition_never_measures() {
    let (_cdn, app) = fake_cdn(true);
    let renderer = FakeRenderer::new(
        demo_slides(),
        vec![
            SessionEvent::Ready,
            SessionEvent::SlideChanged(0),
            SessionEvent::Closed,
        ],
    )
    .forbid_measurement();
    let mut session = PresentationSession::new(renderer, talk_deck(), app);
    session.run().unwrap();

    assert_eq!(session.renderer().titles, vec!["Intro - Talk"]);
}

#[test]
fn test_slide_without_heading_reverts_to_deck_title() {
    let (_cdn, app) = fake_cdn(true);
    let slides = vec![SlideNode::new(vec![ContentBlock::new(BlockTag::Paragraph)])];
    let renderer = FakeRenderer::new(
        slides,
        vec![
            SessionEvent::Ready,
            SessionEvent::SlideChanged(0),
            SessionEvent::Closed,
        ],
    );
    let mut session = PresentationSession::new(renderer, talk_deck(), app);
    session.run().unwrap();

    assert_eq!(session.renderer().titles, vec!["Talk"]);
}
