// ABOUTME: Browser-backed renderer for the slidewise application
// ABOUTME: Drives Reveal.js in Chrome over CDP: script injection, event polling, DOM edits

use crate::config::AppConfig;
use crate::dom::{BlockTag, ContentBlock, DomEdit, SlideNode};
use crate::errors::{Result, SlideError};
use crate::overflow::Bounds;
use crate::resources::ScriptHost;
use crate::session::{Renderer, SessionEvent, SlideMeasurements};
use headless_chrome::{Browser, LaunchOptionsBuilder, Tab};
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;

const POLL_INTERVAL_MS: u64 = 200;

// JSON keeps heading text intact; the tab title must carry it verbatim.
const SNAPSHOT_SCRIPT: &str = r#"
JSON.stringify(Reveal.getSlides().map(function(s) {
  return {
    center: s.classList.contains('center'),
    blocks: Array.prototype.map.call(s.children, function(c) {
      var t = c.tagName.toLowerCase();
      if (t === 'ul' || t === 'ol') return { tag: t, items: c.children.length };
      if (/^h[1-6]$/.test(t)) return { tag: t, text: c.textContent.trim() };
      return { tag: t };
    })
  };
}))
"#;

const CURRENT_SLIDE_SCRIPT: &str = "Reveal.getSlides().indexOf(Reveal.getCurrentSlide())";

const MEASURE_SCRIPT: &str = r#"
(function() {
  var s = Reveal.getCurrentSlide();
  if (!s) return '';
  var r = s.getBoundingClientRect();
  var c = s.children[s.children.length - 1];
  if (!c) return '';
  var b = c.getBoundingClientRect();
  return r.top + ' ' + r.bottom + ' ' + b.top + ' ' + b.bottom;
})()
"#;

fn js_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for ch in text.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Reveal.js driven through a real Chrome instance. Implements the renderer
/// contract the session orchestrates against.
pub struct BrowserRenderer {
    // Dropping the Browser kills Chrome, so it must live as long as the tab.
    _browser: Browser,
    tab: Arc<Tab>,
    ready_seen: bool,
    last_slide: Option<usize>,
}

impl BrowserRenderer {
    /// Launch a browser and open the deck page. The page URL should point at
    /// the serving endpoint, not a file:// path: the markdown plugin fetches
    /// chapter sources over HTTP and file:// is blocked by CORS.
    pub fn launch(
        app: &AppConfig,
        page_url: &str,
        width: u32,
        height: u32,
        headless: bool,
    ) -> Result<Self> {
        let mut builder = LaunchOptionsBuilder::default();
        builder.window_size(Some((width, height)));
        builder.headless(headless);

        if let Some(browser_path) = &app.browser_path {
            builder.path(Some(browser_path.into()));
        }

        let launch_options = builder.build().map_err(|e| SlideError::BrowserError {
            message: format!("Failed to build browser options: {:?}", e),
            source: None,
        })?;

        info!("Launching browser for {}", page_url);
        let browser = match Browser::new(launch_options) {
            Ok(browser) => browser,
            Err(e) => {
                let message = format!("Failed to launch browser: {}", e);
                warn!("{}", message);
                if message.contains("Could not auto detect") {
                    return Err(SlideError::BrowserNotFound);
                }
                return Err(SlideError::BrowserError {
                    message,
                    source: None,
                });
            }
        };

        let tab = browser.new_tab().map_err(|e| SlideError::BrowserError {
            message: format!("Failed to create new tab: {}", e),
            source: None,
        })?;

        tab.navigate_to(page_url)
            .map_err(|e| SlideError::BrowserError {
                message: format!("Failed to navigate to deck page: {}", e),
                source: None,
            })?;

        tab.wait_until_navigated()
            .map_err(|e| SlideError::BrowserError {
                message: format!("Navigation failed: {}", e),
                source: None,
            })?;

        tab.wait_for_element_with_custom_timeout(
            "body",
            Duration::from_millis(app.default_timeout_ms),
        )
        .map_err(|e| SlideError::BrowserError {
            message: format!("Failed to wait for body element: {}", e),
            source: None,
        })?;

        Ok(Self {
            _browser: browser,
            tab,
            ready_seen: false,
            last_slide: None,
        })
    }

    fn eval(&self, expression: &str) -> Result<serde_json::Value> {
        let result = self
            .tab
            .evaluate(expression, false)
            .map_err(|e| SlideError::BrowserError {
                message: format!("Script evaluation failed: {}", e),
                source: None,
            })?;
        Ok(result.value.unwrap_or(serde_json::Value::Null))
    }

    fn eval_string(&self, expression: &str) -> Result<String> {
        match self.eval(expression)? {
            serde_json::Value::String(s) => Ok(s),
            other => Err(SlideError::BrowserError {
                message: format!("Expected string result, got {}", other),
                source: None,
            }),
        }
    }

    fn eval_i64(&self, expression: &str) -> Result<i64> {
        match self.eval(expression)? {
            serde_json::Value::Number(n) => n.as_i64().ok_or_else(|| SlideError::BrowserError {
                message: format!("Expected integer result, got {}", n),
                source: None,
            }),
            other => Err(SlideError::BrowserError {
                message: format!("Expected number result, got {}", other),
                source: None,
            }),
        }
    }

    fn edit_statement(edit: &DomEdit) -> String {
        match edit {
            DomEdit::AddSlideClass(class) => {
                format!("s.classList.add({});", js_string(class))
            }
            DomEdit::AddBlockClass { block, class } => format!(
                "if (s.children[{}]) s.children[{}].classList.add({});",
                block,
                block,
                js_string(class)
            ),
            DomEdit::RemoveBlockClass { block, class } => format!(
                "if (s.children[{}]) s.children[{}].classList.remove({});",
                block,
                block,
                js_string(class)
            ),
            DomEdit::SetBlockStyleVar { block, name, value } => format!(
                "if (s.children[{}]) s.children[{}].style.setProperty({}, {});",
                block,
                block,
                js_string(name),
                js_string(value)
            ),
        }
    }

    fn parse_snapshot(encoded: &str) -> Result<Vec<SlideNode>> {
        let value: serde_json::Value =
            serde_json::from_str(encoded).map_err(|e| SlideError::BrowserError {
                message: format!("Malformed slide snapshot: {}", e),
                source: None,
            })?;
        let slides = value.as_array().ok_or_else(|| SlideError::BrowserError {
            message: format!("Expected snapshot array, got {}", value),
            source: None,
        })?;
        Ok(slides.iter().map(Self::parse_slide).collect())
    }

    fn parse_slide(value: &serde_json::Value) -> SlideNode {
        let blocks: Vec<ContentBlock> = value
            .get("blocks")
            .and_then(|b| b.as_array())
            .map(|blocks| blocks.iter().map(Self::parse_block).collect())
            .unwrap_or_default();
        let node = SlideNode::new(blocks);
        if value.get("center").and_then(|c| c.as_bool()) == Some(true) {
            node.with_explicit_center()
        } else {
            node
        }
    }

    fn parse_block(value: &serde_json::Value) -> ContentBlock {
        let tag = value.get("tag").and_then(|t| t.as_str()).unwrap_or("");
        let items = value.get("items").and_then(|i| i.as_u64()).unwrap_or(0) as usize;
        let block = ContentBlock::new(BlockTag::from_tag_name(tag, items));
        if block.tag.is_heading() {
            if let Some(text) = value.get("text").and_then(|t| t.as_str()) {
                return ContentBlock {
                    text: Some(text.to_string()),
                    ..block
                };
            }
        }
        block
    }

    fn parse_bounds(encoded: &str) -> SlideMeasurements {
        let values: Vec<f64> = encoded
            .split_whitespace()
            .filter_map(|v| v.parse::<f64>().ok())
            .collect();
        if values.len() != 4 {
            return SlideMeasurements::default();
        }
        SlideMeasurements {
            slide: Some(Bounds {
                top: values[0],
                bottom: values[1],
            }),
            last_block: Some(Bounds {
                top: values[2],
                bottom: values[3],
            }),
        }
    }
}

impl ScriptHost for BrowserRenderer {
    fn execute_script(&mut self, url: &str, source: &str) -> Result<()> {
        debug!("Executing script in page: {}", url);
        self.tab
            .evaluate(source, false)
            .map_err(|e| SlideError::BrowserError {
                message: format!("Script execution failed for {}: {}", url, e),
                source: None,
            })?;
        Ok(())
    }

    fn insert_stylesheet(&mut self, url: &str) -> Result<()> {
        debug!("Attaching stylesheet: {}", url);
        let snippet = format!(
            "var link = document.createElement('link'); link.rel = 'stylesheet'; link.href = {}; document.head.appendChild(link);",
            js_string(url)
        );
        self.tab
            .evaluate(&snippet, false)
            .map_err(|e| SlideError::BrowserError {
                message: format!("Stylesheet attachment failed for {}: {}", url, e),
                source: None,
            })?;
        Ok(())
    }
}

impl Renderer for BrowserRenderer {
    fn initialize(&mut self, init_object: &str) -> Result<()> {
        let script = format!("Reveal.initialize({});", init_object);
        self.execute_script("inline:reveal-initialize", &script)
    }

    fn poll_event(&mut self) -> Result<SessionEvent> {
        std::thread::sleep(Duration::from_millis(POLL_INTERVAL_MS));

        if !self.ready_seen {
            let ready = self.eval("typeof Reveal !== 'undefined' && Reveal.isReady() === true")?;
            if ready == serde_json::Value::Bool(true) {
                self.ready_seen = true;
                self.last_slide = Some(self.eval_i64(CURRENT_SLIDE_SCRIPT)?.max(0) as usize);
                return Ok(SessionEvent::Ready);
            }
            return Ok(SessionEvent::Idle);
        }

        // A failing evaluate after ready means the page or browser is gone.
        let current = match self.eval_i64(CURRENT_SLIDE_SCRIPT) {
            Ok(index) if index >= 0 => index as usize,
            Ok(_) => return Ok(SessionEvent::Idle),
            Err(e) => {
                debug!("Poll failed, treating renderer as closed: {}", e);
                return Ok(SessionEvent::Closed);
            }
        };

        if self.last_slide != Some(current) {
            self.last_slide = Some(current);
            return Ok(SessionEvent::SlideChanged(current));
        }
        Ok(SessionEvent::Idle)
    }

    fn snapshot_slides(&mut self) -> Result<Vec<SlideNode>> {
        let encoded = self.eval_string(SNAPSHOT_SCRIPT)?;
        let slides = Self::parse_snapshot(&encoded)?;
        debug!("Snapshot of {} slides", slides.len());
        Ok(slides)
    }

    fn apply_edits(&mut self, slide: usize, edits: &[DomEdit]) -> Result<()> {
        if edits.is_empty() {
            return Ok(());
        }
        let mut script = format!(
            "(function() {{ var s = Reveal.getSlides()[{}]; if (!s) return; ",
            slide
        );
        for edit in edits {
            script.push_str(&Self::edit_statement(edit));
            script.push(' ');
        }
        script.push_str("})();");
        self.execute_script("inline:layout-edits", &script)
    }

    fn current_slide(&mut self) -> Result<usize> {
        Ok(self.eval_i64(CURRENT_SLIDE_SCRIPT)?.max(0) as usize)
    }

    fn measure_active_slide(&mut self) -> Result<SlideMeasurements> {
        let encoded = self.eval_string(MEASURE_SCRIPT)?;
        Ok(Self::parse_bounds(&encoded))
    }

    fn set_title(&mut self, title: &str) -> Result<()> {
        let script = format!("document.title = {};", js_string(title));
        self.execute_script("inline:document-title", &script)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout;

    #[test]
    fn test_parse_snapshot_shapes() {
        let encoded = r#"[
            {"center": false, "blocks": [{"tag": "h2", "text": "Intro"}, {"tag": "ul", "items": 17}]},
            {"center": true, "blocks": [{"tag": "h2", "text": "Closing"}, {"tag": "p"}]},
            {"blocks": [{"tag": "h1", "text": "Title"}]},
            {"center": false, "blocks": [{"tag": "p", "items": "oops"}]}
        ]"#;
        let slides = BrowserRenderer::parse_snapshot(encoded).unwrap();
        assert_eq!(slides.len(), 4);

        assert_eq!(slides[0].blocks[0].text.as_deref(), Some("Intro"));
        assert_eq!(
            slides[0].blocks[1].tag,
            BlockTag::List {
                ordered: false,
                items: 17
            }
        );

        assert!(slides[1].explicit_center);
        assert_eq!(slides[1].blocks.len(), 2);

        assert_eq!(slides[2].first_heading(), Some("Title"));
        assert!(!slides[2].explicit_center);

        // Malformed item counts degrade to zero rather than failing.
        assert_eq!(slides[3].blocks[0].tag, BlockTag::Paragraph);
    }

    #[test]
    fn test_parse_snapshot_preserves_heading_punctuation() {
        let encoded = r#"[{"blocks": [{"tag": "h2", "text": "Hello, World | Part 1"}]}]"#;
        let slides = BrowserRenderer::parse_snapshot(encoded).unwrap();
        assert_eq!(slides[0].first_heading(), Some("Hello, World | Part 1"));
        assert_eq!(
            crate::title::window_title(slides[0].first_heading(), "Talk"),
            "Hello, World | Part 1 - Talk"
        );
    }

    #[test]
    fn test_parse_empty_snapshot() {
        assert!(BrowserRenderer::parse_snapshot("[]").unwrap().is_empty());
        assert!(BrowserRenderer::parse_snapshot("not json").is_err());
    }

    #[test]
    fn test_parse_bounds() {
        let m = BrowserRenderer::parse_bounds("0 1080 900 1203.5");
        assert_eq!(m.slide.unwrap().bottom, 1080.0);
        assert_eq!(m.last_block.unwrap().bottom, 1203.5);

        let degenerate = BrowserRenderer::parse_bounds("");
        assert!(degenerate.slide.is_none());
        assert!(degenerate.last_block.is_none());
    }

    #[test]
    fn test_edit_statements_escape_values() {
        let stmt = BrowserRenderer::edit_statement(&DomEdit::SetBlockStyleVar {
            block: 1,
            name: layout::AUTO_COLUMNS_VAR.to_string(),
            value: "3".to_string(),
        });
        assert_eq!(
            stmt,
            "if (s.children[1]) s.children[1].style.setProperty(\"--auto-columns\", \"3\");"
        );

        let title = js_string("He said \"hi\"\n");
        assert_eq!(title, "\"He said \\\"hi\\\"\\n\"");
    }
}
