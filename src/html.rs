// ABOUTME: Deck skeleton page generation for the slidewise application
// ABOUTME: Builds the Reveal.js DOM scaffold with per-language markdown references

use crate::config::DeckConfig;
use crate::errors::{Result, SlideError};
use crate::lang::LangToggle;
use log::info;
use std::fs;
use std::path::Path;

/// Markdown block separator for top-level slides.
pub const SLIDE_SEPARATOR: &str = r"^\n---\n$";
/// Markdown block separator for vertically nested slides.
pub const VERTICAL_SEPARATOR: &str = r"^\n----\n$";

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Content-source path for one chapter in one language.
pub fn chapter_source(lang: &str, chapter: &str) -> String {
    format!("src/{}/{}.md", lang, chapter)
}

/// Generate the deck skeleton page: html element with the declared language,
/// the optional language toggle, and one markdown section per chapter.
/// Stylesheets and scripts are injected later by the session's resource
/// loader, so the skeleton stays a pure DOM scaffold.
pub fn generate_deck_html(
    config: &DeckConfig,
    lang: &str,
    toggle: Option<&LangToggle>,
) -> Result<String> {
    config.validate()?;
    info!(
        "Generating deck skeleton: {} chapters, language {}",
        config.chapters.len(),
        lang
    );

    let mut html_doc = String::from("<!DOCTYPE html>\n");
    html_doc.push_str(&format!("<html lang=\"{}\">\n<head>\n", escape_html(lang)));
    html_doc.push_str("<meta charset=\"UTF-8\">\n");
    html_doc.push_str(
        "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0, maximum-scale=1.0, user-scalable=0\">\n",
    );
    html_doc.push_str(&format!(
        "<title>{}</title>\n",
        escape_html(config.display_title())
    ));
    html_doc.push_str("</head>\n<body>\n");

    if let Some(toggle) = toggle {
        // The target query lives in data-href; the snippet re-attaches the
        // fragment at click time since it never reaches the server.
        html_doc.push_str(&format!(
            "<a id=\"lang-toggle\" href=\"{}\" data-href=\"{}\">{}</a>\n",
            escape_html(&toggle.href),
            escape_html(&toggle.href),
            escape_html(&toggle.label)
        ));
        html_doc.push_str("<script>\n");
        html_doc.push_str("var t = document.getElementById('lang-toggle');\n");
        html_doc.push_str(
            "t.addEventListener('click', function(e) { e.preventDefault(); location.href = t.dataset.href + location.hash; });\n",
        );
        html_doc.push_str("</script>\n");
    }

    html_doc.push_str("<div class=\"reveal\">\n<div class=\"slides\">\n");
    for chapter in &config.chapters {
        html_doc.push_str(&format!(
            "<section data-markdown=\"{}\" data-separator=\"{}\" data-separator-vertical=\"{}\" data-charset=\"utf-8\"></section>\n",
            escape_html(&chapter_source(lang, chapter)),
            escape_html(SLIDE_SEPARATOR),
            escape_html(VERTICAL_SEPARATOR)
        ));
    }
    html_doc.push_str("</div>\n</div>\n");

    html_doc.push_str("</body>\n</html>\n");
    Ok(html_doc)
}

/// Utility function to write HTML content to a file
pub fn write_html_to_file(html_content: &str, output_path: &Path) -> Result<()> {
    info!("Writing HTML to file: {:?}", output_path);

    if let Some(parent) = output_path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).map_err(SlideError::FileReadError)?;
        }
    }

    fs::write(output_path, html_content).map_err(SlideError::FileReadError)?;

    Ok(())
}
