// ABOUTME: Library module for the slidewise program.
// ABOUTME: Presents Markdown slide decks through Reveal.js with adaptive layout.

// Reexport modules
pub mod browser;
pub mod config;
pub mod dom;
pub mod errors;
pub mod html;
pub mod lang;
pub mod layout;
pub mod overflow;
pub mod resources;
pub mod serve;
pub mod session;
pub mod title;
pub mod utils;

// Reexport common types and functions
pub use browser::BrowserRenderer;
pub use config::{AppConfig, DeckConfig, Language, RevealOptions, RevealOverrides};
pub use dom::{BlockTag, ContentBlock, DomEdit, SlideNode};
pub use errors::{Result, SlideError};
pub use html::{generate_deck_html, write_html_to_file};
pub use lang::{build_toggle, resolve_language, LangToggle};
pub use layout::{apply_layout, classify, LayoutDecision, AUTO_COLUMN_ITEM_LIMIT};
pub use overflow::{Bounds, SlideMetrics};
pub use resources::{ResourceFile, ResourceLoader, ScriptHost};
pub use serve::{start_server, watch_deck, ServeConfig};
pub use session::{PresentationSession, Renderer, SessionEvent, SlideMeasurements};
pub use title::window_title;
