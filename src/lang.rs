// ABOUTME: Language routing for the slidewise application
// ABOUTME: Resolves the active deck language and builds the cycle-to-next toggle

use crate::config::DeckConfig;
use log::debug;
use url::Url;

/// Fallback when the deck configures no languages at all.
pub const DEFAULT_LANGUAGE: &str = "en";

/// The cycle-to-next-language control. The label is the display name of the
/// NEXT language in cycle order, not the current one; activating it is a full
/// navigation to `href` (plus the current fragment, re-attached client-side).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LangToggle {
    pub label: String,
    pub href: String,
}

/// Resolve the active language: explicit `lang` query parameter if present
/// and non-empty, else the first configured language, else "en".
/// Unrecognized codes are accepted as-is; content lookup decides what exists.
pub fn resolve_language(config: &DeckConfig, url: &Url) -> String {
    let from_query = url
        .query_pairs()
        .find(|(k, _)| k == "lang")
        .map(|(_, v)| v.to_string())
        .filter(|v| !v.is_empty());

    let lang = from_query
        .or_else(|| config.langs.first().map(|l| l.code.clone()))
        .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());
    debug!("Resolved active language: {}", lang);
    lang
}

/// The language one position after `active` in configuration order, wrapping
/// to the first after the last. An `active` code that is not configured
/// behaves like position -1, so the toggle leads back into the ring.
pub fn next_language<'a>(config: &'a DeckConfig, active: &str) -> Option<&'a crate::config::Language> {
    if config.langs.len() < 2 {
        return None;
    }
    let current = config.langs.iter().position(|l| l.code == active);
    let next_index = match current {
        Some(i) => (i + 1) % config.langs.len(),
        None => 0,
    };
    config.langs.get(next_index)
}

/// Build the toggle for the current page URL, or None for monolingual decks.
/// The href keeps every query parameter except `lang`, which is rewritten to
/// the next code. The fragment never reaches the server, so the page snippet
/// appends `location.hash` at click time instead.
pub fn build_toggle(config: &DeckConfig, active: &str, current_url: &Url) -> Option<LangToggle> {
    let next = next_language(config, active)?;

    let mut target = current_url.clone();
    let retained: Vec<(String, String)> = current_url
        .query_pairs()
        .filter(|(k, _)| k != "lang")
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    {
        let mut qp = target.query_pairs_mut();
        qp.clear();
        for (k, v) in &retained {
            qp.append_pair(k, v);
        }
        qp.append_pair("lang", &next.code);
    }
    target.set_fragment(None);

    let href = match target.query() {
        Some(q) => format!("{}?{}", target.path(), q),
        None => target.path().to_string(),
    };

    Some(LangToggle {
        label: next.label.clone(),
        href,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Language;

    fn trilingual() -> DeckConfig {
        DeckConfig {
            langs: vec![
                Language::new("en", "English"),
                Language::new("fr", "Français"),
                Language::new("de", "Deutsch"),
            ],
            chapters: vec!["intro".to_string()],
            ..Default::default()
        }
    }

    fn page_url(s: &str) -> Url {
        Url::parse(s).expect("test url")
    }

    #[test]
    fn test_resolve_language_prefers_query_param() {
        let config = trilingual();
        let url = page_url("http://localhost:8080/?lang=de");
        assert_eq!(resolve_language(&config, &url), "de");
    }

    #[test]
    fn test_resolve_language_falls_back_to_first_configured() {
        let config = trilingual();
        let url = page_url("http://localhost:8080/");
        assert_eq!(resolve_language(&config, &url), "en");
    }

    #[test]
    fn test_resolve_language_empty_param_is_ignored() {
        let config = trilingual();
        let url = page_url("http://localhost:8080/?lang=");
        assert_eq!(resolve_language(&config, &url), "en");
    }

    #[test]
    fn test_resolve_language_default_without_config() {
        let config = DeckConfig {
            chapters: vec!["intro".to_string()],
            ..Default::default()
        };
        let url = page_url("http://localhost:8080/");
        assert_eq!(resolve_language(&config, &url), "en");
    }

    #[test]
    fn test_toggle_cycles_through_all_languages() {
        let config = trilingual();
        let url = page_url("http://localhost:8080/");

        let t1 = build_toggle(&config, "en", &url).unwrap();
        assert_eq!(t1.label, "Français");
        assert!(t1.href.contains("lang=fr"));

        let t2 = build_toggle(&config, "fr", &url).unwrap();
        assert_eq!(t2.label, "Deutsch");
        assert!(t2.href.contains("lang=de"));

        let t3 = build_toggle(&config, "de", &url).unwrap();
        assert_eq!(t3.label, "English");
        assert!(t3.href.contains("lang=en"));
    }

    #[test]
    fn test_toggle_preserves_other_query_params() {
        let config = trilingual();
        let url = page_url("http://localhost:8080/?theme=night&lang=en&foo=bar");
        let toggle = build_toggle(&config, "en", &url).unwrap();
        assert!(toggle.href.contains("theme=night"));
        assert!(toggle.href.contains("foo=bar"));
        assert!(toggle.href.contains("lang=fr"));
        assert!(!toggle.href.contains("lang=en"));
    }

    #[test]
    fn test_no_toggle_for_monolingual_deck() {
        let mut config = trilingual();
        config.langs.truncate(1);
        let url = page_url("http://localhost:8080/");
        assert!(build_toggle(&config, "en", &url).is_none());

        config.langs.clear();
        assert!(build_toggle(&config, "en", &url).is_none());
    }

    #[test]
    fn test_unconfigured_active_language_reenters_ring() {
        let config = trilingual();
        let url = page_url("http://localhost:8080/?lang=xx");
        let toggle = build_toggle(&config, "xx", &url).unwrap();
        assert_eq!(toggle.label, "English");
        assert!(toggle.href.contains("lang=en"));
    }
}
