// ABOUTME: Window title synchronization for the slidewise application
// ABOUTME: Derives the document title from the active slide's heading

/// `"<heading> - <deck title>"` when the active slide has a heading,
/// otherwise the bare deck title. Pure; no memory of previous titles.
pub fn window_title(heading: Option<&str>, deck_title: &str) -> String {
    match heading {
        Some(h) if !h.trim().is_empty() => format!("{} - {}", h.trim(), deck_title),
        _ => deck_title.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_with_heading() {
        assert_eq!(window_title(Some("Intro"), "Talk"), "Intro - Talk");
    }

    #[test]
    fn test_title_without_heading() {
        assert_eq!(window_title(None, "Talk"), "Talk");
    }

    #[test]
    fn test_blank_heading_falls_back() {
        assert_eq!(window_title(Some("   "), "Talk"), "Talk");
    }
}
