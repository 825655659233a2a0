// ABOUTME: Overflow correction for the slidewise application
// ABOUTME: Reverts spacing decisions on slides whose content exceeds the frame

use crate::dom::{DomEdit, SlideNode};
use crate::layout::SPACED_BLOCK_CLASS;
use log::debug;

/// Vertical extent of a laid-out element, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub top: f64,
    pub bottom: f64,
}

/// Geometry source for the active slide. Only the active slide may be
/// measured: inactive slides report degenerate geometry.
pub trait SlideMetrics {
    /// Bounding box of the slide itself.
    fn slide_bounds(&self) -> Option<Bounds>;
    /// Bounding box of the slide's last direct child.
    fn last_block_bounds(&self) -> Option<Bounds>;
}

/// Check the active slide for overflow and strip `spaced-block` markings if
/// its last child extends past the slide's bottom edge. One-way: spacing is
/// never restored for the rest of the session, even if a resize would fit it
/// again. No-op (and no measurement at all) when nothing is spaced.
pub fn correct(slide: &mut SlideNode, metrics: &dyn SlideMetrics) -> Vec<DomEdit> {
    let spaced: Vec<usize> = (0..slide.blocks.len())
        .filter(|&i| slide.block_has_class(i, SPACED_BLOCK_CLASS))
        .collect();
    if spaced.is_empty() {
        return Vec::new();
    }

    let (slide_bounds, last_bounds) = match (metrics.slide_bounds(), metrics.last_block_bounds()) {
        (Some(s), Some(l)) => (s, l),
        _ => return Vec::new(),
    };

    if last_bounds.bottom <= slide_bounds.bottom {
        return Vec::new();
    }

    debug!(
        "Slide overflows by {:.1}px, removing block spacing",
        last_bounds.bottom - slide_bounds.bottom
    );

    let edits: Vec<DomEdit> = spaced
        .into_iter()
        .map(|block| DomEdit::RemoveBlockClass {
            block,
            class: SPACED_BLOCK_CLASS.to_string(),
        })
        .collect();
    for edit in &edits {
        slide.apply_edit(edit);
    }
    edits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{BlockTag, ContentBlock};
    use crate::layout::apply_layout;

    struct FakeMetrics {
        slide: Option<Bounds>,
        last: Option<Bounds>,
    }

    impl SlideMetrics for FakeMetrics {
        fn slide_bounds(&self) -> Option<Bounds> {
            self.slide
        }
        fn last_block_bounds(&self) -> Option<Bounds> {
            self.last
        }
    }

    fn spaced_slide() -> SlideNode {
        let mut slide = SlideNode::new(vec![
            ContentBlock::heading(2, "T"),
            ContentBlock::new(BlockTag::Paragraph),
            ContentBlock::new(BlockTag::Paragraph),
            ContentBlock::new(BlockTag::Image),
        ]);
        apply_layout(&mut slide);
        assert!(slide.block_has_class(2, SPACED_BLOCK_CLASS));
        slide
    }

    #[test]
    fn test_overflow_strips_all_spacing() {
        let mut slide = spaced_slide();
        let metrics = FakeMetrics {
            slide: Some(Bounds { top: 0.0, bottom: 1080.0 }),
            last: Some(Bounds { top: 900.0, bottom: 1080.5 }),
        };
        let edits = correct(&mut slide, &metrics);
        assert_eq!(edits.len(), 2);
        for i in 0..slide.blocks.len() {
            assert!(!slide.block_has_class(i, SPACED_BLOCK_CLASS));
        }
    }

    #[test]
    fn test_fitting_slide_is_untouched() {
        let mut slide = spaced_slide();
        let metrics = FakeMetrics {
            slide: Some(Bounds { top: 0.0, bottom: 1080.0 }),
            last: Some(Bounds { top: 900.0, bottom: 1080.0 }),
        };
        assert!(correct(&mut slide, &metrics).is_empty());
        assert!(slide.block_has_class(2, SPACED_BLOCK_CLASS));
        assert!(slide.block_has_class(3, SPACED_BLOCK_CLASS));
    }

    #[test]
    fn test_unspaced_slide_is_never_measured() {
        struct PanicMetrics;
        impl SlideMetrics for PanicMetrics {
            fn slide_bounds(&self) -> Option<Bounds> {
                panic!("must not measure a slide without spacing");
            }
            fn last_block_bounds(&self) -> Option<Bounds> {
                panic!("must not measure a slide without spacing");
            }
        }

        let mut slide = SlideNode::new(vec![ContentBlock::heading(2, "T")]);
        assert!(correct(&mut slide, &PanicMetrics).is_empty());
    }

    #[test]
    fn test_correction_is_idempotent() {
        let mut slide = spaced_slide();
        let metrics = FakeMetrics {
            slide: Some(Bounds { top: 0.0, bottom: 1080.0 }),
            last: Some(Bounds { top: 900.0, bottom: 1200.0 }),
        };
        let first = correct(&mut slide, &metrics);
        assert!(!first.is_empty());
        // Second run finds no spaced blocks and does nothing.
        assert!(correct(&mut slide, &metrics).is_empty());
    }

    #[test]
    fn test_degenerate_geometry_is_tolerated() {
        let mut slide = spaced_slide();
        let metrics = FakeMetrics {
            slide: None,
            last: None,
        };
        assert!(correct(&mut slide, &metrics).is_empty());
        assert!(slide.block_has_class(2, SPACED_BLOCK_CLASS));
    }
}
