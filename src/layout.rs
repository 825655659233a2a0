// ABOUTME: Slide layout classifier for the slidewise application
// ABOUTME: Decides centering, stretching, auto-columns and spacing from slide shape

use crate::dom::{BlockTag, DomEdit, SlideNode};
use log::debug;

/// Lists longer than this are split across columns. Empirical threshold for
/// a 16:9 large-viewport layout; exposed so decks can retune it.
pub const AUTO_COLUMN_ITEM_LIMIT: usize = 8;

// Class names consumed by the collaborator stylesheet.
pub const CENTER_CLASS: &str = "center";
pub const STRETCH_LIST_CLASS: &str = "stretch-list";
pub const AUTO_COLUMNS_CLASS: &str = "auto-columns";
pub const SPACED_BLOCK_CLASS: &str = "spaced-block";
pub const AUTO_COLUMNS_VAR: &str = "--auto-columns";

/// Outcome of classifying one slide. Derived purely from block composition,
/// so reclassifying an unchanged slide always yields the same decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutDecision {
    /// Leave the slide alone (explicitly centered by its source, or nothing applies).
    Keep,
    /// Short textual slide: vertically center it.
    Center,
    /// Single short list under a heading: let it fill the vertical space.
    StretchList { list_block: usize },
    /// Single long list under a heading: split across columns.
    AutoColumns { list_block: usize, columns: usize },
    /// Several stacked body blocks: space out all but the first.
    SpaceBlocks { blocks: Vec<usize> },
}

/// Classify one slide. First matching rule wins:
///   1. source-marked center slides are never overridden;
///   2. at most one body block and no list/table/image anywhere -> center;
///   3. heading(s) + exactly one body block that is a list -> stretch, or
///      auto-columns when the list exceeds the item limit;
///   4. more than one body block -> space every body block after the first;
///   5. otherwise keep.
pub fn classify(slide: &SlideNode, item_limit: usize) -> LayoutDecision {
    if slide.explicit_center {
        return LayoutDecision::Keep;
    }

    let body = slide.body_block_indices();
    let has_structural = slide.blocks.iter().any(|b| b.tag.is_structural());

    if body.len() <= 1 && !has_structural {
        return LayoutDecision::Center;
    }

    if slide.heading_count() >= 1 && body.len() == 1 {
        let index = body[0];
        if let BlockTag::List { items, .. } = &slide.blocks[index].tag {
            let limit = item_limit.max(1);
            let columns = (items + limit - 1) / limit;
            if columns > 1 {
                return LayoutDecision::AutoColumns {
                    list_block: index,
                    columns,
                };
            }
            return LayoutDecision::StretchList { list_block: index };
        }
    }

    if body.len() > 1 {
        return LayoutDecision::SpaceBlocks {
            blocks: body[1..].to_vec(),
        };
    }

    LayoutDecision::Keep
}

/// Lower a decision to the DOM edits that express it.
pub fn decision_edits(decision: &LayoutDecision) -> Vec<DomEdit> {
    match decision {
        LayoutDecision::Keep => Vec::new(),
        LayoutDecision::Center => vec![DomEdit::AddSlideClass(CENTER_CLASS.to_string())],
        LayoutDecision::StretchList { list_block } => vec![DomEdit::AddBlockClass {
            block: *list_block,
            class: STRETCH_LIST_CLASS.to_string(),
        }],
        LayoutDecision::AutoColumns { list_block, columns } => vec![
            DomEdit::AddBlockClass {
                block: *list_block,
                class: AUTO_COLUMNS_CLASS.to_string(),
            },
            DomEdit::SetBlockStyleVar {
                block: *list_block,
                name: AUTO_COLUMNS_VAR.to_string(),
                value: columns.to_string(),
            },
        ],
        LayoutDecision::SpaceBlocks { blocks } => blocks
            .iter()
            .map(|b| DomEdit::AddBlockClass {
                block: *b,
                class: SPACED_BLOCK_CLASS.to_string(),
            })
            .collect(),
    }
}

/// Classify one slide with the default threshold and apply the result to the
/// mirror, returning the edits for the renderer to replay on the real DOM.
pub fn apply_layout(slide: &mut SlideNode) -> Vec<DomEdit> {
    let decision = classify(slide, AUTO_COLUMN_ITEM_LIMIT);
    debug!("Layout decision: {:?}", decision);
    let edits = decision_edits(&decision);
    for edit in &edits {
        slide.apply_edit(edit);
    }
    edits
}
