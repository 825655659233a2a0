// ABOUTME: Slide DOM model for the slidewise application
// ABOUTME: Mirrors slide shape (blocks, classes, style vars) and defines the edit vocabulary

/// Tag of a direct child of a slide, as far as layout decisions care.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockTag {
    /// h1..h6, with the heading level
    Heading(u8),
    /// ul or ol, with the number of direct list items
    List { ordered: bool, items: usize },
    Table,
    Image,
    Paragraph,
    CodeBlock,
    Quote,
    /// Anything else, by lowercase tag name
    Other(String),
}

impl BlockTag {
    /// Parse a lowercase tag name. List item counts are supplied separately
    /// because they come from a different DOM read.
    pub fn from_tag_name(name: &str, list_items: usize) -> Self {
        match name {
            "h1" => BlockTag::Heading(1),
            "h2" => BlockTag::Heading(2),
            "h3" => BlockTag::Heading(3),
            "h4" => BlockTag::Heading(4),
            "h5" => BlockTag::Heading(5),
            "h6" => BlockTag::Heading(6),
            "ul" => BlockTag::List {
                ordered: false,
                items: list_items,
            },
            "ol" => BlockTag::List {
                ordered: true,
                items: list_items,
            },
            "table" => BlockTag::Table,
            "img" => BlockTag::Image,
            "p" => BlockTag::Paragraph,
            "pre" => BlockTag::CodeBlock,
            "blockquote" => BlockTag::Quote,
            other => BlockTag::Other(other.to_string()),
        }
    }

    pub fn is_heading(&self) -> bool {
        matches!(self, BlockTag::Heading(_))
    }

    /// Lists, tables and images are "structural": a slide containing one is
    /// never considered a short textual slide.
    pub fn is_structural(&self) -> bool {
        matches!(self, BlockTag::List { .. } | BlockTag::Table | BlockTag::Image)
    }

    pub fn is_list(&self) -> bool {
        matches!(self, BlockTag::List { .. })
    }
}

/// One direct child of a slide. Layout only ever reads the tag; the text is
/// carried for headings so the title synchronizer can use it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentBlock {
    pub tag: BlockTag,
    pub text: Option<String>,
}

impl ContentBlock {
    pub fn new(tag: BlockTag) -> Self {
        Self { tag, text: None }
    }

    pub fn heading(level: u8, text: &str) -> Self {
        Self {
            tag: BlockTag::Heading(level),
            text: Some(text.to_string()),
        }
    }
}

/// Local mirror of one rendered slide. The renderer owns the real DOM node;
/// this mirror tracks exactly the state layout is allowed to touch: the
/// slide's class list, its blocks' class lists, and style variables.
#[derive(Debug, Clone, Default)]
pub struct SlideNode {
    /// The slide was marked `center` by its source, before any classification.
    pub explicit_center: bool,
    pub classes: Vec<String>,
    pub blocks: Vec<ContentBlock>,
    /// Per-block class lists, indexed like `blocks`.
    pub block_classes: Vec<Vec<String>>,
    /// Per-block style variables (name, value), indexed like `blocks`.
    pub block_style_vars: Vec<Vec<(String, String)>>,
}

impl SlideNode {
    pub fn new(blocks: Vec<ContentBlock>) -> Self {
        let n = blocks.len();
        Self {
            explicit_center: false,
            classes: Vec::new(),
            blocks,
            block_classes: vec![Vec::new(); n],
            block_style_vars: vec![Vec::new(); n],
        }
    }

    pub fn with_explicit_center(mut self) -> Self {
        self.explicit_center = true;
        self
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn block_has_class(&self, index: usize, class: &str) -> bool {
        self.block_classes
            .get(index)
            .map(|cs| cs.iter().any(|c| c == class))
            .unwrap_or(false)
    }

    /// First h1/h2/h3 heading text, used for the window title.
    pub fn first_heading(&self) -> Option<&str> {
        self.blocks.iter().find_map(|b| match b.tag {
            BlockTag::Heading(level) if level <= 3 => b.text.as_deref(),
            _ => None,
        })
    }

    /// Indices of body (non-heading) blocks, in document order.
    pub fn body_block_indices(&self) -> Vec<usize> {
        self.blocks
            .iter()
            .enumerate()
            .filter(|(_, b)| !b.tag.is_heading())
            .map(|(i, _)| i)
            .collect()
    }

    pub fn heading_count(&self) -> usize {
        self.blocks.iter().filter(|b| b.tag.is_heading()).count()
    }

    /// Apply one edit to the mirror. The renderer applies the same edit to
    /// the real DOM; keeping both in sync is the session's job.
    pub fn apply_edit(&mut self, edit: &DomEdit) {
        match edit {
            DomEdit::AddSlideClass(class) => {
                if !self.has_class(class) {
                    self.classes.push(class.clone());
                }
            }
            DomEdit::AddBlockClass { block, class } => {
                if let Some(cs) = self.block_classes.get_mut(*block) {
                    if !cs.iter().any(|c| c == class) {
                        cs.push(class.clone());
                    }
                }
            }
            DomEdit::RemoveBlockClass { block, class } => {
                if let Some(cs) = self.block_classes.get_mut(*block) {
                    cs.retain(|c| c != class);
                }
            }
            DomEdit::SetBlockStyleVar { block, name, value } => {
                if let Some(vars) = self.block_style_vars.get_mut(*block) {
                    match vars.iter_mut().find(|(n, _)| n == name) {
                        Some(entry) => entry.1 = value.clone(),
                        None => vars.push((name.clone(), value.clone())),
                    }
                }
            }
        }
    }
}

/// The only mutations layout components are allowed to make to the DOM.
/// Block content is never touched, only class lists and style variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomEdit {
    AddSlideClass(String),
    AddBlockClass { block: usize, class: String },
    RemoveBlockClass { block: usize, class: String },
    SetBlockStyleVar {
        block: usize,
        name: String,
        value: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_tag_parsing() {
        assert_eq!(BlockTag::from_tag_name("h2", 0), BlockTag::Heading(2));
        assert_eq!(
            BlockTag::from_tag_name("ul", 5),
            BlockTag::List {
                ordered: false,
                items: 5
            }
        );
        assert_eq!(BlockTag::from_tag_name("img", 0), BlockTag::Image);
        assert_eq!(
            BlockTag::from_tag_name("figure", 0),
            BlockTag::Other("figure".to_string())
        );
    }

    #[test]
    fn test_structural_blocks() {
        assert!(BlockTag::from_tag_name("ul", 2).is_structural());
        assert!(BlockTag::from_tag_name("table", 0).is_structural());
        assert!(BlockTag::from_tag_name("img", 0).is_structural());
        assert!(!BlockTag::from_tag_name("p", 0).is_structural());
        assert!(!BlockTag::from_tag_name("h1", 0).is_structural());
    }

    #[test]
    fn test_first_heading_skips_deep_levels() {
        let slide = SlideNode::new(vec![
            ContentBlock::heading(5, "too deep"),
            ContentBlock::heading(2, "Intro"),
            ContentBlock::new(BlockTag::Paragraph),
        ]);
        assert_eq!(slide.first_heading(), Some("Intro"));
    }

    #[test]
    fn test_apply_edit_is_idempotent_for_classes() {
        let mut slide = SlideNode::new(vec![ContentBlock::new(BlockTag::Paragraph)]);
        let edit = DomEdit::AddBlockClass {
            block: 0,
            class: "spaced-block".to_string(),
        };
        slide.apply_edit(&edit);
        slide.apply_edit(&edit);
        assert_eq!(slide.block_classes[0], vec!["spaced-block".to_string()]);

        slide.apply_edit(&DomEdit::RemoveBlockClass {
            block: 0,
            class: "spaced-block".to_string(),
        });
        assert!(slide.block_classes[0].is_empty());
    }

    #[test]
    fn test_body_block_indices_preserve_order() {
        let slide = SlideNode::new(vec![
            ContentBlock::heading(2, "T"),
            ContentBlock::new(BlockTag::Paragraph),
            ContentBlock::heading(3, "S"),
            ContentBlock::new(BlockTag::Image),
        ]);
        assert_eq!(slide.body_block_indices(), vec![1, 3]);
    }
}
