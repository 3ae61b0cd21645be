//! Flattened page model produced by the reader

/// One line of a flattened page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextNode {
    pub text: String,
    /// Nesting depth; the page title sits at level 1
    pub heading_level: u32,
    /// Render as a bullet item rather than plain text
    pub is_outline_item: bool,
}

impl TextNode {
    pub fn new(text: impl Into<String>, heading_level: u32, is_outline_item: bool) -> Self {
        Self {
            text: text.into(),
            heading_level,
            is_outline_item,
        }
    }
}

/// One output document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    nodes: Vec<TextNode>,
}

impl Page {
    pub fn new(nodes: Vec<TextNode>) -> Self {
        Self { nodes }
    }

    /// Text of the first node; used to derive the filename
    pub fn title(&self) -> &str {
        self.nodes.first().map(|n| n.text.as_str()).unwrap_or_default()
    }

    pub fn nodes(&self) -> &[TextNode] {
        &self.nodes
    }

    /// Largest heading level present (1 for an empty page)
    pub fn max_heading(&self) -> u32 {
        self.nodes
            .iter()
            .map(|n| n.heading_level)
            .max()
            .unwrap_or(1)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
