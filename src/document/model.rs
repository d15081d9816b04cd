use bytes::Bytes;

/// Decoded document: blocks in reading order plus the images they reference.
#[derive(Debug, Clone, Default)]
pub struct StructuredContent {
    pub blocks: Vec<Block>,
    pub images: Vec<ImageBlob>,
    pub warnings: Vec<String>,
}

impl StructuredContent {
    /// Whether any block carries visible text.
    pub fn has_text(&self) -> bool {
        self.blocks.iter().any(Block::has_text)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Heading { level: u8, inlines: Vec<Inline> },
    Paragraph { inlines: Vec<Inline> },
    ListItem { ordered: bool, level: u8, inlines: Vec<Inline> },
    Table { rows: Vec<Vec<Vec<Block>>> },
}

impl Block {
    pub fn has_text(&self) -> bool {
        match self {
            Block::Heading { inlines, .. }
            | Block::Paragraph { inlines }
            | Block::ListItem { inlines, .. } => inlines.iter().any(Inline::has_text),
            Block::Table { rows } => rows
                .iter()
                .flatten()
                .flatten()
                .any(Block::has_text),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    Text { text: String, style: RunStyle },
    Break,
    /// Index into [`StructuredContent::images`].
    Image { index: usize },
    Link { href: String, children: Vec<Inline> },
}

impl Inline {
    fn has_text(&self) -> bool {
        match self {
            Inline::Text { text, .. } => !text.trim().is_empty(),
            Inline::Link { children, .. } => children.iter().any(Inline::has_text),
            Inline::Break | Inline::Image { .. } => false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStyle {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

/// An embedded image as stored in the package.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBlob {
    pub content_type: String,
    pub data: Bytes,
    pub alt_text: Option<String>,
}
