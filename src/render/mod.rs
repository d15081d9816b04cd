//! HTML rendering of decoded documents.

pub mod images;

use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

use crate::document::{Block, Inline, RunStyle, StructuredContent};

pub use images::{ImageAsset, ImagePolicy};

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("failed to write image {path}: {source}")]
    ImageWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Default)]
pub struct RenderOutput {
    pub html: String,
    pub warnings: Vec<String>,
    pub assets: Vec<ImageAsset>,
}

/// Render content to HTML, writing image files when the policy asks for it.
pub fn render(content: &StructuredContent, policy: &ImagePolicy) -> Result<RenderOutput, RenderError> {
    render_with(content, policy, true)
}

/// Render exactly like [`render`] but never touch the filesystem.
pub fn preview(content: &StructuredContent, policy: &ImagePolicy) -> RenderOutput {
    // Without writes the only fallible step is skipped.
    match render_with(content, policy, false) {
        Ok(output) => output,
        Err(_) => RenderOutput::default(),
    }
}

fn render_with(
    content: &StructuredContent,
    policy: &ImagePolicy,
    write_files: bool,
) -> Result<RenderOutput, RenderError> {
    let mut sources = Vec::with_capacity(content.images.len());
    let mut assets = Vec::new();
    for image in &content.images {
        match policy {
            ImagePolicy::ExternalFile {
                destination_dir,
                public_base_url,
            } => {
                let asset = images::plan_asset(image, destination_dir, public_base_url);
                sources.push(asset.url.clone());
                assets.push(asset);
            }
            ImagePolicy::InlineDataUri => sources.push(images::data_uri(image)),
        }
    }
    if write_files {
        images::write_assets(&content.images, &assets)?;
    }

    let mut renderer = HtmlRenderer {
        out: String::new(),
        content,
        sources: &sources,
    };
    renderer.blocks(&content.blocks);
    debug!(
        bytes = renderer.out.len(),
        images = sources.len(),
        "rendered document"
    );

    Ok(RenderOutput {
        html: renderer.out,
        warnings: content.warnings.clone(),
        assets,
    })
}

struct HtmlRenderer<'a> {
    out: String,
    content: &'a StructuredContent,
    sources: &'a [String],
}

impl HtmlRenderer<'_> {
    fn blocks(&mut self, blocks: &[Block]) {
        let mut i = 0;
        while i < blocks.len() {
            match &blocks[i] {
                Block::Heading { level, inlines } => {
                    let level = (*level).clamp(1, 6);
                    self.out.push_str(&format!("<h{level}>"));
                    self.inlines(inlines);
                    self.out.push_str(&format!("</h{level}>\n"));
                }
                Block::Paragraph { inlines } => {
                    self.out.push_str("<p>");
                    self.inlines(inlines);
                    self.out.push_str("</p>\n");
                }
                Block::ListItem { .. } => {
                    let end = blocks[i..]
                        .iter()
                        .position(|b| !matches!(b, Block::ListItem { .. }))
                        .map_or(blocks.len(), |offset| i + offset);
                    self.list(&blocks[i..end]);
                    i = end;
                    continue;
                }
                Block::Table { rows } => self.table(rows),
            }
            i += 1;
        }
    }

    /// Render a run of consecutive list items as nested `<ul>`/`<ol>` elements.
    fn list(&mut self, items: &[Block]) {
        // One entry per open list: whether it is ordered. Each open list has an open <li>.
        let mut open: Vec<bool> = Vec::new();
        for item in items {
            let Block::ListItem {
                ordered,
                level,
                inlines,
            } = item
            else {
                continue;
            };
            let depth = usize::from(*level) + 1;

            while open.len() > depth {
                self.close_list(&mut open);
            }
            if open.len() == depth {
                if open.last() == Some(ordered) {
                    self.out.push_str("</li>\n<li>");
                } else {
                    self.close_list(&mut open);
                }
            }
            while open.len() < depth {
                self.out.push_str(if *ordered { "\n<ol>\n<li>" } else { "\n<ul>\n<li>" });
                open.push(*ordered);
            }
            self.inlines(inlines);
        }
        while !open.is_empty() {
            self.close_list(&mut open);
        }
        self.out.push('\n');
    }

    fn close_list(&mut self, open: &mut Vec<bool>) {
        if let Some(ordered) = open.pop() {
            self.out
                .push_str(if ordered { "</li>\n</ol>" } else { "</li>\n</ul>" });
        }
    }

    fn table(&mut self, rows: &[Vec<Vec<Block>>]) {
        self.out.push_str("<table>\n");
        for row in rows {
            self.out.push_str("<tr>");
            for cell in row {
                self.out.push_str("<td>");
                self.blocks(cell);
                self.out.push_str("</td>");
            }
            self.out.push_str("</tr>\n");
        }
        self.out.push_str("</table>\n");
    }

    fn inlines(&mut self, inlines: &[Inline]) {
        for inline in inlines {
            match inline {
                Inline::Text { text, style } => self.text(text, *style),
                Inline::Break => self.out.push_str("<br />"),
                Inline::Image { index } => self.image(*index),
                Inline::Link { href, children } => {
                    self.out
                        .push_str(&format!("<a href=\"{}\">", escape_attribute(href)));
                    self.inlines(children);
                    self.out.push_str("</a>");
                }
            }
        }
    }

    fn text(&mut self, text: &str, style: RunStyle) {
        let tags: Vec<&str> = [
            (style.bold, "strong"),
            (style.italic, "em"),
            (style.underline, "u"),
        ]
        .into_iter()
        .filter_map(|(on, tag)| on.then_some(tag))
        .collect();

        for tag in &tags {
            self.out.push_str(&format!("<{tag}>"));
        }
        self.out.push_str(&escape_text(text));
        for tag in tags.iter().rev() {
            self.out.push_str(&format!("</{tag}>"));
        }
    }

    fn image(&mut self, index: usize) {
        let Some(src) = self.sources.get(index) else {
            return;
        };
        let alt = self
            .content
            .images
            .get(index)
            .and_then(|image| image.alt_text.as_deref());
        match alt {
            Some(alt) => self.out.push_str(&format!(
                "<img src=\"{}\" alt=\"{}\" />",
                escape_attribute(src),
                escape_attribute(alt)
            )),
            None => self
                .out
                .push_str(&format!("<img src=\"{}\" />", escape_attribute(src))),
        }
    }
}

fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn escape_attribute(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}
