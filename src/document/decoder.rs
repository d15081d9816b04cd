use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::collections::HashSet;
use tracing::debug;

use crate::document::errors::DecodeError;
use crate::document::model::{Block, ImageBlob, Inline, RunStyle, StructuredContent};
use crate::document::package::{Package, attr};
use crate::document::styles::{Numbering, ParagraphKind, Styles};

/// Wrappers whose children are read as if the wrapper were not there.
const TRANSPARENT: &[&[u8]] = &[
    b"sdt",
    b"sdtContent",
    b"customXml",
    b"smartTag",
    b"ins",
    b"moveTo",
    b"fldSimple",
    b"AlternateContent",
    b"Choice",
];

/// Decode a `.docx` package into structured content.
pub fn decode(bytes: &[u8]) -> Result<StructuredContent, DecodeError> {
    let package = Package::open(bytes)?;
    let styles = match package.styles.as_deref() {
        Some(xml) => Styles::parse(xml)?,
        None => Styles::default(),
    };
    let numbering = match package.numbering.as_deref() {
        Some(xml) => Numbering::parse(xml)?,
        None => Numbering::default(),
    };

    let mut decoder = BodyDecoder {
        reader: Reader::from_str(&package.document),
        package: &package,
        styles: &styles,
        numbering: &numbering,
        images: Vec::new(),
        warnings: Vec::new(),
        warned_styles: HashSet::new(),
    };
    let blocks = decoder.run()?;
    debug!(
        blocks = blocks.len(),
        images = decoder.images.len(),
        warnings = decoder.warnings.len(),
        "decoded document"
    );

    Ok(StructuredContent {
        blocks,
        images: decoder.images,
        warnings: decoder.warnings,
    })
}

#[derive(Default)]
struct ParagraphProps {
    style_id: Option<String>,
    num_id: Option<String>,
    level: u8,
}

struct BodyDecoder<'a> {
    reader: Reader<&'a [u8]>,
    package: &'a Package,
    styles: &'a Styles,
    numbering: &'a Numbering,
    images: Vec<ImageBlob>,
    warnings: Vec<String>,
    warned_styles: HashSet<String>,
}

impl<'a> BodyDecoder<'a> {
    fn run(&mut self) -> Result<Vec<Block>, DecodeError> {
        loop {
            match self.reader.read_event()? {
                Event::Start(e) if e.local_name().as_ref() == b"body" => {
                    return self.parse_blocks(b"body");
                }
                Event::Eof => return Ok(Vec::new()),
                _ => {}
            }
        }
    }

    fn parse_blocks(&mut self, end: &[u8]) -> Result<Vec<Block>, DecodeError> {
        let mut blocks = Vec::new();
        loop {
            match self.reader.read_event()? {
                Event::Start(e) => match e.local_name().as_ref() {
                    b"p" => {
                        if let Some(block) = self.parse_paragraph()? {
                            blocks.push(block);
                        }
                    }
                    b"tbl" => blocks.push(self.parse_table()?),
                    name if TRANSPARENT.contains(&name) => {}
                    _ => self.skip(&e)?,
                },
                Event::End(e) if e.local_name().as_ref() == end => break,
                Event::Eof => break,
                _ => {}
            }
        }
        Ok(blocks)
    }

    fn parse_paragraph(&mut self) -> Result<Option<Block>, DecodeError> {
        let mut props = ParagraphProps::default();
        let inlines = self.parse_inlines(b"p", &mut props)?;
        if is_blank(&inlines) {
            return Ok(None);
        }

        let kind = props
            .style_id
            .as_deref()
            .map(|id| self.styles.classify(id))
            .unwrap_or(ParagraphKind::Body);

        if let ParagraphKind::Heading(level) = kind {
            return Ok(Some(Block::Heading { level, inlines }));
        }

        if let Some(num_id) = props.num_id.as_deref().filter(|id| *id != "0") {
            let ordered = match self.numbering.is_ordered(num_id, props.level) {
                Some(ordered) => ordered,
                None => {
                    self.warnings.push(format!(
                        "no numbering definition for list {num_id} level {}, rendered as bullets",
                        props.level
                    ));
                    false
                }
            };
            return Ok(Some(Block::ListItem {
                ordered,
                level: props.level,
                inlines,
            }));
        }

        if kind == ParagraphKind::Unrecognised
            && let Some(id) = props.style_id
            && self.warned_styles.insert(id.clone())
        {
            let name = self.styles.name(&id).unwrap_or(&id);
            self.warnings.push(format!(
                "unrecognised paragraph style: '{name}' (style id: {id})"
            ));
        }
        Ok(Some(Block::Paragraph { inlines }))
    }

    /// Read paragraph content up to the closing `end` element.
    fn parse_inlines(
        &mut self,
        end: &[u8],
        props: &mut ParagraphProps,
    ) -> Result<Vec<Inline>, DecodeError> {
        let mut inlines = Vec::new();
        loop {
            match self.reader.read_event()? {
                Event::Start(e) => match e.local_name().as_ref() {
                    b"pPr" => self.parse_paragraph_props(props)?,
                    b"r" => {
                        for inline in self.parse_run()? {
                            push_inline(&mut inlines, inline);
                        }
                    }
                    b"hyperlink" => {
                        let href = self.hyperlink_target(&e)?;
                        let children = self.parse_inlines(b"hyperlink", props)?;
                        match href {
                            Some(href) => inlines.push(Inline::Link { href, children }),
                            None => inlines.extend(children),
                        }
                    }
                    name if TRANSPARENT.contains(&name) => {}
                    _ => self.skip(&e)?,
                },
                Event::End(e) if e.local_name().as_ref() == end => break,
                Event::Eof => break,
                _ => {}
            }
        }
        Ok(inlines)
    }

    fn parse_paragraph_props(&mut self, props: &mut ParagraphProps) -> Result<(), DecodeError> {
        loop {
            match self.reader.read_event()? {
                Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                    b"pStyle" => props.style_id = attr(&e, b"val")?,
                    b"numId" => props.num_id = attr(&e, b"val")?,
                    b"ilvl" => {
                        props.level = attr(&e, b"val")?
                            .and_then(|v| v.parse().ok())
                            .unwrap_or(0)
                    }
                    _ => {}
                },
                Event::End(e) if e.local_name().as_ref() == b"pPr" => break,
                Event::Eof => break,
                _ => {}
            }
        }
        Ok(())
    }

    fn parse_run(&mut self) -> Result<Vec<Inline>, DecodeError> {
        let mut style = RunStyle::default();
        let mut inlines = Vec::new();
        loop {
            match self.reader.read_event()? {
                Event::Start(e) => match e.local_name().as_ref() {
                    b"rPr" => style = self.parse_run_props()?,
                    b"t" => {
                        let text = self.read_text(b"t")?;
                        push_inline(&mut inlines, Inline::Text { text, style });
                    }
                    b"drawing" => {
                        if let Some(image) = self.parse_drawing(b"drawing")? {
                            inlines.push(image);
                        }
                    }
                    b"pict" => {
                        if let Some(image) = self.parse_drawing(b"pict")? {
                            inlines.push(image);
                        }
                    }
                    name if TRANSPARENT.contains(&name) => {}
                    _ => self.skip(&e)?,
                },
                Event::Empty(e) => match e.local_name().as_ref() {
                    b"tab" => push_inline(
                        &mut inlines,
                        Inline::Text {
                            text: "\t".to_string(),
                            style,
                        },
                    ),
                    b"noBreakHyphen" => push_inline(
                        &mut inlines,
                        Inline::Text {
                            text: "-".to_string(),
                            style,
                        },
                    ),
                    b"br" => {
                        let kind = attr(&e, b"type")?;
                        if !matches!(kind.as_deref(), Some("page") | Some("column")) {
                            inlines.push(Inline::Break);
                        }
                    }
                    b"cr" => inlines.push(Inline::Break),
                    _ => {}
                },
                Event::End(e) if e.local_name().as_ref() == b"r" => break,
                Event::Eof => break,
                _ => {}
            }
        }
        Ok(inlines)
    }

    fn parse_run_props(&mut self) -> Result<RunStyle, DecodeError> {
        let mut style = RunStyle::default();
        loop {
            match self.reader.read_event()? {
                Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                    b"b" => style.bold = toggle(&e)?,
                    b"i" => style.italic = toggle(&e)?,
                    b"u" => {
                        style.underline =
                            attr(&e, b"val")?.is_none_or(|val| val != "none" && val != "0")
                    }
                    _ => {}
                },
                Event::End(e) if e.local_name().as_ref() == b"rPr" => break,
                Event::Eof => break,
                _ => {}
            }
        }
        Ok(style)
    }

    fn read_text(&mut self, end: &[u8]) -> Result<String, DecodeError> {
        let mut text = String::new();
        loop {
            match self.reader.read_event()? {
                Event::Text(t) => text.push_str(&t.unescape()?),
                Event::CData(c) => text.push_str(&String::from_utf8_lossy(&c)),
                Event::End(e) if e.local_name().as_ref() == end => break,
                Event::Eof => break,
                _ => {}
            }
        }
        Ok(text)
    }

    /// Find the embedded picture inside a `w:drawing` or VML `w:pict`.
    fn parse_drawing(&mut self, end: &[u8]) -> Result<Option<Inline>, DecodeError> {
        let mut relationship_id = None;
        let mut alt_text = None;
        loop {
            match self.reader.read_event()? {
                Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                    b"blip" => relationship_id = attr(&e, b"embed")?.or(relationship_id),
                    b"imagedata" => relationship_id = attr(&e, b"id")?.or(relationship_id),
                    b"docPr" => {
                        alt_text = attr(&e, b"descr")?
                            .or(attr(&e, b"title")?)
                            .filter(|alt| !alt.trim().is_empty())
                    }
                    _ => {}
                },
                Event::End(e) if e.local_name().as_ref() == end => break,
                Event::Eof => break,
                _ => {}
            }
        }

        let Some(id) = relationship_id else {
            return Ok(None);
        };
        let Some(relationship) = self.package.relationships.get(&id) else {
            self.warnings
                .push(format!("image relationship {id} not found, image skipped"));
            return Ok(None);
        };
        if relationship.external {
            self.warnings.push(format!(
                "linked image {} is not embedded in the document, image skipped",
                relationship.target
            ));
            return Ok(None);
        }

        let part = Package::part_name(&relationship.target);
        let Some(data) = self.package.media(&part) else {
            self.warnings
                .push(format!("image part {part} missing from package, image skipped"));
            return Ok(None);
        };

        self.images.push(ImageBlob {
            content_type: self.package.content_type(&part),
            data: data.clone(),
            alt_text,
        });
        Ok(Some(Inline::Image {
            index: self.images.len() - 1,
        }))
    }

    fn parse_table(&mut self) -> Result<Block, DecodeError> {
        let mut rows = Vec::new();
        loop {
            match self.reader.read_event()? {
                Event::Start(e) => match e.local_name().as_ref() {
                    b"tr" => rows.push(self.parse_row()?),
                    _ => self.skip(&e)?,
                },
                Event::End(e) if e.local_name().as_ref() == b"tbl" => break,
                Event::Eof => break,
                _ => {}
            }
        }
        Ok(Block::Table { rows })
    }

    fn parse_row(&mut self) -> Result<Vec<Vec<Block>>, DecodeError> {
        let mut cells = Vec::new();
        loop {
            match self.reader.read_event()? {
                Event::Start(e) => match e.local_name().as_ref() {
                    b"tc" => cells.push(self.parse_blocks(b"tc")?),
                    _ => self.skip(&e)?,
                },
                Event::End(e) if e.local_name().as_ref() == b"tr" => break,
                Event::Eof => break,
                _ => {}
            }
        }
        Ok(cells)
    }

    fn hyperlink_target(&self, element: &BytesStart<'_>) -> Result<Option<String>, DecodeError> {
        if let Some(id) = attr(element, b"id")? {
            return Ok(self
                .package
                .relationships
                .get(&id)
                .map(|rel| rel.target.clone()));
        }
        Ok(attr(element, b"anchor")?.map(|anchor| format!("#{anchor}")))
    }

    fn skip(&mut self, element: &BytesStart<'_>) -> Result<(), DecodeError> {
        self.reader.read_to_end(element.name())?;
        Ok(())
    }
}

/// `<w:b/>` is on, `<w:b w:val="0"/>` (or false/off) is off.
fn toggle(element: &BytesStart<'_>) -> Result<bool, DecodeError> {
    Ok(attr(element, b"val")?.is_none_or(|val| !matches!(val.as_str(), "0" | "false" | "off")))
}

/// Append an inline, merging adjacent text runs that share a style.
fn push_inline(inlines: &mut Vec<Inline>, inline: Inline) {
    if let Inline::Text { text, style } = &inline
        && let Some(Inline::Text {
            text: previous,
            style: previous_style,
        }) = inlines.last_mut()
        && previous_style == style
    {
        previous.push_str(text);
        return;
    }
    inlines.push(inline);
}

fn is_blank(inlines: &[Inline]) -> bool {
    inlines.iter().all(|inline| match inline {
        Inline::Text { text, .. } => text.trim().is_empty(),
        Inline::Break => true,
        Inline::Image { .. } => false,
        Inline::Link { children, .. } => is_blank(children),
    })
}
