use quick_xml::Reader;
use quick_xml::events::Event;
use std::collections::HashMap;

use crate::document::errors::DecodeError;
use crate::document::package::attr;

/// Paragraph styles that are plain body text and never worth a warning.
const BODY_STYLES: &[&str] = &["normal", "body text", "list paragraph", "no spacing", "default"];

/// Paragraph style names keyed by style id.
#[derive(Debug, Default)]
pub struct Styles {
    names: HashMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParagraphKind {
    Heading(u8),
    Body,
    Unrecognised,
}

impl Styles {
    pub fn parse(xml: &str) -> Result<Self, DecodeError> {
        let mut reader = Reader::from_str(xml);
        let mut names = HashMap::new();
        let mut current: Option<String> = None;
        loop {
            match reader.read_event()? {
                Event::Start(e) if e.local_name().as_ref() == b"style" => {
                    current = attr(&e, b"styleId")?;
                }
                Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"name" => {
                    if let (Some(id), Some(name)) = (current.as_ref(), attr(&e, b"val")?) {
                        names.insert(id.clone(), name);
                    }
                }
                Event::End(e) if e.local_name().as_ref() == b"style" => current = None,
                Event::Eof => break,
                _ => {}
            }
        }
        Ok(Self { names })
    }

    pub fn name(&self, style_id: &str) -> Option<&str> {
        self.names.get(style_id).map(String::as_str)
    }

    pub fn classify(&self, style_id: &str) -> ParagraphKind {
        let name = self.name(style_id).unwrap_or(style_id).to_ascii_lowercase();
        if let Some(level) = heading_level(&name).or_else(|| heading_level(&style_id.to_ascii_lowercase())) {
            return ParagraphKind::Heading(level);
        }
        if BODY_STYLES.contains(&name.as_str()) {
            ParagraphKind::Body
        } else {
            ParagraphKind::Unrecognised
        }
    }
}

/// `heading 1`..`heading 6` (by name) or `Heading1`..`Heading6` (by id); `Title` maps to 1.
fn heading_level(lowercase: &str) -> Option<u8> {
    if lowercase == "title" {
        return Some(1);
    }
    let rest = lowercase.strip_prefix("heading")?.trim_start();
    match rest.parse::<u8>() {
        Ok(level @ 1..=6) => Some(level),
        _ => None,
    }
}

/// List kinds from `word/numbering.xml`: numId → abstract definition → per-level format.
#[derive(Debug, Default)]
pub struct Numbering {
    nums: HashMap<String, String>,
    formats: HashMap<(String, u8), String>,
}

impl Numbering {
    pub fn parse(xml: &str) -> Result<Self, DecodeError> {
        let mut reader = Reader::from_str(xml);
        let mut numbering = Self::default();
        let mut abstract_id: Option<String> = None;
        let mut level: Option<u8> = None;
        let mut num_id: Option<String> = None;
        loop {
            match reader.read_event()? {
                Event::Start(e) => match e.local_name().as_ref() {
                    b"abstractNum" => abstract_id = attr(&e, b"abstractNumId")?,
                    b"lvl" => level = attr(&e, b"ilvl")?.and_then(|v| v.parse().ok()),
                    b"num" => num_id = attr(&e, b"numId")?,
                    _ => {}
                },
                Event::Empty(e) => match e.local_name().as_ref() {
                    b"numFmt" => {
                        if let (Some(id), Some(lvl), Some(fmt)) =
                            (abstract_id.as_ref(), level, attr(&e, b"val")?)
                        {
                            numbering.formats.insert((id.clone(), lvl), fmt);
                        }
                    }
                    b"abstractNumId" => {
                        if let (Some(num), Some(abs)) = (num_id.as_ref(), attr(&e, b"val")?) {
                            numbering.nums.insert(num.clone(), abs);
                        }
                    }
                    _ => {}
                },
                Event::End(e) => match e.local_name().as_ref() {
                    b"abstractNum" => abstract_id = None,
                    b"lvl" => level = None,
                    b"num" => num_id = None,
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
        }
        Ok(numbering)
    }

    /// `Some(true)` for numbered lists, `Some(false)` for bullets, `None` when undefined.
    pub fn is_ordered(&self, num_id: &str, level: u8) -> Option<bool> {
        let abstract_id = self.nums.get(num_id)?;
        let format = self.formats.get(&(abstract_id.clone(), level))?;
        Some(format != "bullet" && format != "none")
    }
}
