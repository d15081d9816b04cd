use bytes::Bytes;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::collections::HashMap;
use std::io::{Cursor, Read};
use zip::ZipArchive;
use zip::result::ZipError;

use crate::document::errors::DecodeError;

/// OLE2 compound file signature used by legacy Word `.doc` files.
const OLE_SIGNATURE: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

pub const DOCUMENT_PART: &str = "word/document.xml";
const DOCUMENT_RELS_PART: &str = "word/_rels/document.xml.rels";
const STYLES_PART: &str = "word/styles.xml";
const NUMBERING_PART: &str = "word/numbering.xml";
const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

/// Cap on buffer space reserved from a zip entry's declared size.
const MAX_PREALLOCATION: u64 = 16 * 1024 * 1024;

pub fn is_legacy_document(bytes: &[u8]) -> bool {
    bytes.starts_with(&OLE_SIGNATURE)
}

#[derive(Debug, Clone)]
pub struct Relationship {
    pub target: String,
    pub external: bool,
}

/// The parts of a `.docx` package the decoder needs, read eagerly.
pub struct Package {
    pub document: String,
    pub styles: Option<String>,
    pub numbering: Option<String>,
    pub relationships: HashMap<String, Relationship>,
    content_types: ContentTypes,
    media: HashMap<String, Bytes>,
}

impl Package {
    pub fn open(bytes: &[u8]) -> Result<Self, DecodeError> {
        if is_legacy_document(bytes) {
            return Err(DecodeError::legacy_format());
        }

        let mut archive = ZipArchive::new(Cursor::new(bytes))?;

        let document = read_text_part(&mut archive, DOCUMENT_PART)?
            .ok_or(DecodeError::MissingPart(DOCUMENT_PART))?;
        let styles = read_text_part(&mut archive, STYLES_PART)?;
        let numbering = read_text_part(&mut archive, NUMBERING_PART)?;
        let relationships = match read_text_part(&mut archive, DOCUMENT_RELS_PART)? {
            Some(xml) => parse_relationships(&xml)?,
            None => HashMap::new(),
        };
        let content_types = match read_text_part(&mut archive, CONTENT_TYPES_PART)? {
            Some(xml) => ContentTypes::parse(&xml)?,
            None => ContentTypes::default(),
        };

        let media_names: Vec<String> = archive
            .file_names()
            .filter(|name| !name.ends_with(".xml") && !name.ends_with(".rels") && !name.ends_with('/'))
            .map(str::to_string)
            .collect();
        let mut media = HashMap::with_capacity(media_names.len());
        for name in media_names {
            let mut file = archive.by_name(&name)?;
            let mut data = Vec::with_capacity(preallocation(file.size()));
            file.read_to_end(&mut data)?;
            media.insert(name, Bytes::from(data));
        }

        Ok(Self {
            document,
            styles,
            numbering,
            relationships,
            content_types,
            media,
        })
    }

    /// Resolve a relationship target (relative to `word/`) to a package part name.
    pub fn part_name(target: &str) -> String {
        if let Some(absolute) = target.strip_prefix('/') {
            return absolute.to_string();
        }
        let mut segments: Vec<&str> = vec!["word"];
        for segment in target.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    segments.pop();
                }
                other => segments.push(other),
            }
        }
        segments.join("/")
    }

    pub fn media(&self, part: &str) -> Option<&Bytes> {
        self.media.get(part)
    }

    pub fn content_type(&self, part: &str) -> String {
        self.content_types.lookup(part)
    }
}

/// Buffer size to reserve for an entry; the header's size is not trusted.
fn preallocation(declared: u64) -> usize {
    usize::try_from(declared.min(MAX_PREALLOCATION)).unwrap_or(0)
}

fn read_text_part(
    archive: &mut ZipArchive<Cursor<&[u8]>>,
    name: &str,
) -> Result<Option<String>, DecodeError> {
    match archive.by_name(name) {
        Ok(mut file) => {
            let mut text = String::new();
            file.read_to_string(&mut text)?;
            Ok(Some(text))
        }
        Err(ZipError::FileNotFound) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Read an attribute by its local name, ignoring the namespace prefix.
pub fn attr(element: &BytesStart<'_>, local: &[u8]) -> Result<Option<String>, DecodeError> {
    for attribute in element.attributes() {
        let attribute = attribute?;
        if attribute.key.local_name().as_ref() == local {
            return Ok(Some(attribute.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

fn parse_relationships(xml: &str) -> Result<HashMap<String, Relationship>, DecodeError> {
    let mut reader = Reader::from_str(xml);
    let mut relationships = HashMap::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                let (Some(id), Some(target)) = (attr(&e, b"Id")?, attr(&e, b"Target")?) else {
                    continue;
                };
                let external = attr(&e, b"TargetMode")?.is_some_and(|mode| mode == "External");
                relationships.insert(id, Relationship { target, external });
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(relationships)
}

#[derive(Debug, Default)]
struct ContentTypes {
    defaults: HashMap<String, String>,
    overrides: HashMap<String, String>,
}

impl ContentTypes {
    fn parse(xml: &str) -> Result<Self, DecodeError> {
        let mut reader = Reader::from_str(xml);
        let mut types = Self::default();
        loop {
            match reader.read_event()? {
                Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                    b"Default" => {
                        if let (Some(ext), Some(ct)) =
                            (attr(&e, b"Extension")?, attr(&e, b"ContentType")?)
                        {
                            types.defaults.insert(ext.to_ascii_lowercase(), ct);
                        }
                    }
                    b"Override" => {
                        if let (Some(part), Some(ct)) =
                            (attr(&e, b"PartName")?, attr(&e, b"ContentType")?)
                        {
                            types
                                .overrides
                                .insert(part.trim_start_matches('/').to_string(), ct);
                        }
                    }
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
        }
        Ok(types)
    }

    fn lookup(&self, part: &str) -> String {
        if let Some(ct) = self.overrides.get(part) {
            return ct.clone();
        }
        let extension = part
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        if let Some(ct) = self.defaults.get(&extension) {
            return ct.clone();
        }
        mime_guess::from_path(part)
            .first()
            .map(|m| m.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string())
    }
}
