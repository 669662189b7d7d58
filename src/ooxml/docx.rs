//! Streaming text extraction from OOXML (.docx) packages.
//!
//! A `.docx` file is a zip archive of XML parts. `[Content_Types].xml` names
//! the parts worth reading (the main document, notes, comments, headers and
//! footers); each of those is walked with a streaming XML reader and a small
//! context stack that decides which character data is document text and where
//! it belongs. No DOM is built.

use crate::document::Document;
use crate::error::{Error, Result};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::collections::{HashMap, HashSet};
use std::io::{Read, Seek};
use tracing::{debug, warn};
use zip::ZipArchive;

const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

/// Part content types whose text contributes to the extracted document.
const STREAM_TYPES: [&str; 8] = [
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.comments+xml",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.commentsExtended+xml",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.footnotes+xml",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.endnotes+xml",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.header+xml",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.footer+xml",
    "application/vnd.openxmlformats-package.relationships+xml",
];

/// Where the walker currently is; the innermost entry decides whether
/// character data is captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    /// Bottom marker for body-like parts
    Body,
    /// Bottom marker for header/footer parts
    Header,
    /// Character data is document text
    Content,
    /// Inside a deleted run or a field instruction
    Deleted,
    /// Inside a tab-stop definition block
    Tabs,
    /// Inside a table cell
    Cell,
    /// Inside a drawing
    Drawing,
    /// Inside textbox content
    Textbox,
    /// Inside a footnote/endnote story that is not content (separators)
    Skipped,
}

/// Extract a document from a `.docx` package.
pub(crate) fn extract<R: Read + Seek>(reader: R) -> Result<Document> {
    let mut archive = ZipArchive::new(reader)?;

    let mut names = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        names.push(archive.by_index(i)?.name().to_string());
    }

    if !names.iter().any(|n| n == CONTENT_TYPES_PART) {
        return Err(Error::InvalidDocument(
            "missing content types".to_string(),
        ));
    }

    let mut extractor = DocxExtractor::default();

    // Content types first so the part registry exists before any part
    extractor.process_part(&mut archive, CONTENT_TYPES_PART)?;
    for name in &names {
        if name != CONTENT_TYPES_PART && extractor.should_process(name) {
            extractor.process_part(&mut archive, name)?;
        }
    }

    let mut doc = extractor.document;
    if !doc.textboxes.is_empty() {
        doc.textboxes.push('\n');
    }
    if !doc.header_textboxes.is_empty() {
        doc.header_textboxes.push('\n');
    }
    Ok(doc)
}

#[derive(Default)]
struct DocxExtractor {
    document: Document,
    /// Parts registered for processing by an Override entry
    parts: HashSet<String>,
    /// Extension to content-type fallbacks from Default entries
    defaults: HashMap<String, String>,
    context: Vec<Context>,
    pieces: Vec<String>,
    /// Saved piece lists while inside textbox content
    pieces_stack: Vec<Vec<String>>,
}

impl DocxExtractor {
    fn should_process(&self, name: &str) -> bool {
        if self.parts.contains(name) {
            return true;
        }
        let Some((_, ext)) = name.rsplit_once('.') else {
            return false;
        };
        self.defaults
            .get(ext)
            .is_some_and(|ct| STREAM_TYPES.contains(&ct.as_str()))
    }

    fn process_part<R: Read + Seek>(
        &mut self,
        archive: &mut ZipArchive<R>,
        name: &str,
    ) -> Result<()> {
        let mut bytes = Vec::new();
        archive.by_name(name)?.read_to_end(&mut bytes)?;
        debug!(part = name, len = bytes.len(), "walking package part");

        let mut reader = Reader::from_reader(&bytes[..]);
        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => self.open_tag(&e),
                Ok(Event::Empty(e)) => {
                    // Self-closing elements behave as an open/close pair
                    self.open_tag(&e);
                    self.close_tag(e.local_name().as_ref());
                },
                Ok(Event::End(e)) => self.close_tag(e.local_name().as_ref()),
                Ok(Event::Text(e)) => {
                    if self.capturing() {
                        let text = e.unescape().map_err(Error::from)?;
                        self.pieces.push(text.into_owned());
                    }
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(Error::InvalidDocument(format!("XML error: {}", e))),
                _ => {},
            }
        }
        Ok(())
    }

    /// Character data counts as text inside content, table cells, and
    /// textboxes.
    fn capturing(&self) -> bool {
        matches!(
            self.context.last(),
            Some(Context::Content | Context::Cell | Context::Textbox)
        )
    }

    fn attribute(e: &BytesStart<'_>, name: &[u8]) -> Option<String> {
        e.attributes()
            .flatten()
            .find(|a| a.key.local_name().as_ref() == name)
            .and_then(|a| a.unescape_value().ok())
            .map(|v| v.into_owned())
    }

    fn open_tag(&mut self, e: &BytesStart<'_>) {
        match e.local_name().as_ref() {
            b"Override" => {
                let content_type = Self::attribute(e, b"ContentType").unwrap_or_default();
                let part_name = Self::attribute(e, b"PartName").unwrap_or_default();
                if STREAM_TYPES.contains(&content_type.as_str()) {
                    self.parts
                        .insert(part_name.trim_start_matches('/').to_string());
                }
            },
            b"Default" => {
                if let (Some(ext), Some(ct)) = (
                    Self::attribute(e, b"Extension"),
                    Self::attribute(e, b"ContentType"),
                ) {
                    self.defaults.insert(ext, ct);
                }
            },
            b"document" | b"footnotes" | b"endnotes" | b"comments" => {
                self.context = vec![Context::Body, Context::Content];
                self.pieces.clear();
            },
            b"hdr" | b"ftr" => {
                self.context = vec![Context::Header, Context::Content];
                self.pieces.clear();
            },
            b"footnote" | b"endnote" => {
                // Separator stories carry a type attribute; real notes don't
                let story_type = Self::attribute(e, b"type");
                let ctx = match story_type.as_deref() {
                    None | Some("content") => Context::Content,
                    Some(_) => Context::Skipped,
                };
                self.context.push(ctx);
            },
            b"tab" => {
                if self.context.last() == Some(&Context::Content) {
                    self.pieces.push("\t".to_string());
                }
            },
            b"br" => {
                if self.context.last() == Some(&Context::Content) {
                    self.pieces.push("\n".to_string());
                }
            },
            b"del" | b"instrText" => self.context.push(Context::Deleted),
            b"tabs" => self.context.push(Context::Tabs),
            b"tc" => self.context.push(Context::Cell),
            b"drawing" => self.context.push(Context::Drawing),
            b"txbxContent" => {
                self.pieces_stack.push(std::mem::take(&mut self.pieces));
                self.context.push(Context::Textbox);
            },
            _ => {},
        }
    }

    fn close_tag(&mut self, name: &[u8]) {
        match name {
            b"document" => {
                self.document.body = self.pieces.concat();
                self.context.clear();
            },
            b"footnotes" => {
                self.document.footnotes = self.pieces.concat();
                self.context.clear();
            },
            b"endnotes" => {
                self.document.endnotes = self.pieces.concat();
                self.context.clear();
            },
            b"comments" => {
                self.document.annotations = self.pieces.concat();
                self.context.clear();
            },
            b"hdr" => {
                let text = self.pieces.concat();
                self.document.headers.push_str(&text);
                self.context.clear();
            },
            b"ftr" => {
                let text = self.pieces.concat();
                self.document.footers.push_str(&text);
                self.context.clear();
            },
            b"footnote" | b"endnote" | b"del" | b"instrText" | b"tabs" | b"drawing" => {
                self.context.pop();
            },
            b"p" => {
                if self.capturing() {
                    self.pieces.push("\n".to_string());
                }
            },
            b"tc" => {
                // The paragraph newline inside the cell becomes the cell tab
                self.pieces.pop();
                self.pieces.push("\t".to_string());
                self.context.pop();
            },
            b"tr" => {
                self.pieces.push("\n".to_string());
            },
            b"txbxContent" => self.close_textbox(),
            _ => {},
        }
    }

    fn close_textbox(&mut self) {
        let text = self.pieces.concat();

        if self.context.last() != Some(&Context::Textbox) {
            warn!("unbalanced textbox content element");
            return;
        }
        self.context.pop();
        self.pieces = self.pieces_stack.pop().unwrap_or_default();

        // Textboxes inside drawings are alternate renderings; skip them
        if self.context.last() == Some(&Context::Drawing) {
            return;
        }
        if text.is_empty() {
            return;
        }

        let target = if self.context.contains(&Context::Header) {
            &mut self.document.header_textboxes
        } else {
            &mut self.document.textboxes
        };
        if !target.is_empty() {
            target.push('\n');
        }
        target.push_str(&text);
    }
}
