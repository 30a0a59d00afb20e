//! Status reply parser
//!
//! The reply is an XML document such as:
//!
//! ```xml
//! <?xml version="1.0"?>
//! <tsqp version="1.0">
//!   <serverinfo uptime="3600" ip="10.0.0.5" servername="Testville" port="7171"/>
//!   <owner name="GM" email="gm@example.test"/>
//!   <players online="12" max="100" peak="40"/>
//!   <monsters total="5000"/>
//!   <map name="Testville" author="GM" width="2048" height="2048"/>
//!   <rates experience="5" magic="3" skill="3" loot="2" spawn="1"/>
//!   <npcs total="120"/>
//!   <motd>Welcome!</motd>
//! </tsqp>
//! ```
//!
//! Attributes of recognized group elements directly under the root are
//! copied as text. Only the first occurrence of a group counts; anything else
//! is ignored.

use std::borrow::Cow;
use std::collections::HashSet;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::trace;

use crate::error::ProtocolError;
use crate::status::record::{AttributeGroup, StatusRecord};

/// Name of the message-of-the-day element
const MOTD_ELEMENT: &str = "motd";

/// Parse a raw status reply into a record
pub fn parse_status(raw: &[u8]) -> Result<StatusRecord, ProtocolError> {
    let document = decode(raw);
    // Text is kept untrimmed so the motd survives verbatim
    let mut reader = Reader::from_str(&document);

    let mut parser = StatusParser::default();

    loop {
        let event = reader.read_event().map_err(|e| {
            ProtocolError::ParseFailure(format!(
                "{} at byte {}",
                e,
                reader.buffer_position()
            ))
        })?;

        match event {
            Event::Start(e) => {
                parser.open(&e)?;
            }
            Event::Empty(e) => {
                parser.open(&e)?;
                parser.close();
            }
            Event::End(_) => parser.close(),
            Event::Text(e) => {
                let text = e
                    .unescape()
                    .map_err(|e| ProtocolError::ParseFailure(e.to_string()))?;
                parser.text(&text)?;
            }
            Event::CData(e) => {
                parser.text(&String::from_utf8_lossy(&e))?;
            }
            Event::Eof => break,
            // Declaration, comments, processing instructions, doctype
            _ => {}
        }
    }

    parser.finish()
}

/// Decode the reply as UTF-8, falling back to ISO-8859-1
///
/// Many servers send Latin-1 text (server names, motd) without declaring
/// it. Every byte is a valid Latin-1 code point, so this never fails.
fn decode(raw: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(raw) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => {
            trace!("Status reply is not UTF-8, decoding as ISO-8859-1");
            Cow::Owned(raw.iter().map(|&b| char::from(b)).collect())
        }
    }
}

/// Incremental state while walking the document
#[derive(Default)]
struct StatusParser {
    record: StatusRecord,
    /// Number of currently open elements
    depth: usize,
    /// Whether the root element has been opened
    saw_root: bool,
    /// Groups already taken from the document
    seen: HashSet<AttributeGroup>,
    /// Whether a motd element has been taken
    seen_motd: bool,
    /// Text of the motd element being read
    motd: Option<String>,
}

impl StatusParser {
    fn open(&mut self, element: &BytesStart<'_>) -> Result<(), ProtocolError> {
        match self.depth {
            0 if self.saw_root => {
                return Err(ProtocolError::ParseFailure(
                    "multiple root elements".to_string(),
                ));
            }
            0 => self.saw_root = true,
            1 => self.child(element)?,
            _ => {}
        }
        self.depth += 1;
        Ok(())
    }

    fn close(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        if self.depth == 1 {
            if let Some(motd) = self.motd.take() {
                self.record.set_motd(motd);
            }
        }
    }

    fn text(&mut self, text: &str) -> Result<(), ProtocolError> {
        // Only direct text of the motd counts, whitespace included
        if self.depth == 2 {
            if let Some(motd) = self.motd.as_mut() {
                motd.push_str(text);
                return Ok(());
            }
        }
        if self.depth == 0 && !text.trim().is_empty() {
            return Err(ProtocolError::ParseFailure(
                "text outside of the root element".to_string(),
            ));
        }
        Ok(())
    }

    /// Handle a direct child of the root
    fn child(&mut self, element: &BytesStart<'_>) -> Result<(), ProtocolError> {
        let name = std::str::from_utf8(element.name().as_ref())
            .map_err(|e| ProtocolError::ParseFailure(e.to_string()))?
            .to_string();

        if name == MOTD_ELEMENT {
            if !self.seen_motd {
                self.seen_motd = true;
                self.motd = Some(String::new());
            }
            return Ok(());
        }

        let Some(group) = AttributeGroup::from_name(&name) else {
            trace!(element = %name, "Ignoring unknown status element");
            return Ok(());
        };
        if !self.seen.insert(group) {
            trace!(group = %group, "Ignoring repeated status group");
            return Ok(());
        }

        let fields = self.record.ensure_group(group);
        for attr in element.attributes() {
            let attr = attr.map_err(|e| ProtocolError::ParseFailure(e.to_string()))?;
            let key = std::str::from_utf8(attr.key.as_ref())
                .map_err(|e| ProtocolError::ParseFailure(e.to_string()))?
                .to_string();
            let value = attr
                .unescape_value()
                .map_err(|e| ProtocolError::ParseFailure(e.to_string()))?;
            fields.insert(key, value.into_owned().into());
        }
        Ok(())
    }

    fn finish(self) -> Result<StatusRecord, ProtocolError> {
        if !self.saw_root {
            return Err(ProtocolError::ParseFailure(
                "no root element".to_string(),
            ));
        }
        if self.depth != 0 {
            return Err(ProtocolError::ParseFailure(format!(
                "{} unclosed element(s) at end of reply",
                self.depth
            )));
        }
        Ok(self.record)
    }
}
