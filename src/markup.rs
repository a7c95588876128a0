//! Note markup codec
//!
//! Mendeley stores document notes in a small XML-like dialect:
//! `<m:note>` wraps the whole note, `<m:linebreak/>` separates lines and
//! `<m:italic>` marks an italic run. Text content uses HTML named entities.
//!
//! [`unescape`] turns markup into plain text (italics become `*...*`).
//! [`escape`] goes the other way for plain text only; it never produces
//! italics or named entities beyond the XML ones, so only line structure
//! survives a round trip.

use std::sync::LazyLock;

use quick_xml::Writer;
use quick_xml::escape::{partial_escape, resolve_html5_entity};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use regex::{Captures, Regex};

use crate::{Error, Result};

pub const NOTE: &str = "m:note";
pub const LINEBREAK: &str = "m:linebreak";
pub const ITALIC: &str = "m:italic";

static ITALIC_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<m:italic>([^<]*)</m:italic>").expect("static pattern"));
static LINEBREAK_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<m:linebreak/>").expect("static pattern"));
static NOTE_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"</?m:note>").expect("static pattern"));
static ENTITY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"&(\w+);").expect("static pattern"));
static LINE_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\r\n]{1,2}").expect("static pattern"));

/// Markup to plain text.
///
/// Unknown entity names are left as written.
pub fn unescape(markup: &str) -> String {
    let text = ITALIC_SPAN.replace_all(markup, "*${1}*");
    let text = LINEBREAK_TAG.replace_all(&text, "\n");
    let text = NOTE_TAG.replace_all(&text, "");
    decode_entities(&text)
}

/// Decode `&name;` references against the HTML5 named entity table
pub fn decode_entities(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &Captures<'_>| {
            resolve_html5_entity(&caps[1])
                .map(str::to_string)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Plain text to markup.
///
/// Every run of one or two CR/LF characters becomes one linebreak element;
/// the result is a bare `<m:note>` fragment with no namespace declaration.
pub fn escape(text: &str) -> Result<String> {
    let mut writer = Writer::new(Vec::new());

    write(&mut writer, Event::Start(BytesStart::new(NOTE)))?;
    for (idx, line) in LINE_SEPARATOR.split(text).enumerate() {
        if idx > 0 {
            write(&mut writer, Event::Empty(BytesStart::new(LINEBREAK)))?;
        }
        if !line.is_empty() {
            write(&mut writer, Event::Text(BytesText::from_escaped(partial_escape(line))))?;
        }
    }
    write(&mut writer, Event::End(BytesEnd::new(NOTE)))?;

    String::from_utf8(writer.into_inner()).map_err(|e| Error::Markup(e.to_string()))
}

fn write(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| Error::Markup(e.to_string()))
}
