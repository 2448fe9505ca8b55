//! Small validation and encoding helpers shared by the request models.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Map, Value};

/// True only for the JSON literals `true` and `false`.
pub fn is_boolean(value: &Value) -> bool {
    value.is_boolean()
}

/// Check that `text` parses as a markup fragment without structural errors.
///
/// Plain text has no markup and is accepted. Every `<` must open a well
/// formed element tag: a name starting with a letter or `_`, and attributes
/// of the form `name="value"`. Closing tags must match the innermost open
/// tag, but a closing tag with nothing open (`"</em>"`) is accepted on its own.
pub fn is_markup(text: &str) -> bool {
    let mut reader = Reader::from_str(text);
    reader.check_end_names(false);

    let mut open: Vec<Vec<u8>> = Vec::new();
    let mut tags = 0usize;

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(err) => {
                tracing::debug!("Rejected markup fragment {:?}: {}", text, err);
                return false;
            }
        };

        match event {
            Event::Eof => break,
            Event::Start(e) | Event::Empty(e) if !valid_start_tag(&e) => return false,
            Event::Start(e) => {
                tags += 1;
                open.push(e.name().as_ref().to_vec());
            }
            Event::Empty(_) => tags += 1,
            Event::End(e) => {
                let name = e.name();
                if !is_tag_name(name.as_ref()) {
                    return false;
                }
                if let Some(expected) = open.pop() {
                    if expected != name.as_ref() {
                        return false;
                    }
                }
                tags += 1;
            }
            Event::Text(_) => {}
            // Comments, CDATA, declarations and processing instructions are not delimiters
            _ => return false,
        }
    }

    // A `<` the reader folded into text or skipped never became a tag
    tags == text.matches('<').count()
}

fn valid_start_tag(tag: &BytesStart<'_>) -> bool {
    if !is_tag_name(tag.name().as_ref()) {
        return false;
    }
    tag.attributes()
        .all(|attr| attr.is_ok_and(|a| is_tag_name(a.key.as_ref())))
}

fn is_tag_name(name: &[u8]) -> bool {
    let Ok(name) = std::str::from_utf8(name) else {
        return false;
    };
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {
            chars.all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | ':'))
        }
        _ => false,
    }
}

/// Join `params` into a query string, in insertion order.
///
/// `null` emits the bare key, arrays emit one `key=element` pair per element,
/// strings are written unquoted. Nothing is percent-encoded here.
pub fn encode_query_string(params: &Map<String, Value>) -> String {
    params
        .iter()
        .map(|(key, value)| match value {
            Value::Null => key.clone(),
            Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    Value::Null => key.clone(),
                    other => format!("{}={}", key, scalar_text(other)),
                })
                .collect::<Vec<_>>()
                .join("&"),
            other => format!("{}={}", key, scalar_text(other)),
        })
        .collect::<Vec<_>>()
        .join("&")
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
