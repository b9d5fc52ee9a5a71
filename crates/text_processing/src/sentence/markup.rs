//! Markup protection
//!
//! Angle-bracket elements are swapped for opaque placeholders before
//! boundary detection so that periods inside attributes or element content
//! never end a sentence. An element spans from its opening tag to the
//! matching same-named closing tag (nesting aware, names compared
//! case-insensitively). Malformed constructs stay literal text.

use once_cell::sync::Lazy;
use regex::Regex;

const PLACEHOLDER_OPEN: char = '\u{E000}';
const PLACEHOLDER_CLOSE: char = '\u{E001}';

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new("\u{E000}(\\d+)\u{E001}").unwrap());

/// Text with markup elements replaced by placeholders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtectedText {
    pub text: String,
    spans: Vec<String>,
    unclosed: Option<usize>,
}

impl ProtectedText {
    /// Number of protected spans
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Byte offset (in the original text) of the first opening tag whose
    /// element has no closing tag yet
    pub fn unclosed_tag(&self) -> Option<usize> {
        self.unclosed
    }

    /// Put every protected span back into `text`
    ///
    /// Placeholders that do not belong to this text are left as they are.
    pub fn restore(&self, text: &str) -> String {
        if self.spans.is_empty() {
            return text.to_string();
        }
        PLACEHOLDER
            .replace_all(text, |caps: &regex::Captures| {
                caps[1]
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| self.spans.get(i))
                    .cloned()
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }
}

#[derive(Debug)]
struct OpenTag<'a> {
    name: &'a str,
    /// Byte index just past the closing `>`
    end: usize,
    self_closing: bool,
}

/// Replace every well-formed markup element with a placeholder
pub fn protect_markup(text: &str) -> ProtectedText {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut spans = Vec::new();
    let mut unclosed = None;
    let mut copied = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'<' {
            i += 1;
            continue;
        }
        let Some(tag) = parse_open_tag(text, i) else {
            i += 1;
            continue;
        };

        let end = if tag.self_closing {
            tag.end
        } else {
            find_element_end(text, tag.end, tag.name).unwrap_or_else(|| {
                unclosed.get_or_insert(i);
                tag.end
            })
        };

        out.push_str(&text[copied..i]);
        out.push(PLACEHOLDER_OPEN);
        out.push_str(&spans.len().to_string());
        out.push(PLACEHOLDER_CLOSE);
        spans.push(text[i..end].to_string());

        copied = end;
        i = end;
    }
    out.push_str(&text[copied..]);

    ProtectedText {
        text: out,
        spans,
        unclosed,
    }
}

fn is_name_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b':' | b'-')
}

/// Parse an opening tag starting at `start` (which must be `<`)
///
/// Tracks quote state so that `>` inside an attribute value does not end
/// the tag. An unquoted `<` or a missing `>` makes the construct literal.
fn parse_open_tag(text: &str, start: usize) -> Option<OpenTag<'_>> {
    let bytes = text.as_bytes();
    let mut j = start + 1;
    if !bytes.get(j)?.is_ascii_alphabetic() {
        return None;
    }
    while j < bytes.len() && is_name_char(bytes[j]) {
        j += 1;
    }
    let name = &text[start + 1..j];

    match bytes.get(j) {
        Some(b) if b.is_ascii_whitespace() || *b == b'>' || *b == b'/' => {}
        _ => return None,
    }

    let mut quote: Option<u8> = None;
    while j < bytes.len() {
        let c = bytes[j];
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                b'"' | b'\'' => quote = Some(c),
                b'<' => return None,
                b'>' => {
                    return Some(OpenTag {
                        name,
                        end: j + 1,
                        self_closing: bytes[j - 1] == b'/',
                    })
                }
                _ => {}
            },
        }
        j += 1;
    }
    None
}

/// Parse `</name>` at `start`, returning the name and the index past `>`
fn parse_close_tag(text: &str, start: usize) -> Option<(&str, usize)> {
    let bytes = text.as_bytes();
    if bytes.get(start + 1) != Some(&b'/') {
        return None;
    }
    let name_start = start + 2;
    let mut j = name_start;
    while j < bytes.len() && is_name_char(bytes[j]) {
        j += 1;
    }
    if j == name_start {
        return None;
    }
    let name = &text[name_start..j];
    while j < bytes.len() && bytes[j].is_ascii_whitespace() {
        j += 1;
    }
    (bytes.get(j) == Some(&b'>')).then_some((name, j + 1))
}

/// Find the end of the element whose opening tag ends at `from`
fn find_element_end(text: &str, from: usize, name: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 1usize;
    let mut i = from;

    while i < bytes.len() {
        if bytes[i] != b'<' {
            i += 1;
            continue;
        }
        if let Some((close, end)) = parse_close_tag(text, i) {
            if close.eq_ignore_ascii_case(name) {
                depth -= 1;
                if depth == 0 {
                    return Some(end);
                }
            }
            i = end;
        } else if let Some(tag) = parse_open_tag(text, i) {
            if !tag.self_closing && tag.name.eq_ignore_ascii_case(name) {
                depth += 1;
            }
            i = tag.end;
        } else {
            i += 1;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans(text: &str) -> Vec<String> {
        protect_markup(text).spans
    }

    #[test]
    fn test_element_with_quoted_attribute() {
        let protected = protect_markup(r#"Go to <a href="x.com?a>b">Mr. Smith</a>. Done."#);
        assert_eq!(protected.len(), 1);
        assert_eq!(protected.spans[0], r#"<a href="x.com?a>b">Mr. Smith</a>"#);
        assert_eq!(protected.text, "Go to \u{E000}0\u{E001}. Done.");
        assert_eq!(
            protected.restore(&protected.text),
            r#"Go to <a href="x.com?a>b">Mr. Smith</a>. Done."#
        );
    }

    #[test]
    fn test_nested_same_name() {
        assert_eq!(
            spans("<b>a <B>b.</B> c.</b> tail"),
            vec!["<b>a <B>b.</B> c.</b>".to_string()]
        );
    }

    #[test]
    fn test_self_closing() {
        assert_eq!(
            spans(r#"Wait <break time="1.5s"/> now."#),
            vec![r#"<break time="1.5s"/>"#.to_string()]
        );
    }

    #[test]
    fn test_unmatched_open_tag_protects_tag_only() {
        let protected = protect_markup("<voice name=\"a.b\">Hi. There.");
        assert_eq!(protected.spans, vec!["<voice name=\"a.b\">".to_string()]);
        assert_eq!(protected.text, "\u{E000}0\u{E001}Hi. There.");
        assert_eq!(protected.unclosed_tag(), Some(0));
    }

    #[test]
    fn test_unclosed_tag_offset() {
        let protected = protect_markup(r#"Done. <b>x</b> <prosody rate="slow">Hi. <br/>"#);
        assert_eq!(protected.unclosed_tag(), Some(15));

        assert_eq!(protect_markup("<b>x</b> <br/> plain").unclosed_tag(), None);
        assert_eq!(protect_markup("<p>a <p>b</p>").unclosed_tag(), Some(0));
    }

    #[test]
    fn test_malformed_is_literal() {
        assert!(protect_markup("a < b and c > d").is_empty());
        assert!(protect_markup("<tag attr=\"x").is_empty());
        assert!(protect_markup("<a <b>").spans == vec!["<b>".to_string()]);
        assert!(protect_markup("1<2").is_empty());
    }

    #[test]
    fn test_restore_ignores_foreign_placeholder() {
        let protected = protect_markup("plain");
        assert_eq!(protected.restore("x\u{E000}7\u{E001}"), "x\u{E000}7\u{E001}");
    }
}
