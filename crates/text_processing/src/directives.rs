//! Inline directive parsing
//!
//! A token may embed non-spoken directives between braces, e.g.
//! `Hello {<trl-break duration="500ms">} world`. Braces do not nest and
//! the shortest match wins.

use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;

static DIRECTIVE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{(.*?)\}").unwrap());
static PAUSE_DURATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"duration\s*=\s*['"](\d+)(ms|s)?['"]"#).unwrap());

/// One part of a token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenPart<'a> {
    /// Spoken text between directives (may be empty)
    Text(&'a str),
    /// Content between the braces of a directive
    Directive(&'a str),
}

/// Split a token into alternating text and directive parts
///
/// The result always starts and ends with `Text`, so a token with `n`
/// directives yields `2n + 1` parts.
pub fn split_directives(token: &str) -> Vec<TokenPart<'_>> {
    let mut parts = Vec::new();
    let mut last = 0;
    for caps in DIRECTIVE.captures_iter(token) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        parts.push(TokenPart::Text(&token[last..whole.start()]));
        parts.push(TokenPart::Directive(inner.as_str()));
        last = whole.end();
    }
    parts.push(TokenPart::Text(&token[last..]));
    parts
}

/// Strip stray braces and surrounding whitespace from a text part
pub fn clean_text_span(text: &str) -> String {
    text.replace(['{', '}'], "").trim().to_string()
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Pause length of a pause directive
///
/// The directive must start with `prefix` and carry
/// `duration="<int><unit>"`, unit `ms` or `s` (seconds when omitted).
pub fn parse_pause(text: &str, prefix: &str) -> Option<Duration> {
    let text = text.trim();
    if !text.starts_with(prefix) {
        return None;
    }
    let caps = PAUSE_DURATION.captures(text)?;
    let value: u64 = caps.get(1)?.as_str().parse().ok()?;
    match caps.get(2).map(|m| m.as_str()) {
        Some("ms") => Some(Duration::from_millis(value)),
        _ => Some(Duration::from_secs(value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREFIX: &str = "<trl-break";

    #[test]
    fn test_split_directives() {
        let parts = split_directives(r#"Hello {<trl-break duration="500ms">} world {wave}"#);
        assert_eq!(
            parts,
            vec![
                TokenPart::Text("Hello "),
                TokenPart::Directive(r#"<trl-break duration="500ms">"#),
                TokenPart::Text(" world "),
                TokenPart::Directive("wave"),
                TokenPart::Text(""),
            ]
        );
    }

    #[test]
    fn test_split_without_directives() {
        assert_eq!(split_directives("plain"), vec![TokenPart::Text("plain")]);
        assert_eq!(split_directives(""), vec![TokenPart::Text("")]);
    }

    #[test]
    fn test_non_greedy_and_stray_braces() {
        let parts = split_directives("a {x} b {y} c } d {");
        assert_eq!(parts.len(), 5);
        assert_eq!(parts[1], TokenPart::Directive("x"));
        assert_eq!(parts[3], TokenPart::Directive("y"));
        assert_eq!(clean_text_span(" c } d { "), "c  d");
    }

    #[test]
    fn test_word_count() {
        assert_eq!(word_count("  two   words "), 2);
        assert_eq!(word_count(""), 0);
    }

    #[test]
    fn test_parse_pause() {
        assert_eq!(
            parse_pause(r#"<trl-break duration="500ms">"#, PREFIX),
            Some(Duration::from_millis(500))
        );
        assert_eq!(
            parse_pause(r#" <trl-break duration = '2s'/>"#, PREFIX),
            Some(Duration::from_secs(2))
        );
        assert_eq!(
            parse_pause(r#"<trl-break duration="3">"#, PREFIX),
            Some(Duration::from_secs(3))
        );
        assert_eq!(parse_pause(r#"<break duration="3s">"#, PREFIX), None);
        assert_eq!(parse_pause("<trl-break>", PREFIX), None);
        assert_eq!(parse_pause(r#"<trl-break duration="1.5s">"#, PREFIX), None);
    }
}
