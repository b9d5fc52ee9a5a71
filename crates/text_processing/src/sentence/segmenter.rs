//! Rule-based sentence segmentation
//!
//! Periods that do not end a sentence (honorifics, acronyms, decimals,
//! domains, initials, ellipses) are first rewritten to a `<prd>` sentinel;
//! the remaining terminal punctuation gets a `<stop>` sentinel and the text
//! is split there. Every rewrite preserves byte length once sentinels are
//! restored, so offsets index straight into the input.
//!
//! The input must not contain the `<prd>`, `<stop>` or `<nel>` sentinels,
//! nor the private-use characters U+E000/U+E001 used for markup
//! placeholders. This is not checked.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::markup::protect_markup;

const PRD: &str = "<prd>";
const STOP: &str = "<stop>";
const NEL: &str = "<nel>";

/// Words that usually open a new sentence (whole words only)
const STARTERS: &str = concat!(
    r"((?:Mr|Mrs|Ms|Dr|Prof|Capt|Cpt|Lt|Wherever)\b",
    r"|He\s|She\s|It\s|They\s|Their\s|Our\s|We\s|But\s|However\s|That\s|This\s)"
);

static PREFIXES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(Mr|St|Mrs|Ms|Dr)[.]").unwrap());
static WEBSITES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.](com|net|org|io|gov|edu|me)\b").unwrap());
static DECIMALS: Lazy<Regex> = Lazy::new(|| Regex::new(r"([0-9])[.]([0-9])").unwrap());
static ELLIPSIS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.{2,}").unwrap());
static LONE_INITIAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(^|\s)([A-Za-z])[.] ").unwrap());
static ACRONYM_STARTER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"([A-Z][.][A-Z][.](?:[A-Z][.])?) {}", STARTERS)).unwrap()
});
static ACRONYM_3: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Za-z])[.]([A-Za-z])[.]([A-Za-z])[.]").unwrap());
static ACRONYM_2: Lazy<Regex> = Lazy::new(|| Regex::new(r"([A-Za-z])[.]([A-Za-z])[.]").unwrap());
static SUFFIX_STARTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r" (Inc|Ltd|Jr|Sr|Co)[.] {}", STARTERS)).unwrap());
static SUFFIXES: Lazy<Regex> = Lazy::new(|| Regex::new(r" (Inc|Ltd|Jr|Sr|Co)[.]").unwrap());
static INITIALS: Lazy<Regex> = Lazy::new(|| Regex::new(r" ([A-Za-z])[.]").unwrap());
static INITIAL_STARTER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(\s[A-Za-z])<prd>(\s+){}", STARTERS)).unwrap()
});

/// A sentence with byte offsets into the segmented text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
    pub text: String,
    pub start: usize,
    pub end: usize,
}

impl Sentence {
    pub fn new(text: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            text: text.into(),
            start,
            end,
        }
    }
}

/// Split `text` into sentences
///
/// Fragments are merged until a sentence holds more than `min_sentence_len`
/// characters; a trailing remainder is emitted whatever its length. With
/// `retain_format` line breaks end sentences and whitespace is kept
/// verbatim; without it line breaks become spaces, fragments are trimmed
/// and joined with a single space.
pub fn split_sentences(text: &str, min_sentence_len: usize, retain_format: bool) -> Vec<Sentence> {
    let protected = protect_markup(text);
    let marked = mark_boundaries(&protected.text, retain_format);
    let restored = protected.restore(&marked);

    let pad = if retain_format { "" } else { " " };
    let mut sentences = Vec::new();
    let mut buf = String::new();
    let mut start = 0;
    let mut end = 0;

    for piece in restored.split(STOP) {
        let sentence = if retain_format { piece } else { piece.trim() };
        end += piece.len();
        if sentence.is_empty() {
            continue;
        }

        if !buf.is_empty() {
            buf.push_str(pad);
        }
        buf.push_str(sentence);

        if buf.chars().count() > min_sentence_len {
            sentences.push(Sentence::new(std::mem::take(&mut buf), start, end));
            start = end;
        }
    }

    if !buf.is_empty() {
        sentences.push(Sentence::new(buf, start, text.len()));
    }

    sentences
}

/// Apply the protection rules and insert stop markers
///
/// Order matters: later rules assume earlier ones already fired.
fn mark_boundaries(text: &str, retain_format: bool) -> String {
    let mut text = if retain_format {
        text.replace('\n', &format!("{}{}", NEL, STOP))
    } else {
        text.replace('\n', " ")
    };

    text = PREFIXES.replace_all(&text, "${1}<prd>").into_owned();
    text = WEBSITES.replace_all(&text, "<prd>${1}").into_owned();

    // Matches cannot overlap, so "1.2.3" needs a second pass
    loop {
        let next = DECIMALS.replace_all(&text, "${1}<prd>${2}").into_owned();
        if next == text {
            break;
        }
        text = next;
    }

    text = ELLIPSIS
        .replace_all(&text, |caps: &Captures| PRD.repeat(caps[0].len()))
        .into_owned();
    if text.contains("Ph.D") {
        text = text.replace("Ph.D.", "Ph<prd>D<prd>");
    }
    text = LONE_INITIAL.replace_all(&text, "${1}${2}<prd> ").into_owned();
    text = ACRONYM_STARTER.replace_all(&text, "${1}<stop> ${2}").into_owned();
    text = ACRONYM_3
        .replace_all(&text, "${1}<prd>${2}<prd>${3}<prd>")
        .into_owned();
    text = ACRONYM_2.replace_all(&text, "${1}<prd>${2}<prd>").into_owned();
    text = SUFFIX_STARTER
        .replace_all(&text, " ${1}.<stop> ${2}")
        .into_owned();
    text = SUFFIXES.replace_all(&text, " ${1}<prd>").into_owned();
    text = INITIALS.replace_all(&text, " ${1}<prd>").into_owned();
    text = INITIAL_STARTER
        .replace_all(&text, "${1}<prd><stop>${2}${3}")
        .into_owned();

    let text = mark_stops(&text).replace(PRD, ".");
    if retain_format {
        text.replace(NEL, "\n")
    } else {
        text
    }
}

fn is_terminal(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | '。' | '！' | '？')
}

fn is_closing_quote(c: char) -> bool {
    matches!(c, '"' | '\'' | '”' | '’')
}

/// Append a stop marker after terminal punctuation (and a closing quote)
fn mark_stops(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 16);
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        out.push(c);
        if !is_terminal(c) {
            continue;
        }
        if let Some(&quote) = chars.peek() {
            if is_closing_quote(quote) {
                out.push(quote);
                chars.next();
            }
        }
        out.push_str(STOP);
    }
    out
}
