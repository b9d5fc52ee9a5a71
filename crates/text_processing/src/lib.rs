//! Text processing for streaming speech synthesis
//!
//! Features:
//! - Markup- and abbreviation-aware sentence segmentation
//! - Incremental sentence streams fed by partial text
//! - Inline directive parsing (brace-delimited, pause durations)

pub mod directives;
pub mod sentence;

pub use directives::{clean_text_span, parse_pause, split_directives, word_count, TokenPart};
pub use sentence::{
    split_sentences, Sentence, SentenceStream, SentenceToken, SentenceTokenizer, SentenceTokens,
};
