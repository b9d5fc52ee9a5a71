//! Sentence segmentation
//!
//! - `segmenter`: rule-based boundary detection over a complete text
//! - `markup`: placeholder protection for angle-bracket elements
//! - `stream`: incremental push/flush/end driver around the segmenter

mod markup;
mod segmenter;
mod stream;

pub use markup::{protect_markup, ProtectedText};
pub use segmenter::{split_sentences, Sentence};
pub use stream::{SentenceStream, SentenceToken, SentenceTokenizer, SentenceTokens};
